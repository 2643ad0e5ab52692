//! Web push notifications
//!
//! Visitors subscribe from the browser; admins broadcast a message which is
//! stored in `notification_history` and announced to every subscription
//! with an empty VAPID-signed push.

mod push;
mod service;
pub mod vapid;

pub use push::{DeliveryResult, PushGateway, UnconfiguredGateway, WebPushClient};
pub use service::{BroadcastReport, NotificationService};
pub use vapid::VapidSigner;
