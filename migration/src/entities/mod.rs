pub mod audit_log;
pub mod clap_session;
pub mod content_clap;
pub mod notification_history;
pub mod push_subscription;
pub mod site_setting;
pub mod submission;
pub mod user;

pub use audit_log::Entity as AuditLogEntity;
pub use clap_session::Entity as ClapSessionEntity;
pub use content_clap::Entity as ContentClapEntity;
pub use notification_history::Entity as NotificationHistoryEntity;
pub use push_subscription::Entity as PushSubscriptionEntity;
pub use site_setting::Entity as SiteSettingEntity;
pub use submission::Entity as SubmissionEntity;
pub use user::Entity as UserEntity;
