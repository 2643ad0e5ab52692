pub mod calendar;
pub mod claps;
pub mod content;
pub mod data;
pub mod error_code;
pub mod health;
pub mod helpers;
pub mod push;
pub mod routes;
pub mod settings;
pub mod submissions;
pub mod types;
pub mod users;

pub use error_code::ErrorCode;
pub use helpers::{api_result, error_from_talentenraad, error_response, success_response};
pub use routes::{admin_routes, public_routes};
pub use types::ApiResponse;
