//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::TalentenraadError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 认证错误
/// - 3000-3099: 内容错误
/// - 4000-4099: 导入导出错误
/// - 5000-5099: 鼓掌错误
/// - 6000-6099: 推送通知错误
/// - 7000-7099: 表单提交错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    RateLimitExceeded = 1029,
    ServiceUnavailable = 1030,

    SessionMissing = 2000,
    SessionInvalid = 2001,
    NotAdmin = 2002,

    ContentNotFound = 3000,
    UnknownModel = 3001,
    CmsUnavailable = 3002,

    ImportFailed = 4000,
    ExportFailed = 4001,
    CsvGenerationError = 4002,

    ClapLimitReached = 5000,

    PushNotConfigured = 6000,
    BroadcastFailed = 6001,

    SubmissionInvalid = 7000,
    RecaptchaFailed = 7001,
}

impl From<TalentenraadError> for ErrorCode {
    fn from(err: TalentenraadError) -> Self {
        ErrorCode::from(&err)
    }
}

impl From<&TalentenraadError> for ErrorCode {
    fn from(err: &TalentenraadError) -> Self {
        match err {
            TalentenraadError::Validation(_) | TalentenraadError::Serialization(_) => {
                ErrorCode::BadRequest
            }
            TalentenraadError::NotFound(_) => ErrorCode::NotFound,
            TalentenraadError::Unauthorized(_) => ErrorCode::Unauthorized,
            TalentenraadError::Forbidden(_) => ErrorCode::Forbidden,
            TalentenraadError::Cms(_) => ErrorCode::CmsUnavailable,
            TalentenraadError::PushDelivery(_) => ErrorCode::BroadcastFailed,
            TalentenraadError::Recaptcha(_) => ErrorCode::RecaptchaFailed,
            TalentenraadError::ClapLimit(_) => ErrorCode::ClapLimitReached,
            TalentenraadError::DatabaseConfig(_)
            | TalentenraadError::DatabaseConnection(_)
            | TalentenraadError::DatabaseOperation(_)
            | TalentenraadError::FileOperation(_) => ErrorCode::InternalServerError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::ClapLimitReached).unwrap(), "5000");
        assert_eq!(serde_json::to_string(&ErrorCode::Success).unwrap(), "0");
    }

    #[test]
    fn test_from_error() {
        assert_eq!(
            ErrorCode::from(TalentenraadError::recaptcha("low score")),
            ErrorCode::RecaptchaFailed
        );
        assert_eq!(
            ErrorCode::from(TalentenraadError::database_operation("x")),
            ErrorCode::InternalServerError
        );
    }
}
