use actix_web::http::StatusCode;
use std::fmt;

#[derive(Debug, Clone)]
pub enum TalentenraadError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    Serialization(String),
    Cms(String),
    PushDelivery(String),
    Recaptcha(String),
    ClapLimit(String),
}

impl TalentenraadError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            TalentenraadError::DatabaseConfig(_) => "E001",
            TalentenraadError::DatabaseConnection(_) => "E002",
            TalentenraadError::DatabaseOperation(_) => "E003",
            TalentenraadError::FileOperation(_) => "E004",
            TalentenraadError::Validation(_) => "E005",
            TalentenraadError::NotFound(_) => "E006",
            TalentenraadError::Unauthorized(_) => "E007",
            TalentenraadError::Forbidden(_) => "E008",
            TalentenraadError::Serialization(_) => "E009",
            TalentenraadError::Cms(_) => "E010",
            TalentenraadError::PushDelivery(_) => "E011",
            TalentenraadError::Recaptcha(_) => "E012",
            TalentenraadError::ClapLimit(_) => "E013",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            TalentenraadError::DatabaseConfig(_) => "Database Configuration Error",
            TalentenraadError::DatabaseConnection(_) => "Database Connection Error",
            TalentenraadError::DatabaseOperation(_) => "Database Operation Error",
            TalentenraadError::FileOperation(_) => "File Operation Error",
            TalentenraadError::Validation(_) => "Validation Error",
            TalentenraadError::NotFound(_) => "Resource Not Found",
            TalentenraadError::Unauthorized(_) => "Unauthorized",
            TalentenraadError::Forbidden(_) => "Forbidden",
            TalentenraadError::Serialization(_) => "Serialization Error",
            TalentenraadError::Cms(_) => "CMS Error",
            TalentenraadError::PushDelivery(_) => "Push Delivery Error",
            TalentenraadError::Recaptcha(_) => "reCAPTCHA Verification Failed",
            TalentenraadError::ClapLimit(_) => "Clap Limit Reached",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            TalentenraadError::DatabaseConfig(msg)
            | TalentenraadError::DatabaseConnection(msg)
            | TalentenraadError::DatabaseOperation(msg)
            | TalentenraadError::FileOperation(msg)
            | TalentenraadError::Validation(msg)
            | TalentenraadError::NotFound(msg)
            | TalentenraadError::Unauthorized(msg)
            | TalentenraadError::Forbidden(msg)
            | TalentenraadError::Serialization(msg)
            | TalentenraadError::Cms(msg)
            | TalentenraadError::PushDelivery(msg)
            | TalentenraadError::Recaptcha(msg)
            | TalentenraadError::ClapLimit(msg) => msg,
        }
    }

    /// API 层返回的 HTTP 状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            TalentenraadError::Validation(_)
            | TalentenraadError::Serialization(_)
            | TalentenraadError::Recaptcha(_) => StatusCode::BAD_REQUEST,
            TalentenraadError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            TalentenraadError::Forbidden(_) => StatusCode::FORBIDDEN,
            TalentenraadError::NotFound(_) => StatusCode::NOT_FOUND,
            TalentenraadError::ClapLimit(_) => StatusCode::TOO_MANY_REQUESTS,
            TalentenraadError::Cms(_)
            | TalentenraadError::PushDelivery(_)
            | TalentenraadError::DatabaseConfig(_)
            | TalentenraadError::DatabaseConnection(_)
            | TalentenraadError::DatabaseOperation(_)
            | TalentenraadError::FileOperation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for TalentenraadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for TalentenraadError {}

// 便捷的构造函数
impl TalentenraadError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        TalentenraadError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        TalentenraadError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        TalentenraadError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        TalentenraadError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        TalentenraadError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        TalentenraadError::NotFound(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        TalentenraadError::Unauthorized(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        TalentenraadError::Forbidden(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        TalentenraadError::Serialization(msg.into())
    }

    pub fn cms<T: Into<String>>(msg: T) -> Self {
        TalentenraadError::Cms(msg.into())
    }

    pub fn push_delivery<T: Into<String>>(msg: T) -> Self {
        TalentenraadError::PushDelivery(msg.into())
    }

    pub fn recaptcha<T: Into<String>>(msg: T) -> Self {
        TalentenraadError::Recaptcha(msg.into())
    }

    pub fn clap_limit<T: Into<String>>(msg: T) -> Self {
        TalentenraadError::ClapLimit(msg.into())
    }
}

impl From<sea_orm::DbErr> for TalentenraadError {
    fn from(err: sea_orm::DbErr) -> Self {
        TalentenraadError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for TalentenraadError {
    fn from(err: std::io::Error) -> Self {
        TalentenraadError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for TalentenraadError {
    fn from(err: serde_json::Error) -> Self {
        TalentenraadError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TalentenraadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let errors = [
            TalentenraadError::database_config("x"),
            TalentenraadError::database_connection("x"),
            TalentenraadError::database_operation("x"),
            TalentenraadError::file_operation("x"),
            TalentenraadError::validation("x"),
            TalentenraadError::not_found("x"),
            TalentenraadError::unauthorized("x"),
            TalentenraadError::forbidden("x"),
            TalentenraadError::serialization("x"),
            TalentenraadError::cms("x"),
            TalentenraadError::push_delivery("x"),
            TalentenraadError::recaptcha("x"),
            TalentenraadError::clap_limit("x"),
        ];
        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            TalentenraadError::unauthorized("no session").http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            TalentenraadError::forbidden("not admin").http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            TalentenraadError::not_found("gone").http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            TalentenraadError::clap_limit("max").http_status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            TalentenraadError::database_operation("boom").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_format_simple() {
        let err = TalentenraadError::validation("email is required");
        assert_eq!(err.format_simple(), "Validation Error: email is required");
        assert_eq!(err.to_string(), err.format_simple());
    }

    #[test]
    fn test_from_serde_error() {
        let err: TalentenraadError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), "E009");
    }
}
