use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// 站点默认时区
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Brussels;

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 优先级：ENV > config.toml > 默认值。
/// ENV 前缀 `TR`，分隔符 `__`，例如 `TR__SERVER__PORT=9000`。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cms: CmsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub recaptcha: RecaptchaConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub claps: ClapConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    pub fn load(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖，前缀 TR，分隔符 __
            .add_source(
                Environment::with_prefix("TR")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.admin_emails")
                    .with_list_parse_key("cms.models")
                    .with_list_parse_key("cors.allowed_origins")
                    .with_list_parse_key("server.trusted_proxies")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    /// 站点对外地址，用于通知中的链接
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// 站点所在时区（IANA 名称）。CMS 中的日期按当地时间录入，
    /// 全天活动、月份分组和"即将举行"判断都按此时区取日期
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// 可信代理（IP 或 CIDR），只信任它们传来的 `X-Forwarded-For`
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// Builder.io 内容服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmsConfig {
    /// 内容读取 API，例如 `https://cdn.builder.io/api/v3/content`
    #[serde(default = "default_cms_api_url")]
    pub api_url: String,
    /// 写入 API，例如 `https://builder.io/api/v1/write`
    #[serde(default = "default_cms_write_url")]
    pub write_url: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub private_key: String,
    #[serde(default = "default_cms_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cms_timeout")]
    pub timeout_secs: u64,
    /// 允许通过 API 读取和编辑的模型
    #[serde(default = "default_cms_models")]
    pub models: Vec<String>,
}

/// 会话认证配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    /// 认证服务签发会话 token 所用的 HS256 密钥
    #[serde(default)]
    pub session_secret: String,
    /// 始终拥有管理权限的邮箱
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

/// reCAPTCHA 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecaptchaConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_recaptcha_verify_url")]
    pub verify_url: String,
    #[serde(default = "default_recaptcha_min_score")]
    pub min_score: f64,
}

/// Web Push (VAPID) 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    #[serde(default = "default_vapid_subject")]
    pub vapid_subject: String,
    /// 未压缩的 P-256 公钥，base64url 编码（与浏览器端一致）
    #[serde(default)]
    pub vapid_public_key: String,
    /// 对应私钥的 PKCS#8 PEM
    #[serde(default)]
    pub vapid_private_key_pem: String,
    #[serde(default = "default_push_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_push_concurrency")]
    pub concurrency: usize,
}

/// 鼓掌计数配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClapConfig {
    #[serde(default = "default_max_claps_per_session")]
    pub max_per_session: u32,
    #[serde(default = "default_clap_session_cookie")]
    pub session_cookie: String,
    #[serde(default = "default_clap_session_max_age_days")]
    pub session_max_age_days: i64,
    #[serde(default = "default_cookie_secure")]
    pub cookie_secure: bool,
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CorsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

// ============================================================
// 默认值函数
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.name().to_string()
}

fn default_database_url() -> String {
    "talentenraad.db".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_cms_api_url() -> String {
    "https://cdn.builder.io/api/v3/content".to_string()
}

fn default_cms_write_url() -> String {
    "https://builder.io/api/v1/write".to_string()
}

fn default_cms_cache_ttl() -> u64 {
    60
}

fn default_cms_timeout() -> u64 {
    10
}

fn default_cms_models() -> Vec<String> {
    ["nieuws", "activiteit", "aankondiging", "page"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

fn default_session_cookie() -> String {
    "tr_session".to_string()
}

fn default_recaptcha_verify_url() -> String {
    "https://www.google.com/recaptcha/api/siteverify".to_string()
}

fn default_recaptcha_min_score() -> f64 {
    0.5
}

fn default_vapid_subject() -> String {
    "mailto:webteam@talentenraad.be".to_string()
}

fn default_push_ttl() -> u64 {
    24 * 60 * 60
}

fn default_push_concurrency() -> usize {
    16
}

fn default_max_claps_per_session() -> u32 {
    50
}

fn default_clap_session_cookie() -> String {
    "tr_clap_session".to_string()
}

fn default_clap_session_max_age_days() -> i64 {
    365
}

fn default_cookie_secure() -> bool {
    true
}

// ============================================================
// Default 实现
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            public_url: default_public_url(),
            timezone: default_timezone(),
            trusted_proxies: Vec::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            api_url: default_cms_api_url(),
            write_url: default_cms_write_url(),
            public_key: String::new(),
            private_key: String::new(),
            cache_ttl_secs: default_cms_cache_ttl(),
            timeout_secs: default_cms_timeout(),
            models: default_cms_models(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie: default_session_cookie(),
            session_secret: String::new(),
            admin_emails: Vec::new(),
        }
    }
}

impl Default for RecaptchaConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            secret: String::new(),
            verify_url: default_recaptcha_verify_url(),
            min_score: default_recaptcha_min_score(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            vapid_subject: default_vapid_subject(),
            vapid_public_key: String::new(),
            vapid_private_key_pem: String::new(),
            ttl_secs: default_push_ttl(),
            concurrency: default_push_concurrency(),
        }
    }
}

impl Default for ClapConfig {
    fn default() -> Self {
        Self {
            max_per_session: default_max_claps_per_session(),
            session_cookie: default_clap_session_cookie(),
            session_max_age_days: default_clap_session_max_age_days(),
            cookie_secure: default_cookie_secure(),
        }
    }
}

impl AuthConfig {
    /// 邮箱白名单检查，忽略大小写
    pub fn is_allowlisted(&self, email: &str) -> bool {
        let email = email.trim();
        self.admin_emails
            .iter()
            .any(|allowed| allowed.trim().eq_ignore_ascii_case(email))
    }
}

impl ServerConfig {
    /// 解析 `timezone`，无法识别时回退到 `DEFAULT_TIMEZONE`
    pub fn tz(&self) -> Tz {
        self.timezone.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "Unknown timezone '{}', falling back to {}",
                self.timezone,
                DEFAULT_TIMEZONE.name()
            );
            DEFAULT_TIMEZONE
        })
    }
}

impl CmsConfig {
    pub fn is_known_model(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }
}
