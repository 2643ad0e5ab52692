//! API 帮助函数

use std::net::IpAddr;

use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::ConnectionInfo;
use actix_web::http::StatusCode;
use actix_web::{HttpMessage, HttpRequest, HttpResponse};
use serde::Serialize;
use tracing::warn;

use crate::api::session::SessionUser;
use crate::config::ClapConfig;
use crate::errors::TalentenraadError;
use crate::storage::{NewAuditEntry, SeaOrmStorage};

use super::error_code::ErrorCode;
use super::types::ApiResponse;

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

/// 构建成功响应
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

pub fn created_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::CREATED, ErrorCode::Success, "Created", Some(data))
}

/// 构建错误响应
pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// 从 TalentenraadError 构建错误响应（自动映射 HTTP 状态码和 ErrorCode）
pub fn error_from_talentenraad(err: &TalentenraadError) -> HttpResponse {
    let status = err.http_status();
    if status.is_server_error() {
        warn!("API error: {}", err);
    }
    error_response(status, ErrorCode::from(err), err.message())
}

/// 统一 Result → HttpResponse 转换
pub fn api_result<T, E>(result: Result<T, E>) -> HttpResponse
where
    T: Serialize,
    E: Into<TalentenraadError>,
{
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_talentenraad(&e.into()),
    }
}

/// `AdminAuth` 放入请求扩展中的会话用户
pub fn session_user(req: &HttpRequest) -> Result<SessionUser, TalentenraadError> {
    req.extensions()
        .get::<SessionUser>()
        .cloned()
        .ok_or_else(|| TalentenraadError::unauthorized("No session".to_string()))
}

/// 写入审计日志；审计写入失败不回滚已完成的变更
pub async fn audit(storage: &SeaOrmStorage, entry: NewAuditEntry) {
    let action = entry.action.clone();
    if let Err(e) = storage.record_audit(entry).await {
        warn!("Failed to write audit log for {}: {}", action, e);
    }
}

/// 客户端 IP，仅信任来自可信代理的 `X-Forwarded-For`
pub fn client_ip(conn_info: &ConnectionInfo, trusted_proxies: &[String]) -> Option<String> {
    let peer_ip = conn_info.peer_addr()?;
    if !trusted_proxies.is_empty() && is_trusted_proxy(peer_ip, trusted_proxies) {
        Some(conn_info.realip_remote_addr().unwrap_or(peer_ip).to_string())
    } else {
        Some(peer_ip.to_string())
    }
}

/// 检查 IP 是否在可信代理列表中
fn is_trusted_proxy(ip: &str, trusted_proxies: &[String]) -> bool {
    let Ok(ip_addr) = ip.parse::<IpAddr>() else {
        return false;
    };

    trusted_proxies.iter().any(|proxy| {
        if proxy.contains('/') {
            ip_in_cidr(&ip_addr, proxy)
        } else {
            proxy.parse::<IpAddr>().is_ok_and(|p| p == ip_addr)
        }
    })
}

/// CIDR 检查
fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix_len)) = cidr.split_once('/') else {
        return false;
    };
    let Ok(prefix_len): Result<u8, _> = prefix_len.parse() else {
        return false;
    };
    let Ok(network_addr) = network.parse::<IpAddr>() else {
        return false;
    };

    match (ip, network_addr) {
        (IpAddr::V4(ip), IpAddr::V4(net)) => {
            if prefix_len > 32 {
                return false;
            }
            let mask = u32::MAX.checked_shl(32 - prefix_len as u32).unwrap_or(0);
            (u32::from_be_bytes(ip.octets()) & mask) == (u32::from_be_bytes(net.octets()) & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) => {
            if prefix_len > 128 {
                return false;
            }
            let mask = u128::MAX.checked_shl(128 - prefix_len as u32).unwrap_or(0);
            (u128::from_be_bytes(ip.octets()) & mask)
                == (u128::from_be_bytes(net.octets()) & mask)
        }
        _ => false,
    }
}

/// Cookie 构建器（鼓掌会话）
pub struct CookieBuilder {
    secure: bool,
    max_age_days: i64,
    clap_cookie_name: String,
}

impl CookieBuilder {
    pub fn new(config: &ClapConfig) -> Self {
        Self {
            secure: config.cookie_secure,
            max_age_days: config.session_max_age_days.max(1),
            clap_cookie_name: config.session_cookie.clone(),
        }
    }

    pub fn clap_cookie_name(&self) -> &str {
        &self.clap_cookie_name
    }

    pub fn build_clap_session_cookie(&self, session_id: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(self.clap_cookie_name.clone(), session_id);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_secure(self.secure);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_max_age(actix_web::cookie::time::Duration::days(self.max_age_days));
        cookie
    }
}
