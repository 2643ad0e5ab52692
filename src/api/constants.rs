//! API constants

/// Scope of all API routes
pub const API_PREFIX: &str = "/api";

/// Scope of the authenticated admin routes, relative to `API_PREFIX`
pub const ADMIN_SCOPE: &str = "/admin";

/// Maximum accepted JSON body (data import documents can be large)
pub const JSON_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Default and maximum page sizes of admin listings
pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 200;

/// Default number of entries of a public content listing
pub const PUBLIC_CONTENT_LIMIT: u32 = 20;

/// Submission form limits
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_SUBJECT_LEN: usize = 200;
pub const MAX_MESSAGE_LEN: usize = 5_000;

/// Submission rate limit: one token every `SUBMISSION_SECONDS_PER_REQUEST`,
/// bursts up to `SUBMISSION_BURST`
pub const SUBMISSION_SECONDS_PER_REQUEST: u64 = 30;
pub const SUBMISSION_BURST: u32 = 3;
