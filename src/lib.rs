//! Talentenraad - backend of the parents' association website
//!
//! This library provides the server side of the site: CMS content access,
//! visitor claps, form submissions, web push notifications and the admin API.
//!
//! # Architecture
//! - `api`: HTTP handlers, middleware and shared state
//! - `cms`: content backend client (Builder.io) and typed content models
//! - `storage`: relational database access (sea-orm)
//! - `claps`, `notifications`, `settings`, `recaptcha`: domain services
//! - `editing`: client-side pending-change aggregation for edit mode
//! - `calendar`: Dutch date formatting and iCalendar export
//! - `config`: configuration management
//! - `runtime`: application lifecycle and execution modes
//! - `system`: logging

pub mod api;
pub mod calendar;
pub mod claps;
pub mod cli;
pub mod cms;
pub mod config;
pub mod editing;
pub mod errors;
pub mod http;
pub mod notifications;
pub mod recaptcha;
pub mod runtime;
pub mod settings;
pub mod storage;
pub mod system;
