//! System-level modules
//!
//! Logging initialisation shared by the server and CLI entry points.

pub mod logging;
