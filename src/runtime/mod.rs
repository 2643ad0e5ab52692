//! Application lifecycle
//!
//! - `startup`: wires storage, content backend, push and the shared state
//! - `server`: the actix-web HTTP server
//! - `shutdown`: Ctrl+C handling and graceful stop
//! - `commands`: offline CLI commands (config, data transfer)

pub mod commands;
pub mod server;
pub mod shutdown;
pub mod startup;

pub use commands::{run_config_command, run_data_command};
pub use server::run_server;
