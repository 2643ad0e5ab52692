use clap::Parser;
use tracing::error;

use talentenraad::cli::{Cli, Commands};
use talentenraad::config::{DEFAULT_CONFIG_PATH, get_config, init_config_from};
use talentenraad::system::logging::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_config_from(cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH));
    let config = get_config();

    match cli.command {
        None | Some(Commands::Serve) => {
            // guard 必须活到程序结束，否则缓冲的日志会丢失
            let _guard = init_logging(&config.logging)?;
            if let Err(e) = talentenraad::runtime::run_server().await {
                error!("Server exited with error: {:#}", e);
                return Err(e);
            }
            Ok(())
        }
        Some(Commands::Config { action }) => {
            if let Err(e) = talentenraad::runtime::run_config_command(action) {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Commands::Data { action }) => {
            let _guard = init_logging(&config.logging)?;
            if let Err(e) = talentenraad::runtime::run_data_command(action).await {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
