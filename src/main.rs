use std::error::Error;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use rpc_chat::{app, config};

#[derive(Parser)]
#[command(
    name = "rpc_chat",
    version,
    about = "Shared chat log over a request/response TCP protocol"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Run the history server
    Server {
        /// Address to listen on
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,
        /// Keep at most N messages, dropping the oldest
        #[arg(long, value_name = "N")]
        max_history: Option<usize>,
    },
    /// Join the chat
    Client {
        username: String,
        /// Server address to connect to
        #[arg(long, value_name = "ADDR")]
        server: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let app_config = config::load_config(&cli.config);

    match cli.mode {
        Mode::Server {
            listen,
            max_history,
        } => {
            let app_config = app_config
                .with_listen_addr(listen)
                .with_max_history(max_history);
            app::run_server(&app_config).await?;
        }
        Mode::Client { username, server } => {
            let app_config = app_config.with_server_addr(server);
            if let Err(err) = app::run_client(username, &app_config).await {
                log::error!("Session terminated: {err}");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
