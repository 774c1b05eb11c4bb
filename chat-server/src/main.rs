use clap::Parser;
use dotenvy::dotenv;
use rpc_chat::{app, config};

#[derive(Parser)]
#[command(name = "chat-server", version, about = "Chat history server")]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Address to listen on
    #[arg(long, value_name = "ADDR")]
    listen: Option<String>,
    /// Keep at most N messages, dropping the oldest
    #[arg(long, value_name = "N")]
    max_history: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let app_config = config::load_config(&cli.config)
        .with_listen_addr(cli.listen)
        .with_max_history(cli.max_history);

    log::info!("Starting chat server...");
    if let Err(err) = app::run_server(&app_config).await {
        log::error!("Chat server error: {}", err);
        return Err(err.into());
    }

    Ok(())
}
