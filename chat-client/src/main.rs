use clap::Parser;
use dotenvy::dotenv;
use rpc_chat::{app, config};

#[derive(Parser)]
#[command(name = "chat-client", version, about = "Interactive chat client")]
struct Cli {
    /// Name shown next to your messages
    username: String,
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Server address to connect to
    #[arg(long, value_name = "ADDR")]
    server: Option<String>,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    // Khởi tạo Logger để debug
    env_logger::init();

    let cli = Cli::parse();
    let app_config = config::load_config(&cli.config).with_server_addr(cli.server);

    if let Err(err) = app::run_client(cli.username, &app_config).await {
        log::error!("Session terminated: {err}");
        std::process::exit(1);
    }
}
