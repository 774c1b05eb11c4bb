//! Entry points shared by the `rpc_chat`, `chat-server` and `chat-client` binaries.

use std::sync::Arc;

use tokio::io::{BufReader, stdin, stdout};
use tokio::signal;

use crate::config::AppConfig;
use crate::error::SessionError;
use crate::network::{ChatServer, TcpDialer, listen};
use crate::storage::HistoryStore;
use crate::ui::{Session, run_console};

/// Serve the chat history until Ctrl-C.
pub async fn run_server(config: &AppConfig) -> std::io::Result<()> {
    let store = Arc::new(HistoryStore::with_limit(config.max_history));
    match store.capacity() {
        Some(limit) => log::info!("History capped at {limit} messages"),
        None => log::info!("History is unbounded"),
    }

    let listener = listen(config.listen_addr.as_str()).await?;
    let server = ChatServer::new(Arc::clone(&store));

    tokio::select! {
        _ = server.serve(listener) => {}
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => log::info!("Received shutdown signal, stopping chat server..."),
                Err(err) => log::error!("Failed to listen for shutdown signal: {err}"),
            }
        }
    }

    log::info!("Final statistics: {} messages in history", store.len());
    Ok(())
}

/// Join the chat as `username` using stdin/stdout.
pub async fn run_client(username: String, config: &AppConfig) -> Result<(), SessionError> {
    let dialer = TcpDialer::new(config.server_addr.clone());
    let mut session = match Session::connect(username, dialer).await {
        Ok(session) => session,
        Err(err) => {
            println!("{err}");
            return Err(err);
        }
    };

    let mut output = stdout();
    run_console(&mut session, BufReader::new(stdin()), &mut output).await
}
