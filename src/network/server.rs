use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};

use crate::common::{FETCH_HISTORY, HistoryReply, Request, Response, SEND_MESSAGE, SendArgs};
use crate::error::TransportError;
use crate::storage::HistoryStore;

use super::transport::{framed, is_blank};

/// Pause after a failed accept so persistent errors (e.g. EMFILE) do not spin.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Bind the listening socket for the chat server.
pub async fn listen<A: ToSocketAddrs>(addr: A) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    log::info!("Chat RPC server listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Source of inbound connections for [`ChatServer::serve`].
#[async_trait]
pub trait Acceptor: Send {
    async fn accept(&mut self) -> std::io::Result<(TcpStream, SocketAddr)>;
}

#[async_trait]
impl Acceptor for TcpListener {
    async fn accept(&mut self) -> std::io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }
}

/// Dispatches remote calls onto a shared [`HistoryStore`].
///
/// Cloning is cheap; every connection handler gets its own clone pointing at
/// the same store.
#[derive(Clone)]
pub struct ChatServer {
    store: Arc<HistoryStore>,
}

impl ChatServer {
    pub fn new(store: Arc<HistoryStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<HistoryStore> {
        &self.store
    }

    /// Accept connections forever, one task per connection. A failed accept
    /// is logged and the loop carries on after [`ACCEPT_BACKOFF`].
    pub async fn serve<A: Acceptor>(&self, mut listener: A) {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let server = self.clone();
                    tokio::spawn(async move {
                        server.handle_connection(stream, peer).await;
                    });
                }
                Err(err) => {
                    log::warn!("Accept error: {err}");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }

    pub async fn handle_connection(&self, stream: TcpStream, peer: SocketAddr) {
        log::info!("Client connected: {peer}");
        match self.serve_connection(stream, peer).await {
            Ok(()) => log::info!("Client disconnected: {peer}"),
            Err(err) => log::warn!("Connection with {peer} ended: {err}"),
        }
    }

    async fn serve_connection(&self, stream: TcpStream, peer: SocketAddr) -> Result<(), TransportError> {
        let (mut reader, mut writer) = framed(stream);

        while let Some(frame) = reader.next_frame().await? {
            if is_blank(frame) {
                continue;
            }
            let response = match serde_json::from_slice::<Request>(frame) {
                Ok(request) => {
                    log::debug!("{peer} -> {} (id {})", request.method, request.id);
                    self.dispatch(request)
                }
                Err(err) => {
                    log::warn!("Malformed request from {peer}: {err}");
                    Response::failure(salvage_id(frame), format!("malformed request: {err}"))
                }
            };
            writer.send(&response).await?;
        }

        Ok(())
    }

    pub fn dispatch(&self, request: Request) -> Response {
        let Request { id, method, params } = request;
        let outcome = match method.as_str() {
            SEND_MESSAGE => self.send_message(params),
            FETCH_HISTORY => Ok(self.fetch_history()),
            other => Err(format!("unknown method {other}")),
        };

        match outcome {
            Ok(reply) => Response::success(id, &reply),
            Err(error) => Response::failure(id, error),
        }
    }

    fn send_message(&self, params: Value) -> Result<HistoryReply, String> {
        let args: SendArgs = serde_json::from_value(params)
            .map_err(|err| format!("invalid params for {SEND_MESSAGE}: {err}"))?;
        let history = self.store.append(args.msg).map_err(|err| err.to_string())?;
        Ok(HistoryReply { history })
    }

    fn fetch_history(&self) -> HistoryReply {
        HistoryReply {
            history: self.store.fetch(),
        }
    }
}

/// Best-effort recovery of the request id from a frame that failed to decode.
fn salvage_id(frame: &[u8]) -> u64 {
    serde_json::from_slice::<Value>(frame)
        .ok()
        .and_then(|value| value.get("id").and_then(Value::as_u64))
        .unwrap_or(0)
}
