use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::common::{FETCH_HISTORY, FetchArgs, HistoryReply, Message, Request, Response, SEND_MESSAGE, SendArgs};
use crate::error::{CallError, TransportError};

use super::transport::{FrameReader, FrameWriter, framed};

/// The two operations the history server exposes.
#[async_trait]
pub trait ChatService: Send {
    async fn send_message(&mut self, message: &Message) -> Result<Vec<Message>, CallError>;
    async fn fetch_history(&mut self) -> Result<Vec<Message>, CallError>;
}

/// Opens connections to one fixed server endpoint.
#[async_trait]
pub trait Dialer: Send + Sync {
    type Conn: ChatService;

    fn endpoint(&self) -> &str;
    async fn dial(&self) -> Result<Self::Conn, TransportError>;
}

pub struct TcpDialer {
    addr: String,
}

impl TcpDialer {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    type Conn = RpcClient;

    fn endpoint(&self) -> &str {
        &self.addr
    }

    async fn dial(&self) -> Result<RpcClient, TransportError> {
        let stream = TcpStream::connect(self.addr.as_str()).await?;
        log::info!("Connected to chat server at {}", self.addr);
        Ok(RpcClient::new(stream))
    }
}

/// Client stub for one persistent connection. Calls are strictly sequential.
pub struct RpcClient {
    reader: FrameReader<BufReader<OwnedReadHalf>>,
    writer: FrameWriter<OwnedWriteHalf>,
    next_id: u64,
}

impl RpcClient {
    pub fn new(stream: TcpStream) -> Self {
        let (reader, writer) = framed(stream);
        Self {
            reader,
            writer,
            next_id: 1,
        }
    }

    pub async fn call<P, R>(&mut self, method: &str, params: &P) -> Result<R, CallError>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let id = self.next_id;
        self.next_id += 1;

        let request = Request {
            id,
            method: method.to_string(),
            params: serde_json::to_value(params).map_err(TransportError::from)?,
        };
        self.writer.send(&request).await?;

        let response: Response = self.reader.recv().await?.ok_or(TransportError::Closed)?;
        if response.id != id {
            return Err(TransportError::Mismatch {
                expected: id,
                got: response.id,
            }
            .into());
        }
        if let Some(error) = response.error {
            return Err(CallError::Remote(error));
        }

        let result = response.result.unwrap_or(Value::Null);
        serde_json::from_value(result).map_err(CallError::Protocol)
    }
}

#[async_trait]
impl ChatService for RpcClient {
    async fn send_message(&mut self, message: &Message) -> Result<Vec<Message>, CallError> {
        let args = SendArgs { msg: message.clone() };
        let reply: HistoryReply = self.call(SEND_MESSAGE, &args).await?;
        Ok(reply.history)
    }

    async fn fetch_history(&mut self) -> Result<Vec<Message>, CallError> {
        let reply: HistoryReply = self.call(FETCH_HISTORY, &FetchArgs::default()).await?;
        Ok(reply.history)
    }
}
