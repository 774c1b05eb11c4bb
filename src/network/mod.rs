pub mod client;
pub mod server;
pub mod transport;

pub use client::{ChatService, Dialer, RpcClient, TcpDialer};
pub use server::{ChatServer, listen};
