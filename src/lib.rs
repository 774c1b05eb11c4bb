//! Shared chat history served over a line-delimited JSON RPC protocol.
//!
//! The server owns one [`storage::HistoryStore`]; clients append messages to
//! it and read it back through [`ui::Session`].

pub mod app;
pub mod common;
pub mod config;
pub mod error;
pub mod network;
pub mod storage;
pub mod ui;
