//! Scripted transport used by the session and console tests.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::common::Message;
use crate::error::{CallError, TransportError};
use crate::network::{ChatService, Dialer};
use crate::storage::HistoryStore;

/// How the next dialed connection behaves.
#[derive(Debug, Clone, Copy)]
pub enum Plan {
    Healthy,
    /// Dial succeeds, every call fails as if the peer hung up.
    Severed,
    /// Dial itself fails.
    Unreachable,
    /// Sends are stored but the reply cannot be decoded.
    Garbled,
}

#[derive(Clone)]
pub struct Probe {
    store: Arc<HistoryStore>,
    dials: Arc<AtomicUsize>,
}

impl Probe {
    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }
}

pub struct ScriptedDialer {
    plans: Mutex<VecDeque<Plan>>,
    probe: Probe,
}

impl ScriptedDialer {
    pub fn new(plans: impl IntoIterator<Item = Plan>) -> Self {
        Self {
            plans: Mutex::new(plans.into_iter().collect()),
            probe: Probe {
                store: Arc::new(HistoryStore::new()),
                dials: Arc::new(AtomicUsize::new(0)),
            },
        }
    }

    pub fn probe(&self) -> Probe {
        self.probe.clone()
    }
}

#[async_trait]
impl Dialer for ScriptedDialer {
    type Conn = ScriptedConn;

    fn endpoint(&self) -> &str {
        "scripted:1234"
    }

    async fn dial(&self) -> Result<ScriptedConn, TransportError> {
        self.probe.dials.fetch_add(1, Ordering::SeqCst);
        let plan = self.plans.lock().unwrap().pop_front().unwrap_or(Plan::Unreachable);
        match plan {
            Plan::Unreachable => Err(io::Error::from(io::ErrorKind::ConnectionRefused).into()),
            Plan::Healthy => Ok(ScriptedConn {
                store: Some(Arc::clone(&self.probe.store)),
                garbled: false,
            }),
            Plan::Garbled => Ok(ScriptedConn {
                store: Some(Arc::clone(&self.probe.store)),
                garbled: true,
            }),
            Plan::Severed => Ok(ScriptedConn {
                store: None,
                garbled: false,
            }),
        }
    }
}

pub struct ScriptedConn {
    store: Option<Arc<HistoryStore>>,
    garbled: bool,
}

impl ScriptedConn {
    fn store(&self) -> Result<&HistoryStore, CallError> {
        self.store.as_deref().ok_or(CallError::Transport(TransportError::Closed))
    }
}

#[async_trait]
impl ChatService for ScriptedConn {
    async fn send_message(&mut self, message: &Message) -> Result<Vec<Message>, CallError> {
        let history = self
            .store()?
            .append(message.clone())
            .map_err(|err| CallError::Remote(err.to_string()))?;
        if self.garbled {
            let err = serde_json::from_str::<Vec<Message>>("{\"history\":").unwrap_err();
            return Err(CallError::Protocol(err));
        }
        Ok(history)
    }

    async fn fetch_history(&mut self) -> Result<Vec<Message>, CallError> {
        Ok(self.store()?.fetch())
    }
}
