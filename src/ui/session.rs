use crate::common::Message;
use crate::error::{CallError, SessionError};
use crate::network::{ChatService, Dialer};

/// What became of a submitted line.
#[derive(Debug)]
pub enum SubmitOutcome {
    Delivered(Vec<Message>),
    /// Delivered by the single retry after a reconnect. `cause` is the error
    /// that broke the first attempt.
    Redelivered { history: Vec<Message>, cause: CallError },
    /// The server refused the message (e.g. empty text). Nothing was retried.
    Rejected(String),
    /// The server answered but the reply was unreadable. The message may have
    /// been stored, so it is not resent.
    Unconfirmed(CallError),
}

/// One user's connection to the chat server plus its retry state.
pub struct Session<D: Dialer> {
    username: String,
    dialer: D,
    conn: D::Conn,
}

impl<D: Dialer> Session<D> {
    pub async fn connect(username: impl Into<String>, dialer: D) -> Result<Self, SessionError> {
        let conn = dialer.dial().await.map_err(|source| SessionError::Connect {
            addr: dialer.endpoint().to_string(),
            source,
        })?;
        Ok(Self {
            username: username.into(),
            dialer,
            conn,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Send `text` as a new message.
    ///
    /// A transport failure gets exactly one reconnect followed by exactly one
    /// resend of the same message. Failure of either ends the session.
    pub async fn submit_text(&mut self, text: &str) -> Result<SubmitOutcome, SessionError> {
        let message = Message::new(self.username.clone(), text);

        let cause = match self.conn.send_message(&message).await {
            Ok(history) => return Ok(SubmitOutcome::Delivered(history)),
            Err(CallError::Remote(reason)) => return Ok(SubmitOutcome::Rejected(reason)),
            Err(err) if !err.is_transport() => return Ok(SubmitOutcome::Unconfirmed(err)),
            Err(cause) => cause,
        };

        log::warn!(
            "SendMessage failed ({cause}); reconnecting to {}",
            self.dialer.endpoint()
        );
        self.conn = match self.dialer.dial().await {
            Ok(conn) => conn,
            Err(source) => return Err(SessionError::Reconnect { cause, source }),
        };

        match self.conn.send_message(&message).await {
            Ok(history) => {
                log::info!("Message resent after reconnect");
                Ok(SubmitOutcome::Redelivered { history, cause })
            }
            Err(err) => Err(SessionError::RetryFailed(err)),
        }
    }

    /// Fetch the full history. Failures are returned to the caller and never
    /// retried.
    pub async fn request_history(&mut self) -> Result<Vec<Message>, CallError> {
        self.conn.fetch_history().await
    }
}
