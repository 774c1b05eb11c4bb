//! Line-oriented terminal loop driving a [`Session`].

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::SessionError;
use crate::network::Dialer;

use super::render::render_history;
use super::session::{Session, SubmitOutcome};

pub const EXIT_COMMAND: &str = "exit";
pub const HISTORY_COMMAND: &str = "/history";

#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Exit,
    History,
    Say(&'a str),
    Blank,
}

pub fn parse_command(line: &str) -> Command<'_> {
    match line.trim() {
        EXIT_COMMAND => Command::Exit,
        HISTORY_COMMAND => Command::History,
        "" => Command::Blank,
        text => Command::Say(text),
    }
}

/// Run the interactive loop until `exit`, end of input, or a fatal error.
///
/// Fatal errors are printed to `output` before being returned.
pub async fn run_console<D, R, W>(session: &mut Session<D>, input: R, output: &mut W) -> Result<(), SessionError>
where
    D: Dialer,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    print(
        output,
        &format!(
            "Hello {}! Type messages and press Enter. Type '{EXIT_COMMAND}' to quit. Type '{HISTORY_COMMAND}' to fetch history.\n",
            session.username()
        ),
    )
    .await?;

    loop {
        print(output, "> ").await?;
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                print(output, "\nbye!\n").await?;
                return Ok(());
            }
            Err(err) => {
                print(output, &format!("read error: {err}\n")).await?;
                return Err(SessionError::Input(err));
            }
        };

        match parse_command(&line) {
            Command::Blank => continue,
            Command::Exit => {
                print(output, "bye!\n").await?;
                return Ok(());
            }
            Command::History => match session.request_history().await {
                Ok(history) => print(output, &format!("{}\n", render_history(&history))).await?,
                Err(err) => print(output, &format!("RPC error (FetchHistory): {err}\n")).await?,
            },
            Command::Say(text) => match session.submit_text(text).await {
                Ok(SubmitOutcome::Delivered(history)) => {
                    print(output, &format!("{}\n", render_history(&history))).await?
                }
                Ok(SubmitOutcome::Redelivered { history, cause }) => {
                    print(
                        output,
                        &format!("RPC error (SendMessage): {cause}\nreconnected and resent.\n{}\n", render_history(&history)),
                    )
                    .await?
                }
                Ok(SubmitOutcome::Rejected(reason)) => {
                    print(output, &format!("RPC error (SendMessage): {reason}\n")).await?
                }
                Ok(SubmitOutcome::Unconfirmed(err)) => {
                    print(output, &format!("RPC error (SendMessage): {err}; not resent\n")).await?
                }
                Err(err) => {
                    print(output, &format!("{err}\n")).await?;
                    return Err(err);
                }
            },
        }
    }
}

async fn print<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> std::io::Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.flush().await
}
