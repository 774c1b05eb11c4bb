use std::fmt::{Display, Write};

use chrono::{Local, TimeZone};

use crate::common::Message;

pub const EMPTY_HISTORY: &str = "[No messages yet]";
const HEADER: &str = "----- Chat history -----";
const FOOTER: &str = "------------------------";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a history for the terminal, timestamps in local time.
pub fn render_history(history: &[Message]) -> String {
    render_history_in(history, &Local)
}

pub fn render_history_in<Tz>(history: &[Message], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if history.is_empty() {
        return EMPTY_HISTORY.to_string();
    }

    let mut out = String::from(HEADER);
    for (index, message) in history.iter().enumerate() {
        let _ = write!(
            out,
            "\n{}) [{}] {}: {}",
            index + 1,
            message.timestamp.with_timezone(tz).format(TIME_FORMAT),
            message.author,
            message.text
        );
    }
    out.push('\n');
    out.push_str(FOOTER);
    out
}
