pub mod protocol;
pub mod types;

pub use protocol::{FETCH_HISTORY, FetchArgs, HistoryReply, Request, Response, SEND_MESSAGE, SendArgs};
pub use types::Message;
