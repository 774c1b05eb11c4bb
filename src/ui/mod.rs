pub mod console;
pub mod render;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use console::run_console;
pub use render::{render_history, render_history_in};
pub use session::{Session, SubmitOutcome};
