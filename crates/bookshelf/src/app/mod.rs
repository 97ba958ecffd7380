//! Application layer
//!
//! Navigation state, frontend commands, and the controller that runs them.

pub mod controller;
pub mod state;

pub use controller::{command_channel, AppController};
pub use state::{AppCommand, AppSnapshot, Notice, NoticeKind, Screen};
