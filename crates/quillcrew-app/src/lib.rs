//! Quillcrew application crate: the HTTP adapter in front of the studio
//! engine, plus a terminal client for quick use without the browser UI.

pub mod cli;
pub mod client;
pub mod web;

pub use cli::{AskArgs, Cli, Commands, ServeArgs};
