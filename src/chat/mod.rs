//! Chat application module for interactive conversations with the query
//! endpoint.
//!
//! This module provides a REPL chat interface built on top of the querychat
//! library. It supports:
//!
//! - Progressive reveal of answers with an interrupt to show them at once
//! - Tunable retrieval parameters that freeze while a reply is pending
//! - Slash commands for session control
//! - A debug view of the last raw response or error
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Core chat session management and the request lifecycle
//! - [`commands`]: Slash command parsing and handling
//! - [`render`]: Terminal output

mod commands;
mod config;
mod render;
mod session;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatArgsError, ChatConfig, DEFAULT_USER_ID};
pub use render::{PlainTextRenderer, Renderer};
pub use session::{CONNECTION_ERROR_TEXT, ChatSession, SessionStats, SessionUpdate};
