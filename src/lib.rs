//! Parlance is a line-oriented chat client for OpenAI-compatible APIs that
//! degrades to deterministic simulated replies when no key is available.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation, context windowing, settings validation,
//!   dispatch routing (remote call or simulated fallback), and persistence.
//! - [`api`] defines the chat completion payloads exchanged with providers.
//! - [`cli`] parses arguments and runs the interactive loop and one-shot
//!   commands.
//! - [`logging`] installs the diagnostic `tracing` subscriber.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod logging;
pub mod utils;
