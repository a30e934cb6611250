pub mod chat;
pub mod config;
pub mod conversation;
pub mod dispatch;
pub mod fallback;
pub mod keyring;
pub mod message;
pub mod settings;
pub mod state;
pub mod transport;
pub mod window;
