//! Subgate core library: entity store, membership gate, admin dialogs,
//! Telegram transport and the gateway used by the CLI.

pub mod config;
pub mod dialog;
pub mod gate;
pub mod gateway;
pub mod init;
pub mod routing;
pub mod session;
pub mod store;
pub mod transport;
