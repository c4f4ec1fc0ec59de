//! Gateway: HTTP server plus the Telegram connector and inbound processor.
//!
//! Single port serves the health probe and the Telegram webhook. Inbound
//! events are handled one at a time by a single processor task.

mod server;

pub use server::{build_router, open_stores, run_gateway, spawn_processor, GatewayState, StoreKind};
