#![forbid(unsafe_code)]

//! Backend synchronization for TagDeck.
//!
//! The editor state machine in `tagdeck-state` never performs I/O. This
//! crate supplies the other half: the backend wire contract, an HTTP and an
//! in-memory implementation of it, order persistence with
//! retry-on-next-mutation, and [`EditorSession`], which sequences local
//! mutations with their backend calls.

pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod order_sync;
pub mod session;
pub mod wire;

pub use backend::{CatalogBackend, MemoryBackend};
pub use config::SyncConfig;
pub use error::SyncError;
pub use http::HttpBackend;
pub use order_sync::OrderSyncClient;
pub use session::{EditorSession, await_processing};
pub use wire::{Endpoint, ProcessingStatus, UndoResponse, UploadStatus};
