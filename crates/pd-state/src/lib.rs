//! pd-state: Session store, display sync, backups and import
//!
//! Provides the authoritative session for one draw event:
//! - `SessionStore` owning the roster, draw machine and display settings
//! - Full-state snapshots pushed to subscribers after every mutation
//! - Auto-backup slots and user snapshots through a pluggable store
//! - Tabular import of participants, prizes and winners

mod error;
mod config;
mod snapshot;
mod sync;
mod backup;
mod manager;
mod codec;
mod import;
mod store;

pub use error::*;
pub use config::*;
pub use snapshot::*;
pub use sync::*;
pub use backup::*;
pub use manager::*;
pub use codec::*;
pub use import::*;
pub use store::*;
