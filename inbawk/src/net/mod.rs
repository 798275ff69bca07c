//! Replication components: wire messages, the shared store boundary,
//! and the host/client session loops.

pub mod client;
pub mod host;
pub mod messages;
pub mod store;

pub use client::ClientSession;
pub use host::HostSession;
pub use messages::{CardKey, Intent, PlayerView, Snapshot};
pub use store::{MemoryStore, StateStore, StoreError};
