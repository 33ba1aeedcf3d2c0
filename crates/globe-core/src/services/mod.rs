//! Shared service wrappers used across clients.

mod memory;
mod store;

pub use memory::MemoryStore;
pub use store::{DatabaseStore, DurableStore};
