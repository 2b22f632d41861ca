//! Storage adapter: translates graph/memory operations into calls against a
//! generic store client, keeping the JSON wire format behind typed rows.

mod adapter;
mod client;
mod memory;
mod rows;

pub use adapter::{MemoryStore, LINKS_COLLECTION, NOTES_COLLECTION, SIMILARITY_RPC};
pub use client::StoreClient;
pub use memory::InMemoryStoreClient;
pub use recall_types::AdapterError;
pub use rows::{LinkRow, NoteRow};
