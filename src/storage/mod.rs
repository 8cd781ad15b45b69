//! Storage backends for the order store

mod in_memory;

pub use in_memory::InMemoryOrderStore;
