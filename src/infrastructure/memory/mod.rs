//! In-Memory Adapters - 内存实现

mod project_store;

pub use project_store::InMemoryProjectStore;
