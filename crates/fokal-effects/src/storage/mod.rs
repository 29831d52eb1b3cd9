mod memory;

pub use memory::{MemoryAssociationStore, MemoryRecordStore};
