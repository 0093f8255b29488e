pub mod engine;
pub mod memory;

pub use engine::StorageDriver;
pub use memory::{MemoryDriver, MemoryError, WriteOp};
