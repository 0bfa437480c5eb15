pub mod memory;

pub use memory::{GuardedWrite, MemoryTable, Record};
