//! Platform memory for arena blocks.

pub mod constants;
pub mod provider;
pub mod syscall;

pub use provider::{HeapProvider, MemoryProvider, SystemProvider};
