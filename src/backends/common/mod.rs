//! Common backend components
//!
//! This module provides the memory side shared by every execution path:
//! - Allocator interface and layouts
//! - The runtime heap and its lease

pub mod allocator;
pub mod heap;

// Re-exports for convenience
pub use allocator::{AllocError, Allocator, Block, MemoryLayout};
pub use heap::{AllocationFailure, HeapLease, HeapProvider, RuntimeHeap, SystemHeap};
