//! Memory allocator interface
//!
//! This module defines the core `Allocator` trait the runtime allocates
//! through. Allocations are handed out as [`Block`]s, offsets into the one
//! region the allocator owns, so callers never hold raw pointers into it.

use thiserror::Error;

/// Memory allocation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
    /// Not enough memory
    #[error("out of memory ({requested} bytes requested, {remaining} free)")]
    OutOfMemory { requested: usize, remaining: usize },
    /// Alignment requirements cannot be satisfied
    #[error("alignment error")]
    AlignmentError,
    /// The backing region has already been released
    #[error("heap used after release")]
    Released,
    /// Block does not lie inside the region, or holds invalid text
    #[error("invalid block at offset {offset} ({size} bytes)")]
    InvalidBlock { offset: usize, size: usize },
}

/// Memory layout helper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLayout {
    size: usize,
    align: usize,
}

impl MemoryLayout {
    /// Byte layout (alignment 1) for `size` bytes
    pub fn bytes(size: usize) -> Self {
        Self { size, align: 1 }
    }

    /// Layout of `len` contiguous values of type `T`, `None` on overflow
    pub fn array<T>(len: usize) -> Option<Self> {
        Some(Self {
            size: std::mem::size_of::<T>().checked_mul(len)?,
            align: std::mem::align_of::<T>(),
        })
    }

    /// Get the size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get the alignment
    pub fn align(&self) -> usize {
        self.align
    }
}

/// An allocated range inside the allocator's region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
    offset: usize,
    size: usize,
}

impl Block {
    pub(crate) fn new(
        offset: usize,
        size: usize,
    ) -> Self {
        Self { offset, size }
    }

    /// Offset from the region base
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Core allocator trait
pub trait Allocator {
    /// Allocate memory with the given layout
    fn alloc(
        &mut self,
        layout: MemoryLayout,
    ) -> Result<Block, AllocError>;

    /// Check that `layout` would fit, without allocating
    fn can_alloc(
        &self,
        layout: MemoryLayout,
    ) -> Result<(), AllocError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_layout_array() {
        let layout = MemoryLayout::array::<i64>(3).unwrap();
        assert_eq!(layout.size(), 24);
        assert!(layout.align() >= 8);
        assert_eq!(MemoryLayout::bytes(5).align(), 1);
        assert!(MemoryLayout::array::<u64>(usize::MAX).is_none());
    }
}
