//! Runtime heap and its lifecycle
//!
//! The runtime executes against exactly one fixed-size byte region. A
//! [`HeapProvider`] reserves that region from the host environment and takes
//! it back; a [`HeapLease`] ties the two together so the region is returned
//! exactly once on every exit path, unwinding included.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::{debug, info};

use super::allocator::{AllocError, Allocator, Block, MemoryLayout};

/// The host environment could not reserve the runtime heap.
///
/// Fatal: the runtime cannot execute without its heap.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("heap allocation failed ({size} bytes)")]
pub struct AllocationFailure {
    /// Requested size in bytes
    pub size: usize,
}

/// Source of the runtime heap region
pub trait HeapProvider {
    /// Reserve exactly `size` bytes
    fn acquire(
        &mut self,
        size: usize,
    ) -> Result<Box<[u8]>, AllocationFailure>;

    /// Take back a region handed out by `acquire`
    fn release(
        &mut self,
        region: Box<[u8]>,
    );
}

/// Provider backed by the process allocator.
///
/// Reservation is fallible: a size the allocator refuses becomes an
/// [`AllocationFailure`] instead of an abort.
#[derive(Debug, Default)]
pub struct SystemHeap;

impl HeapProvider for SystemHeap {
    fn acquire(
        &mut self,
        size: usize,
    ) -> Result<Box<[u8]>, AllocationFailure> {
        let mut buffer: Vec<u8> = Vec::new();
        buffer
            .try_reserve_exact(size)
            .map_err(|_| AllocationFailure { size })?;
        buffer.resize(size, 0);
        Ok(buffer.into_boxed_slice())
    }

    fn release(
        &mut self,
        region: Box<[u8]>,
    ) {
        drop(region);
    }
}

/// Source of [`RuntimeHeap::id`]
static NEXT_HEAP_ID: AtomicU64 = AtomicU64::new(1);

/// The single heap the runtime allocates from.
///
/// Bump allocation over the region `[0, capacity)`. Individual blocks are
/// never freed; the whole region goes back to the provider at release.
/// Once released, every allocation or access fails with
/// [`AllocError::Released`].
pub struct RuntimeHeap {
    /// Distinguishes this heap from every other one created in the process
    id: u64,
    /// Backing region, `None` once released
    region: Option<Box<[u8]>>,
    /// Current position in the region
    next: usize,
    /// Number of successful allocations
    allocations: usize,
}

impl RuntimeHeap {
    /// Wrap a reserved region
    pub fn new(region: Box<[u8]>) -> Self {
        Self {
            id: NEXT_HEAP_ID.fetch_add(1, Ordering::Relaxed),
            region: Some(region),
            next: 0,
            allocations: 0,
        }
    }

    /// Identity of this heap. Blocks from one heap mean nothing in another.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Total size of the region (0 once released)
    pub fn capacity(&self) -> usize {
        self.region.as_ref().map_or(0, |r| r.len())
    }

    /// Get used bytes
    pub fn used(&self) -> usize {
        self.next
    }

    /// Get remaining capacity
    pub fn remaining(&self) -> usize {
        self.capacity().saturating_sub(self.next)
    }

    /// Number of blocks handed out so far
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    /// Whether the region has gone back to its provider
    pub fn is_released(&self) -> bool {
        self.region.is_none()
    }

    /// Detach the region; later calls return `None`.
    pub(crate) fn take_region(&mut self) -> Option<Box<[u8]>> {
        self.region.take()
    }

    /// Read the bytes of a block
    pub fn bytes(
        &self,
        block: Block,
    ) -> Result<&[u8], AllocError> {
        let region = self.region.as_ref().ok_or(AllocError::Released)?;
        region
            .get(block.offset()..block.offset() + block.size())
            .ok_or(AllocError::InvalidBlock {
                offset: block.offset(),
                size: block.size(),
            })
    }

    /// Write access to the bytes of a block
    pub fn bytes_mut(
        &mut self,
        block: Block,
    ) -> Result<&mut [u8], AllocError> {
        let region = self.region.as_mut().ok_or(AllocError::Released)?;
        region
            .get_mut(block.offset()..block.offset() + block.size())
            .ok_or(AllocError::InvalidBlock {
                offset: block.offset(),
                size: block.size(),
            })
    }

    /// Copy a string into the heap
    pub fn alloc_str(
        &mut self,
        text: &str,
    ) -> Result<Block, AllocError> {
        let block = self.alloc(MemoryLayout::bytes(text.len()))?;
        self.bytes_mut(block)?.copy_from_slice(text.as_bytes());
        Ok(block)
    }

    /// View a block written by [`RuntimeHeap::alloc_str`]
    pub fn str(
        &self,
        block: Block,
    ) -> Result<&str, AllocError> {
        std::str::from_utf8(self.bytes(block)?).map_err(|_| AllocError::InvalidBlock {
            offset: block.offset(),
            size: block.size(),
        })
    }
}

impl fmt::Debug for RuntimeHeap {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("RuntimeHeap")
            .field("id", &self.id)
            .field("capacity", &self.capacity())
            .field("used", &self.next)
            .field("allocations", &self.allocations)
            .field("released", &self.is_released())
            .finish()
    }
}

impl RuntimeHeap {
    /// Offset and end a `layout` allocation would occupy
    fn place(
        &self,
        layout: MemoryLayout,
    ) -> Result<(usize, usize), AllocError> {
        let capacity = match &self.region {
            Some(region) => region.len(),
            None => return Err(AllocError::Released),
        };
        let size = layout.size();
        let align = layout.align();

        let aligned = self
            .next
            .checked_add(align - 1)
            .ok_or(AllocError::AlignmentError)?
            & !(align - 1);

        match aligned.checked_add(size) {
            Some(end) if end <= capacity => Ok((aligned, end)),
            _ => Err(AllocError::OutOfMemory {
                requested: size,
                remaining: capacity.saturating_sub(self.next),
            }),
        }
    }
}

impl Allocator for RuntimeHeap {
    fn alloc(
        &mut self,
        layout: MemoryLayout,
    ) -> Result<Block, AllocError> {
        let (offset, end) = self.place(layout)?;
        self.next = end;
        self.allocations += 1;
        Ok(Block::new(offset, layout.size()))
    }

    fn can_alloc(
        &self,
        layout: MemoryLayout,
    ) -> Result<(), AllocError> {
        self.place(layout).map(|_| ())
    }
}

/// Scoped ownership of the runtime heap.
///
/// Acquiring a lease reserves the region; dropping it gives the region
/// back. [`HeapLease::release`] may be called early and is idempotent, so
/// the provider sees exactly one `release` per successful `acquire` no
/// matter how the owning scope is left.
pub struct HeapLease<'p> {
    provider: &'p mut dyn HeapProvider,
    heap: RuntimeHeap,
}

impl<'p> HeapLease<'p> {
    /// Reserve `size` bytes from `provider`
    pub fn acquire(
        provider: &'p mut dyn HeapProvider,
        size: usize,
    ) -> Result<Self, AllocationFailure> {
        let region = provider.acquire(size)?;
        if region.len() != size {
            // A provider that hands back the wrong size is refused outright.
            provider.release(region);
            return Err(AllocationFailure { size });
        }
        info!("runtime heap acquired: {} bytes", size);
        Ok(Self {
            provider,
            heap: RuntimeHeap::new(region),
        })
    }

    /// The leased heap
    pub fn heap(&self) -> &RuntimeHeap {
        &self.heap
    }

    /// The leased heap, mutably
    pub fn heap_mut(&mut self) -> &mut RuntimeHeap {
        &mut self.heap
    }

    /// Return the region to the provider. Returns `true` only for the call
    /// that actually released it.
    pub fn release(&mut self) -> bool {
        match self.heap.take_region() {
            Some(region) => {
                debug!(
                    "runtime heap released: {} of {} bytes used",
                    self.heap.used(),
                    region.len()
                );
                self.provider.release(region);
                true
            }
            None => false,
        }
    }
}

impl Drop for HeapLease<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for HeapLease<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("HeapLease").field("heap", &self.heap).finish()
    }
}
