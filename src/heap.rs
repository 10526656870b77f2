// ───────────── HEAP (the one allocator we talk to) ─────────────────────
//! Thin capability over the process-wide global heap.
//!
//! Everything above this module only ever sees `allocate` and `free`,
//! the block code never calls `std::alloc` directly.

use core::alloc::Layout;
use core::ptr::NonNull;
use std::alloc;

/// The process heap. Zero sized, every buffer shares the same one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Heap;

/// The heap refused a block handed back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseRejected;

impl Heap {
    /// Requests `layout.size()` bytes.
    ///
    /// Returns `None` when the heap has no memory for us.
    /// Zero sized layouts are never forwarded, they get `None` as well.
    #[inline]
    pub fn allocate(self, layout: Layout) -> Option<NonNull<u8>> {
        if layout.size() == 0 {
            return None;
        }
        // SAFETY: size is non zero
        let raw = unsafe { alloc::alloc(layout) };
        let ans = NonNull::new(raw);
        log::trace!(
            "heap: allocate {} bytes (align {}) -> {:?}",
            layout.size(),
            layout.align(),
            ans
        );
        ans
    }

    /// Returns a block to the heap.
    ///
    /// Blocks that could not have come from [`Heap::allocate`] (zero size, misaligned)
    /// are rejected instead of being passed on.
    ///
    /// # Safety
    /// if accepted, `ptr` must have been returned by `allocate` with this exact `layout`
    /// and must not be used afterwards.
    #[inline]
    pub unsafe fn free(self, ptr: NonNull<u8>, layout: Layout) -> Result<(), ReleaseRejected> {
        if layout.size() == 0 || ptr.as_ptr().addr() % layout.align() != 0 {
            log::warn!("heap: rejected free of {:?} with {:?}", ptr, layout);
            return Err(ReleaseRejected);
        }
        log::trace!("heap: free {} bytes at {:?}", layout.size(), ptr);
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_then_free() {
        let layout = Layout::array::<u64>(16).unwrap();
        let p = Heap.allocate(layout).expect("heap should have 128 bytes");
        assert_eq!(p.as_ptr().addr() % layout.align(), 0);

        unsafe {
            p.cast::<u64>().as_ptr().write(0xdead_beef);
            assert_eq!(p.cast::<u64>().as_ptr().read(), 0xdead_beef);
            assert_eq!(Heap.free(p, layout), Ok(()));
        }
    }

    #[test]
    fn zero_size_is_never_allocated() {
        let layout = Layout::array::<u32>(0).unwrap();
        assert!(Heap.allocate(layout).is_none());
    }

    #[test]
    fn bogus_blocks_are_rejected() {
        let empty = Layout::array::<u8>(0).unwrap();
        let wide = Layout::array::<u64>(1).unwrap();

        unsafe {
            assert_eq!(Heap.free(NonNull::dangling(), empty), Err(ReleaseRejected));

            let odd = NonNull::new(1usize as *mut u8).unwrap();
            assert_eq!(Heap.free(odd, wide), Err(ReleaseRejected));
        }
    }
}
