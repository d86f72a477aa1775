//! Allocation statistics
//!
//! With the `memory_tracking` feature the global allocator counts live and
//! peak heap bytes. Without it every query returns zero.

#[cfg(feature = "memory_tracking")]
pub(crate) mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK_ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    pub struct TrackingAllocator;

    #[cfg(feature = "mimalloc")]
    static UNDERLYING: mimalloc::MiMalloc = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    static UNDERLYING: std::alloc::System = std::alloc::System;

    unsafe impl GlobalAlloc for TrackingAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = UNDERLYING.alloc(layout);
            if !ptr.is_null() {
                let current = ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size();
                PEAK_ALLOCATED.fetch_max(current, Ordering::Relaxed);
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            UNDERLYING.dealloc(ptr, layout)
        }
    }
}

/// Heap usage snapshot in bytes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStats {
    pub current: usize,
    pub peak: usize,
}

impl MemoryStats {
    /// Whether the binary was built with allocation tracking
    pub const ENABLED: bool = cfg!(feature = "memory_tracking");

    #[cfg(feature = "memory_tracking")]
    pub fn snapshot() -> Self {
        use std::sync::atomic::Ordering;
        Self {
            current: tracking::ALLOCATED.load(Ordering::SeqCst),
            peak: tracking::PEAK_ALLOCATED.load(Ordering::SeqCst),
        }
    }

    #[cfg(not(feature = "memory_tracking"))]
    pub fn snapshot() -> Self {
        Self::default()
    }

    /// Reset the peak to the current usage, returning the previous values
    #[cfg(feature = "memory_tracking")]
    pub fn reset_peak() -> Self {
        use std::sync::atomic::Ordering;
        let current = tracking::ALLOCATED.load(Ordering::SeqCst);
        let peak = tracking::PEAK_ALLOCATED.swap(current, Ordering::SeqCst);
        Self { current, peak }
    }

    #[cfg(not(feature = "memory_tracking"))]
    pub fn reset_peak() -> Self {
        Self::default()
    }
}
