//! Allocator plumbing for the path toolkit.
//!
//! The normalization core is allocation-free and writes into caller
//! buffers. Only the owning path value grows storage, and it does so
//! through a process-wide allocator pair that embedders may install once
//! at startup with [`set_allocator`]. Until then the system allocator is
//! used.

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::sync::OnceLock;

/// Allocate `len` bytes, or return null on failure. The block does not
/// need to be initialized; [`PathBuffer`] zeroes it after allocation.
pub type AllocateFn = fn(usize) -> *mut u8;

/// Release a block previously returned by the paired [`AllocateFn`], with
/// the length it was requested at.
pub type FreeFn = fn(*mut u8, usize);

#[derive(Clone, Copy)]
struct AllocatorPair {
    allocate: AllocateFn,
    free: FreeFn,
}

static ALLOCATOR: OnceLock<AllocatorPair> = OnceLock::new();

/// Install the process-wide allocator pair.
///
/// Succeeds at most once; returns `false` and leaves the active pair
/// unchanged on any later call, including after the default pair has
/// already been put to use.
pub fn set_allocator(allocate: AllocateFn, free: FreeFn) -> bool {
    ALLOCATOR.set(AllocatorPair { allocate, free }).is_ok()
}

fn allocator() -> AllocatorPair {
    *ALLOCATOR.get_or_init(|| AllocatorPair {
        allocate: system_allocate,
        free: system_free,
    })
}

fn system_allocate(len: usize) -> *mut u8 {
    match Layout::array::<u8>(len) {
        Ok(layout) => unsafe { alloc::alloc(layout) },
        Err(_) => std::ptr::null_mut(),
    }
}

fn system_free(ptr: *mut u8, len: usize) {
    if ptr.is_null() {
        return;
    }
    if let Ok(layout) = Layout::array::<u8>(len) {
        unsafe { alloc::dealloc(ptr, layout) }
    }
}

/// Capacity is always rounded up to this step.
const ALIGNMENT: usize = 8;

fn align_up(len: usize) -> usize {
    (len + ALIGNMENT - 1) & !(ALIGNMENT - 1)
}

/// An owned, zero-initialized byte buffer backed by the process allocator
/// pair.
///
/// The empty state holds no storage; [`PathBuffer::allocate`] produces a
/// zeroed block of at least the requested length.
pub struct PathBuffer {
    ptr: Option<NonNull<u8>>,
    capacity: usize,
}

impl PathBuffer {
    /// An empty buffer with no storage.
    pub const fn new() -> Self {
        Self {
            ptr: None,
            capacity: 0,
        }
    }

    /// Allocate a zeroed buffer of at least `len` bytes.
    pub fn allocate(len: usize) -> Self {
        let capacity = align_up(len.max(1));
        let pair = allocator();
        let raw = (pair.allocate)(capacity);
        let Some(ptr) = NonNull::new(raw) else {
            match Layout::array::<u8>(capacity) {
                Ok(layout) => alloc::handle_alloc_error(layout),
                Err(_) => alloc::handle_alloc_error(Layout::new::<u8>()),
            }
        };
        // SAFETY: the pair just handed us `capacity` writable bytes.
        unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0, capacity) };
        Self {
            ptr: Some(ptr),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_allocated(&self) -> bool {
        self.ptr.is_some()
    }

    /// The buffer contents; empty when no storage is held.
    pub fn as_slice(&self) -> &[u8] {
        match self.ptr {
            // SAFETY: `capacity` bytes were allocated and initialized.
            Some(ptr) => unsafe { std::slice::from_raw_parts(ptr.as_ptr(), self.capacity) },
            None => &[],
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        match self.ptr {
            // SAFETY: `capacity` bytes were allocated and initialized, and
            // we hold the unique reference.
            Some(ptr) => unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), self.capacity) },
            None => &mut [],
        }
    }

    /// Move the storage out, leaving this buffer empty.
    pub fn take(&mut self) -> PathBuffer {
        std::mem::replace(self, PathBuffer::new())
    }
}

impl Drop for PathBuffer {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            (allocator().free)(ptr.as_ptr(), self.capacity);
        }
    }
}

impl Default for PathBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PathBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathBuffer")
            .field("capacity", &self.capacity)
            .finish()
    }
}

// SAFETY: the buffer owns its storage exclusively and the allocator pair
// consists of plain function pointers.
unsafe impl Send for PathBuffer {}
unsafe impl Sync for PathBuffer {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static ALLOCATIONS: AtomicUsize = AtomicUsize::new(0);
    static FREES: AtomicUsize = AtomicUsize::new(0);

    fn counting_allocate(len: usize) -> *mut u8 {
        ALLOCATIONS.fetch_add(1, Ordering::SeqCst);
        system_allocate(len)
    }

    fn counting_free(ptr: *mut u8, len: usize) {
        FREES.fetch_add(1, Ordering::SeqCst);
        system_free(ptr, len)
    }

    #[test]
    fn test_empty_buffer() {
        let buf = PathBuffer::new();
        assert!(!buf.is_allocated());
        assert_eq!(buf.capacity(), 0);
        assert!(buf.as_slice().is_empty());
    }

    #[test]
    fn test_allocate_rounds_up_and_zeroes() {
        let buf = PathBuffer::allocate(13);
        assert!(buf.is_allocated());
        assert_eq!(buf.capacity(), 16);
        assert!(buf.as_slice().iter().all(|&b| b == 0));

        // A zero-length request still yields usable storage.
        let buf = PathBuffer::allocate(0);
        assert_eq!(buf.capacity(), 8);
    }

    #[test]
    fn test_write_and_take() {
        let mut buf = PathBuffer::allocate(8);
        buf.as_mut_slice()[..3].copy_from_slice(b"/aa");
        assert_eq!(&buf.as_slice()[..3], b"/aa");

        let taken = buf.take();
        assert!(!buf.is_allocated());
        assert_eq!(&taken.as_slice()[..3], b"/aa");
    }

    #[test]
    fn test_set_allocator_once() {
        // The first installation wins; the pair delegates to the system
        // allocator so buffers created by other tests stay valid.
        let installed = set_allocator(counting_allocate, counting_free);
        if installed {
            let before = ALLOCATIONS.load(Ordering::SeqCst);
            let buf = PathBuffer::allocate(4);
            assert!(ALLOCATIONS.load(Ordering::SeqCst) > before);
            drop(buf);
            assert!(FREES.load(Ordering::SeqCst) > 0);
        }

        // A second installation is refused either way.
        assert!(!set_allocator(counting_allocate, counting_free));
    }
}
