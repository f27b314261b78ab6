use std::alloc::{alloc, dealloc, Layout};
use std::fmt::{self, Display};
use std::ptr::null_mut;

/// Storage could not be obtained for the requested capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    /// The requested element count does not fit into a single allocation.
    CapacityOverflow { requested: usize },
    /// The allocator returned no memory.
    OutOfMemory { bytes: usize },
}

impl Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::CapacityOverflow { requested } => write!(f, "Capacity of {} elements overflows the allocation size", requested),
            AllocError::OutOfMemory { bytes } => write!(f, "Allocator returned no memory for {} bytes", bytes),
        }
    }
}

impl std::error::Error for AllocError {}

/// Owned block of uninitialized storage for exactly `capacity` elements of `T`.
///
/// The buffer never constructs or destroys elements; whoever owns it must know
/// which slots hold live values and destroy them before the buffer is dropped.
/// It is not cloneable, because duplicating raw storage without knowing slot
/// liveness would split element ownership. Transfer it by move or [`RawBuf::swap`].
pub struct RawBuf<T> {
    ptr: *mut T,
    cap: usize,
}

impl<T> RawBuf<T> {
    /// An empty buffer holding no allocation.
    pub fn new() -> RawBuf<T> {
        RawBuf {
            ptr: null_mut(),
            cap: 0,
        }
    }

    /// Allocates uninitialized storage for exactly `capacity` elements.
    ///
    /// Zero capacity and zero-sized `T` allocate nothing.
    pub fn with_capacity(capacity: usize) -> Result<RawBuf<T>, AllocError> {
        if capacity == 0 {
            return Ok(RawBuf::new());
        }
        let layout = match Layout::array::<T>(capacity) {
            Ok(layout) => layout,
            Err(_) => return Err(AllocError::CapacityOverflow { requested: capacity }),
        };
        if layout.size() == 0 {
            return Ok(RawBuf {
                ptr: std::mem::align_of::<T>() as *mut T,
                cap: capacity,
            });
        }
        let ptr = unsafe { alloc(layout) } as *mut T;
        if ptr.is_null() {
            return Err(AllocError::OutOfMemory { bytes: layout.size() });
        }
        trace!("alloc {} bytes for {} slots", layout.size(), capacity);
        Ok(RawBuf {
            ptr,
            cap: capacity,
        })
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Pointer to the first slot; null when the buffer is empty.
    #[inline(always)]
    pub fn as_ptr(&self) -> *mut T {
        self.ptr
    }

    /// Pointer to the slot at `index`. The past-the-end address is permitted.
    /// The slot may or may not hold a live element; the caller knows which.
    #[inline(always)]
    pub unsafe fn at(&self, index: usize) -> *mut T {
        debug_assert!(index <= self.cap, "slot index within capacity");
        self.ptr.add(index)
    }

    /// Exchanges storage with `other`. No intermediate state is observable.
    pub fn swap(&mut self, other: &mut RawBuf<T>) {
        std::mem::swap(&mut self.ptr, &mut other.ptr);
        std::mem::swap(&mut self.cap, &mut other.cap);
    }
}

impl<T> Default for RawBuf<T> {
    fn default() -> Self {
        RawBuf::new()
    }
}

impl<T> Drop for RawBuf<T> {
    fn drop(&mut self) {
        if self.cap == 0 || std::mem::size_of::<T>() == 0 {
            return;
        }
        // The layout was validated when the block was allocated.
        let layout = unsafe {
            Layout::from_size_align_unchecked(
                std::mem::size_of::<T>() * self.cap,
                std::mem::align_of::<T>(),
            )
        };
        trace!("free {} bytes", layout.size());
        unsafe { dealloc(self.ptr as *mut u8, layout) };
    }
}
