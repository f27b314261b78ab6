use crate::raw::{AllocError, RawBuf};
use crate::traits::{Stow, StowDefault};
use std::fmt::{self, Debug, Display};

/// A mutating array operation failed; the array itself is left in the state
/// each operation documents (unchanged for transfers, truncated rollback for
/// default-construction growth).
#[derive(Debug, PartialEq, Eq)]
pub enum ArrayError<E> {
    /// Storage could not be allocated.
    Alloc(AllocError),
    /// An element operation (duplicate, relocate, assign or default build) failed.
    Element(E),
}

impl<E> From<AllocError> for ArrayError<E> {
    fn from(e: AllocError) -> Self {
        ArrayError::Alloc(e)
    }
}

impl<E> Display for ArrayError<E> where E: Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayError::Alloc(e) => Display::fmt(e, f),
            ArrayError::Element(e) => write!(f, "Element operation failed - {}", e),
        }
    }
}

impl<E> std::error::Error for ArrayError<E> where E: Debug + Display {}

/// Whether a whole-buffer transfer carries elements with [`Stow::relocate`]
/// rather than [`Stow::duplicate`]. Decided once per payload type; the
/// branch on it folds away at compile time.
#[inline(always)]
fn carried_by_relocation<T: Stow>() -> bool {
    T::RELOCATE_CANNOT_FAIL || !T::DUPLICATABLE
}

/// Growable contiguous array over raw storage.
///
/// Slots `[0, len)` of the buffer hold live elements, slots `[len, capacity)`
/// are uninitialized memory. Every mutation keeps that invariant through any
/// element failure: a failed transfer destroys only what it built and leaves
/// the array as it was, a failed default-construction growth destroys its own
/// partial tail and keeps the length unchanged.
pub struct DynArray<T> {
    data: RawBuf<T>,
    len: usize,
}

impl<T> DynArray<T> {
    /// An empty array with no storage.
    pub fn new() -> DynArray<T> {
        DynArray {
            data: RawBuf::new(),
            len: 0,
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn as_slice(&self) -> &[T] {
        if self.len == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.data.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        if self.len == 0 {
            return &mut [];
        }
        unsafe { std::slice::from_raw_parts_mut(self.data.as_ptr(), self.len) }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Moves the contents out, leaving this array empty with no storage.
    pub fn take(&mut self) -> DynArray<T> {
        std::mem::replace(self, DynArray::new())
    }

    /// Destroys the last element and shrinks the array by one, returning the
    /// element. The array must not be empty.
    pub fn pop(&mut self) -> T {
        assert!(self.len > 0, "pop on empty DynArray");
        self.len -= 1;
        unsafe { std::ptr::read(self.data.at(self.len)) }
    }

    /// Removes the element at `at`, shifting the tail one slot down.
    /// Capacity is unchanged; after the call, index `at` names the element
    /// that followed the removed one.
    pub fn remove(&mut self, at: usize) -> T {
        assert!(at < self.len, "remove position within bounds");
        unsafe {
            let p = self.data.at(at);
            let value = std::ptr::read(p);
            std::ptr::copy(p.add(1), p, self.len - at - 1);
            self.len -= 1;
            value
        }
    }

    /// Capacity used when growth is implicit: twice the current length, and
    /// one for an array that is still empty.
    fn grown_capacity(&self) -> usize {
        if self.len == 0 {
            1
        } else {
            self.len * 2
        }
    }

    /// Destroys the live elements in `data[from..to)`, newest slot first.
    unsafe fn destroy_range(data: &RawBuf<T>, from: usize, to: usize) {
        for i in (from..to).rev() {
            std::ptr::drop_in_place(data.at(i));
        }
    }
}

impl<T> DynArray<T> where T: Stow {
    /// Duplicates every element into a new array with capacity exactly `len`.
    ///
    /// If a duplication fails, everything built so far is destroyed again and
    /// the error is returned; `self` is never touched.
    pub fn duplicate(&self) -> Result<DynArray<T>, ArrayError<T::Error>> {
        let data = RawBuf::with_capacity(self.len)?;
        for (i, item) in self.as_slice().iter().enumerate() {
            match item.duplicate() {
                Ok(value) => unsafe { std::ptr::write(data.at(i), value) },
                Err(e) => {
                    unsafe { Self::destroy_range(&data, 0, i) };
                    return Err(ArrayError::Element(e));
                }
            }
        }
        Ok(DynArray {
            data,
            len: self.len,
        })
    }

    /// Grows capacity to exactly `new_capacity`; does nothing when the
    /// current capacity already suffices. Never shrinks.
    ///
    /// Elements are carried into the new buffer by the payload's transfer
    /// policy. On a carry failure the new buffer and everything built in it
    /// are destroyed and the array is left exactly as it was.
    pub fn reserve(&mut self, new_capacity: usize) -> Result<(), ArrayError<T::Error>> {
        if new_capacity <= self.data.capacity() {
            return Ok(());
        }
        let new_data = RawBuf::with_capacity(new_capacity)?;
        unsafe {
            self.carry_range(&new_data, 0, 0, self.len)
                .map_err(ArrayError::Element)?;
            self.adopt(new_data);
        }
        Ok(())
    }

    /// Appends `value` at the end, growing the buffer when full.
    pub fn push(&mut self, value: T) -> Result<(), ArrayError<T::Error>> {
        self.emplace_at(self.len, move || Ok(value)).map(|_| ())
    }

    /// Builds a new last element in place and returns a reference to it.
    ///
    /// When growth is needed, the element is built into its final slot of the
    /// new buffer before any existing element is carried over, so `build` may
    /// still read the array's current elements at their old addresses.
    pub fn emplace_back_with<F>(&mut self, build: F) -> Result<&mut T, ArrayError<T::Error>>
    where
        F: FnOnce() -> Result<T, T::Error>,
    {
        self.emplace_at(self.len, build)
    }

    /// Inserts `value` at `at`, shifting the elements at and after `at` one
    /// slot up. Returns a reference to the inserted element.
    pub fn insert(&mut self, at: usize, value: T) -> Result<&mut T, ArrayError<T::Error>> {
        self.emplace_at(at, move || Ok(value))
    }

    /// Builds a new element in place at `at`. Same contract as
    /// [`DynArray::insert`], with the element produced by `build`.
    pub fn emplace_with<F>(&mut self, at: usize, build: F) -> Result<&mut T, ArrayError<T::Error>>
    where
        F: FnOnce() -> Result<T, T::Error>,
    {
        self.emplace_at(at, build)
    }

    /// Makes this array an element-wise copy of `src`.
    ///
    /// When `src` does not fit the current buffer, a full duplicate is built
    /// aside and swapped in, so a failure leaves this array untouched. Within
    /// capacity, the overlapping prefix is assigned element by element and
    /// the surplus is destroyed or duplicated; a failure mid-prefix leaves
    /// already-assigned elements with their new values (basic guarantee) and
    /// the length unchanged.
    pub fn assign_from(&mut self, src: &DynArray<T>) -> Result<(), ArrayError<T::Error>> {
        if src.len > self.data.capacity() {
            let mut copy = src.duplicate()?;
            std::mem::swap(self, &mut copy);
            return Ok(());
        }
        let shared = self.len.min(src.len);
        for i in 0..shared {
            let dst = unsafe { &mut *self.data.at(i) };
            dst.assign(&src.as_slice()[i]).map_err(ArrayError::Element)?;
        }
        if src.len < self.len {
            unsafe { Self::destroy_range(&self.data, src.len, self.len) };
        } else {
            for i in self.len..src.len {
                match src.as_slice()[i].duplicate() {
                    Ok(value) => unsafe { std::ptr::write(self.data.at(i), value) },
                    Err(e) => {
                        unsafe { Self::destroy_range(&self.data, self.len, i) };
                        return Err(ArrayError::Element(e));
                    }
                }
            }
        }
        self.len = src.len;
        Ok(())
    }

    fn emplace_at<F>(&mut self, at: usize, build: F) -> Result<&mut T, ArrayError<T::Error>>
    where
        F: FnOnce() -> Result<T, T::Error>,
    {
        assert!(at <= self.len, "emplace position within bounds");
        if self.len < self.data.capacity() {
            // The new element is captured before the shift: `build` may read
            // this array's elements, which must still be at their old slots.
            let value = build().map_err(ArrayError::Element)?;
            unsafe {
                let p = self.data.at(at);
                std::ptr::copy(p, p.add(1), self.len - at);
                std::ptr::write(p, value);
            }
            self.len += 1;
            return Ok(unsafe { &mut *self.data.at(at) });
        }

        let new_data = RawBuf::with_capacity(self.grown_capacity())?;
        let value = match build() {
            Ok(value) => value,
            Err(e) => return Err(ArrayError::Element(e)),
        };
        unsafe {
            std::ptr::write(new_data.at(at), value);
            if let Err(e) = self.carry_range(&new_data, 0, 0, at) {
                std::ptr::drop_in_place(new_data.at(at));
                return Err(ArrayError::Element(e));
            }
            if let Err(e) = self.carry_range(&new_data, at, at + 1, self.len - at) {
                Self::destroy_range(&new_data, 0, at);
                std::ptr::drop_in_place(new_data.at(at));
                return Err(ArrayError::Element(e));
            }
            self.adopt(new_data);
        }
        self.len += 1;
        Ok(unsafe { &mut *self.data.at(at) })
    }

    /// Carries `count` live elements from `self.data[src_at..]` into
    /// `new_data[dst_at..]`, one policy for the whole run. On a failure,
    /// every element this call built is destroyed again, newest first, and
    /// the source slots stay valid for destruction.
    unsafe fn carry_range(
        &self,
        new_data: &RawBuf<T>,
        src_at: usize,
        dst_at: usize,
        count: usize,
    ) -> Result<(), T::Error> {
        for i in 0..count {
            let carried = if carried_by_relocation::<T>() {
                T::relocate(&mut *self.data.at(src_at + i))
            } else {
                (*self.data.at(src_at + i)).duplicate()
            };
            match carried {
                Ok(value) => std::ptr::write(new_data.at(dst_at + i), value),
                Err(e) => {
                    Self::destroy_range(new_data, dst_at, dst_at + i);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Destroys the old elements and swaps the freshly filled buffer in.
    /// Only called once every slot of the new buffer that should be live is.
    unsafe fn adopt(&mut self, mut new_data: RawBuf<T>) {
        Self::destroy_range(&self.data, 0, self.len);
        self.data.swap(&mut new_data);
        debug!("adopted buffer of capacity {}", self.data.capacity());
    }
}

impl<T> DynArray<T> where T: StowDefault {
    /// Builds an array of `len` default-built elements with capacity exactly
    /// `len`. On a failed build, everything built so far is destroyed again.
    pub fn with_len(len: usize) -> Result<DynArray<T>, ArrayError<T::Error>> {
        let data = RawBuf::with_capacity(len)?;
        for i in 0..len {
            match T::stow_default() {
                Ok(value) => unsafe { std::ptr::write(data.at(i), value) },
                Err(e) => {
                    unsafe { Self::destroy_range(&data, 0, i) };
                    return Err(ArrayError::Element(e));
                }
            }
        }
        Ok(DynArray { data, len })
    }

    /// Shrinks by destroying the tail, or grows by reserving exactly
    /// `new_len` and default-building the missing elements.
    ///
    /// On a failed build the elements built by this call are destroyed again
    /// and the length stays unchanged; capacity growth is not rolled back.
    pub fn resize(&mut self, new_len: usize) -> Result<(), ArrayError<T::Error>> {
        if new_len < self.len {
            unsafe { Self::destroy_range(&self.data, new_len, self.len) };
            self.len = new_len;
            return Ok(());
        }
        self.reserve(new_len)?;
        for i in self.len..new_len {
            match T::stow_default() {
                Ok(value) => unsafe { std::ptr::write(self.data.at(i), value) },
                Err(e) => {
                    unsafe { Self::destroy_range(&self.data, self.len, i) };
                    return Err(ArrayError::Element(e));
                }
            }
        }
        self.len = new_len;
        Ok(())
    }
}

impl<T> Default for DynArray<T> {
    fn default() -> Self {
        DynArray::new()
    }
}

impl<T> Drop for DynArray<T> {
    fn drop(&mut self) {
        unsafe { Self::destroy_range(&self.data, 0, self.len) };
    }
}

impl<T> std::ops::Index<usize> for DynArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T> std::ops::IndexMut<usize> for DynArray<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

impl<T> Debug for DynArray<T> where T: Debug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
