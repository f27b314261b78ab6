use crate::traits::Stow;
use std::fmt::{self, Debug, Display};
use std::mem::MaybeUninit;

/// A checked accessor was used while the slot held no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptySlotError;

impl Display for EmptySlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt("Slot accessed while empty", f)
    }
}

impl std::error::Error for EmptySlotError {}

/// Single inline storage slot that may hold one `T`, built in place.
///
/// The slot holds a live value exactly when the presence flag is set; the
/// storage itself is never initialized ahead of time. The same discipline as
/// [`crate::DynArray`] in miniature: construction and destruction are explicit,
/// and a failed in-place build leaves the slot observably empty.
pub struct Slot<T> {
    value: MaybeUninit<T>,
    present: bool,
}

impl<T> Slot<T> {
    /// A slot holding nothing.
    pub fn empty() -> Slot<T> {
        Slot {
            value: MaybeUninit::uninit(),
            present: false,
        }
    }

    /// A slot holding `value`.
    pub fn new(value: T) -> Slot<T> {
        Slot {
            value: MaybeUninit::new(value),
            present: true,
        }
    }

    #[inline(always)]
    pub fn has_value(&self) -> bool {
        self.present
    }

    /// Stores `value`: assigns over a held value, or builds into the empty slot.
    pub fn assign(&mut self, value: T) {
        if self.present {
            unsafe { *self.value.as_mut_ptr() = value };
        } else {
            self.value = MaybeUninit::new(value);
            self.present = true;
        }
    }

    /// Destroys any held value, then stores `value`. Returns a reference to it.
    pub fn emplace(&mut self, value: T) -> &mut T {
        self.reset();
        self.value = MaybeUninit::new(value);
        self.present = true;
        unsafe { &mut *self.value.as_mut_ptr() }
    }

    /// Destroys any held value, then builds a new one in place.
    ///
    /// The slot stays empty until `build` succeeds, so a failure leaves it
    /// observably empty rather than half-initialized.
    pub fn emplace_with<E, F>(&mut self, build: F) -> Result<&mut T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.reset();
        let value = build()?;
        self.value = MaybeUninit::new(value);
        self.present = true;
        Ok(unsafe { &mut *self.value.as_mut_ptr() })
    }

    pub fn value(&self) -> Result<&T, EmptySlotError> {
        if self.present {
            Ok(unsafe { &*self.value.as_ptr() })
        } else {
            Err(EmptySlotError)
        }
    }

    pub fn value_mut(&mut self) -> Result<&mut T, EmptySlotError> {
        if self.present {
            Ok(unsafe { &mut *self.value.as_mut_ptr() })
        } else {
            Err(EmptySlotError)
        }
    }

    /// Consumes the slot and moves the value out: the access path for a slot
    /// that is about to go away.
    pub fn into_value(mut self) -> Result<T, EmptySlotError> {
        if !self.present {
            return Err(EmptySlotError);
        }
        self.present = false;
        Ok(unsafe { self.value.as_ptr().read() })
    }

    /// Moves the value out and clears presence.
    pub fn take(&mut self) -> Option<T> {
        if !self.present {
            return None;
        }
        self.present = false;
        Some(unsafe { self.value.as_ptr().read() })
    }

    /// Reference to the held value without a presence check.
    /// The slot must hold a value.
    pub unsafe fn get_unchecked(&self) -> &T {
        debug_assert!(self.present, "slot holds a value");
        &*self.value.as_ptr()
    }

    /// Mutable reference to the held value without a presence check.
    /// The slot must hold a value.
    pub unsafe fn get_unchecked_mut(&mut self) -> &mut T {
        debug_assert!(self.present, "slot holds a value");
        &mut *self.value.as_mut_ptr()
    }

    /// Destroys the held value, if any. Safe on an already-empty slot.
    pub fn reset(&mut self) {
        if self.present {
            self.present = false;
            unsafe { std::ptr::drop_in_place(self.value.as_mut_ptr()) };
        }
    }
}

impl<T> Slot<T> where T: Stow {
    /// Propagates presence; duplicates the value when one is held.
    pub fn duplicate(&self) -> Result<Slot<T>, T::Error> {
        if self.present {
            Ok(Slot::new(unsafe { &*self.value.as_ptr() }.duplicate()?))
        } else {
            Ok(Slot::empty())
        }
    }

    /// Element-wise assignment from another slot, by presence:
    /// value onto value assigns, value into empty duplicates, empty onto
    /// value destroys, empty onto empty does nothing.
    pub fn assign_from(&mut self, other: &Slot<T>) -> Result<(), T::Error> {
        match (self.present, other.present) {
            (true, true) => unsafe {
                (*self.value.as_mut_ptr()).assign(&*other.value.as_ptr())
            },
            (false, true) => {
                let value = unsafe { &*other.value.as_ptr() }.duplicate()?;
                self.value = MaybeUninit::new(value);
                self.present = true;
                Ok(())
            }
            (true, false) => {
                self.reset();
                Ok(())
            }
            (false, false) => Ok(()),
        }
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot::empty()
    }
}

impl<T> From<T> for Slot<T> {
    fn from(value: T) -> Self {
        Slot::new(value)
    }
}

impl<T> Drop for Slot<T> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T> Debug for Slot<T> where T: Debug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Ok(value) => f.debug_tuple("Slot").field(value).finish(),
            Err(_) => f.write_str("Slot(empty)"),
        }
    }
}
