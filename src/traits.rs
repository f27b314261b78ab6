use std::convert::Infallible;

/// Contract a payload type implements to live inside the raw-storage containers.
///
/// Rust moves are bitwise and cannot fail, but the containers here model
/// payloads whose duplication, relocation or assignment may fail with an
/// error. Containers pick the transfer policy for a whole reallocation from
/// the two constants, never per element: when [`Stow::RELOCATE_CANNOT_FAIL`]
/// is true, or the type is not duplicatable at all, every element is carried
/// by [`Stow::relocate`]; otherwise every element is carried by
/// [`Stow::duplicate`] and the originals stay untouched until the whole
/// transfer has succeeded.
pub trait Stow: Sized {
    /// Error produced by a failed element operation.
    type Error;

    /// True when [`Stow::relocate`] never returns an error.
    const RELOCATE_CANNOT_FAIL: bool;

    /// False for move-only payloads whose [`Stow::duplicate`] always fails.
    const DUPLICATABLE: bool = true;

    /// Moves the value out of `src`.
    ///
    /// On success `src` must be left in a state that is valid for destruction
    /// (and nothing else); the container destroys it once the transfer is done.
    fn relocate(src: &mut Self) -> Result<Self, Self::Error>;

    /// Duplicates the value, like `Clone::clone` but allowed to fail.
    fn duplicate(&self) -> Result<Self, Self::Error>;

    /// Overwrites `self` with a duplicate of `src`, reusing storage where the
    /// implementation can.
    fn assign(&mut self, src: &Self) -> Result<(), Self::Error> {
        *self = src.duplicate()?;
        Ok(())
    }
}

/// Payloads that can also be built from nothing, fallibly.
pub trait StowDefault: Stow {
    fn stow_default() -> Result<Self, Self::Error>;
}

macro_rules! impl_stow_for_copy {
    ($($t:ty),* $(,)?) => {$(
        impl Stow for $t {
            type Error = Infallible;
            const RELOCATE_CANNOT_FAIL: bool = true;

            #[inline(always)]
            fn relocate(src: &mut Self) -> Result<Self, Infallible> {
                Ok(*src)
            }

            #[inline(always)]
            fn duplicate(&self) -> Result<Self, Infallible> {
                Ok(*self)
            }
        }

        impl StowDefault for $t {
            #[inline(always)]
            fn stow_default() -> Result<Self, Infallible> {
                Ok(<$t>::default())
            }
        }
    )*};
}

impl_stow_for_copy!(
    u8, u16, u32, u64, u128, usize,
    i8, i16, i32, i64, i128, isize,
    f32, f64, bool, char, (),
);

impl Stow for String {
    type Error = Infallible;
    const RELOCATE_CANNOT_FAIL: bool = true;

    fn relocate(src: &mut Self) -> Result<Self, Infallible> {
        Ok(std::mem::replace(src, String::new()))
    }

    fn duplicate(&self) -> Result<Self, Infallible> {
        Ok(self.clone())
    }

    fn assign(&mut self, src: &Self) -> Result<(), Infallible> {
        self.clone_from(src);
        Ok(())
    }
}

impl StowDefault for String {
    fn stow_default() -> Result<Self, Infallible> {
        Ok(String::new())
    }
}
