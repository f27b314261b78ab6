mod logging;
mod raw;
mod traits;
mod array;
mod slot;

pub use array::{ArrayError, DynArray};
pub use raw::{AllocError, RawBuf};
pub use slot::{EmptySlotError, Slot};
pub use traits::{Stow, StowDefault};

#[cfg(test)]
pub mod dropflag;
