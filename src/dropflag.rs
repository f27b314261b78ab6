//! This module is for testing only

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::{Stow, StowDefault};

/// Error produced by the instrumented payloads below when a fuse trips.
#[derive(Debug, PartialEq, Eq)]
pub struct Boom;

/// Tally of element lifetime events, shared between a test and its payloads.
#[derive(Default, Debug, Clone)]
pub struct Tally {
    pub fresh: usize,
    pub duplicated: usize,
    pub relocated: usize,
    pub assigned: usize,
    pub dropped: usize,
}

impl Tally {
    /// Values currently live: every construction path minus destructions.
    pub fn alive(&self) -> usize {
        self.fresh + self.duplicated + self.relocated - self.dropped
    }
}

pub type Counters = Rc<RefCell<Tally>>;

pub fn counters() -> Counters {
    Rc::new(RefCell::new(Tally::default()))
}

/// Payload whose relocation is declared infallible, so transfers must move it.
pub struct Solid {
    pub value: i32,
    counters: Counters,
}

impl Solid {
    pub fn new(value: i32, counters: &Counters) -> Solid {
        counters.borrow_mut().fresh += 1;
        Solid {
            value,
            counters: counters.clone(),
        }
    }
}

impl Stow for Solid {
    type Error = Boom;
    const RELOCATE_CANNOT_FAIL: bool = true;

    fn relocate(src: &mut Self) -> Result<Self, Boom> {
        src.counters.borrow_mut().relocated += 1;
        Ok(Solid {
            value: src.value,
            counters: src.counters.clone(),
        })
    }

    fn duplicate(&self) -> Result<Self, Boom> {
        self.counters.borrow_mut().duplicated += 1;
        Ok(Solid {
            value: self.value,
            counters: self.counters.clone(),
        })
    }

    fn assign(&mut self, src: &Self) -> Result<(), Boom> {
        self.value = src.value;
        self.counters.borrow_mut().assigned += 1;
        Ok(())
    }
}

impl Drop for Solid {
    fn drop(&mut self) {
        self.counters.borrow_mut().dropped += 1;
    }
}

/// Payload whose duplication may fail: a shared fuse counts down on every
/// duplicate and the duplicate that reaches zero fails. Relocation is not
/// declared infallible, so transfers duplicate this type.
pub struct Fragile {
    pub value: i32,
    counters: Counters,
    fuse: Rc<Cell<i32>>,
}

impl Fragile {
    pub fn new(value: i32, counters: &Counters, fuse: &Rc<Cell<i32>>) -> Fragile {
        counters.borrow_mut().fresh += 1;
        Fragile {
            value,
            counters: counters.clone(),
            fuse: fuse.clone(),
        }
    }
}

impl Stow for Fragile {
    type Error = Boom;
    const RELOCATE_CANNOT_FAIL: bool = false;

    fn relocate(src: &mut Self) -> Result<Self, Boom> {
        src.counters.borrow_mut().relocated += 1;
        Ok(Fragile {
            value: src.value,
            counters: src.counters.clone(),
            fuse: src.fuse.clone(),
        })
    }

    fn duplicate(&self) -> Result<Self, Boom> {
        let left = self.fuse.get();
        if left > 0 {
            self.fuse.set(left - 1);
            if left == 1 {
                return Err(Boom);
            }
        }
        self.counters.borrow_mut().duplicated += 1;
        Ok(Fragile {
            value: self.value,
            counters: self.counters.clone(),
            fuse: self.fuse.clone(),
        })
    }

    fn assign(&mut self, src: &Self) -> Result<(), Boom> {
        self.value = src.value;
        self.counters.borrow_mut().assigned += 1;
        Ok(())
    }
}

impl Drop for Fragile {
    fn drop(&mut self) {
        self.counters.borrow_mut().dropped += 1;
    }
}

/// Move-only payload: duplication always fails, so transfers relocate it
/// even though relocation is not declared infallible.
pub struct Lone {
    pub value: i32,
    counters: Counters,
}

impl Lone {
    pub fn new(value: i32, counters: &Counters) -> Lone {
        counters.borrow_mut().fresh += 1;
        Lone {
            value,
            counters: counters.clone(),
        }
    }
}

impl Stow for Lone {
    type Error = Boom;
    const RELOCATE_CANNOT_FAIL: bool = false;
    const DUPLICATABLE: bool = false;

    fn relocate(src: &mut Self) -> Result<Self, Boom> {
        src.counters.borrow_mut().relocated += 1;
        Ok(Lone {
            value: src.value,
            counters: src.counters.clone(),
        })
    }

    fn duplicate(&self) -> Result<Self, Boom> {
        Err(Boom)
    }
}

impl Drop for Lone {
    fn drop(&mut self) {
        self.counters.borrow_mut().dropped += 1;
    }
}

thread_local! {
    static BUD_TALLY: RefCell<Tally> = RefCell::new(Tally::default());
    static BUD_FUSE: Cell<usize> = Cell::new(0);
}

/// Default-buildable payload tallying into a thread-local, so containers can
/// build it from nothing. Its default build fails once an armed fuse runs out.
pub struct Budding {
    pub value: i32,
}

impl Budding {
    /// Clears the thread-local tally and disarms the fuse.
    pub fn reset() {
        BUD_TALLY.with(|t| *t.borrow_mut() = Tally::default());
        BUD_FUSE.with(|f| f.set(0));
    }

    /// Makes the `n`-th default build from now fail.
    pub fn arm_fuse(n: usize) {
        BUD_FUSE.with(|f| f.set(n));
    }

    pub fn tally() -> Tally {
        BUD_TALLY.with(|t| t.borrow().clone())
    }
}

impl Stow for Budding {
    type Error = Boom;
    const RELOCATE_CANNOT_FAIL: bool = true;

    fn relocate(src: &mut Self) -> Result<Self, Boom> {
        BUD_TALLY.with(|t| t.borrow_mut().relocated += 1);
        Ok(Budding { value: src.value })
    }

    fn duplicate(&self) -> Result<Self, Boom> {
        BUD_TALLY.with(|t| t.borrow_mut().duplicated += 1);
        Ok(Budding { value: self.value })
    }
}

impl StowDefault for Budding {
    fn stow_default() -> Result<Self, Boom> {
        let tripped = BUD_FUSE.with(|f| {
            let left = f.get();
            if left == 0 {
                return false;
            }
            f.set(left - 1);
            left == 1
        });
        if tripped {
            return Err(Boom);
        }
        BUD_TALLY.with(|t| t.borrow_mut().fresh += 1);
        Ok(Budding { value: 0 })
    }
}

impl Drop for Budding {
    fn drop(&mut self) {
        BUD_TALLY.with(|t| t.borrow_mut().dropped += 1);
    }
}

#[test]
fn tally_counts_drops() {
    let c = counters();
    let solid = Solid::new(1, &c);
    assert_eq!(1, c.borrow().alive());
    std::mem::drop(solid);
    assert_eq!(1, c.borrow().dropped);
    assert_eq!(0, c.borrow().alive());
}
