//! Opaque handles identifying native instances

use std::ffi::c_void;
use std::fmt;

/// Address of a native instance, used as its identity in the registry
///
/// A handle is only compared and hashed, never dereferenced on the Rust side.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Handle(usize);

impl Handle {
    /// The null handle; every registry operation on it is a no-op
    pub const NULL: Handle = Handle(0);

    /// Wrap the `this` pointer handed over by a native trampoline
    pub fn from_ptr(ptr: *mut c_void) -> Self {
        Handle(ptr as usize)
    }

    /// The pointer to pass back to native accessors
    pub fn as_ptr(self) -> *mut c_void {
        self.0 as *mut c_void
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    pub fn addr(self) -> usize {
        self.0
    }
}

impl From<usize> for Handle {
    fn from(addr: usize) -> Self {
        Handle(addr)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
