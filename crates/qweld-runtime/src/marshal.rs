//! Conversions between host values and their C ABI representation
//!
//! Scalars cross by value. Strings cross as NUL-terminated UTF-8 buffers
//! whose owner depends on the direction:
//!
//! - host to native arguments: [`ShimString`], freed when it goes out of scope
//! - native to host results: [`NativeString`], `malloc`ed by native code and
//!   freed with `free`
//! - host slot results: [`Marshal::to_shim`], released by native code through
//!   `qweld_string_free`

use std::ffi::{c_char, c_double, c_float, c_int, CStr, CString};
use std::ptr;

/// A host type with a C ABI representation
pub trait Marshal: Sized {
    /// The value passed through the C ABI
    type Shim: Copy;

    /// Convert into the shim representation
    ///
    /// For strings the returned buffer is owned by the receiver.
    fn to_shim(&self) -> Self::Shim;

    /// Convert from the shim representation without taking ownership
    ///
    /// # Safety
    /// Pointer shims must be null or point to a NUL-terminated buffer that
    /// stays valid for the duration of the call.
    unsafe fn from_shim(shim: Self::Shim) -> Self;
}

macro_rules! marshal_by_value {
    ($($host:ty => $shim:ty),* $(,)?) => {
        $(
            impl Marshal for $host {
                type Shim = $shim;

                fn to_shim(&self) -> $shim {
                    *self as $shim
                }

                unsafe fn from_shim(shim: $shim) -> Self {
                    shim as $host
                }
            }
        )*
    };
}

// `int` is a C `int` on the wire, so `isize` values are truncated
marshal_by_value! {
    isize => c_int,
    i32 => c_int,
    i64 => i64,
    f32 => c_float,
    f64 => c_double,
}

impl Marshal for bool {
    type Shim = bool;

    fn to_shim(&self) -> bool {
        *self
    }

    unsafe fn from_shim(shim: bool) -> Self {
        shim
    }
}

impl Marshal for String {
    type Shim = *mut c_char;

    fn to_shim(&self) -> *mut c_char {
        to_c_string(self).into_raw()
    }

    unsafe fn from_shim(shim: *mut c_char) -> Self {
        if shim.is_null() {
            return String::new();
        }
        CStr::from_ptr(shim).to_string_lossy().into_owned()
    }
}

/// NUL-terminated copy of `s`, cut at the first interior NUL
fn to_c_string(s: &str) -> CString {
    let bytes = match s.find('\0') {
        Some(end) => &s.as_bytes()[..end],
        None => s.as_bytes(),
    };
    CString::new(bytes).unwrap_or_default()
}

/// A string lent to native code for the duration of one call
#[derive(Debug)]
pub struct ShimString(CString);

impl ShimString {
    pub fn new(s: &str) -> Self {
        ShimString(to_c_string(s))
    }

    /// Pointer valid while `self` is alive
    ///
    /// Native accessors take `char*` but never write through it.
    pub fn as_ptr(&self) -> *mut c_char {
        self.0.as_ptr() as *mut c_char
    }
}

/// A `malloc`ed string handed over by native code
#[derive(Debug)]
pub struct NativeString(*mut c_char);

impl NativeString {
    /// Take ownership of a native buffer
    ///
    /// # Safety
    /// `ptr` must be null or a NUL-terminated buffer allocated with `malloc`
    /// that nothing else frees.
    pub unsafe fn from_raw(ptr: *mut c_char) -> Self {
        NativeString(ptr)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Copy out the contents and free the buffer
    ///
    /// A null buffer yields an empty string; invalid UTF-8 is replaced.
    pub fn into_string(self) -> String {
        if self.0.is_null() {
            return String::new();
        }
        // SAFETY: non-null buffers are NUL-terminated per `from_raw`
        unsafe { CStr::from_ptr(self.0) }.to_string_lossy().into_owned()
    }
}

impl Drop for NativeString {
    fn drop(&mut self) {
        if !self.0.is_null() {
            // SAFETY: the buffer came from `malloc` and is owned by us
            unsafe { libc::free(self.0.cast()) };
            self.0 = ptr::null_mut();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(42isize.to_shim(), 42 as c_int);
        assert_eq!(unsafe { isize::from_shim(-7) }, -7);
        assert_eq!(1.5f64.to_shim(), 1.5);
        assert!(unsafe { bool::from_shim(true.to_shim()) });
        assert_eq!(i64::MAX.to_shim(), i64::MAX);
    }

    fn round_trip<T: Marshal + PartialEq + std::fmt::Debug>(value: T) {
        assert_eq!(unsafe { T::from_shim(value.to_shim()) }, value);
    }

    // One entry per host type of the generator's mapping table
    #[test]
    fn test_every_host_type_round_trips() {
        round_trip(-12isize);
        round_trip(i32::MIN);
        round_trip(i64::MIN);
        round_trip(-0.25f32);
        round_trip(f64::MAX);
        round_trip(false);
        round_trip(true);

        let shim = "round trip".to_string().to_shim();
        assert_eq!(unsafe { String::from_shim(shim) }, "round trip");
        unsafe { crate::ffi::qweld_string_free(shim) };
    }

    #[test]
    fn test_int_truncates_to_c_int() {
        let wide = (c_int::MAX as isize) + 1;
        assert_eq!(wide.to_shim(), wide as c_int);
    }

    #[test]
    fn test_string_to_shim_is_owned() {
        let shim = "héllo".to_string().to_shim();
        assert_eq!(unsafe { String::from_shim(shim) }, "héllo");
        unsafe { crate::ffi::qweld_string_free(shim) };
    }

    #[test]
    fn test_string_from_null() {
        assert_eq!(unsafe { String::from_shim(ptr::null_mut()) }, "");
    }

    #[test]
    fn test_interior_nul_truncates() {
        let shim = ShimString::new("ab\0cd");
        assert_eq!(unsafe { CStr::from_ptr(shim.as_ptr()) }.to_bytes(), b"ab");
    }

    #[test]
    fn test_native_string_frees_malloc_buffer() {
        let raw = unsafe { libc::strdup(b"native\0".as_ptr().cast()) };
        let native = unsafe { NativeString::from_raw(raw) };
        assert!(!native.is_null());
        assert_eq!(native.into_string(), "native");

        let empty = unsafe { NativeString::from_raw(ptr::null_mut()) };
        assert_eq!(empty.into_string(), "");
    }
}
