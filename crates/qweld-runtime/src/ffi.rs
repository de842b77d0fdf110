//! Symbols exported to native code

use std::ffi::{c_char, CString};

/// Release a string returned by a host slot trampoline
///
/// # Arguments
/// * `ptr` - Buffer returned by a `*_slot_*` trampoline (may be NULL)
///
/// # Safety
/// - `ptr` must come from the host side of a qweld binding
/// - The buffer must not be used after this call
#[no_mangle]
pub unsafe extern "C" fn qweld_string_free(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    drop(CString::from_raw(ptr));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Marshal;

    #[test]
    fn test_free_null_is_noop() {
        unsafe { qweld_string_free(std::ptr::null_mut()) };
    }

    #[test]
    fn test_free_slot_result() {
        let result = "done".to_string().to_shim();
        assert!(!result.is_null());
        unsafe { qweld_string_free(result) };
    }
}
