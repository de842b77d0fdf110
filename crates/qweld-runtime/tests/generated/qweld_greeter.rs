// Code generated by qweld. DO NOT EDIT.
//
// Include from the module declaring `Greeter`:
// include!("qweld_greeter.rs");

#[allow(non_snake_case)]
extern "C" {
    fn Greeter_Count(ptr: *mut ::std::ffi::c_void) -> ::std::ffi::c_int;
    fn Greeter_SetCount(ptr: *mut ::std::ffi::c_void, value: ::std::ffi::c_int);
    fn Greeter_Name(ptr: *mut ::std::ffi::c_void) -> *mut ::std::ffi::c_char;
    fn Greeter_SetName(ptr: *mut ::std::ffi::c_void, value: *mut ::std::ffi::c_char);
    fn Greeter_CountChanged(ptr: *mut ::std::ffi::c_void, count: ::std::ffi::c_int);
    fn Greeter_Said(ptr: *mut ::std::ffi::c_void, text: *mut ::std::ffi::c_char);
    fn Greeter_RegisterType(uri: *mut ::std::ffi::c_char, version_major: ::std::ffi::c_int, version_minor: ::std::ffi::c_int, qml_name: *mut ::std::ffi::c_char);
}

#[no_mangle]
pub extern "C" fn qweld_greeter_constructor(ptr: *mut ::std::ffi::c_void) {
    let handle = ::qweld_runtime::Handle::from_ptr(ptr);
    if handle.is_null() {
        return;
    }
    let mut object = <crate::greeter::Greeter as ::std::default::Default>::default();
    ::qweld_runtime::Bindable::qml_object_mut(&mut object).attach(handle);
    ::qweld_runtime::register(handle, object);
    if let Some(mut guard) = ::qweld_runtime::borrow(handle) {
        if let Some(object) = guard.downcast_mut::<crate::greeter::Greeter>() {
            object.init();
        }
    }
}

#[no_mangle]
pub extern "C" fn qweld_greeter_destroy(ptr: *mut ::std::ffi::c_void) {
    ::qweld_runtime::deregister(::qweld_runtime::Handle::from_ptr(ptr));
}

#[no_mangle]
pub extern "C" fn qweld_greeter_slot_increment(ptr: *mut ::std::ffi::c_void, step: ::std::ffi::c_int) -> ::std::ffi::c_int {
    let Some(mut guard) = ::qweld_runtime::borrow(::qweld_runtime::Handle::from_ptr(ptr)) else {
        return 0;
    };
    let Some(object) = guard.downcast_mut::<crate::greeter::Greeter>() else {
        return 0;
    };
    let step = unsafe { <i32 as ::qweld_runtime::Marshal>::from_shim(step) };
    let result = object.increment(step);
    <isize as ::qweld_runtime::Marshal>::to_shim(&result)
}

#[no_mangle]
pub extern "C" fn qweld_greeter_slot_greet(ptr: *mut ::std::ffi::c_void, name: *mut ::std::ffi::c_char, factor: ::std::ffi::c_double) -> *mut ::std::ffi::c_char {
    let Some(mut guard) = ::qweld_runtime::borrow(::qweld_runtime::Handle::from_ptr(ptr)) else {
        return ::std::ptr::null_mut();
    };
    let Some(object) = guard.downcast_mut::<crate::greeter::Greeter>() else {
        return ::std::ptr::null_mut();
    };
    let name = unsafe { <String as ::qweld_runtime::Marshal>::from_shim(name) };
    let factor = unsafe { <f64 as ::qweld_runtime::Marshal>::from_shim(factor) };
    let result = object.greet(name, factor);
    <String as ::qweld_runtime::Marshal>::to_shim(&result)
}

impl crate::greeter::Greeter {
    /// Returns `count` as stored by the native object.
    pub fn count(&self) -> isize {
        let handle = <Self as ::qweld_runtime::Bindable>::handle(self);
        if !::qweld_runtime::contains(handle) {
            return <isize as ::std::default::Default>::default();
        }
        let value = unsafe { Greeter_Count(handle.as_ptr()) };
        unsafe { <isize as ::qweld_runtime::Marshal>::from_shim(value) }
    }

    /// Sets `count` on the native object, which notifies QML when it changes.
    pub fn set_count(&self, value: isize) {
        let handle = <Self as ::qweld_runtime::Bindable>::handle(self);
        if !::qweld_runtime::contains(handle) {
            return;
        }
        let value = <isize as ::qweld_runtime::Marshal>::to_shim(&value);
        unsafe { Greeter_SetCount(handle.as_ptr(), value) }
    }

    /// Returns `name` as stored by the native object.
    pub fn name(&self) -> String {
        let handle = <Self as ::qweld_runtime::Bindable>::handle(self);
        if !::qweld_runtime::contains(handle) {
            return <String as ::std::default::Default>::default();
        }
        let value = unsafe { Greeter_Name(handle.as_ptr()) };
        unsafe { ::qweld_runtime::NativeString::from_raw(value) }.into_string()
    }

    /// Sets `name` on the native object, which notifies QML when it changes.
    pub fn set_name(&self, value: String) {
        let handle = <Self as ::qweld_runtime::Bindable>::handle(self);
        if !::qweld_runtime::contains(handle) {
            return;
        }
        let value = ::qweld_runtime::ShimString::new(&value);
        unsafe { Greeter_SetName(handle.as_ptr(), value.as_ptr()) }
    }

    /// Emits `countChanged` on the native object.
    pub fn count_changed(&self, count: isize) {
        let handle = <Self as ::qweld_runtime::Bindable>::handle(self);
        if !::qweld_runtime::contains(handle) {
            return;
        }
        let count = <isize as ::qweld_runtime::Marshal>::to_shim(&count);
        unsafe { Greeter_CountChanged(handle.as_ptr(), count) }
    }

    /// Emits `said` on the native object.
    pub fn said(&self, text: String) {
        let handle = <Self as ::qweld_runtime::Bindable>::handle(self);
        if !::qweld_runtime::contains(handle) {
            return;
        }
        let text = ::qweld_runtime::ShimString::new(&text);
        unsafe { Greeter_Said(handle.as_ptr(), text.as_ptr()) }
    }

    /// Registers `Greeter` as a QML type named `qml_name` in module `uri`.
    pub fn register_as(uri: &str, version_major: i32, version_minor: i32, qml_name: &str) {
        let uri = ::qweld_runtime::ShimString::new(uri);
        let qml_name = ::qweld_runtime::ShimString::new(qml_name);
        unsafe { Greeter_RegisterType(uri.as_ptr(), version_major, version_minor, qml_name.as_ptr()) }
    }
}
