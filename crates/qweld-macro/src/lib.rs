//! Proc macros for qweld
//!
//! Provides the derive that marks a Rust struct as the host side of a
//! generated Qt/QML binding.
//!
//! # Usage
//!
//! ```text
//! use qweld_runtime::{QmlBinding, QmlObject};
//! use std::marker::PhantomData;
//!
//! #[derive(Default, QmlBinding)]
//! pub struct Counter {
//!     base: QmlObject,
//!     #[qweld(property = "count")]
//!     _count: isize,
//!     #[qweld(signal = "countChanged")]
//!     _count_changed: PhantomData<fn(count: isize)>,
//! }
//! ```

use proc_macro::TokenStream;

mod qml_binding;

/// Derive macro for host types exposed to QML
///
/// This macro:
/// 1. Validates the `#[qweld(..)]` field annotations at compile time
/// 2. Implements `qweld_runtime::Bindable` over the `QmlObject` base field
///
/// The glue itself is produced by the qweld generator (usually from a build
/// script) and `include!`d next to the struct.
///
/// # Attributes
/// - `#[qweld(property = "name")]` - Property backed by the native object
/// - `#[qweld(signal = "name")]` - Signal emitted on the native object
/// - `#[qweld(slot = "name")]` - Slot dispatched to a method of the struct
/// - `#[qweld(constructor = "name")]` - Method run once after registration
/// - `#[qweld(base)]` - Marks the base field when its type is aliased
/// - `#[qweld(crate = "path")]` on the struct - Path of the runtime crate,
///   `::qweld_runtime` by default. Set it together with `runtime_crate` in
///   `qweld.toml` when the runtime is re-exported under another name.
///
/// Tagged fields must be placeholders (names starting with `_`). Signals,
/// slots and constructors use a function type, usually wrapped in
/// `PhantomData` so the struct stays `Default`.
#[proc_macro_derive(QmlBinding, attributes(qweld))]
pub fn derive_qml_binding(input: TokenStream) -> TokenStream {
    qml_binding::qml_binding_impl(input.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
