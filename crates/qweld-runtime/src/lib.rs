//! Qweld runtime: support code linked into programs using qweld bindings
//!
//! Generated glue relies on this crate for:
//!
//! - [`QmlObject`], the base field marking a struct as bindable
//! - [`Bindable`], implemented by `#[derive(QmlBinding)]`
//! - the object registry mapping native instances to host objects
//! - [`Marshal`] and the string buffers crossing the C ABI
//! - `qweld_string_free`, exported for native code
//!
//! # Usage
//!
//! ```rust,ignore
//! use qweld_runtime::{QmlBinding, QmlObject};
//! use std::marker::PhantomData;
//!
//! #[derive(Default, QmlBinding)]
//! pub struct Counter {
//!     base: QmlObject,
//!     #[qweld(property = "count")]
//!     _count: isize,
//!     #[qweld(slot = "increment")]
//!     _increment: PhantomData<fn() -> isize>,
//! }
//!
//! impl Counter {
//!     fn increment(&mut self) -> isize {
//!         let next = self.count() + 1;
//!         self.set_count(next);
//!         next
//!     }
//! }
//!
//! include!("qweld_counter.rs");
//! ```

// Lets the derive's `::qweld_runtime` paths resolve inside this crate
extern crate self as qweld_runtime;

pub mod ffi;
pub mod handle;
pub mod marshal;
pub mod object;
pub mod registry;

pub use handle::Handle;
pub use marshal::{Marshal, NativeString, ShimString};
pub use object::{Bindable, QmlObject};
pub use registry::{borrow, contains, deregister, global, register, ObjectGuard, ObjectRegistry};

pub use qweld_macro::QmlBinding;
