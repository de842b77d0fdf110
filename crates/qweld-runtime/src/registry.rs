//! Process-wide table from native handles to their host objects
//!
//! Every native to host call goes through [`borrow`], which serializes the
//! call against all other calls and returns an [`ObjectGuard`]. Dropping the
//! guard ends the call.
//!
//! Two locks are involved:
//!
//! - the call lock, held by an `ObjectGuard` for the whole call
//! - the table lock, held only while the handle table is read or mutated
//!
//! Registration and deregistration only take the table lock, so they proceed
//! while a call is in flight. A call always takes the call lock before the
//! table lock. An object deregistered while borrowed is dropped when its
//! guard goes away.
//!
//! The call lock is not reentrant: a host method that synchronously causes
//! another native to host call on any object (for example by emitting a
//! signal whose QML handler invokes a slot) deadlocks.

use crate::handle::Handle;
use once_cell::sync::Lazy;
use parking_lot::{ArcMutexGuard, Mutex, MutexGuard, RawMutex, RwLock};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Entry = Arc<Mutex<Box<dyn Any + Send>>>;

static REGISTRY: Lazy<ObjectRegistry> = Lazy::new(ObjectRegistry::new);

/// Handle table with call serialization
#[derive(Default)]
pub struct ObjectRegistry {
    calls: Mutex<()>,
    objects: RwLock<HashMap<Handle, Entry>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the host object for a native instance
    ///
    /// A null handle is ignored. Registering a handle again replaces the
    /// previous object, which happens when native memory is reused.
    pub fn register<T: Any + Send>(&self, handle: Handle, object: T) {
        if handle.is_null() {
            return;
        }

        let previous = self
            .objects
            .write()
            .insert(handle, Arc::new(Mutex::new(Box::new(object))));

        if previous.is_some() {
            tracing::warn!(%handle, "handle registered twice, replacing object");
        } else {
            tracing::trace!(%handle, "registered object");
        }
    }

    /// Start a native to host call on the object of `handle`
    ///
    /// Returns `None` right away for the null handle. Otherwise waits until
    /// no other call is in flight, and returns `None` if the handle is not
    /// registered. The call lasts until the guard is dropped.
    pub fn borrow(&self, handle: Handle) -> Option<ObjectGuard<'_>> {
        if handle.is_null() {
            return None;
        }

        let call = self.calls.lock();
        let entry = self.objects.read().get(&handle).cloned();
        let Some(entry) = entry else {
            tracing::trace!(%handle, "borrow of unknown handle");
            return None;
        };

        Some(ObjectGuard {
            handle,
            object: entry.lock_arc(),
            _call: call,
        })
    }

    /// Remove the object of a native instance
    ///
    /// The object is dropped outside the table lock, or when the guard of an
    /// in-flight call on it is dropped. Unknown and null handles are ignored.
    pub fn deregister(&self, handle: Handle) {
        if handle.is_null() {
            return;
        }

        let removed = self.objects.write().remove(&handle);
        match removed {
            Some(entry) => {
                tracing::trace!(%handle, "deregistered object");
                drop(entry);
            }
            None => tracing::trace!(%handle, "deregister of unknown handle"),
        }
    }

    /// Whether a handle is registered, without starting a call
    pub fn contains(&self, handle: Handle) -> bool {
        !handle.is_null() && self.objects.read().contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("objects", &self.len())
            .field("in_call", &self.calls.is_locked())
            .finish()
    }
}

/// Exclusive access to a registered object for the duration of one call
///
/// Dropping the guard releases the call lock.
pub struct ObjectGuard<'a> {
    handle: Handle,
    // Dropped before the call lock
    object: ArcMutexGuard<RawMutex, Box<dyn Any + Send>>,
    _call: MutexGuard<'a, ()>,
}

impl ObjectGuard<'_> {
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// The object as its concrete type, if it is a `T`
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        (**self.object).downcast_mut::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (**self.object).downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        (**self.object).is::<T>()
    }

    /// End the call
    pub fn release(self) {
        drop(self);
    }
}

impl fmt::Debug for ObjectGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectGuard").field("handle", &self.handle).finish()
    }
}

/// The process-wide registry used by generated trampolines
pub fn global() -> &'static ObjectRegistry {
    &REGISTRY
}

/// [`ObjectRegistry::register`] on the global registry
pub fn register<T: Any + Send>(handle: Handle, object: T) {
    REGISTRY.register(handle, object);
}

/// [`ObjectRegistry::borrow`] on the global registry
pub fn borrow(handle: Handle) -> Option<ObjectGuard<'static>> {
    REGISTRY.borrow(handle)
}

/// [`ObjectRegistry::deregister`] on the global registry
pub fn deregister(handle: Handle) {
    REGISTRY.deregister(handle);
}

/// [`ObjectRegistry::contains`] on the global registry
pub fn contains(handle: Handle) -> bool {
    REGISTRY.contains(handle)
}
