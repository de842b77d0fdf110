//! The marker base type and the trait implemented for bound host types

use crate::handle::Handle;
use crate::registry;

/// Base field of every host type exposed to QML
///
/// Holds the handle of the native instance the host object shadows. A
/// default-constructed `QmlObject` is detached; the generated constructor
/// trampoline attaches it before the object is registered.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QmlObject {
    handle: Handle,
}

impl QmlObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to a native instance
    pub fn attach(&mut self, handle: Handle) {
        if !self.handle.is_null() && self.handle != handle {
            tracing::warn!(from = %self.handle, to = %handle, "re-attaching bound object");
        }
        self.handle = handle;
    }

    /// Forget the native instance
    pub fn detach(&mut self) {
        self.handle = Handle::NULL;
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn is_attached(&self) -> bool {
        !self.handle.is_null()
    }
}

/// Host types with a [`QmlObject`] base, implemented by `#[derive(QmlBinding)]`
pub trait Bindable {
    /// The base field
    fn qml_object(&self) -> &QmlObject;

    fn qml_object_mut(&mut self) -> &mut QmlObject;

    /// Handle of the native instance this object shadows
    fn handle(&self) -> Handle {
        self.qml_object().handle()
    }

    /// Whether the native instance is still registered
    fn is_live(&self) -> bool {
        registry::contains(self.handle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Item {
        base: QmlObject,
    }

    impl Bindable for Item {
        fn qml_object(&self) -> &QmlObject {
            &self.base
        }

        fn qml_object_mut(&mut self) -> &mut QmlObject {
            &mut self.base
        }
    }

    #[test]
    fn test_attach_detach() {
        let mut item = Item::default();
        assert!(!item.qml_object().is_attached());
        assert!(!item.is_live());

        item.qml_object_mut().attach(Handle::from(0x10));
        assert_eq!(item.handle(), Handle::from(0x10));
        assert!(item.qml_object().is_attached());

        item.qml_object_mut().detach();
        assert!(item.handle().is_null());
    }
}
