//! The handle fields use to reach their form.
//!
//! A [`FormContext`] is created by one [`FormContainer`](crate::FormContainer)
//! and passed explicitly to every field mounted in that form. Clones share the
//! same registry; there is no process-wide form state.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use serde_json::Value;

use crate::path::FieldPath;
use crate::registry::{FieldAccessors, FieldRegistry, RegistrationId};

/// Shared handle to one form's [`FieldRegistry`].
///
/// All registry mutations happen on the thread that owns the form, so the
/// handle is `!Send` and uses `RefCell` rather than a lock.
#[derive(Debug, Clone, Default)]
pub struct FormContext {
    registry: Rc<RefCell<FieldRegistry>>,
}

impl FormContext {
    /// Creates a context around a fresh registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a field's accessors. See [`FieldRegistry::register`].
    pub fn register(&self, path: &FieldPath, accessors: FieldAccessors) -> RegistrationId {
        self.registry.borrow_mut().register(path, accessors)
    }

    /// Releases a field's registration if it is still the active one.
    pub fn release(&self, name: &str, id: RegistrationId) -> bool {
        self.registry.borrow_mut().release(name, id)
    }

    /// Returns true if `id` is the active registration for `name`.
    pub fn is_active(&self, name: &str, id: RegistrationId) -> bool {
        self.registry.borrow().is_active(name, id)
    }

    /// Returns the initial value seeded for `name`, if any.
    pub fn initial_value(&self, name: &str) -> Option<Value> {
        self.registry.borrow().initial_value(name)
    }

    /// Returns the error message currently shown for `name`.
    pub fn field_error(&self, name: &str) -> Option<String> {
        self.registry.borrow().field_error(name).map(str::to_string)
    }

    /// Removes the error message shown for `name`.
    pub fn clear_field_error(&self, name: &str) -> bool {
        self.registry.borrow_mut().clear_field_error(name)
    }

    /// Returns true if both handles point at the same form.
    pub fn same_form(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.registry, &other.registry)
    }

    /// Borrows the registry.
    ///
    /// # Panics
    ///
    /// Panics if the registry is mutably borrowed, which only happens if a
    /// field accessor re-enters the form.
    pub fn registry(&self) -> Ref<'_, FieldRegistry> {
        self.registry.borrow()
    }

    /// Mutably borrows the registry.
    ///
    /// # Panics
    ///
    /// Panics if the registry is already borrowed.
    pub fn registry_mut(&self) -> RefMut<'_, FieldRegistry> {
        self.registry.borrow_mut()
    }
}
