//! The per-form field registry.
//!
//! Each mounted field hands the registry a set of accessors. The registry
//! never stores field values itself: snapshots are rebuilt on demand by
//! calling every registered getter, so editing one field never touches the
//! others.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;
use tracing::{debug, trace};

use crate::form::FormSnapshot;
use crate::path::{self, FieldPath};

// -----------------------------------------------------------------------------
// ID Generation
// -----------------------------------------------------------------------------

static LAST_ID: AtomicUsize = AtomicUsize::new(0);

fn next_id() -> usize {
    LAST_ID.fetch_add(1, Ordering::SeqCst)
}

/// Identifies one registration of a field.
///
/// A field that is re-registered under the same name gets a new id, which
/// lets a stale component release only its own entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(usize);

/// Path-keyed validation messages.
pub type ErrorMap = BTreeMap<String, String>;

// -----------------------------------------------------------------------------
// Accessors
// -----------------------------------------------------------------------------

/// The get/set/clear contract a field exposes to its form.
pub struct FieldAccessors {
    get: Box<dyn Fn() -> Value>,
    set: Box<dyn Fn(Value)>,
    clear: Box<dyn Fn()>,
}

impl FieldAccessors {
    /// Creates accessors from three closures over the field's local state.
    pub fn new(
        get: impl Fn() -> Value + 'static,
        set: impl Fn(Value) + 'static,
        clear: impl Fn() + 'static,
    ) -> Self {
        Self {
            get: Box::new(get),
            set: Box::new(set),
            clear: Box::new(clear),
        }
    }

    /// Reads the field's current value.
    pub fn get_value(&self) -> Value {
        (self.get)()
    }

    /// Replaces the field's value.
    pub fn set_value(&self, value: Value) {
        (self.set)(value);
    }

    /// Resets the field to its empty value.
    pub fn clear_value(&self) {
        (self.clear)();
    }
}

impl fmt::Debug for FieldAccessors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessors").finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct Registration {
    id: RegistrationId,
    accessors: FieldAccessors,
}

// -----------------------------------------------------------------------------
// Registry
// -----------------------------------------------------------------------------

/// Mapping from canonical field name to accessors, plus the form's current
/// error messages and initial data.
///
/// Lookups of names that are not registered are silent no-ops: a field that
/// is not mounted right now is an expected state during partial renders.
#[derive(Debug, Default)]
pub struct FieldRegistry {
    fields: BTreeMap<String, Registration>,
    errors: ErrorMap,
    initial_data: Value,
}

impl FieldRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores accessors under the canonical form of `path`, replacing any
    /// existing registration for that name.
    pub fn register(&mut self, path: &FieldPath, accessors: FieldAccessors) -> RegistrationId {
        let name = path.canonical();
        let id = RegistrationId(next_id());
        if self
            .fields
            .insert(name.clone(), Registration { id, accessors })
            .is_some()
        {
            debug!(field = %name, "field re-registered, previous registration replaced");
        } else {
            trace!(field = %name, "field registered");
        }
        id
    }

    /// Removes the registration for `name`. Returns false if none existed.
    pub fn unregister(&mut self, name: &str) -> bool {
        let removed = self.fields.remove(name).is_some();
        if removed {
            trace!(field = %name, "field unregistered");
        }
        removed
    }

    /// Removes the registration for `name` only if it is still `id`.
    ///
    /// Used by fields on unmount so that a component replaced by a newer
    /// registration does not remove its successor.
    pub fn release(&mut self, name: &str, id: RegistrationId) -> bool {
        if self.is_active(name, id) {
            self.unregister(name)
        } else {
            false
        }
    }

    /// Returns true if `id` is the active registration for `name`.
    pub fn is_active(&self, name: &str, id: RegistrationId) -> bool {
        self.fields.get(name).is_some_and(|reg| reg.id == id)
    }

    /// Returns true if a field is registered under `name`.
    pub fn is_registered(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns the registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Returns the number of registered fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether no field is registered.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the current value of `name`, or `None` if it is not registered.
    pub fn get_field_value(&self, name: &str) -> Option<Value> {
        self.fields.get(name).map(|reg| reg.accessors.get_value())
    }

    /// Sets the value of `name`. Returns false (and does nothing) if the field
    /// is not registered.
    pub fn set_field_value(&self, name: &str, value: Value) -> bool {
        match self.fields.get(name) {
            Some(reg) => {
                reg.accessors.set_value(value);
                true
            }
            None => false,
        }
    }

    /// Clears the value of `name`. Returns false if the field is not registered.
    pub fn clear_field_value(&self, name: &str) -> bool {
        match self.fields.get(name) {
            Some(reg) => {
                reg.accessors.clear_value();
                true
            }
            None => false,
        }
    }

    /// Clears every registered field.
    pub fn reset(&self) {
        for reg in self.fields.values() {
            reg.accessors.clear_value();
        }
    }

    /// Sets every registered field whose path is present in `data`.
    ///
    /// Keys present in `data` may be nested (`{"Categorias": [{"Codigo": ..}]}`)
    /// or flat canonical names (`{"Categorias[0].Codigo": ..}`). Fields whose
    /// path is absent are left untouched. Returns the number of fields set.
    pub fn set_data(&self, data: &Value) -> usize {
        let mut applied = 0;
        for (name, reg) in &self.fields {
            if let Some(value) = path::pick(data, name) {
                reg.accessors.set_value(value.clone());
                applied += 1;
            }
        }
        debug!(applied, registered = self.fields.len(), "form data set");
        applied
    }

    /// Builds a snapshot by reading every registered field.
    pub fn get_data(&self) -> FormSnapshot {
        self.fields
            .iter()
            .map(|(name, reg)| (name.clone(), reg.accessors.get_value()))
            .collect()
    }

    /// Replaces the data fields read their initial value from when they mount.
    pub fn set_initial_data(&mut self, data: Value) {
        self.initial_data = data;
    }

    /// Returns the initial value for `name`, if the initial data has one.
    pub fn initial_value(&self, name: &str) -> Option<Value> {
        path::pick(&self.initial_data, name).cloned()
    }

    // -------------------------------------------------------------------------
    // Errors
    // -------------------------------------------------------------------------

    /// Replaces the form's error messages.
    ///
    /// Messages whose path matches a registered field are shown by that
    /// field. The rest are kept and reported by
    /// [`unmatched_errors`](Self::unmatched_errors) so the page can show them
    /// next to the enclosing section (an array's min-length message, or a row
    /// that is not mounted).
    pub fn set_errors(&mut self, errors: ErrorMap) {
        for path in errors.keys().filter(|p| !self.fields.contains_key(*p)) {
            debug!(path = %path, "error has no matching field, kept as unmatched");
        }
        self.errors = errors;
    }

    /// Sets the error message for a single field path.
    pub fn set_field_error(&mut self, name: &str, message: impl Into<String>) {
        self.errors.insert(name.to_string(), message.into());
    }

    /// Removes the error message for `name`. Returns true if one was shown.
    pub fn clear_field_error(&mut self, name: &str) -> bool {
        self.errors.remove(name).is_some()
    }

    /// Removes every error message.
    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Returns the message for `name`, if any.
    pub fn field_error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    /// Returns every current error message.
    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    /// Returns the messages whose path has no registered field.
    pub fn unmatched_errors(&self) -> ErrorMap {
        self.errors
            .iter()
            .filter(|(path, _)| !self.fields.contains_key(*path))
            .map(|(path, message)| (path.clone(), message.clone()))
            .collect()
    }

    /// Returns the messages at or under `base` (e.g. every `Categorias...` error).
    pub fn errors_within(&self, base: &str) -> ErrorMap {
        self.errors
            .iter()
            .filter(|(path, _)| path::is_within(path, base))
            .map(|(path, message)| (path.clone(), message.clone()))
            .collect()
    }
}
