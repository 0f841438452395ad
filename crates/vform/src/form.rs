//! The form container and its snapshots.

use std::collections::BTreeMap;
use std::future::Future;

use serde_json::{Map, Value};
use tracing::debug;

use crate::context::FormContext;
use crate::path;
use crate::registry::ErrorMap;
use crate::schema::{Schema, ValidationErrors};
use crate::{FormError, Result};

// -----------------------------------------------------------------------------
// FormSnapshot
// -----------------------------------------------------------------------------

/// The values of every mounted field at one point in time, keyed by
/// canonical name.
///
/// Snapshots are rebuilt from the fields on every request and never stored
/// by the form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormSnapshot {
    values: BTreeMap<String, Value>,
}

impl FormSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Returns the value captured for `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns the number of captured fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether no field was captured.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the captured names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Builds the nested object the names describe.
    ///
    /// `Categorias[0].Operacao` becomes `{"Categorias": [{"Operacao": ..}]}`.
    /// A name that does not parse as a path is kept as a flat key.
    pub fn to_value(&self) -> Value {
        let mut root = Value::Object(Map::new());
        for (name, value) in &self.values {
            match path::segments(name) {
                Ok(parts) => path::insert(&mut root, &parts, value.clone()),
                Err(_) => {
                    if let Value::Object(map) = &mut root {
                        map.insert(name.clone(), value.clone());
                    }
                }
            }
        }
        root
    }

    /// Consumes the snapshot into its flat map.
    pub fn into_flat(self) -> BTreeMap<String, Value> {
        self.values
    }
}

impl FromIterator<(String, Value)> for FormSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl From<FormSnapshot> for Value {
    fn from(snapshot: FormSnapshot) -> Self {
        snapshot.to_value()
    }
}

// -----------------------------------------------------------------------------
// FormContainer
// -----------------------------------------------------------------------------

/// Owns one form's registry and exposes the page-facing operations.
///
/// Fields mount against [`context`](Self::context). The container itself is
/// the handle pages keep; there is no nullable reference to check.
#[derive(Debug, Default)]
pub struct FormContainer {
    ctx: FormContext,
}

impl FormContainer {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a form whose fields start from `data` when they mount.
    pub fn with_initial_data(data: Value) -> Self {
        let form = Self::new();
        form.ctx.registry_mut().set_initial_data(data);
        form
    }

    /// Returns the context fields mount against.
    pub fn context(&self) -> &FormContext {
        &self.ctx
    }

    /// Sets every mounted field whose path is present in `data`.
    ///
    /// Returns the number of fields that received a value.
    pub fn set_data(&self, data: &Value) -> usize {
        self.ctx.registry().set_data(data)
    }

    /// Reads every mounted field.
    pub fn get_data(&self) -> FormSnapshot {
        self.ctx.registry().get_data()
    }

    /// Returns the value of one field, or `None` if it is not mounted.
    pub fn get_field_value(&self, name: &str) -> Option<Value> {
        self.ctx.registry().get_field_value(name)
    }

    /// Returns the value of one field, or [`FormError::UnknownField`].
    pub fn try_get_field_value(&self, name: &str) -> Result<Value> {
        self.get_field_value(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))
    }

    /// Sets one field. A field that is not mounted is skipped.
    pub fn set_field_value(&self, name: &str, value: Value) -> bool {
        self.ctx.registry().set_field_value(name, value)
    }

    /// Sets one field, or returns [`FormError::UnknownField`].
    pub fn try_set_field_value(&self, name: &str, value: Value) -> Result<()> {
        if self.set_field_value(name, value) {
            Ok(())
        } else {
            Err(FormError::UnknownField(name.to_string()))
        }
    }

    /// Clears every mounted field and every error.
    pub fn reset(&self) {
        self.ctx.registry().reset();
        self.ctx.registry_mut().clear_errors();
    }

    /// Replaces the form's error messages.
    pub fn set_errors(&self, errors: ErrorMap) {
        self.ctx.registry_mut().set_errors(errors);
    }

    /// Shows a message on one field.
    pub fn set_field_error(&self, name: &str, message: impl Into<String>) {
        self.ctx.registry_mut().set_field_error(name, message);
    }

    /// Removes every error message.
    pub fn clear_errors(&self) {
        self.ctx.registry_mut().clear_errors();
    }

    /// Returns the message shown for `name`.
    pub fn field_error(&self, name: &str) -> Option<String> {
        self.ctx.field_error(name)
    }

    /// Returns all current messages.
    pub fn errors(&self) -> ErrorMap {
        self.ctx.registry().errors().clone()
    }

    /// Returns the messages no mounted field displays.
    pub fn unmatched_errors(&self) -> ErrorMap {
        self.ctx.registry().unmatched_errors()
    }

    /// Returns the messages at or under `base`.
    pub fn errors_within(&self, base: &str) -> ErrorMap {
        self.ctx.registry().errors_within(base)
    }

    /// Pushes validation failures to the fields.
    pub fn apply_errors(&self, errors: &ValidationErrors) {
        self.set_errors(errors.error_map());
    }

    /// Validates the current snapshot against `schema`.
    ///
    /// On failure the messages are applied to the fields before returning.
    /// On success any previous messages are cleared.
    pub fn validate(&self, schema: &Schema) -> std::result::Result<Value, ValidationErrors> {
        self.validate_with(schema, Map::new())
    }

    /// Like [`validate`](Self::validate), with `extra` keys merged over the
    /// snapshot first. Used for values the page keeps outside registered
    /// fields, such as a list of rows.
    pub fn validate_with(
        &self,
        schema: &Schema,
        extra: Map<String, Value>,
    ) -> std::result::Result<Value, ValidationErrors> {
        let mut data = self.get_data().to_value();
        if let Value::Object(map) = &mut data {
            map.extend(extra);
        }
        match schema.validate(&data) {
            Ok(valid) => {
                self.clear_errors();
                Ok(valid)
            }
            Err(errors) => {
                self.apply_errors(&errors);
                Err(errors)
            }
        }
    }

    /// Runs one submit: collects the snapshot and hands it to `on_submit`.
    pub async fn submit<F, Fut>(&self, on_submit: F) -> Fut::Output
    where
        F: FnOnce(FormSnapshot) -> Fut,
        Fut: Future,
    {
        let data = self.get_data();
        debug!(fields = data.len(), "form submitted");
        on_submit(data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, NumberField, TextField};
    use crate::path::FieldPath;
    use crate::schema::Rule;
    use serde_json::json;

    #[test]
    fn snapshot_nests_indexed_names() {
        let snapshot: FormSnapshot = [
            ("Nome".to_string(), json!("Acme")),
            ("Categorias[0].Operacao".to_string(), json!("Venda")),
            ("Categorias[0].Codigo".to_string(), json!("01")),
            ("Categorias[1].Codigo".to_string(), json!("02")),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            snapshot.to_value(),
            json!({
                "Nome": "Acme",
                "Categorias": [
                    { "Operacao": "Venda", "Codigo": "01" },
                    { "Codigo": "02" }
                ]
            })
        );
    }

    #[test]
    fn set_then_get_round_trips_mounted_fields() {
        let form = FormContainer::new();
        let _nome = TextField::mount(form.context(), "Nome");
        let _op = TextField::mount(
            form.context(),
            FieldPath::indexed("Categorias", 0, "Operacao"),
        );

        form.set_data(&json!({
            "Nome": "Acme",
            "CodigoRegiao": "not mounted",
            "Categorias": [{ "Operacao": "Venda" }]
        }));

        assert_eq!(
            form.get_data().to_value(),
            json!({ "Nome": "Acme", "Categorias": [{ "Operacao": "Venda" }] })
        );
    }

    #[test]
    fn strict_accessors_report_unknown_fields() {
        let form = FormContainer::new();
        assert_eq!(
            form.try_get_field_value("Nome"),
            Err(FormError::UnknownField("Nome".into()))
        );
        assert!(form.try_set_field_value("Nome", json!("x")).is_err());
        assert_eq!(form.get_field_value("Nome"), None);
    }

    #[test]
    fn initial_data_seeds_fields_mounted_later() {
        let form = FormContainer::with_initial_data(json!({ "CaracteristicaImovel": 3 }));
        let field = NumberField::mount(form.context(), "CaracteristicaImovel");
        assert_eq!(field.value(), json!(3));
    }

    #[test]
    fn validate_applies_and_clears_errors() {
        let form = FormContainer::new();
        let nome = TextField::mount(form.context(), "Nome");
        let schema = Schema::object().field("Nome", Rule::string().required());

        assert!(form.validate(&schema).is_err());
        assert!(nome.error().is_some());

        nome.set_value(json!("Acme"));
        assert_eq!(form.validate(&schema).unwrap(), json!({ "Nome": "Acme" }));
        assert!(form.errors().is_empty());
    }

    #[test]
    fn validate_with_merges_page_state() {
        let form = FormContainer::new();
        let _nome = TextField::mount(form.context(), "Nome").with_value("Acme".into());
        let schema = Schema::object()
            .field("Nome", Rule::string().required())
            .field("Tags", Rule::array(Rule::string()).min(1));

        let mut extra = Map::new();
        extra.insert("Tags".into(), json!([]));
        let errors = form.validate_with(&schema, extra).unwrap_err();
        assert!(errors.contains("Tags"));
        assert_eq!(form.unmatched_errors().len(), 1);
    }

    #[test]
    fn reset_clears_values_and_errors() {
        let form = FormContainer::new();
        let nome = TextField::mount(form.context(), "Nome").with_value("x".into());
        form.set_field_error("Nome", "erro");
        form.reset();
        assert_eq!(nome.local(), "");
        assert!(form.errors().is_empty());
    }

    #[tokio::test]
    async fn submit_passes_snapshot() {
        let form = FormContainer::new();
        let _nome = TextField::mount(form.context(), "Nome").with_value("Acme".into());
        let seen = form
            .submit(|data| async move { data.get("Nome").cloned() })
            .await;
        assert_eq!(seen, Some(json!("Acme")));
    }
}
