//! Field components.
//!
//! A field owns its display value locally and registers get/set/clear
//! accessors with its form when it mounts. Typing into one field updates only
//! that field's state; the form reads every value back at submit time.
//! Dropping a field unmounts it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use tracing::trace;

use crate::context::FormContext;
use crate::path::FieldPath;
use crate::registry::{FieldAccessors, RegistrationId};

// -----------------------------------------------------------------------------
// Field Trait
// -----------------------------------------------------------------------------

/// A mounted form field, independent of its value type.
pub trait Field {
    /// Returns the field's canonical name.
    fn name(&self) -> &str;

    /// Returns the field's value as the form sees it.
    fn value(&self) -> Value;

    /// Replaces the value programmatically (does not clear the error).
    fn set_value(&self, value: Value);

    /// Resets the field to its empty value.
    fn clear(&self);

    /// Returns the validation message currently shown for this field.
    fn error(&self) -> Option<String>;

    /// Applies a user edit: updates the value and clears the shown error.
    fn input_value(&self, value: Value);

    /// Returns the field's label.
    fn get_label(&self) -> &str;
}

// -----------------------------------------------------------------------------
// Field Kinds
// -----------------------------------------------------------------------------

/// Converts between a field's local display state and form values.
pub trait FieldKind: 'static {
    /// The value the field holds while the user edits it.
    type Local: Clone + PartialEq + Default + fmt::Debug + 'static;

    /// Converts a form value into local state. Unrecognized values map to the
    /// empty state.
    fn decode(&self, value: &Value) -> Self::Local;

    /// Converts local state into a form value.
    fn encode(&self, local: &Self::Local) -> Value;
}

/// Free text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextKind;

impl FieldKind for TextKind {
    type Local = String;

    fn decode(&self, value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    fn encode(&self, local: &String) -> Value {
        Value::String(local.clone())
    }
}

/// Numeric input. The raw text is kept so partial input such as `"1."` is
/// not lost; text that does not parse is submitted as-is for the schema to
/// reject.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberKind;

impl FieldKind for NumberKind {
    type Local = String;

    fn decode(&self, value: &Value) -> String {
        match value {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            _ => String::new(),
        }
    }

    fn encode(&self, local: &String) -> Value {
        let raw = local.trim();
        if raw.is_empty() {
            return Value::Null;
        }
        if let Ok(int) = raw.parse::<i64>() {
            return Value::from(int);
        }
        raw.parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map_or_else(|| Value::String(local.clone()), Value::Number)
    }
}

/// Calendar date, submitted as `YYYY-MM-DD` or `null` when empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateKind;

impl DateKind {
    /// Parses `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
    }
}

impl FieldKind for DateKind {
    type Local = Option<NaiveDate>;

    fn decode(&self, value: &Value) -> Option<NaiveDate> {
        value.as_str().and_then(Self::parse)
    }

    fn encode(&self, local: &Option<NaiveDate>) -> Value {
        local.map_or(Value::Null, |date| {
            Value::String(date.format("%Y-%m-%d").to_string())
        })
    }
}

/// An option for select fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption<T: Clone + PartialEq> {
    /// The label shown to the user.
    pub key: String,
    /// The underlying value.
    pub value: T,
}

impl<T: Clone + PartialEq> SelectOption<T> {
    /// Creates a new option.
    pub fn new(key: impl Into<String>, value: T) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Creates options whose label and value are the same string.
pub fn new_options<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Vec<SelectOption<Value>> {
    values
        .into_iter()
        .map(|v| {
            let s: String = v.into();
            SelectOption::new(s.clone(), Value::String(s))
        })
        .collect()
}

/// One choice out of a fixed option list. Local state is the selected index.
#[derive(Debug, Clone, Default)]
pub struct SelectKind {
    options: Vec<SelectOption<Value>>,
}

impl SelectKind {
    /// Creates a select kind over `options`.
    pub fn new(options: Vec<SelectOption<Value>>) -> Self {
        Self { options }
    }

    /// Returns the options.
    pub fn options(&self) -> &[SelectOption<Value>] {
        &self.options
    }
}

impl FieldKind for SelectKind {
    type Local = Option<usize>;

    fn decode(&self, value: &Value) -> Option<usize> {
        self.options.iter().position(|opt| &opt.value == value)
    }

    fn encode(&self, local: &Option<usize>) -> Value {
        local
            .and_then(|i| self.options.get(i))
            .map_or(Value::Null, |opt| opt.value.clone())
    }
}

// -----------------------------------------------------------------------------
// BoundField
// -----------------------------------------------------------------------------

/// A field bound to one form for as long as it lives.
pub struct BoundField<K: FieldKind> {
    ctx: FormContext,
    path: FieldPath,
    name: String,
    id: RegistrationId,
    kind: Rc<K>,
    state: Rc<RefCell<K::Local>>,
    label: String,
    disabled: bool,
    on_change: Option<Box<dyn Fn(&K::Local)>>,
}

/// A text input.
pub type TextField = BoundField<TextKind>;
/// A numeric input.
pub type NumberField = BoundField<NumberKind>;
/// A date picker.
pub type DateField = BoundField<DateKind>;
/// A single-choice select.
pub type SelectField = BoundField<SelectKind>;

impl<K: FieldKind> BoundField<K> {
    /// Mounts a field of `kind` under `path`.
    ///
    /// The initial value comes from the form's initial data when it has an
    /// entry for this path; otherwise the field starts empty.
    pub fn mount_with(ctx: &FormContext, path: impl Into<FieldPath>, kind: K) -> Self {
        let path = path.into();
        let name = path.canonical();
        let kind = Rc::new(kind);
        let initial = ctx
            .initial_value(&name)
            .map(|value| kind.decode(&value))
            .unwrap_or_default();
        let state = Rc::new(RefCell::new(initial));

        let accessors = {
            let (get_state, get_kind) = (Rc::clone(&state), Rc::clone(&kind));
            let (set_state, set_kind) = (Rc::clone(&state), Rc::clone(&kind));
            let clear_state = Rc::clone(&state);
            FieldAccessors::new(
                move || get_kind.encode(&get_state.borrow()),
                move |value| *set_state.borrow_mut() = set_kind.decode(&value),
                move || *clear_state.borrow_mut() = K::Local::default(),
            )
        };
        let id = ctx.register(&path, accessors);
        trace!(field = %name, "field mounted");

        Self {
            ctx: ctx.clone(),
            path,
            name,
            id,
            kind,
            state,
            label: String::new(),
            disabled: false,
            on_change: None,
        }
    }

    /// Sets the displayed value explicitly (controlled usage).
    pub fn with_value(self, local: K::Local) -> Self {
        *self.state.borrow_mut() = local;
        self
    }

    /// Sets the label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets whether user edits are ignored.
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Registers a callback invoked after every user edit.
    pub fn on_change(mut self, f: impl Fn(&K::Local) + 'static) -> Self {
        self.on_change = Some(Box::new(f));
        self
    }

    /// Enables or disables user edits on a mounted field.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Returns whether user edits are ignored.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns the structured path.
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Returns the field kind.
    pub fn kind(&self) -> &K {
        &self.kind
    }

    /// Returns a copy of the local display state.
    pub fn local(&self) -> K::Local {
        self.state.borrow().clone()
    }

    /// Applies a user edit.
    ///
    /// Updates the local state, clears the error shown for this field and
    /// calls the change callback. Ignored while the field is disabled.
    pub fn input(&self, local: K::Local) {
        if self.disabled {
            return;
        }
        *self.state.borrow_mut() = local;
        self.ctx.clear_field_error(&self.name);
        if let Some(on_change) = &self.on_change {
            // The callback may write back to this field.
            let current = self.state.borrow().clone();
            on_change(&current);
        }
    }

    /// Returns true while this field's registration is the active one for
    /// its name.
    pub fn is_mounted(&self) -> bool {
        self.ctx.is_active(&self.name, self.id)
    }
}

impl TextField {
    /// Mounts a text field.
    pub fn mount(ctx: &FormContext, path: impl Into<FieldPath>) -> Self {
        Self::mount_with(ctx, path, TextKind)
    }
}

impl NumberField {
    /// Mounts a numeric field.
    pub fn mount(ctx: &FormContext, path: impl Into<FieldPath>) -> Self {
        Self::mount_with(ctx, path, NumberKind)
    }
}

impl DateField {
    /// Mounts a date field.
    pub fn mount(ctx: &FormContext, path: impl Into<FieldPath>) -> Self {
        Self::mount_with(ctx, path, DateKind)
    }
}

impl SelectField {
    /// Mounts a select field over `options`.
    pub fn mount(
        ctx: &FormContext,
        path: impl Into<FieldPath>,
        options: Vec<SelectOption<Value>>,
    ) -> Self {
        Self::mount_with(ctx, path, SelectKind::new(options))
    }

    /// Returns the selected option, if any.
    pub fn selected(&self) -> Option<&SelectOption<Value>> {
        self.local().and_then(|i| self.kind.options().get(i))
    }
}

impl<K: FieldKind> Field for BoundField<K> {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Value {
        self.kind.encode(&self.state.borrow())
    }

    fn set_value(&self, value: Value) {
        *self.state.borrow_mut() = self.kind.decode(&value);
    }

    fn clear(&self) {
        *self.state.borrow_mut() = K::Local::default();
    }

    fn error(&self) -> Option<String> {
        self.ctx.field_error(&self.name)
    }

    fn input_value(&self, value: Value) {
        self.input(self.kind.decode(&value));
    }

    fn get_label(&self) -> &str {
        &self.label
    }
}

impl<K: FieldKind> fmt::Debug for BoundField<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundField")
            .field("name", &self.name)
            .field("value", &*self.state.borrow())
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

impl<K: FieldKind> Drop for BoundField<K> {
    fn drop(&mut self) {
        if self.ctx.release(&self.name, self.id) {
            trace!(field = %self.name, "field unmounted");
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn mount_registers_and_drop_unregisters() {
        let ctx = FormContext::new();
        {
            let field = TextField::mount(&ctx, "Nome");
            assert!(field.is_mounted());
            assert!(ctx.registry().is_registered("Nome"));
        }
        assert!(!ctx.registry().is_registered("Nome"));
    }

    #[test]
    fn uncontrolled_field_reads_initial_data() {
        let ctx = FormContext::new();
        ctx.registry_mut()
            .set_initial_data(json!({ "Nome": "Acme", "Categorias": [{ "Codigo": "7" }] }));

        let nome = TextField::mount(&ctx, "Nome");
        let codigo = TextField::mount(&ctx, FieldPath::indexed("Categorias", 0, "Codigo"));
        let regiao = TextField::mount(&ctx, "CodigoRegiao");

        assert_eq!(nome.local(), "Acme");
        assert_eq!(codigo.local(), "7");
        assert_eq!(regiao.local(), "");
    }

    #[test]
    fn controlled_value_overrides_initial_data() {
        let ctx = FormContext::new();
        ctx.registry_mut().set_initial_data(json!({ "Nome": "Acme" }));
        let nome = TextField::mount(&ctx, "Nome").with_value("Outra".into());
        assert_eq!(nome.value(), json!("Outra"));
    }

    #[test]
    fn registry_accessors_reach_local_state() {
        let ctx = FormContext::new();
        let nome = TextField::mount(&ctx, "Nome");

        assert!(ctx.registry().set_field_value("Nome", json!("Acme")));
        assert_eq!(nome.local(), "Acme");

        nome.input("Acme Ltda".into());
        assert_eq!(ctx.registry().get_field_value("Nome"), Some(json!("Acme Ltda")));

        ctx.registry().clear_field_value("Nome");
        assert_eq!(nome.local(), "");
    }

    #[test]
    fn input_clears_error_and_notifies() {
        let ctx = FormContext::new();
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let nome = TextField::mount(&ctx, "Nome").on_change(move |_| seen.set(seen.get() + 1));

        ctx.registry_mut().set_field_error("Nome", "obrigatório");
        assert_eq!(nome.error().as_deref(), Some("obrigatório"));

        nome.input("A".into());
        assert_eq!(nome.error(), None);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn on_change_can_write_back_to_its_field() {
        let ctx = FormContext::new();
        let handle = ctx.clone();
        let nome = TextField::mount(&ctx, "Nome").on_change(move |typed| {
            handle
                .registry()
                .set_field_value("Nome", json!(typed.to_uppercase()));
        });

        nome.input("acme".into());

        assert_eq!(nome.local(), "ACME");
        assert_eq!(ctx.registry().get_field_value("Nome"), Some(json!("ACME")));
    }

    #[test]
    fn programmatic_set_keeps_error() {
        let ctx = FormContext::new();
        let nome = TextField::mount(&ctx, "Nome");
        ctx.registry_mut().set_field_error("Nome", "obrigatório");
        nome.set_value(json!("x"));
        assert!(nome.error().is_some());
    }

    #[test]
    fn disabled_field_ignores_input() {
        let ctx = FormContext::new();
        let nome = TextField::mount(&ctx, "Nome")
            .with_value("a".into())
            .disabled(true);
        nome.input("b".into());
        assert_eq!(nome.local(), "a");
    }

    #[test]
    fn replaced_field_does_not_unregister_successor() {
        let ctx = FormContext::new();
        let old = TextField::mount(&ctx, "Categorias[0].Codigo").with_value("old".into());
        let new = TextField::mount(&ctx, "Categorias[0].Codigo").with_value("new".into());
        assert!(!old.is_mounted());
        drop(old);
        assert!(new.is_mounted());
        assert_eq!(
            ctx.registry().get_field_value("Categorias[0].Codigo"),
            Some(json!("new"))
        );
    }

    #[test]
    fn number_kind_encoding() {
        let kind = NumberKind;
        assert_eq!(kind.encode(&"3".into()), json!(3));
        assert_eq!(kind.encode(&"2.5".into()), json!(2.5));
        assert_eq!(kind.encode(&"  ".into()), Value::Null);
        assert_eq!(kind.encode(&"abc".into()), json!("abc"));
        assert_eq!(kind.decode(&json!(42)), "42");
        assert_eq!(kind.decode(&Value::Null), "");
    }

    #[test]
    fn date_kind_round_trip() {
        let ctx = FormContext::new();
        let date = DateField::mount(&ctx, "transaction_date");
        date.set_value(json!("2024-03-09"));
        assert_eq!(date.local(), NaiveDate::from_ymd_opt(2024, 3, 9));
        assert_eq!(date.value(), json!("2024-03-09"));

        date.set_value(json!("2024-03-09T10:00:00-03:00"));
        assert_eq!(date.value(), json!("2024-03-09"));

        date.clear();
        assert_eq!(date.value(), Value::Null);
    }

    #[test]
    fn select_tracks_option_values() {
        let ctx = FormContext::new();
        let situation = SelectField::mount(
            &ctx,
            "situation",
            vec![
                SelectOption::new("Aberto", json!("open")),
                SelectOption::new("Fechado", json!("closed")),
            ],
        );
        assert_eq!(situation.value(), Value::Null);

        situation.set_value(json!("closed"));
        assert_eq!(situation.selected().map(|o| o.key.as_str()), Some("Fechado"));

        situation.set_value(json!("unknown"));
        assert_eq!(situation.local(), None);
    }

    #[test]
    fn new_options_uses_same_label_and_value() {
        let opts = new_options(["Venda", "Compra"]);
        assert_eq!(opts.len(), 2);
        assert_eq!(opts[0].key, "Venda");
        assert_eq!(opts[0].value, json!("Venda"));
    }
}
