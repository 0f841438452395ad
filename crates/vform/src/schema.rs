//! Declarative validation schemas.
//!
//! A [`Schema`] describes an object shape: which keys are required, how raw
//! input is coerced (numeric text to numbers, numbers to text), nested arrays
//! and objects, and cross-field rules. [`Schema::validate`] evaluates every
//! constraint and reports all violations at once, keyed by the same paths
//! the fields are registered under (`Categorias[0].Codigo`).
//!
//! ```rust,ignore
//! use vform::{Rule, Schema};
//!
//! let schema = Schema::object()
//!     .field("Nome", Rule::string().required_with("Nome é obrigatório."))
//!     .field("CaracteristicaImovel", Rule::number().required())
//!     .field(
//!         "Categorias",
//!         Rule::array(Rule::object(
//!             Schema::object()
//!                 .field("Operacao", Rule::string().required())
//!                 .field("Codigo", Rule::string().required()),
//!         ))
//!         .required()
//!         .min_with(1, "Deve haver pelo menos uma categoria."),
//!     );
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::field::DateKind;
use crate::path::{join_index, join_key};
use crate::registry::ErrorMap;

// -----------------------------------------------------------------------------
// Messages
// -----------------------------------------------------------------------------

/// Default messages for each constraint.
///
/// Templates may contain `{min}`, `{max}` and `{values}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messages {
    /// Missing required value.
    pub required: String,
    /// Value of the wrong type.
    pub invalid: String,
    /// String shorter than `{min}` characters.
    pub string_min: String,
    /// String longer than `{max}` characters.
    pub string_max: String,
    /// Malformed e-mail address.
    pub email: String,
    /// Number below `{min}`.
    pub number_min: String,
    /// Number above `{max}`.
    pub number_max: String,
    /// Number with a fractional part.
    pub integer: String,
    /// Array with fewer than `{min}` items.
    pub array_min: String,
    /// Array with more than `{max}` items.
    pub array_max: String,
    /// Value outside the allowed set `{values}`.
    pub one_of: String,
}

impl Messages {
    /// Brazilian Portuguese messages.
    pub fn pt_br() -> Self {
        Self {
            required: "O campo é obrigatório".into(),
            invalid: "Formato digitado é inválido".into(),
            string_min: "O campo precisa ter pelo menos {min} caracteres".into(),
            string_max: "O campo pode ter no máximo {max} caracteres".into(),
            email: "O campo precisa conter um email válido".into(),
            number_min: "O campo precisa ter valor mínimo de {min}".into(),
            number_max: "O campo precisa ter valor máximo de {max}".into(),
            integer: "O campo precisa ter um valor inteiro".into(),
            array_min: "O campo deve ter no mínimo {min} itens".into(),
            array_max: "O campo deve ter no máximo {max} itens".into(),
            one_of: "O campo deve ter um dos seguintes valores: {values}".into(),
        }
    }

    /// English messages.
    pub fn en() -> Self {
        Self {
            required: "field is required".into(),
            invalid: "invalid format".into(),
            string_min: "must be at least {min} characters".into(),
            string_max: "must be at most {max} characters".into(),
            email: "must be a valid email address".into(),
            number_min: "must be greater than or equal to {min}".into(),
            number_max: "must be less than or equal to {max}".into(),
            integer: "must be an integer".into(),
            array_min: "must have at least {min} items".into(),
            array_max: "must have at most {max} items".into(),
            one_of: "must be one of: {values}".into(),
        }
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self::pt_br()
    }
}

fn fill(template: &str, key: &str, value: impl fmt::Display) -> String {
    template.replace(&format!("{{{key}}}"), &value.to_string())
}

fn format_limit(limit: f64) -> String {
    if limit.fract() == 0.0 && limit.abs() < 1e15 {
        format!("{}", limit as i64)
    } else {
        limit.to_string()
    }
}

// -----------------------------------------------------------------------------
// Errors
// -----------------------------------------------------------------------------

/// One failed constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Path of the offending value, e.g. `Categorias[0].Codigo`.
    pub path: String,
    /// Human-readable message.
    pub message: String,
}

/// Every violation found by one validation run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} field(s) failed validation", .violations.len())]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

impl ValidationErrors {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns whether there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Iterates over the violations in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter()
    }

    /// Returns true if some violation is reported at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }

    /// Returns the first message reported at `path`.
    pub fn message(&self, path: &str) -> Option<&str> {
        self.violations
            .iter()
            .find(|v| v.path == path)
            .map(|v| v.message.as_str())
    }

    /// Builds the path-keyed error map. When one path failed several
    /// constraints, the first message is kept.
    pub fn error_map(&self) -> ErrorMap {
        let mut map = BTreeMap::new();
        for violation in &self.violations {
            map.entry(violation.path.clone())
                .or_insert_with(|| violation.message.clone());
        }
        map
    }

    /// Consumes the errors into the path-keyed map.
    pub fn into_error_map(self) -> ErrorMap {
        self.error_map()
    }
}

struct Collector<'a> {
    messages: &'a Messages,
    violations: Vec<Violation>,
}

impl Collector<'_> {
    fn push(&mut self, path: &str, message: impl Into<String>) {
        self.violations.push(Violation {
            path: path.to_string(),
            message: message.into(),
        });
    }
}

// -----------------------------------------------------------------------------
// Rule
// -----------------------------------------------------------------------------

type Check = Box<dyn Fn(&Value) -> bool>;
type CrossCheck = Box<dyn Fn(&Map<String, Value>) -> Option<(String, String)>>;

enum Kind {
    Mixed,
    String,
    Number,
    Boolean,
    Date,
    Array(Option<Box<Rule>>),
    Object(Box<Schema>),
}

impl Kind {
    fn name(&self) -> &'static str {
        match self {
            Self::Mixed => "mixed",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }
}

struct Bound {
    limit: f64,
    message: Option<String>,
}

struct CustomTest {
    message: String,
    check: Check,
}

enum Coerced {
    Present(Value),
    Absent,
    Invalid,
}

/// Constraints for one value.
pub struct Rule {
    kind: Kind,
    required: Option<Option<String>>,
    min: Option<Bound>,
    max: Option<Bound>,
    email: Option<Option<String>>,
    integer: Option<Option<String>>,
    one_of: Option<(Vec<Value>, Option<String>)>,
    default: Option<Value>,
    tests: Vec<CustomTest>,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("kind", &self.kind.name())
            .field("required", &self.required.is_some())
            .field("tests", &self.tests.len())
            .finish_non_exhaustive()
    }
}

impl Rule {
    fn of_kind(kind: Kind) -> Self {
        Self {
            kind,
            required: None,
            min: None,
            max: None,
            email: None,
            integer: None,
            one_of: None,
            default: None,
            tests: Vec::new(),
        }
    }

    /// Accepts any value.
    pub fn mixed() -> Self {
        Self::of_kind(Kind::Mixed)
    }

    /// Text. Numbers and booleans are converted to their text form.
    pub fn string() -> Self {
        Self::of_kind(Kind::String)
    }

    /// A number. Numeric text is parsed; empty text counts as missing.
    pub fn number() -> Self {
        Self::of_kind(Kind::Number)
    }

    /// A boolean. Accepts `"true"`/`"false"` text.
    pub fn boolean() -> Self {
        Self::of_kind(Kind::Boolean)
    }

    /// A calendar date, normalized to `YYYY-MM-DD`.
    pub fn date() -> Self {
        Self::of_kind(Kind::Date)
    }

    /// An array whose items all satisfy `of`.
    pub fn array(of: Self) -> Self {
        Self::of_kind(Kind::Array(Some(Box::new(of))))
    }

    /// An array of anything.
    pub fn array_any() -> Self {
        Self::of_kind(Kind::Array(None))
    }

    /// A nested object.
    pub fn object(shape: Schema) -> Self {
        Self::of_kind(Kind::Object(Box::new(shape)))
    }

    /// Marks the value as required. For strings, blank text counts as missing.
    pub fn required(mut self) -> Self {
        self.required = Some(None);
        self
    }

    /// Marks the value as required with a custom message.
    pub fn required_with(mut self, message: impl Into<String>) -> Self {
        self.required = Some(Some(message.into()));
        self
    }

    /// Minimum length (strings, arrays) or value (numbers).
    pub fn min(mut self, limit: impl Into<f64>) -> Self {
        self.min = Some(Bound {
            limit: limit.into(),
            message: None,
        });
        self
    }

    /// Like [`min`](Self::min) with a custom message.
    pub fn min_with(mut self, limit: impl Into<f64>, message: impl Into<String>) -> Self {
        self.min = Some(Bound {
            limit: limit.into(),
            message: Some(message.into()),
        });
        self
    }

    /// Maximum length (strings, arrays) or value (numbers).
    pub fn max(mut self, limit: impl Into<f64>) -> Self {
        self.max = Some(Bound {
            limit: limit.into(),
            message: None,
        });
        self
    }

    /// Like [`max`](Self::max) with a custom message.
    pub fn max_with(mut self, limit: impl Into<f64>, message: impl Into<String>) -> Self {
        self.max = Some(Bound {
            limit: limit.into(),
            message: Some(message.into()),
        });
        self
    }

    /// Requires an e-mail address (strings only).
    pub fn email(mut self) -> Self {
        self.email = Some(None);
        self
    }

    /// Requires a whole number (numbers only).
    pub fn integer(mut self) -> Self {
        self.integer = Some(None);
        self
    }

    /// Restricts the value to `values`.
    pub fn one_of(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.one_of = Some((values.into_iter().collect(), None));
        self
    }

    /// Uses `value` when the input is missing.
    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Adds a custom check on present values.
    pub fn test(
        mut self,
        message: impl Into<String>,
        check: impl Fn(&Value) -> bool + 'static,
    ) -> Self {
        self.tests.push(CustomTest {
            message: message.into(),
            check: Box::new(check),
        });
        self
    }

    fn required_message<'a>(&'a self, messages: &'a Messages) -> Option<&'a str> {
        self.required
            .as_ref()
            .map(|custom| custom.as_deref().unwrap_or(&messages.required))
    }

    fn coerce(&self, raw: &Value) -> Coerced {
        match (&self.kind, raw) {
            (Kind::Mixed, v) => Coerced::Present(v.clone()),

            (Kind::String, Value::String(_)) => Coerced::Present(raw.clone()),
            (Kind::String, Value::Number(n)) => Coerced::Present(Value::String(n.to_string())),
            (Kind::String, Value::Bool(b)) => Coerced::Present(Value::String(b.to_string())),

            (Kind::Number, Value::Number(_)) => Coerced::Present(raw.clone()),
            (Kind::Number, Value::String(s)) => {
                let s = s.trim();
                if s.is_empty() {
                    Coerced::Absent
                } else if let Ok(int) = s.parse::<i64>() {
                    Coerced::Present(Value::from(int))
                } else {
                    s.parse::<f64>()
                        .ok()
                        .and_then(serde_json::Number::from_f64)
                        .map_or(Coerced::Invalid, |n| Coerced::Present(Value::Number(n)))
                }
            }

            (Kind::Boolean, Value::Bool(_)) => Coerced::Present(raw.clone()),
            (Kind::Boolean, Value::String(s)) => match s.trim() {
                "true" => Coerced::Present(Value::Bool(true)),
                "false" => Coerced::Present(Value::Bool(false)),
                "" => Coerced::Absent,
                _ => Coerced::Invalid,
            },

            (Kind::Date, Value::String(s)) if s.trim().is_empty() => Coerced::Absent,
            (Kind::Date, Value::String(s)) => DateKind::parse(s).map_or(Coerced::Invalid, |d| {
                Coerced::Present(Value::String(d.format("%Y-%m-%d").to_string()))
            }),

            (Kind::Array(_), Value::Array(_)) | (Kind::Object(_), Value::Object(_)) => {
                Coerced::Present(raw.clone())
            }

            _ => Coerced::Invalid,
        }
    }

    /// Validates one value at `path`. Returns the coerced value, or `None`
    /// when the value is missing or unusable.
    fn check(&self, path: &str, input: Option<&Value>, cx: &mut Collector<'_>) -> Option<Value> {
        let raw = match input {
            Some(v) if !v.is_null() => Some(v.clone()),
            _ => self.default.clone(),
        };

        let coerced = match raw.as_ref().map(|v| self.coerce(v)) {
            None | Some(Coerced::Absent) => None,
            Some(Coerced::Invalid) => {
                cx.push(path, cx.messages.invalid.clone());
                return None;
            }
            Some(Coerced::Present(v)) => Some(v),
        };

        let blank = matches!(
            (&self.kind, &coerced),
            (Kind::String, Some(Value::String(s))) if s.trim().is_empty()
        );
        let Some(value) = coerced else {
            if let Some(message) = self.required_message(cx.messages) {
                cx.push(path, message);
            }
            return None;
        };
        if blank {
            if let Some(message) = self.required_message(cx.messages) {
                cx.push(path, message);
                return Some(value);
            }
        }

        let value = match &self.kind {
            Kind::Array(of) => self.check_items(path, value, of.as_deref(), cx),
            Kind::Object(shape) => match value {
                Value::Object(map) => Value::Object(shape.check_object(path, &map, cx)),
                other => other,
            },
            _ => value,
        };

        self.check_bounds(path, &value, cx);

        if let (Some(custom), Some(s)) = (&self.email, value.as_str()) {
            if !is_email(s) {
                cx.push(path, custom.as_deref().unwrap_or(&cx.messages.email).to_string());
            }
        }

        if let (Some(custom), Some(n)) = (&self.integer, value.as_f64()) {
            if n.fract() != 0.0 {
                cx.push(path, custom.as_deref().unwrap_or(&cx.messages.integer).to_string());
            }
        }

        if let Some((allowed, custom)) = self.one_of.as_ref().filter(|(a, _)| !a.contains(&value)) {
            let message = custom.clone().unwrap_or_else(|| {
                let list: Vec<String> = allowed.iter().map(Value::to_string).collect();
                fill(&cx.messages.one_of, "values", list.join(", "))
            });
            cx.push(path, message);
        }

        for test in &self.tests {
            if !(test.check)(&value) {
                cx.push(path, test.message.clone());
            }
        }

        Some(value)
    }

    fn check_items(
        &self,
        path: &str,
        value: Value,
        of: Option<&Rule>,
        cx: &mut Collector<'_>,
    ) -> Value {
        let (Value::Array(items), Some(of)) = (&value, of) else {
            return value;
        };
        let checked = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                of.check(&join_index(path, i), Some(item), cx)
                    .unwrap_or(Value::Null)
            })
            .collect();
        Value::Array(checked)
    }

    fn check_bounds(&self, path: &str, value: &Value, cx: &mut Collector<'_>) {
        let (measure, min_template, max_template) = match (&self.kind, value) {
            (Kind::String, Value::String(s)) => (
                s.chars().count() as f64,
                &cx.messages.string_min,
                &cx.messages.string_max,
            ),
            (Kind::Number, Value::Number(n)) => (
                n.as_f64().unwrap_or_default(),
                &cx.messages.number_min,
                &cx.messages.number_max,
            ),
            (Kind::Array(_), Value::Array(items)) => (
                items.len() as f64,
                &cx.messages.array_min,
                &cx.messages.array_max,
            ),
            _ => return,
        };

        let mut found = Vec::new();
        if let Some(min) = self.min.as_ref().filter(|b| measure < b.limit) {
            found.push(min.message.clone().unwrap_or_else(|| {
                fill(min_template, "min", format_limit(min.limit))
            }));
        }
        if let Some(max) = self.max.as_ref().filter(|b| measure > b.limit) {
            found.push(max.message.clone().unwrap_or_else(|| {
                fill(max_template, "max", format_limit(max.limit))
            }));
        }
        for message in found {
            cx.push(path, message);
        }
    }
}

fn is_email(s: &str) -> bool {
    let mut parts = s.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

// -----------------------------------------------------------------------------
// Schema
// -----------------------------------------------------------------------------

/// An object shape: named rules plus cross-field checks.
#[derive(Default)]
pub struct Schema {
    fields: Vec<(String, Rule)>,
    cross: Vec<CrossCheck>,
    messages: Messages,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("fields", &self.fields)
            .field("cross", &self.cross.len())
            .finish_non_exhaustive()
    }
}

impl Schema {
    /// Creates an empty object schema with Portuguese messages.
    pub fn object() -> Self {
        Self::default()
    }

    /// Adds a rule for key `name`. A later rule for the same key replaces
    /// the earlier one.
    pub fn field(mut self, name: impl Into<String>, rule: Rule) -> Self {
        let name = name.into();
        self.fields.retain(|(existing, _)| *existing != name);
        self.fields.push((name, rule));
        self
    }

    /// Adds a cross-field check. It runs on the coerced object and returns
    /// `(relative path, message)` on failure.
    pub fn cross(
        mut self,
        check: impl Fn(&Map<String, Value>) -> Option<(String, String)> + 'static,
    ) -> Self {
        self.cross.push(Box::new(check));
        self
    }

    /// Replaces the default messages.
    pub fn messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    /// Returns the keys this schema owns.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Validates `data`, evaluating every constraint.
    ///
    /// On success returns the coerced object. Keys the schema does not own
    /// are passed through unchanged. On failure returns every violation.
    pub fn validate(&self, data: &Value) -> Result<Value, ValidationErrors> {
        let mut cx = Collector {
            messages: &self.messages,
            violations: Vec::new(),
        };

        let empty = Map::new();
        let map = match data {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => {
                cx.push("", self.messages.invalid.clone());
                return Err(ValidationErrors {
                    violations: cx.violations,
                });
            }
        };

        let output = self.check_object("", map, &mut cx);
        if cx.violations.is_empty() {
            Ok(Value::Object(output))
        } else {
            debug!(violations = cx.violations.len(), "validation failed");
            Err(ValidationErrors {
                violations: cx.violations,
            })
        }
    }

    fn check_object(
        &self,
        prefix: &str,
        input: &Map<String, Value>,
        cx: &mut Collector<'_>,
    ) -> Map<String, Value> {
        let mut output = input.clone();
        for (name, rule) in &self.fields {
            let path = join_key(prefix, name);
            match rule.check(&path, input.get(name), cx) {
                Some(value) => {
                    output.insert(name.clone(), value);
                }
                None if input.contains_key(name) => {
                    output.insert(name.clone(), Value::Null);
                }
                None => {}
            }
        }
        for check in &self.cross {
            if let Some((path, message)) = check(&output) {
                cx.push(&join_key(prefix, &path), message);
            }
        }
        output
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
