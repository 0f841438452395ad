#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]

//! Property-based tests for the form registry, field mounting and schema
//! validation.

use std::collections::BTreeSet;

use proptest::prelude::*;
use serde_json::{Map, Value, json};
use vform::{FieldPath, FormContainer, Rule, Schema, TextField};

const NAMES: [&str; 5] = ["Nome", "CodigoRegiao", "brand", "model", "cod"];

#[derive(Debug, Clone)]
enum Op {
    Mount(usize),
    Unmount(usize),
    Edit(usize, String),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..NAMES.len()).prop_map(Op::Mount),
        (0..NAMES.len()).prop_map(Op::Unmount),
        (0..NAMES.len(), "[a-z]{0,8}").prop_map(|(i, s)| Op::Edit(i, s)),
    ]
}

fn data() -> impl Strategy<Value = Map<String, Value>> {
    proptest::collection::btree_map(
        proptest::sample::select(NAMES.to_vec()).prop_map(str::to_string),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
        0..NAMES.len(),
    )
    .prop_map(|m| m.into_iter().collect())
}

// =============================================================================
// Registry properties
// =============================================================================

proptest! {
    #[test]
    fn snapshot_matches_mounted_fields_and_their_last_edit(ops in proptest::collection::vec(op(), 0..40)) {
        let form = FormContainer::new();
        let mut mounted: Vec<Option<TextField>> = (0..NAMES.len()).map(|_| None).collect();
        let mut last_edit: Vec<String> = vec![String::new(); NAMES.len()];

        for op in ops {
            match op {
                Op::Mount(i) => {
                    mounted[i] = Some(TextField::mount(form.context(), NAMES[i]));
                    last_edit[i] = String::new();
                }
                Op::Unmount(i) => mounted[i] = None,
                Op::Edit(i, text) => {
                    if let Some(field) = &mounted[i] {
                        field.input(text.clone());
                        last_edit[i] = text;
                    }
                }
            }
        }

        let expected: BTreeSet<&str> = NAMES
            .iter()
            .zip(&mounted)
            .filter(|(_, f)| f.is_some())
            .map(|(n, _)| *n)
            .collect();
        let snapshot = form.get_data();
        let actual: BTreeSet<&str> = snapshot.names().collect();
        prop_assert_eq!(actual, expected);

        for (i, field) in mounted.iter().enumerate() {
            if field.is_some() {
                prop_assert_eq!(snapshot.get(NAMES[i]), Some(&json!(last_edit[i])));
            }
        }
    }

    #[test]
    fn set_data_is_idempotent(d in data(), mounted in proptest::sample::subsequence(NAMES.to_vec(), 0..=NAMES.len())) {
        let form = FormContainer::new();
        let _fields: Vec<_> = mounted.iter().map(|n| TextField::mount(form.context(), *n)).collect();
        let d = Value::Object(d);

        form.set_data(&d);
        let once = form.get_data();
        form.set_data(&d);
        prop_assert_eq!(form.get_data(), once);
    }

    #[test]
    fn set_then_get_round_trips_mounted_keys(d in data(), mounted in proptest::sample::subsequence(NAMES.to_vec(), 0..=NAMES.len())) {
        let form = FormContainer::new();
        let _fields: Vec<_> = mounted.iter().map(|n| TextField::mount(form.context(), *n)).collect();

        form.set_data(&Value::Object(d.clone()));
        let snapshot = form.get_data();

        for name in &mounted {
            if let Some(expected) = d.get(*name) {
                prop_assert_eq!(snapshot.get(name), Some(expected));
            }
        }
    }

    #[test]
    fn later_registration_survives_earlier_drop(n in 1usize..6) {
        let form = FormContainer::new();
        let mut fields: Vec<TextField> = (0..n)
            .map(|i| TextField::mount(form.context(), "Nome").with_value(format!("v{i}")))
            .collect();
        let last = fields.pop();
        drop(fields);

        prop_assert_eq!(form.get_field_value("Nome"), Some(json!(format!("v{}", n - 1))));
        drop(last);
        prop_assert_eq!(form.get_field_value("Nome"), None);
    }

    #[test]
    fn indexed_paths_round_trip(base in "[A-Za-z]{1,10}", index in 0usize..100, sub in "[A-Za-z]{1,10}") {
        let path = FieldPath::indexed(base, index, sub);
        prop_assert_eq!(FieldPath::parse(&path.canonical()).unwrap(), path);
    }
}

// =============================================================================
// Validation properties
// =============================================================================

proptest! {
    #[test]
    fn every_missing_required_field_is_reported(present in proptest::sample::subsequence(NAMES.to_vec(), 0..=NAMES.len())) {
        let schema = NAMES
            .iter()
            .fold(Schema::object(), |s, n| s.field(*n, Rule::string().required()));
        let input: Map<String, Value> = present
            .iter()
            .map(|n| (n.to_string(), json!("x")))
            .collect();

        match schema.validate(&Value::Object(input)) {
            Ok(_) => prop_assert_eq!(present.len(), NAMES.len()),
            Err(errors) => {
                let reported: BTreeSet<String> = errors.error_map().into_keys().collect();
                let missing: BTreeSet<String> = NAMES
                    .iter()
                    .filter(|n| !present.contains(n))
                    .map(|n| n.to_string())
                    .collect();
                prop_assert_eq!(reported, missing);
            }
        }
    }

    #[test]
    fn numeric_text_coerces_to_numbers(n in -100_000i64..100_000) {
        let schema = Schema::object().field("qtd", Rule::number().required());
        let valid = schema.validate(&json!({ "qtd": n.to_string() })).unwrap();
        prop_assert_eq!(&valid["qtd"], &json!(n));
    }
}
