//! Screen definitions.
//!
//! Each screen is a marker type implementing [`EntityKind`]: its routes,
//! schema, blank record and the fields it mounts. The generic
//! [`DetailController`](crate::DetailController) drives all of them.

mod entities;
mod items;
mod work_orders;

pub use entities::{CategoriaRow, Entities, EntityFields};
pub use items::{ItemFields, Items};
pub use work_orders::{WorkOrderFields, WorkOrders};

use serde_json::{Map, Value};
use vform::{FormContext, Schema};

use crate::navigation::Routes;
use crate::services::Record;

/// One detail screen.
pub trait EntityKind: 'static {
    /// Record edited on the screen.
    type Record: Record;

    /// Mounted fields. Dropping them unmounts them.
    type Fields;

    /// List and detail routes.
    const ROUTES: Routes;

    /// Title shown while creating a record.
    const NEW_TITLE: &'static str;

    /// Builds the validation schema.
    fn schema() -> Schema;

    /// Values a new record starts with.
    fn blank() -> Value {
        Value::Object(Map::new())
    }

    /// Mounts the screen's fields.
    fn mount(ctx: &FormContext) -> Self::Fields;

    /// Adjusts dynamic fields (rows) to `data` before it is loaded.
    fn prepare(_fields: &mut Self::Fields, _data: &Value) {}

    /// Values the screen keeps outside its registered fields, merged over
    /// the snapshot before validation.
    fn extras(_fields: &Self::Fields) -> Map<String, Value> {
        Map::new()
    }

    /// Title shown for a saved record.
    fn title(record: &Self::Record) -> String {
        record.label()
    }
}
