//! Records exchanged with the REST API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::services::Record;

// -----------------------------------------------------------------------------
// Entities
// -----------------------------------------------------------------------------

/// One operation/code pair of an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Categoria {
    #[serde(default)]
    pub operacao: String,
    #[serde(default)]
    pub codigo: String,
}

/// A customer or prospect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Entity {
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub codigo_regiao: String,
    #[serde(default)]
    pub caracteristica_imovel: Option<f64>,
    #[serde(default)]
    pub categorias: Vec<Categoria>,
}

impl Record for Entity {
    const RESOURCE: &'static str = "pessoas";
    const FILTER_PARAM: &'static str = "Nome_like";

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    fn label(&self) -> String {
        self.nome.clone()
    }
}

// -----------------------------------------------------------------------------
// Items
// -----------------------------------------------------------------------------

/// A product or service item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub cod: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_cost: Option<String>,
}

impl Record for Item {
    const RESOURCE: &'static str = "items";
    const FILTER_PARAM: &'static str = "nome_like";

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    fn label(&self) -> String {
        if self.cod.is_empty() {
            self.nome.clone()
        } else {
            format!("{} - {}", self.cod, self.nome)
        }
    }
}

// -----------------------------------------------------------------------------
// Transactions
// -----------------------------------------------------------------------------

/// A pre-estimate as shown in the listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub cod: String,
    pub date: String,
    pub created_at: String,
    pub receiving_date: String,
    pub customer_first_name: String,
    pub customer_middle_name: String,
    pub customer_last_name: String,
    pub total_service_charge: f64,
    pub situation: String,
}

impl TransactionSummary {
    /// Returns the customer's full name.
    pub fn customer_name(&self) -> String {
        [
            &self.customer_first_name,
            &self.customer_middle_name,
            &self.customer_last_name,
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .map(|part| part.as_str())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

impl Record for TransactionSummary {
    const RESOURCE: &'static str = "transactions";
    const FILTER_PARAM: &'static str = "customerfistnamelike";

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    fn label(&self) -> String {
        format!("{} {} ({})", self.cod, self.customer_name(), self.situation)
    }

    fn matches(&self, filter: &str) -> bool {
        filter.is_empty()
            || self
                .customer_first_name
                .to_lowercase()
                .contains(&filter.to_lowercase())
    }
}

/// A pre-estimate work order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkOrder {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub status: String,
    pub date: Option<NaiveDate>,
    pub receiving_date: Option<NaiveDate>,
    pub customer: String,
    pub phone: String,
    pub product: String,
    pub brand: String,
    pub model: String,
    pub customer_description: String,
    pub technical_report: String,
    pub defect_description: String,
    pub amount: Option<f64>,
}

impl Record for WorkOrder {
    const RESOURCE: &'static str = "workorder";
    const FILTER_PARAM: &'static str = "customer_like";

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    fn label(&self) -> String {
        format!("{} - {}", self.customer, self.product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entity_uses_pascal_case_keys() {
        let entity = Entity {
            id: Some(3),
            nome: "Acme".into(),
            codigo_regiao: "SP".into(),
            caracteristica_imovel: Some(2.0),
            categorias: vec![Categoria {
                operacao: "Venda".into(),
                codigo: "01".into(),
            }],
        };
        assert_eq!(
            serde_json::to_value(&entity).unwrap(),
            json!({
                "id": 3,
                "Nome": "Acme",
                "CodigoRegiao": "SP",
                "CaracteristicaImovel": 2.0,
                "Categorias": [{ "Operacao": "Venda", "Codigo": "01" }]
            })
        );
    }

    #[test]
    fn new_records_omit_id() {
        let value = serde_json::to_value(Item::default()).unwrap();
        assert!(value.get("id").is_none());
    }

    #[test]
    fn work_order_dates_are_iso() {
        let order: WorkOrder = serde_json::from_value(json!({
            "id": 1,
            "date": "2024-03-01",
            "defect_description": "não liga"
        }))
        .unwrap();
        assert_eq!(order.date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(order.receiving_date, None);
    }

    #[test]
    fn summary_filter_matches_first_name() {
        let row = TransactionSummary {
            customer_first_name: "Maria".into(),
            customer_last_name: "Silva".into(),
            ..Default::default()
        };
        assert!(row.matches("mar"));
        assert!(!row.matches("silva"));
        assert_eq!(row.customer_name(), "Maria Silva");
    }
}
