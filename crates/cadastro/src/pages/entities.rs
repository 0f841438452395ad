use serde_json::{Map, Value};
use tracing::trace;
use vform::{Field, FieldPath, FormContext, NumberField, Rule, Schema, TextField};

use super::EntityKind;
use crate::navigation::Routes;
use crate::records::Entity;

const CATEGORIAS: &str = "Categorias";

/// Customers and prospects.
#[derive(Debug, Clone, Copy, Default)]
pub struct Entities;

/// One mounted category row.
#[derive(Debug)]
pub struct CategoriaRow {
    pub operacao: TextField,
    pub codigo: TextField,
}

impl CategoriaRow {
    fn mount(ctx: &FormContext, index: usize, operacao: String, codigo: String) -> Self {
        Self {
            operacao: TextField::mount(ctx, FieldPath::indexed(CATEGORIAS, index, "Operacao"))
                .label("Operação")
                .with_value(operacao),
            codigo: TextField::mount(ctx, FieldPath::indexed(CATEGORIAS, index, "Codigo"))
                .label("Código")
                .with_value(codigo),
        }
    }

    fn values(&self) -> (String, String) {
        (self.operacao.local(), self.codigo.local())
    }
}

/// Fields of the entity screen.
#[derive(Debug)]
pub struct EntityFields {
    ctx: FormContext,
    pub nome: TextField,
    pub codigo_regiao: TextField,
    pub caracteristica_imovel: NumberField,
    categorias: Vec<CategoriaRow>,
}

impl EntityFields {
    /// Returns the mounted category rows.
    pub fn rows(&self) -> &[CategoriaRow] {
        &self.categorias
    }

    /// Returns one category row.
    pub fn row(&self, index: usize) -> Option<&CategoriaRow> {
        self.categorias.get(index)
    }

    /// Appends an empty category row.
    pub fn add_row(&mut self) {
        let index = self.categorias.len();
        self.categorias
            .push(CategoriaRow::mount(&self.ctx, index, String::new(), String::new()));
        trace!(rows = self.categorias.len(), "category row added");
    }

    /// Removes the row at `index`. Later rows move up one index and are
    /// remounted under their new names, keeping their values.
    pub fn remove_row(&mut self, index: usize) -> bool {
        if index >= self.categorias.len() {
            return false;
        }
        let kept: Vec<(String, String)> = self
            .categorias
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, row)| row.values())
            .collect();
        self.remount(kept);
        trace!(rows = self.categorias.len(), index, "category row removed");
        true
    }

    /// Remounts exactly `count` empty rows.
    pub fn set_row_count(&mut self, count: usize) {
        self.remount(vec![(String::new(), String::new()); count]);
    }

    fn remount(&mut self, values: Vec<(String, String)>) {
        self.categorias.clear();
        let stale: Vec<String> = self.ctx.registry().errors_within(CATEGORIAS).into_keys().collect();
        for path in stale {
            self.ctx.clear_field_error(&path);
        }
        self.categorias = values
            .into_iter()
            .enumerate()
            .map(|(i, (operacao, codigo))| CategoriaRow::mount(&self.ctx, i, operacao, codigo))
            .collect();
    }
}

impl EntityKind for Entities {
    type Record = Entity;
    type Fields = EntityFields;

    const ROUTES: Routes = Routes::new("/pessoas", "/pessoas/detalhe");
    const NEW_TITLE: &'static str = "Nova Entidade Prospect";

    fn schema() -> Schema {
        Schema::object()
            .field("Nome", Rule::string().required_with("Nome é obrigatório."))
            .field(
                "CodigoRegiao",
                Rule::string().required_with("Código da região é obrigatório."),
            )
            .field(
                "CaracteristicaImovel",
                Rule::number().required_with("Características do imóvel são obrigatórias."),
            )
            .field(
                CATEGORIAS,
                Rule::array(Rule::object(
                    Schema::object()
                        .field("Operacao", Rule::string().required_with("Operação é obrigatória."))
                        .field("Codigo", Rule::string().required_with("Código é obrigatório.")),
                ))
                .required()
                .min_with(1, "Deve haver pelo menos uma categoria.")
                .default(Value::Array(Vec::new())),
            )
    }

    fn blank() -> Value {
        serde_json::json!({
            "Nome": "",
            "CodigoRegiao": "",
            "CaracteristicaImovel": null,
            "Categorias": [{ "Operacao": "", "Codigo": "" }],
        })
    }

    fn mount(ctx: &FormContext) -> EntityFields {
        let mut fields = EntityFields {
            ctx: ctx.clone(),
            nome: TextField::mount(ctx, "Nome").label("Nome"),
            codigo_regiao: TextField::mount(ctx, "CodigoRegiao").label("Código da Região"),
            caracteristica_imovel: NumberField::mount(ctx, "CaracteristicaImovel")
                .label("Característica do Imóvel"),
            categorias: Vec::new(),
        };
        fields.add_row();
        fields
    }

    fn prepare(fields: &mut EntityFields, data: &Value) {
        let rows = data.get(CATEGORIAS).and_then(Value::as_array).map_or(1, Vec::len);
        fields.set_row_count(rows);
    }

    fn extras(fields: &EntityFields) -> Map<String, Value> {
        let mut extras = Map::new();
        if fields.categorias.is_empty() {
            extras.insert(CATEGORIAS.to_string(), Value::Array(Vec::new()));
        }
        extras
    }

    fn title(record: &Entity) -> String {
        record.nome.clone()
    }
}
