use vform::{FormContext, Rule, Schema, TextField};

use super::EntityKind;
use crate::navigation::Routes;
use crate::records::Item;

/// Products and service items.
#[derive(Debug, Clone, Copy, Default)]
pub struct Items;

/// Fields of the item screen.
#[derive(Debug)]
pub struct ItemFields {
    pub cod: TextField,
    pub nome: TextField,
    pub brand: TextField,
    pub model: TextField,
    pub product_price: TextField,
    pub product_cost: TextField,
}

impl EntityKind for Items {
    type Record = Item;
    type Fields = ItemFields;

    const ROUTES: Routes = Routes::new("/items", "/items/detail");
    const NEW_TITLE: &'static str = "Novo item/produto";

    fn schema() -> Schema {
        Schema::object()
            .field("nome", Rule::string().required().min(3))
            .field("cod", Rule::string().required())
            .field("brand", Rule::string())
            .field("model", Rule::string())
            .field("product_price", Rule::string())
            .field("product_cost", Rule::string())
    }

    fn mount(ctx: &FormContext) -> ItemFields {
        ItemFields {
            cod: TextField::mount(ctx, "cod").label("Código"),
            nome: TextField::mount(ctx, "nome").label("Nome do item/produto"),
            brand: TextField::mount(ctx, "brand").label("Marca"),
            model: TextField::mount(ctx, "model").label("Modelo"),
            product_price: TextField::mount(ctx, "product_price").label("Valor de venda"),
            product_cost: TextField::mount(ctx, "product_cost").label("Valor de custo"),
        }
    }

    fn title(record: &Item) -> String {
        record.nome.clone()
    }
}
