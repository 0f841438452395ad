use vform::{DateField, FormContext, NumberField, Rule, Schema, TextField};

use super::EntityKind;
use crate::navigation::Routes;
use crate::records::WorkOrder;

/// Pre-estimate work orders.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkOrders;

/// Fields of the pre-estimate screen.
#[derive(Debug)]
pub struct WorkOrderFields {
    pub status: TextField,
    pub date: DateField,
    pub receiving_date: DateField,
    pub customer: TextField,
    pub phone: TextField,
    pub product: TextField,
    pub brand: TextField,
    pub model: TextField,
    pub customer_description: TextField,
    pub technical_report: TextField,
    pub defect_description: TextField,
    pub amount: NumberField,
}

impl EntityKind for WorkOrders {
    type Record = WorkOrder;
    type Fields = WorkOrderFields;

    const ROUTES: Routes = Routes::new("/pre-orcamento", "/pre-orcamento/detalhes");
    const NEW_TITLE: &'static str = "Novo Pré-orçamento";

    fn schema() -> Schema {
        Schema::object()
            .field("defect_description", Rule::string().required())
            .field("date", Rule::date())
            .field("receiving_date", Rule::date())
            .field("amount", Rule::number().min(0))
            .cross(|order| {
                let date = order.get("date")?.as_str()?;
                let receiving = order.get("receiving_date")?.as_str()?;
                // ISO dates compare correctly as text.
                (receiving < date).then(|| {
                    (
                        "receiving_date".to_string(),
                        "A previsão de chegada não pode ser anterior à data da transação."
                            .to_string(),
                    )
                })
            })
    }

    fn mount(ctx: &FormContext) -> WorkOrderFields {
        WorkOrderFields {
            status: TextField::mount(ctx, "status").label("Status"),
            date: DateField::mount(ctx, "date").label("Data Transação"),
            receiving_date: DateField::mount(ctx, "receiving_date").label("Previsão de chegada"),
            customer: TextField::mount(ctx, "customer").label("Cliente"),
            phone: TextField::mount(ctx, "phone").label("Telefone"),
            product: TextField::mount(ctx, "product").label("Produto"),
            brand: TextField::mount(ctx, "brand").label("Marca"),
            model: TextField::mount(ctx, "model").label("Modelo + chassis"),
            customer_description: TextField::mount(ctx, "customer_description")
                .label("Descrição do cliente"),
            technical_report: TextField::mount(ctx, "technical_report").label("Laudo Técnico"),
            defect_description: TextField::mount(ctx, "defect_description")
                .label("Descrição do defeito"),
            amount: NumberField::mount(ctx, "amount").label("Valor"),
        }
    }
}
