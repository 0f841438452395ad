//! End-to-end detail screen scenarios against the in-memory service.

use std::collections::BTreeSet;
use std::sync::Arc;

use cadastro::{
    Categoria, DeleteOutcome, DetailPage, Entities, Entity, History, Item, Items, MemoryService,
    RecordId, Scripted, SubmitOutcome,
};
use vform::Field;

fn acme() -> Entity {
    Entity {
        id: None,
        nome: "Acme".into(),
        codigo_regiao: "SP".into(),
        caracteristica_imovel: Some(3.0),
        categorias: vec![Categoria {
            operacao: "Venda".into(),
            codigo: "01".into(),
        }],
    }
}

mod validation {
    use super::*;

    #[tokio::test]
    async fn rejected_form_reports_every_error_and_skips_create() {
        let service = Arc::new(MemoryService::<Entity>::new());
        let history = History::new();
        let dialogs = Scripted::answering(true);
        let mut page = DetailPage::new(Entities, Arc::clone(&service), &history, &dialogs);
        page.open("nova").await.unwrap();

        page.fields().nome.input("Acme".into());
        page.fields().caracteristica_imovel.input("3".into());
        assert!(page.fields_mut().remove_row(0));

        let outcome = page.save().await;

        let SubmitOutcome::Invalid(errors) = outcome else {
            panic!("expected validation failure, got {outcome:?}");
        };
        let keys: BTreeSet<String> = errors.error_map().into_keys().collect();
        assert_eq!(
            keys,
            ["CodigoRegiao", "Categorias"]
                .into_iter()
                .map(String::from)
                .collect()
        );
        assert_eq!(service.calls(), 0);
        assert!(history.is_empty());

        assert_eq!(
            page.fields().codigo_regiao.error().as_deref(),
            Some("Código da região é obrigatório.")
        );
        assert_eq!(
            page.form().form().unmatched_errors().get("Categorias").map(String::as_str),
            Some("Deve haver pelo menos uma categoria.")
        );
    }

    #[tokio::test]
    async fn row_errors_land_on_row_fields() {
        let service = Arc::new(MemoryService::<Entity>::new());
        let history = History::new();
        let dialogs = Scripted::answering(true);
        let mut page = DetailPage::new(Entities, Arc::clone(&service), &history, &dialogs);
        page.open("nova").await.unwrap();

        let fields = page.fields();
        fields.nome.input("Acme".into());
        fields.codigo_regiao.input("SP".into());
        fields.caracteristica_imovel.input("3".into());
        fields.rows()[0].operacao.input("Venda".into());

        assert!(matches!(page.save().await, SubmitOutcome::Invalid(_)));
        assert_eq!(
            page.fields().rows()[0].codigo.error().as_deref(),
            Some("Código é obrigatório.")
        );

        page.fields().rows()[0].codigo.input("01".into());
        assert!(page.fields().rows()[0].codigo.error().is_none());
        assert!(matches!(page.save().await, SubmitOutcome::Created(1)));
    }
}

mod persistence {
    use super::*;

    #[tokio::test]
    async fn save_on_new_record_navigates_to_created_detail() {
        let service = Arc::new(MemoryService::<Entity>::new().next_id(42));
        let history = History::new();
        let dialogs = Scripted::answering(true);
        let mut page = DetailPage::new(Entities, Arc::clone(&service), &history, &dialogs);
        page.open("nova").await.unwrap();
        assert_eq!(page.title(), "Nova Entidade Prospect");

        page.form().form().set_data(&serde_json::to_value(acme()).unwrap());
        let outcome = page.save().await;

        assert!(matches!(outcome, SubmitOutcome::Created(42)));
        assert_eq!(history.entries(), vec!["/pessoas/detalhe/42".to_string()]);
        assert_eq!(page.record_id(), RecordId::Existing(42));
        assert_eq!(page.title(), "Acme");
        assert!(!page.is_busy());

        let stored = service.record(42).unwrap();
        assert_eq!(stored.categorias, acme().categorias);
        assert_eq!(stored.caracteristica_imovel, Some(3.0));
    }

    #[tokio::test]
    async fn save_and_close_navigates_away_exactly_once() {
        let service = Arc::new(MemoryService::<Entity>::new());
        let history = History::new();
        let dialogs = Scripted::answering(true);
        let mut page = DetailPage::new(Entities, Arc::clone(&service), &history, &dialogs);
        page.open("nova").await.unwrap();
        page.form().form().set_data(&serde_json::to_value(acme()).unwrap());

        assert!(page.save_and_close().await.is_saved());
        assert_eq!(history.entries(), vec!["/pessoas".to_string()]);
    }

    #[tokio::test]
    async fn save_on_existing_record_stays() {
        let service = Arc::new(MemoryService::new().with_records([Item {
            nome: "Parafuso".into(),
            cod: "P1".into(),
            ..Item::default()
        }]));
        let history = History::new();
        let dialogs = Scripted::answering(true);
        let mut page = DetailPage::new(Items, Arc::clone(&service), &history, &dialogs);
        page.open("1").await.unwrap();
        assert_eq!(page.fields().nome.local(), "Parafuso");
        assert!(page.shows_record_actions());

        page.fields().nome.input("Parafuso sextavado".into());
        assert!(matches!(page.save().await, SubmitOutcome::Updated));
        assert!(history.is_empty());
        assert_eq!(service.record(1).unwrap().nome, "Parafuso sextavado");

        assert!(matches!(page.save_and_close().await, SubmitOutcome::Updated));
        assert_eq!(history.entries(), vec!["/items".to_string()]);
    }

    #[tokio::test]
    async fn service_failure_alerts_and_keeps_form() {
        let service = Arc::new(MemoryService::<Entity>::new());
        let history = History::new();
        let dialogs = Scripted::answering(true);
        let mut page = DetailPage::new(Entities, Arc::clone(&service), &history, &dialogs);
        page.open("nova").await.unwrap();
        page.form().form().set_data(&serde_json::to_value(acme()).unwrap());

        service.fail_with(Some(""));
        let outcome = page.save().await;

        assert!(matches!(outcome, SubmitOutcome::Failed(_)));
        assert_eq!(dialogs.alerts(), vec!["Erro ao criar o registro.".to_string()]);
        assert!(history.is_empty());
        assert_eq!(page.fields().nome.local(), "Acme");
        assert_eq!(page.record_id(), RecordId::New);
        assert!(!page.is_busy());
    }

    #[tokio::test]
    async fn loading_a_missing_record_returns_to_list() {
        let service = Arc::new(MemoryService::<Entity>::new());
        let history = History::new();
        let dialogs = Scripted::answering(true);
        let mut page = DetailPage::new(Entities, Arc::clone(&service), &history, &dialogs);

        assert!(page.open("9").await.is_err());
        assert_eq!(dialogs.alerts(), vec!["Registro não encontrado.".to_string()]);
        assert_eq!(history.current().as_deref(), Some("/pessoas"));
    }

    #[tokio::test]
    async fn loading_mounts_one_row_per_category() {
        let mut entity = acme();
        entity.categorias.push(Categoria {
            operacao: "Locação".into(),
            codigo: "02".into(),
        });
        let service = Arc::new(MemoryService::new().with_records([entity]));
        let history = History::new();
        let dialogs = Scripted::answering(true);
        let mut page = DetailPage::new(Entities, Arc::clone(&service), &history, &dialogs);

        page.open("1").await.unwrap();

        assert_eq!(page.title(), "Acme");
        assert_eq!(page.fields().rows().len(), 2);
        assert_eq!(page.fields().rows()[1].operacao.local(), "Locação");
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn confirmed_delete_removes_record_and_returns_to_list() {
        let service = Arc::new(MemoryService::new().with_records([acme()]));
        let history = History::new();
        let dialogs = Scripted::answering(true);
        let mut page = DetailPage::new(Entities, Arc::clone(&service), &history, &dialogs);
        page.open("1").await.unwrap();
        let calls_before = service.calls();

        assert!(matches!(page.delete().await, DeleteOutcome::Deleted));

        assert_eq!(service.calls(), calls_before + 1);
        assert!(service.is_empty());
        assert_eq!(dialogs.confirms(), vec!["Realmente deseja apagar?".to_string()]);
        assert_eq!(dialogs.alerts(), vec!["Registro apagado com sucesso!".to_string()]);
        assert_eq!(history.current().as_deref(), Some("/pessoas"));
    }

    #[tokio::test]
    async fn declined_delete_calls_nothing() {
        let service = Arc::new(MemoryService::new().with_records([acme()]));
        let history = History::new();
        let dialogs = Scripted::answering(false);
        let mut page = DetailPage::new(Entities, Arc::clone(&service), &history, &dialogs);
        page.open("1").await.unwrap();
        let calls_before = service.calls();

        assert!(matches!(page.delete().await, DeleteOutcome::Declined));

        assert_eq!(service.calls(), calls_before);
        assert_eq!(service.len(), 1);
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn unsaved_record_cannot_be_deleted() {
        let service = Arc::new(MemoryService::<Entity>::new());
        let history = History::new();
        let dialogs = Scripted::answering(true);
        let mut page = DetailPage::new(Entities, Arc::clone(&service), &history, &dialogs);
        page.open("nova").await.unwrap();

        assert!(matches!(page.delete().await, DeleteOutcome::Unsaved));
        assert!(dialogs.confirms().is_empty());
        assert!(!page.shows_record_actions());
    }

    #[tokio::test]
    async fn toolbar_navigation() {
        let service = Arc::new(MemoryService::<Item>::new());
        let history = History::new();
        let dialogs = Scripted::answering(true);
        let page = DetailPage::new(Items, Arc::clone(&service), &history, &dialogs);

        page.new_record();
        page.back();
        assert_eq!(
            history.entries(),
            vec!["/items/detail/nova".to_string(), "/items".to_string()]
        );
    }
}
