//! Listing screen behavior over the in-memory service.

use std::sync::Arc;

use cadastro::{DeleteOutcome, Item, ListController, MemoryService, Scripted};

fn items(count: usize) -> Vec<Item> {
    (1..=count)
        .map(|n| Item {
            nome: format!("Item {n}"),
            cod: format!("C{n}"),
            ..Item::default()
        })
        .collect()
}

fn service(count: usize) -> Arc<MemoryService<Item>> {
    Arc::new(MemoryService::new().page_limit(2).with_records(items(count)))
}

#[tokio::test]
async fn loads_pages_and_counts() {
    let dialogs = Scripted::answering(true);
    let mut list = ListController::new(service(5), &dialogs, 2);

    list.load(1, "").await.unwrap();
    assert_eq!(list.rows().len(), 2);
    assert_eq!(list.total_count(), 5);
    assert_eq!(list.page_count(), 3);

    list.load(3, "").await.unwrap();
    assert_eq!(list.page(), 3);
    assert_eq!(list.rows()[0].nome, "Item 5");
}

#[tokio::test]
async fn filter_narrows_rows() {
    let dialogs = Scripted::answering(true);
    let store = Arc::new(MemoryService::new().with_records([
        Item {
            nome: "Parafuso".into(),
            ..Item::default()
        },
        Item {
            nome: "Porca".into(),
            ..Item::default()
        },
    ]));
    let mut list = ListController::new(store, &dialogs, 10);

    list.load(1, "paraf").await.unwrap();
    assert_eq!(list.filter(), "paraf");
    assert_eq!(list.total_count(), 1);
    assert_eq!(list.rows()[0].nome, "Parafuso");
}

#[tokio::test]
async fn failed_load_alerts_and_keeps_rows() {
    let dialogs = Scripted::answering(true);
    let store = service(3);
    let mut list = ListController::new(Arc::clone(&store), &dialogs, 2);
    list.load(1, "").await.unwrap();

    store.fail_with(Some(""));
    assert!(list.load(2, "").await.is_err());

    assert_eq!(dialogs.alerts(), vec!["Erro ao listar os registros.".to_string()]);
    assert_eq!(list.page(), 1);
    assert_eq!(list.rows().len(), 2);
}

#[tokio::test]
async fn deleting_last_row_of_a_page_steps_back() {
    let dialogs = Scripted::answering(true);
    let store = service(3);
    let mut list = ListController::new(Arc::clone(&store), &dialogs, 2);
    list.load(2, "").await.unwrap();
    assert_eq!(list.rows().len(), 1);

    assert!(matches!(list.delete(3).await, DeleteOutcome::Deleted));

    assert_eq!(store.len(), 2);
    assert_eq!(list.page(), 1);
    assert_eq!(list.rows().len(), 2);
    assert_eq!(list.page_count(), 1);
    assert_eq!(dialogs.alerts(), vec!["Registro apagado com sucesso!".to_string()]);
}

#[tokio::test]
async fn declined_delete_keeps_everything() {
    let dialogs = Scripted::answering(false);
    let store = service(3);
    let mut list = ListController::new(Arc::clone(&store), &dialogs, 2);
    list.load(1, "").await.unwrap();
    let calls = store.calls();

    assert!(matches!(list.delete(1).await, DeleteOutcome::Declined));
    assert_eq!(store.calls(), calls);
    assert_eq!(store.len(), 3);
}
