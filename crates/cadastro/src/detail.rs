//! The detail screen: load, validate, save, delete.
//!
//! A [`DetailPage`] pairs a [`VForm`] with a [`DetailController`]. The
//! controller is the form's [`SubmitHandler`]: it validates the snapshot,
//! calls the persistence service and decides where to navigate from the
//! submit intent.
//!
//! ```rust,ignore
//! use cadastro::{DetailPage, Entities, History, MemoryService, Scripted};
//!
//! let mut page = DetailPage::new(Entities, MemoryService::new(), History::new(), Scripted::answering(true));
//! page.open("nova").await?;
//! page.fields().nome.input("Acme".into());
//! page.save_and_close().await;
//! ```

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};
use vform::{FormSnapshot, Schema, SubmitHandler, VForm, ValidationErrors};

use crate::dialogs::Dialogs;
use crate::error::ServiceError;
use crate::navigation::{NEW_RECORD, Navigator};
use crate::pages::EntityKind;
use crate::services::{PersistenceService, Record};

/// Question asked before deleting.
pub const CONFIRM_DELETE: &str = "Realmente deseja apagar?";

/// Alert shown after deleting.
pub const DELETED: &str = "Registro apagado com sucesso!";

// -----------------------------------------------------------------------------
// Outcomes
// -----------------------------------------------------------------------------

/// Which record a detail screen edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordId {
    /// A record that was not saved yet.
    New,
    /// A saved record.
    Existing(u64),
}

impl RecordId {
    /// Parses a route id segment: [`NEW_RECORD`] or a number.
    pub fn parse(segment: &str) -> Option<Self> {
        if segment == NEW_RECORD {
            Some(Self::New)
        } else {
            segment.parse().ok().map(Self::Existing)
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => f.write_str(NEW_RECORD),
            Self::Existing(id) => write!(f, "{id}"),
        }
    }
}

/// Result of one save.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The form failed validation; the messages are on the fields and the
    /// service was not called.
    Invalid(ValidationErrors),
    /// A new record was stored under this id.
    Created(u64),
    /// The existing record was updated.
    Updated,
    /// The service failed; the user was alerted.
    Failed(ServiceError),
}

impl SubmitOutcome {
    /// Returns true if the record was persisted.
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Created(_) | Self::Updated)
    }
}

/// Result of a delete request.
#[derive(Debug)]
pub enum DeleteOutcome {
    /// The record was never saved, so there is nothing to delete.
    Unsaved,
    /// The user declined the confirmation.
    Declined,
    /// The record was deleted.
    Deleted,
    /// The service failed; the user was alerted.
    Failed(ServiceError),
}

// -----------------------------------------------------------------------------
// DetailController
// -----------------------------------------------------------------------------

/// Screen state and persistence logic for one [`EntityKind`].
pub struct DetailController<K: EntityKind, S, N, D> {
    service: S,
    navigator: N,
    dialogs: D,
    schema: Schema,
    id: RecordId,
    loading: bool,
    title: String,
    fields: K::Fields,
}

impl<K: EntityKind, S, N, D> fmt::Debug for DetailController<K, S, N, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetailController")
            .field("routes", &K::ROUTES)
            .field("id", &self.id)
            .field("loading", &self.loading)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

impl<K, S, N, D> DetailController<K, S, N, D>
where
    K: EntityKind,
    S: PersistenceService<Record = K::Record>,
    N: Navigator,
    D: Dialogs,
{
    /// Loads the record named by the route segment `id`.
    ///
    /// [`NEW_RECORD`] seeds the blank values. A failed fetch alerts the user
    /// and navigates back to the list; the error is returned after that.
    pub async fn load(&mut self, form: &VForm, id: &str) -> Result<(), ServiceError> {
        let Some(record_id) = RecordId::parse(id) else {
            let err = ServiceError::decode("Registro inválido.", id);
            self.dialogs.alert(&err.user_message());
            self.navigator.navigate(K::ROUTES.list);
            return Err(err);
        };
        self.id = record_id;
        form.form().clear_errors();

        let (data, title) = match record_id {
            RecordId::New => (K::blank(), K::NEW_TITLE.to_string()),
            RecordId::Existing(id) => {
                self.loading = true;
                let result = self.service.get_by_id(id).await;
                self.loading = false;
                let loaded = result.and_then(|record| {
                    serde_json::to_value(&record)
                        .map(|value| (value, K::title(&record)))
                        .map_err(|e| ServiceError::decode("Erro ao consultar o registro.", e))
                });
                match loaded {
                    Ok(loaded) => loaded,
                    Err(err) => {
                        self.dialogs.alert(&err.user_message());
                        self.navigator.navigate(K::ROUTES.list);
                        return Err(err);
                    }
                }
            }
        };

        K::prepare(&mut self.fields, &data);
        form.form().reset();
        let applied = form.form().set_data(&data);
        debug!(id = %record_id, applied, "detail loaded");
        self.title = title;
        Ok(())
    }

    /// Asks for confirmation and deletes the record.
    pub async fn delete(&mut self) -> DeleteOutcome {
        let RecordId::Existing(id) = self.id else {
            return DeleteOutcome::Unsaved;
        };
        if !self.dialogs.confirm(CONFIRM_DELETE) {
            return DeleteOutcome::Declined;
        }
        match self.service.delete_by_id(id).await {
            Ok(()) => {
                info!(resource = K::Record::RESOURCE, id, "record deleted");
                self.dialogs.alert(DELETED);
                self.navigator.navigate(K::ROUTES.list);
                DeleteOutcome::Deleted
            }
            Err(err) => {
                self.dialogs.alert(&err.user_message());
                DeleteOutcome::Failed(err)
            }
        }
    }

    /// Opens the detail screen for a new record.
    pub fn new_record(&self) {
        self.navigator.navigate(&K::ROUTES.new_record());
    }

    /// Returns to the list.
    pub fn back(&self) {
        self.navigator.navigate(K::ROUTES.list);
    }

    async fn persist(&mut self, mut record: K::Record, close: bool) -> SubmitOutcome {
        self.loading = true;
        let outcome = match self.id {
            RecordId::New => match self.service.create(&record).await {
                Ok(id) => {
                    info!(resource = K::Record::RESOURCE, id, "record created");
                    record.set_id(id);
                    self.title = K::title(&record);
                    if close {
                        self.navigator.navigate(K::ROUTES.list);
                    } else {
                        self.id = RecordId::Existing(id);
                        self.navigator.navigate(&K::ROUTES.detail(id));
                    }
                    SubmitOutcome::Created(id)
                }
                Err(err) => SubmitOutcome::Failed(err),
            },
            RecordId::Existing(id) => {
                record.set_id(id);
                match self.service.update_by_id(id, &record).await {
                    Ok(()) => {
                        info!(resource = K::Record::RESOURCE, id, "record updated");
                        self.title = K::title(&record);
                        if close {
                            self.navigator.navigate(K::ROUTES.list);
                        }
                        SubmitOutcome::Updated
                    }
                    Err(err) => SubmitOutcome::Failed(err),
                }
            }
        };
        self.loading = false;
        if let SubmitOutcome::Failed(err) = &outcome {
            self.dialogs.alert(&err.user_message());
        }
        outcome
    }
}

impl<K: EntityKind, S, N, D> DetailController<K, S, N, D> {
    /// Returns the edited record's id.
    pub fn record_id(&self) -> RecordId {
        self.id
    }

    /// Returns true while a service call is running.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Returns the screen title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the mounted fields.
    pub fn fields(&self) -> &K::Fields {
        &self.fields
    }

    /// Returns the mounted fields for row edits.
    pub fn fields_mut(&mut self) -> &mut K::Fields {
        &mut self.fields
    }

    /// Returns the persistence service.
    pub fn service(&self) -> &S {
        &self.service
    }
}

#[async_trait(?Send)]
impl<K, S, N, D> SubmitHandler for DetailController<K, S, N, D>
where
    K: EntityKind,
    S: PersistenceService<Record = K::Record>,
    N: Navigator,
    D: Dialogs,
{
    type Output = SubmitOutcome;

    async fn on_submit(&mut self, data: FormSnapshot, form: &VForm) -> SubmitOutcome {
        // Read before the first suspension point.
        let close = form.is_save_and_close();
        let mut merged = data.to_value();
        if let Value::Object(map) = &mut merged {
            map.extend(K::extras(&self.fields));
        }

        let valid = match self.schema.validate(&merged) {
            Ok(valid) => {
                form.form().clear_errors();
                valid
            }
            Err(errors) => {
                debug!(violations = errors.len(), "submit rejected by validation");
                form.form().apply_errors(&errors);
                return SubmitOutcome::Invalid(errors);
            }
        };

        match serde_json::from_value::<K::Record>(valid) {
            Ok(record) => self.persist(record, close).await,
            Err(e) => {
                let err = ServiceError::decode("Dados do formulário inválidos.", e);
                self.dialogs.alert(&err.user_message());
                SubmitOutcome::Failed(err)
            }
        }
    }
}

// -----------------------------------------------------------------------------
// DetailPage
// -----------------------------------------------------------------------------

/// A detail screen: the form plus its controller.
pub struct DetailPage<K: EntityKind, S, N, D> {
    form: VForm,
    controller: DetailController<K, S, N, D>,
}

impl<K: EntityKind, S, N, D> fmt::Debug for DetailPage<K, S, N, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetailPage")
            .field("form", &self.form)
            .field("controller", &self.controller)
            .finish()
    }
}

impl<K, S, N, D> DetailPage<K, S, N, D>
where
    K: EntityKind,
    S: PersistenceService<Record = K::Record>,
    N: Navigator,
    D: Dialogs,
{
    /// Creates the screen and mounts its fields. Call [`open`](Self::open)
    /// next.
    pub fn new(_kind: K, service: S, navigator: N, dialogs: D) -> Self {
        let form = VForm::new();
        let fields = K::mount(form.context());
        Self {
            controller: DetailController {
                service,
                navigator,
                dialogs,
                schema: K::schema(),
                id: RecordId::New,
                loading: false,
                title: K::NEW_TITLE.to_string(),
                fields,
            },
            form,
        }
    }

    /// Loads the record for route segment `id`. See [`DetailController::load`].
    pub async fn open(&mut self, id: &str) -> Result<(), ServiceError> {
        self.controller.load(&self.form, id).await
    }

    /// "Save": persist and stay.
    pub async fn save(&mut self) -> SubmitOutcome {
        self.form.save(&mut self.controller).await
    }

    /// "Save and close": persist and return to the list.
    pub async fn save_and_close(&mut self) -> SubmitOutcome {
        self.form.save_and_close(&mut self.controller).await
    }

    /// "Delete".
    pub async fn delete(&mut self) -> DeleteOutcome {
        self.controller.delete().await
    }

    /// "New".
    pub fn new_record(&self) {
        self.controller.new_record();
    }

    /// "Back".
    pub fn back(&self) {
        self.controller.back();
    }
}

impl<K: EntityKind, S, N, D> DetailPage<K, S, N, D> {
    /// Returns the form.
    pub fn form(&self) -> &VForm {
        &self.form
    }

    /// Returns the controller.
    pub fn controller(&self) -> &DetailController<K, S, N, D> {
        &self.controller
    }

    /// Returns the mounted fields.
    pub fn fields(&self) -> &K::Fields {
        self.controller.fields()
    }

    /// Returns the mounted fields for row edits.
    pub fn fields_mut(&mut self) -> &mut K::Fields {
        self.controller.fields_mut()
    }

    /// Returns the screen title.
    pub fn title(&self) -> &str {
        self.controller.title()
    }

    /// Returns the edited record's id.
    pub fn record_id(&self) -> RecordId {
        self.controller.record_id()
    }

    /// Returns true while a service call or submit is running. Toolbar
    /// triggers are disabled meanwhile.
    pub fn is_busy(&self) -> bool {
        self.controller.is_loading() || self.form.is_submitting()
    }

    /// Whether the toolbar shows "delete" and "new".
    pub fn shows_record_actions(&self) -> bool {
        matches!(self.record_id(), RecordId::Existing(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;
    use tokio::sync::Notify;

    use crate::dialogs::Scripted;
    use crate::error::Result;
    use crate::navigation::History;
    use crate::pages::Entities;
    use crate::records::Entity;
    use crate::services::{MemoryService, Page};

    /// Holds `create` until released.
    #[derive(Default)]
    struct Gated {
        inner: MemoryService<Entity>,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl PersistenceService for Gated {
        type Record = Entity;

        async fn get_all(&self, page: u32, filter: &str) -> Result<Page<Entity>> {
            self.inner.get_all(page, filter).await
        }

        async fn get_by_id(&self, id: u64) -> Result<Entity> {
            self.inner.get_by_id(id).await
        }

        async fn create(&self, record: &Entity) -> Result<u64> {
            self.entered.notify_one();
            self.release.notified().await;
            self.inner.create(record).await
        }

        async fn update_by_id(&self, id: u64, record: &Entity) -> Result<()> {
            self.inner.update_by_id(id, record).await
        }

        async fn delete_by_id(&self, id: u64) -> Result<()> {
            self.inner.delete_by_id(id).await
        }
    }

    #[tokio::test]
    async fn intent_is_taken_before_the_service_call() {
        let gate = Arc::new(Gated::default());
        let history = History::new();
        let dialogs = Scripted::answering(true);
        let DetailPage {
            form,
            mut controller,
        } = DetailPage::new(Entities, Arc::clone(&gate), &history, &dialogs);
        controller.load(&form, "nova").await.unwrap();
        form.form().set_data(&json!({
            "Nome": "Acme",
            "CodigoRegiao": "SP",
            "CaracteristicaImovel": 3,
            "Categorias": [{ "Operacao": "Venda", "Codigo": "01" }]
        }));

        let (outcome, read_while_pending) = tokio::join!(
            form.save_and_close(&mut controller),
            async {
                gate.entered.notified().await;
                let read = form.is_save_and_close();
                gate.release.notify_one();
                read
            }
        );

        assert!(matches!(outcome, SubmitOutcome::Created(1)));
        assert!(!read_while_pending);
        assert_eq!(history.entries(), vec!["/pessoas".to_string()]);
    }

    #[test]
    fn record_id_parsing() {
        assert_eq!(RecordId::parse("nova"), Some(RecordId::New));
        assert_eq!(RecordId::parse("42"), Some(RecordId::Existing(42)));
        assert_eq!(RecordId::parse("abc"), None);
        assert_eq!(RecordId::Existing(7).to_string(), "7");
        assert_eq!(RecordId::New.to_string(), "nova");
    }

    #[test]
    fn outcome_saved() {
        assert!(SubmitOutcome::Created(1).is_saved());
        assert!(SubmitOutcome::Updated.is_saved());
        assert!(!SubmitOutcome::Failed(ServiceError::NotFound { id: 1 }).is_saved());
    }
}
