//! Persistence services.
//!
//! Every screen talks to its records through [`PersistenceService`]. The
//! production implementation is [`RestService`]; [`MemoryService`] keeps
//! records in process for tests and offline use.

mod memory;
pub(crate) mod rest;

pub use memory::MemoryService;
pub use rest::{RestClient, RestService};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// A record stored under one REST resource.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Resource path segment, e.g. `pessoas`.
    const RESOURCE: &'static str;

    /// Query parameter carrying the list filter.
    const FILTER_PARAM: &'static str;

    /// Returns the id assigned by the server, if saved.
    fn id(&self) -> Option<u64>;

    /// Sets the id.
    fn set_id(&mut self, id: u64);

    /// Text shown for the record in lists and titles.
    fn label(&self) -> String;

    /// Returns true if the record matches a list filter.
    fn matches(&self, filter: &str) -> bool {
        filter.is_empty() || self.label().to_lowercase().contains(&filter.to_lowercase())
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    /// Rows on this page.
    pub rows: Vec<R>,
    /// Total rows across all pages.
    pub total_count: u64,
}

impl<R> Page<R> {
    /// Creates a page.
    pub fn new(rows: Vec<R>, total_count: u64) -> Self {
        Self { rows, total_count }
    }
}

/// CRUD operations over one kind of record.
#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// Record type.
    type Record: Record;

    /// Lists one page (1-based) of records matching `filter`.
    async fn get_all(&self, page: u32, filter: &str) -> Result<Page<Self::Record>>;

    /// Fetches one record.
    async fn get_by_id(&self, id: u64) -> Result<Self::Record>;

    /// Creates a record and returns its new id.
    async fn create(&self, record: &Self::Record) -> Result<u64>;

    /// Replaces the record stored under `id`.
    async fn update_by_id(&self, id: u64, record: &Self::Record) -> Result<()>;

    /// Deletes the record stored under `id`.
    async fn delete_by_id(&self, id: u64) -> Result<()>;
}

#[async_trait]
impl<S: PersistenceService + ?Sized> PersistenceService for std::sync::Arc<S> {
    type Record = S::Record;

    async fn get_all(&self, page: u32, filter: &str) -> Result<Page<Self::Record>> {
        (**self).get_all(page, filter).await
    }

    async fn get_by_id(&self, id: u64) -> Result<Self::Record> {
        (**self).get_by_id(id).await
    }

    async fn create(&self, record: &Self::Record) -> Result<u64> {
        (**self).create(record).await
    }

    async fn update_by_id(&self, id: u64, record: &Self::Record) -> Result<()> {
        (**self).update_by_id(id, record).await
    }

    async fn delete_by_id(&self, id: u64) -> Result<()> {
        (**self).delete_by_id(id).await
    }
}
