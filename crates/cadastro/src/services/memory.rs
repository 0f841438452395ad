//! In-process [`PersistenceService`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::{Page, PersistenceService, Record};
use crate::config::DEFAULT_PAGE_LIMIT;
use crate::error::{Result, ServiceError};

/// Keeps records in a map. Ids are assigned from 1 upwards.
///
/// Calls are counted so tests can assert that a rejected form never reached
/// the service.
#[derive(Debug)]
pub struct MemoryService<R> {
    records: Mutex<BTreeMap<u64, R>>,
    next_id: Mutex<u64>,
    page_limit: u32,
    calls: AtomicUsize,
    failure: Mutex<Option<String>>,
}

impl<R: Record> Default for MemoryService<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> MemoryService<R> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            next_id: Mutex::new(1),
            page_limit: DEFAULT_PAGE_LIMIT,
            calls: AtomicUsize::new(0),
            failure: Mutex::new(None),
        }
    }

    /// Sets the rows returned per page.
    pub fn page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    /// Sets the id the next created record receives.
    pub fn next_id(self, id: u64) -> Self {
        *self.next_id.lock() = id;
        self
    }

    /// Stores `records`, assigning ids to those without one.
    pub fn with_records(self, records: impl IntoIterator<Item = R>) -> Self {
        for record in records {
            self.store(record);
        }
        self
    }

    /// Makes every following call fail with `message` until cleared.
    pub fn fail_with(&self, message: Option<&str>) {
        *self.failure.lock() = message.map(str::to_string);
    }

    /// Returns how many service calls were made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns a copy of the stored record.
    pub fn record(&self, id: u64) -> Option<R> {
        self.records.lock().get(&id).cloned()
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    fn store(&self, mut record: R) -> u64 {
        let id = match record.id() {
            Some(id) => {
                let mut next = self.next_id.lock();
                *next = (*next).max(id + 1);
                id
            }
            None => {
                let mut next = self.next_id.lock();
                let id = *next;
                *next += 1;
                record.set_id(id);
                id
            }
        };
        self.records.lock().insert(id, record);
        id
    }

    fn enter(&self, fallback: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.lock().as_ref() {
            Some(message) => Err(ServiceError::Status {
                status: 500,
                message: if message.is_empty() {
                    fallback.to_string()
                } else {
                    message.clone()
                },
                body: String::new(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<R: Record> PersistenceService for MemoryService<R> {
    type Record = R;

    async fn get_all(&self, page: u32, filter: &str) -> Result<Page<R>> {
        self.enter(super::rest::LIST_FAILED)?;
        let records = self.records.lock();
        let matching: Vec<&R> = records.values().filter(|r| r.matches(filter)).collect();
        let limit = self.page_limit as usize;
        let skip = (page.max(1) as usize - 1) * limit;
        let rows = matching.iter().skip(skip).take(limit).map(|r| (*r).clone()).collect();
        Ok(Page::new(rows, matching.len() as u64))
    }

    async fn get_by_id(&self, id: u64) -> Result<R> {
        self.enter(super::rest::GET_FAILED)?;
        self.record(id).ok_or(ServiceError::NotFound { id })
    }

    async fn create(&self, record: &R) -> Result<u64> {
        self.enter(super::rest::CREATE_FAILED)?;
        let mut record = record.clone();
        let id = {
            let mut next = self.next_id.lock();
            let id = *next;
            *next += 1;
            id
        };
        record.set_id(id);
        self.records.lock().insert(id, record);
        debug!(resource = R::RESOURCE, id, "record created");
        Ok(id)
    }

    async fn update_by_id(&self, id: u64, record: &R) -> Result<()> {
        self.enter(super::rest::UPDATE_FAILED)?;
        let mut records = self.records.lock();
        let slot = records.get_mut(&id).ok_or(ServiceError::NotFound { id })?;
        let mut record = record.clone();
        record.set_id(id);
        *slot = record;
        Ok(())
    }

    async fn delete_by_id(&self, id: u64) -> Result<()> {
        self.enter(super::rest::DELETE_FAILED)?;
        self.records
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or(ServiceError::NotFound { id })
    }
}
