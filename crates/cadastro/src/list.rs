//! The listing screen: paged, filtered rows with delete.

use std::fmt;

use tracing::debug;

use crate::detail::{CONFIRM_DELETE, DELETED, DeleteOutcome};
use crate::dialogs::Dialogs;
use crate::error::ServiceError;
use crate::services::{PersistenceService, Record};

/// Rows of one resource, one page at a time.
pub struct ListController<S: PersistenceService, D> {
    service: S,
    dialogs: D,
    page_limit: u32,
    page: u32,
    filter: String,
    rows: Vec<S::Record>,
    total_count: u64,
    loading: bool,
}

impl<S: PersistenceService, D> fmt::Debug for ListController<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListController")
            .field("resource", &S::Record::RESOURCE)
            .field("page", &self.page)
            .field("filter", &self.filter)
            .field("rows", &self.rows.len())
            .field("total_count", &self.total_count)
            .finish_non_exhaustive()
    }
}

impl<S, D> ListController<S, D>
where
    S: PersistenceService,
    D: Dialogs,
{
    /// Creates an empty listing showing `page_limit` rows per page.
    pub fn new(service: S, dialogs: D, page_limit: u32) -> Self {
        Self {
            service,
            dialogs,
            page_limit: page_limit.max(1),
            page: 1,
            filter: String::new(),
            rows: Vec::new(),
            total_count: 0,
            loading: false,
        }
    }

    /// Loads page `page` (1-based) of rows matching `filter`.
    ///
    /// On failure the user is alerted and the previous rows are kept.
    pub async fn load(&mut self, page: u32, filter: &str) -> Result<(), ServiceError> {
        self.loading = true;
        let result = self.service.get_all(page.max(1), filter).await;
        self.loading = false;
        match result {
            Ok(listing) => {
                debug!(
                    resource = S::Record::RESOURCE,
                    page,
                    rows = listing.rows.len(),
                    total = listing.total_count,
                    "list loaded"
                );
                self.page = page.max(1);
                self.filter = filter.to_string();
                self.rows = listing.rows;
                self.total_count = listing.total_count;
                Ok(())
            }
            Err(err) => {
                self.dialogs.alert(&err.user_message());
                Err(err)
            }
        }
    }

    /// Reloads the current page and filter.
    pub async fn reload(&mut self) -> Result<(), ServiceError> {
        let filter = self.filter.clone();
        self.load(self.page, &filter).await
    }

    /// Asks for confirmation, deletes row `id` and reloads.
    pub async fn delete(&mut self, id: u64) -> DeleteOutcome {
        if !self.dialogs.confirm(CONFIRM_DELETE) {
            return DeleteOutcome::Declined;
        }
        if let Err(err) = self.service.delete_by_id(id).await {
            self.dialogs.alert(&err.user_message());
            return DeleteOutcome::Failed(err);
        }
        self.dialogs.alert(DELETED);
        // The deleted row may have been the last one on this page.
        if self.rows.len() == 1 && self.page > 1 {
            self.page -= 1;
        }
        if let Err(err) = self.reload().await {
            return DeleteOutcome::Failed(err);
        }
        DeleteOutcome::Deleted
    }

    /// Returns the rows on the current page.
    pub fn rows(&self) -> &[S::Record] {
        &self.rows
    }

    /// Returns the total number of matching rows.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Returns the current page (1-based).
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Returns the current filter.
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Returns the number of pages for the current total.
    pub fn page_count(&self) -> u64 {
        self.total_count.div_ceil(u64::from(self.page_limit))
    }

    /// Returns true while a service call is running.
    pub fn is_loading(&self) -> bool {
        self.loading
    }
}
