//! View model for the schema assignment table of one schema key.
//!
//! Owns the query parameters (search, status filter, page, page size),
//! issues the listing request whenever one of them changes and derives the
//! table rows from the response.
//!
//! Every request is stamped with a generation number when it is issued. A
//! response is applied only if no newer request was issued in the meantime,
//! so the rendered rows always belong to the most recently requested
//! parameters no matter in which order the responses arrive.
//!
//! ```rust,no_run
//! use tallycat::{AssignmentViewModel, Client, ViewStatus};
//!
//! # #[tokio::main]
//! # async fn main() -> tallycat::Result<()> {
//! let client = Client::builder().url("http://localhost:8080").build()?;
//! let vm = AssignmentViewModel::new(client, "http.server.duration");
//!
//! vm.refresh().await;
//! vm.set_search("checkout").await;
//!
//! match vm.view_status() {
//!     ViewStatus::Ready => println!("{}", vm.summary_text()),
//!     ViewStatus::Empty => println!("no data"),
//!     ViewStatus::Error(err) => println!("failed: {}", err.message),
//!     ViewStatus::Loading => println!("loading..."),
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::assignment::{AssignmentStatus, SchemaRow};
use crate::client::Client;
use crate::errors::RegistryError;
use crate::query::ListAssignmentsParams;

/// Listing failure as exposed to the view. Cloneable snapshot of a
/// [`RegistryError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    pub message: String,
    pub http_status: Option<u16>,
    pub retryable: bool,
}

impl From<&RegistryError> for QueryError {
    fn from(err: &RegistryError) -> Self {
        Self {
            message: err.to_string(),
            http_status: err.http_status(),
            retryable: err.is_retryable(),
        }
    }
}

/// What the table area should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    /// First request still in flight, nothing to show yet.
    Loading,
    /// The latest request failed. Render a retry action, not an empty table.
    Error(QueryError),
    /// The latest request succeeded with zero items.
    Empty,
    /// Rows are available. [`AssignmentViewModel::is_loading`] may still be
    /// true while a newer request is in flight.
    Ready,
}

/// Result of one [`AssignmentViewModel::refresh`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was applied to the view.
    Applied,
    /// The request failed and the error was applied to the view.
    Failed,
    /// A newer request was issued before this one resolved; the response
    /// was dropped.
    Superseded,
    /// The setter did not change the parameters, nothing was requested.
    Unchanged,
}

#[derive(Debug, Default)]
struct ViewState {
    params: ListAssignmentsParams,
    rows: Vec<SchemaRow>,
    total: u64,
    error: Option<QueryError>,
    /// Whether any response (success or failure) has been applied.
    settled_once: bool,
    /// Generation of the newest issued request.
    issued: u64,
    /// Generation of the last applied response.
    settled: u64,
}

/// Table state for the assignments of one schema key.
#[derive(Debug)]
pub struct AssignmentViewModel {
    client: Client,
    schema_key: String,
    state: Mutex<ViewState>,
}

impl AssignmentViewModel {
    /// Create a view model with default parameters (page 1, 10 per page).
    /// Nothing is fetched until [`refresh`](Self::refresh) or a setter runs.
    pub fn new(client: Client, schema_key: impl Into<String>) -> Self {
        Self::with_params(client, schema_key, ListAssignmentsParams::default())
    }

    pub fn with_params(
        client: Client,
        schema_key: impl Into<String>,
        params: ListAssignmentsParams,
    ) -> Self {
        Self {
            client,
            schema_key: schema_key.into(),
            state: Mutex::new(ViewState {
                params,
                ..ViewState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn schema_key(&self) -> &str {
        &self.schema_key
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    // -----------------------------------------------------------------------
    // Query parameters
    // -----------------------------------------------------------------------

    pub fn params(&self) -> ListAssignmentsParams {
        self.lock().params.clone()
    }

    pub fn search_query(&self) -> String {
        self.lock().params.search.clone()
    }

    pub fn active_status(&self) -> Vec<AssignmentStatus> {
        self.lock().params.status.clone()
    }

    pub fn current_page(&self) -> u32 {
        self.lock().params.page
    }

    pub fn page_size(&self) -> u32 {
        self.lock().params.page_size
    }

    /// Change the search text. Resets the page to 1 and refetches.
    pub async fn set_search(&self, search: impl Into<String>) -> FetchOutcome {
        let search = search.into();
        let changed = self.update(|p| {
            if p.search == search {
                return false;
            }
            p.search = search;
            p.page = 1;
            true
        });
        self.refetch_if(changed).await
    }

    /// Change the status filter. Resets the page to 1 and refetches.
    pub async fn set_status(&self, status: Vec<AssignmentStatus>) -> FetchOutcome {
        let mut status = status;
        status.sort();
        status.dedup();
        let changed = self.update(|p| {
            if p.status == status {
                return false;
            }
            p.status = status;
            p.page = 1;
            true
        });
        self.refetch_if(changed).await
    }

    /// Go to a 1-based page. `0` is treated as `1`.
    pub async fn set_page(&self, page: u32) -> FetchOutcome {
        let page = page.max(1);
        let changed = self.update(|p| {
            if p.page == page {
                return false;
            }
            p.page = page;
            true
        });
        self.refetch_if(changed).await
    }

    /// Change the page size. `0` is treated as `1`. Resets the page to 1
    /// and refetches.
    pub async fn set_page_size(&self, page_size: u32) -> FetchOutcome {
        let page_size = page_size.max(1);
        let changed = self.update(|p| {
            if p.page_size == page_size {
                return false;
            }
            p.page_size = page_size;
            p.page = 1;
            true
        });
        self.refetch_if(changed).await
    }

    fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut ListAssignmentsParams) -> bool,
    {
        f(&mut self.lock().params)
    }

    async fn refetch_if(&self, changed: bool) -> FetchOutcome {
        if changed {
            self.refresh().await
        } else {
            FetchOutcome::Unchanged
        }
    }

    // -----------------------------------------------------------------------
    // Fetching
    // -----------------------------------------------------------------------

    /// Issue the listing request for the current parameters.
    ///
    /// Also the retry action of the error state, and the refetch after a
    /// successful version assignment.
    pub async fn refresh(&self) -> FetchOutcome {
        let (generation, params) = {
            let mut state = self.lock();
            state.issued += 1;
            (state.issued, state.params.clone())
        };

        tracing::debug!(
            schema_key = %self.schema_key,
            generation,
            search = %params.search,
            page = params.page,
            page_size = params.page_size,
            "listing schema assignments"
        );

        let result = self
            .client
            .list_assignments(&self.schema_key, &params)
            .await;

        let mut state = self.lock();
        if generation != state.issued {
            tracing::debug!(
                schema_key = %self.schema_key,
                generation,
                latest = state.issued,
                "discarding stale assignment response"
            );
            return FetchOutcome::Superseded;
        }

        state.settled = generation;
        state.settled_once = true;
        match result {
            Ok(page) => {
                state.rows = page.items.iter().map(SchemaRow::from).collect();
                state.total = page.total;
                state.error = None;
                FetchOutcome::Applied
            }
            Err(err) => {
                tracing::warn!(
                    schema_key = %self.schema_key,
                    error = %err,
                    "failed to list schema assignments"
                );
                state.error = Some(QueryError::from(&err));
                FetchOutcome::Failed
            }
        }
    }

    // -----------------------------------------------------------------------
    // Derived state
    // -----------------------------------------------------------------------

    /// Rows of the last applied page. Kept while a newer request is in
    /// flight.
    pub fn table_data(&self) -> Vec<SchemaRow> {
        self.lock().rows.clone()
    }

    /// Find a row of the current page by schema id.
    pub fn row(&self, schema_id: &str) -> Option<SchemaRow> {
        self.lock().rows.iter().find(|r| r.id == schema_id).cloned()
    }

    /// Total number of variants matching the current filters, across pages.
    pub fn total_count(&self) -> u64 {
        self.lock().total
    }

    /// Whether a request issued after the last applied response is pending.
    pub fn is_loading(&self) -> bool {
        let state = self.lock();
        state.settled < state.issued
    }

    pub fn error(&self) -> Option<QueryError> {
        self.lock().error.clone()
    }

    /// Whether the latest applied response succeeded with zero items.
    pub fn is_empty(&self) -> bool {
        self.view_status() == ViewStatus::Empty
    }

    pub fn view_status(&self) -> ViewStatus {
        let state = self.lock();
        if !state.settled_once {
            return ViewStatus::Loading;
        }
        if let Some(ref err) = state.error {
            return ViewStatus::Error(err.clone());
        }
        if state.rows.is_empty() && state.total == 0 {
            return ViewStatus::Empty;
        }
        ViewStatus::Ready
    }

    /// "Showing N schemas", plus "(filtered from T total)" when a search or
    /// status filter is active.
    pub fn summary_text(&self) -> String {
        let state = self.lock();
        let count = state.rows.len();
        let filtered = !state.params.search.is_empty() || !state.params.status.is_empty();
        format!(
            "Showing {} schema{}{}",
            count,
            if count == 1 { "" } else { "s" },
            if filtered {
                format!(" (filtered from {} total)", state.total)
            } else {
                String::new()
            }
        )
    }
}
