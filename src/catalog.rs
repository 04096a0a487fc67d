//! Query state of the schema catalog: search, telemetry type tab, facet
//! filters and sorting. Everything is evaluated by the registry; this type
//! only tracks what the operator selected and turns it into
//! [`ListSchemasParams`].

use std::collections::BTreeMap;

use crate::client::Client;
use crate::query::{ListSchemasParams, SortDirection, SortField, DEFAULT_PAGE_SIZE};
use crate::schema::{ListResponse, Telemetry, TelemetryType};

/// Name of the tab that lists every telemetry type.
pub const ALL_TAB: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    search: String,
    tab: Option<TelemetryType>,
    filters: BTreeMap<String, Vec<String>>,
    sort_field: SortField,
    sort_direction: SortDirection,
    page: u32,
    page_size: u32,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            tab: None,
            filters: BTreeMap::new(),
            sort_field: SortField::Name,
            sort_direction: SortDirection::Asc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CatalogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.page = 1;
    }

    /// Selected telemetry type, `None` for the "all" tab.
    pub fn tab(&self) -> Option<TelemetryType> {
        self.tab
    }

    /// Select a tab by name (`all`, `metric`, `log`, `span`/`trace`,
    /// `profile`).
    pub fn set_tab(&mut self, tab: &str) -> crate::Result<()> {
        self.tab = if tab.eq_ignore_ascii_case(ALL_TAB) {
            None
        } else {
            Some(tab.parse()?)
        };
        self.page = 1;
        Ok(())
    }

    /// Add `value` to the facet selection, or remove it if already selected.
    pub fn toggle_filter(&mut self, facet: &str, value: &str) {
        let values = self.filters.entry(facet.to_string()).or_default();
        if let Some(pos) = values.iter().position(|v| v == value) {
            values.remove(pos);
        } else {
            values.push(value.to_string());
        }
        self.prune(facet);
        self.page = 1;
    }

    pub fn remove_filter(&mut self, facet: &str, value: &str) {
        if let Some(values) = self.filters.get_mut(facet) {
            values.retain(|v| v != value);
        }
        self.prune(facet);
        self.page = 1;
    }

    pub fn clear_all_filters(&mut self) {
        self.filters.clear();
        self.page = 1;
    }

    fn prune(&mut self, facet: &str) {
        if self.filters.get(facet).is_some_and(Vec::is_empty) {
            self.filters.remove(facet);
        }
    }

    pub fn active_filters(&self) -> &BTreeMap<String, Vec<String>> {
        &self.filters
    }

    /// Number of selected facet values across all facets.
    pub fn active_filter_count(&self) -> usize {
        self.filters.values().map(Vec::len).sum()
    }

    pub fn sort(&self) -> (SortField, SortDirection) {
        (self.sort_field, self.sort_direction)
    }

    /// Column header click: flips the direction on the current column,
    /// otherwise sorts ascending by the new column.
    pub fn handle_sort(&mut self, field: SortField) {
        if self.sort_field == field {
            self.sort_direction = self.sort_direction.reversed();
        } else {
            self.sort_field = field;
            self.sort_direction = SortDirection::Asc;
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size.max(1);
    }

    pub fn to_params(&self) -> ListSchemasParams {
        ListSchemasParams {
            page: self.page,
            page_size: self.page_size,
            search: self.search.clone(),
            telemetry_type: self.tab,
            sort: Some((self.sort_field, self.sort_direction)),
            filters: self.filters.clone(),
        }
    }

    pub async fn fetch(&self, client: &Client) -> crate::Result<ListResponse<Telemetry>> {
        client.list_schemas(&self.to_params()).await
    }
}
