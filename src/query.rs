use std::collections::BTreeMap;

use crate::assignment::AssignmentStatus;
use crate::schema::TelemetryType;
use crate::transport::Query;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

// ---------------------------------------------------------------------------
// Schema assignment listing
// ---------------------------------------------------------------------------

/// Parameters of `GET /api/v1/schemas/{key}/versions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListAssignmentsParams {
    pub search: String,
    pub status: Vec<AssignmentStatus>,
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl Default for ListAssignmentsParams {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: Vec::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListAssignmentsParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn status(mut self, status: Vec<AssignmentStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub(crate) fn to_query(&self) -> Query {
        let mut query = Vec::new();
        if !self.search.is_empty() {
            query.push(("search".to_string(), self.search.clone()));
        }
        for status in &self.status {
            query.push(("status".to_string(), status.as_str().to_string()));
        }
        query.push(("page".to_string(), self.page.max(1).to_string()));
        query.push(("pageSize".to_string(), self.page_size.to_string()));
        query
    }
}

// ---------------------------------------------------------------------------
// Schema catalog listing
// ---------------------------------------------------------------------------

/// Sortable columns of the schema catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Name,
    Type,
    DataType,
    LastUpdated,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Type => "type",
            SortField::DataType => "dataType",
            SortField::LastUpdated => "lastUpdated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Parameters of `GET /api/v1/schemas`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSchemasParams {
    pub page: u32,
    pub page_size: u32,
    pub search: String,
    /// `None` lists every telemetry type.
    pub telemetry_type: Option<TelemetryType>,
    pub sort: Option<(SortField, SortDirection)>,
    /// Facet id to selected values, sent as repeated `filter_<facet>` pairs.
    pub filters: BTreeMap<String, Vec<String>>,
}

impl Default for ListSchemasParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: String::new(),
            telemetry_type: None,
            sort: None,
            filters: BTreeMap::new(),
        }
    }
}

impl ListSchemasParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn telemetry_type(mut self, telemetry_type: TelemetryType) -> Self {
        self.telemetry_type = Some(telemetry_type);
        self
    }

    pub fn sort(mut self, field: SortField, direction: SortDirection) -> Self {
        self.sort = Some((field, direction));
        self
    }

    pub fn filter(mut self, facet: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters
            .entry(facet.into())
            .or_default()
            .push(value.into());
        self
    }

    pub(crate) fn to_query(&self) -> Query {
        let mut query = vec![
            ("page".to_string(), self.page.max(1).to_string()),
            ("pageSize".to_string(), self.page_size.to_string()),
        ];
        if !self.search.is_empty() {
            query.push(("search".to_string(), self.search.clone()));
        }
        if let Some(t) = self.telemetry_type {
            query.push(("type".to_string(), t.as_str().to_string()));
        }
        if let Some((field, direction)) = self.sort {
            query.push(("sort_field".to_string(), field.as_str().to_string()));
            query.push(("sort_direction".to_string(), direction.as_str().to_string()));
        }
        for (facet, values) in &self.filters {
            for value in values {
                query.push((format!("filter_{}", facet), value.clone()));
            }
        }
        query
    }
}

// ---------------------------------------------------------------------------
// Schema history listing
// ---------------------------------------------------------------------------

/// Parameters of `GET /api/v1/schemas/{key}/history`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListHistoryParams {
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl Default for ListHistoryParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListHistoryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub(crate) fn to_query(self) -> Query {
        vec![
            ("page".to_string(), self.page.max(1).to_string()),
            ("pageSize".to_string(), self.page_size.to_string()),
        ]
    }
}
