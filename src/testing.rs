//! Testing support: an in-memory registry speaking the HTTP contract.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tallycat::testing::FakeRegistry;
//!
//! #[tokio::test]
//! async fn assigns_first_version() {
//!     let registry = FakeRegistry::new();
//!     registry.add_assignment("http.server.duration", "abc", None, 2);
//!     let client = registry.client();
//!     // ... drive the workflow with `client`
//!     registry.assert_assigned("abc", "1.0.0");
//! }
//! ```

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::json;
use tokio::sync::Semaphore;

use crate::assignment::{AssignVersionRequest, AssignmentStatus, SchemaAssignment};
use crate::client::{Client, API_BASE_PATH};
use crate::errors::{ApiError, ERR_NOT_FOUND};
use crate::schema::{ListResponse, Telemetry, TelemetryHistory};
use crate::transport::{Method, Query, Transport, TransportFuture};

/// A request seen by the fake registry.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Query,
    pub body: Option<serde_json::Value>,
}

impl RecordedRequest {
    /// First value of a query parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Handle to a held response. See [`FakeRegistry::hold_search`].
#[derive(Debug, Clone)]
pub struct ResponseGate {
    semaphore: Arc<Semaphore>,
}

impl ResponseGate {
    /// Let one held request complete.
    pub fn release(&self) {
        self.semaphore.add_permits(1);
    }
}

/// In-memory schema registry implementing [`Transport`].
#[derive(Debug, Clone, Default)]
pub struct FakeRegistry {
    inner: Arc<Mutex<FakeRegistryInner>>,
}

#[derive(Debug, Default)]
struct FakeRegistryInner {
    schemas: BTreeMap<String, Telemetry>,
    assignments: BTreeMap<String, Vec<SchemaAssignment>>,
    history: BTreeMap<String, Vec<TelemetryHistory>>,
    requests: Vec<RecordedRequest>,
    failures: VecDeque<(Method, ApiError)>,
    gates: HashMap<String, Arc<Semaphore>>,
    write_gate: Option<Arc<Semaphore>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeRegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A [`Client`] backed by this registry.
    pub fn client(&self) -> Client {
        Client::builder()
            .transport(Arc::new(self.clone()))
            .build()
            .expect("custom transport always builds")
    }

    // -----------------------------------------------------------------------
    // Seeding
    // -----------------------------------------------------------------------

    pub fn add_schema(&self, schema: Telemetry) {
        self.lock()
            .schemas
            .insert(schema.schema_key.clone(), schema);
    }

    /// Add a discovered variant under `schema_key`.
    pub fn add_assignment(
        &self,
        schema_key: &str,
        schema_id: &str,
        version: Option<&str>,
        producer_count: u64,
    ) {
        let status = AssignmentStatus::from_version(version);
        self.lock()
            .assignments
            .entry(schema_key.to_string())
            .or_default()
            .push(SchemaAssignment {
                schema_id: schema_id.to_string(),
                status: status.to_string(),
                version: version.map(String::from),
                producer_count,
                last_seen: None,
            });
    }

    /// Make the next request with `method` fail with `status`.
    pub fn fail_next(&self, method: Method, status: u16) {
        self.fail_next_with(method, ApiError::from_status(status, b"injected failure"));
    }

    /// Make the next request with `method` fail with `error`.
    pub fn fail_next_with(&self, method: Method, error: ApiError) {
        self.lock().failures.push_back((method, error));
    }

    /// Hold every assignment listing whose `search` parameter equals
    /// `search` until the returned gate is released, once per request.
    pub fn hold_search(&self, search: &str) -> ResponseGate {
        let semaphore = Arc::new(Semaphore::new(0));
        self.lock()
            .gates
            .insert(search.to_string(), semaphore.clone());
        ResponseGate { semaphore }
    }

    /// Hold every version assignment write until the returned gate is
    /// released, once per request. The write is recorded before it blocks.
    pub fn hold_writes(&self) -> ResponseGate {
        let semaphore = Arc::new(Semaphore::new(0));
        self.lock().write_gate = Some(semaphore.clone());
        ResponseGate { semaphore }
    }

    // -----------------------------------------------------------------------
    // Inspection and assertions
    // -----------------------------------------------------------------------

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    pub fn count(&self, method: Method) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    /// Current version of a variant, with the sentinel mapped to `None`.
    pub fn version_of(&self, schema_id: &str) -> Option<String> {
        self.lock()
            .assignments
            .values()
            .flatten()
            .find(|a| a.schema_id == schema_id)
            .and_then(|a| a.assigned_version().map(String::from))
    }

    /// Assert that a write assigned `version` to `schema_id`.
    pub fn assert_assigned(&self, schema_id: &str, version: &str) {
        let writes = self.writes();
        assert!(
            writes
                .iter()
                .any(|w| w.schema_id == schema_id && w.version == version),
            "Expected version '{}' assigned to '{}', writes: {:?}",
            version,
            schema_id,
            writes
        );
    }

    /// Assert that no write reached the registry.
    pub fn refute_assigned(&self) {
        let writes = self.writes();
        assert!(
            writes.is_empty(),
            "Expected no version assignment, found {:?}",
            writes
        );
    }

    /// Bodies of every version assignment request, in order.
    pub fn writes(&self) -> Vec<AssignVersionRequest> {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.method == Method::Post)
            .filter_map(|r| r.body.clone())
            .filter_map(|b| serde_json::from_value(b).ok())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Request handling
    // -----------------------------------------------------------------------

    async fn handle(
        &self,
        method: Method,
        path: String,
        query: Query,
        body: Option<serde_json::Value>,
    ) -> crate::Result<Option<serde_json::Value>> {
        let request = RecordedRequest {
            method,
            path,
            query,
            body,
        };

        let gate = {
            let mut inner = self.lock();
            inner.requests.push(request.clone());
            match method {
                Method::Post => inner.write_gate.clone(),
                _ => request
                    .param("search")
                    .and_then(|s| inner.gates.get(s).cloned()),
            }
        };
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let mut inner = self.lock();
        if inner.failures.front().is_some_and(|(m, _)| *m == method) {
            if let Some((_, error)) = inner.failures.pop_front() {
                return Err(error.into());
            }
        }

        let rest = request
            .path
            .strip_prefix(API_BASE_PATH)
            .and_then(|p| p.strip_prefix("/schemas"))
            .ok_or_else(not_found)?;
        let segments: Vec<String> = rest
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::decode(s).map(|d| d.into_owned()).unwrap_or_default())
            .collect();

        match (method, segments.as_slice()) {
            (Method::Get, []) => Ok(Some(inner.list_schemas(&request))),
            (Method::Get, [key]) => inner
                .schemas
                .get(key)
                .map(|s| Some(json!(s)))
                .ok_or_else(not_found),
            (Method::Get, [key, versions]) if versions == "versions" => {
                Ok(Some(inner.list_assignments(key, &request)))
            }
            (Method::Get, [key, history]) if history == "history" => {
                Ok(Some(inner.list_history(key, &request)))
            }
            (Method::Post, [key, versions]) if versions == "versions" => {
                inner.assign(key, &request).map(Some)
            }
            _ => Err(not_found()),
        }
    }
}

impl FakeRegistryInner {
    fn list_assignments(&self, key: &str, request: &RecordedRequest) -> serde_json::Value {
        let search = request.param("search").unwrap_or("").to_lowercase();
        let statuses: Vec<&str> = request
            .query
            .iter()
            .filter(|(k, _)| k == "status")
            .map(|(_, v)| v.as_str())
            .collect();

        let matching: Vec<&SchemaAssignment> = self
            .assignments
            .get(key)
            .map(|items| {
                items
                    .iter()
                    .filter(|a| search.is_empty() || a.schema_id.to_lowercase().contains(&search))
                    .filter(|a| statuses.is_empty() || statuses.contains(&a.status().as_str()))
                    .collect()
            })
            .unwrap_or_default();

        json!(paginate(&matching, request))
    }

    fn list_schemas(&self, request: &RecordedRequest) -> serde_json::Value {
        let search = request.param("search").unwrap_or("").to_lowercase();
        let telemetry_type = request.param("type");

        let matching: Vec<&Telemetry> = self
            .schemas
            .values()
            .filter(|s| search.is_empty() || s.schema_key.to_lowercase().contains(&search))
            .filter(|s| telemetry_type.map_or(true, |t| s.telemetry_type.as_str() == t))
            .collect();

        json!(paginate(&matching, request))
    }

    fn assign(&mut self, key: &str, request: &RecordedRequest) -> crate::Result<serde_json::Value> {
        let body: AssignVersionRequest = request
            .body
            .clone()
            .map(serde_json::from_value)
            .transpose()?
            .ok_or_else(|| ApiError::from_status(400, b"failed to decode request body"))?;

        let assignment = self
            .assignments
            .get_mut(key)
            .and_then(|items| items.iter_mut().find(|a| a.schema_id == body.schema_id))
            .ok_or_else(not_found)?;
        assignment.version = Some(body.version.clone());
        assignment.status = AssignmentStatus::Assigned.to_string();
        let status = assignment.status.clone();

        let now = chrono::Utc::now();
        let id = self.history.values().map(Vec::len).sum::<usize>() as i64 + 1;
        self.history
            .entry(key.to_string())
            .or_default()
            .push(TelemetryHistory {
                id,
                schema_key: key.to_string(),
                version: body.version.clone(),
                timestamp: now,
                author: None,
                summary: format!(
                    "Assigned schema version {} to schema {}",
                    body.version, body.schema_id
                ),
                status: String::new(),
                snapshot: None,
                created_at: Some(now),
                updated_at: Some(now),
            });

        Ok(json!({
            "schemaId": body.schema_id,
            "version": body.version,
            "status": status,
        }))
    }

    /// Newest entry first.
    fn list_history(&self, key: &str, request: &RecordedRequest) -> serde_json::Value {
        let entries: Vec<&TelemetryHistory> = self
            .history
            .get(key)
            .map(|entries| entries.iter().rev().collect())
            .unwrap_or_default();
        json!(paginate(&entries, request))
    }
}

fn paginate<T: Clone + serde::Serialize>(items: &[&T], request: &RecordedRequest) -> ListResponse<T> {
    let page: u32 = request
        .param("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1)
        .max(1);
    let page_size: u32 = request
        .param("pageSize")
        .and_then(|p| p.parse().ok())
        .unwrap_or(crate::query::DEFAULT_PAGE_SIZE);

    let start = (page as usize - 1).saturating_mul(page_size as usize);
    ListResponse {
        items: items
            .iter()
            .skip(start)
            .take(page_size as usize)
            .map(|item| (*item).clone())
            .collect(),
        total: items.len() as u64,
        page,
        page_size,
    }
}

fn not_found() -> crate::RegistryError {
    ApiError::new(ERR_NOT_FOUND, "not found", 404).into()
}

impl Transport for FakeRegistry {
    fn request(
        &self,
        method: Method,
        path: &str,
        query: Query,
        body: Option<serde_json::Value>,
    ) -> TransportFuture<'_> {
        let path = path.to_string();
        Box::pin(self.handle(method, path, query, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ListAssignmentsParams;

    #[tokio::test]
    async fn test_pagination() {
        let registry = FakeRegistry::new();
        for i in 1..=25 {
            registry.add_assignment("k", &format!("s{:02}", i), None, 0);
        }
        let client = registry.client();

        let page = client
            .list_assignments("k", &ListAssignmentsParams::new().page(2).page_size(10))
            .await
            .unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.items.first().unwrap().schema_id, "s11");
        assert_eq!(page.items.last().unwrap().schema_id, "s20");
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let registry = FakeRegistry::new();
        registry.fail_next(Method::Get, 503);
        let err = registry
            .client()
            .list_assignments("k", &ListAssignmentsParams::new())
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), Some(503));

        let page = registry
            .client()
            .list_assignments("k", &ListAssignmentsParams::new())
            .await
            .unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn test_downloads_are_unsupported() {
        let err = FakeRegistry::new()
            .client()
            .export_weaver_schema("k", "abc")
            .await
            .unwrap_err();
        assert!(matches!(err, crate::RegistryError::Unsupported(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_injected_custom_error() {
        let registry = FakeRegistry::new();
        registry.fail_next_with(
            Method::Get,
            ApiError::new(crate::errors::ERR_RATE_LIMITED, "slow down", 429).retryable(true),
        );
        let err = registry
            .client()
            .list_assignments("k", &ListAssignmentsParams::new())
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), Some(429));
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "[429 rate_limited] slow down");
    }
}
