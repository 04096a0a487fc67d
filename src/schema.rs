use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Telemetry signal kind of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TelemetryType {
    Metric,
    Log,
    Span,
    Profile,
}

impl TelemetryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryType::Metric => "Metric",
            TelemetryType::Log => "Log",
            TelemetryType::Span => "Span",
            TelemetryType::Profile => "Profile",
        }
    }
}

impl std::str::FromStr for TelemetryType {
    type Err = crate::RegistryError;

    /// Case-insensitive; accepts `trace` as an alias of `Span`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" => Ok(TelemetryType::Metric),
            "log" => Ok(TelemetryType::Log),
            "span" | "trace" => Ok(TelemetryType::Span),
            "profile" => Ok(TelemetryType::Profile),
            other => Err(crate::RegistryError::Config(format!(
                "unknown telemetry type: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for TelemetryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attribute observed on a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: String,
    /// Where the attribute was observed: `resource`, `scope`, `datapoint`,
    /// `log`, `span`, ...
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief: Option<String>,
    #[serde(
        rename = "requirementLevel",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub requirement_level: Option<String>,
}

/// A service observed emitting a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Producer {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

/// Schema metadata, attributes and producers, as returned by
/// `GET /api/v1/schemas/{key}` and the catalog listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Telemetry {
    #[serde(default)]
    pub schema_id: String,
    pub schema_key: String,
    #[serde(default)]
    pub schema_version: String,
    #[serde(rename = "schemaURL", default, skip_serializing_if = "Option::is_none")]
    pub schema_url: Option<String>,
    pub telemetry_type: TelemetryType,

    // Metric fields
    #[serde(default)]
    pub metric_unit: String,
    #[serde(default)]
    pub metric_type: String,
    #[serde(default)]
    pub metric_temporality: String,

    // Log fields
    #[serde(default)]
    pub log_severity_number: i32,
    #[serde(default)]
    pub log_severity_text: String,
    #[serde(default)]
    pub log_body: String,
    #[serde(default)]
    pub log_flags: u32,
    #[serde(rename = "logTraceID", default)]
    pub log_trace_id: String,
    #[serde(rename = "logSpanID", default)]
    pub log_span_id: String,
    #[serde(default)]
    pub log_event_name: String,
    #[serde(default)]
    pub log_dropped_attributes_count: u32,

    // Span fields
    #[serde(default)]
    pub span_kind: String,
    #[serde(default)]
    pub span_name: String,

    // Profile fields
    #[serde(default)]
    pub profile_sample_aggregation_temporality: String,
    #[serde(default)]
    pub profile_sample_unit: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub seen_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub producers: BTreeMap<String, Producer>,
}

impl Telemetry {
    /// Number of distinct producers currently emitting this schema.
    pub fn producer_count(&self) -> usize {
        self.producers.len()
    }
}

/// One entry of a schema's change history, as recorded by the registry on
/// every version assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryHistory {
    pub id: i64,
    pub schema_key: String,
    #[serde(default)]
    pub version: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub status: String,
    /// Base64 snapshot of the schema at that point, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A page of results from any registry list endpoint.
///
/// The schema listing has historically used `schemas` instead of `items`;
/// both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    #[serde(alias = "schemas", default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

impl<T> ListResponse<T> {
    /// An empty page. A successful response, not an error.
    pub fn empty(page: u32, page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page,
            page_size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of pages for the current page size.
    pub fn page_count(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.page_size))
    }
}
