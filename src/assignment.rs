//! Schema version assignments as the registry lists them, and the table
//! rows derived from them.
//!
//! The assignment status is always derived from the version value; the
//! wire `status` field is kept but never trusted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::Producer;

/// Version value the registry reports for a variant nobody has versioned yet.
pub const UNASSIGNED_SENTINEL: &str = "Unassigned";

/// Whether a schema variant has a semantic version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AssignmentStatus {
    Assigned,
    Unassigned,
}

impl AssignmentStatus {
    /// Derive the status from a raw version value.
    ///
    /// `Assigned` iff the version is present, non-empty and not the
    /// `"Unassigned"` sentinel.
    pub fn from_version(version: Option<&str>) -> Self {
        match normalize_version(version) {
            Some(_) => AssignmentStatus::Assigned,
            None => AssignmentStatus::Unassigned,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "Assigned",
            AssignmentStatus::Unassigned => "Unassigned",
        }
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map the sentinel and empty strings to `None`.
pub fn normalize_version(version: Option<&str>) -> Option<&str> {
    version.filter(|v| !v.is_empty() && *v != UNASSIGNED_SENTINEL)
}

/// One discovered schema-ID variant under a schema key, as returned by
/// `GET /api/v1/schemas/{key}/versions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaAssignment {
    pub schema_id: String,
    /// Status as reported by the registry. Informational only; see
    /// [`SchemaAssignment::status`].
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub producer_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl SchemaAssignment {
    /// Status derived from the version, never from the wire `status` field.
    pub fn status(&self) -> AssignmentStatus {
        AssignmentStatus::from_version(self.version.as_deref())
    }

    /// The version, with the sentinel mapped to `None`.
    pub fn assigned_version(&self) -> Option<&str> {
        normalize_version(self.version.as_deref())
    }
}

/// A table row derived from a [`SchemaAssignment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRow {
    pub id: String,
    pub status: AssignmentStatus,
    /// `None` for unassigned rows; never the sentinel.
    pub version: Option<String>,
    pub producers: ProducerSlots,
    pub last_seen: Option<DateTime<Utc>>,
}

impl SchemaRow {
    pub fn is_assigned(&self) -> bool {
        self.status == AssignmentStatus::Assigned
    }

    pub fn producer_count(&self) -> u64 {
        self.producers.len()
    }
}

/// One unknown slot per producer of a row.
///
/// The assignment listing only reports a count, so identities are unknown.
/// Only the count is stored; slots are produced lazily by [`iter`](Self::iter).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ProducerSlots(u64);

impl ProducerSlots {
    pub fn new(count: u64) -> Self {
        Self(count)
    }

    pub fn len(&self) -> u64 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Yields `None` once per producer.
    pub fn iter(&self) -> impl Iterator<Item = Option<Producer>> {
        let count = usize::try_from(self.0).unwrap_or(usize::MAX);
        std::iter::repeat_with(|| None).take(count)
    }
}

impl From<&SchemaAssignment> for SchemaRow {
    fn from(item: &SchemaAssignment) -> Self {
        let version = item.assigned_version().map(str::to_string);
        let status = if version.is_some() {
            AssignmentStatus::Assigned
        } else {
            AssignmentStatus::Unassigned
        };
        Self {
            id: item.schema_id.clone(),
            status,
            version,
            producers: ProducerSlots::new(item.producer_count),
            last_seen: item.last_seen,
        }
    }
}

/// Request body for `POST /api/v1/schemas/{key}/versions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignVersionRequest {
    pub schema_id: String,
    pub version: String,
    pub description: String,
}

/// Success payload of a version assignment. The registry echoes the
/// assignment it stored; all fields are optional so that a bare `{}` or an
/// empty body still counts as success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignVersionResponse {
    #[serde(default)]
    pub schema_id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assignment(version: Option<&str>, producers: u64) -> SchemaAssignment {
        SchemaAssignment {
            schema_id: "abc123".into(),
            status: String::new(),
            version: version.map(String::from),
            producer_count: producers,
            last_seen: None,
        }
    }

    #[test]
    fn test_status_derivation() {
        assert_eq!(
            assignment(Some("1.0.0"), 0).status(),
            AssignmentStatus::Assigned
        );
        assert_eq!(
            assignment(Some("Unassigned"), 0).status(),
            AssignmentStatus::Unassigned
        );
        assert_eq!(assignment(Some(""), 0).status(), AssignmentStatus::Unassigned);
        assert_eq!(assignment(None, 0).status(), AssignmentStatus::Unassigned);
    }

    #[test]
    fn test_row_mapping() {
        let row = SchemaRow::from(&assignment(Some("Unassigned"), 3));
        assert_eq!(row.id, "abc123");
        assert_eq!(row.version, None);
        assert!(!row.is_assigned());
        assert_eq!(row.producer_count(), 3);

        let row = SchemaRow::from(&assignment(Some("1.2.0"), 0));
        assert_eq!(row.version.as_deref(), Some("1.2.0"));
        assert!(row.is_assigned());
        assert!(row.producers.is_empty());
    }

    #[test]
    fn test_huge_producer_count_is_not_allocated() {
        let item: SchemaAssignment = serde_json::from_value(json!({
            "schemaId": "s",
            "producerCount": u64::MAX,
        }))
        .unwrap();
        let row = SchemaRow::from(&item);
        assert_eq!(row.producer_count(), u64::MAX);
        assert_eq!(row.producers.iter().take(3).count(), 3);
        assert!(row.producers.iter().take(3).all(|p| p.is_none()));
    }

    #[test]
    fn test_wire_status_is_not_trusted() {
        let item: SchemaAssignment = serde_json::from_value(json!({
            "schemaId": "s1",
            "status": "Assigned",
            "version": "Unassigned",
            "producerCount": 2,
            "lastSeen": "2025-03-01T12:00:00Z",
        }))
        .unwrap();
        assert_eq!(item.status(), AssignmentStatus::Unassigned);
        assert!(item.last_seen.is_some());
    }

    #[test]
    fn test_request_wire_format() {
        let req = AssignVersionRequest {
            schema_id: "s1".into(),
            version: "1.0.0".into(),
            description: "initial".into(),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"schemaId": "s1", "version": "1.0.0", "description": "initial"})
        );
    }
}
