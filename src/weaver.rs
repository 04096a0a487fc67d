//! OpenTelemetry Weaver semantic convention export of metric schemas.
//!
//! A metric schema becomes one `metric` group whose attributes are the
//! schema's data point attributes. Resource and scope attributes are not
//! part of a Weaver metric definition and are left out.
//!
//! ```rust
//! use tallycat::weaver;
//! use tallycat::Telemetry;
//!
//! # fn main() -> tallycat::Result<()> {
//! let telemetry: Telemetry = serde_json::from_value(serde_json::json!({
//!     "schemaKey": "http.server.duration",
//!     "telemetryType": "Metric",
//!     "metricType": "Histogram",
//!     "metricUnit": "ms",
//!     "attributes": [{"name": "http.route", "type": "Str", "source": "DataPoint"}]
//! }))?;
//!
//! let yaml = weaver::generate_yaml(&telemetry)?;
//! assert!(yaml.contains("metric_name: http.server.duration"));
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::RegistryError;
use crate::schema::{Attribute, Telemetry, TelemetryType};

pub const GROUP_TYPE_METRIC: &str = "metric";
pub const DEFAULT_REQUIREMENT_LEVEL: &str = "recommended";

/// A Weaver registry file: a list of semantic convention groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaverRegistry {
    pub groups: Vec<MetricGroup>,
}

/// One `metric` group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricGroup {
    pub id: String,
    #[serde(rename = "type")]
    pub group_type: String,
    pub metric_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief: Option<String>,
    pub instrument: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub attributes: Vec<WeaverAttribute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaverAttribute {
    pub id: String,
    #[serde(rename = "type")]
    pub attribute_type: String,
    pub requirement_level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief: Option<String>,
}

impl MetricGroup {
    /// Group for a metric schema using its own attributes. `None` for
    /// non-metric schemas.
    pub fn from_telemetry(telemetry: &Telemetry) -> Option<Self> {
        Self::with_attributes(telemetry, &telemetry.attributes)
    }

    /// Group for a metric schema using the attributes of one of its
    /// variants instead of the schema's own.
    pub fn with_attributes(telemetry: &Telemetry, attributes: &[Attribute]) -> Option<Self> {
        if telemetry.telemetry_type != TelemetryType::Metric {
            return None;
        }
        Some(Self {
            id: format!("{}.{}", GROUP_TYPE_METRIC, telemetry.schema_key),
            group_type: GROUP_TYPE_METRIC.to_string(),
            metric_name: telemetry.schema_key.clone(),
            brief: non_empty(telemetry.brief.as_deref()),
            instrument: telemetry.metric_type.to_lowercase(),
            unit: non_empty(Some(telemetry.metric_unit.as_str())),
            attributes: attributes
                .iter()
                .filter(|a| a.source.eq_ignore_ascii_case("datapoint"))
                .map(WeaverAttribute::from)
                .collect(),
        })
    }
}

impl From<&Attribute> for WeaverAttribute {
    fn from(attr: &Attribute) -> Self {
        Self {
            id: attr.name.clone(),
            attribute_type: weaver_type(&attr.attribute_type).to_string(),
            requirement_level: non_empty(attr.requirement_level.as_deref())
                .map(|level| level.to_lowercase())
                .unwrap_or_else(|| DEFAULT_REQUIREMENT_LEVEL.to_string()),
            brief: non_empty(attr.brief.as_deref()),
        }
    }
}

impl WeaverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One group per metric schema; other telemetry types are skipped.
    pub fn from_telemetries<'a, I>(telemetries: I) -> Self
    where
        I: IntoIterator<Item = &'a Telemetry>,
    {
        Self {
            groups: telemetries
                .into_iter()
                .filter_map(MetricGroup::from_telemetry)
                .collect(),
        }
    }

    pub fn push(&mut self, group: MetricGroup) {
        self.groups.push(group);
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn to_yaml(&self) -> crate::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Parse a registry file, e.g. the YAML inside an exported archive.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// Weaver YAML for a single metric schema.
pub fn generate_yaml(telemetry: &Telemetry) -> crate::Result<String> {
    let group = MetricGroup::from_telemetry(telemetry).ok_or_else(|| {
        RegistryError::Unsupported(format!(
            "weaver export of {} schema {}",
            telemetry.telemetry_type, telemetry.schema_key
        ))
    })?;
    WeaverRegistry {
        groups: vec![group],
    }
    .to_yaml()
}

/// Download name of the YAML for `telemetry`.
pub fn file_name(telemetry: &Telemetry) -> String {
    format!("{}.yaml", telemetry.schema_key)
}

/// Map a registry attribute type to a Weaver type. Unknown types, maps and
/// bytes become `string`.
pub fn weaver_type(attribute_type: &str) -> &'static str {
    match attribute_type.to_ascii_lowercase().as_str() {
        "bool" | "boolean" => "boolean",
        "int" => "int",
        "double" => "double",
        "slice" => "string[]",
        _ => "string",
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(String::from)
}
