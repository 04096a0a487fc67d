//! Attribute definition of a schema, grouped the way the console shows it:
//! resource attributes, instrumentation scope attributes and the
//! signal's own data attributes.

use std::collections::BTreeSet;

use crate::schema::{Attribute, Telemetry, TelemetryType};

/// Group an attribute belongs to, derived from its `source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeSection {
    Resource,
    Scope,
    Data,
}

impl AttributeSection {
    /// Case-insensitive: the registry reports both `datapoint` and
    /// `DataPoint`. `None` for sources the definition view does not show.
    pub fn from_source(source: &str) -> Option<Self> {
        match source.to_ascii_lowercase().as_str() {
            "resource" => Some(AttributeSection::Resource),
            "scope" => Some(AttributeSection::Scope),
            "datapoint" | "log" | "span" | "profile" => Some(AttributeSection::Data),
            _ => None,
        }
    }

    pub fn title(&self, telemetry_type: TelemetryType) -> &'static str {
        match self {
            AttributeSection::Resource => "Resource Attributes",
            AttributeSection::Scope => "Instrumentation Scope",
            AttributeSection::Data => data_section_name(telemetry_type),
        }
    }
}

/// Heading of the data section for a telemetry type.
pub fn data_section_name(telemetry_type: TelemetryType) -> &'static str {
    match telemetry_type {
        TelemetryType::Metric => "Metric Data",
        TelemetryType::Log => "Log Record",
        TelemetryType::Span => "Span",
        TelemetryType::Profile => "Data",
    }
}

/// Which attributes count as required, per section.
///
/// The registry does not report requiredness yet. The default marks only
/// `service.name` on the resource as required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredAttributes {
    entries: BTreeSet<(AttributeSection, String)>,
}

impl Default for RequiredAttributes {
    fn default() -> Self {
        Self::none().with(AttributeSection::Resource, "service.name")
    }
}

impl RequiredAttributes {
    /// Nothing is required.
    pub fn none() -> Self {
        Self {
            entries: BTreeSet::new(),
        }
    }

    pub fn with(mut self, section: AttributeSection, name: impl Into<String>) -> Self {
        self.entries.insert((section, name.into()));
        self
    }

    pub fn is_required(&self, section: AttributeSection, name: &str) -> bool {
        self.entries.contains(&(section, name.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeFilter {
    #[default]
    All,
    Required,
    Optional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedAttribute {
    pub section: AttributeSection,
    pub name: String,
    pub attribute_type: String,
    pub brief: Option<String>,
    pub required: bool,
}

impl DefinedAttribute {
    fn matches(&self, needle: &str, filter: AttributeFilter) -> bool {
        let matches_search = needle.is_empty()
            || self.name.to_lowercase().contains(needle)
            || self
                .brief
                .as_deref()
                .is_some_and(|b| b.to_lowercase().contains(needle));

        matches_search
            && match filter {
                AttributeFilter::All => true,
                AttributeFilter::Required => self.required,
                AttributeFilter::Optional => !self.required,
            }
    }
}

/// The attributes of one schema, classified by section and requiredness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDefinition {
    telemetry_type: TelemetryType,
    attributes: Vec<DefinedAttribute>,
}

impl SchemaDefinition {
    pub fn new(telemetry: &Telemetry, required: &RequiredAttributes) -> Self {
        Self::from_attributes(telemetry.telemetry_type, &telemetry.attributes, required)
    }

    pub fn from_attributes(
        telemetry_type: TelemetryType,
        attributes: &[Attribute],
        required: &RequiredAttributes,
    ) -> Self {
        let mut attributes: Vec<DefinedAttribute> = attributes
            .iter()
            .filter_map(|attr| {
                let section = AttributeSection::from_source(&attr.source)?;
                Some(DefinedAttribute {
                    section,
                    name: attr.name.clone(),
                    attribute_type: attr.attribute_type.clone(),
                    brief: attr.brief.clone(),
                    required: required.is_required(section, &attr.name),
                })
            })
            .collect();
        attributes.sort_by(|a, b| (a.section, &a.name).cmp(&(b.section, &b.name)));

        Self {
            telemetry_type,
            attributes,
        }
    }

    pub fn telemetry_type(&self) -> TelemetryType {
        self.telemetry_type
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Attributes of `section` matching a case-insensitive search on name or
    /// brief, and the requiredness filter.
    pub fn section(
        &self,
        section: AttributeSection,
        search: &str,
        filter: AttributeFilter,
    ) -> Vec<&DefinedAttribute> {
        let needle = search.to_lowercase();
        self.attributes
            .iter()
            .filter(|a| a.section == section && a.matches(&needle, filter))
            .collect()
    }
}
