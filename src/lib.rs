#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::map_unwrap_or)]
//! # tallycat
//!
//! Client and governance workflows for the tallycat telemetry schema
//! registry. The registry discovers telemetry schemas (metrics, logs, spans,
//! profiles) from live traffic; operators review the discovered variants of
//! each schema and assign them semantic versions.
//!
//! ## Quick Start
//!
//! ### Browsing assignments
//!
//! ```rust,no_run
//! use tallycat::{AssignmentStatus, AssignmentViewModel, Client};
//!
//! # #[tokio::main]
//! # async fn main() -> tallycat::Result<()> {
//! let client = Client::builder()
//!     .url("http://localhost:8080")
//!     .build()?;
//!
//! let vm = AssignmentViewModel::new(client, "http.server.duration");
//! vm.set_status(vec![AssignmentStatus::Unassigned]).await;
//!
//! for row in vm.table_data() {
//!     println!("{} -> {}", row.id, row.version.as_deref().unwrap_or("Unassigned"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Assigning a version
//!
//! ```rust,no_run
//! use tallycat::{AssignmentViewModel, Client, SubmitOutcome, VersionAssignmentWorkflow};
//!
//! # #[tokio::main]
//! # async fn main() -> tallycat::Result<()> {
//! # let client = Client::builder().url("http://localhost:8080").build()?;
//! let vm = AssignmentViewModel::new(client, "http.server.duration");
//! vm.refresh().await;
//!
//! let mut workflow = VersionAssignmentWorkflow::new();
//! if let Some(row) = vm.table_data().first() {
//!     workflow.assign_version(row);
//!     workflow.set_version("1.0.0");
//!     workflow.set_description("Initial stable release");
//!
//!     match workflow.submit(&vm).await {
//!         SubmitOutcome::Assigned { .. } => println!("assigned"),
//!         other => println!("not assigned: {:?}", other),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod assignment;
pub mod catalog;
pub mod client;
pub mod config;
pub mod definition;
pub mod errors;
pub mod query;
pub mod schema;
#[cfg(feature = "testing")]
#[cfg_attr(docsrs, doc(cfg(feature = "testing")))]
pub mod testing;
pub mod transport;
pub mod version;
pub mod view_model;
pub mod weaver;
pub mod workflow;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use assignment::{
    AssignVersionRequest, AssignVersionResponse, AssignmentStatus, ProducerSlots, SchemaAssignment,
    SchemaRow,
};
pub use catalog::CatalogQuery;
pub use client::{Client, ClientBuilder};
pub use config::{ConnectionConfig, Environment};
pub use definition::{AttributeFilter, AttributeSection, RequiredAttributes, SchemaDefinition};
pub use errors::{ApiError, RegistryError, Result};
pub use query::{
    ListAssignmentsParams, ListHistoryParams, ListSchemasParams, SortDirection, SortField,
};
pub use schema::{Attribute, ListResponse, Producer, Telemetry, TelemetryHistory, TelemetryType};
pub use transport::{Download, DynTransport, Method as TransportMethod, Transport};
pub use version::VersionValidation;
pub use view_model::{AssignmentViewModel, FetchOutcome, QueryError, ViewStatus};
pub use weaver::{MetricGroup, WeaverRegistry};
pub use workflow::{AssignmentForm, SubmitOutcome, VersionAssignmentWorkflow, WorkflowState};
