use crate::assignment::{AssignVersionRequest, AssignVersionResponse, SchemaAssignment};
use crate::config::ConnectionConfig;
use crate::errors::RegistryError;
use crate::query::{ListAssignmentsParams, ListHistoryParams, ListSchemasParams};
use crate::schema::{ListResponse, Telemetry, TelemetryHistory};
use crate::transport::{self, segment, Download, DynTransport};
use std::collections::HashMap;
use std::time::Duration;

/// Path prefix of every registry endpoint.
pub const API_BASE_PATH: &str = "/api/v1";

/// Joins producer name and version in the producer export path.
pub const PRODUCER_VERSION_SEPARATOR: &str = "---";

const WEAVER_ARCHIVE: &str = "weaver-schema.zip";

// ---------------------------------------------------------------------------
// Client builder
// ---------------------------------------------------------------------------

/// Builder for constructing a registry [`Client`].
pub struct ClientBuilder {
    url: Option<String>,
    auth_token: Option<String>,
    headers: HashMap<String, String>,
    timeout: Option<Duration>,
    transport: Option<DynTransport>,
    #[cfg(feature = "reqwest-transport")]
    http_client: Option<reqwest::Client>,
}

impl ClientBuilder {
    fn new() -> Self {
        Self {
            url: None,
            auth_token: None,
            headers: HashMap::new(),
            timeout: None,
            transport: None,
            #[cfg(feature = "reqwest-transport")]
            http_client: None,
        }
    }

    /// Set the registry base URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Apply every setting of a [`ConnectionConfig`].
    pub fn connection(mut self, config: ConnectionConfig) -> Self {
        self.url = Some(config.base_url);
        self.auth_token = config.auth_token.or(self.auth_token);
        self.headers.extend(config.headers);
        self.timeout = config.timeout.or(self.timeout);
        self
    }

    /// Set the authentication bearer token.
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Add a custom HTTP header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the per-request timeout. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a custom transport instead of HTTP. The URL, token, headers and
    /// timeout settings are ignored in that case.
    pub fn transport(mut self, transport: DynTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Provide a custom reqwest HTTP client.
    #[cfg(feature = "reqwest-transport")]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Build the client.
    ///
    /// The HTTP transport needs an absolute base URL: the empty production
    /// default only makes sense with a custom transport that resolves paths
    /// against the serving origin.
    pub fn build(self) -> crate::Result<Client> {
        if let Some(transport) = self.transport {
            return Ok(Client { transport });
        }

        #[cfg(feature = "reqwest-transport")]
        {
            let url = self
                .url
                .filter(|u| !u.trim().is_empty())
                .ok_or_else(|| RegistryError::Builder("url is required".into()))?;

            let transport = transport::HttpTransport::new(
                &url,
                transport::http::TransportConfig {
                    auth_token: self.auth_token,
                    headers: self.headers,
                    timeout: self.timeout,
                    http_client: self.http_client,
                },
            );

            Ok(Client {
                transport: std::sync::Arc::new(transport),
            })
        }

        #[cfg(not(feature = "reqwest-transport"))]
        {
            Err(RegistryError::Builder(
                "a transport is required when reqwest-transport is disabled".into(),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// A client for the tallycat schema registry.
///
/// # Example
///
/// ```rust,no_run
/// use tallycat::{Client, ListAssignmentsParams};
///
/// # #[tokio::main]
/// # async fn main() -> tallycat::Result<()> {
/// let client = Client::builder()
///     .url("http://localhost:8080")
///     .build()?;
///
/// let page = client
///     .list_assignments("http.server.duration", &ListAssignmentsParams::new().search("abc"))
///     .await?;
/// println!("{} variants", page.total);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    transport: DynTransport,
}

impl Client {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    // -----------------------------------------------------------------------
    // Schema assignments
    // -----------------------------------------------------------------------

    /// List the discovered schema-ID variants of `schema_key`.
    ///
    /// Filtering and paging happen on the registry; the returned page is all
    /// the client knows about.
    pub async fn list_assignments(
        &self,
        schema_key: &str,
        params: &ListAssignmentsParams,
    ) -> crate::Result<ListResponse<SchemaAssignment>> {
        transport::transport_get(
            &self.transport,
            &versions_path(schema_key),
            params.to_query(),
        )
        .await
    }

    /// Assign or update the semantic version of one schema variant.
    ///
    /// The request is sent as-is; version validation is the caller's job
    /// (see [`crate::workflow`]).
    pub async fn assign_version(
        &self,
        schema_key: &str,
        request: &AssignVersionRequest,
    ) -> crate::Result<AssignVersionResponse> {
        let response =
            transport::transport_post(&self.transport, &versions_path(schema_key), request)
                .await?;

        tracing::info!(
            schema_key = %schema_key,
            schema_id = %request.schema_id,
            version = %request.version,
            "schema version assigned"
        );

        Ok(response)
    }

    // -----------------------------------------------------------------------
    // Schema catalog
    // -----------------------------------------------------------------------

    /// Get schema metadata, attributes and producers by key.
    pub async fn get_schema(&self, key: &str) -> crate::Result<Telemetry> {
        transport::transport_get(
            &self.transport,
            &format!("{}/schemas/{}", API_BASE_PATH, segment(key)),
            Vec::new(),
        )
        .await
    }

    /// List schemas of the catalog.
    pub async fn list_schemas(
        &self,
        params: &ListSchemasParams,
    ) -> crate::Result<ListResponse<Telemetry>> {
        transport::transport_get(
            &self.transport,
            &format!("{}/schemas", API_BASE_PATH),
            params.to_query(),
        )
        .await
    }

    /// Change history of a schema, one entry per version assignment.
    pub async fn list_history(
        &self,
        schema_key: &str,
        params: &ListHistoryParams,
    ) -> crate::Result<ListResponse<TelemetryHistory>> {
        transport::transport_get(
            &self.transport,
            &format!("{}/schemas/{}/history", API_BASE_PATH, segment(schema_key)),
            params.to_query(),
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Weaver export
    // -----------------------------------------------------------------------

    /// Download the Weaver definition of one schema variant as a zip
    /// archive holding `{schema_id}.yaml`.
    ///
    /// To render the YAML locally instead, see [`crate::weaver`].
    pub async fn export_weaver_schema(
        &self,
        schema_key: &str,
        schema_id: &str,
    ) -> crate::Result<Download> {
        let path = format!(
            "{}/{}/{}",
            versions_path(schema_key),
            segment(schema_id),
            WEAVER_ARCHIVE
        );
        self.transport
            .download(&path, Vec::new())
            .await?
            .ok_or_else(|| RegistryError::Serialization("empty response body".to_string()))
    }

    /// Download the Weaver definitions of every metric a producer emits.
    ///
    /// `Ok(None)` when the registry knows no metrics for that producer.
    pub async fn export_producer_weaver_schema(
        &self,
        producer_name: &str,
        producer_version: &str,
    ) -> crate::Result<Option<Download>> {
        let archive = self
            .transport
            .download(&producer_path(producer_name, producer_version), Vec::new())
            .await?;
        if archive.is_none() {
            tracing::debug!(
                producer = %producer_name,
                version = %producer_version,
                "producer has no metrics to export"
            );
        }
        Ok(archive)
    }
}

fn versions_path(schema_key: &str) -> String {
    format!("{}/schemas/{}/versions", API_BASE_PATH, segment(schema_key))
}

fn producer_path(name: &str, version: &str) -> String {
    let producer = format!("{}{}{}", name, PRODUCER_VERSION_SEPARATOR, version);
    format!(
        "{}/producers/{}/{}",
        API_BASE_PATH,
        segment(&producer),
        WEAVER_ARCHIVE
    )
}
