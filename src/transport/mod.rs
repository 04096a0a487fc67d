#[cfg(feature = "reqwest-transport")]
pub(crate) mod http;

#[cfg(feature = "reqwest-transport")]
pub(crate) use self::http::HttpTransport;

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Request method. The registry API only needs two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query string pairs, in order. Keys may repeat.
pub type Query = Vec<(String, String)>;

/// Future returned by [`Transport::request`].
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = crate::Result<Option<serde_json::Value>>> + Send + 'a>>;

/// Future returned by [`Transport::download`].
pub type DownloadFuture<'a> =
    Pin<Box<dyn Future<Output = crate::Result<Option<Download>>> + Send + 'a>>;

/// A binary response body, such as an exported archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub content_type: Option<String>,
    /// File name from `Content-Disposition`, if the registry sent one.
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// How the [`Client`](crate::Client) reaches the registry.
///
/// Object-safe so clients can hold any implementation behind
/// [`DynTransport`]. With the `reqwest-transport` feature the builder uses
/// an HTTP implementation; supply your own to resolve paths against the
/// serving origin or to stay in memory.
///
/// # Example
///
/// ```rust,no_run
/// use tallycat::transport::{Method, Query, Transport, TransportFuture};
///
/// #[derive(Debug)]
/// struct SameOriginTransport;
///
/// impl Transport for SameOriginTransport {
///     fn request(
///         &self,
///         method: Method,
///         path: &str,
///         query: Query,
///         body: Option<serde_json::Value>,
///     ) -> TransportFuture<'_> {
///         Box::pin(async move {
///             // answer from a cache, a proxy, ...
///             Ok::<_, tallycat::RegistryError>(None)
///         })
///     }
/// }
/// ```
pub trait Transport: Send + Sync + Debug {
    /// Send a request with the given method, path, query and optional JSON body.
    ///
    /// - `path` is absolute from the registry origin (e.g. `/api/v1/schemas`)
    ///   with every dynamic segment already percent-encoded.
    /// - Returns `Ok(Some(value))` for responses with a body, `Ok(None)` for
    ///   empty responses, and [`RegistryError::Api`](crate::RegistryError::Api)
    ///   for any non-2xx status.
    fn request(
        &self,
        method: Method,
        path: &str,
        query: Query,
        body: Option<serde_json::Value>,
    ) -> TransportFuture<'_>;

    /// GET a binary body. `Ok(None)` for `204 No Content`.
    ///
    /// Transports that only speak JSON keep the default, which fails with
    /// [`RegistryError::Unsupported`](crate::RegistryError::Unsupported).
    fn download(&self, path: &str, query: Query) -> DownloadFuture<'_> {
        let _ = query;
        let path = path.to_string();
        Box::pin(async move {
            Err(crate::RegistryError::Unsupported(format!(
                "binary download of {}",
                path
            )))
        })
    }
}

/// Shared transport handle held by every [`Client`](crate::Client) clone.
pub type DynTransport = Arc<dyn Transport>;

// ---------------------------------------------------------------------------
// Typed request helpers
// ---------------------------------------------------------------------------

pub(crate) async fn transport_get<T: serde::de::DeserializeOwned>(
    transport: &DynTransport,
    path: &str,
    query: Query,
) -> crate::Result<T> {
    let value = transport.request(Method::Get, path, query, None).await?;
    deserialize_response(value)
}

/// POST `body`; an empty success body yields `T::default()`.
pub(crate) async fn transport_post<B, T>(
    transport: &DynTransport,
    path: &str,
    body: &B,
) -> crate::Result<T>
where
    B: serde::Serialize,
    T: serde::de::DeserializeOwned + Default,
{
    let body = serde_json::to_value(body)?;
    match transport
        .request(Method::Post, path, Vec::new(), Some(body))
        .await?
    {
        Some(value) => deserialize_response(Some(value)),
        None => Ok(T::default()),
    }
}

fn deserialize_response<T: serde::de::DeserializeOwned>(
    value: Option<serde_json::Value>,
) -> crate::Result<T> {
    match value {
        Some(v) => serde_json::from_value(v).map_err(|e| {
            crate::RegistryError::Serialization(format!("failed to parse response: {}", e))
        }),
        None => Err(crate::RegistryError::Serialization(
            "empty response body".to_string(),
        )),
    }
}

/// File name of an `attachment; filename=...` header value.
#[cfg_attr(not(feature = "reqwest-transport"), allow(dead_code))]
pub(crate) fn attachment_file_name(disposition: &str) -> Option<String> {
    disposition
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

/// Percent-encode a single path segment.
pub(crate) fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}
