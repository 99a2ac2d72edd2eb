// Async HTTP client for the timetable REST backend.
//
// Every collection speaks the same dialect:
//   GET    {base}/{path}?limit&offset&<filters>   -> JSON array
//   POST   {base}/{path}                          <- JSON body
//   PUT    {base}/{path}/{id}                     <- JSON body
//   DELETE {base}/{path}/{id,id,...}
//
// plus `GET {base}/accessKey/generate` for issuing registration keys.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::resources::{QueryFilter, Resource};
use crate::transport::TransportConfig;
use crate::types::AccessKeyResponse;

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the timetable backend.
///
/// Cheap to share behind an `Arc`; `reqwest::Client` pools connections
/// internally.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL and transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            timeout: transport.timeout,
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages headers and timeouts).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            timeout: TransportConfig::default().timeout,
        })
    }

    /// Ensure the base URL ends with `/` so relative joins append
    /// instead of replacing the last segment.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.handle_response(resp).await
    }

    async fn post_no_response<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.handle_empty(resp).await
    }

    async fn put_no_response<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self
            .http
            .put(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.handle_empty(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }

    async fn handle_response<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await.map_err(|e| self.transport_error(e))?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|err| err.message)
            .unwrap_or_else(|| if raw.is_empty() { status.to_string() } else { raw });

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::Authentication { message };
        }

        Error::Http {
            status: status.as_u16(),
            message,
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Fetch one slice of a collection.
    ///
    /// `limit` and `offset` are only sent when non-zero; the backend
    /// treats a missing limit as "everything".
    pub async fn list<R: Resource>(
        &self,
        limit: u64,
        offset: u64,
        filter: &R::Filter,
    ) -> Result<Vec<R::Response>, Error> {
        let mut params = Vec::new();
        if limit > 0 {
            params.push(("limit", limit.to_string()));
        }
        if offset > 0 {
            params.push(("offset", offset.to_string()));
        }
        params.extend(filter.query_params());

        self.get_with_params(R::PATH, &params).await
    }

    /// Create a new record.
    pub async fn create<R: Resource>(&self, request: &R::Request) -> Result<(), Error> {
        self.post_no_response(R::PATH, request).await
    }

    /// Replace an existing record.
    pub async fn update<R: Resource>(&self, id: i64, request: &R::Request) -> Result<(), Error> {
        self.put_no_response(&format!("{}/{id}", R::PATH), request).await
    }

    /// Delete several records in one call.
    pub async fn delete_many<R: Resource>(&self, ids: &[i64]) -> Result<(), Error> {
        let joined = ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
        self.delete(&format!("{}/{joined}", R::PATH)).await
    }

    /// Ask the backend to issue a new access key.
    pub async fn generate_access_key(&self) -> Result<AccessKeyResponse, Error> {
        self.get_with_params("accessKey/generate", &[]).await
    }
}
