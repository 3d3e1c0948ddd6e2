//! Authenticated OpenStack session
//!
//! Authenticates against Keystone v3 with a password, keeps the token and
//! resolves the service endpoints from the catalog. All service modules go
//! through the request helpers here.

use crate::config::OpenStackConfig;
use futures::{Stream, TryStreamExt};
use osctl_core::{ControlPlaneError, Result};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

/// Per-request HTTP timeout
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Service catalog types used by osctl
pub const SERVICE_LOAD_BALANCER: &str = "load-balancer";
pub const SERVICE_COMPUTE: &str = "compute";
pub const SERVICE_IMAGE: &str = "image";
pub const SERVICE_NETWORK: &str = "network";

/// Endpoint URLs resolved from the Keystone catalog
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub identity: String,
    pub octavia: String,
    pub nova: String,
    pub glance: String,
    pub neutron: String,
}

/// Authenticated client for the OpenStack services osctl uses
///
/// Cheap to share: `reqwest::Client` is reference counted internally and
/// every call is an independent request.
#[derive(Clone)]
pub struct OpenStack {
    http: reqwest::Client,
    token: String,
    endpoints: Endpoints,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    token: Token,
}

#[derive(Debug, Deserialize)]
struct Token {
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CatalogEntry {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CatalogEndpoint {
    pub interface: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub region_id: Option<String>,
    pub url: String,
}

impl OpenStack {
    /// Authenticate and build a client
    pub async fn connect(config: &OpenStackConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(transport)?;

        let identity = identity_url(&config.auth_url);
        let url = join(&identity, "auth/tokens");
        debug!(url = %url, user = %config.username, "Authenticating");

        let response = http
            .post(&url)
            .json(&auth_request(config))
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ControlPlaneError::Auth(format!("HTTP {status}: {body}")));
        }

        let token = response
            .headers()
            .get("X-Subject-Token")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ControlPlaneError::Auth("response has no X-Subject-Token".into()))?;

        let body: TokenBody = response.json().await.map_err(decode)?;
        let region = config.region.as_str();
        let endpoints = Endpoints {
            identity,
            octavia: endpoint(&body.token.catalog, SERVICE_LOAD_BALANCER, region)?,
            nova: endpoint(&body.token.catalog, SERVICE_COMPUTE, region)?,
            glance: endpoint(&body.token.catalog, SERVICE_IMAGE, region)?,
            neutron: endpoint(&body.token.catalog, SERVICE_NETWORK, region)?,
        };

        debug!(?endpoints, "OpenStack client initialized");

        Ok(Self {
            http,
            token,
            endpoints,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("X-Auth-Token", &self.token)
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => ControlPlaneError::NotFound(url.to_string()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ControlPlaneError::Auth(format!("HTTP {status} on {url}: {body}"))
            }
            _ => ControlPlaneError::Api {
                status: status.as_u16(),
                body,
            },
        })
    }

    /// GET and decode a JSON body
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.get_with_query(url, &[]).await
    }

    /// GET with URL-encoded query parameters
    pub(crate) async fn get_with_query<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self.send(self.get_request(url, query), url).await?;
        response.json().await.map_err(decode)
    }

    fn get_request(&self, url: &str, query: &[(&str, &str)]) -> RequestBuilder {
        let request = self.request(Method::GET, url);
        if query.is_empty() {
            request
        } else {
            request.query(query)
        }
    }

    /// PUT without a body; the response body is ignored
    pub(crate) async fn put_empty(&self, url: &str) -> Result<()> {
        self.send(self.request(Method::PUT, url), url).await?;
        Ok(())
    }

    /// Follow `next` links starting at `url`, yielding every item of `collection`
    ///
    /// `query` applies to the first page only; `next` links carry their own.
    pub(crate) fn paginate<'a>(
        &'a self,
        url: String,
        query: &'a [(&'a str, &'a str)],
        collection: &'a str,
    ) -> Pin<Box<dyn Stream<Item = Result<Value>> + Send + 'a>> {
        Box::pin(async_stream::try_stream! {
            let mut next = Some(url);
            let mut query = query;
            while let Some(url) = next.take() {
                let page: Value = self.get_with_query(&url, query).await?;
                query = &[];
                let items = page
                    .get(collection)
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                let done = items.is_empty();
                for item in items {
                    yield item;
                }
                next = if done { None } else { next_link(&page, collection) };
            }
        })
    }

    /// Drain [`paginate`](Self::paginate) and decode every item
    pub(crate) async fn list_all<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, &str)],
        collection: &str,
    ) -> Result<Vec<T>> {
        let items: Vec<Value> = self.paginate(url, query, collection).try_collect().await?;
        items
            .into_iter()
            .map(|item| {
                serde_json::from_value(item).map_err(|e| ControlPlaneError::Decode(e.to_string()))
            })
            .collect()
    }
}

impl std::fmt::Debug for OpenStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenStack")
            .field("token", &"<redacted>")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

fn auth_request(config: &OpenStackConfig) -> Value {
    let domain = config.domain();
    let mut auth = json!({
        "identity": {
            "methods": ["password"],
            "password": {
                "user": {
                    "name": config.username,
                    "domain": { "name": domain },
                    "password": config.password,
                }
            }
        }
    });
    if !config.project_name.is_empty() {
        auth["scope"] = json!({
            "project": {
                "name": config.project_name,
                "domain": { "name": domain },
            }
        });
    }
    json!({ "auth": auth })
}

/// Keystone v3 base URL from whatever the operator passed as auth URL
pub(crate) fn identity_url(auth_url: &str) -> String {
    let trimmed = auth_url.trim_end_matches('/');
    if trimmed.ends_with("/v3") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/v3")
    }
}

/// Pick the public endpoint of a service, honouring the region if set
pub(crate) fn endpoint(catalog: &[CatalogEntry], service_type: &str, region: &str) -> Result<String> {
    catalog
        .iter()
        .filter(|entry| entry.service_type == service_type)
        .flat_map(|entry| entry.endpoints.iter())
        .find(|ep| {
            ep.interface == "public"
                && (region.is_empty()
                    || ep.region.as_deref() == Some(region)
                    || ep.region_id.as_deref() == Some(region))
        })
        .map(|ep| ep.url.trim_end_matches('/').to_string())
        .ok_or_else(|| {
            ControlPlaneError::Endpoint(format!(
                "failed to find {service_type} endpoint for region {region:?}"
            ))
        })
}

/// `next` link of a list response, Octavia or Keystone style
pub(crate) fn next_link(page: &Value, collection: &str) -> Option<String> {
    let octavia = page
        .get(format!("{collection}_links"))
        .and_then(Value::as_array)
        .and_then(|links| {
            links
                .iter()
                .find(|l| l.get("rel").and_then(Value::as_str) == Some("next"))
        })
        .and_then(|l| l.get("href"))
        .and_then(Value::as_str);

    let keystone = page
        .get("links")
        .and_then(|l| l.get("next"))
        .and_then(Value::as_str);

    octavia.or(keystone).map(str::to_string)
}

pub(crate) fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn transport(e: reqwest::Error) -> ControlPlaneError {
    ControlPlaneError::Transport(e.to_string())
}

fn decode(e: reqwest::Error) -> ControlPlaneError {
    ControlPlaneError::Decode(e.to_string())
}
