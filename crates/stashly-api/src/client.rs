// Async REST client for a single remote entity resource.
//
// Conventions:
//   GET    {collection_url}            -> all entities
//   GET    {collection_url}?{query}    -> filtered entities
//   GET    {entity_url}{key}           -> one entity
//   POST   {entity_url}                -> saved entity (server may assign the key)
//   PUT    {entity_url}{key}           -> amended entity, or empty body
//   DELETE {entity_url}{key}           -> empty body

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{Error, HttpMethod};
use crate::transport::TransportConfig;

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

// ── Resource URLs ────────────────────────────────────────────────────

/// The pair of URLs a resource is served from.
///
/// Both always end with `/` so that keys and relative paths join cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUrls {
    entity: Url,
    collection: Url,
}

impl ResourceUrls {
    /// Join an entity path and a collection path onto a root URL.
    ///
    /// `ResourceUrls::new(&"https://host/api".parse()?, "hero", "heroes")`
    /// yields `https://host/api/hero/` and `https://host/api/heroes/`.
    pub fn new(root: &Url, entity_path: &str, collection_path: &str) -> Result<Self, Error> {
        let root = with_trailing_slash(root.clone());
        let entity = with_trailing_slash(root.join(entity_path.trim_matches('/'))?);
        let collection = with_trailing_slash(root.join(collection_path.trim_matches('/'))?);
        Ok(Self { entity, collection })
    }

    pub fn entity(&self) -> &Url {
        &self.entity
    }

    pub fn collection(&self) -> &Url {
        &self.collection
    }

    /// The entity URL with `key` appended as one percent-encoded path
    /// segment, so keys holding `/`, `?` or `:` cannot escape the resource.
    pub fn entity_with_key(&self, key: &str) -> Result<Url, Error> {
        if key.is_empty() || key == "." || key == ".." {
            return Err(Error::InvalidKey(key.to_owned()));
        }
        let mut url = self.entity.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidKey(key.to_owned()))?
            .pop_if_empty()
            .push(key);
        Ok(url)
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for one REST resource.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    urls: ResourceUrls,
}

impl RestClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a transport config and the resource's URLs.
    pub fn new(urls: ResourceUrls, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, urls })
    }

    /// Wrap an existing `reqwest::Client` (caller manages headers and TLS).
    pub fn with_client(http: reqwest::Client, urls: ResourceUrls) -> Self {
        Self { http, urls }
    }

    pub fn urls(&self) -> &ResourceUrls {
        &self.urls
    }

    // ── Resource operations ──────────────────────────────────────────

    /// Fetch every entity of the collection.
    pub async fn get_all(&self) -> Result<Vec<Value>, Error> {
        let url = self.urls.collection.clone();
        self.get(url, &[]).await
    }

    /// Fetch entities matching structured query parameters.
    pub async fn get_with_query(&self, params: &[(String, String)]) -> Result<Vec<Value>, Error> {
        let url = self.urls.collection.clone();
        self.get(url, params).await
    }

    /// Fetch entities matching a pre-formatted query string (`name=a&x=1`).
    pub async fn get_with_raw_query(&self, query: &str) -> Result<Vec<Value>, Error> {
        let mut url = self.urls.collection.clone();
        let query = query.trim_start_matches('?');
        if !query.is_empty() {
            url.set_query(Some(query));
        }
        self.get(url, &[]).await
    }

    /// Fetch a single entity by key.
    pub async fn get_by_id(&self, key: &str) -> Result<Value, Error> {
        let url = self.urls.entity_with_key(key)?;
        self.get(url, &[]).await
    }

    /// Create an entity; the server returns the saved entity.
    pub async fn add<B: Serialize + Sync>(&self, entity: &B) -> Result<Value, Error> {
        let url = self.urls.entity.clone();
        debug!("POST {url}");

        let resp = self
            .http
            .post(url.clone())
            .json(entity)
            .send()
            .await
            .map_err(|source| request_error(HttpMethod::Post, &url, source))?;
        handle_response(HttpMethod::Post, &url, resp).await
    }

    /// Replace an entity's fields. Returns the server's amended entity, or
    /// `None` when the server answers with an empty body.
    pub async fn update<B: Serialize + Sync>(
        &self,
        key: &str,
        changes: &B,
    ) -> Result<Option<Value>, Error> {
        let url = self.urls.entity_with_key(key)?;
        debug!("PUT {url}");

        let resp = self
            .http
            .put(url.clone())
            .json(changes)
            .send()
            .await
            .map_err(|source| request_error(HttpMethod::Put, &url, source))?;
        handle_optional(HttpMethod::Put, &url, resp).await
    }

    /// Delete an entity by key.
    pub async fn delete(&self, key: &str) -> Result<(), Error> {
        let url = self.urls.entity_with_key(key)?;
        debug!("DELETE {url}");

        let resp = self
            .http
            .delete(url.clone())
            .send()
            .await
            .map_err(|source| request_error(HttpMethod::Delete, &url, source))?;
        handle_optional::<Value>(HttpMethod::Delete, &url, resp)
            .await
            .map(|_| ())
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(String, String)],
    ) -> Result<T, Error> {
        if params.is_empty() {
            debug!("GET {url}");
        } else {
            debug!("GET {url} params={params:?}");
        }

        let resp = self
            .http
            .get(url.clone())
            .query(params)
            .send()
            .await
            .map_err(|source| request_error(HttpMethod::Get, &url, source))?;
        handle_response(HttpMethod::Get, &url, resp).await
    }
}

// ── Response handling ────────────────────────────────────────────────

fn request_error(method: HttpMethod, url: &Url, source: reqwest::Error) -> Error {
    Error::Request {
        method,
        url: url.to_string(),
        source,
    }
}

async fn read_body(method: HttpMethod, url: &Url, resp: reqwest::Response) -> Result<String, Error> {
    resp.text()
        .await
        .map_err(|source| request_error(method, url, source))
}

async fn handle_response<T: DeserializeOwned>(
    method: HttpMethod,
    url: &Url,
    resp: reqwest::Response,
) -> Result<T, Error> {
    let status = resp.status();
    if !status.is_success() {
        return Err(parse_error(method, url, status, resp).await);
    }
    let body = read_body(method, url, resp).await?;
    decode(method, url, body)
}

async fn handle_optional<T: DeserializeOwned>(
    method: HttpMethod,
    url: &Url,
    resp: reqwest::Response,
) -> Result<Option<T>, Error> {
    let status = resp.status();
    if !status.is_success() {
        return Err(parse_error(method, url, status, resp).await);
    }
    let body = read_body(method, url, resp).await?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    decode(method, url, body).map(Some)
}

fn decode<T: DeserializeOwned>(method: HttpMethod, url: &Url, body: String) -> Result<T, Error> {
    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            method,
            url: url.to_string(),
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}

async fn parse_error(
    method: HttpMethod,
    url: &Url,
    status: reqwest::StatusCode,
    resp: reqwest::Response,
) -> Error {
    let raw = resp.text().await.unwrap_or_default();

    let message = match serde_json::from_str::<ErrorResponse>(&raw) {
        Ok(ErrorResponse {
            message: Some(message),
            ..
        }) => message,
        Ok(ErrorResponse {
            error: Some(error), ..
        }) => error,
        _ if raw.trim().is_empty() => status.to_string(),
        _ => raw,
    };

    Error::Http {
        method,
        url: url.to_string(),
        status: status.as_u16(),
        message,
    }
}
