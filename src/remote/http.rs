//! REST implementation of [`RemoteStore`].
//!
//! One `HttpStore` serves one resource collection:
//!
//! - `GET    {base}/{resource}?pageNumber=&pageSize=&{filter}=…`
//! - `POST   {base}/{resource}`
//! - `PUT    {base}/{resource}/{id}`
//! - `DELETE {base}/{resource}/{id}`
//!
//! The bearer token is held in a [`SecretBox`] and is never logged.

use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretBox};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::{Config, ResourceConfig};
use crate::error::{Result, ShopdeskError};

use super::envelope::{decode_entity, decode_page};
use super::error::ApiError;
use super::{ListQuery, ListResult, MutationOutcome, MutationRequest, RemoteStore};

/// HTTP-backed store for a single resource.
pub struct HttpStore<T, P = T> {
    client: Client,
    base_url: Url,
    resource_path: String,
    token: Option<SecretBox<String>>,
    /// Query parameter carrying the search term, when the backend searches
    search_param: Option<String>,
    _marker: PhantomData<fn() -> (T, P)>,
}

impl<T, P> fmt::Debug for HttpStore<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpStore")
            .field("base_url", &self.base_url.as_str())
            .field("resource_path", &self.resource_path)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("search_param", &self.search_param)
            .finish()
    }
}

impl<T, P> HttpStore<T, P> {
    /// Create a store for `resource_path` under `base_url` with a 30s timeout.
    pub fn new(base_url: &str, resource_path: &str) -> Result<Self> {
        Self::with_timeout(base_url, resource_path, Duration::from_secs(30))
    }

    pub fn with_timeout(base_url: &str, resource_path: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ShopdeskError::Config(format!(
                "api.base_url '{base_url}' cannot be used as a base URL"
            )));
        }

        let resource_path = resource_path.trim_matches('/').to_string();
        if resource_path.is_empty() {
            return Err(ShopdeskError::Config(
                "resource path cannot be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()?;

        Ok(Self {
            client,
            base_url,
            resource_path,
            token: None,
            search_param: None,
            _marker: PhantomData,
        })
    }

    /// Build a store for a configured resource.
    pub fn from_config(config: &Config, resource: &ResourceConfig) -> Result<Self> {
        let base_url = config.base_url()?;
        let mut store = Self::with_timeout(&base_url, &resource.path, config.remote_timeout())?;
        if let Some(token) = config.token() {
            store = store.with_token(token);
        }
        if let Some(param) = &resource.search_param {
            store = store.with_search_param(param.clone());
        }
        Ok(store)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretBox::new(Box::new(token.into())));
        self
    }

    pub fn with_search_param(mut self, param: impl Into<String>) -> Self {
        self.search_param = Some(param.into());
        self
    }

    pub fn searches_server_side(&self) -> bool {
        self.search_param.is_some()
    }

    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    fn collection_url(&self) -> Result<Url> {
        self.url_with(&[])
    }

    fn item_url(&self, id: &str) -> Result<Url> {
        self.url_with(&[id])
    }

    fn url_with(&self, extra: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ShopdeskError::Config(format!("invalid base URL '{}'", self.base_url))
            })?;
            segments.pop_if_empty();
            segments.extend(self.resource_path.split('/'));
            segments.extend(extra);
        }
        Ok(url)
    }

    /// Query string pairs for a list request.
    pub fn query_pairs(&self, query: &ListQuery) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("pageNumber".to_string(), query.page.to_string()),
            ("pageSize".to_string(), query.page_size.to_string()),
        ];

        for (key, value) in query.active_filters() {
            pairs.push((key.to_string(), value.to_string()));
        }

        if let Some(range) = &query.date_range {
            if let Some(from) = range.from {
                pairs.push((format!("{}From", range.field), from.to_string()));
            }
            if let Some(to) = range.to {
                pairs.push((format!("{}To", range.field), to.to_string()));
            }
        }

        if let Some(param) = &self.search_param
            && !query.search_term.is_empty()
        {
            pairs.push((param.clone(), query.search_term.clone()));
        }

        pairs
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and return `(status, body)` for 2xx answers.
    async fn send(&self, builder: RequestBuilder) -> Result<(u16, String)> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::from_body(status, &body).into());
        }
        Ok((status.as_u16(), body))
    }
}

#[async_trait]
impl<T, P> RemoteStore for HttpStore<T, P>
where
    T: DeserializeOwned + Send + Sync,
    P: Serialize + Send + Sync,
{
    type Item = T;
    type Payload = P;

    async fn fetch_page(&self, query: &ListQuery) -> Result<ListResult<T>> {
        let url = self.collection_url()?;
        tracing::debug!(
            "GET {} page={} size={}",
            url.path(),
            query.page,
            query.page_size
        );

        let builder = self.request(Method::GET, url).query(&self.query_pairs(query));
        let (status, body) = self.send(builder).await?;
        decode_page(&body, status, query)
    }

    async fn mutate(&self, request: MutationRequest<P>) -> Result<MutationOutcome<T>> {
        let builder = match &request {
            MutationRequest::Create(payload) => {
                self.request(Method::POST, self.collection_url()?).json(payload)
            }
            MutationRequest::Update(id, payload) => {
                self.request(Method::PUT, self.item_url(id)?).json(payload)
            }
            MutationRequest::Delete(id) => self.request(Method::DELETE, self.item_url(id)?),
        };
        tracing::debug!("{} {}", request.verb(), self.resource_path);

        let (status, body) = self.send(builder).await?;
        let entity = decode_entity(&body, status)?;
        Ok(MutationOutcome { entity })
    }
}
