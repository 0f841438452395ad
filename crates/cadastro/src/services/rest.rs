//! JSON REST implementation of [`PersistenceService`].
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/{resource}?_page=&_limit=&{filter}=` | `get_all` |
//! | GET    | `/{resource}/{id}` | `get_by_id` |
//! | POST   | `/{resource}` | `create` |
//! | PUT    | `/{resource}/{id}` | `update_by_id` |
//! | DELETE | `/{resource}/{id}` | `delete_by_id` |

use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::{Page, PersistenceService, Record};
use crate::config::ApiConfig;
use crate::error::{Result, ServiceError};

pub(crate) const LIST_FAILED: &str = "Erro ao listar os registros.";
pub(crate) const GET_FAILED: &str = "Erro ao consultar o registro.";
pub(crate) const CREATE_FAILED: &str = "Erro ao criar o registro.";
pub(crate) const UPDATE_FAILED: &str = "Erro ao atualizar o registro.";
pub(crate) const DELETE_FAILED: &str = "Erro ao apagar o registro.";

/// Header carrying the total row count of a listing.
const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Shared HTTP client, base URL and bearer token.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    page_limit: u32,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("page_limit", &self.page_limit)
            .finish_non_exhaustive()
    }
}

impl RestClient {
    /// Creates a client from the API settings.
    ///
    /// # Errors
    /// Returns an error if the base URL is malformed or the HTTP client
    /// cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| ServiceError::Request {
                message: "Erro ao configurar o cliente HTTP.".into(),
                source,
            })?;
        Ok(Self {
            http,
            base_url: Url::parse(&config.base_url)?,
            token: config.token.clone(),
            page_limit: config.page_limit,
        })
    }

    /// Sets the bearer token sent with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the rows requested per page.
    pub fn page_limit(&self) -> u32 {
        self.page_limit
    }

    /// Joins path segments to the base URL.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ServiceError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

/// Sends `request`, mapping transport failures and error statuses.
pub(crate) async fn send(
    request: RequestBuilder,
    message: &str,
    id: Option<u64>,
) -> Result<Response> {
    let response = request.send().await.map_err(|source| {
        warn!(error = %source, "{message}");
        ServiceError::Request {
            message: message.to_string(),
            source,
        }
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    warn!(status = status.as_u16(), "{message}");
    match (status, id) {
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => Err(ServiceError::Unauthorized {
            status: status.as_u16(),
        }),
        (StatusCode::NOT_FOUND, Some(id)) => Err(ServiceError::NotFound { id }),
        _ => Err(ServiceError::Status {
            status: status.as_u16(),
            message: message.to_string(),
            body: response.text().await.unwrap_or_default(),
        }),
    }
}

/// REST persistence for records of type `R`.
pub struct RestService<R> {
    client: RestClient,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for RestService<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: Record> fmt::Debug for RestService<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestService")
            .field("resource", &R::RESOURCE)
            .field("client", &self.client)
            .finish()
    }
}

impl<R: Record> RestService<R> {
    /// Creates a service over `client`.
    pub fn new(client: RestClient) -> Self {
        Self {
            client,
            _record: PhantomData,
        }
    }

    /// Returns the client.
    pub fn client(&self) -> &RestClient {
        &self.client
    }

    fn item_url(&self, id: u64) -> Result<Url> {
        self.client.endpoint(&[R::RESOURCE, &id.to_string()])
    }
}

impl<R: Record> From<RestClient> for RestService<R> {
    fn from(client: RestClient) -> Self {
        Self::new(client)
    }
}

#[async_trait]
impl<R: Record> PersistenceService for RestService<R> {
    type Record = R;

    async fn get_all(&self, page: u32, filter: &str) -> Result<Page<R>> {
        let limit = self.client.page_limit;
        let url = self.client.endpoint(&[R::RESOURCE])?;
        debug!(resource = R::RESOURCE, page, filter, "listing records");

        let request = self.client.http().get(url).query(&[
            ("_page", page.to_string()),
            ("_limit", limit.to_string()),
            (R::FILTER_PARAM, filter.to_string()),
        ]);
        let response = send(self.client.authorize(request), LIST_FAILED, None).await?;

        let total_count = response
            .headers()
            .get(TOTAL_COUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(u64::from(limit));
        let rows: Vec<R> = response
            .json()
            .await
            .map_err(|e| ServiceError::decode(LIST_FAILED, e))?;
        Ok(Page::new(rows, total_count))
    }

    async fn get_by_id(&self, id: u64) -> Result<R> {
        debug!(resource = R::RESOURCE, id, "fetching record");
        let request = self.client.http().get(self.item_url(id)?);
        let response = send(self.client.authorize(request), GET_FAILED, Some(id)).await?;
        response
            .json()
            .await
            .map_err(|e| ServiceError::decode(GET_FAILED, e))
    }

    async fn create(&self, record: &R) -> Result<u64> {
        debug!(resource = R::RESOURCE, "creating record");
        let request = self
            .client
            .http()
            .post(self.client.endpoint(&[R::RESOURCE])?)
            .json(record);
        let response = send(self.client.authorize(request), CREATE_FAILED, None).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| ServiceError::decode(CREATE_FAILED, e))?;
        body.get("id")
            .and_then(Value::as_u64)
            .ok_or_else(|| ServiceError::decode(CREATE_FAILED, "response has no id"))
    }

    async fn update_by_id(&self, id: u64, record: &R) -> Result<()> {
        debug!(resource = R::RESOURCE, id, "updating record");
        let request = self.client.http().put(self.item_url(id)?).json(record);
        send(self.client.authorize(request), UPDATE_FAILED, Some(id)).await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: u64) -> Result<()> {
        debug!(resource = R::RESOURCE, id, "deleting record");
        let request = self.client.http().delete(self.item_url(id)?);
        send(self.client.authorize(request), DELETE_FAILED, Some(id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> RestClient {
        RestClient::new(&ApiConfig {
            base_url: base.into(),
            ..ApiConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn endpoint_joins_segments() {
        let c = client("http://localhost:3333");
        assert_eq!(
            c.endpoint(&["pessoas", "7"]).unwrap().as_str(),
            "http://localhost:3333/pessoas/7"
        );

        let c = client("http://localhost:3333/api/");
        assert_eq!(
            c.endpoint(&["items"]).unwrap().as_str(),
            "http://localhost:3333/api/items"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let c = client("http://localhost:3333").with_token("secret");
        assert!(!format!("{c:?}").contains("secret"));
    }
}
