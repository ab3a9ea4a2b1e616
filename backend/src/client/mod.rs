//! Client for the remote REST collaborator.
//!
//! | Method | Path               | Body       |
//! |--------|--------------------|------------|
//! | GET    | `/categories`      | -          |
//! | POST   | `/categories`      | JSON       |
//! | PUT    | `/categories/{id}` | JSON       |
//! | DELETE | `/categories/{id}` | -          |
//! | POST   | `/pois`            | multipart  |
//! | POST   | `/events`          | multipart  |
//!
//! No retry and no backoff: a failed create is reported once to the caller.

use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::import::RecordSink;
use crate::models::{Category, ExternalRefs};
use crate::transform::{EventPayload, Payload, PoiPayload};

/// Thin typed wrapper around the collaborator endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    pub async fn list_categories(&self) -> ApiResult<Vec<Category>> {
        let response = self.http.get(self.url("/categories")).send().await?;
        read_json(response).await
    }

    /// Snapshot used to validate and map one POI batch.
    pub async fn category_refs(&self) -> ApiResult<ExternalRefs> {
        Ok(ExternalRefs::new(self.list_categories().await?))
    }

    pub async fn create_category(&self, name: &str) -> ApiResult<Category> {
        let response = self
            .http
            .post(self.url("/categories"))
            .json(&json!({ "name": name }))
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn update_category(&self, id: i64, name: &str) -> ApiResult<Category> {
        let response = self
            .http
            .put(self.url(&format!("/categories/{}", id)))
            .json(&json!({ "name": name }))
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn delete_category(&self, id: i64) -> ApiResult<()> {
        let response = self
            .http
            .delete(self.url(&format!("/categories/{}", id)))
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }

    // -------------------------------------------------------------------------
    // Record creation
    // -------------------------------------------------------------------------

    pub async fn create_poi(&self, payload: &PoiPayload) -> ApiResult<()> {
        self.post_form("/pois", payload.form_fields()).await
    }

    pub async fn create_event(&self, payload: &EventPayload) -> ApiResult<()> {
        self.post_form("/events", payload.form_fields()).await
    }

    async fn post_form(&self, path: &str, fields: Vec<(String, String)>) -> ApiResult<()> {
        let form = fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));

        let response = self.http.post(self.url(path)).multipart(form).send().await?;
        check_status(response).await.map(|_| ())
    }
}

#[async_trait]
impl RecordSink for ApiClient {
    async fn submit(&self, payload: &Payload) -> Result<(), ApiError> {
        match payload {
            Payload::Poi(poi) => self.create_poi(poi).await,
            Payload::Event(event) => self.create_event(event).await,
        }
    }
}

/// Turn non-2xx responses into [`ApiError::Status`] with the body text.
async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let body = check_status(response).await?.text().await?;
    serde_json::from_str(&body).map_err(|e| ApiError::InvalidJson(e.to_string()))
}
