use crate::traits::{ByteStream, ObjectMeta, ObjectRef, RemoteStore, StoreError, StoreResult};
use crate::url;
use async_trait::async_trait;
use reqwest::{Body, StatusCode};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const DEFAULT_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Timeout for the small metadata calls (permissions, delete, folder check).
/// Object creation streams arbitrarily large bodies and gets no overall
/// deadline, only the connect timeout.
const METADATA_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct CreateObjectResponse {
    id: String,
    #[serde(rename = "webViewLink")]
    web_view_link: Option<String>,
}

/// Drive-style remote store over HTTP.
#[derive(Clone)]
pub struct DriveStore {
    client: reqwest::Client,
    token: String,
    api_base: String,
    upload_base: String,
}

impl DriveStore {
    /// Create a client. `api_base` overrides the provider endpoint for tests
    /// and self-hosted gateways; when set it serves both metadata and upload
    /// traffic.
    pub fn new(token: String, api_base: Option<String>) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let (api_base, upload_base) = match api_base {
            Some(base) => {
                let base = base.trim_end_matches('/').to_string();
                (base.clone(), base)
            }
            None => (DEFAULT_API_BASE.to_string(), DEFAULT_UPLOAD_BASE.to_string()),
        };

        Ok(Self {
            client,
            token,
            api_base,
            upload_base,
        })
    }
}

#[async_trait]
impl RemoteStore for DriveStore {
    async fn create_object(
        &self,
        meta: ObjectMeta,
        folder_id: &str,
        body: ByteStream,
    ) -> StoreResult<ObjectRef> {
        let start = std::time::Instant::now();

        let mut request = self
            .client
            .post(format!("{}/files", self.upload_base))
            .query(&[
                ("uploadType", "media"),
                ("name", meta.name.as_str()),
                ("parents", folder_id),
            ])
            .bearer_auth(&self.token)
            .header("Content-Type", &meta.content_type)
            .body(Body::wrap_stream(body));

        if let Some(size) = meta.size_bytes {
            request = request.header("Content-Length", size);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(
                error = %e,
                folder_id = %folder_id,
                name = %meta.name,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Remote object create failed"
            );
            StoreError::CreateFailed(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(
                status = %status,
                folder_id = %folder_id,
                name = %meta.name,
                "Remote object create rejected by provider"
            );
            return Err(StoreError::CreateFailed(format!(
                "provider returned {}",
                status
            )));
        }

        let created: CreateObjectResponse = response
            .json()
            .await
            .map_err(|e| StoreError::CreateFailed(format!("malformed create response: {}", e)))?;

        let view_url = created
            .web_view_link
            .unwrap_or_else(|| url::view_url(&created.id));

        tracing::info!(
            object_id = %created.id,
            folder_id = %folder_id,
            size_bytes = meta.size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Remote object created"
        );

        Ok(ObjectRef {
            id: created.id,
            view_url,
            folder_id: folder_id.to_string(),
        })
    }

    async fn set_public_readable(&self, object_id: &str) -> StoreResult<()> {
        let response = self
            .client
            .post(format!("{}/files/{}/permissions", self.api_base, object_id))
            .bearer_auth(&self.token)
            .timeout(METADATA_TIMEOUT)
            .json(&serde_json::json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await
            .map_err(|e| StoreError::PermissionFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::PermissionFailed(format!(
                "provider returned {}",
                response.status()
            )));
        }

        tracing::info!(object_id = %object_id, "Remote object made public-readable");
        Ok(())
    }

    async fn delete_object(&self, object_id: &str) -> StoreResult<()> {
        let response = self
            .client
            .delete(format!("{}/files/{}", self.api_base, object_id))
            .bearer_auth(&self.token)
            .timeout(METADATA_TIMEOUT)
            .send()
            .await
            .map_err(|e| StoreError::DeleteFailed(e.to_string()))?;

        // Deleting an object that is already gone counts as success.
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(object_id = %object_id, "Remote object already gone");
            return Ok(());
        }

        if !response.status().is_success() {
            return Err(StoreError::DeleteFailed(format!(
                "provider returned {}",
                response.status()
            )));
        }

        tracing::info!(object_id = %object_id, "Remote object deleted");
        Ok(())
    }

    async fn folder_exists(&self, folder_id: &str) -> StoreResult<bool> {
        let response = self
            .client
            .get(format!("{}/files/{}", self.api_base, folder_id))
            .query(&[("fields", "id")])
            .bearer_auth(&self.token)
            .timeout(METADATA_TIMEOUT)
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(StoreError::Backend(format!("provider returned {}", status))),
        }
    }
}
