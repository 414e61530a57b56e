//! Outbound calls to the indexing/search backend.
//!
//! [`Backend`] is the seam the controller depends on; [`HttpGateway`] is the
//! reqwest implementation. There are no retries: a failed call surfaces once
//! and the caller decides what to do.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

use crate::constants::constants;
use crate::error::GatewayError;
use crate::models::{IndexDetail, IndexSummary, SearchQuery, SearchResultRow, SegmentPage};

#[async_trait]
pub trait Backend: Send + Sync {
  async fn list_indexes(&self) -> Result<Vec<IndexSummary>, GatewayError>;
  async fn get_index(&self, id: &str) -> Result<IndexDetail, GatewayError>;
  async fn create_index(&self, name: &str, file_paths: &[String]) -> Result<IndexDetail, GatewayError>;
  async fn delete_index(&self, id: &str) -> Result<(), GatewayError>;
  async fn add_files(&self, id: &str, file_paths: &[String]) -> Result<(), GatewayError>;
  async fn remove_file(&self, id: &str, file_path: &str) -> Result<(), GatewayError>;
  async fn search(&self, id: &str, query: &SearchQuery) -> Result<Vec<SearchResultRow>, GatewayError>;
  async fn get_video_segments(
    &self,
    id: &str,
    file_path: &str,
    page: usize,
    page_size: usize,
  ) -> Result<SegmentPage, GatewayError>;
}

pub struct HttpGateway {
  client: Client,
  base: String,
}

impl HttpGateway {
  pub fn new(base: impl Into<String>) -> Result<Self, GatewayError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(constants().request_timeout_secs))
      .build()
      .map_err(|e| GatewayError::new(format!("Failed to build HTTP client: {}", e)))?;
    Ok(Self { client, base: base.into().trim_end_matches('/').to_string() })
  }

  pub fn base(&self) -> &str {
    &self.base
  }

  /// Issue one request and return the decoded JSON body (`null` for an empty 2xx body).
  pub async fn call(&self, method: Method, endpoint: &str, body: Option<Value>) -> Result<Value, GatewayError> {
    let url = format!("{}{}", self.base, endpoint);
    debug!(%method, endpoint, "gateway: request");

    let mut req = self.client.request(method.clone(), &url);
    if let Some(ref body) = body {
      req = req.json(body);
    }

    let response = req.send().await.map_err(|e| {
      warn!(%method, endpoint, err = %e, "gateway: transport failure");
      GatewayError::new(format!("Request failed: {}", e))
    })?;

    let status = response.status();
    let bytes = response.bytes().await.map_err(|e| {
      GatewayError::with_status(format!("Failed to read response body: {}", e), status.as_u16())
    })?;
    let parsed: Option<Value> = if bytes.iter().all(u8::is_ascii_whitespace) {
      None
    } else {
      serde_json::from_slice(&bytes).ok()
    };

    if !status.is_success() {
      let message = parsed
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed (HTTP {})", status.as_u16()));
      warn!(%method, endpoint, status = status.as_u16(), message = %message, "gateway: request rejected");
      return Err(GatewayError::with_status(message, status.as_u16()));
    }

    match parsed {
      Some(value) => Ok(value),
      None if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Value::Null),
      None => Err(GatewayError::with_status("Unexpected response from backend: body is not JSON", status.as_u16())),
    }
  }

  async fn call_typed<T: DeserializeOwned>(
    &self,
    method: Method,
    endpoint: &str,
    body: Option<Value>,
  ) -> Result<T, GatewayError> {
    let value = self.call(method, endpoint, body).await?;
    serde_json::from_value(value).map_err(|e| GatewayError::new(format!("Unexpected response from backend: {}", e)))
  }
}

fn index_path(id: &str) -> String {
  format!("/indexes/{}", urlencoding::encode(id))
}

#[async_trait]
impl Backend for HttpGateway {
  async fn list_indexes(&self) -> Result<Vec<IndexSummary>, GatewayError> {
    self.call_typed(Method::GET, "/indexes", None).await
  }

  async fn get_index(&self, id: &str) -> Result<IndexDetail, GatewayError> {
    self.call_typed(Method::GET, &index_path(id), None).await
  }

  async fn create_index(&self, name: &str, file_paths: &[String]) -> Result<IndexDetail, GatewayError> {
    self.call_typed(Method::POST, "/indexes", Some(json!({ "name": name, "filePaths": file_paths }))).await
  }

  async fn delete_index(&self, id: &str) -> Result<(), GatewayError> {
    self.call(Method::DELETE, &index_path(id), None).await.map(|_| ())
  }

  async fn add_files(&self, id: &str, file_paths: &[String]) -> Result<(), GatewayError> {
    let endpoint = format!("{}/files", index_path(id));
    self.call(Method::POST, &endpoint, Some(json!({ "filePaths": file_paths }))).await.map(|_| ())
  }

  async fn remove_file(&self, id: &str, file_path: &str) -> Result<(), GatewayError> {
    let endpoint = format!("{}/files/{}", index_path(id), urlencoding::encode(file_path));
    self.call(Method::DELETE, &endpoint, None).await.map(|_| ())
  }

  async fn search(&self, id: &str, query: &SearchQuery) -> Result<Vec<SearchResultRow>, GatewayError> {
    let body = serde_json::to_value(query).map_err(|e| GatewayError::new(format!("Failed to encode query: {}", e)))?;
    let endpoint = format!("{}/search", index_path(id));
    self.call_typed(Method::POST, &endpoint, Some(body)).await
  }

  async fn get_video_segments(
    &self,
    id: &str,
    file_path: &str,
    page: usize,
    page_size: usize,
  ) -> Result<SegmentPage, GatewayError> {
    let endpoint = format!("{}/video/details", index_path(id));
    let body = json!({ "filePath": file_path, "page": page, "pageSize": page_size });
    self.call_typed(Method::POST, &endpoint, Some(body)).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::IndexStatus;
  use wiremock::matchers::{body_json, header, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  async fn gateway(server: &MockServer) -> HttpGateway {
    HttpGateway::new(format!("{}/api/", server.uri())).unwrap()
  }

  #[tokio::test]
  async fn list_indexes_decodes_summaries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/indexes"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
        { "id": "1", "name": "talks", "createDate": "2024-01-02 03:04:05", "status": "completed" },
        { "id": "2", "name": "vlogs", "createDate": "2024-01-03 03:04:05", "status": "waiting" }
      ])))
      .expect(1)
      .mount(&server)
      .await;

    let list = gateway(&server).await.list_indexes().await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[1].status, IndexStatus::Waiting);
  }

  #[tokio::test]
  async fn error_field_is_surfaced_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/indexes"))
      .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "name_taken" })))
      .expect(1)
      .mount(&server)
      .await;

    let err = gateway(&server).await.create_index("dup", &["/a.mp4".to_string()]).await.unwrap_err();
    assert_eq!(err.message, "name_taken");
    assert_eq!(err.status, Some(400));
  }

  #[tokio::test]
  async fn non_json_failure_gets_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/indexes/9"))
      .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
      .mount(&server)
      .await;

    let err = gateway(&server).await.get_index("9").await.unwrap_err();
    assert_eq!(err.message, "Request failed (HTTP 502)");
  }

  #[tokio::test]
  async fn unreachable_backend_is_a_gateway_error() {
    let server = MockServer::start().await;
    let base = format!("{}/api", server.uri());
    drop(server);

    let err = HttpGateway::new(base).unwrap().list_indexes().await.unwrap_err();
    assert!(err.message.starts_with("Request failed"), "unexpected message: {}", err.message);
    assert_eq!(err.status, None);
  }

  #[tokio::test]
  async fn delete_accepts_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
      .and(path("/api/indexes/7"))
      .respond_with(ResponseTemplate::new(204))
      .expect(1)
      .mount(&server)
      .await;

    gateway(&server).await.delete_index("7").await.unwrap();
  }

  #[tokio::test]
  async fn remove_file_encodes_path_as_one_segment() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
      .and(path("/api/indexes/7/files/%2Fhome%2Fu%2Fmy%20clip.mp4"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
      .expect(1)
      .mount(&server)
      .await;

    gateway(&server).await.remove_file("7", "/home/u/my clip.mp4").await.unwrap();
  }

  #[tokio::test]
  async fn search_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/indexes/3/search"))
      .and(header("content-type", "application/json"))
      .and(body_json(json!({ "query": "cat", "nResults": 10 })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
        { "videoPath": "/v/a.mp4", "startTime": "00:01:05", "text": "a cat" }
      ])))
      .expect(1)
      .mount(&server)
      .await;

    let rows = gateway(&server).await.search("3", &SearchQuery::new("cat", 10)).await.unwrap();
    assert_eq!(rows[0].start_time, "00:01:05");
  }

  #[tokio::test]
  async fn video_segments_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/indexes/3/video/details"))
      .and(body_json(json!({ "filePath": "/v/a.mp4", "page": 2, "pageSize": 100 })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "page": 2,
        "total_pages": 5,
        "results": [{ "start": 100.5, "end": 104.0, "text": "hello" }]
      })))
      .expect(1)
      .mount(&server)
      .await;

    let page = gateway(&server).await.get_video_segments("3", "/v/a.mp4", 2, 100).await.unwrap();
    assert_eq!((page.page, page.total_pages), (2, 5));
    assert_eq!(page.results[0].text, "hello");
  }

  #[tokio::test]
  async fn wrong_shape_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/indexes"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "not": "a list" })))
      .mount(&server)
      .await;

    let err = gateway(&server).await.list_indexes().await.unwrap_err();
    assert!(err.message.starts_with("Unexpected response from backend"));
  }
}
