//! Wire and domain types shared by the gateway, the controller and the UI.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Processing state of an index or of a single file inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexStatus {
  Waiting,
  Processing,
  Completed,
  Error,
  /// Anything the backend reports that this client doesn't know yet.
  #[serde(other)]
  Unknown,
}

impl IndexStatus {
  pub fn label(self) -> &'static str {
    match self {
      IndexStatus::Waiting => "waiting",
      IndexStatus::Processing => "processing",
      IndexStatus::Completed => "completed",
      IndexStatus::Error => "error",
      IndexStatus::Unknown => "unknown",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSummary {
  pub id: String,
  pub name: String,
  pub create_date: String,
  pub status: IndexStatus,
}

impl IndexSummary {
  /// `YYYY-MM-DD HH:MM` when the backend date parses, the raw string otherwise.
  pub fn created_label(&self) -> String {
    NaiveDateTime::parse_from_str(&self.create_date, "%Y-%m-%d %H:%M:%S")
      .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
      .unwrap_or_else(|_| self.create_date.clone())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFileRef {
  pub path: String,
  pub status: IndexStatus,
}

impl VideoFileRef {
  pub fn file_name(&self) -> &str {
    file_name(&self.path)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDetail {
  #[serde(flatten)]
  pub summary: IndexSummary,
  #[serde(default)]
  pub files: Vec<VideoFileRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
  pub query: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub keyword: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub video_paths: Option<Vec<String>>,
  #[serde(rename = "nResults")]
  pub limit: usize,
}

impl SearchQuery {
  pub fn new(query: impl Into<String>, limit: usize) -> Self {
    Self { query: query.into(), keyword: None, video_paths: None, limit }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultRow {
  pub video_path: String,
  /// `HH:MM:SS`, formatted by the backend.
  pub start_time: String,
  pub text: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoSegment {
  pub start: f64,
  pub end: f64,
  pub text: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SegmentPage {
  pub page: usize,
  #[serde(alias = "totalPages")]
  pub total_pages: usize,
  #[serde(default)]
  pub results: Vec<VideoSegment>,
}

/// Last path component, accepting both `/` and `\` separators.
pub fn file_name(path: &str) -> &str {
  path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn index_detail_flattens_summary() {
    let detail: IndexDetail = serde_json::from_value(json!({
      "id": "a1",
      "name": "lectures",
      "createDate": "2024-03-01 09:15:42",
      "status": "processing",
      "files": [{ "path": "/v/one.mp4", "status": "waiting" }]
    }))
    .unwrap();
    assert_eq!(detail.summary.id, "a1");
    assert_eq!(detail.summary.status, IndexStatus::Processing);
    assert_eq!(detail.files[0].status, IndexStatus::Waiting);
  }

  #[test]
  fn unknown_status_does_not_fail() {
    let s: IndexSummary =
      serde_json::from_value(json!({ "id": "x", "name": "n", "createDate": "", "status": "queued" })).unwrap();
    assert_eq!(s.status, IndexStatus::Unknown);
  }

  #[test]
  fn search_query_wire_shape() {
    let q = SearchQuery::new("cat", 10);
    assert_eq!(serde_json::to_value(&q).unwrap(), json!({ "query": "cat", "nResults": 10 }));

    let q = SearchQuery { keyword: Some("meow".into()), video_paths: Some(vec!["/a.mp4".into()]), ..q };
    assert_eq!(
      serde_json::to_value(&q).unwrap(),
      json!({ "query": "cat", "keyword": "meow", "videoPaths": ["/a.mp4"], "nResults": 10 })
    );
  }

  #[test]
  fn segment_page_accepts_both_spellings() {
    let a: SegmentPage = serde_json::from_value(json!({ "page": 1, "total_pages": 4, "results": [] })).unwrap();
    let b: SegmentPage = serde_json::from_value(json!({ "page": 1, "totalPages": 4, "results": [] })).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn created_label_compacts_or_falls_back() {
    let mut s = IndexSummary {
      id: "1".into(),
      name: "n".into(),
      create_date: "2024-03-01 09:15:42".into(),
      status: IndexStatus::Completed,
    };
    assert_eq!(s.created_label(), "2024-03-01 09:15");
    s.create_date = "yesterday".into();
    assert_eq!(s.created_label(), "yesterday");
  }

  #[test]
  fn file_name_handles_both_separators() {
    assert_eq!(file_name("/home/u/clip.mp4"), "clip.mp4");
    assert_eq!(file_name("C:\\videos\\talk.mkv"), "talk.mkv");
    assert_eq!(file_name("bare.mov"), "bare.mov");
  }
}
