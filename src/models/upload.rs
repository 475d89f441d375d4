//! Represents a single gallery upload and its public JSON shape.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// One row of the `uploads` table.
///
/// The binary payload lives in the media directory under `filename`;
/// this struct only carries the metadata.
#[derive(Clone, FromRow, Debug, PartialEq)]
pub struct UploadRecord {
    /// Assigned by SQLite on insert, never reused.
    pub id: i64,

    /// Free-form author name, stored exactly as submitted.
    pub author: String,

    /// Optional caption. `NULL` is presented as an empty string.
    pub description: Option<String>,

    /// Server-generated name of the stored file (`{unix_secs}_{client_name}`).
    pub filename: String,

    /// Derived once from the declared content type at creation.
    pub is_video: bool,

    /// Creation time; listings are ordered by this column, newest first.
    pub created_at: DateTime<Utc>,
}

/// An upload that has not been persisted yet.
#[derive(Clone, Debug)]
pub struct NewUpload {
    pub author: String,
    pub description: String,
    pub filename: String,
    pub is_video: bool,
    pub created_at: DateTime<Utc>,
}

impl NewUpload {
    pub fn into_record(self, id: i64) -> UploadRecord {
        UploadRecord {
            id,
            author: self.author,
            description: Some(self.description),
            filename: self.filename,
            is_video: self.is_video,
            created_at: self.created_at,
        }
    }
}

/// External representation returned by the list and create endpoints.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadView {
    pub id: i64,
    pub author: String,
    pub description: String,
    pub filename: String,
    pub preview_url: String,
    pub is_video: bool,
    pub created_at: DateTime<Utc>,
}

impl UploadView {
    /// The single mapping from a stored record to its JSON shape.
    pub fn from_record(record: &UploadRecord, base_url: &str) -> Self {
        Self {
            id: record.id,
            author: record.author.clone(),
            description: record.description.clone().unwrap_or_default(),
            filename: record.filename.clone(),
            preview_url: preview_url(base_url, &record.filename),
            is_video: record.is_video,
            created_at: record.created_at,
        }
    }
}

/// `{base_url}/uploads/{filename}` with each path segment percent-encoded.
pub fn preview_url(base_url: &str, filename: &str) -> String {
    let encoded = filename
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/uploads/{}", base_url.trim_end_matches('/'), encoded)
}

/// True iff the top-level MIME type is `video`.
pub fn is_video_content_type(content_type: &str) -> bool {
    content_type
        .parse::<mime::Mime>()
        .map(|m| m.type_() == mime::VIDEO)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> UploadRecord {
        UploadRecord {
            id: 7,
            author: "alice".into(),
            description: None,
            filename: "1700000000_clip.mp4".into(),
            is_video: true,
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn video_detection_uses_top_level_type() {
        assert!(is_video_content_type("video/mp4"));
        assert!(is_video_content_type("video/webm; codecs=vp9"));
        assert!(!is_video_content_type("image/png"));
        assert!(!is_video_content_type("application/x-video"));
        assert!(!is_video_content_type("not a mime"));
        assert!(!is_video_content_type(""));
    }

    #[test]
    fn view_uses_camel_case_keys() {
        let view = UploadView::from_record(&record(), "http://localhost:5000");
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["description"], "");
        assert_eq!(json["isVideo"], true);
        assert_eq!(
            json["previewUrl"],
            "http://localhost:5000/uploads/1700000000_clip.mp4"
        );
        assert_eq!(json["createdAt"], "2024-01-02T03:04:05Z");
        assert!(json.get("is_video").is_none());
    }

    #[test]
    fn preview_url_encodes_segments_and_trims_base() {
        assert_eq!(
            preview_url("http://host/", "1_my photo.png"),
            "http://host/uploads/1_my%20photo.png"
        );
        assert_eq!(
            preview_url("http://host", "nested/1_a.png"),
            "http://host/uploads/nested/1_a.png"
        );
    }
}
