//! Core domain types for facelens
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Image reference** | Local handle to a photo chosen from the camera or gallery |
//! | **Asset** | Durable, service-hosted reference to an uploaded image |
//! | **Attribute result** | Facial characteristics returned by the analysis service |
//! | **Analytics summary** | Aggregate usage numbers, cached client-side and refreshed wholesale |
//!
//! Wire types use the service's camelCase field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================
// Image selection
// ============================================

/// Filename sent with an upload when the reference carries none.
pub const DEFAULT_UPLOAD_FILENAME: &str = "photo.jpg";

/// MIME type sent with an upload when the extension is not recognised.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Opaque local handle to a selected photo.
///
/// Created on selection and replaced wholesale by the next selection;
/// never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    path: PathBuf,
}

impl ImageReference {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// MIME type derived from the file extension
    pub fn mime_type(&self) -> &'static str {
        let ext = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            Some("heic") => "image/heic",
            _ => DEFAULT_MIME_TYPE,
        }
    }

    /// Filename to report to the upload service
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_UPLOAD_FILENAME)
            .to_string()
    }

    /// Build the upload request for this image
    pub fn upload_request(&self) -> UploadRequest {
        UploadRequest {
            image: self.clone(),
            mime_type: self.mime_type().to_string(),
            filename: self.filename(),
        }
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

// ============================================
// Upload
// ============================================

/// Input to the upload service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub image: ImageReference,
    pub mime_type: String,
    pub filename: String,
}

/// Durable reference to uploaded bytes.
///
/// One-to-one with the [`ImageReference`] that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    pub url: String,
}

// ============================================
// Analysis
// ============================================

/// Facial attributes returned by the analysis service.
///
/// The service may omit any attribute; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub eye_color: Option<String>,
    #[serde(default)]
    pub hair_color: Option<String>,
    #[serde(default)]
    pub skin_tone: Option<String>,
    #[serde(default)]
    pub lips_color: Option<String>,
    #[serde(default)]
    pub nose_type: Option<String>,
    #[serde(default)]
    pub skin_quality: Option<String>,
    /// Confidence in 0..1
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl AnalysisResult {
    /// Attribute cards in display order: (title, value)
    pub fn attributes(&self) -> [(&'static str, Option<&str>); 7] {
        [
            ("Gender", self.gender.as_deref()),
            ("Eye Color", self.eye_color.as_deref()),
            ("Hair Color", self.hair_color.as_deref()),
            ("Skin Tone", self.skin_tone.as_deref()),
            ("Lips Color", self.lips_color.as_deref()),
            ("Nose Type", self.nose_type.as_deref()),
            ("Skin Quality", self.skin_quality.as_deref()),
        ]
    }
}

/// Request body for POST /api/analyze-photo
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnalyzeRequest<'a> {
    pub image_url: &'a str,
}

// ============================================
// Analytics
// ============================================

/// Aggregate usage numbers from the analytics service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_analyses: i64,
    pub today_analyses: i64,
    /// Average accuracy in 0..100
    pub avg_accuracy: f64,
    pub active_users: i64,
    pub trends: AnalyticsTrends,
}

/// Trend labels shown next to each dashboard number (e.g. "+12%")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsTrends {
    pub total_trend: String,
    pub today_trend: String,
    pub accuracy_trend: String,
    pub users_trend: String,
}

impl Default for AnalyticsTrends {
    fn default() -> Self {
        Self {
            total_trend: "+0%".to_string(),
            today_trend: "+0".to_string(),
            accuracy_trend: "+0%".to_string(),
            users_trend: "+0%".to_string(),
        }
    }
}

impl Default for AnalyticsSummary {
    /// Summary shown before the first successful fetch
    fn default() -> Self {
        Self {
            total_analyses: 0,
            today_analyses: 0,
            avg_accuracy: 0.0,
            active_users: 0,
            trends: AnalyticsTrends::default(),
        }
    }
}

/// Response body from GET /api/analytics
#[derive(Debug, Deserialize)]
pub(crate) struct AnalyticsResponse {
    pub summary: AnalyticsSummary,
}

/// The analytics cache as seen by the presentation layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsView {
    /// Last successfully fetched summary, or the default
    pub summary: AnalyticsSummary,
    /// A fetch is outstanding
    pub loading: bool,
    /// The most recent fetch failed; `summary` is from an earlier fetch or the default
    pub stale: bool,
    /// When `summary` was last replaced by a successful fetch
    pub refreshed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_from_extension() {
        assert_eq!(ImageReference::new("a/b.JPG").mime_type(), "image/jpeg");
        assert_eq!(ImageReference::new("b.jpeg").mime_type(), "image/jpeg");
        assert_eq!(ImageReference::new("b.png").mime_type(), "image/png");
        assert_eq!(ImageReference::new("b.webp").mime_type(), "image/webp");
        assert_eq!(ImageReference::new("b.heic").mime_type(), "image/heic");
        assert_eq!(ImageReference::new("b.tiff").mime_type(), "image/jpeg");
        assert_eq!(ImageReference::new("noext").mime_type(), "image/jpeg");
    }

    #[test]
    fn test_upload_request_filename() {
        let req = ImageReference::new("/tmp/selfie.png").upload_request();
        assert_eq!(req.filename, "selfie.png");
        assert_eq!(req.mime_type, "image/png");

        let req = ImageReference::new("/").upload_request();
        assert_eq!(req.filename, DEFAULT_UPLOAD_FILENAME);
    }

    #[test]
    fn test_parse_partial_analysis_result() {
        let result: AnalysisResult =
            serde_json::from_str(r#"{"gender":"female","confidence":0.92,"extra":1}"#).unwrap();
        assert_eq!(result.gender.as_deref(), Some("female"));
        assert_eq!(result.confidence, Some(0.92));
        assert!(result.eye_color.is_none());
    }

    #[test]
    fn test_parse_null_fields() {
        let result: AnalysisResult =
            serde_json::from_str(r#"{"eyeColor":"brown","noseType":null}"#).unwrap();
        assert_eq!(result.eye_color.as_deref(), Some("brown"));
        assert!(result.nose_type.is_none());
    }

    #[test]
    fn test_parse_analytics_response() {
        let body = r#"{
            "summary": {
                "totalAnalyses": 1200,
                "todayAnalyses": 34,
                "avgAccuracy": 94.5,
                "activeUsers": 87,
                "trends": {
                    "totalTrend": "+12%",
                    "todayTrend": "+5",
                    "accuracyTrend": "+1.2%",
                    "usersTrend": "+8%"
                }
            }
        }"#;
        let response: AnalyticsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.summary.total_analyses, 1200);
        assert_eq!(response.summary.avg_accuracy, 94.5);
        assert_eq!(response.summary.trends.today_trend, "+5");
    }

    #[test]
    fn test_default_summary() {
        let summary = AnalyticsSummary::default();
        assert_eq!(summary.total_analyses, 0);
        assert_eq!(summary.today_analyses, 0);
        assert_eq!(summary.avg_accuracy, 0.0);
        assert_eq!(summary.active_users, 0);
        assert_eq!(summary.trends.total_trend, "+0%");
        assert_eq!(summary.trends.today_trend, "+0");
        assert_eq!(summary.trends.accuracy_trend, "+0%");
        assert_eq!(summary.trends.users_trend, "+0%");
    }

    #[test]
    fn test_analyze_request_body() {
        let body = serde_json::to_value(AnalyzeRequest {
            image_url: "https://cdn.example.com/a.jpg",
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"imageUrl": "https://cdn.example.com/a.jpg"})
        );
    }
}
