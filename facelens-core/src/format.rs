//! Formatting helpers shared across UIs.

use chrono::{DateTime, Utc};

use crate::types::{AnalysisResult, AnalyticsSummary};

/// Placeholder for an attribute the service did not return.
pub const UNKNOWN: &str = "Unknown";

/// Attribute value or "Unknown".
pub fn attribute_or_unknown(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => UNKNOWN,
    }
}

/// Confidence as a rounded percentage (e.g., "92%").
///
/// Returns `None` when the result carries no usable confidence, in which
/// case no confidence card is shown.
pub fn format_confidence(result: &AnalysisResult) -> Option<String> {
    match result.confidence {
        Some(c) if c.is_finite() && c > 0.0 => Some(format!("{}%", (c * 100.0).round() as i64)),
        _ => None,
    }
}

/// Average accuracy for the dashboard (e.g., "94.5%").
pub fn format_accuracy(summary: &AnalyticsSummary) -> String {
    format!("{}%", summary.avg_accuracy)
}

/// Format a timestamp as relative time (e.g., "2m ago").
pub fn format_relative_time(ts: DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(ts);

    if duration.num_seconds() < 0 {
        "just now".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else {
        ts.format("%b %d").to_string()
    }
}

/// Format an optional timestamp as relative time, or "never" if missing.
pub fn format_relative_time_opt(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => format_relative_time(ts),
        None => "never".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_attribute_or_unknown() {
        assert_eq!(attribute_or_unknown(Some("brown")), "brown");
        assert_eq!(attribute_or_unknown(Some("  ")), "Unknown");
        assert_eq!(attribute_or_unknown(None), "Unknown");
    }

    #[test]
    fn test_format_confidence() {
        let mut result = AnalysisResult {
            confidence: Some(0.92),
            ..Default::default()
        };
        assert_eq!(format_confidence(&result).as_deref(), Some("92%"));

        result.confidence = Some(0.875);
        assert_eq!(format_confidence(&result).as_deref(), Some("88%"));

        result.confidence = Some(0.0);
        assert!(format_confidence(&result).is_none());

        result.confidence = None;
        assert!(format_confidence(&result).is_none());
    }

    #[test]
    fn test_format_accuracy() {
        let mut summary = AnalyticsSummary::default();
        assert_eq!(format_accuracy(&summary), "0%");
        summary.avg_accuracy = 94.5;
        assert_eq!(format_accuracy(&summary), "94.5%");
    }

    #[test]
    fn test_format_relative_time() {
        let now = Utc::now();
        assert_eq!(format_relative_time(now + Duration::seconds(30)), "just now");
        assert_eq!(format_relative_time(now - Duration::minutes(5)), "5m ago");
        assert_eq!(format_relative_time(now - Duration::hours(3)), "3h ago");
        assert_eq!(format_relative_time_opt(None), "never");
    }
}
