//! Terminal rendering for workflow and analytics state

use anyhow::Result;
use facelens_core::format::{
    attribute_or_unknown, format_accuracy, format_confidence, format_relative_time_opt,
};
use facelens_core::{AnalysisResult, AnalyticsView, Phase, WorkflowState};
use serde::Serialize;

pub fn print_dashboard(view: &AnalyticsView) {
    let summary = &view.summary;
    let trends = &summary.trends;

    println!("Analytics Dashboard");
    println!("===================");
    println!();
    println!(
        "{:<16} {:>10} {:>8}",
        "Total Analyses", summary.total_analyses, trends.total_trend
    );
    println!(
        "{:<16} {:>10} {:>8}",
        "Today", summary.today_analyses, trends.today_trend
    );
    println!(
        "{:<16} {:>10} {:>8}",
        "Accuracy",
        format_accuracy(summary),
        trends.accuracy_trend
    );
    println!(
        "{:<16} {:>10} {:>8}",
        "Active Users", summary.active_users, trends.users_trend
    );
    println!();

    let refreshed = format_relative_time_opt(view.refreshed_at);
    if view.stale {
        println!("Updated: {} (latest refresh failed)", refreshed);
    } else {
        println!("Updated: {}", refreshed);
    }
}

pub fn print_workflow(state: &WorkflowState) {
    if let Some(image) = state.image() {
        println!("Photo: {}", image);
    }

    match state.phase() {
        Phase::Success => {
            if let Some(result) = state.result() {
                print_result(result);
            }
        }
        Phase::Failed => {
            println!("Analysis Failed: could not analyze the photo. Please try again.");
            if let Some(reason) = state.failure() {
                println!("  {}", reason);
            }
        }
        phase => println!("Status: {}", phase),
    }
}

fn print_result(result: &AnalysisResult) {
    println!();
    println!("Analysis Results");
    println!("================");
    println!();
    for (title, value) in result.attributes() {
        println!("{:<18} {}", title, attribute_or_unknown(value));
    }
    if let Some(confidence) = format_confidence(result) {
        println!("{:<18} {}", "Confidence Score", confidence);
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    phase: &'static str,
    image: Option<String>,
    asset_url: Option<&'a str>,
    result: Option<&'a AnalysisResult>,
    error: Option<String>,
    analytics: &'a facelens_core::AnalyticsSummary,
    analytics_stale: bool,
}

pub fn print_json(state: &WorkflowState, view: &AnalyticsView) -> Result<()> {
    let report = JsonReport {
        phase: state.phase().as_str(),
        image: state.image().map(|i| i.to_string()),
        asset_url: state.asset().map(|a| a.url.as_str()),
        result: state.result(),
        error: state.failure().map(|f| f.to_string()),
        analytics: &view.summary,
        analytics_stale: view.stale,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
