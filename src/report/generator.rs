//! Dashboard report generation.
//!
//! This module renders the dashboard view-model as a Markdown document
//! (KPI cards, a bar chart of the current series, highlights) or as JSON.

use crate::analysis::{bottom_points, top_points};
use crate::config::ReportConfig;
use crate::models::{ChartPoint, DomainScore};
use crate::viewmodel::{DashboardViewModel, HierarchyLevel};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Highest possible answer score.
const MAX_SCORE: f64 = 5.0;

/// Number of entries listed as highlights.
const HIGHLIGHT_COUNT: usize = 2;

/// Metadata about the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetadata {
    pub assessment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_date: Option<DateTime<Utc>>,
    pub generated_at: DateTime<Utc>,
    /// Level the series lists.
    pub level: HierarchyLevel,
    /// Names of the selected hierarchy path, broadest first.
    pub path: Vec<String>,
}

/// Headline numbers.
#[derive(Debug, Clone, Serialize)]
pub struct Kpis {
    pub overall_average: f64,
    pub total_responses: u32,
    pub domains_completed: u32,
}

/// Strongest and weakest entries at the displayed level.
#[derive(Debug, Clone, Serialize)]
pub struct Highlights {
    pub strengths: Vec<ChartPoint>,
    pub focus_areas: Vec<ChartPoint>,
}

/// The complete rendered dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub metadata: DashboardMetadata,
    pub kpis: Kpis,
    pub series: Vec<ChartPoint>,
    pub highlights: Highlights,
}

impl DashboardReport {
    /// Snapshot the view-model's current state.
    pub fn from_view_model(view_model: &DashboardViewModel, assessment_id: &str) -> Self {
        let stats = view_model.stats();
        let series = view_model.derive_chart_series();
        let level = view_model.selection().resolved_level();

        // At the top level the API already ranks domains.
        let highlights = match (level, stats) {
            (HierarchyLevel::Domain, Some(stats)) => Highlights {
                strengths: domain_points(&stats.top_strengths),
                focus_areas: domain_points(&stats.focus_areas),
            },
            _ if series.len() >= HIGHLIGHT_COUNT => Highlights {
                strengths: top_points(&series, HIGHLIGHT_COUNT),
                focus_areas: bottom_points(&series, HIGHLIGHT_COUNT),
            },
            _ => Highlights {
                strengths: series.clone(),
                focus_areas: Vec::new(),
            },
        };

        Self {
            metadata: DashboardMetadata {
                assessment_id: assessment_id.to_string(),
                submission_date: stats.and_then(|s| s.submission_date),
                generated_at: Utc::now(),
                level,
                path: view_model
                    .breadcrumb()
                    .into_iter()
                    .map(|(_, name)| name)
                    .collect(),
            },
            kpis: Kpis {
                overall_average: stats.map(|s| s.overall_average).unwrap_or(0.0),
                total_responses: stats.map(|s| s.total_responses).unwrap_or(0),
                domains_completed: stats.map(|s| s.domains_completed).unwrap_or(0),
            },
            series,
            highlights,
        }
    }
}

fn domain_points(scores: &[DomainScore]) -> Vec<ChartPoint> {
    scores
        .iter()
        .map(|s| ChartPoint::new(&s.domain_name, s.average_score))
        .collect()
}

/// Generate a complete Markdown dashboard.
pub fn generate_markdown_report(report: &DashboardReport, config: &ReportConfig) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Security Assessment Dashboard\n\n");

    // Metadata section
    output.push_str(&generate_metadata_section(&report.metadata));

    // KPI cards
    if config.include_kpis {
        output.push_str(&generate_kpi_section(&report.kpis));
    }

    // Chart
    output.push_str(&generate_chart_section(
        report.metadata.level,
        &report.series,
        config.bar_width,
    ));

    // Highlights
    if config.include_highlights {
        output.push_str(&generate_highlights_section(&report.highlights));
    }

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &DashboardMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Assessment:** `{}`\n", metadata.assessment_id));
    if let Some(date) = metadata.submission_date {
        section.push_str(&format!(
            "- **Submitted:** {}\n",
            date.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if !metadata.path.is_empty() {
        section.push_str(&format!("- **Filter:** {}\n", metadata.path.join(" › ")));
    }
    section.push('\n');

    section
}

/// Generate the KPI cards.
fn generate_kpi_section(kpis: &Kpis) -> String {
    let mut section = String::new();

    section.push_str("## Overview\n\n");
    section.push_str("| Overall Average | Questions Answered | Domains Completed |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| **{:.2}** / {} | {} | {} |\n\n",
        kpis.overall_average, MAX_SCORE, kpis.total_responses, kpis.domains_completed
    ));

    section
}

/// Generate the bar chart of the current series.
fn generate_chart_section(level: HierarchyLevel, series: &[ChartPoint], bar_width: usize) -> String {
    let mut section = String::new();

    section.push_str(&format!("## Scores by {}\n\n", level));

    if series.is_empty() {
        section.push_str("No scores to display for this selection.\n\n");
        return section;
    }

    section.push_str(&format!("| {} | Score | |\n", level));
    section.push_str("|:---|:---:|:---|\n");
    for point in series {
        section.push_str(&format!(
            "| {} | {:.2} | `{}` |\n",
            point.label,
            point.score,
            render_bar(point.score, bar_width)
        ));
    }
    section.push('\n');

    section
}

/// Render a score as a fixed-width bar.
pub fn render_bar(score: f64, width: usize) -> String {
    let ratio = (score / MAX_SCORE).clamp(0.0, 1.0);
    let filled = (ratio * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Generate the highlights section.
fn generate_highlights_section(highlights: &Highlights) -> String {
    if highlights.strengths.is_empty() && highlights.focus_areas.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    if !highlights.strengths.is_empty() {
        section.push_str("## Top Strengths\n\n");
        for point in &highlights.strengths {
            section.push_str(&format!("- **{}** ({:.2})\n", point.label, point.score));
        }
        section.push('\n');
    }

    if !highlights.focus_areas.is_empty() {
        section.push_str("## Focus Areas\n\n");
        for point in &highlights.focus_areas {
            section.push_str(&format!("- **{}** ({:.2})\n", point.label, point.score));
        }
        section.push('\n');
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Dashboard generated by SecAssess v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON dashboard.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered output to a file.
pub fn write_output(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregator::tests::{domain, domain_score};
    use crate::models::AssessmentStats;
    use tempfile::TempDir;

    fn create_test_view_model() -> DashboardViewModel {
        let mut vm = DashboardViewModel::new();
        vm.set_domains(vec![
            domain("d1", "Access Control"),
            domain("d2", "Network Security"),
            domain("d3", "Incident Response"),
        ]);
        vm.set_stats(AssessmentStats {
            overall_average: 3.25,
            total_responses: 12,
            domains_completed: 3,
            domain_scores: vec![
                domain_score("d1", "Access Control", 4.5),
                domain_score("d2", "Network Security", 2.0),
                domain_score("d3", "Incident Response", 3.25),
            ],
            top_strengths: vec![domain_score("d1", "Access Control", 4.5)],
            focus_areas: vec![domain_score("d2", "Network Security", 2.0)],
            ..Default::default()
        });
        vm
    }

    #[test]
    fn test_report_from_view_model() {
        let report = DashboardReport::from_view_model(&create_test_view_model(), "a-1");

        assert_eq!(report.metadata.level, HierarchyLevel::Domain);
        assert!(report.metadata.path.is_empty());
        assert_eq!(report.kpis.total_responses, 12);
        assert_eq!(report.series.len(), 3);
        assert_eq!(report.highlights.strengths[0].label, "Access Control");
        assert_eq!(report.highlights.focus_areas[0].label, "Network Security");
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = DashboardReport::from_view_model(&create_test_view_model(), "a-1");
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.contains("# Security Assessment Dashboard"));
        assert!(markdown.contains("`a-1`"));
        assert!(markdown.contains("| **3.25** / 5 | 12 | 3 |"));
        assert!(markdown.contains("## Scores by Domain"));
        assert!(markdown.contains("| Access Control | 4.50 |"));
        assert!(markdown.contains("## Top Strengths"));
        assert!(markdown.contains("## Focus Areas"));
    }

    #[test]
    fn test_markdown_respects_config() {
        let report = DashboardReport::from_view_model(&create_test_view_model(), "a-1");
        let config = ReportConfig {
            include_kpis: false,
            include_highlights: false,
            bar_width: 10,
        };
        let markdown = generate_markdown_report(&report, &config);

        assert!(!markdown.contains("## Overview"));
        assert!(!markdown.contains("## Top Strengths"));
        assert!(markdown.contains("`█████████░`"));
    }

    #[test]
    fn test_empty_series_message() {
        let report = DashboardReport::from_view_model(&DashboardViewModel::new(), "a-1");
        let markdown = generate_markdown_report(&report, &ReportConfig::default());
        assert!(markdown.contains("No scores to display"));
    }

    #[test]
    fn test_render_bar() {
        assert_eq!(render_bar(5.0, 4), "████");
        assert_eq!(render_bar(0.0, 4), "░░░░");
        assert_eq!(render_bar(2.5, 4), "██░░");
        assert_eq!(render_bar(7.0, 2), "██");
    }

    #[test]
    fn test_generate_json_report() {
        let report = DashboardReport::from_view_model(&create_test_view_model(), "a-1");
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"assessment_id\": \"a-1\""));
        assert!(json.contains("\"level\": \"domain\""));
        assert!(json.contains("\"series\""));
    }

    #[test]
    fn test_write_output() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("board.md");
        write_output("# Board\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "# Board\n");
    }
}
