//! Score aggregation for dashboard charts.
//!
//! Scores always originate upstream: domain and control averages come
//! straight from [`AssessmentStats`]. Subdomain and metric scores are
//! derived from those control averages:
//!
//! - a subdomain scores the mean of its controls' averages, weighted by
//!   each control's `total_questions`; its controls are the ones referenced
//!   by the domain's questions under that subdomain
//! - a metric inherits the average of its parent control
//!
//! Entities without any upstream data score `0.0`.

use crate::models::{
    AssessmentStats, ChartPoint, Control, Domain, DomainScore, Metric, Question, Subdomain,
};
use crate::viewmodel::selection::{HierarchyLevel, HierarchySelection};
use std::collections::{HashMap, HashSet};

/// Catalog lists visible to the chart derivation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogView<'a> {
    pub domains: &'a [Domain],
    pub subdomains: &'a [Subdomain],
    pub controls: &'a [Control],
    pub metrics: &'a [Metric],
    /// Questions of the selected domain.
    pub questions: &'a [Question],
}

/// Derive the chart series for the current selection.
///
/// The resolved level is the most specific one selected; entities are
/// listed in catalog order and never sorted by score.
pub fn derive_chart_series(
    stats: Option<&AssessmentStats>,
    catalog: &CatalogView<'_>,
    selection: &HierarchySelection,
) -> Vec<ChartPoint> {
    match selection.resolved_level() {
        HierarchyLevel::Domain => match stats {
            Some(stats) => domain_series(stats, catalog.domains),
            None => Vec::new(),
        },
        HierarchyLevel::Subdomain => {
            let domain_id = selection.domain_id().unwrap_or_default();
            catalog
                .subdomains
                .iter()
                .filter(|s| s.domain_id == domain_id)
                .map(|s| {
                    let score = stats
                        .map(|st| subdomain_score(st, catalog.questions, &s.id))
                        .unwrap_or(0.0);
                    ChartPoint::new(&s.name, score)
                })
                .collect()
        }
        HierarchyLevel::Control => {
            let subdomain_id = selection.subdomain_id().unwrap_or_default();
            catalog
                .controls
                .iter()
                .filter(|c| c.subdomain_id == subdomain_id)
                .map(|c| ChartPoint::new(&c.name, control_average(stats, &c.id)))
                .collect()
        }
        HierarchyLevel::Metric => {
            let control_id = selection.control_id().unwrap_or_default();
            catalog
                .metrics
                .iter()
                .filter(|m| m.control_id == control_id)
                .map(|m| ChartPoint::new(&m.name, control_average(stats, &m.control_id)))
                .collect()
        }
    }
}

/// One point per upstream domain score, in catalog domain order.
///
/// Scores for domains the catalog does not list keep their upstream order
/// after the known ones.
pub fn domain_series(stats: &AssessmentStats, domains: &[Domain]) -> Vec<ChartPoint> {
    let position: HashMap<&str, usize> = domains
        .iter()
        .enumerate()
        .map(|(idx, d)| (d.id.as_str(), idx))
        .collect();

    let mut scores: Vec<(usize, &DomainScore)> = stats
        .domain_scores
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            let key = position
                .get(s.domain_id.as_str())
                .copied()
                .unwrap_or(domains.len() + idx);
            (key, s)
        })
        .collect();

    // Stable, so unknown domains keep their relative order.
    scores.sort_by_key(|(key, _)| *key);

    scores
        .into_iter()
        .map(|(_, s)| ChartPoint::new(&s.domain_name, s.average_score))
        .collect()
}

/// Question-weighted mean of the control averages under a subdomain.
pub fn subdomain_score(stats: &AssessmentStats, questions: &[Question], subdomain_id: &str) -> f64 {
    let controls: HashSet<&str> = questions
        .iter()
        .filter(|q| q.subdomain_id == subdomain_id)
        .map(|q| q.control_id.as_str())
        .collect();

    let (weighted, weight) = stats
        .control_performance
        .iter()
        .filter(|c| controls.contains(c.control_id.as_str()))
        .fold((0.0, 0u32), |(sum, count), c| {
            (sum + c.average_score * c.total_questions as f64, count + c.total_questions)
        });

    if weight == 0 {
        0.0
    } else {
        round2(weighted / weight as f64)
    }
}

fn control_average(stats: Option<&AssessmentStats>, control_id: &str) -> f64 {
    stats
        .and_then(|s| s.control_score(control_id))
        .map(|c| c.average_score)
        .unwrap_or(0.0)
}

/// Group a domain's questions by subdomain id.
pub fn group_by_subdomain(questions: &[Question]) -> HashMap<String, Vec<&Question>> {
    let mut grouped: HashMap<String, Vec<&Question>> = HashMap::new();

    for question in questions {
        grouped
            .entry(question.subdomain_id.clone())
            .or_default()
            .push(question);
    }

    grouped
}

/// Highest series points, best first.
pub fn top_points(series: &[ChartPoint], n: usize) -> Vec<ChartPoint> {
    let mut sorted = series.to_vec();
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));
    sorted.truncate(n);
    sorted
}

/// Lowest series points, weakest first.
pub fn bottom_points(series: &[ChartPoint], n: usize) -> Vec<ChartPoint> {
    let mut sorted = series.to_vec();
    sorted.sort_by(|a, b| a.score.total_cmp(&b.score));
    sorted.truncate(n);
    sorted
}

/// Generate a text summary of the headline numbers.
pub fn generate_summary_text(stats: &AssessmentStats) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Overall Average: {:.2} / 5", stats.overall_average));
    lines.push(format!("Questions Answered: {}", stats.total_responses));
    lines.push(format!("Domains Completed: {}", stats.domains_completed));

    if !stats.top_strengths.is_empty() {
        lines.push(String::new());
        lines.push("Top Strengths:".to_string());
        for s in &stats.top_strengths {
            lines.push(format!("- {}: {:.2}", s.domain_name, s.average_score));
        }
    }

    if !stats.focus_areas.is_empty() {
        lines.push(String::new());
        lines.push("Focus Areas:".to_string());
        for s in &stats.focus_areas {
            lines.push(format!("- {}: {:.2}", s.domain_name, s.average_score));
        }
    }

    lines.join("\n")
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{ControlInfo, ControlScore};
    use crate::viewmodel::selection::SelectionAction;

    pub(crate) fn domain(id: &str, name: &str) -> Domain {
        Domain {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            icon: None,
            order: 0,
        }
    }

    pub(crate) fn domain_score(id: &str, name: &str, avg: f64) -> DomainScore {
        DomainScore {
            domain_id: id.to_string(),
            domain_name: name.to_string(),
            average_score: avg,
            total_questions: 2,
            total_score: None,
        }
    }

    pub(crate) fn control_score(id: &str, avg: f64, questions: u32) -> ControlScore {
        ControlScore {
            control_id: id.to_string(),
            control_name: format!("Control {}", id),
            domain_id: "d1".to_string(),
            domain_name: "Access Control".to_string(),
            average_score: avg,
            total_questions: questions,
        }
    }

    pub(crate) fn question(id: &str, domain: &str, subdomain: &str, control: &str) -> Question {
        Question {
            id: id.to_string(),
            domain_id: domain.to_string(),
            subdomain_id: subdomain.to_string(),
            control_id: control.to_string(),
            metric_id: format!("m-{}", control),
            subdomain: String::new(),
            control: ControlInfo::default(),
            metric: String::new(),
            question_text: format!("Question {}", id),
            answers: vec![
                crate::models::Answer {
                    id: format!("{}-a0", id),
                    answer_text: "No".to_string(),
                    score_value: 0.0,
                },
                crate::models::Answer {
                    id: format!("{}-a5", id),
                    answer_text: "Yes".to_string(),
                    score_value: 5.0,
                },
            ],
        }
    }

    fn five_domain_stats() -> (Vec<Domain>, AssessmentStats) {
        let names = [
            "Information Security Governance",
            "Access Control",
            "Data Protection",
            "Network Security",
            "Incident Response",
        ];
        let domains: Vec<Domain> = names
            .iter()
            .enumerate()
            .map(|(i, n)| domain(&format!("d{}", i + 1), n))
            .collect();

        // Upstream order differs from catalog order.
        let scores = [(3, 2.5), (1, 4.0), (5, 0.5), (2, 3.25), (4, 5.0)];
        let stats = AssessmentStats {
            domain_scores: scores
                .iter()
                .map(|(i, avg)| domain_score(&format!("d{}", i), names[i - 1], *avg))
                .collect(),
            ..Default::default()
        };
        (domains, stats)
    }

    #[test]
    fn test_domain_series_in_catalog_order() {
        let (domains, stats) = five_domain_stats();
        let catalog = CatalogView {
            domains: &domains,
            ..Default::default()
        };

        let series = derive_chart_series(Some(&stats), &catalog, &HierarchySelection::new());

        assert_eq!(series.len(), stats.domain_scores.len());
        let labels: Vec<_> = series.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Information Security Governance",
                "Access Control",
                "Data Protection",
                "Network Security",
                "Incident Response"
            ]
        );
        assert_eq!(series[0].score, 4.0);
        assert_eq!(series[2].score, 2.5);
        assert!(series.iter().all(|p| (0.0..=5.0).contains(&p.score)));
    }

    #[test]
    fn test_domain_series_unknown_domains_keep_upstream_order() {
        let domains = vec![domain("d1", "Known")];
        let stats = AssessmentStats {
            domain_scores: vec![
                domain_score("x2", "Second Unknown", 1.0),
                domain_score("d1", "Known", 2.0),
                domain_score("x1", "First Unknown", 3.0),
            ],
            ..Default::default()
        };

        let series = domain_series(&stats, &domains);
        let labels: Vec<_> = series.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Known", "Second Unknown", "First Unknown"]);
    }

    #[test]
    fn test_no_stats_yields_empty_domain_series() {
        let series = derive_chart_series(None, &CatalogView::default(), &HierarchySelection::new());
        assert!(series.is_empty());
    }

    #[test]
    fn test_subdomain_score_is_question_weighted() {
        let stats = AssessmentStats {
            control_performance: vec![
                control_score("c1", 4.0, 3),
                control_score("c2", 1.0, 1),
                control_score("c3", 5.0, 2),
            ],
            ..Default::default()
        };
        let questions = vec![
            question("q1", "d1", "s1", "c1"),
            question("q2", "d1", "s1", "c2"),
            question("q3", "d1", "s2", "c3"),
        ];

        // (4*3 + 1*1) / 4
        assert_eq!(subdomain_score(&stats, &questions, "s1"), 3.25);
        assert_eq!(subdomain_score(&stats, &questions, "s2"), 5.0);
        assert_eq!(subdomain_score(&stats, &questions, "unknown"), 0.0);
    }

    #[test]
    fn test_subdomain_series_filters_by_domain() {
        let stats = AssessmentStats {
            control_performance: vec![control_score("c1", 3.0, 2)],
            ..Default::default()
        };
        let subdomains = vec![
            Subdomain {
                id: "s1".to_string(),
                domain_id: "d1".to_string(),
                name: "User Authentication".to_string(),
                description: None,
            },
            Subdomain {
                id: "s9".to_string(),
                domain_id: "d9".to_string(),
                name: "Elsewhere".to_string(),
                description: None,
            },
            Subdomain {
                id: "s2".to_string(),
                domain_id: "d1".to_string(),
                name: "Authorization Management".to_string(),
                description: None,
            },
        ];
        let questions = vec![question("q1", "d1", "s1", "c1")];
        let catalog = CatalogView {
            subdomains: &subdomains,
            questions: &questions,
            ..Default::default()
        };
        let mut selection = HierarchySelection::new();
        selection.apply(SelectionAction::Domain(Some("d1".to_string())));

        let series = derive_chart_series(Some(&stats), &catalog, &selection);

        assert_eq!(
            series,
            vec![
                ChartPoint::new("User Authentication", 3.0),
                ChartPoint::new("Authorization Management", 0.0),
            ]
        );
    }

    #[test]
    fn test_metric_inherits_control_score() {
        let stats = AssessmentStats {
            control_performance: vec![control_score("c1", 2.5, 2)],
            ..Default::default()
        };
        let metrics = vec![
            Metric {
                id: "m1".to_string(),
                control_id: "c1".to_string(),
                name: "MFA Coverage".to_string(),
                description: None,
            },
            Metric {
                id: "m2".to_string(),
                control_id: "c2".to_string(),
                name: "Other".to_string(),
                description: None,
            },
        ];
        let catalog = CatalogView {
            metrics: &metrics,
            ..Default::default()
        };
        let mut selection = HierarchySelection::new();
        selection.apply(SelectionAction::Domain(Some("d1".to_string())));
        selection.apply(SelectionAction::Subdomain(Some("s1".to_string())));
        selection.apply(SelectionAction::Control(Some("c1".to_string())));

        let series = derive_chart_series(Some(&stats), &catalog, &selection);
        assert_eq!(series, vec![ChartPoint::new("MFA Coverage", 2.5)]);
    }

    #[test]
    fn test_top_and_bottom_points() {
        let series = vec![
            ChartPoint::new("a", 1.0),
            ChartPoint::new("b", 4.0),
            ChartPoint::new("c", 2.0),
        ];
        assert_eq!(top_points(&series, 1)[0].label, "b");
        assert_eq!(bottom_points(&series, 2)[1].label, "c");
    }

    #[test]
    fn test_group_by_subdomain() {
        let questions = vec![
            question("q1", "d1", "s1", "c1"),
            question("q2", "d1", "s2", "c2"),
            question("q3", "d1", "s1", "c1"),
        ];
        let grouped = group_by_subdomain(&questions);
        assert_eq!(grouped.get("s1").map(|v| v.len()), Some(2));
        assert_eq!(grouped.get("s2").map(|v| v.len()), Some(1));
    }

    #[test]
    fn test_generate_summary_text() {
        let stats = AssessmentStats {
            overall_average: 3.4,
            total_responses: 20,
            domains_completed: 5,
            top_strengths: vec![domain_score("d2", "Access Control", 4.5)],
            ..Default::default()
        };
        let text = generate_summary_text(&stats);
        assert!(text.contains("Overall Average: 3.40 / 5"));
        assert!(text.contains("Top Strengths:"));
        assert!(text.contains("- Access Control: 4.50"));
        assert!(!text.contains("Focus Areas:"));
    }
}
