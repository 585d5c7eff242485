//! Run summary printed after a check.

use std::fmt;

use serde::Serialize;
use stap_core::{Domain, ForceReport, SolutionMode};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadCaseSummary {
    pub load_case: usize,
    pub applied: usize,
    pub dropped: usize,
}

impl From<&ForceReport> for LoadCaseSummary {
    fn from(report: &ForceReport) -> Self {
        Self {
            load_case: report.load_case,
            applied: report.applied,
            dropped: report.dropped.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub title: String,
    pub mode: SolutionMode,
    pub num_nodes: usize,
    pub num_elements: usize,
    pub neq: usize,
    /// Absent in data-check runs, which stop after numbering.
    pub skyline_length: Option<usize>,
    pub max_half_bandwidth: Option<usize>,
    pub mean_half_bandwidth: Option<f64>,
    pub load_cases: Vec<LoadCaseSummary>,
    pub timestamp: String,
}

impl Summary {
    pub fn from_domain(domain: &Domain, reports: &[ForceReport]) -> Self {
        let layout = domain.layout();
        Self {
            title: domain.title().to_string(),
            mode: domain.mode(),
            num_nodes: domain.nodes().len(),
            num_elements: domain.num_elements(),
            neq: domain.neq(),
            skyline_length: layout.map(|l| l.len()),
            max_half_bandwidth: layout.map(|l| l.max_half_bandwidth()),
            mean_half_bandwidth: layout.map(|l| l.mean_half_bandwidth()),
            load_cases: reports.iter().map(LoadCaseSummary::from).collect(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "title: {}", self.title)?;
        writeln!(f, "mode: {:?}", self.mode)?;
        writeln!(f, "nodes: {}", self.num_nodes)?;
        writeln!(f, "elements: {}", self.num_elements)?;
        writeln!(f, "equations: {}", self.neq)?;
        if let (Some(len), Some(max), Some(mean)) = (
            self.skyline_length,
            self.max_half_bandwidth,
            self.mean_half_bandwidth,
        ) {
            writeln!(f, "skyline_length: {len}")?;
            writeln!(f, "max_half_bandwidth: {max}")?;
            writeln!(f, "mean_half_bandwidth: {mean:.2}")?;
        }
        for case in &self.load_cases {
            writeln!(
                f,
                "load_case {}: {} applied, {} dropped",
                case.load_case, case.applied, case.dropped
            )?;
        }
        write!(f, "timestamp: {}", self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stap_core::AnalysisConfig;
    use stap_inp::Deck;

    const DECK: &str = "\
two bars
3 1 1 1
1 1 1 1 0.0 0.0 0.0
2 0 1 1 1.0 0.0 0.0
3 1 1 1 2.0 0.0 0.0
1 2
2 1 5.0
1 1 5.0
1 2 1
1 1.0 1.0
1 1 2 1
2 2 3 1
";

    fn domain() -> Domain {
        let mut domain = Domain::new(AnalysisConfig::default());
        domain.load(&Deck::parse_str(DECK).unwrap()).unwrap();
        domain.number_equations().unwrap();
        domain
    }

    #[test]
    fn data_check_summary_has_no_skyline() {
        let summary = Summary::from_domain(&domain(), &[]);
        assert_eq!(summary.neq, 1);
        assert_eq!(summary.num_elements, 2);
        assert!(summary.skyline_length.is_none());
        assert!(!summary.to_string().contains("skyline_length"));
    }

    #[test]
    fn counts_applied_and_dropped_loads() {
        let mut domain = domain();
        domain.allocate_matrices().unwrap();
        domain.assemble().unwrap();
        let report = domain.assemble_force(1).unwrap();

        let summary = Summary::from_domain(&domain, &[report]);
        assert_eq!(summary.skyline_length, Some(1));
        assert_eq!(
            summary.load_cases,
            vec![LoadCaseSummary {
                load_case: 1,
                applied: 1,
                dropped: 1
            }]
        );
        assert!(summary.to_string().contains("load_case 1: 1 applied, 1 dropped"));
    }

    #[test]
    fn serializes_to_json() {
        let summary = Summary::from_domain(&domain(), &[]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["title"], "two bars");
        assert_eq!(json["mode"], "static");
        assert!(json["skyline_length"].is_null());
    }
}
