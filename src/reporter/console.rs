use colored::{ColoredString, Colorize};
use tabled::builder::Builder;
use tabled::settings::{Alignment, Modify, Style, object::Rows};

use super::matrix::MethodMatrix;
use crate::models::{AuditReport, Severity};

pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn print_report(&self, report: &AuditReport) {
        self.print_matrix(report);
        self.print_details(report);
        self.print_summary(report);
    }

    pub fn print_matrix(&self, report: &AuditReport) {
        if report.outcomes.is_empty() {
            return;
        }

        let matrix = MethodMatrix::from_report(report);
        let mut builder = Builder::default();

        let mut header = vec!["Endpoint".to_string()];
        header.extend(matrix.methods().iter().map(|m| m.to_string()));
        header.push("Status".to_string());
        builder.push_record(header);

        for entry in matrix.entries() {
            let mut record = vec![entry.endpoint.clone()];
            record.extend(entry.cells.iter().cloned());
            record.push(Self::severity_label(entry.severity).to_string());
            builder.push_record(record);
        }

        let table = builder
            .build()
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .to_string();

        println!("\n{}", table);
    }

    pub fn print_summary(&self, report: &AuditReport) {
        let summary = report.summary();

        println!("\n{}", "Summary".bold().underline());
        println!(
            "{} endpoints, {} probes in {:.2}s ({} transport errors)",
            summary.total_endpoints,
            summary.total_probes,
            summary.duration_ms as f64 / 1000.0,
            summary.transport_errors
        );

        if summary.critical_count > 0 {
            println!("  {}: {}", "CRITICAL".red().bold(), summary.critical_count);
        }
        if summary.high_count > 0 {
            println!("  {}: {}", "HIGH".red(), summary.high_count);
        }
        if summary.medium_count > 0 {
            println!("  {}: {}", "MEDIUM".yellow(), summary.medium_count);
        }
        if summary.low_count > 0 {
            println!("  {}: {}", "LOW".blue(), summary.low_count);
        }
        if summary.info_count > 0 {
            println!("  {}: {}", "INFO".cyan(), summary.info_count);
        }
        println!("  {}: {}", "Clean endpoints".green(), summary.clean_endpoints);

        if report.interrupted {
            println!("  {}", "Audit interrupted: results are partial".yellow());
        }
        println!();
    }

    pub fn print_details(&self, report: &AuditReport) {
        if report.findings.is_empty() {
            return;
        }

        println!("\n{}", "Findings".bold().underline());

        for finding in &report.findings {
            println!(
                "\n[{}] {} {}",
                Self::severity_label(Some(finding.severity)),
                finding.location().white().bold(),
                format!("({})", finding.rule).dimmed()
            );
            println!("  → {}", finding.rationale);

            let recommendation = finding.rule.recommendation();
            if !recommendation.is_empty() {
                println!("    {}: {}", "Fix".cyan(), recommendation);
            }
        }
    }

    fn severity_label(severity: Option<Severity>) -> ColoredString {
        match severity {
            Some(Severity::Critical) => "CRITICAL".red().bold(),
            Some(Severity::High) => "HIGH".red(),
            Some(Severity::Medium) => "MEDIUM".yellow(),
            Some(Severity::Low) => "LOW".blue(),
            Some(Severity::Info) => "INFO".cyan(),
            None => "OK".green(),
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}
