use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tera::{Context as TeraContext, Tera};

use crate::models::{AuditReport, Severity};
use super::matrix::MethodMatrix;

pub struct JsonExporter;

impl JsonExporter {
    pub fn to_string(report: &AuditReport) -> Result<String> {
        serde_json::to_string_pretty(report).context("Failed to serialize report")
    }

    pub fn export(report: &AuditReport, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = Self::to_string(report)?;
        fs::write(path, json).with_context(|| format!("Failed to write to {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<AuditReport> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("{} is not a verbaudit JSON report", path.display()))
    }
}

pub struct HtmlExporter;

impl HtmlExporter {
    pub fn render(report: &AuditReport) -> Result<String> {
        let mut tera = Tera::default();
        tera.add_raw_template("report.html", TEMPLATE)?;

        let summary = report.summary();
        let matrix = MethodMatrix::from_report(report);

        let mut context = TeraContext::new();
        context.insert("target", &report.target);
        context.insert(
            "scan_time",
            &report.finished_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
        context.insert("interrupted", &report.interrupted);
        context.insert("total_endpoints", &summary.total_endpoints);
        context.insert("total_probes", &summary.total_probes);
        context.insert("critical_count", &summary.critical_count);
        context.insert("high_count", &summary.high_count);
        context.insert("medium_count", &summary.medium_count);
        context.insert("low_count", &summary.low_count);
        context.insert("info_count", &summary.info_count);
        context.insert(
            "methods",
            &matrix.methods().iter().map(|m| m.to_string()).collect::<Vec<_>>(),
        );

        let rows: Vec<HtmlRow> = matrix
            .entries()
            .iter()
            .map(|entry| HtmlRow {
                endpoint: entry.endpoint.clone(),
                cells: entry.cells.clone(),
                severity: entry
                    .severity
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "OK".to_string()),
                severity_class: Self::severity_class(entry.severity),
            })
            .collect();
        context.insert("rows", &rows);

        let findings: Vec<FindingRow> = report
            .findings
            .iter()
            .map(|f| FindingRow {
                location: f.location(),
                rule: f.rule.to_string(),
                severity: f.severity.to_string(),
                severity_class: Self::severity_class(Some(f.severity)),
                rationale: f.rationale.clone(),
                recommendation: f.rule.recommendation().to_string(),
            })
            .collect();
        context.insert("findings", &findings);

        Ok(tera.render("report.html", &context)?)
    }

    pub fn export(report: &AuditReport, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let html = Self::render(report)?;
        fs::write(path, html).with_context(|| format!("Failed to write to {}", path.display()))?;
        Ok(())
    }

    fn severity_class(severity: Option<Severity>) -> String {
        match severity {
            Some(Severity::Critical) => "critical",
            Some(Severity::High) => "high",
            Some(Severity::Medium) => "medium",
            Some(Severity::Low) => "low",
            Some(Severity::Info) => "info",
            None => "ok",
        }
        .to_string()
    }
}

#[derive(serde::Serialize)]
struct HtmlRow {
    endpoint: String,
    cells: Vec<String>,
    severity: String,
    severity_class: String,
}

#[derive(serde::Serialize)]
struct FindingRow {
    location: String,
    rule: String,
    severity: String,
    severity_class: String,
    rationale: String,
    recommendation: String,
}

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>verbaudit report: {{ target }}</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #0d1117; color: #c9d1d9; line-height: 1.6; }
        .container { max-width: 1200px; margin: 0 auto; padding: 2rem; }
        h1 { color: #58a6ff; margin-bottom: 0.5rem; }
        h2 { margin: 2rem 0 1rem; }
        .subtitle { color: #8b949e; margin-bottom: 2rem; }
        .warning { color: #d29922; margin-bottom: 1rem; }
        .summary { display: grid; grid-template-columns: repeat(auto-fit, minmax(140px, 1fr)); gap: 1rem; margin-bottom: 2rem; }
        .stat { background: #161b22; border: 1px solid #30363d; border-radius: 6px; padding: 1rem; text-align: center; }
        .stat-value { font-size: 2rem; font-weight: bold; }
        .stat-label { color: #8b949e; font-size: 0.875rem; }
        .critical .stat-value, .high .stat-value { color: #f85149; }
        .medium .stat-value { color: #d29922; }
        .low .stat-value { color: #58a6ff; }
        .info .stat-value { color: #8b949e; }
        table { width: 100%; border-collapse: collapse; background: #161b22; border: 1px solid #30363d; border-radius: 6px; overflow: hidden; }
        th, td { padding: 0.5rem 0.75rem; text-align: left; border-bottom: 1px solid #30363d; font-size: 0.875rem; }
        th { background: #21262d; color: #c9d1d9; font-weight: 600; }
        tr:hover { background: #21262d; }
        .severity { padding: 0.25rem 0.5rem; border-radius: 4px; font-size: 0.75rem; font-weight: 600; }
        .severity.critical, .severity.high { background: #f8514933; color: #f85149; }
        .severity.medium { background: #d2992233; color: #d29922; }
        .severity.low { background: #58a6ff33; color: #58a6ff; }
        .severity.info { background: #8b949e33; color: #8b949e; }
        .severity.ok { background: #3fb95033; color: #3fb950; }
        .rule { color: #f0883e; font-family: monospace; }
        .fix { color: #8b949e; }
    </style>
</head>
<body>
    <div class="container">
        <h1>HTTP Method Audit</h1>
        <p class="subtitle">{{ target }} &middot; {{ scan_time }} &middot; {{ total_probes }} probes</p>
        {% if interrupted %}<p class="warning">Audit was interrupted; results are partial.</p>{% endif %}

        <div class="summary">
            <div class="stat"><div class="stat-value">{{ total_endpoints }}</div><div class="stat-label">Endpoints</div></div>
            <div class="stat critical"><div class="stat-value">{{ critical_count }}</div><div class="stat-label">Critical</div></div>
            <div class="stat high"><div class="stat-value">{{ high_count }}</div><div class="stat-label">High</div></div>
            <div class="stat medium"><div class="stat-value">{{ medium_count }}</div><div class="stat-label">Medium</div></div>
            <div class="stat low"><div class="stat-value">{{ low_count }}</div><div class="stat-label">Low</div></div>
            <div class="stat info"><div class="stat-value">{{ info_count }}</div><div class="stat-label">Info</div></div>
        </div>

        {% if rows %}
        <table>
            <thead>
                <tr>
                    <th>Endpoint</th>
                    {% for method in methods %}<th>{{ method }}</th>{% endfor %}
                    <th>Status</th>
                </tr>
            </thead>
            <tbody>
                {% for row in rows %}
                <tr>
                    <td>{{ row.endpoint }}</td>
                    {% for cell in row.cells %}<td>{{ cell }}</td>{% endfor %}
                    <td><span class="severity {{ row.severity_class }}">{{ row.severity }}</span></td>
                </tr>
                {% endfor %}
            </tbody>
        </table>
        {% endif %}

        {% if findings %}
        <h2>Findings</h2>
        <table>
            <thead>
                <tr><th>Severity</th><th>Location</th><th>Rule</th><th>Details</th></tr>
            </thead>
            <tbody>
                {% for f in findings %}
                <tr>
                    <td><span class="severity {{ f.severity_class }}">{{ f.severity }}</span></td>
                    <td>{{ f.location }}</td>
                    <td class="rule">{{ f.rule }}</td>
                    <td>{{ f.rationale }}{% if f.recommendation %}<div class="fix">Fix: {{ f.recommendation }}</div>{% endif %}</td>
                </tr>
                {% endfor %}
            </tbody>
        </table>
        {% endif %}
    </div>
</body>
</html>"#;
