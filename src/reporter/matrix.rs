use crate::models::{AuditReport, HttpMethod, Severity};

/// Endpoint × method view of an outcome table.
pub struct MethodMatrix {
    methods: Vec<HttpMethod>,
    entries: Vec<MatrixEntry>,
}

pub struct MatrixEntry {
    pub endpoint: String,
    /// One cell per matrix method, in matrix order.
    pub cells: Vec<String>,
    pub severity: Option<Severity>,
}

impl MethodMatrix {
    pub fn from_report(report: &AuditReport) -> Self {
        let methods = report.parameters.methods.clone();

        let entries = report
            .outcomes
            .rows()
            .iter()
            .map(|row| {
                let cells = methods
                    .iter()
                    .map(|&m| {
                        let label = row
                            .get(m)
                            .map(|r| r.outcome.label())
                            .unwrap_or_else(|| "-".to_string());
                        if Self::flagged(report, &row.endpoint, m) {
                            format!("{} ⚠", label)
                        } else {
                            label
                        }
                    })
                    .collect();

                let severity = report
                    .findings
                    .iter()
                    .filter(|f| f.endpoint.as_ref() == Some(&row.endpoint))
                    .map(|f| f.severity)
                    .max();

                MatrixEntry {
                    endpoint: row.endpoint.display_path(),
                    cells,
                    severity,
                }
            })
            .collect();

        Self { methods, entries }
    }

    fn flagged(report: &AuditReport, endpoint: &crate::models::Endpoint, method: HttpMethod) -> bool {
        report
            .findings
            .iter()
            .any(|f| f.method == Some(method) && f.endpoint.as_ref() == Some(endpoint) && f.severity > Severity::Info)
    }

    pub fn methods(&self) -> &[HttpMethod] {
        &self.methods
    }

    pub fn entries(&self) -> &[MatrixEntry] {
        &self.entries
    }
}
