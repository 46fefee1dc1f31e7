use std::cmp::Ordering;

use super::rules::{Rule, RuleConfig, default_rules};
use crate::models::{Finding, OutcomeRow, OutcomeTable};

pub struct Classifier {
    rules: Vec<Box<dyn Rule>>,
    config: RuleConfig,
}

impl Classifier {
    pub fn new(config: RuleConfig) -> Self {
        Self::with_rules(default_rules(), config)
    }

    pub fn with_rules(rules: Vec<Box<dyn Rule>>, config: RuleConfig) -> Self {
        Self { rules, config }
    }

    /// Pure over its input: the same table always yields the same list.
    pub fn classify(&self, table: &OutcomeTable) -> Vec<Finding> {
        let mut findings: Vec<Finding> = table
            .rows()
            .iter()
            .flat_map(|row| self.classify_row(row))
            .collect();
        sort_findings(&mut findings);
        findings
    }

    pub fn classify_row(&self, row: &OutcomeRow) -> Vec<Finding> {
        let mut findings = Vec::new();

        for result in &row.results {
            for rule in &self.rules {
                if !self.config.is_enabled(rule.id()) {
                    continue;
                }
                if let Some(finding) = rule.evaluate(row, result, &self.config) {
                    findings.push(finding);
                }
            }
        }

        sort_findings(&mut findings);
        findings
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(RuleConfig::default())
    }
}

pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.endpoint.cmp(&b.endpoint))
            .then_with(|| compare_methods(a, b))
            .then_with(|| a.rule.cmp(&b.rule))
            .then_with(|| a.rationale.cmp(&b.rationale))
    });
}

fn compare_methods(a: &Finding, b: &Finding) -> Ordering {
    a.method.map(|m| m.rank()).cmp(&b.method.map(|m| m.rank()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Endpoint, HttpMethod, MethodProbeResult, ProbeOutcome, QueryPolicy, RuleId, Severity,
        TransportErrorKind,
    };
    use std::collections::BTreeMap;

    fn endpoint(path: &str) -> Endpoint {
        Endpoint::parse(&format!("http://target.test{}", path), QueryPolicy::Preserve).unwrap()
    }

    fn responded(status: u16, headers: &[(&str, &str)], body: &str) -> ProbeOutcome {
        ProbeOutcome::Responded {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            body_excerpt: body.to_string(),
            latency_ms: 5,
        }
    }

    fn row(path: &str, outcomes: Vec<(HttpMethod, ProbeOutcome)>) -> OutcomeRow {
        let ep = endpoint(path);
        let results = outcomes
            .into_iter()
            .map(|(m, o)| MethodProbeResult::new(ep.clone(), m, o))
            .collect();
        OutcomeRow::new(ep, results)
    }

    fn table(rows: Vec<OutcomeRow>) -> OutcomeTable {
        rows.into_iter().collect()
    }

    fn rules_fired(findings: &[Finding]) -> Vec<RuleId> {
        findings.iter().map(|f| f.rule).collect()
    }

    #[test]
    fn test_trace_reflection_is_high() {
        let t = table(vec![row(
            "/",
            vec![
                (HttpMethod::Get, responded(200, &[], "<html></html>")),
                (
                    HttpMethod::Trace,
                    responded(200, &[("Content-Type", "message/http")], "TRACE / HTTP/1.1\r\nUser-Agent: verbaudit\r\n"),
                ),
            ],
        )]);

        let findings = Classifier::default().classify(&t);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].rule, RuleId::TraceReflection);
        assert_eq!(findings[0].method, Some(HttpMethod::Trace));
        assert!(findings[0].rationale.contains("echoed"));
    }

    #[test]
    fn test_trace_rejected_is_clean() {
        let t = table(vec![row("/", vec![(HttpMethod::Trace, responded(403, &[], ""))])]);
        assert!(Classifier::default().classify(&t).is_empty());
    }

    #[test]
    fn test_unauthenticated_put_is_critical() {
        let t = table(vec![row(
            "/resource",
            vec![
                (HttpMethod::Get, responded(200, &[], "")),
                (HttpMethod::Put, responded(201, &[], "")),
            ],
        )]);

        let findings = Classifier::default().classify(&t);

        assert_eq!(rules_fired(&findings), vec![RuleId::UnauthenticatedWrite]);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].method, Some(HttpMethod::Put));
    }

    #[test]
    fn test_write_behind_auth_challenge_is_suppressed() {
        for challenge in [401, 403] {
            let t = table(vec![row(
                "/resource",
                vec![
                    (HttpMethod::Get, responded(challenge, &[], "")),
                    (HttpMethod::Delete, responded(204, &[], "")),
                ],
            )]);
            assert!(Classifier::default().classify(&t).is_empty());
        }
    }

    #[test]
    fn test_write_without_baseline_get_still_fires() {
        let t = table(vec![row("/r", vec![(HttpMethod::Delete, responded(200, &[], ""))])]);
        let findings = Classifier::default().classify(&t);
        assert_eq!(rules_fired(&findings), vec![RuleId::UnauthenticatedWrite]);
    }

    #[test]
    fn test_options_disclosure_is_medium() {
        let t = table(vec![row(
            "/api",
            vec![(
                HttpMethod::Options,
                responded(200, &[("Allow", "GET, POST, PUT, DELETE, PROPFIND")], ""),
            )],
        )]);

        let findings = Classifier::default().classify(&t);

        assert_eq!(rules_fired(&findings), vec![RuleId::OptionsMethodDisclosure]);
        assert_eq!(findings[0].severity, Severity::Medium);
        assert!(findings[0].rationale.contains("PUT, DELETE, PROPFIND"));
    }

    #[test]
    fn test_options_with_expected_methods_is_clean() {
        let t = table(vec![row(
            "/api",
            vec![(HttpMethod::Options, responded(204, &[("Allow", "GET, HEAD, POST, OPTIONS")], ""))],
        )]);
        assert!(Classifier::default().classify(&t).is_empty());
    }

    #[test]
    fn test_every_method_405_yields_nothing() {
        let outcomes = HttpMethod::ALL
            .iter()
            .map(|&m| (m, responded(405, &[("Allow", "GET")], "")))
            .collect();
        let t = table(vec![row("/", outcomes)]);
        assert!(Classifier::default().classify(&t).is_empty());
    }

    #[test]
    fn test_server_error_is_low() {
        let t = table(vec![row("/", vec![(HttpMethod::Patch, responded(500, &[], "boom"))])]);
        let findings = Classifier::default().classify(&t);
        assert_eq!(rules_fired(&findings), vec![RuleId::ServerError]);
        assert_eq!(findings[0].severity, Severity::Low);
    }

    #[test]
    fn test_connect_success_is_flagged() {
        let t = table(vec![row("/", vec![(HttpMethod::Connect, responded(200, &[], ""))])]);
        let findings = Classifier::default().classify(&t);
        assert_eq!(rules_fired(&findings), vec![RuleId::ConnectAccepted]);
    }

    #[test]
    fn test_transport_errors_yield_nothing_by_default() {
        let failure = |kind| ProbeOutcome::TransportError {
            error: kind,
            message: "x".to_string(),
            latency_ms: 1,
            verify_tls: true,
        };
        let t = table(vec![row(
            "/",
            vec![
                (HttpMethod::Get, failure(TransportErrorKind::Timeout)),
                (HttpMethod::Put, failure(TransportErrorKind::Tls)),
                (HttpMethod::Connect, failure(TransportErrorKind::ConnectionRefused)),
            ],
        )]);

        assert!(Classifier::default().classify(&t).is_empty());

        let flagged = Classifier::new(RuleConfig {
            flag_tls_failures: true,
            ..RuleConfig::default()
        })
        .classify(&t);
        assert_eq!(rules_fired(&flagged), vec![RuleId::TlsVerificationFailure]);
        assert_eq!(flagged[0].severity, Severity::Info);
    }

    #[test]
    fn test_tls_failure_ignored_when_verification_was_off() {
        let t = table(vec![row(
            "/",
            vec![(
                HttpMethod::Put,
                ProbeOutcome::TransportError {
                    error: TransportErrorKind::Tls,
                    message: "handshake failed".to_string(),
                    latency_ms: 3,
                    verify_tls: false,
                },
            )],
        )]);

        let findings = Classifier::new(RuleConfig {
            flag_tls_failures: true,
            ..RuleConfig::default()
        })
        .classify(&t);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_anomalous_status_becomes_info() {
        let t = table(vec![row("/", vec![(HttpMethod::Get, responded(999, &[], ""))])]);
        let findings = Classifier::default().classify(&t);
        assert_eq!(rules_fired(&findings), vec![RuleId::AnomalousOutcome]);
        assert_eq!(findings[0].severity, Severity::Info);
    }

    #[test]
    fn test_mismatched_row_endpoint_becomes_info() {
        let mut r = row("/a", vec![(HttpMethod::Get, responded(200, &[], ""))]);
        r.results[0].endpoint = endpoint("/b");
        let findings = Classifier::default().classify(&table(vec![r]));
        assert_eq!(rules_fired(&findings), vec![RuleId::AnomalousOutcome]);
    }

    #[test]
    fn test_multiple_rules_accumulate_and_sort_by_severity() {
        let t = table(vec![row(
            "/",
            vec![
                (HttpMethod::Get, responded(200, &[], "")),
                (HttpMethod::Put, responded(200, &[], "")),
                (HttpMethod::Options, responded(200, &[("Allow", "GET, PUT")], "")),
                (HttpMethod::Trace, responded(200, &[], "")),
                (HttpMethod::Patch, responded(502, &[], "")),
            ],
        )]);

        let findings = Classifier::default().classify(&t);

        let severities: Vec<_> = findings.iter().map(|f| f.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::Critical, Severity::High, Severity::Medium, Severity::Low]
        );
    }

    #[test]
    fn test_classification_is_deterministic() {
        let t = table(vec![
            row("/b", vec![(HttpMethod::Trace, responded(200, &[], "")), (HttpMethod::Put, responded(500, &[], ""))]),
            row("/a", vec![(HttpMethod::Delete, responded(204, &[], "")), (HttpMethod::Trace, responded(200, &[], ""))]),
        ]);
        let classifier = Classifier::default();
        assert_eq!(classifier.classify(&t), classifier.classify(&t));
    }

    #[test]
    fn test_disabled_rules_and_overrides() {
        let t = table(vec![row(
            "/",
            vec![
                (HttpMethod::Patch, responded(200, &[], "")),
                (HttpMethod::Trace, responded(200, &[], "")),
            ],
        )]);

        let config = RuleConfig {
            write_methods: vec![HttpMethod::Put, HttpMethod::Delete, HttpMethod::Patch],
            disabled_rules: vec![RuleId::TraceReflection],
            ..RuleConfig::default()
        };
        let findings = Classifier::new(config).classify(&t);

        assert_eq!(rules_fired(&findings), vec![RuleId::UnauthenticatedWrite]);
        assert_eq!(findings[0].method, Some(HttpMethod::Patch));
    }

    #[test]
    fn test_rule_config_partial_json() {
        let config: RuleConfig =
            serde_json::from_str(r#"{"trace_max_status": 300, "disabled_rules": ["server-error"]}"#).unwrap();
        assert_eq!(config.trace_max_status, 300);
        assert_eq!(config.write_methods, RuleConfig::default().write_methods);
        assert!(!config.is_enabled(RuleId::ServerError));
    }

    #[test]
    fn test_rule_config_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = RuleConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("rules.json"));
    }
}
