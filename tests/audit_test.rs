use std::net::TcpListener;
use std::sync::Arc;

use verbaudit::reporter::JsonExporter;
use verbaudit::{AuditConfig, Auditor, HttpClient, HttpMethod, RuleId, Severity};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

async fn respond(server: &MockServer, verb: &str, at: &str, template: ResponseTemplate) {
    Mock::given(method(verb))
        .and(path(at))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn vulnerable_server() -> MockServer {
    let server = MockServer::start().await;

    respond(&server, "GET", "/api", ResponseTemplate::new(200)).await;
    respond(&server, "PUT", "/api", ResponseTemplate::new(201)).await;
    respond(
        &server,
        "TRACE",
        "/api",
        ResponseTemplate::new(200).set_body_string("TRACE /api HTTP/1.1\r\nuser-agent: verbaudit\r\n"),
    )
    .await;
    respond(
        &server,
        "OPTIONS",
        "/api",
        ResponseTemplate::new(200).insert_header("Allow", "GET, PUT, TRACE, OPTIONS"),
    )
    .await;

    respond(&server, "GET", "/admin", ResponseTemplate::new(401)).await;
    respond(&server, "PUT", "/admin", ResponseTemplate::new(200)).await;
    respond(&server, "TRACE", "/admin", ResponseTemplate::new(405)).await;
    respond(&server, "OPTIONS", "/admin", ResponseTemplate::new(204)).await;

    server
}

fn config(target: &str) -> AuditConfig {
    let mut config = AuditConfig::new(target);
    config.methods = vec![
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Options,
        HttpMethod::Trace,
    ];
    config
}

#[tokio::test]
async fn test_audit_classifies_exposed_methods() {
    let server = vulnerable_server().await;
    let mut config = config(&server.uri());
    config.endpoints = Some("/api, /admin".to_string());

    let auditor = Auditor::new(Arc::new(HttpClient::new().unwrap()));
    let report = auditor.run(&config).await.unwrap();

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.outcomes.probe_count(), 8);

    let api: Vec<(Severity, RuleId, Option<HttpMethod>)> = report
        .findings
        .iter()
        .filter(|f| f.endpoint.as_ref().is_some_and(|e| e.path() == "/api"))
        .map(|f| (f.severity, f.rule, f.method))
        .collect();
    assert_eq!(
        api,
        vec![
            (Severity::Critical, RuleId::UnauthenticatedWrite, Some(HttpMethod::Put)),
            (Severity::High, RuleId::TraceReflection, Some(HttpMethod::Trace)),
            (Severity::Medium, RuleId::OptionsMethodDisclosure, Some(HttpMethod::Options)),
        ]
    );

    assert!(
        report
            .findings
            .iter()
            .all(|f| f.endpoint.as_ref().is_some_and(|e| e.path() != "/admin")),
        "challenged endpoint should be clean: {:?}",
        report.findings
    );
    assert_eq!(report.max_severity(), Some(Severity::Critical));
    assert!(!report.interrupted);
}

#[tokio::test]
async fn test_saved_report_reloads_identically() {
    let server = vulnerable_server().await;
    let mut config = config(&server.uri());
    config.endpoints = Some("/api".to_string());

    let auditor = Auditor::new(Arc::new(HttpClient::new().unwrap()));
    let report = auditor.run(&config).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.json");
    JsonExporter::export(&report, &path).unwrap();
    let loaded = JsonExporter::load(&path).unwrap();

    assert_eq!(loaded.findings, report.findings);
    assert_eq!(loaded.outcomes, report.outcomes);
}

#[tokio::test]
async fn test_unreachable_target_yields_no_endpoints_finding() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let auditor = Auditor::new(Arc::new(HttpClient::new().unwrap()));
    let report = auditor
        .run(&config(&format!("http://127.0.0.1:{}/", port)))
        .await
        .unwrap();

    assert!(report.no_endpoints_tested());
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].rule, RuleId::NoEndpointsTested);
    assert_eq!(report.findings[0].severity, Severity::Info);
    assert_eq!(report.discovery_failures.len(), 1);
}

#[tokio::test]
async fn test_bad_method_list_never_reaches_the_network() {
    let server = MockServer::start().await;

    let mut config = config(&server.uri());
    config.methods.clear();

    let auditor = Auditor::new(Arc::new(HttpClient::new().unwrap()));
    assert!(auditor.run(&config).await.is_err());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
