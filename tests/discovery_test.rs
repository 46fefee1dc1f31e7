use std::sync::Arc;
use std::time::Duration;

use verbaudit::cancel::CancellationFlag;
use verbaudit::config::DEFAULT_USER_AGENT;
use verbaudit::discovery::{Discoverer, DiscoveryLimits};
use verbaudit::http::HttpClient;
use verbaudit::prober::ProbeSettings;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn discoverer() -> Discoverer {
    let settings = ProbeSettings {
        timeout: Duration::from_secs(5),
        user_agent: DEFAULT_USER_AGENT.to_string(),
        ignore_ssl: false,
    };
    Discoverer::new(
        Arc::new(HttpClient::new().unwrap()),
        settings,
        4,
        CancellationFlag::new(),
    )
}

async fn mount_html(server: &MockServer, at: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_discovery_follows_links_and_skips_external() {
    let mock_server = MockServer::start().await;

    mount_html(
        &mock_server,
        "/",
        r#"<html><body>
            <a href="/admin">Admin</a>
            <a href="/api/users">Users</a>
            <a href="https://elsewhere.example/out">Out</a>
            <a href="/static/app.css">Styles</a>
        </body></html>"#,
    )
    .await;
    mount_html(&mock_server, "/admin", r#"<a href="/">Home</a><form action="/admin/save"></form>"#).await;
    mount_html(&mock_server, "/api/users", "<p>no links</p>").await;
    mount_html(&mock_server, "/admin/save", "<p>saved</p>").await;

    let outcome = discoverer()
        .discover(&mock_server.uri(), &DiscoveryLimits::default())
        .await
        .unwrap();

    let paths: Vec<&str> = outcome.endpoints.iter().map(|e| e.path()).collect();
    assert_eq!(paths, vec!["/", "/admin", "/admin/save", "/api/users"]);
    assert!(outcome.failures.is_empty());
}

#[tokio::test]
async fn test_discovery_records_broken_pages() {
    let mock_server = MockServer::start().await;

    mount_html(&mock_server, "/", r#"<a href="/missing">Missing</a><a href="/ok">Ok</a>"#).await;
    mount_html(&mock_server, "/ok", "<p>fine</p>").await;

    let limits = DiscoveryLimits {
        max_depth: 1,
        ..DiscoveryLimits::default()
    };
    let outcome = discoverer().discover(&mock_server.uri(), &limits).await.unwrap();

    assert_eq!(outcome.failures.len(), 1);
    assert!(outcome.failures[0].url.ends_with("/missing"));
    assert!(outcome.endpoints.iter().any(|e| e.path() == "/ok"));
}

#[tokio::test]
async fn test_discovery_respects_endpoint_cap() {
    let mock_server = MockServer::start().await;

    let links: String = (0..20).map(|i| format!(r#"<a href="/page{}">p</a>"#, i)).collect();
    mount_html(&mock_server, "/", &links).await;

    let limits = DiscoveryLimits {
        max_endpoints: 5,
        ..DiscoveryLimits::default()
    };
    let outcome = discoverer().discover(&mock_server.uri(), &limits).await.unwrap();

    assert_eq!(outcome.endpoints.len(), 5);
}
