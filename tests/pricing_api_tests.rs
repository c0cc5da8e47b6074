/// Integration tests for the HTTP pricing client and the editor against a mock pricing API
use cost_estimator::{
    client::{HttpPricingClient, PricingApi},
    config::ApiConfig,
    editor::{Editor, Outcome},
    error::EstimatorError,
    models::EstimateRequest,
    plan::{Plan, PlanIssue},
    region::Region,
    render,
    state::{FailureStage, Phase, Session},
};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use wiremock::{
    matchers::{body_partial_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn client_for(server: &MockServer) -> HttpPricingClient {
    HttpPricingClient::new(&ApiConfig {
        base_url: server.uri(),
        timeout_seconds: None,
    })
    .unwrap()
}

/// Address nothing listens on
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// Mock an EC2 service with a single priority attribute
async fn setup_ec2_mock(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            "AmazonEC2",
            "AmazonRDS",
            "AmazonS3"
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/attributes/AmazonEC2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!(["instanceType"])),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/attribute-values/AmazonEC2/instanceType"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!(["t3.medium", "m5.large"])),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_client_lists_services_and_attributes() {
    let server = MockServer::start().await;
    setup_ec2_mock(&server).await;
    let client = client_for(&server);

    let services = client.list_services().await.unwrap();
    assert_eq!(services, vec!["AmazonEC2", "AmazonRDS", "AmazonS3"]);

    let attributes = client.list_attributes("AmazonEC2").await.unwrap();
    assert_eq!(attributes, vec!["instanceType"]);

    let values = client
        .list_attribute_values("AmazonEC2", "instanceType")
        .await
        .unwrap();
    assert_eq!(values, vec!["t3.medium", "m5.large"]);
}

#[tokio::test]
async fn test_client_maps_error_status_to_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/services"))
        .respond_with(ResponseTemplate::new(503).set_body_string("pricing unavailable"))
        .mount(&server)
        .await;

    let err = client_for(&server).list_services().await.unwrap_err();
    match err {
        EstimatorError::Upstream { status, message } => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(message, "pricing unavailable");
        }
        other => panic!("Expected Upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_client_reports_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/services"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).list_services().await.unwrap_err();
    assert!(matches!(err, EstimatorError::Decode(_)));
}

#[tokio::test]
async fn test_client_honours_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/services"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_json(serde_json::json!([])),
        )
        .mount(&server)
        .await;

    let client = HttpPricingClient::new(&ApiConfig {
        base_url: server.uri(),
        timeout_seconds: Some(1),
    })
    .unwrap();

    match client.list_services().await.unwrap_err() {
        EstimatorError::HttpRequest(e) => assert!(e.is_timeout()),
        other => panic!("Expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_estimate_sends_service_selections_and_quantity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/estimate"))
        .and(body_partial_json(serde_json::json!({
            "service": "AmazonEC2",
            "selections": {"instanceType": "t3.medium", "location": "EU (Frankfurt)"},
            "quantity": 3
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "unit_price": 0.0416,
            "unit_type": "Hrs",
            "monthly_estimate": 91.1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut selections = BTreeMap::new();
    selections.insert("instanceType".to_string(), "t3.medium".to_string());
    selections.insert("location".to_string(), "EU (Frankfurt)".to_string());

    let response = client_for(&server)
        .estimate(&EstimateRequest {
            service: "AmazonEC2".to_string(),
            selections,
            quantity: 3,
        })
        .await
        .unwrap();

    assert_eq!(response.monthly_estimate, Some(91.1));
    assert_eq!(response.unit_type.as_deref(), Some("Hrs"));
}

#[tokio::test]
async fn test_editor_scenario_end_to_end() {
    let server = MockServer::start().await;
    setup_ec2_mock(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/estimate"))
        .and(body_partial_json(serde_json::json!({
            "service": "AmazonEC2",
            "selections": {"instanceType": "t3.medium", "location": "US East (N. Virginia)"},
            "quantity": 1
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"monthly_estimate": 34.56})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut editor = Editor::new(client_for(&server), Session::new(Region::UsEast1));
    assert_eq!(editor.load_services().await, Outcome::Applied);
    assert_eq!(editor.session().catalog.services.len(), 3);

    let id = editor.add_item();
    assert_eq!(editor.select_service(id, "AmazonEC2").await, Outcome::Applied);

    let item = editor.session().item(id).unwrap();
    assert_eq!(item.attributes, vec!["instanceType"]);
    assert_eq!(
        item.selections.get("location").map(String::as_str),
        Some("US East (N. Virginia)")
    );

    assert!(editor.update_selection(id, "instanceType", "t3.medium"));
    let report = editor.recompute_estimates().await;

    assert_eq!(report.total, 34.56);
    let item = editor.session().item(id).unwrap();
    assert_eq!(item.estimated_cost, 34.56);
    assert_eq!(item.phase(), Phase::Estimated);
    assert_eq!(editor.total(), 34.56);
    assert!(!editor.session().estimating);
}

#[tokio::test]
async fn test_estimate_network_error_keeps_prior_cost() {
    let server = MockServer::start().await;
    setup_ec2_mock(&server).await;

    // Configure against the mock, then point estimates at a dead address
    let mut editor = Editor::new(client_for(&server), Session::default());
    let id = editor.add_item();
    editor.select_service(id, "AmazonEC2").await;
    let session = editor.into_session();

    let dead = HttpPricingClient::new(&ApiConfig {
        base_url: closed_port_url(),
        timeout_seconds: Some(5),
    })
    .unwrap();
    let mut editor = Editor::new(dead, session);

    let report = editor.recompute_estimates().await;
    assert_eq!(report.failures().count(), 1);

    let item = editor.session().item(id).unwrap();
    assert_eq!(item.estimated_cost, 0.0);
    assert_eq!(item.last_failure.as_ref().unwrap().stage, FailureStage::Estimate);
    assert_eq!(item.last_failure.as_ref().unwrap().kind, "http_request_error");
    assert!(!editor.session().estimating);
    assert_eq!(editor.total(), 0.0);
}

#[tokio::test]
async fn test_missing_monthly_estimate_counts_as_zero() {
    let server = MockServer::start().await;
    setup_ec2_mock(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/estimate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let mut editor = Editor::new(client_for(&server), Session::default());
    let id = editor.add_item();
    editor.select_service(id, "AmazonEC2").await;

    let report = editor.recompute_estimates().await;
    assert_eq!(report.results, vec![(id, Outcome::Applied)]);
    assert_eq!(editor.session().item(id).unwrap().estimated_cost, 0.0);
}

#[tokio::test]
async fn test_value_list_failure_leaves_item_unconfigured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/attributes/AmazonRDS"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            "databaseEngine",
            "instanceType",
            "location"
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/attribute-values/AmazonRDS/databaseEngine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(["MySQL"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/attribute-values/AmazonRDS/instanceType"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut editor = Editor::new(client_for(&server), Session::default());
    let id = editor.add_item();

    match editor.select_service(id, "AmazonRDS").await {
        Outcome::Failed(failure) => assert_eq!(failure.stage, FailureStage::Configuration),
        other => panic!("Expected failure, got {:?}", other),
    }
    let item = editor.session().item(id).unwrap();
    assert!(!item.loading);
    assert!(item.service.is_none());
    assert!(item.attributes.is_empty());
    assert!(item.value_options.is_empty());
}

#[tokio::test]
async fn test_plan_applied_against_mock() {
    let server = MockServer::start().await;
    setup_ec2_mock(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/estimate"))
        .and(body_partial_json(serde_json::json!({
            "selections": {"location": "Asia Pacific (Singapore)"},
            "quantity": 2
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"monthly_estimate": 60.74})),
        )
        .mount(&server)
        .await;

    let plan_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    std::fs::write(
        plan_file.path(),
        r#"
account_id = "123456789012"
region = "ap-southeast-1"

[[resources]]
service = "AmazonEC2"
quantity = 2
[resources.selections]
instanceType = "t3.medium"
color = "blue"

[[resources]]
service = "AmazonUnknown"
"#,
    )
    .unwrap();

    let plan = Plan::load(plan_file.path()).unwrap();
    let mut editor = Editor::new(client_for(&server), Session::default());
    let (ids, issues) = plan.apply(&mut editor).await;

    assert_eq!(ids.len(), 2);
    assert_eq!(editor.session().account_id, "123456789012");
    assert_eq!(editor.session().region, Region::ApSoutheast1);
    assert_eq!(issues.len(), 2);
    assert!(issues.contains(&PlanIssue::UnknownAttribute {
        index: 0,
        attribute: "color".to_string(),
    }));
    assert!(matches!(
        &issues[1],
        PlanIssue::Configuration { index: 1, outcome: Outcome::Failed(_) }
    ));

    let report = editor.recompute_estimates().await;
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.total, 60.74);
    assert_eq!(editor.session().item(ids[1]).unwrap().phase(), Phase::Empty);
}

#[tokio::test]
async fn test_plan_issues_reach_json_summary() {
    let server = MockServer::start().await;
    setup_ec2_mock(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/estimate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"monthly_estimate": 30.37})),
        )
        .mount(&server)
        .await;

    let plan = Plan::parse(
        r#"
[[resources]]
service = "AmazonEC2"
[resources.selections]
instanceType = "t3.medium"
color = "blue"
location = "EU (Frankfurt)"
"#,
    )
    .unwrap();

    let mut editor = Editor::new(client_for(&server), Session::default());
    let (_, issues) = plan.apply(&mut editor).await;
    editor.recompute_estimates().await;

    let json = serde_json::to_value(render::summary_json(editor.session(), &issues)).unwrap();
    let listed: Vec<&str> = json["issues"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|issue| issue.as_str())
        .collect();
    assert_eq!(listed.len(), 2);
    assert!(listed.contains(&"resource #1: unknown attribute 'color'"));
    assert!(listed.iter().any(|issue| issue.contains("location is set from the region")));

    assert_eq!(json["items"][0]["selections"]["location"], "US East (N. Virginia)");
    assert!(json["items"][0]["selections"].get("color").is_none());
    assert_eq!(json["total"], 30.37);
}

#[tokio::test]
async fn test_value_lists_are_fetched_concurrently() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/attributes/AmazonEC2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            "instanceType",
            "operatingSystem"
        ])))
        .mount(&server)
        .await;
    for attribute in ["instanceType", "operatingSystem"] {
        Mock::given(method("GET"))
            .and(path(format!("/api/attribute-values/AmazonEC2/{}", attribute)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(1))
                    .set_body_json(serde_json::json!(["value"])),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut editor = Editor::new(client_for(&server), Session::default());
    let id = editor.add_item();

    let started = Instant::now();
    assert_eq!(editor.select_service(id, "AmazonEC2").await, Outcome::Applied);
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_millis(1800), "took {:?}", elapsed);
    assert_eq!(editor.session().item(id).unwrap().value_options.len(), 2);
}

#[tokio::test]
async fn test_estimates_are_requested_concurrently() {
    let server = MockServer::start().await;
    setup_ec2_mock(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/estimate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(1))
                .set_body_json(serde_json::json!({"monthly_estimate": 10.0})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let mut editor = Editor::new(client_for(&server), Session::default());
    for _ in 0..2 {
        let id = editor.add_item();
        editor.select_service(id, "AmazonEC2").await;
    }

    let started = Instant::now();
    let report = editor.recompute_estimates().await;
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_millis(1800), "took {:?}", elapsed);
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.total, 20.0);
}
