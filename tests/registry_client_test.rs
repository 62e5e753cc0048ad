//! HTTP registry adapter against a mock registry server
//!
//! Verifies endpoint shapes, status mapping and a full upload over HTTP.

mod utils;

use httpmock::prelude::*;
use orgsync::modules::registry::{HttpOrganisationRegistry, OrganisationRegistry};
use orgsync::modules::registry::domain::{NewOrganisation, SubsidiaryLink, SystemIdentity};
use orgsync::shared::config::{ApiOptions, PipelineConfig};
use orgsync::shared::errors::{AppError, RetryClass};
use orgsync::{BulkUploadService, InMemoryStatusSink, RunContext, RunStatus};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use utils::factories::CsvFactory;
use utils::helpers::fast_config;
use uuid::Uuid;

const ORG_ID: &str = "0b6a5d84-3c1f-4f0e-9a44-5b0a1f6d2c11";

fn registry(server: &MockServer) -> HttpOrganisationRegistry {
    HttpOrganisationRegistry::new(&ApiOptions {
        base_url: server.base_url(),
        requests_per_second: 100.0,
        ..ApiOptions::default()
    })
    .unwrap()
}

fn identity() -> SystemIdentity {
    SystemIdentity {
        user_id: Uuid::new_v4(),
        organisation_id: Uuid::new_v4(),
    }
}

#[tokio::test]
async fn test_companies_house_lookup_found_and_missing() {
    let server = MockServer::start_async().await;
    let found = server
        .mock_async(|when, then| {
            when.method(GET).path("/organisations/companies-house/123456");
            then.status(200).json_body(json!({
                "id": ORG_ID,
                "name": "OrgA",
                "companiesHouseNumber": "123456"
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/organisations/companies-house/999999");
            then.status(404);
        })
        .await;

    let registry = registry(&server);
    let reference = registry
        .lookup_by_companies_house_number("123456")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reference.id, Uuid::parse_str(ORG_ID).unwrap());
    assert_eq!(reference.name, "OrgA");

    let missing = registry.lookup_by_companies_house_number("999999").await.unwrap();
    assert!(missing.is_none());
    found.assert_async().await;
}

#[tokio::test]
async fn test_name_lookup_only_accepts_an_exact_match() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/organisations")
                .query_param("name", "OrgA");
            then.status(200).json_body(json!([
                { "id": Uuid::new_v4(), "name": "OrgA Trading" },
                { "id": ORG_ID, "name": "orga" }
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/organisations")
                .query_param("name", "OrgB");
            then.status(200)
                .json_body(json!([{ "id": ORG_ID, "name": "OrgB Holdings" }]));
        })
        .await;

    let registry = registry(&server);
    let reference = registry.lookup_by_name("OrgA").await.unwrap().unwrap();
    assert_eq!(reference.name, "orga");
    assert!(registry.lookup_by_name("OrgB").await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_organisation_parses_the_created_reference() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/organisations")
                .header("content-type", "application/json");
            then.status(201).json_body(json!({
                "id": ORG_ID,
                "name": "SubA",
                "referenceNumber": "S1"
            }));
        })
        .await;

    let created = registry(&server)
        .create_organisation(&NewOrganisation {
            name: "SubA".into(),
            companies_house_number: None,
            reference_number: Some("S1".into()),
            nation_code: Some("EN".into()),
            is_subsidiary: true,
            created_by: identity(),
        })
        .await
        .unwrap();

    assert_eq!(created.reference_number.as_deref(), Some("S1"));
    create.assert_calls_async(1).await;
}

#[tokio::test]
async fn test_status_codes_map_to_retry_classes() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/organisations/companies-house/THROTTLED");
            then.status(429).header("retry-after", "2");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/organisations/companies-house/DOWN");
            then.status(503).body("maintenance");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/organisations/companies-house/BAD");
            then.status(400).body("invalid number");
        })
        .await;

    let registry = registry(&server);

    let throttled = registry
        .lookup_by_companies_house_number("THROTTLED")
        .await
        .unwrap_err();
    assert_eq!(throttled.retry_class(), RetryClass::RateLimited);
    assert_eq!(throttled.retry_after(), Some(Duration::from_secs(2)));

    let down = registry
        .lookup_by_companies_house_number("DOWN")
        .await
        .unwrap_err();
    assert_eq!(down.retry_class(), RetryClass::General);
    assert!(down.to_string().contains("maintenance"));

    let bad = registry
        .lookup_by_companies_house_number("BAD")
        .await
        .unwrap_err();
    assert!(matches!(bad, AppError::Upstream { status: 400, .. }));
    assert_eq!(bad.retry_class(), RetryClass::Never);
}

#[tokio::test]
async fn test_relationship_endpoints() {
    let server = MockServer::start_async().await;
    let parent_id = Uuid::new_v4();
    let linked = Uuid::new_v4();
    let unlinked = Uuid::new_v4();

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("/organisations/{}/subsidiaries/{}", parent_id, linked));
            then.status(200).json_body(json!({}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("/organisations/{}/subsidiaries/{}", parent_id, unlinked));
            then.status(404);
        })
        .await;
    let link = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/organisations/{}/subsidiaries", parent_id));
            then.status(409).body("already linked");
        })
        .await;

    let registry = registry(&server);
    assert!(registry.relationship_exists(parent_id, linked).await.unwrap());
    assert!(!registry.relationship_exists(parent_id, unlinked).await.unwrap());

    let error = registry
        .link_subsidiary(&SubsidiaryLink {
            parent_id,
            child_id: unlinked,
            joiner_date: None,
            reporting_type: None,
            franchisee_licensee_tenant: false,
            created_by: identity(),
        })
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::Conflict(_)));
    link.assert_async().await;
}

#[tokio::test]
async fn test_upload_over_http_creates_a_missing_parent() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/organisations/companies-house/123456");
            then.status(404);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/organisations/reference/1");
            then.status(404);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/organisations").query_param("name", "OrgA");
            then.status(200).json_body(json!([]));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/organisations");
            then.status(201)
                .json_body(json!({ "id": ORG_ID, "name": "OrgA", "companiesHouseNumber": "123456" }));
        })
        .await;

    let config = PipelineConfig {
        api: ApiOptions {
            base_url: server.base_url(),
            ..ApiOptions::default()
        },
        system_organisation_id: Uuid::new_v4(),
        system_user_id: Uuid::new_v4(),
        ..fast_config()
    };
    let sink = Arc::new(InMemoryStatusSink::new());
    let service = BulkUploadService::from_config(&config, sink.clone()).unwrap();
    let context = RunContext::new("upload.csv");

    let content = CsvFactory::new().parent("1", "OrgA", "123456").build();
    let result = service
        .process_upload(content.as_bytes(), &context)
        .await
        .unwrap();

    assert_eq!(result.summary.status, RunStatus::Succeeded);
    assert_eq!(
        result.outcomes[0].reference.as_ref().unwrap().id,
        Uuid::parse_str(ORG_ID).unwrap()
    );
    assert_eq!(sink.status(&context.run_key), Some(RunStatus::Succeeded));
    create.assert_calls_async(1).await;
}
