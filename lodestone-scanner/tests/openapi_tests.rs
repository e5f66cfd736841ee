// End-to-end document scans over an in-memory petstore specification.

use lodestone_core::report::RunStatus;
use lodestone_scanner::openapi::{
    OpenApiStrategy, INFO_TAG_LINK, RESPONSE_RESPONSE_FIELD_LINK, TAG_ENDPOINT_LINK,
};
use lodestone_scanner::scan::{run, ScanOptions};
use serde_json::json;
use std::path::Path;

fn petstore() -> serde_json::Value {
    json!({
        "info": {
            "title": "Swagger Petstore",
            "version": "1.0.7",
            "description": "A sample pet store API",
            "contact": {"email": "apiteam@swagger.io"},
            "license": {"name": "Apache 2.0", "url": "http://www.apache.org/licenses/LICENSE-2.0.html"}
        },
        "tags": [
            {"name": "pet", "description": "Everything about your Pets"},
            {"name": "store", "description": "Access to Petstore orders"}
        ],
        "paths": {
            "/pet/{petId}": {
                "get": {
                    "tags": ["pet"],
                    "summary": "Find pet by ID",
                    "parameters": [
                        {"name": "petId", "description": "ID of pet to return"}
                    ],
                    "responses": {
                        "200": {
                            "description": "successful operation",
                            "schema": {
                                "properties": {
                                    "id": {"type": "integer", "format": "int64"},
                                    "category": {
                                        "type": "object",
                                        "properties": {"name": {"type": "string"}}
                                    }
                                }
                            }
                        },
                        "404": {"description": "Pet not found"}
                    }
                },
                "post": {
                    "tags": ["pet"],
                    "summary": "Updates a pet",
                    "responses": {"405": {"description": "Invalid input"}}
                }
            },
            "/store/order": {
                "post": {
                    "tags": ["Store"],
                    "summary": "Place an order",
                    "responses": {"200": {"description": "ok"}}
                }
            },
            "/user/login": {
                "get": {
                    "tags": ["user"],
                    "summary": "Logs user in",
                    "responses": {"200": {"description": "ok"}}
                }
            }
        }
    })
}

fn read(dir: &Path, file: &str) -> String {
    std::fs::read_to_string(dir.join(file)).unwrap_or_else(|_| panic!("missing {}", file))
}

// ============================================================================
// Hierarchy Export Tests
// ============================================================================

#[test]
fn test_document_scan_exports_full_hierarchy() {
    let out = tempfile::tempdir().unwrap();
    let report = run(
        OpenApiStrategy::new(petstore()),
        ScanOptions::new(out.path(), "petstore"),
    )
    .unwrap();

    assert!(matches!(report.status, RunStatus::Complete));
    assert!(report.archive.ends_with("petstore.zip"));

    let infos = read(out.path(), "custom.openapi.Info.csv");
    assert!(infos.contains("swagger~petstore"));
    assert!(infos.contains("apiteam@swagger.io"));
    assert!(infos.contains("Apache 2.0"));

    // Declared tags and the undeclared "user" tag, all lowercased.
    let tags = read(out.path(), "custom.openapi.Tag.csv");
    for id in [
        "swagger~petstore~pet",
        "swagger~petstore~store",
        "swagger~petstore~user",
    ] {
        assert!(tags.contains(id), "missing tag {}", id);
    }

    let methods = read(out.path(), "custom.openapi.Method.csv");
    assert!(methods.contains("swagger~petstore~pet~~pet~{petId}~get"));
    assert!(methods.contains("Find pet by ID"));

    let fields = read(out.path(), "custom.openapi.ResponseField.csv");
    assert!(fields.contains("category->name"));
    assert!(fields.contains("int64"));
}

#[test]
fn test_edges_connect_every_level() {
    let out = tempfile::tempdir().unwrap();
    run(
        OpenApiStrategy::new(petstore()),
        ScanOptions::new(out.path(), "petstore"),
    )
    .unwrap();

    let links = read(out.path(), "links.csv");
    assert!(links.contains("$resource,swagger~petstore,core.ResourceParentChild"));
    assert!(links.contains(&format!(
        "swagger~petstore,swagger~petstore~pet,{}",
        INFO_TAG_LINK
    )));
    assert!(links.contains(&format!(
        "swagger~petstore~pet,swagger~petstore~pet~~pet~{{petId}},{}",
        TAG_ENDPOINT_LINK
    )));
    assert!(links.contains(RESPONSE_RESPONSE_FIELD_LINK));

    // Both verbs on /pet/{petId} share one endpoint, so its tag edge
    // appears exactly once.
    let endpoint_edges = links
        .lines()
        .filter(|l| l.ends_with(TAG_ENDPOINT_LINK) && l.contains("{petId}"))
        .count();
    assert_eq!(endpoint_edges, 1);
}

#[test]
fn test_two_runs_are_byte_identical() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    run(
        OpenApiStrategy::new(petstore()),
        ScanOptions::new(first.path(), "petstore"),
    )
    .unwrap();
    run(
        OpenApiStrategy::new(petstore()),
        ScanOptions::new(second.path(), "petstore"),
    )
    .unwrap();

    for file in [
        "custom.openapi.Info.csv",
        "custom.openapi.Tag.csv",
        "custom.openapi.Endpoint.csv",
        "custom.openapi.Method.csv",
        "custom.openapi.ResponseField.csv",
        "links.csv",
    ] {
        assert_eq!(
            read(first.path(), file),
            read(second.path(), file),
            "file {} differs between runs",
            file
        );
    }
}

// ============================================================================
// Limit and File Input Tests
// ============================================================================

#[test]
fn test_endpoint_limit_bounds_the_scan() {
    let out = tempfile::tempdir().unwrap();
    let report = run(
        OpenApiStrategy::new(petstore()),
        ScanOptions::new(out.path(), "petstore").with_limit(1),
    )
    .unwrap();

    assert!(matches!(report.status, RunStatus::LimitReached));
    assert!(report.archive.exists());

    let endpoints = read(out.path(), "custom.openapi.Endpoint.csv");
    assert_eq!(endpoints.lines().count(), 2, "header plus one endpoint");
    // Tags are not scan-limited, so all of them were still exported.
    let tags = read(out.path(), "custom.openapi.Tag.csv");
    assert_eq!(tags.lines().count(), 4);
}

#[test]
fn test_scan_from_document_file() {
    let dir = tempfile::tempdir().unwrap();
    let doc_path = dir.path().join("petstore.json");
    std::fs::write(&doc_path, serde_json::to_string(&petstore()).unwrap()).unwrap();

    let out = tempfile::tempdir().unwrap();
    let report = run(
        OpenApiStrategy::from_file(&doc_path),
        ScanOptions::new(out.path(), "petstore"),
    )
    .unwrap();

    assert!(matches!(report.status, RunStatus::Complete));
    assert!(read(out.path(), "custom.openapi.Info.csv").contains("swagger~petstore"));
}

#[test]
fn test_unreadable_document_aborts_but_packages() {
    let out = tempfile::tempdir().unwrap();
    let report = run(
        OpenApiStrategy::from_file("/nonexistent/spec.json"),
        ScanOptions::new(out.path(), "petstore"),
    )
    .unwrap();

    assert!(matches!(report.status, RunStatus::Aborted));
    assert!(report.error.is_some());
    // Headers-only tables and an archive still land on disk.
    assert!(report.archive.exists());
    assert_eq!(read(out.path(), "custom.openapi.Info.csv").lines().count(), 1);
}
