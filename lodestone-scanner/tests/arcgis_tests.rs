// End-to-end service-tree scans against a mock directory server.

use lodestone_core::report::RunStatus;
use lodestone_scanner::arcgis::{
    ArcGisStrategy, ARCHIVE_NAME, FOLDER_SERVICE_LINK, SERVER_FOLDER_LINK, SERVER_SERVICE_LINK,
};
use lodestone_scanner::scan::{run, ScanOptions};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BASE: &str = "/org/rest/services";

async fn mount_pjson(server: &MockServer, at: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(at))
        .and(query_param("f", "pjson"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_directory(server: &MockServer) {
    mount_pjson(
        server,
        BASE,
        json!({
            "currentVersion": 10.81,
            "services": [
                {"name": "Wells", "type": "FeatureServer"},
                {"name": "Imagery", "type": "ImageServer"}
            ],
            "folders": ["Energy"]
        }),
    )
    .await;
    mount_pjson(
        server,
        &format!("{}/Wells/FeatureServer", BASE),
        json!({
            "copyrightText": "(c) org",
            "hasVersionedData": false,
            "maxRecordCount": 1000,
            "description": "well data",
            "layers": [{"id": 0, "name": "Well Locations"}]
        }),
    )
    .await;
    mount_pjson(
        server,
        &format!("{}/Wells/FeatureServer/0", BASE),
        json!({
            "id": 0,
            "name": "Well Locations",
            "maxRecordCount": 1000,
            "fields": [
                {"name": "OBJECTID", "alias": "Object ID", "type": "esriFieldTypeOID"},
                {"name": "DEPTH", "alias": "Depth", "type": "esriFieldTypeDouble"}
            ]
        }),
    )
    .await;
    mount_pjson(
        server,
        &format!("{}/Energy", BASE),
        json!({
            "services": [{"name": "Energy/Pipelines", "type": "MapServer"}]
        }),
    )
    .await;
    mount_pjson(
        server,
        &format!("{}/Energy/Pipelines/MapServer", BASE),
        json!({"layers": []}),
    )
    .await;
}

fn read(dir: &std::path::Path, file: &str) -> String {
    std::fs::read_to_string(dir.join(file)).unwrap_or_else(|_| panic!("missing {}", file))
}

// ============================================================================
// Full Scan Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_full_scan_exports_filtered_tree() {
    let server = MockServer::start().await;
    mount_directory(&server).await;
    let root = format!("{}{}", server.uri(), BASE);

    let out = tempfile::tempdir().unwrap();
    let out_dir = out.path().to_path_buf();
    let report = tokio::task::spawn_blocking(move || {
        let strategy = ArcGisStrategy::new(&root).unwrap();
        run(strategy, ScanOptions::new(out_dir, ARCHIVE_NAME))
    })
    .await
    .unwrap()
    .unwrap();

    assert!(matches!(report.status, RunStatus::Complete));
    assert!(report.archive.ends_with("arcgis_custom_metadata_cdgc.zip"));
    assert!(report.archive.exists());

    let services = read(out.path(), "arcgis.rest.customV4.Service.csv");
    assert!(services.contains("org/Wells"));
    assert!(services.contains("org/Energy/Pipelines"));
    // The ImageServer was filtered out before any fetch.
    assert!(!services.contains("Imagery"));

    let fields = read(out.path(), "arcgis.rest.customV4.Field.csv");
    assert!(fields.contains("org/Wells/0/OBJECTID"));
    assert!(fields.contains("esriFieldTypeDouble"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_folder_edges_use_folder_associations() {
    let server = MockServer::start().await;
    mount_directory(&server).await;
    let root = format!("{}{}", server.uri(), BASE);

    let out = tempfile::tempdir().unwrap();
    let out_dir = out.path().to_path_buf();
    tokio::task::spawn_blocking(move || {
        run(
            ArcGisStrategy::new(&root).unwrap(),
            ScanOptions::new(out_dir, ARCHIVE_NAME),
        )
    })
    .await
    .unwrap()
    .unwrap();

    let links = read(out.path(), "links.csv");
    assert!(links.contains(&format!("org,org/Wells,{}", SERVER_SERVICE_LINK)));
    assert!(links.contains(&format!("org,org/Energy,{}", SERVER_FOLDER_LINK)));
    assert!(links.contains(&format!(
        "org/Energy,org/Energy/Pipelines,{}",
        FOLDER_SERVICE_LINK
    )));
}

// ============================================================================
// Limit and Abort Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_limit_reached_still_packages() {
    let server = MockServer::start().await;
    mount_directory(&server).await;
    let root = format!("{}{}", server.uri(), BASE);

    let out = tempfile::tempdir().unwrap();
    let out_dir = out.path().to_path_buf();
    let report = tokio::task::spawn_blocking(move || {
        run(
            ArcGisStrategy::new(&root).unwrap(),
            ScanOptions::new(out_dir, ARCHIVE_NAME).with_limit(1),
        )
    })
    .await
    .unwrap()
    .unwrap();

    assert!(matches!(report.status, RunStatus::LimitReached));
    assert!(report.archive.exists());

    let services = read(out.path(), "arcgis.rest.customV4.Service.csv");
    // Header plus exactly one service row.
    assert_eq!(services.lines().count(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_mid_scan_failure_packages_partial_output() {
    let server = MockServer::start().await;
    mount_pjson(
        &server,
        BASE,
        json!({
            "services": [
                {"name": "Wells", "type": "FeatureServer"},
                {"name": "Broken", "type": "FeatureServer"}
            ],
            "folders": []
        }),
    )
    .await;
    mount_pjson(
        &server,
        &format!("{}/Wells/FeatureServer", BASE),
        json!({"layers": []}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/Broken/FeatureServer", BASE)))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let root = format!("{}{}", server.uri(), BASE);

    let out = tempfile::tempdir().unwrap();
    let out_dir = out.path().to_path_buf();
    let report = tokio::task::spawn_blocking(move || {
        run(
            ArcGisStrategy::new(&root).unwrap(),
            ScanOptions::new(out_dir, ARCHIVE_NAME),
        )
    })
    .await
    .unwrap()
    .unwrap();

    assert!(matches!(report.status, RunStatus::Aborted));
    assert!(report.error.as_deref().unwrap().contains("500"));
    assert!(report.archive.exists());

    // Everything collected before the failure is still exported.
    let servers = read(out.path(), "arcgis.rest.customV4.Server.csv");
    assert!(servers.contains("org"));
    let services = read(out.path(), "arcgis.rest.customV4.Service.csv");
    assert!(services.contains("org/Wells"));
    assert!(!services.contains("Broken"));
}
