use std::path::Path;

use serde_json::json;
use tempfile::tempdir;
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use xnat2bids_core::archive::ArchiveSession;
use xnat2bids_core::resources::FileCount;
use xnat2bids_core::{AppConfig, Error, OutputLayout};

fn test_config(host: &str, root: &Path) -> AppConfig {
    AppConfig {
        host: host.to_string(),
        user: "admin".to_string(),
        password: "secret".to_string(),
        session: "SESS01".to_string(),
        subject: None,
        project: None,
        bids_root_dir: root.to_string_lossy().into_owned(),
        overwrite: false,
        insecure: false,
        layout: OutputLayout::Sourcedata,
    }
}

fn result_set(rows: serde_json::Value) -> serde_json::Value {
    json!({"ResultSet": {"Result": rows}})
}

#[test]
fn test_scan_list_failure_is_fatal() {
    let rt = Runtime::new().unwrap();
    let tmp = tempdir().unwrap();

    let server = rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/experiments/SESS01/scans"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        server
    });

    let session = ArchiveSession::connect(&test_config(&server.uri(), tmp.path())).unwrap();
    match session.scan_list("SESS01") {
        Err(Error::ArchiveStatus { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected fatal archive status, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_missing_naming_rules_are_not_fatal() {
    let rt = Runtime::new().unwrap();
    let tmp = tempdir().unwrap();

    // Nothing mounted at all: both rule endpoints answer 404.
    let server = rt.block_on(MockServer::start());

    let session = ArchiveSession::connect(&test_config(&server.uri(), tmp.path())).unwrap();
    assert!(session.project_naming_rules("smith-memory").unwrap().is_empty());
    assert!(session.site_naming_rules().unwrap().is_empty());
}

#[test]
fn test_session_and_subject_metadata() {
    let rt = Runtime::new().unwrap();
    let tmp = tempdir().unwrap();

    let server = rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/experiments/SESS01"))
            .and(query_param("handler", "values"))
            .respond_with(ResponseTemplate::new(200).set_body_json(result_set(json!([
                {"project": "smith-memory", "subject_ID": "XNAT_S0007"}
            ]))))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/subjects/XNAT_S0007"))
            .and(query_param("columns", "label"))
            .respond_with(ResponseTemplate::new(200).set_body_json(result_set(json!([
                {"label": "001"}
            ]))))
            .mount(&server)
            .await;
        server
    });

    let session = ArchiveSession::connect(&test_config(&server.uri(), tmp.path())).unwrap();
    let record = session.session_record("SESS01").unwrap();
    assert_eq!(record.project, "smith-memory");
    assert_eq!(record.subject_id, "XNAT_S0007");
    assert_eq!(session.subject_label("XNAT_S0007").unwrap(), "001");
}

#[test]
fn test_blank_file_count_parses_to_unknown() {
    let rt = Runtime::new().unwrap();
    let tmp = tempdir().unwrap();

    let server = rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/experiments/SESS01/scans/1/resources"))
            .respond_with(ResponseTemplate::new(200).set_body_json(result_set(json!([
                {"label": "DICOM", "file_count": "", "xnat_abstractresource_id": "9"}
            ]))))
            .mount(&server)
            .await;
        server
    });

    let session = ArchiveSession::connect(&test_config(&server.uri(), tmp.path())).unwrap();
    let records = session.scan_resources("SESS01", "1").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(FileCount::parse(&records[0].file_count), FileCount::Unknown);
    assert_eq!(FileCount::parse("12"), FileCount::Known(12));
}

#[test]
fn test_file_listing_merges_absolute_paths() {
    let rt = Runtime::new().unwrap();
    let tmp = tempdir().unwrap();

    let listing = "/data/experiments/SESS01/scans/1/resources/DICOM/files";
    let server = rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(listing))
            .and(query_param("locator", "absolutePath"))
            .respond_with(ResponseTemplate::new(200).set_body_json(result_set(json!([
                {"Name": "001.dcm", "absolutePath": "/archive/001.dcm"}
            ]))))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(listing))
            .respond_with(ResponseTemplate::new(200).set_body_json(result_set(json!([
                {"Name": "001.dcm", "URI": "/data/raw/001.dcm"},
                {"Name": "002.dcm", "URI": "/data/raw/002.dcm"}
            ]))))
            .mount(&server)
            .await;
        server
    });

    let session = ArchiveSession::connect(&test_config(&server.uri(), tmp.path())).unwrap();
    let files = session.primary_files("SESS01", "1").unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].uri, "/data/raw/001.dcm");
    assert_eq!(files[0].absolute_path.as_deref(), Some("/archive/001.dcm"));
    // Only files named in the absolutePath pass get a local path.
    assert_eq!(files[1].absolute_path, None);
}

#[test]
fn test_trailing_slash_host_is_normalized() {
    let rt = Runtime::new().unwrap();
    let tmp = tempdir().unwrap();

    let server = rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/experiments/SESS01/scans"))
            .respond_with(ResponseTemplate::new(200).set_body_json(result_set(json!([]))))
            .mount(&server)
            .await;
        server
    });

    let mut config = test_config(&server.uri(), tmp.path());
    config.host = format!("{}/", server.uri());

    let session = ArchiveSession::connect(&config).unwrap();
    assert_eq!(session.base_url(), server.uri());
    assert!(session.scan_list("SESS01").unwrap().is_empty());
}
