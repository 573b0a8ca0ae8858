use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use template_scene_bridge::app::App;
use template_scene_bridge::config::StorageConfig;
use template_scene_bridge::domain::TemplateId;
use template_scene_bridge::error::BridgeError;
use template_scene_bridge::fetch::{ArchiveClient, ArchiveResponse};
use template_scene_bridge::output::JsonOutput;
use template_scene_bridge::registry::{MetadataRegistry, SqliteRegistry};
use template_scene_bridge::store::Store;
use template_scene_bridge::sync::{MISSING_TEMPLATE_URL, MetadataDocument};

#[derive(Default)]
struct MockCdn {
    archives: HashMap<String, Vec<u8>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockCdn {
    fn serve(mut self, url: &str, entries: &[(&str, &str)]) -> Self {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        let bytes = writer.finish().unwrap().into_inner();
        self.archives.insert(url.to_string(), bytes);
        self
    }

    fn request_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.requests)
    }
}

impl ArchiveClient for MockCdn {
    fn get(&self, url: &str) -> Result<ArchiveResponse, BridgeError> {
        self.requests.lock().unwrap().push(url.to_string());
        Ok(match self.archives.get(url) {
            Some(body) => ArchiveResponse {
                status: 200,
                body: body.clone(),
            },
            None => ArchiveResponse {
                status: 404,
                body: Vec::new(),
            },
        })
    }
}

fn app_with(temp: &tempfile::TempDir, cdn: MockCdn) -> App<MockCdn, SqliteRegistry> {
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let store = Store::new(StorageConfig::with_root(root));
    store.ensure_layout().unwrap();
    App::new(store, cdn, SqliteRegistry::in_memory().unwrap())
}

struct UnavailableRegistry;

impl MetadataRegistry for UnavailableRegistry {
    fn exists(&self, _id: &TemplateId) -> Result<bool, BridgeError> {
        Err(BridgeError::Registry("database is locked".to_string()))
    }

    fn register(&self, _id: &TemplateId) -> Result<bool, BridgeError> {
        Err(BridgeError::Registry("database is locked".to_string()))
    }

    fn list(&self) -> Result<Vec<TemplateId>, BridgeError> {
        Err(BridgeError::Registry("database is locked".to_string()))
    }
}

fn id(value: &str) -> TemplateId {
    value.parse().unwrap()
}

const TEMPLATE_JSON: &str = r#"{
    "canvas_config": {"width": 720, "height": 1280},
    "materials": {
        "videos": [{"path": "video/clip1.mp4", "cover_path": "video/cover/clip1.jpg"}],
        "texts": [{"content": "[Hello World]"}],
        "audios": [{"path": "audio/bgm.mp3", "duration": 500000}]
    }
}"#;

#[test]
fn second_sync_only_skips() {
    let temp = tempfile::tempdir().unwrap();
    let cdn = MockCdn::default()
        .serve("https://cdn.test/t/alpha", &[("template.json", TEMPLATE_JSON)])
        .serve("https://cdn.test/t/beta?x=1", &[("template.json", "{}")]);
    let app = app_with(&temp, cdn);
    let document = MetadataDocument::from_json(
        r#"{"data": {"templates": [
            {"template_url": "https://cdn.test/t/alpha"},
            {"template_url": "https://cdn.test/t/beta?x=1"}
        ]}}"#,
    )
    .unwrap();

    let first = app.sync_document(&document, &JsonOutput).unwrap();
    assert_eq!(first.downloaded, vec![id("alpha"), id("beta")]);
    assert!(first.skipped.is_empty());
    assert_eq!(first.total, 2);

    let second = app.sync_document(&document, &JsonOutput).unwrap();
    assert!(second.downloaded.is_empty());
    assert_eq!(second.skipped, first.downloaded);
    assert!(second.failed.is_empty());

    assert_eq!(
        app.list_known_template_ids().unwrap(),
        vec![id("alpha"), id("beta")]
    );
}

#[test]
fn bad_entries_do_not_stop_the_batch() {
    let temp = tempfile::tempdir().unwrap();
    let cdn = MockCdn::default().serve("https://cdn.test/t/good", &[("template.json", "{}")]);
    let app = app_with(&temp, cdn);
    let document = MetadataDocument::from_json(
        r#"{"data": {"templates": [
            {"title": "no url"},
            {"template_url": "https://cdn.test/t/"},
            {"template_url": "https://cdn.test/t/missing"},
            {"template_url": "https://cdn.test/t/good"}
        ]}}"#,
    )
    .unwrap();

    let report = app.sync_document(&document, &JsonOutput).unwrap();

    assert_eq!(report.total, 4);
    assert_eq!(report.downloaded, vec![id("good")]);
    let reasons: Vec<(Option<usize>, &str)> = report
        .failed
        .iter()
        .map(|entry| (entry.index, entry.reason.as_str()))
        .collect();
    assert_eq!(
        reasons,
        vec![
            (Some(0), MISSING_TEMPLATE_URL),
            (Some(1), "Cannot extract filename"),
            (Some(2), "HTTP 404"),
        ]
    );
    assert_eq!(report.failed[2].id, Some(id("missing")));
}

#[test]
fn failed_download_is_retried_on_next_sync() {
    let temp = tempfile::tempdir().unwrap();
    let app = app_with(&temp, MockCdn::default());
    let document = MetadataDocument::from_json(
        r#"{"data": {"templates": [{"template_url": "https://cdn.test/t/later"}]}}"#,
    )
    .unwrap();

    app.sync_document(&document, &JsonOutput).unwrap();
    let report = app.sync_document(&document, &JsonOutput).unwrap();

    assert_eq!(report.failed.len(), 1);
    assert!(report.skipped.is_empty());
}

#[test]
fn sync_all_then_convert() {
    let temp = tempfile::tempdir().unwrap();
    let cdn = MockCdn::default().serve(
        "https://cdn.test/t/promo",
        &[
            ("template.json", TEMPLATE_JSON),
            ("video/cover/clip1.jpg", "jpg"),
        ],
    );
    let app = app_with(&temp, cdn);
    let metadata_dir = &app.store().config().metadata_dir;
    std::fs::write(
        metadata_dir.join("page1.json").as_std_path(),
        r#"{"data": {"templates": [{"template_url": "https://cdn.test/t/promo"}]}}"#,
    )
    .unwrap();

    let listed = app.list(&JsonOutput).unwrap();
    assert_eq!(listed.templates, vec![id("promo")]);
    assert_eq!(listed.sync.downloaded, vec![id("promo")]);
    assert!(
        app.store()
            .extract_dir(&id("promo"))
            .join("video/cover/clip1.jpg")
            .as_std_path()
            .exists()
    );

    let result = app.convert_template(&id("promo"), &JsonOutput).unwrap();
    assert_eq!(result.download_url, "/converted/promo.scene.json");
    assert_eq!(result.children, 3);

    let scene: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&result.scene_path).unwrap()).unwrap();
    let children = scene["scene"]["children"].as_array().unwrap();
    assert_eq!(children[0]["uri"], "promo/video/cover/clip1.jpg");
    assert_eq!(children[1]["text"], "Hello World");
    let duration = children[2]["duration"].as_f64().unwrap();
    assert!((duration - 5.0).abs() < 1e-9);
}

#[test]
fn registry_survives_reopen() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("db").join("templates.db");
    {
        let registry = SqliteRegistry::open(&path).unwrap();
        assert!(registry.register(&id("persisted")).unwrap());
    }
    let registry = SqliteRegistry::open(&path).unwrap();
    assert_matches!(registry.exists(&id("persisted")), Ok(true));
    assert_matches!(registry.register(&id("persisted")), Ok(false));
}

#[test]
fn same_archive_name_from_another_host_is_skipped() {
    let temp = tempfile::tempdir().unwrap();
    let cdn = MockCdn::default().serve("https://cdn.test/t/once", &[("template.json", "{}")]);
    let app = app_with(&temp, cdn);
    let document = MetadataDocument::from_json(
        r#"{"data": {"templates": [
            {"template_url": "https://cdn.test/t/once"},
            {"template_url": "https://mirror.test/other/once"}
        ]}}"#,
    )
    .unwrap();

    let report = app.sync_document(&document, &JsonOutput).unwrap();

    assert_eq!(report.downloaded, vec![id("once")]);
    assert_eq!(report.skipped, vec![id("once")]);
}

#[test]
fn malformed_entries_fail_individually() {
    let temp = tempfile::tempdir().unwrap();
    let cdn = MockCdn::default().serve("https://cdn.test/t/good", &[("template.json", "{}")]);
    let app = app_with(&temp, cdn);
    let document = MetadataDocument::from_json(
        r#"{"data": {"templates": [
            null,
            {"template_url": 42},
            {"template_url": "https://cdn.test/t/good"}
        ]}}"#,
    )
    .unwrap();

    let report = app.sync_document(&document, &JsonOutput).unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.downloaded, vec![id("good")]);
    let failures: Vec<(Option<usize>, &str)> = report
        .failed
        .iter()
        .map(|entry| (entry.index, entry.reason.as_str()))
        .collect();
    assert_eq!(
        failures,
        vec![(Some(0), MISSING_TEMPLATE_URL), (Some(1), MISSING_TEMPLATE_URL)]
    );
}

#[test]
fn unavailable_registry_aborts_sync_before_any_download() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let store = Store::new(StorageConfig::with_root(root));
    store.ensure_layout().unwrap();
    let cdn = MockCdn::default().serve("https://cdn.test/t/alpha", &[("template.json", "{}")]);
    let requests = cdn.request_log();
    let app = App::new(store, cdn, UnavailableRegistry);
    let document = MetadataDocument::from_json(
        r#"{"data": {"templates": [{"template_url": "https://cdn.test/t/alpha"}]}}"#,
    )
    .unwrap();

    assert_matches!(
        app.sync_document(&document, &JsonOutput),
        Err(BridgeError::Registry(_))
    );
    assert!(requests.lock().unwrap().is_empty());
    assert!(
        !app.store()
            .extract_dir(&id("alpha"))
            .as_std_path()
            .exists()
    );
}
