use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use formsync::{
    FieldPath, Format, Session, SyncConfig, SyncError, SyncOutcome, TextCodec, Value,
    codec::YamlCodec, data::Rule,
};
use pagelayout::{EditorConfig, EditorContext, page_schema};
use serde_json::json;

fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn page_config() -> SyncConfig {
    EditorConfig::default().sync_config()
}

fn session(text: &str) -> Session {
    Session::new(text, page_schema().unwrap(), page_config()).unwrap()
}

#[test]
fn text_edit_reaches_form_once_and_never_echoes() {
    init_log();
    let mut s = session("title: \"A\"\nsections: []");
    let form_updates = Arc::new(Mutex::new(Vec::<Value>::new()));
    let text_updates = Arc::new(AtomicUsize::new(0));

    let sink = form_updates.clone();
    s.on_value_derived(move |v| sink.lock().unwrap().push(v.clone()));
    let counter = text_updates.clone();
    s.on_text_derived(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let text = "title: \"B\"\nsections:\n  - type: feature\n    items:\n      - title: Fast\n";
    assert_eq!(s.text_changed(text), SyncOutcome::Applied);

    let updates = form_updates.lock().unwrap().clone();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["sections"][0]["items"][0]["title"], "Fast");
    assert_eq!(text_updates.load(Ordering::SeqCst), 0);

    // The form re-renders and submits the value it was given.
    assert_eq!(s.structured_changed(updates[0].clone()), SyncOutcome::Unchanged);
    assert_eq!(s.raw_text(), text);
    assert_eq!(text_updates.load(Ordering::SeqCst), 0);
}

#[test]
fn malformed_text_keeps_last_valid_value() {
    init_log();
    let mut s = session("title: \"A\"\nsections: []");
    let before = s.value().clone();
    let form_updates = Arc::new(AtomicUsize::new(0));
    let counter = form_updates.clone();
    s.on_value_derived(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let outcome = s.text_changed("title: \"unterminated\nsections: []\n");
    assert!(matches!(outcome, SyncOutcome::Failed(SyncError::Parse(_))));
    assert_eq!(s.value(), &before);
    assert_eq!(s.raw_text(), "title: \"unterminated\nsections: []\n");
    assert_eq!(form_updates.load(Ordering::SeqCst), 0);
    assert!(s.last_error().is_some());

    let outcome = s.text_changed("::: invalid :::");
    assert!(matches!(outcome, SyncOutcome::Failed(SyncError::Parse(_))));
    assert_eq!(s.value(), &before);
    assert_eq!(s.raw_text(), "::: invalid :::");
    assert_eq!(form_updates.load(Ordering::SeqCst), 0);
}

#[test]
fn reordered_keys_in_text_are_kept() {
    init_log();
    let mut s = session("title: A\nsections: []");
    assert!(s.text_changed("sections: []\ntitle: A\n").is_applied());
    assert!(s.edit_field(&"title".parse().unwrap(), json!("B")).is_applied());
    assert_eq!(s.raw_text(), "sections: []\ntitle: B\n");
}

#[test]
fn missing_title_still_synchronizes() {
    init_log();
    let mut s = session("title: \"A\"\nsections: []");
    assert!(s.text_changed("sections: []\n").is_applied());
    assert_eq!(s.value(), &json!({"sections": []}));

    let report = s.validation();
    assert_eq!(report.len(), 1);
    assert_eq!(report.violations()[0].path.to_string(), "title");
    assert_eq!(report.violations()[0].rule, Rule::MissingRequired);
}

#[test]
fn structured_hero_section_round_trips() {
    init_log();
    let mut s = session("title: \"A\"\nsections: []");
    let submitted = json!({
        "title": "A",
        "sections": [{"type": "hero", "headline": "Hi"}]
    });

    assert!(s.structured_changed(submitted.clone()).is_applied());
    assert_eq!(YamlCodec.parse(s.raw_text()).unwrap(), submitted);
    assert!(s.validation().is_valid(), "{}", s.validation());
}

#[test]
fn form_operations_follow_the_schema() {
    init_log();
    let mut s = session("title: \"A\"\nsections: []");
    let sections: FieldPath = "sections".parse().unwrap();

    assert!(s.append_item(&sections).is_applied());
    assert_eq!(s.value()["sections"][0], json!({"type": "hero"}));

    let strength = sections.index(0).key("strength");
    assert!(s.edit_field(&strength, json!(2.5)).is_applied());
    let report = s.validation();
    assert_eq!(report.len(), 1);
    assert_eq!(report.violations()[0].path, strength);
    assert!(matches!(report.violations()[0].rule, Rule::OutOfRange { .. }));

    assert!(s.remove_field(&strength).is_applied());
    assert!(s.validation().is_valid());
}

#[test]
fn unknown_fields_survive_edits() {
    init_log();
    let mut s = session("title: A\nsections: []\ntheme: dark\n");
    assert!(s.validation().is_valid());
    assert!(s.edit_field(&"title".parse().unwrap(), json!("B")).is_applied());
    assert!(s.raw_text().contains("theme: dark"));
}

#[test]
fn toml_null_is_reported_not_written() {
    init_log();
    let config = SyncConfig {
        format: Format::Toml,
        ..page_config()
    };
    let mut s = Session::new("title = \"A\"\nsections = []\n", page_schema().unwrap(), config)
        .unwrap();

    let outcome = s.edit_field(&"title".parse().unwrap(), Value::Null);
    assert!(matches!(outcome, SyncOutcome::Failed(SyncError::Serialize(_))));
    assert_eq!(s.raw_text(), "title = \"A\"\nsections = []\n");
    assert!(
        s.validation()
            .iter()
            .any(|v| matches!(v.rule, Rule::Unserializable { .. }))
    );
}

#[test]
fn export_is_byte_identical_regardless_of_validity() {
    init_log();
    let dir = tempfile::tempdir().unwrap();
    let ctx = EditorContext::open(dir.path()).unwrap();

    assert!(ctx.session().text_changed("title: X\nsections: []\n").is_applied());
    let artifact = ctx.session().export().unwrap();
    assert_eq!(artifact.bytes, b"title: X\nsections: []\n");
    assert_eq!(artifact.filename, "site.yaml");
    assert_eq!(artifact.mime_type, "text/yaml");

    let _ = ctx.session().text_changed("sections: [oops\n");
    let path = ctx.export().unwrap();
    assert_eq!(std::fs::read(path).unwrap(), b"sections: [oops\n");
}
