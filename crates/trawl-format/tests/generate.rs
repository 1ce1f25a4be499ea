use std::fs;

use tempfile::tempdir;
use trawl_format::{Aggregator, ArrayStyle, Error, Format, OutputEncoding};
use trawl_store::{DirStagingStore, RecordId, StagingStore};

fn stage(store: &DirStagingStore, id: &str, payload: &str) {
    store.put(&RecordId::new(id).unwrap(), payload.as_bytes()).unwrap();
}

#[test]
fn generates_artifact_from_directory_store() {
    let dir = tempdir().unwrap();
    let store = DirStagingStore::for_resource(dir.path(), "contacts", 2);
    stage(&store, "c1", r#"{"internal_id":"c1","name":"Ann"}"#);
    stage(&store, "c2", r#"{"internal_id":"c2","name":"Bo"}"#);

    let output = dir.path().join("contacts.json");
    let summary = Aggregator::new(Format::Array)
        .style(ArrayStyle::Strict)
        .generate(&store, &output)
        .unwrap();

    assert_eq!(summary.records, 2);
    let bytes = fs::read(&output).unwrap();
    assert_eq!(summary.bytes, bytes.len() as u64);
    let parsed: Vec<serde_json::Value> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed.len(), 2);
}

#[test]
fn empty_store_yields_empty_array() {
    let dir = tempdir().unwrap();
    let store = DirStagingStore::for_resource(dir.path(), "contacts", 2);
    let output = dir.path().join("out.json");

    Aggregator::new(Format::Array).generate(&store, &output).unwrap();
    assert_eq!(fs::read(&output).unwrap(), b"[]");
}

#[test]
fn failed_generation_keeps_previous_artifact() {
    let dir = tempdir().unwrap();
    let store = DirStagingStore::for_resource(dir.path(), "contacts", 2);
    stage(&store, "c1", r#"{"name":"Ana"}"#);
    stage(&store, "c2", r#"{"name":"Хелен"}"#);

    let output = dir.path().join("out.json");
    fs::write(&output, "previous").unwrap();

    let err = Aggregator::new(Format::Lines)
        .encoding("1252".parse::<OutputEncoding>().unwrap())
        .generate(&store, &output)
        .unwrap_err();

    assert!(matches!(err, Error::Unmappable { .. }));
    assert_eq!(fs::read_to_string(&output).unwrap(), "previous");
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .filter(|n| n.to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn cyrillic_code_page_round_trips() {
    let dir = tempdir().unwrap();
    let store = DirStagingStore::for_resource(dir.path(), "contacts", 2);
    stage(&store, "c1", r#"{"name":"Хелен"}"#);

    let encoding = "1251".parse::<OutputEncoding>().unwrap();
    let output = dir.path().join("out.jsonl");
    Aggregator::new(Format::Lines).encoding(encoding).generate(&store, &output).unwrap();

    let bytes = fs::read(&output).unwrap();
    let (text, _, had_errors) = encoding_rs::WINDOWS_1251.decode(&bytes);
    assert!(!had_errors);
    assert_eq!(text, "{\"name\":\"Хелен\"}\n");
}
