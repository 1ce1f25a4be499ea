//! Page-loop behaviour against a scripted API.

use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tempfile::tempdir;
use trawl_fetch::{ApiClient, ApiResponse, ContactExpansions, FetchError, FetchOptions, Ingestor, Resource};
use trawl_state::{
    CheckpointKey, CheckpointStore, JsonCheckpointStore, MemoryCheckpointStore, Watermark,
};
use trawl_store::{DirStagingStore, MemoryStagingStore, RecordIter, RecordId, StagingStore};

#[derive(Debug)]
struct ScriptError(String);

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

impl std::error::Error for ScriptError {}

/// Replays canned responses in order and records every request body.
#[derive(Default)]
struct ScriptedClient {
    responses: Mutex<VecDeque<Result<ApiResponse, String>>>,
    requests:  Mutex<Vec<(String, Value)>>,
}

impl ScriptedClient {
    fn new() -> Self { Self::default() }

    fn page(self, records: Vec<Value>) -> Self {
        let body = Value::Array(records).to_string();
        self.raw(200, body)
    }

    fn raw(self, status: u16, body: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(ApiResponse::new(status, body)));
        self
    }

    fn fail(self, message: &str) -> Self {
        self.responses.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    fn requests(&self) -> Vec<(String, Value)> { self.requests.lock().unwrap().clone() }

    fn watermarks_requested(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|(_, body)| body["lastmodified_after"].as_str().unwrap().to_string())
            .collect()
    }
}

impl ApiClient for ScriptedClient {
    type Error = ScriptError;

    async fn post_json(&self, path: &str, body: &Value) -> Result<ApiResponse, Self::Error> {
        self.requests.lock().unwrap().push((path.to_string(), body.clone()));
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(ScriptError(message)),
            None => Err(ScriptError("no more scripted responses".into())),
        }
    }
}

fn disk_full(path: &str) -> trawl_fs::Error {
    trawl_fs::Error::Write {
        path:   PathBuf::from(path),
        source: io::Error::other("no space left on device"),
    }
}

/// Staging that accepts `fail_on - 1` puts and rejects the next one.
struct FlakyStaging {
    inner:   MemoryStagingStore,
    puts:    AtomicUsize,
    fail_on: usize,
}

impl FlakyStaging {
    fn failing_on(fail_on: usize) -> Self {
        Self {
            inner: MemoryStagingStore::new(),
            puts: AtomicUsize::new(0),
            fail_on,
        }
    }
}

impl StagingStore for FlakyStaging {
    fn put(&self, id: &RecordId, payload: &[u8]) -> trawl_store::Result<()> {
        if self.puts.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
            return Err(disk_full("files/contacts-v2").into());
        }
        self.inner.put(id, payload)
    }

    fn list_all(&self) -> trawl_store::Result<RecordIter<'_>> { self.inner.list_all() }

    fn remove(&self, id: &RecordId) -> trawl_store::Result<bool> { self.inner.remove(id) }
}

/// Checkpoints that load normally but can never be saved.
#[derive(Default)]
struct ReadOnlyCheckpoints {
    inner: MemoryCheckpointStore,
}

impl CheckpointStore for ReadOnlyCheckpoints {
    fn load(&self, key: &CheckpointKey) -> trawl_state::Result<Watermark> { self.inner.load(key) }

    fn save(&self, _key: &CheckpointKey, _watermark: &Watermark) -> trawl_state::Result<()> {
        Err(disk_full("state.json").into())
    }
}

fn contact(id: u32, modified: &str) -> Value {
    json!({"internal_id": format!("c{id}"), "lastmodified": modified, "name": format!("Contact {id}")})
}

fn ts(minute: u32) -> String { format!("2021-06-01T10:{minute:02}:00+00:00") }

fn page(ids: std::ops::Range<u32>) -> Vec<Value> { ids.map(|i| contact(i, &ts(i))).collect() }

fn contacts() -> Resource { Resource::contacts(ContactExpansions::default()) }

fn key() -> CheckpointKey { contacts().checkpoint_key() }

fn ingestor<'a>(
    client: &'a ScriptedClient,
    checkpoints: &'a MemoryCheckpointStore,
    staging: &'a MemoryStagingStore,
    page_size: u32,
) -> Ingestor<&'a ScriptedClient, &'a MemoryCheckpointStore, &'a MemoryStagingStore> {
    Ingestor::new(client, checkpoints, staging, contacts()).with_options(FetchOptions::default().page_size(page_size))
}

#[tokio::test]
async fn stops_after_first_short_page() {
    let client = ScriptedClient::new().page(page(0..3)).page(page(3..6)).page(page(6..7));
    let checkpoints = MemoryCheckpointStore::new();
    let staging = MemoryStagingStore::new();

    let summary = ingestor(&client, &checkpoints, &staging, 3).run().await.unwrap();

    assert_eq!(summary.pages, 3);
    assert_eq!(summary.records, 7);
    assert_eq!(summary.watermark.as_str(), ts(6));
    assert_eq!(client.requests().len(), 3);
    assert_eq!(staging.len().unwrap(), 7);
}

#[tokio::test]
async fn exact_multiple_needs_one_empty_page() {
    let client = ScriptedClient::new().page(page(0..2)).page(vec![]);
    let checkpoints = MemoryCheckpointStore::new();
    let staging = MemoryStagingStore::new();

    let summary = ingestor(&client, &checkpoints, &staging, 2).run().await.unwrap();

    assert_eq!(summary.pages, 2);
    assert_eq!(summary.records, 2);
    // the empty page does not touch the checkpoint
    assert_eq!(checkpoints.history().unwrap().len(), 1);
    assert_eq!(checkpoints.load(&key()).unwrap().as_str(), ts(1));
}

#[tokio::test]
async fn each_request_uses_last_record_of_previous_page() {
    let client = ScriptedClient::new().page(page(0..2)).page(page(2..4)).page(vec![]);
    let checkpoints = MemoryCheckpointStore::new();
    let staging = MemoryStagingStore::new();

    ingestor(&client, &checkpoints, &staging, 2).run().await.unwrap();

    assert_eq!(
        client.watermarks_requested(),
        vec![Watermark::beginning().to_string(), ts(1), ts(3)]
    );
    let (path, body) = &client.requests()[0];
    assert_eq!(path, "/api/Contacts/List");
    assert_eq!(body["take"], json!(2));
    assert_eq!(body["orderbyasc"], json!(true));
}

#[tokio::test]
async fn watermark_is_monotonic_and_saved_per_page() {
    let client = ScriptedClient::new().page(page(0..2)).page(page(2..4)).page(page(4..5));
    let checkpoints = MemoryCheckpointStore::new();
    let staging = MemoryStagingStore::new();

    ingestor(&client, &checkpoints, &staging, 2).run().await.unwrap();

    let saved: Vec<Watermark> = checkpoints.history().unwrap().into_iter().map(|(_, w)| w).collect();
    assert_eq!(saved.len(), 3);
    for pair in saved.windows(2) {
        assert_ne!(pair[1].compare(&pair[0]), std::cmp::Ordering::Less);
    }
}

#[tokio::test]
async fn resumes_from_stored_watermark() {
    let client = ScriptedClient::new().page(page(10..11));
    let checkpoints = MemoryCheckpointStore::new().with(key(), Watermark::new(ts(9)));
    let staging = MemoryStagingStore::new();

    let summary = ingestor(&client, &checkpoints, &staging, 5).run().await.unwrap();

    assert_eq!(client.watermarks_requested(), vec![ts(9)]);
    assert_eq!(summary.watermark.as_str(), ts(10));
}

#[tokio::test]
async fn page_ending_before_stored_watermark_is_not_saved() {
    let client = ScriptedClient::new().page(vec![contact(1, &ts(3))]);
    let checkpoints = MemoryCheckpointStore::new().with(key(), Watermark::new(ts(30)));
    let staging = MemoryStagingStore::new();

    let summary = ingestor(&client, &checkpoints, &staging, 5).run().await.unwrap();

    assert_eq!(summary.watermark.as_str(), ts(30));
    assert!(checkpoints.history().unwrap().is_empty());
    assert_eq!(staging.len().unwrap(), 1);
}

#[tokio::test]
async fn api_error_keeps_previous_checkpoint() {
    let client = ScriptedClient::new().page(page(0..2)).raw(500, "boom");
    let checkpoints = MemoryCheckpointStore::new();
    let staging = MemoryStagingStore::new();

    let err = ingestor(&client, &checkpoints, &staging, 2).run().await.unwrap_err();

    match err {
        FetchError::Api { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(checkpoints.load(&key()).unwrap().as_str(), ts(1));
    assert_eq!(staging.len().unwrap(), 2);
}

#[tokio::test]
async fn transport_error_is_fatal() {
    let client = ScriptedClient::new().fail("connection reset");
    let checkpoints = MemoryCheckpointStore::new();
    let staging = MemoryStagingStore::new();

    let err = ingestor(&client, &checkpoints, &staging, 2).run().await.unwrap_err();

    assert!(matches!(err, FetchError::Transport(ref m) if m.contains("connection reset")));
    assert!(checkpoints.history().unwrap().is_empty());
}

#[tokio::test]
async fn staging_failure_mid_page_keeps_previous_checkpoint() {
    let client = ScriptedClient::new().page(page(10..13));
    let checkpoints = MemoryCheckpointStore::new().with(key(), Watermark::new(ts(9)));
    let staging = FlakyStaging::failing_on(2);

    let err = Ingestor::new(&client, &checkpoints, &staging, contacts())
        .with_options(FetchOptions::default().page_size(3))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Store(trawl_store::Error::Fs(_))), "{err}");
    assert!(checkpoints.history().unwrap().is_empty());
    assert_eq!(staging.len().unwrap(), 1);

    // the next run starts over from the last saved watermark
    let retry = ScriptedClient::new().page(page(10..13)).page(vec![]);
    let healthy = MemoryStagingStore::new();
    ingestor(&retry, &checkpoints, &healthy, 3).run().await.unwrap();
    assert_eq!(retry.watermarks_requested(), vec![ts(9), ts(12)]);
    assert_eq!(healthy.len().unwrap(), 3);
}

#[tokio::test]
async fn checkpoint_failure_stops_the_run() {
    let client = ScriptedClient::new().page(page(0..2)).page(page(2..4)).page(vec![]);
    let checkpoints = ReadOnlyCheckpoints::default();
    let staging = MemoryStagingStore::new();

    let err = Ingestor::new(&client, &checkpoints, &staging, contacts())
        .with_options(FetchOptions::default().page_size(2))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::State(trawl_state::Error::Fs(_))), "{err}");
    assert_eq!(client.requests().len(), 1);
    assert_eq!(staging.len().unwrap(), 2);
}

#[tokio::test]
async fn malformed_body_is_fatal() {
    let client = ScriptedClient::new().raw(200, r#"{"not":"an array"}"#);
    let checkpoints = MemoryCheckpointStore::new();
    let staging = MemoryStagingStore::new();

    let err = ingestor(&client, &checkpoints, &staging, 2).run().await.unwrap_err();

    assert!(matches!(err, FetchError::MalformedBody(_)));
    assert!(staging.is_empty().unwrap());
}

#[tokio::test]
async fn record_without_timestamp_does_not_checkpoint_its_page() {
    let client = ScriptedClient::new().page(vec![contact(0, &ts(0)), json!({"internal_id": "c1"})]);
    let checkpoints = MemoryCheckpointStore::new();
    let staging = MemoryStagingStore::new();

    let err = ingestor(&client, &checkpoints, &staging, 2).run().await.unwrap_err();

    assert!(matches!(err, FetchError::MissingTimestamp { page: 1, index: 1, .. }));
    assert!(checkpoints.history().unwrap().is_empty());
}

#[tokio::test]
async fn non_object_record_is_fatal() {
    let client = ScriptedClient::new().raw(200, "[1, 2]");
    let checkpoints = MemoryCheckpointStore::new();
    let staging = MemoryStagingStore::new();

    let err = ingestor(&client, &checkpoints, &staging, 2).run().await.unwrap_err();

    assert!(matches!(err, FetchError::MalformedRecord { page: 1, index: 0 }));
}

#[tokio::test]
async fn staged_bytes_match_the_response_text() {
    let body = "[ {\"internal_id\": \"c1\",  \"lastmodified\": \"2021-06-01T10:00:00+00:00\", \"name\": \"café\"} ]";
    let client = ScriptedClient::new().raw(200, body);
    let checkpoints = MemoryCheckpointStore::new();
    let staging = MemoryStagingStore::new();

    ingestor(&client, &checkpoints, &staging, 5).run().await.unwrap();

    let record = staging.list_all().unwrap().next().unwrap().unwrap();
    assert_eq!(record.id, RecordId::new("c1").unwrap());
    assert_eq!(
        std::str::from_utf8(&record.payload).unwrap(),
        "{\"internal_id\": \"c1\",  \"lastmodified\": \"2021-06-01T10:00:00+00:00\", \"name\": \"café\"}"
    );
}

#[tokio::test]
async fn refetched_record_is_staged_once() {
    let checkpoints = MemoryCheckpointStore::new();
    let staging = MemoryStagingStore::new();

    let first = ScriptedClient::new().page(vec![contact(1, &ts(1))]);
    ingestor(&first, &checkpoints, &staging, 5).run().await.unwrap();

    let mut updated = contact(1, &ts(2));
    updated["name"] = json!("Renamed");
    let second = ScriptedClient::new().page(vec![updated.clone()]);
    ingestor(&second, &checkpoints, &staging, 5).run().await.unwrap();

    assert_eq!(staging.len().unwrap(), 1);
    let record = staging.list_all().unwrap().next().unwrap().unwrap();
    assert_eq!(record.payload, updated.to_string().into_bytes());
}

#[tokio::test]
async fn full_page_that_cannot_advance_is_reported() {
    let same = ts(5);
    let records = vec![contact(1, &same), contact(2, &same)];
    let client = ScriptedClient::new().page(records);
    let checkpoints = MemoryCheckpointStore::new().with(key(), Watermark::new(same.clone()));
    let staging = MemoryStagingStore::new();

    let err = ingestor(&client, &checkpoints, &staging, 2).run().await.unwrap_err();

    assert!(matches!(err, FetchError::Stalled { .. }));
    // records were still staged before the error surfaced
    assert_eq!(staging.len().unwrap(), 2);
}

#[tokio::test]
async fn zero_page_size_is_rejected_before_any_request() {
    let client = ScriptedClient::new();
    let checkpoints = MemoryCheckpointStore::new();
    let staging = MemoryStagingStore::new();

    let err = ingestor(&client, &checkpoints, &staging, 0).run().await.unwrap_err();

    assert!(matches!(err, FetchError::InvalidConfig(_)));
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn progress_reported_once_per_page() {
    let client = ScriptedClient::new().page(page(0..2)).page(page(2..3));
    let checkpoints = MemoryCheckpointStore::new();
    let staging = MemoryStagingStore::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    Ingestor::new(&client, &checkpoints, &staging, contacts())
        .with_options(
            FetchOptions::default()
                .page_size(2)
                .on_progress(move |p| sink.lock().unwrap().push(p.total_records)),
        )
        .run()
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![2, 3]);
}

#[tokio::test]
async fn expansion_flags_are_sent() {
    let resource = Resource::contacts(ContactExpansions {
        relationship_metrics:         true,
        relationship_metrics_history: true,
        relationship_metrics_type:    Some("INTERNAL".parse().unwrap()),
    });
    let client = ScriptedClient::new().page(vec![]);
    let checkpoints = MemoryCheckpointStore::new();
    let staging = MemoryStagingStore::new();

    Ingestor::new(&client, &checkpoints, &staging, resource).run().await.unwrap();

    let (_, body) = &client.requests()[0];
    assert_eq!(body["take"], json!(100));
    assert_eq!(body["expand_relationship_metrics"], json!(true));
    assert_eq!(body["expand_relationship_metrics_history"], json!(true));
    assert_eq!(body["expand_relationship_metrics_type"], json!("INTERNAL"));
}

#[tokio::test]
async fn unset_metrics_type_is_sent_as_null() {
    let client = ScriptedClient::new().page(vec![]);
    let checkpoints = MemoryCheckpointStore::new();
    let staging = MemoryStagingStore::new();

    ingestor(&client, &checkpoints, &staging, 5).run().await.unwrap();

    let (_, body) = &client.requests()[0];
    let fields = body.as_object().unwrap();
    assert_eq!(fields.get("expand_relationship_metrics_type"), Some(&Value::Null));
    assert_eq!(body["expand_relationship_metrics"], json!(false));
}

#[tokio::test]
async fn interrupted_run_resumes_on_disk() {
    let dir = tempdir().unwrap();
    let checkpoints = JsonCheckpointStore::new(dir.path().join("state.json"));
    let staging = DirStagingStore::for_resource(dir.path().join("files"), "contacts", 2);

    // page 2 fails: pages 1 is staged and checkpointed
    let first = ScriptedClient::new().page(page(0..2)).raw(503, "unavailable");
    let err = Ingestor::new(&first, &checkpoints, &staging, contacts())
        .with_options(FetchOptions::default().page_size(2))
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Api { status: 503, .. }));
    let before = staging.len().unwrap();

    let second = ScriptedClient::new().page(page(2..4)).page(page(4..5));
    let summary = Ingestor::new(&second, &checkpoints, &staging, contacts())
        .with_options(FetchOptions::default().page_size(2))
        .run()
        .await
        .unwrap();

    assert_eq!(second.watermarks_requested()[0], ts(1));
    assert!(staging.len().unwrap() >= before);
    assert_eq!(staging.len().unwrap(), 5);
    assert_eq!(summary.watermark.as_str(), ts(4));
    assert_eq!(checkpoints.load(&key()).unwrap().as_str(), ts(4));
}
