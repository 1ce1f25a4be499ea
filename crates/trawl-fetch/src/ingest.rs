use std::cmp::Ordering;

use serde::Serialize;
use serde_json::value::RawValue;
use serde_json::{Map, Value};
use trawl_state::{CheckpointKey, CheckpointStore, Watermark};
use trawl_store::StagingStore;

use crate::data::{FetchOptions, LoopState, Progress, Resource, RunSummary};
use crate::effects::ApiClient;
use crate::error::{FetchError, Result};

#[derive(Serialize)]
struct PageRequest<'a> {
    take:               u32,
    orderbyasc:         bool,
    lastmodified_after: &'a str,
    #[serde(flatten)]
    expansions:         &'a Map<String, Value>,
}

/// Drives the page loop for one resource.
///
/// The checkpoint and staging stores are injected, so the same loop runs against
/// files on disk or in-memory stores.
pub struct Ingestor<C, K, S> {
    client:      C,
    checkpoints: K,
    staging:     S,
    resource:    Resource,
    options:     FetchOptions,
}

impl<C, K, S> Ingestor<C, K, S>
where
    C: ApiClient,
    K: CheckpointStore,
    S: StagingStore,
{
    pub fn new(client: C, checkpoints: K, staging: S, resource: Resource) -> Self {
        Self {
            client,
            checkpoints,
            staging,
            resource,
            options: FetchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn resource(&self) -> &Resource { &self.resource }

    pub fn staging(&self) -> &S { &self.staging }

    /// Fetch every page newer than the stored watermark, staging records and
    /// checkpointing after each page, until a short page comes back.
    pub async fn run(&self) -> Result<RunSummary> {
        let page_size = self.options.page_size;
        if page_size == 0 {
            return Err(FetchError::InvalidConfig("page size must be at least 1".into()));
        }

        let key = self.resource.checkpoint_key();
        let mut watermark = self.checkpoints.load(&key)?;
        tracing::info!(resource = %self.resource.name, %watermark, page_size, "starting fetch");

        let mut summary = RunSummary {
            pages:     0,
            records:   0,
            watermark: watermark.clone(),
        };
        let mut state = LoopState::Fetching;

        loop {
            state = match state {
                LoopState::Fetching => {
                    let page = summary.pages + 1;
                    let records = self.fetch_page(page, &watermark).await?;
                    let last = self.stage_page(page, &records)?;
                    self.checkpoint(&key, &mut watermark, last, page, records.len())?;

                    summary.pages = page;
                    summary.records += records.len() as u64;
                    summary.watermark = watermark.clone();
                    self.notify_progress(&summary, records.len());

                    LoopState::PageProcessed {
                        records: records.len(),
                    }
                }
                processed @ LoopState::PageProcessed { .. } => processed.next(page_size),
                LoopState::Done => break,
            };
        }

        tracing::info!(
            resource = %self.resource.name,
            pages = summary.pages,
            records = summary.records,
            watermark = %summary.watermark,
            "fetch complete"
        );
        Ok(summary)
    }

    async fn fetch_page(&self, page: u64, watermark: &Watermark) -> Result<Vec<Box<RawValue>>> {
        let request = PageRequest {
            take:               self.options.page_size,
            orderbyasc:         true,
            lastmodified_after: watermark.as_str(),
            expansions:         &self.resource.expansions,
        };
        let body = serde_json::to_value(&request).map_err(FetchError::Encode)?;

        tracing::debug!(page, after = %watermark, endpoint = %self.resource.endpoint, "requesting page");
        let response = self
            .client
            .post_json(&self.resource.endpoint, &body)
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !response.is_success() {
            return Err(FetchError::Api {
                status: response.status,
                body:   response.body,
            });
        }

        serde_json::from_str(&response.body).map_err(FetchError::MalformedBody)
    }

    /// Stage every record of a page. Returns the timestamp of the last one.
    fn stage_page(&self, page: u64, records: &[Box<RawValue>]) -> Result<Option<Watermark>> {
        let mut last = None;

        for (index, raw) in records.iter().enumerate() {
            let record: Value =
                serde_json::from_str(raw.get()).map_err(|_| FetchError::MalformedRecord { page, index })?;
            if !record.is_object() {
                return Err(FetchError::MalformedRecord { page, index });
            }

            let modified = timestamp(&record, &self.resource.timestamp_field).ok_or_else(|| {
                FetchError::MissingTimestamp {
                    page,
                    index,
                    field: self.resource.timestamp_field.clone(),
                }
            })?;
            let id = self.resource.identity.derive(&record)?;

            // stored as received, not re-serialized
            self.staging.put(&id, raw.get().as_bytes())?;
            last = Some(modified);
        }

        Ok(last)
    }

    /// Advance and persist the watermark once the whole page is staged.
    fn checkpoint(
        &self,
        key: &CheckpointKey,
        watermark: &mut Watermark,
        last: Option<Watermark>,
        page: u64,
        page_len: usize,
    ) -> Result<()> {
        let Some(last) = last else {
            return Ok(());
        };

        let requested = watermark.clone();
        if watermark.advance(last.clone()) {
            self.checkpoints.save(key, watermark)?;
        } else {
            tracing::warn!(
                page,
                current = %watermark,
                candidate = %last,
                "page ended before the current watermark; keeping it"
            );
        }

        // a full page that leaves the watermark in place would be requested again forever
        if page_len >= self.options.page_size as usize && watermark.compare(&requested) != Ordering::Greater {
            return Err(FetchError::Stalled {
                watermark: watermark.to_string(),
            });
        }
        Ok(())
    }

    fn notify_progress(&self, summary: &RunSummary, page_records: usize) {
        tracing::debug!(page = summary.pages, page_records, total = summary.records, "page processed");
        if let Some(ref callback) = self.options.on_progress {
            callback(&Progress {
                page: summary.pages,
                page_records,
                total_records: summary.records,
                watermark: summary.watermark.clone(),
            });
        }
    }
}

fn timestamp(record: &Value, field: &str) -> Option<Watermark> {
    match record.get(field)? {
        Value::String(s) if !s.is_empty() => Some(Watermark::new(s.clone())),
        Value::Number(n) => Some(Watermark::new(n.to_string())),
        _ => None,
    }
}
