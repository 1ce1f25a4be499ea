use std::fmt;
use std::sync::Arc;

use super::progress::Progress;

pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Configuration for one ingestion run.
///
/// # Examples
///
/// ```
/// use trawl_fetch::FetchOptions;
///
/// let options = FetchOptions::default()
///     .page_size(50)
///     .on_progress(|p| println!("{} records", p.total_records));
/// ```
#[derive(Clone)]
pub struct FetchOptions {
    /// Records requested per page. A page shorter than this ends the run.
    ///
    /// Default: 100
    pub page_size: u32,

    /// Invoked once per processed page. Observability only; never affects control flow.
    ///
    /// Default: None
    pub on_progress: Option<Arc<dyn Fn(&Progress) + Send + Sync>>,
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("page_size", &self.page_size)
            .field("on_progress", &self.on_progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size:   DEFAULT_PAGE_SIZE,
            on_progress: None,
        }
    }
}

impl FetchOptions {
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Progress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }
}
