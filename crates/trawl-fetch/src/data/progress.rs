use trawl_state::Watermark;

/// States of the page loop.
///
/// `Fetching` → `PageProcessed` → `Fetching` while pages come back full,
/// `PageProcessed` → `Done` on the first short page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Fetching,
    PageProcessed { records: usize },
    Done,
}

impl LoopState {
    pub fn next(self, page_size: u32) -> Self {
        match self {
            LoopState::Fetching => LoopState::Fetching,
            LoopState::PageProcessed { records } if records < page_size as usize => LoopState::Done,
            LoopState::PageProcessed { .. } => LoopState::Fetching,
            LoopState::Done => LoopState::Done,
        }
    }
}

/// Snapshot handed to the progress callback after each page.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub page:          u64,
    pub page_records:  usize,
    pub total_records: u64,
    pub watermark:     Watermark,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub pages:     u64,
    pub records:   u64,
    pub watermark: Watermark,
}
