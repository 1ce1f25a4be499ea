use std::sync::LazyLock;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use trawl_fetch::Progress;

const SPINNER_STYLE: &str = "{spinner:.blue} {prefix:>12.cyan.bold} [{elapsed_precise}] {pos} records {wide_msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

static SPINNER_TEMPLATE: LazyLock<Option<ProgressStyle>> = LazyLock::new(|| {
    ProgressStyle::with_template(SPINNER_STYLE)
        .ok()
        .map(|style| style.tick_chars(TICK))
});

/// Spinner fed by the fetch loop, one update per page.
pub struct PageTracker {
    pb: ProgressBar,
}

impl PageTracker {
    pub fn new(prefix: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        let pb = match SPINNER_TEMPLATE.as_ref() {
            Some(style) => pb.with_style(style.clone()),
            None => pb,
        };
        pb.set_prefix(prefix.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        Self { pb }
    }

    /// Callback suitable for `FetchOptions::on_progress`.
    pub fn observer(&self) -> impl Fn(&Progress) + Send + Sync + use<> {
        let pb = self.pb.clone();
        move |progress| {
            pb.set_position(progress.total_records);
            pb.set_message(format!("page {}, up to {}", progress.page, progress.watermark));
        }
    }

    pub fn finish(self, msg: String) { self.pb.finish_with_message(msg); }

    pub fn abandon(self) { self.pb.abandon(); }
}
