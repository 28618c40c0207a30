use std::sync::Arc;

use chrono::Local;
use futures::stream::{self, StreamExt};
use tracing::info;

use voyager_common::BatchReport;

use crate::traits::{ContentFetcher, FolderStore};
use crate::upload::upload_captcha;

/// Runs a fixed number of fetch+upload cycles concurrently into one folder.
///
/// The folder is chosen by the caller before the batch starts and is not
/// re-checked, so a batch may overshoot folder capacity by up to `size - 1`.
pub struct BatchRunner {
    fetcher: Arc<dyn ContentFetcher>,
    store: Arc<dyn FolderStore>,
    size: usize,
}

struct CycleOutcome {
    line: String,
    uploaded: bool,
}

impl BatchRunner {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, store: Arc<dyn FolderStore>, size: usize) -> Self {
        Self {
            fetcher,
            store,
            size,
        }
    }

    pub async fn run(&self, folder: &str) -> BatchReport {
        info!(folder, size = self.size, "Starting upload batch");

        let outcomes: Vec<CycleOutcome> = stream::iter(0..self.size)
            .map(|cycle| self.run_cycle(cycle, folder))
            .buffer_unordered(self.size.max(1))
            .collect()
            .await;

        let succeeded = outcomes.iter().filter(|o| o.uploaded).count();
        info!(folder, succeeded, attempted = outcomes.len(), "Upload batch finished");

        BatchReport {
            folder: folder.to_string(),
            lines: outcomes.into_iter().map(|o| o.line).collect(),
            succeeded,
        }
    }

    async fn run_cycle(&self, cycle: usize, folder: &str) -> CycleOutcome {
        let captcha = match self.fetcher.fetch_captcha().await {
            Ok(captcha) if captcha.image_base64.is_empty() => {
                return CycleOutcome {
                    line: log_line("Fetch failed: No captcha data"),
                    uploaded: false,
                }
            }
            Ok(captcha) => captcha,
            Err(e) => {
                return CycleOutcome {
                    line: log_line(&format!("Fetch failed: {e}")),
                    uploaded: false,
                }
            }
        };

        let record = upload_captcha(self.store.as_ref(), folder, &captcha.image_base64, Some(cycle)).await;
        match record.error {
            None => CycleOutcome {
                line: log_line(&format!(
                    "Image uploaded successfully to Dropbox as {}",
                    record.destination
                )),
                uploaded: true,
            },
            Some(err) => CycleOutcome {
                line: log_line(&format!("Upload failed: {err}")),
                uploaded: false,
            },
        }
    }
}

/// `[HH:MM:SS] message`, local time.
pub fn log_line(message: &str) -> String {
    format!("[{}] {message}", Local::now().format("%H:%M:%S"))
}
