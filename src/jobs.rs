//! Caller-owned registry of scrape jobs started through the HTTP shell.

use chrono::Local;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::export::{default_export_path, write_csv};
use crate::page::PageDriver;
use crate::scraper::ProfileScraper;

/// Where a job is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Initializing,
    CheckingLogin,
    Scraping,
    Saving,
    Complete,
    Error,
}

impl JobStatus {
    /// Whether the job has stopped and will not change again
    pub fn is_finished(self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobStatus::Initializing => "initializing",
            JobStatus::CheckingLogin => "checking_login",
            JobStatus::Scraping => "scraping",
            JobStatus::Saving => "saving",
            JobStatus::Complete => "complete",
            JobStatus::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// Progress as reported to pollers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeProgress {
    pub status: JobStatus,
    pub message: String,
    /// 0..=100
    pub progress: u8,
}

#[derive(Debug, Clone)]
struct Job {
    progress: ScrapeProgress,
    output: Option<PathBuf>,
    finished_at: Option<Instant>,
}

/// Jobs keyed by timestamp-derived id
#[derive(Debug, Clone, Default)]
pub struct ScrapeJobs {
    jobs: Arc<DashMap<String, Job>>,
}

impl ScrapeJobs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job and return its id (`%Y%m%d%H%M%S`, suffixed `-2`,
    /// `-3`, ... when that second is taken)
    pub fn create(&self) -> String {
        let base = Local::now().format("%Y%m%d%H%M%S").to_string();
        let mut suffix = 1;
        loop {
            let id = if suffix == 1 {
                base.clone()
            } else {
                format!("{}-{}", base, suffix)
            };
            if let Entry::Vacant(slot) = self.jobs.entry(id.clone()) {
                slot.insert(Job {
                    progress: ScrapeProgress {
                        status: JobStatus::Initializing,
                        message: "Starting scraper...".to_string(),
                        progress: 0,
                    },
                    output: None,
                    finished_at: None,
                });
                return id;
            }
            suffix += 1;
        }
    }

    /// Set the job's progress; unknown ids are ignored
    pub fn update(&self, id: &str, status: JobStatus, message: impl Into<String>, progress: u8) {
        if let Some(mut job) = self.jobs.get_mut(id) {
            job.progress = ScrapeProgress {
                status,
                message: message.into(),
                progress: progress.min(100),
            };
            job.finished_at = status.is_finished().then(Instant::now);
        }
    }

    pub fn status(&self, id: &str) -> Option<ScrapeProgress> {
        self.jobs.get(id).map(|job| job.progress.clone())
    }

    /// Export file of a completed job
    pub fn output(&self, id: &str) -> Option<PathBuf> {
        self.jobs.get(id).and_then(|job| job.output.clone())
    }

    /// Record the export file of a job
    pub fn set_output(&self, id: &str, path: PathBuf) {
        if let Some(mut job) = self.jobs.get_mut(id) {
            job.output = Some(path);
        }
    }

    /// Forget a job, returning its export path if it had one
    pub fn discard(&self, id: &str) -> Option<PathBuf> {
        self.jobs.remove(id).and_then(|(_, job)| job.output)
    }

    /// Forget finished jobs older than `max_age`, returning how many went.
    ///
    /// Export files stay on disk; only the registry entries are dropped.
    pub fn expire_finished(&self, max_age: Duration) -> usize {
        let mut expired_count = 0;
        self.jobs.retain(|id, job| {
            let expired = job
                .finished_at
                .is_some_and(|finished| finished.elapsed() >= max_age);
            if expired {
                debug!("Expiring job {} ({})", id, job.progress.status);
                expired_count += 1;
            }
            !expired
        });
        expired_count
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Run one job to completion, reporting progress into `jobs`.
///
/// initializing 0 → checking_login 20 → scraping 30 → saving 90 →
/// complete 100; a failed login or export ends in `error`.
pub async fn run_job<P: PageDriver>(
    jobs: &ScrapeJobs,
    id: &str,
    scraper: &ProfileScraper<P>,
    profile_url: &str,
    max_posts: NonZeroUsize,
    output_dir: &Path,
) {
    jobs.update(
        id,
        JobStatus::CheckingLogin,
        "Checking if already logged in...",
        20,
    );
    if !scraper.login().await {
        error!("Job {}: login failed", id);
        jobs.update(id, JobStatus::Error, "Failed to log in.", 20);
        return;
    }

    jobs.update(
        id,
        JobStatus::Scraping,
        format!("Scraping {} posts from {}...", max_posts, profile_url),
        30,
    );
    let result = scraper.scrape(profile_url, max_posts).await;

    jobs.update(id, JobStatus::Saving, "Saving results to CSV file...", 90);
    let path = output_dir.join(default_export_path(result.profile_name()));
    match write_csv(&result, Some(&path)) {
        Ok(path) => {
            info!("Job {} saved {}", id, path.display());
            jobs.set_output(id, path);
            jobs.update(
                id,
                JobStatus::Complete,
                format!(
                    "Successfully saved {} posts to CSV.",
                    result.posts().len()
                ),
                100,
            );
        }
        Err(e) => {
            error!("Job {}: {}", id, e);
            jobs.update(id, JobStatus::Error, format!("Error: {}", e), 90);
        }
    }
}

#[cfg(test)]
#[path = "jobs_test.rs"]
mod jobs_test;
