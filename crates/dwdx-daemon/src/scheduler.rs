//! Cron-style triggers, one per pipeline

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use cron::Schedule;
use dwdx_ingest::{ForecastPipeline, ObservationPipeline};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{expr}': {reason}")]
    Parse { expr: String, reason: String },
}

/// Something a trigger can fire. Runs must swallow their own errors.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    async fn fire(&self);
}

#[async_trait::async_trait]
impl Job for ForecastPipeline {
    async fn fire(&self) {
        self.run().await;
    }
}

#[async_trait::async_trait]
impl Job for ObservationPipeline {
    async fn fire(&self) {
        self.run().await;
    }
}

/// Parse a cron expression. Five-field expressions get a `0` seconds field.
pub fn parse_schedule(expr: &str) -> Result<Schedule, ScheduleError> {
    let trimmed = expr.trim();
    let normalized = if trimmed.split_whitespace().count() == 5 {
        format!("0 {}", trimmed)
    } else {
        trimmed.to_string()
    };
    Schedule::from_str(&normalized).map_err(|e| ScheduleError::Parse {
        expr: expr.to_string(),
        reason: e.to_string(),
    })
}

/// Next fire time strictly after `now`
pub fn next_fire(schedule: &Schedule, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule.after(&now).next()
}

/// Independent triggers; a slow run of one never delays the other
#[derive(Default)]
pub struct Scheduler {
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a trigger that fires `job` at every occurrence of `schedule`
    pub fn spawn(&mut self, name: &'static str, schedule: Schedule, job: Arc<dyn Job>) {
        let handle = tokio::spawn(async move {
            let mut now = Utc::now();
            loop {
                let Some(next) = next_fire(&schedule, now) else {
                    warn!(trigger = name, "schedule has no further occurrences");
                    break;
                };
                info!(trigger = name, next = %next, "waiting for next run");
                sleep((next - now).to_std().unwrap_or_default()).await;

                info!(trigger = name, "trigger fired");
                job.fire().await;
                // occurrences missed while the job ran are skipped
                now = Utc::now().max(next);
            }
        });
        self.handles.push(handle);
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Stop all triggers; a run in progress is dropped at its next await
    pub fn stop(&mut self) {
        info!("Stopping scheduler...");
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_hourly_minute_offset() {
        let schedule = parse_schedule("0 5 * * * *").unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 10, 0).unwrap();
        assert_eq!(
            next_fire(&schedule, now),
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 13, 5, 0).unwrap())
        );
    }

    #[test]
    fn test_five_field_expression() {
        let schedule = parse_schedule("50 * * * *").unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 10, 0).unwrap();
        assert_eq!(
            next_fire(&schedule, now),
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 50, 0).unwrap())
        );
    }

    #[test]
    fn test_invalid_expression() {
        assert!(parse_schedule("every hour").is_err());
    }

    struct CountingJob(AtomicUsize);

    #[async_trait::async_trait]
    impl Job for CountingJob {
        async fn fire(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_and_stop() {
        let job = Arc::new(CountingJob(AtomicUsize::new(0)));
        let mut scheduler = Scheduler::new();
        scheduler.spawn("every-second", parse_schedule("* * * * * *").unwrap(), job.clone());
        assert_eq!(scheduler.len(), 1);

        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
        scheduler.stop();
        assert!(scheduler.is_empty());
        let fired = job.0.load(Ordering::SeqCst);
        assert!((2..=3).contains(&fired), "fired {} times", fired);

        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        assert_eq!(job.0.load(Ordering::SeqCst), fired);
    }
}
