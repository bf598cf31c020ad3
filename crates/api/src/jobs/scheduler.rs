//! Job scheduler infrastructure for background tasks.
//!
//! All registered jobs run on a single task, one after another in
//! registration order: once at startup (optional) and then on every tick of
//! a fixed interval (optional).

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// When the registered jobs run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub run_on_startup: bool,
    /// Period between runs; `None` disables periodic runs.
    pub interval: Option<Duration>,
}

impl Schedule {
    /// Builds a schedule from `interval_minutes`, where 0 means "never".
    pub fn from_minutes(run_on_startup: bool, interval_minutes: u64) -> Self {
        Self {
            run_on_startup,
            interval: (interval_minutes > 0).then(|| Duration::from_secs(interval_minutes * 60)),
        }
    }

    pub fn is_idle(&self) -> bool {
        !self.run_on_startup && self.interval.is_none()
    }
}

/// Trait for implementing background jobs.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    /// The name of this job (used for logging).
    fn name(&self) -> &'static str;

    /// Execute the job. Returns Ok(()) on success, Err with message on failure.
    async fn execute(&self) -> Result<(), String>;
}

/// Background job scheduler.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handle: Option<JoinHandle<()>>,
}

/// Runs every job once, sequentially. Returns the number of failed jobs.
pub async fn run_jobs(jobs: &[Arc<dyn Job>]) -> usize {
    let mut failures = 0;

    for job in jobs {
        let name = job.name();
        let start = std::time::Instant::now();
        info!(job = name, "Job starting");

        match job.execute().await {
            Ok(()) => {
                info!(
                    job = name,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Job completed successfully"
                );
            }
            Err(e) => {
                failures += 1;
                error!(
                    job = name,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "Job failed"
                );
            }
        }
    }

    failures
}

impl JobScheduler {
    /// Create a new job scheduler.
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            shutdown_tx,
            shutdown_rx,
            handle: None,
        }
    }

    /// Register a job with the scheduler.
    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Start the runner task.
    pub fn start(&mut self, schedule: Schedule) {
        if self.jobs.is_empty() || schedule.is_idle() {
            info!("No background jobs to run");
            return;
        }

        info!(
            jobs = self.jobs.len(),
            run_on_startup = schedule.run_on_startup,
            interval = ?schedule.interval,
            "Starting job scheduler"
        );

        let jobs = self.jobs.clone();
        let mut shutdown_rx = self.shutdown_rx.clone();

        self.handle = Some(tokio::spawn(async move {
            if schedule.run_on_startup {
                run_jobs(&jobs).await;
            }

            let Some(period) = schedule.interval else {
                return;
            };

            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Skip the first immediate tick
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        run_jobs(&jobs).await;
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            info!("Job scheduler shutting down");
                            break;
                        }
                    }
                }
            }
        }));
    }

    /// Initiate graceful shutdown.
    /// Returns immediately after signaling shutdown.
    pub fn shutdown(&self) {
        info!("Initiating job scheduler shutdown");
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for the runner task to finish, with timeout.
    pub async fn wait_for_shutdown(self, timeout: Duration) {
        let Some(handle) = self.handle else {
            return;
        };

        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(())) => info!("Job scheduler stopped"),
            Ok(Err(e)) => warn!("Job task panicked: {}", e),
            Err(_) => warn!("Job shutdown timed out after {:?}", timeout),
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct TestJob {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        should_fail: bool,
    }

    #[async_trait::async_trait]
    impl Job for TestJob {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn execute(&self) -> Result<(), String> {
            self.log.lock().unwrap().push(self.name);
            if self.should_fail {
                Err("Test failure".to_string())
            } else {
                Ok(())
            }
        }
    }

    fn job(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>, should_fail: bool) -> TestJob {
        TestJob {
            name,
            log: Arc::clone(log),
            should_fail,
        }
    }

    #[test]
    fn test_schedule_from_minutes() {
        let schedule = Schedule::from_minutes(true, 0);
        assert!(schedule.run_on_startup);
        assert_eq!(schedule.interval, None);

        let schedule = Schedule::from_minutes(false, 15);
        assert_eq!(schedule.interval, Some(Duration::from_secs(900)));
        assert!(Schedule::from_minutes(false, 0).is_idle());
    }

    #[tokio::test]
    async fn test_run_jobs_is_sequential_and_counts_failures() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let jobs: Vec<Arc<dyn Job>> = vec![
            Arc::new(job("cleanup", &log, true)),
            Arc::new(job("sync", &log, false)),
        ];

        assert_eq!(run_jobs(&jobs).await, 1);
        assert_eq!(*log.lock().unwrap(), vec!["cleanup", "sync"]);
    }

    #[tokio::test]
    async fn test_startup_run_executes_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = JobScheduler::new();
        scheduler.register(job("cleanup", &log, false));
        scheduler.start(Schedule::from_minutes(true, 0));
        scheduler.wait_for_shutdown(Duration::from_secs(2)).await;

        assert_eq!(*log.lock().unwrap(), vec!["cleanup"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_runs_until_shutdown() {
        let runs = Arc::new(AtomicUsize::new(0));

        struct CountingJob(Arc<AtomicUsize>);

        #[async_trait::async_trait]
        impl Job for CountingJob {
            fn name(&self) -> &'static str {
                "counting"
            }

            async fn execute(&self) -> Result<(), String> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let mut scheduler = JobScheduler::new();
        scheduler.register(CountingJob(Arc::clone(&runs)));
        scheduler.start(Schedule::from_minutes(false, 1));

        tokio::time::sleep(Duration::from_secs(150)).await;
        scheduler.shutdown();
        scheduler.wait_for_shutdown(Duration::from_secs(2)).await;

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_no_jobs_spawns_nothing() {
        let mut scheduler = JobScheduler::default();
        scheduler.start(Schedule::from_minutes(true, 0));
        assert!(scheduler.handle.is_none());
    }
}
