//! Periodic per-tenant maintenance.
//!
//! Each tick lists the tenants, then for every tenant builds a fresh [`TenantContext`],
//! selects the tenant's schema and runs the maintenance job. Tenants are processed one at
//! a time; a failure for one tenant is logged and the tick moves on.

use crate::error::AppError;
use crate::tenant::{TenantContext, TenantSchema};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// One tenant as seen by the sweep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TenantEntry {
    /// Display name, used in logs.
    pub name: String,
    pub schema_name: String,
}

#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn list_tenants(&self) -> Result<Vec<TenantEntry>, AppError>;
}

#[async_trait]
pub trait TenantMaintenance: Send + Sync {
    /// Run for the tenant selected in `ctx`; returns the number of affected rows.
    async fn run(&self, ctx: &TenantContext) -> Result<u64, AppError>;
}

/// Shortest wait between ticks. A zero interval is raised to this.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub processed: usize,
    pub failed: usize,
    pub affected: u64,
}

pub struct SweepService {
    directory: Arc<dyn TenantDirectory>,
    maintenance: Arc<dyn TenantMaintenance>,
    fallback: TenantSchema,
    interval: Duration,
}

impl SweepService {
    pub fn new(
        directory: Arc<dyn TenantDirectory>,
        maintenance: Arc<dyn TenantMaintenance>,
        fallback: TenantSchema,
        interval: Duration,
    ) -> Self {
        let interval = if interval.is_zero() {
            tracing::warn!(
                min_secs = MIN_SWEEP_INTERVAL.as_secs(),
                "sweep interval is zero, using the minimum"
            );
            MIN_SWEEP_INTERVAL
        } else {
            interval
        };
        SweepService {
            directory,
            maintenance,
            fallback,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One pass over all tenants. Only a listing failure is returned as an error.
    pub async fn run_tick(&self) -> Result<TickReport, AppError> {
        let tenants = self.directory.list_tenants().await?;
        let mut report = TickReport::default();

        for tenant in tenants {
            let mut ctx = TenantContext::new(self.fallback.clone());
            let schema = match TenantSchema::from_claim(&tenant.schema_name) {
                Ok(s) => s,
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(building = %tenant.name, error = %e, "skipping tenant with invalid schema name");
                    continue;
                }
            };
            ctx.set(schema);

            match self.maintenance.run(&ctx).await {
                Ok(affected) => {
                    report.processed += 1;
                    report.affected += affected;
                    if affected > 0 {
                        tracing::info!(
                            building = %tenant.name,
                            schema = %ctx.get(),
                            affected,
                            "tenant maintenance updated rows"
                        );
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(building = %tenant.name, schema = %ctx.get(), error = %e, "tenant maintenance failed");
                }
            }
        }
        Ok(report)
    }

    /// Run immediately, then every interval until `shutdown` turns true or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "tenant sweep started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    match self.run_tick().await {
                        Ok(report) => tracing::debug!(
                            processed = report.processed,
                            failed = report.failed,
                            affected = report.affected,
                            "sweep tick finished"
                        ),
                        Err(e) => tracing::error!(error = %e, "sweep tick aborted: cannot list tenants"),
                    }
                }
            }
        }
        tracing::info!("tenant sweep stopped");
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedDirectory(Vec<TenantEntry>);

    #[async_trait]
    impl TenantDirectory for FixedDirectory {
        async fn list_tenants(&self) -> Result<Vec<TenantEntry>, AppError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenDirectory;

    #[async_trait]
    impl TenantDirectory for BrokenDirectory {
        async fn list_tenants(&self) -> Result<Vec<TenantEntry>, AppError> {
            Err(AppError::Internal("registry unavailable".into()))
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TenantMaintenance for Recorder {
        async fn run(&self, ctx: &TenantContext) -> Result<u64, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(ctx.schema_name().to_string());
            if Some(ctx.schema_name()) == self.fail_on {
                return Err(AppError::Internal("boom".into()));
            }
            Ok(2)
        }
    }

    fn entry(name: &str, schema: &str) -> TenantEntry {
        TenantEntry {
            name: name.into(),
            schema_name: schema.into(),
        }
    }

    fn service(dir: Arc<dyn TenantDirectory>, m: Arc<Recorder>, interval: Duration) -> SweepService {
        SweepService::new(dir, m, TenantSchema::parse("building").unwrap(), interval)
    }

    #[tokio::test]
    async fn failing_tenant_does_not_stop_the_others() {
        let dir = Arc::new(FixedDirectory(vec![
            entry("One", "t1"),
            entry("Two", "t2"),
            entry("Three", "t3"),
        ]));
        let rec = Arc::new(Recorder {
            fail_on: Some("t2"),
            ..Default::default()
        });
        let report = service(dir, rec.clone(), Duration::from_secs(30))
            .run_tick()
            .await
            .unwrap();
        assert_eq!(*rec.seen.lock().unwrap(), vec!["t1", "t2", "t3"]);
        assert_eq!(
            report,
            TickReport {
                processed: 2,
                failed: 1,
                affected: 4
            }
        );
    }

    #[tokio::test]
    async fn invalid_schema_is_skipped_without_running() {
        let dir = Arc::new(FixedDirectory(vec![entry("Bad", "x; drop"), entry("Ok", "HN-GREENPARK")]));
        let rec = Arc::new(Recorder::default());
        let report = service(dir, rec.clone(), Duration::from_secs(30))
            .run_tick()
            .await
            .unwrap();
        assert_eq!(*rec.seen.lock().unwrap(), vec!["HN-GREENPARK"]);
        assert_eq!(report.failed, 1);
        assert_eq!(report.processed, 1);
    }

    #[tokio::test]
    async fn listing_failure_aborts_the_tick() {
        let rec = Arc::new(Recorder::default());
        let result = service(Arc::new(BrokenDirectory), rec.clone(), Duration::from_secs(30))
            .run_tick()
            .await;
        assert!(result.is_err());
        assert_eq!(rec.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn runs_immediately_and_stops_on_shutdown() {
        let dir = Arc::new(FixedDirectory(vec![entry("One", "t1")]));
        let rec = Arc::new(Recorder::default());
        let (tx, rx) = watch::channel(false);
        let handle = service(dir, rec.clone(), Duration::from_secs(3600)).spawn(rx);

        for _ in 0..200 {
            if rec.calls.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(rec.calls.load(Ordering::SeqCst), 1);

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("sweep did not stop")
            .unwrap();
        assert_eq!(rec.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_interval_is_raised_and_the_loop_still_runs() {
        let dir = Arc::new(FixedDirectory(vec![entry("One", "t1")]));
        let rec = Arc::new(Recorder::default());
        let sweep = service(dir, rec.clone(), Duration::ZERO);
        assert_eq!(sweep.interval(), MIN_SWEEP_INTERVAL);

        let (tx, rx) = watch::channel(false);
        let handle = sweep.spawn(rx);
        for _ in 0..200 {
            if rec.calls.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(rec.calls.load(Ordering::SeqCst), 1);

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("sweep did not stop")
            .expect("sweep task panicked");
    }

    #[tokio::test]
    async fn does_not_start_when_already_shut_down() {
        let dir = Arc::new(FixedDirectory(vec![entry("One", "t1")]));
        let rec = Arc::new(Recorder::default());
        let (_tx, rx) = watch::channel(true);
        service(dir, rec.clone(), Duration::from_secs(1)).run(rx).await;
        assert_eq!(rec.calls.load(Ordering::SeqCst), 0);
    }
}
