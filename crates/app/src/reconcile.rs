use std::{collections::BTreeSet, sync::Arc, time::Instant};

use anniversary_core::{years_of_service, AnniversaryPolicy, Employee, IssuanceMode, NewCertificate};
use anniversary_storage::{RecordStore, StoreFailure};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use metrics::{counter, histogram};
use tokio::sync::Mutex;
use tracing::{error, info};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Issues work anniversary certificates for employees that are owed one.
///
/// Runs are serialized through an internal lock shared by every clone, so two
/// callers never race between the existence check and the insert. The unique
/// `(employee_id, year_of_service)` constraint in the store still guards
/// against other processes.
#[derive(Clone)]
pub struct Reconciler<S> {
    store: S,
    policy: AnniversaryPolicy,
    timezone: Tz,
    clock: Clock,
    run_lock: Arc<Mutex<()>>,
}

impl<S: RecordStore> Reconciler<S> {
    pub fn new(store: S, policy: AnniversaryPolicy, timezone: Tz) -> Self {
        Self {
            store,
            policy,
            timezone,
            clock: Arc::new(Utc::now),
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Overrides the clock used to decide the evaluation day.
    #[cfg(test)]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current calendar day in the configured timezone.
    pub fn today(&self) -> NaiveDate {
        (self.clock)().with_timezone(&self.timezone).date_naive()
    }

    /// Executes one reconciliation run and returns how many certificates were issued.
    ///
    /// Any store failure aborts the run. Staged certificates are submitted in a
    /// single batch, so a failed run leaves no partial set behind.
    pub async fn reconcile(&self) -> Result<usize, StoreFailure> {
        let _guard = self.run_lock.lock().await;
        let start = Instant::now();

        let result = self.run().await;

        histogram!("reconcile_duration_seconds").record(start.elapsed().as_secs_f64());
        match &result {
            Ok(issued) => {
                counter!("reconcile_runs_total", "result" => "ok").increment(1);
                counter!("certificates_issued_total").increment(*issued as u64);
            }
            Err(err) => {
                counter!("reconcile_runs_total", "result" => "error").increment(1);
                error!(stage = "reconcile", error = %err, "reconciliation run failed");
            }
        }

        result
    }

    async fn run(&self) -> Result<usize, StoreFailure> {
        let employees = self.store.list_employees().await?;
        let today = self.today();

        let mut staged: Vec<NewCertificate> = Vec::new();
        for employee in &employees {
            staged.extend(self.stage_for(employee, today).await?);
        }

        if staged.is_empty() {
            info!(
                stage = "reconcile",
                %today,
                mode = self.policy.mode().as_str(),
                employees = employees.len(),
                "no certificates owed"
            );
            return Ok(0);
        }

        let inserted = self.store.insert_certificates(&staged).await?;
        info!(
            stage = "reconcile",
            %today,
            mode = self.policy.mode().as_str(),
            employees = employees.len(),
            issued = inserted.len(),
            "certificates issued"
        );

        Ok(inserted.len())
    }

    async fn stage_for(
        &self,
        employee: &Employee,
        today: NaiveDate,
    ) -> Result<Vec<NewCertificate>, StoreFailure> {
        let completed = years_of_service(employee.join_date, today);
        if completed == 0 {
            return Ok(Vec::new());
        }

        let issued = self.issued_years(&employee.id, completed).await?;
        Ok(self.policy.stage(employee, today, &issued))
    }

    async fn issued_years(
        &self,
        employee_id: &str,
        completed: u32,
    ) -> Result<BTreeSet<u32>, StoreFailure> {
        match self.policy.mode() {
            IssuanceMode::CurrentYearOnly => {
                let exists = self.store.certificate_exists(employee_id, completed).await?;
                Ok(if exists {
                    BTreeSet::from([completed])
                } else {
                    BTreeSet::new()
                })
            }
            IssuanceMode::Backfill => Ok(self
                .store
                .list_certificates_for(employee_id)
                .await?
                .into_iter()
                .map(|certificate| certificate.year_of_service)
                .collect()),
        }
    }
}
