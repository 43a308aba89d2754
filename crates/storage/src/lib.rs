use std::{str::FromStr, time::Duration};

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};
use thiserror::Error;
use uuid::Uuid;

use anniversary_core::{
    Certificate, CertificateType, CertificateWithEmployee, Employee, NewCertificate, NewEmployee,
};

mod gateway;

pub use gateway::RecordStore;

const SQLITE_CONSTRAINT_FOREIGNKEY: &str = "787";
const SQLITE_CONSTRAINT_PRIMARYKEY: &str = "1555";
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    ///
    /// The database file is created when missing. Foreign keys are enforced on
    /// every pooled connection.
    pub async fn connect(database_url: &str) -> Result<Self, StoreFailure> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(StoreFailure::Connect)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(StoreFailure::Connect)?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StoreFailure> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StoreFailure::Migration)?;
        Ok(())
    }

    /// Returns a handle for reading and creating employees.
    pub fn employees(&self) -> EmployeeRepository {
        EmployeeRepository {
            pool: self.pool.clone(),
        }
    }

    /// Returns a handle for reading and issuing certificates.
    pub fn certificates(&self) -> CertificateRepository {
        CertificateRepository {
            pool: self.pool.clone(),
        }
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Failure of any store operation, carrying the underlying cause.
#[derive(Debug, Error)]
pub enum StoreFailure {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("certificate for employee {employee_id} year {year_of_service} already exists")]
    DuplicateCertificate {
        employee_id: String,
        year_of_service: u32,
    },
    #[error("employee {0} does not exist")]
    UnknownEmployee(String),
    #[error("stored row is malformed: {0}")]
    CorruptRow(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository responsible for the `employees` table.
#[derive(Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    /// Inserts a validated employee and returns the stored row.
    ///
    /// The identifier is generated here; `created_at` is assigned by SQLite.
    /// The row is committed before this returns, so other pooled connections
    /// see it immediately.
    pub async fn insert(&self, employee: &NewEmployee) -> Result<Employee, StoreFailure> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, EmployeeRow>(
            "INSERT INTO employees (id, name, email, position, department, join_date) \
             VALUES (?, ?, ?, ?, ?, ?) \
             RETURNING id, name, email, position, department, join_date, created_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(employee.name())
        .bind(employee.email())
        .bind(employee.position())
        .bind(employee.department())
        .bind(to_iso_date(employee.join_date()))
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(row.into_domain())
    }

    /// Lists every employee, most recently created first.
    pub async fn list(&self) -> Result<Vec<Employee>, StoreFailure> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            "SELECT id, name, email, position, department, join_date, created_at \
               FROM employees \
              ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(EmployeeRow::into_domain).collect())
    }
}

/// Repository responsible for the `certificates` table.
#[derive(Clone)]
pub struct CertificateRepository {
    pool: SqlitePool,
}

impl CertificateRepository {
    /// Lists all certificates joined with their employee, most recently issued first.
    pub async fn list_with_employees(&self) -> Result<Vec<CertificateWithEmployee>, StoreFailure> {
        let rows = sqlx::query_as::<_, CertificateWithEmployeeRow>(
            r#"
SELECT c.id,
       c.employee_id,
       c.certificate_type,
       c.issue_date,
       c.year_of_service,
       e.name AS employee_name,
       e.email AS employee_email,
       e.position AS employee_position,
       e.department AS employee_department,
       e.join_date AS employee_join_date,
       e.created_at AS employee_created_at
  FROM certificates AS c
  JOIN employees AS e
    ON e.id = c.employee_id
 ORDER BY c.issue_date DESC, c.rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(CertificateWithEmployeeRow::into_domain)
            .collect()
    }

    /// Lists the certificates of one employee, highest year of service first.
    pub async fn list_for_employee(
        &self,
        employee_id: &str,
    ) -> Result<Vec<Certificate>, StoreFailure> {
        let rows = sqlx::query_as::<_, CertificateRow>(
            "SELECT id, employee_id, certificate_type, issue_date, year_of_service \
               FROM certificates \
              WHERE employee_id = ? \
              ORDER BY year_of_service DESC",
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CertificateRow::into_domain).collect()
    }

    /// Returns `true` when the employee already holds a certificate for the given year.
    pub async fn exists(&self, employee_id: &str, year_of_service: u32) -> Result<bool, StoreFailure> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM certificates WHERE employee_id = ? AND year_of_service = ?)",
        )
        .bind(employee_id)
        .bind(i64::from(year_of_service))
        .fetch_one(&self.pool)
        .await?;

        Ok(found != 0)
    }

    /// Inserts the batch inside one transaction; either every row lands or none do.
    pub async fn insert_batch(
        &self,
        batch: &[NewCertificate],
    ) -> Result<Vec<Certificate>, StoreFailure> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(batch.len());

        for record in batch {
            let id = Uuid::new_v4().to_string();
            sqlx::query(
                "INSERT INTO certificates \
                 (id, employee_id, certificate_type, issue_date, year_of_service) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(&record.employee_id)
            .bind(record.certificate_type.as_str())
            .bind(to_iso_date(record.issue_date))
            .bind(i64::from(record.year_of_service))
            .execute(&mut *tx)
            .await
            .map_err(|err| map_certificate_insert_error(err, record))?;

            inserted.push(Certificate {
                id,
                employee_id: record.employee_id.clone(),
                certificate_type: record.certificate_type,
                issue_date: record.issue_date,
                year_of_service: record.year_of_service,
            });
        }

        tx.commit().await?;
        Ok(inserted)
    }
}

fn map_certificate_insert_error(err: sqlx::Error, record: &NewCertificate) -> StoreFailure {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|code| code.into_owned());
            match code.as_deref() {
                Some(SQLITE_CONSTRAINT_UNIQUE | SQLITE_CONSTRAINT_PRIMARYKEY) => {
                    StoreFailure::DuplicateCertificate {
                        employee_id: record.employee_id.clone(),
                        year_of_service: record.year_of_service,
                    }
                }
                Some(SQLITE_CONSTRAINT_FOREIGNKEY) => {
                    StoreFailure::UnknownEmployee(record.employee_id.clone())
                }
                _ => StoreFailure::Database(sqlx::Error::Database(db_err)),
            }
        }
        other => StoreFailure::Database(other),
    }
}

/// Employee row as selected from SQLite.
#[derive(Debug, sqlx::FromRow)]
pub struct EmployeeRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub position: String,
    pub department: String,
    pub join_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl EmployeeRow {
    pub fn into_domain(self) -> Employee {
        Employee {
            id: self.id,
            name: self.name,
            email: self.email,
            position: self.position,
            department: self.department,
            join_date: self.join_date,
            created_at: self.created_at,
        }
    }
}

/// Certificate row as selected from SQLite.
#[derive(Debug, sqlx::FromRow)]
pub struct CertificateRow {
    pub id: String,
    pub employee_id: String,
    pub certificate_type: String,
    pub issue_date: NaiveDate,
    pub year_of_service: i64,
}

impl CertificateRow {
    /// Converts the row into a domain certificate, rejecting values the domain cannot hold.
    pub fn into_domain(self) -> Result<Certificate, StoreFailure> {
        let certificate_type = CertificateType::from_db(&self.certificate_type).ok_or_else(|| {
            StoreFailure::CorruptRow(format!(
                "certificate {} has unknown type '{}'",
                self.id, self.certificate_type
            ))
        })?;
        let year_of_service = u32::try_from(self.year_of_service)
            .ok()
            .filter(|year| *year >= 1)
            .ok_or_else(|| {
                StoreFailure::CorruptRow(format!(
                    "certificate {} has invalid year_of_service {}",
                    self.id, self.year_of_service
                ))
            })?;

        Ok(Certificate {
            id: self.id,
            employee_id: self.employee_id,
            certificate_type,
            issue_date: self.issue_date,
            year_of_service,
        })
    }
}

/// Certificate row joined with its employee columns.
#[derive(Debug, sqlx::FromRow)]
pub struct CertificateWithEmployeeRow {
    #[sqlx(flatten)]
    pub certificate: CertificateRow,
    pub employee_name: String,
    pub employee_email: String,
    pub employee_position: String,
    pub employee_department: String,
    pub employee_join_date: NaiveDate,
    pub employee_created_at: DateTime<Utc>,
}

impl CertificateWithEmployeeRow {
    pub fn into_domain(self) -> Result<CertificateWithEmployee, StoreFailure> {
        let employee = Employee {
            id: self.certificate.employee_id.clone(),
            name: self.employee_name,
            email: self.employee_email,
            position: self.employee_position,
            department: self.employee_department,
            join_date: self.employee_join_date,
            created_at: self.employee_created_at,
        };
        Ok(CertificateWithEmployee {
            certificate: self.certificate.into_domain()?,
            employee,
        })
    }
}

fn to_iso_date(value: NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anniversary_core::EmployeeSubmission;
    use tempfile::TempDir;

    async fn setup_db() -> (Database, TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite://{}", dir.path().join("store.db").display());
        let db = Database::connect(&url).await.expect("connect");
        db.run_migrations().await.expect("migrations");
        (db, dir)
    }

    fn new_employee(name: &str, join_date: &str) -> NewEmployee {
        NewEmployee::try_from(EmployeeSubmission {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            position: "Engineer".to_string(),
            department: "Platform".to_string(),
            join_date: join_date.to_string(),
        })
        .expect("valid employee")
    }

    fn date(raw: &str) -> NaiveDate {
        raw.parse().expect("date")
    }

    #[tokio::test]
    async fn migrations_apply() {
        let (db, _dir) = setup_db().await;

        let tables: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('employees', 'certificates')",
        )
        .fetch_one(db.pool())
        .await
        .expect("fetch tables");
        assert_eq!(tables.0, 2);
    }

    #[tokio::test]
    async fn insert_employee_returns_generated_fields() {
        let (db, _dir) = setup_db().await;
        let before = Utc::now() - chrono::Duration::seconds(5);

        let stored = db
            .employees()
            .insert(&new_employee("Ada", "2021-06-01"))
            .await
            .expect("insert");

        assert!(Uuid::parse_str(&stored.id).is_ok());
        assert_eq!(stored.name, "Ada");
        assert_eq!(stored.email, "ada@example.com");
        assert_eq!(stored.join_date, date("2021-06-01"));
        assert!(stored.created_at >= before);
    }

    #[tokio::test]
    async fn list_employees_returns_newest_first() {
        let (db, _dir) = setup_db().await;
        let repo = db.employees();
        for name in ["First", "Second", "Third"] {
            repo.insert(&new_employee(name, "2020-01-01"))
                .await
                .expect("insert");
        }

        let names: Vec<String> = repo
            .list()
            .await
            .expect("list")
            .into_iter()
            .map(|employee| employee.name)
            .collect();
        assert_eq!(names, vec!["Third", "Second", "First"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn inserted_employee_is_visible_to_other_connections() {
        let (db, _dir) = setup_db().await;
        let repo = db.employees();

        for round in 1..=50 {
            let stored = repo
                .insert(&new_employee(&format!("Hire{round}"), "2020-01-01"))
                .await
                .expect("insert");

            let (a, b, c) = tokio::join!(repo.list(), repo.list(), repo.list());
            for listed in [a, b, c] {
                let listed = listed.expect("list");
                assert_eq!(listed.len(), round, "round {round} missed a committed row");
                assert_eq!(listed[0].id, stored.id);
            }
        }
    }

    #[tokio::test]
    async fn certificates_list_and_exist_checks() {
        let (db, _dir) = setup_db().await;
        let ada = db
            .employees()
            .insert(&new_employee("Ada", "2018-03-01"))
            .await
            .expect("insert ada");
        let bob = db
            .employees()
            .insert(&new_employee("Bob", "2020-05-01"))
            .await
            .expect("insert bob");

        let repo = db.certificates();
        repo.insert_batch(&[
            NewCertificate::work_anniversary(&ada.id, date("2022-03-01"), 4),
            NewCertificate::work_anniversary(&ada.id, date("2024-03-02"), 6),
            NewCertificate::work_anniversary(&bob.id, date("2023-05-02"), 3),
        ])
        .await
        .expect("insert batch");

        assert!(repo.exists(&ada.id, 4).await.expect("exists"));
        assert!(!repo.exists(&ada.id, 5).await.expect("exists"));
        assert!(!repo.exists(&bob.id, 4).await.expect("exists"));

        let years: Vec<u32> = repo
            .list_for_employee(&ada.id)
            .await
            .expect("list for ada")
            .into_iter()
            .map(|certificate| certificate.year_of_service)
            .collect();
        assert_eq!(years, vec![6, 4]);

        let joined = repo.list_with_employees().await.expect("list joined");
        let summary: Vec<(String, NaiveDate)> = joined
            .iter()
            .map(|row| (row.employee.name.clone(), row.certificate.issue_date))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Ada".to_string(), date("2024-03-02")),
                ("Bob".to_string(), date("2023-05-02")),
                ("Ada".to_string(), date("2022-03-01")),
            ]
        );
        assert_eq!(joined[0].employee.id, ada.id);
        assert_eq!(joined[0].certificate.certificate_type, CertificateType::WorkAnniversary);
    }

    #[tokio::test]
    async fn duplicate_in_batch_rolls_back_whole_batch() {
        let (db, _dir) = setup_db().await;
        let ada = db
            .employees()
            .insert(&new_employee("Ada", "2018-03-01"))
            .await
            .expect("insert ada");
        let repo = db.certificates();
        repo.insert_batch(&[NewCertificate::work_anniversary(
            &ada.id,
            date("2022-03-01"),
            4,
        )])
        .await
        .expect("seed");

        let err = repo
            .insert_batch(&[
                NewCertificate::work_anniversary(&ada.id, date("2024-03-01"), 6),
                NewCertificate::work_anniversary(&ada.id, date("2024-03-01"), 4),
            ])
            .await
            .expect_err("duplicate year must fail");
        assert!(matches!(
            err,
            StoreFailure::DuplicateCertificate { ref employee_id, year_of_service: 4 } if *employee_id == ada.id
        ));

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM certificates")
            .fetch_one(db.pool())
            .await
            .expect("count");
        assert_eq!(count.0, 1, "year 6 must not survive the failed batch");
    }

    #[tokio::test]
    async fn certificate_for_missing_employee_is_rejected() {
        let (db, _dir) = setup_db().await;
        let err = db
            .certificates()
            .insert_batch(&[NewCertificate::work_anniversary(
                "missing",
                date("2024-01-01"),
                1,
            )])
            .await
            .expect_err("foreign key must fail");
        assert!(matches!(err, StoreFailure::UnknownEmployee(id) if id == "missing"));
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let (db, _dir) = setup_db().await;
        let inserted = db
            .certificates()
            .insert_batch(&[])
            .await
            .expect("empty batch");
        assert!(inserted.is_empty());
    }
}
