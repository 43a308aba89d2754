use std::future::Future;

use anniversary_core::{Certificate, CertificateWithEmployee, Employee, NewCertificate, NewEmployee};

use crate::{Database, StoreFailure};

/// Operations the application needs from the record store.
///
/// Implementations pass calls straight through to persistence: no retries and
/// no caching. [`Database`] is the production implementation.
pub trait RecordStore: Send + Sync {
    /// Stores a validated employee and returns it with its generated id and creation time.
    fn insert_employee(
        &self,
        employee: &NewEmployee,
    ) -> impl Future<Output = Result<Employee, StoreFailure>> + Send;

    /// All employees, most recently created first.
    fn list_employees(&self) -> impl Future<Output = Result<Vec<Employee>, StoreFailure>> + Send;

    /// All certificates joined with their employee, most recently issued first.
    fn list_certificates(
        &self,
    ) -> impl Future<Output = Result<Vec<CertificateWithEmployee>, StoreFailure>> + Send;

    /// Certificates of one employee, highest year of service first.
    fn list_certificates_for(
        &self,
        employee_id: &str,
    ) -> impl Future<Output = Result<Vec<Certificate>, StoreFailure>> + Send;

    fn certificate_exists(
        &self,
        employee_id: &str,
        year_of_service: u32,
    ) -> impl Future<Output = Result<bool, StoreFailure>> + Send;

    /// Inserts every certificate or none of them.
    fn insert_certificates(
        &self,
        batch: &[NewCertificate],
    ) -> impl Future<Output = Result<Vec<Certificate>, StoreFailure>> + Send;
}

impl RecordStore for Database {
    async fn insert_employee(&self, employee: &NewEmployee) -> Result<Employee, StoreFailure> {
        self.employees().insert(employee).await
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, StoreFailure> {
        self.employees().list().await
    }

    async fn list_certificates(&self) -> Result<Vec<CertificateWithEmployee>, StoreFailure> {
        self.certificates().list_with_employees().await
    }

    async fn list_certificates_for(&self, employee_id: &str) -> Result<Vec<Certificate>, StoreFailure> {
        self.certificates().list_for_employee(employee_id).await
    }

    async fn certificate_exists(
        &self,
        employee_id: &str,
        year_of_service: u32,
    ) -> Result<bool, StoreFailure> {
        self.certificates().exists(employee_id, year_of_service).await
    }

    async fn insert_certificates(
        &self,
        batch: &[NewCertificate],
    ) -> Result<Vec<Certificate>, StoreFailure> {
        self.certificates().insert_batch(batch).await
    }
}
