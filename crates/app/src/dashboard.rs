use anniversary_core::{
    citation, tenure_label, years_of_service, Certificate, CertificateWithEmployee, Employee,
};
use anniversary_storage::{RecordStore, StoreFailure};
use chrono::NaiveDate;
use serde::Serialize;

const RECENT_CERTIFICATES: usize = 2;

/// Dashboard card for a single employee.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeOverview {
    #[serde(flatten)]
    pub employee: Employee,
    pub years_of_service: u32,
    pub tenure: String,
    pub certificate_count: usize,
    pub recent_certificates: Vec<Certificate>,
}

/// Certificate as displayed to users, with its title and recognition line.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateCard {
    #[serde(flatten)]
    pub certificate: CertificateWithEmployee,
    pub title: &'static str,
    pub citation: String,
}

impl From<CertificateWithEmployee> for CertificateCard {
    fn from(value: CertificateWithEmployee) -> Self {
        Self {
            title: value.certificate.certificate_type.title(),
            citation: citation(value.certificate.year_of_service),
            certificate: value,
        }
    }
}

/// Builds the per-employee overview, newest employees first.
pub async fn build_dashboard<S: RecordStore>(
    store: &S,
    today: NaiveDate,
) -> Result<Vec<EmployeeOverview>, StoreFailure> {
    let employees = store.list_employees().await?;
    let mut overview = Vec::with_capacity(employees.len());

    for employee in employees {
        let certificates = store.list_certificates_for(&employee.id).await?;
        let years = years_of_service(employee.join_date, today);
        overview.push(EmployeeOverview {
            years_of_service: years,
            tenure: tenure_label(years),
            certificate_count: certificates.len(),
            recent_certificates: certificates.into_iter().take(RECENT_CERTIFICATES).collect(),
            employee,
        });
    }

    Ok(overview)
}
