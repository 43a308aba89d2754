use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Employee record as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub email: String,
    pub position: String,
    pub department: String,
    pub join_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Kind of certificate issued to an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateType {
    WorkAnniversary,
}

impl CertificateType {
    /// Returns the canonical database representation for the type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WorkAnniversary => "work_anniversary",
        }
    }

    /// Parses the database representation, returning `None` for unknown values.
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "work_anniversary" => Some(Self::WorkAnniversary),
            _ => None,
        }
    }

    /// Human readable title shown on the certificate.
    pub fn title(self) -> &'static str {
        match self {
            Self::WorkAnniversary => "Work Anniversary Certificate",
        }
    }
}

impl fmt::Display for CertificateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Certificate awarded to an employee for a completed year of service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: String,
    pub employee_id: String,
    pub certificate_type: CertificateType,
    pub issue_date: NaiveDate,
    pub year_of_service: u32,
}

/// Certificate joined with the employee it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateWithEmployee {
    #[serde(flatten)]
    pub certificate: Certificate,
    pub employee: Employee,
}

/// Certificate staged for insertion; the store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCertificate {
    pub employee_id: String,
    pub certificate_type: CertificateType,
    pub issue_date: NaiveDate,
    pub year_of_service: u32,
}

impl NewCertificate {
    /// Builds a work anniversary certificate issued on `issue_date`.
    pub fn work_anniversary(
        employee_id: impl Into<String>,
        issue_date: NaiveDate,
        year_of_service: u32,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            certificate_type: CertificateType::WorkAnniversary,
            issue_date,
            year_of_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certificate_type_round_trips_through_db_value() {
        let value = CertificateType::WorkAnniversary.as_str();
        assert_eq!(value, "work_anniversary");
        assert_eq!(
            CertificateType::from_db(value),
            Some(CertificateType::WorkAnniversary)
        );
        assert_eq!(CertificateType::from_db("promotion"), None);
    }

    #[test]
    fn joined_certificate_serializes_flat_with_employee() {
        let employee = Employee {
            id: "e-1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            position: "Engineer".into(),
            department: "R&D".into(),
            join_date: NaiveDate::from_ymd_opt(2020, 1, 10).unwrap(),
            created_at: DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        let joined = CertificateWithEmployee {
            certificate: Certificate {
                id: "c-1".into(),
                employee_id: "e-1".into(),
                certificate_type: CertificateType::WorkAnniversary,
                issue_date: NaiveDate::from_ymd_opt(2023, 1, 15).unwrap(),
                year_of_service: 3,
            },
            employee,
        };

        let value = serde_json::to_value(&joined).expect("serialize");
        assert_eq!(value["certificate_type"], "work_anniversary");
        assert_eq!(value["issue_date"], "2023-01-15");
        assert_eq!(value["year_of_service"], 3);
        assert_eq!(value["employee"]["name"], "Ada");
        assert_eq!(value["employee"]["join_date"], "2020-01-10");
    }
}
