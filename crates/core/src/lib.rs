//! Domain types and pure rules for employee records and anniversary certificates.
//!
//! Nothing in this crate performs I/O; storage and HTTP live in sibling crates.

pub mod issuance;
pub mod submission;
pub mod tenure;
pub mod types;

pub use issuance::{citation, AnniversaryPolicy, IssuanceMode};
pub use submission::{EmployeeSubmission, NewEmployee, SubmissionError};
pub use tenure::{tenure_label, years_of_service};
pub use types::{Certificate, CertificateType, CertificateWithEmployee, Employee, NewCertificate};
