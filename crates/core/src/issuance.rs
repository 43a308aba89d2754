use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::tenure::years_of_service;
use crate::types::{Employee, NewCertificate};

/// Which anniversaries a reconciliation run is allowed to certify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuanceMode {
    /// Only the anniversary matching the employee's current completed years.
    #[default]
    CurrentYearOnly,
    /// Every completed year from 1 up to the current one that lacks a certificate.
    Backfill,
}

impl IssuanceMode {
    pub fn from_backfill_flag(backfill: bool) -> Self {
        if backfill {
            Self::Backfill
        } else {
            Self::CurrentYearOnly
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CurrentYearOnly => "current_year_only",
            Self::Backfill => "backfill",
        }
    }
}

/// Decides which certificates an employee is owed on a given day.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnniversaryPolicy {
    mode: IssuanceMode,
}

impl AnniversaryPolicy {
    pub fn new(mode: IssuanceMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> IssuanceMode {
        self.mode
    }

    /// Returns the service years to certify, ascending, given the years already certified.
    pub fn years_to_issue(&self, completed_years: u32, issued: &BTreeSet<u32>) -> Vec<u32> {
        if completed_years == 0 {
            return Vec::new();
        }

        match self.mode {
            IssuanceMode::CurrentYearOnly => {
                if issued.contains(&completed_years) {
                    Vec::new()
                } else {
                    vec![completed_years]
                }
            }
            IssuanceMode::Backfill => (1..=completed_years)
                .filter(|year| !issued.contains(year))
                .collect(),
        }
    }

    /// Stages the certificates owed to `employee` as of `today`.
    pub fn stage(
        &self,
        employee: &Employee,
        today: NaiveDate,
        issued: &BTreeSet<u32>,
    ) -> Vec<NewCertificate> {
        let completed = years_of_service(employee.join_date, today);
        self.years_to_issue(completed, issued)
            .into_iter()
            .map(|year| NewCertificate::work_anniversary(employee.id.clone(), today, year))
            .collect()
    }
}

/// Recognition line printed on a work anniversary certificate.
pub fn citation(year_of_service: u32) -> String {
    let unit = if year_of_service == 1 { "year" } else { "years" };
    format!(
        "In recognition of {year_of_service} {unit} of dedicated service and outstanding commitment to excellence."
    )
}
