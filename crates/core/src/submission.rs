use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while turning a raw employee submission into a [`NewEmployee`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("join_date must be a calendar date formatted as YYYY-MM-DD (got '{0}')")]
    InvalidJoinDate(String),
}

/// Loosely typed employee form as received from a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub join_date: String,
}

/// Validated employee record ready to be handed to the store.
///
/// Every text field is trimmed and non-empty; `join_date` is a real calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    name: String,
    email: String,
    position: String,
    department: String,
    join_date: NaiveDate,
}

impl NewEmployee {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn join_date(&self) -> NaiveDate {
        self.join_date
    }
}

impl TryFrom<EmployeeSubmission> for NewEmployee {
    type Error = SubmissionError;

    fn try_from(value: EmployeeSubmission) -> Result<Self, Self::Error> {
        let name = required("name", value.name)?;
        let email = required("email", value.email)?;
        let position = required("position", value.position)?;
        let department = required("department", value.department)?;
        let raw_date = required("join_date", value.join_date)?;
        let join_date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d")
            .map_err(|_| SubmissionError::InvalidJoinDate(raw_date.clone()))?;

        Ok(Self {
            name,
            email,
            position,
            department,
            join_date,
        })
    }
}

fn required(field: &'static str, value: String) -> Result<String, SubmissionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SubmissionError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> EmployeeSubmission {
        EmployeeSubmission {
            name: "  Grace Hopper ".into(),
            email: "grace@example.com".into(),
            position: "Rear Admiral".into(),
            department: "Navy".into(),
            join_date: "2021-06-01".into(),
        }
    }

    #[test]
    fn accepts_complete_submission_and_trims_fields() {
        let employee = NewEmployee::try_from(submission()).expect("valid submission");
        assert_eq!(employee.name(), "Grace Hopper");
        assert_eq!(employee.email(), "grace@example.com");
        assert_eq!(
            employee.join_date(),
            NaiveDate::from_ymd_opt(2021, 6, 1).unwrap()
        );
    }

    #[test]
    fn rejects_blank_fields() {
        let mut input = submission();
        input.department = "   ".into();
        assert_eq!(
            NewEmployee::try_from(input),
            Err(SubmissionError::MissingField("department"))
        );

        let mut input = submission();
        input.join_date = String::new();
        assert_eq!(
            NewEmployee::try_from(input),
            Err(SubmissionError::MissingField("join_date"))
        );
    }

    #[test]
    fn rejects_impossible_dates() {
        let mut input = submission();
        input.join_date = "2023-02-29".into();
        assert_eq!(
            NewEmployee::try_from(input),
            Err(SubmissionError::InvalidJoinDate("2023-02-29".into()))
        );

        let mut input = submission();
        input.join_date = "06/01/2021".into();
        assert!(matches!(
            NewEmployee::try_from(input),
            Err(SubmissionError::InvalidJoinDate(_))
        ));
    }

    #[test]
    fn missing_json_fields_surface_as_missing() {
        let input: EmployeeSubmission =
            serde_json::from_str(r#"{"name":"Ada","email":"ada@example.com"}"#).expect("json");
        assert_eq!(
            NewEmployee::try_from(input),
            Err(SubmissionError::MissingField("position"))
        );
    }
}
