//! Shared validation helpers for inbound HTTP adapters.
//!
//! Request bodies carry ids, dates, and times as plain strings so failures
//! can name the offending field (and list index) in `details`.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;

use crate::domain::{
    ClusterName, ClusterValidationError, Error, UserRole,
    UserValidationError, Username,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    InvalidDate,
    InvalidTime,
    InvalidUsername,
    InvalidRole,
    InvalidName,
}

impl ErrorCode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUuid => "invalid_uuid",
            Self::InvalidDate => "invalid_date",
            Self::InvalidTime => "invalid_time",
            Self::InvalidUsername => "invalid_username",
            Self::InvalidRole => "invalid_role",
            Self::InvalidName => "invalid_name",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    const fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, code: ErrorCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

fn value_error(
    field: FieldName,
    code: ErrorCode,
    message: impl Into<String>,
    value: &str,
) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value.trim()).map_err(|_| {
        value_error(
            field,
            ErrorCode::InvalidUuid,
            format!("{} must be a valid UUID", field.as_str()),
            value,
        )
    })
}

/// Parse a list of ids into a typed set. Duplicates collapse silently.
pub(crate) fn parse_id_set<T>(values: &[String], field: FieldName) -> Result<BTreeSet<T>, Error>
where
    T: From<Uuid> + Ord,
{
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            Uuid::parse_str(value.trim()).map(T::from).map_err(|_| {
                Error::invalid_request(format!("{} must contain valid UUIDs", field.as_str()))
                    .with_details(json!({
                        "field": field.as_str(),
                        "index": index,
                        "value": value,
                        "code": ErrorCode::InvalidUuid.as_str(),
                    }))
            })
        })
        .collect()
}

pub(crate) fn parse_optional_id_set<T>(
    values: Option<&[String]>,
    field: FieldName,
) -> Result<Option<BTreeSet<T>>, Error>
where
    T: From<Uuid> + Ord,
{
    values.map(|values| parse_id_set(values, field)).transpose()
}

/// Parse an ISO calendar date (`YYYY-MM-DD`).
pub(crate) fn parse_date(value: &str, field: FieldName) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        value_error(
            field,
            ErrorCode::InvalidDate,
            format!("{} must be a date formatted YYYY-MM-DD", field.as_str()),
            value,
        )
    })
}

/// Parse a wall-clock time, with or without seconds.
pub(crate) fn parse_time(value: &str, field: FieldName) -> Result<NaiveTime, Error> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| {
            value_error(
                field,
                ErrorCode::InvalidTime,
                format!("{} must be a time formatted HH:MM", field.as_str()),
                value,
            )
        })
}

pub(crate) fn parse_username(value: &str) -> Result<Username, Error> {
    Username::new(value).map_err(|err| map_user_validation_error(&err))
}

pub(crate) fn parse_role(value: &str, field: FieldName) -> Result<UserRole, Error> {
    value.parse::<UserRole>().map_err(|err| {
        value_error(field, ErrorCode::InvalidRole, err.to_string(), value)
    })
}

pub(crate) fn parse_cluster_name(value: &str) -> Result<ClusterName, Error> {
    ClusterName::new(value).map_err(|err| map_cluster_validation_error(&err))
}

pub(crate) fn map_user_validation_error(err: &UserValidationError) -> Error {
    match err {
        UserValidationError::UnknownRole => {
            field_error(FieldName::new("role"), ErrorCode::InvalidRole, err.to_string())
        }
        _ => field_error(
            FieldName::new("username"),
            ErrorCode::InvalidUsername,
            err.to_string(),
        ),
    }
}

pub(crate) fn map_cluster_validation_error(err: &ClusterValidationError) -> Error {
    field_error(FieldName::new("name"), ErrorCode::InvalidName, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode as DomainCode, UserId};
    use rstest::rstest;
    use serde_json::Value;

    fn detail<'a>(err: &'a Error, key: &str) -> Option<&'a Value> {
        err.details().and_then(|details| details.get(key))
    }

    #[rstest]
    fn id_sets_report_the_bad_index() {
        let values = vec![
            "3fa85f64-5717-4562-b3fc-2c963f66afa6".to_owned(),
            "nope".to_owned(),
        ];

        let err = parse_id_set::<UserId>(&values, FieldName::new("students"))
            .expect_err("second entry is invalid");

        assert_eq!(err.code(), DomainCode::InvalidRequest);
        assert_eq!(detail(&err, "index"), Some(&json!(1)));
        assert_eq!(detail(&err, "field"), Some(&json!("students")));
    }

    #[rstest]
    fn id_sets_collapse_duplicates() {
        let id = "3fa85f64-5717-4562-b3fc-2c963f66afa6".to_owned();
        let ids = parse_id_set::<UserId>(&[id.clone(), id], FieldName::new("students"))
            .expect("valid ids");
        assert_eq!(ids.len(), 1);
    }

    #[rstest]
    #[case("09:30", 9, 30)]
    #[case("14:05:00", 14, 5)]
    fn times_accept_optional_seconds(#[case] raw: &str, #[case] hour: u32, #[case] minute: u32) {
        let time = parse_time(raw, FieldName::new("start")).expect("valid time");
        assert_eq!(time, NaiveTime::from_hms_opt(hour, minute, 0).expect("time"));
    }

    #[rstest]
    #[case("25:00")]
    #[case("noon")]
    fn bad_times_are_rejected(#[case] raw: &str) {
        let err = parse_time(raw, FieldName::new("start")).expect_err("invalid time");
        assert_eq!(detail(&err, "code"), Some(&json!("invalid_time")));
    }

    #[rstest]
    fn dates_must_be_iso() {
        let err = parse_date("04/03/2024", FieldName::new("date")).expect_err("not ISO");
        assert_eq!(detail(&err, "code"), Some(&json!("invalid_date")));
        assert!(parse_date("2024-03-04", FieldName::new("date")).is_ok());
    }

    #[rstest]
    fn username_errors_name_the_field() {
        let err = parse_username("x").expect_err("too short");
        assert_eq!(detail(&err, "field"), Some(&json!("username")));
        assert_eq!(detail(&err, "code"), Some(&json!("invalid_username")));
    }
}
