//! Class sessions: a scheduled time slot linking clusters, teachers, and
//! students.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::Error;
use super::ids::{ClassSessionId, ClusterId, UserId};

/// Validation errors for session details.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassSessionValidationError {
    #[error("session kind must not be empty")]
    EmptyKind,
    #[error("session must start before it ends (start {start}, end {end})")]
    InvalidTimeRange { start: NaiveTime, end: NaiveTime },
}

impl ClassSessionValidationError {
    /// Request field blamed for the failure. An inverted range points at
    /// `end`.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyKind => "kind",
            Self::InvalidTimeRange { .. } => "end",
        }
    }
}

impl From<ClassSessionValidationError> for Error {
    fn from(err: ClassSessionValidationError) -> Self {
        Self::invalid_request(err.to_string()).with_details(json!({
            "field": err.field(),
            "code": "invalid_session",
        }))
    }
}

/// Calendar slot of a session.
///
/// ## Invariants
/// - `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScheduleDto", into = "ScheduleDto")]
pub struct SessionSchedule {
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
}

impl SessionSchedule {
    /// Validate and construct a schedule.
    ///
    /// # Examples
    /// ```
    /// use chrono::{NaiveDate, NaiveTime};
    /// use roster::domain::SessionSchedule;
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 3, 4).expect("date");
    /// let nine = NaiveTime::from_hms_opt(9, 0, 0).expect("time");
    /// let ten = NaiveTime::from_hms_opt(10, 0, 0).expect("time");
    /// assert!(SessionSchedule::new(date, nine, ten).is_ok());
    /// assert!(SessionSchedule::new(date, ten, nine).is_err());
    /// ```
    pub fn new(
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Self, ClassSessionValidationError> {
        if start >= end {
            return Err(ClassSessionValidationError::InvalidTimeRange { start, end });
        }
        Ok(Self { date, start, end })
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub fn start(&self) -> NaiveTime {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> NaiveTime {
        self.end
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ScheduleDto {
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
}

impl From<SessionSchedule> for ScheduleDto {
    fn from(value: SessionSchedule) -> Self {
        Self {
            date: value.date,
            start: value.start,
            end: value.end,
        }
    }
}

impl TryFrom<ScheduleDto> for SessionSchedule {
    type Error = ClassSessionValidationError;

    fn try_from(value: ScheduleDto) -> Result<Self, Self::Error> {
        Self::new(value.date, value.start, value.end)
    }
}

/// Descriptive attributes of a session, independent of its memberships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSessionDetails {
    kind: String,
    classroom: String,
    #[serde(flatten)]
    schedule: SessionSchedule,
}

impl ClassSessionDetails {
    /// Validate and construct session details. `kind` is trimmed and must
    /// be non-empty; `classroom` may be blank.
    pub fn new(
        kind: impl Into<String>,
        classroom: impl Into<String>,
        schedule: SessionSchedule,
    ) -> Result<Self, ClassSessionValidationError> {
        let kind = kind.into();
        let kind = kind.trim();
        if kind.is_empty() {
            return Err(ClassSessionValidationError::EmptyKind);
        }
        Ok(Self {
            kind: kind.to_owned(),
            classroom: classroom.into().trim().to_owned(),
            schedule,
        })
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        self.kind.as_str()
    }

    #[must_use]
    pub fn classroom(&self) -> &str {
        self.classroom.as_str()
    }

    #[must_use]
    pub fn schedule(&self) -> SessionSchedule {
        self.schedule
    }
}

/// Partial update of [`ClassSessionDetails`]. `None` fields keep their
/// current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassSessionDetailsPatch {
    pub kind: Option<String>,
    pub classroom: Option<String>,
    pub date: Option<NaiveDate>,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
}

impl ClassSessionDetailsPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.classroom.is_none()
            && self.date.is_none()
            && self.start.is_none()
            && self.end.is_none()
    }

    /// Merge the patch over `current`, validating the result as a whole so
    /// a new start time is checked against the existing end time.
    pub fn apply_to(
        &self,
        current: &ClassSessionDetails,
    ) -> Result<ClassSessionDetails, ClassSessionValidationError> {
        let schedule = current.schedule();
        let schedule = SessionSchedule::new(
            self.date.unwrap_or(schedule.date()),
            self.start.unwrap_or(schedule.start()),
            self.end.unwrap_or(schedule.end()),
        )?;
        ClassSessionDetails::new(
            self.kind.as_deref().unwrap_or(current.kind()),
            self.classroom.as_deref().unwrap_or(current.classroom()),
            schedule,
        )
    }
}

/// Class session document.
///
/// ## Invariants
/// - `classcodes` equals the set of clusters whose `in_class` contains `id`.
/// - `teachers ∪ students` equals the set of users whose `in_class`
///   contains `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSession {
    pub id: ClassSessionId,
    #[serde(flatten)]
    pub details: ClassSessionDetails,
    pub classcodes: BTreeSet<ClusterId>,
    pub teachers: BTreeSet<UserId>,
    pub students: BTreeSet<UserId>,
}

impl ClassSession {
    /// Build a session with no memberships.
    #[must_use]
    pub fn new(id: ClassSessionId, details: ClassSessionDetails) -> Self {
        Self {
            id,
            details,
            classcodes: BTreeSet::new(),
            teachers: BTreeSet::new(),
            students: BTreeSet::new(),
        }
    }

    /// Everyone attending the session, teachers and students alike.
    #[must_use]
    pub fn attendees(&self) -> BTreeSet<UserId> {
        self.teachers.union(&self.students).copied().collect()
    }

    /// A session no cluster is assigned to, typically because its clusters
    /// were deleted.
    #[must_use]
    pub fn is_unassigned(&self) -> bool {
        self.classcodes.is_empty()
    }
}

/// Conjunctive filter for session scans. The default matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionFilter {
    pub date: Option<NaiveDate>,
    pub cluster: Option<ClusterId>,
    pub attendee: Option<UserId>,
}

impl SessionFilter {
    #[must_use]
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn for_cluster(cluster: ClusterId) -> Self {
        Self {
            cluster: Some(cluster),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn for_attendee(user: UserId) -> Self {
        Self {
            attendee: Some(user),
            ..Self::default()
        }
    }

    /// Whether `session` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, session: &ClassSession) -> bool {
        self.date
            .is_none_or(|date| session.details.schedule().date() == date)
            && self
                .cluster
                .is_none_or(|cluster| session.classcodes.contains(&cluster))
            && self.attendee.is_none_or(|user| {
                session.teachers.contains(&user) || session.students.contains(&user)
            })
    }
}
