//! Search filters and their translation into typed predicates.
//!
//! A [`SearchFilter`] is what the caller asks for; a [`SearchQuery`] is the
//! validated, store-independent form of it. Every predicate renders to a
//! fixed SQL fragment with a single `?` placeholder, so filter values only
//! ever reach a store as bound parameters.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::events::EnrichedEvent;
use crate::limits::MAX_SEARCH_LIMIT;

/// Calendar date format accepted for `start_date` / `end_date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Caller-supplied search parameters.
///
/// Absent and empty fields both mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    /// Substring to look for anywhere in the message
    #[serde(default)]
    pub message: Option<String>,
    /// Inclusive lower bound, `YYYY-MM-DD`
    #[serde(default)]
    pub start_date: Option<String>,
    /// Inclusive calendar day, `YYYY-MM-DD`
    #[serde(default)]
    pub end_date: Option<String>,
    /// Maximum number of rows to return
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub limit: Option<u32>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn start_date(mut self, date: impl Into<String>) -> Self {
        self.start_date = Some(date.into());
        self
    }

    pub fn end_date(mut self, date: impl Into<String>) -> Self {
        self.end_date = Some(date.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A bound query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    Text(String),
    /// Milliseconds since the Unix epoch (UTC).
    Millis(i64),
    UInt(u32),
}

/// One conjunct of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    SourceEquals(String),
    SeverityEquals(String),
    MessageContains(String),
    /// `timestamp >= bound`
    TimestampFrom(DateTime<Utc>),
    /// `timestamp < bound`
    TimestampBefore(DateTime<Utc>),
}

impl Predicate {
    /// SQL fragment with exactly one `?` placeholder.
    pub fn clause(&self) -> &'static str {
        match self {
            Self::SourceEquals(_) => "source = ?",
            Self::SeverityEquals(_) => "severity = ?",
            Self::MessageContains(_) => "position(message, ?) > 0",
            Self::TimestampFrom(_) => "timestamp >= fromUnixTimestamp64Milli(toInt64(?))",
            Self::TimestampBefore(_) => "timestamp < fromUnixTimestamp64Milli(toInt64(?))",
        }
    }

    /// Value bound to this predicate's placeholder.
    pub fn param(&self) -> QueryParam {
        match self {
            Self::SourceEquals(v) | Self::SeverityEquals(v) | Self::MessageContains(v) => {
                QueryParam::Text(v.clone())
            }
            Self::TimestampFrom(t) | Self::TimestampBefore(t) => {
                QueryParam::Millis(t.timestamp_millis())
            }
        }
    }

    /// Evaluates the predicate against an in-memory event.
    pub fn matches(&self, event: &EnrichedEvent) -> bool {
        match self {
            Self::SourceEquals(v) => event.source == *v,
            Self::SeverityEquals(v) => event.severity == *v,
            Self::MessageContains(v) => event.message.contains(v.as_str()),
            Self::TimestampFrom(t) => event.timestamp >= *t,
            Self::TimestampBefore(t) => event.timestamp < *t,
        }
    }
}

/// Validated search, ready to hand to a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub predicates: Vec<Predicate>,
    pub limit: Option<u32>,
}

impl SearchQuery {
    /// Validates a filter and folds it into predicates.
    ///
    /// Both dates are parsed up front; any failure is returned before a
    /// store is touched.
    pub fn from_filter(filter: &SearchFilter) -> Result<Self> {
        let mut predicates = Vec::new();

        if let Some(source) = non_empty(&filter.source) {
            predicates.push(Predicate::SourceEquals(source.to_string()));
        }
        if let Some(severity) = non_empty(&filter.severity) {
            predicates.push(Predicate::SeverityEquals(severity.to_string()));
        }
        if let Some(message) = non_empty(&filter.message) {
            predicates.push(Predicate::MessageContains(message.to_string()));
        }

        let start = non_empty(&filter.start_date)
            .map(|s| parse_date("start_date", s))
            .transpose()?;
        let end = non_empty(&filter.end_date)
            .map(|s| parse_date("end_date", s))
            .transpose()?;

        if let Some(start) = start {
            predicates.push(Predicate::TimestampFrom(start_of_day(start)));
        }
        if let Some(end) = end {
            // The whole end day is included: bound is the next midnight, exclusive.
            let next = end.checked_add_days(Days::new(1)).ok_or_else(|| {
                Error::invalid_filter(format!("end_date {} is out of range", end))
            })?;
            predicates.push(Predicate::TimestampBefore(start_of_day(next)));
        }

        if let Some(limit) = filter.limit {
            if limit == 0 || limit > MAX_SEARCH_LIMIT {
                return Err(Error::invalid_filter(format!(
                    "limit must be between 1 and {}",
                    MAX_SEARCH_LIMIT
                )));
            }
        }

        Ok(Self {
            predicates,
            limit: filter.limit,
        })
    }

    /// Conjunction of all predicates, starting from a match-all clause.
    pub fn where_clause(&self) -> String {
        let mut clause = String::from("1 = 1");
        for predicate in &self.predicates {
            clause.push_str(" AND ");
            clause.push_str(predicate.clause());
        }
        clause
    }

    /// Parameters in placeholder order (predicates, then limit).
    pub fn params(&self) -> Vec<QueryParam> {
        let mut params: Vec<QueryParam> = self.predicates.iter().map(Predicate::param).collect();
        if let Some(limit) = self.limit {
            params.push(QueryParam::UInt(limit));
        }
        params
    }

    pub fn matches(&self, event: &EnrichedEvent) -> bool {
        self.predicates.iter().all(|p| p.matches(event))
    }

    /// Applies the query to in-memory events with store ordering:
    /// `processed_at` descending, then `id` descending.
    pub fn apply<'a, I>(&self, events: I) -> Vec<EnrichedEvent>
    where
        I: IntoIterator<Item = &'a EnrichedEvent>,
    {
        let mut matched: Vec<EnrichedEvent> =
            events.into_iter().filter(|e| self.matches(e)).cloned().collect();
        sort_newest_first(&mut matched);
        if let Some(limit) = self.limit {
            matched.truncate(limit as usize);
        }
        matched
    }
}

/// Sorts by `processed_at` descending, ties broken by `id` descending.
pub fn sort_newest_first(events: &mut [EnrichedEvent]) {
    events.sort_by(|a, b| {
        b.processed_at
            .cmp(&a.processed_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Query strings carry `limit=` for an unset limit.
fn empty_string_as_none<'de, D, T>(de: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => T::from_str(s).map_err(de::Error::custom).map(Some),
    }
}

/// Zero-padded `YYYY-MM-DD` and nothing else; chrono alone also takes
/// `2025-1-5`, signed years and leading whitespace.
fn is_calendar_date_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    if !is_calendar_date_shape(value) {
        return Err(Error::invalid_filter(format!(
            "invalid {} format {:?}, expected YYYY-MM-DD",
            field, value
        )));
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        Error::invalid_filter(format!(
            "invalid {} format {:?}, expected YYYY-MM-DD: {}",
            field, value, e
        ))
    })
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
