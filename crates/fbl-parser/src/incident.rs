use crate::config::FeedConfig;
use crate::error::MessageError;
use crate::field::ArfField;
use crate::report::Report;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single reported abuse event, ready to be handed to whatever
/// persists incidents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    /// The resolved feed alias, or the sender address
    pub source: String,
    #[serde(with = "false_if_none", default)]
    pub source_id: Option<String>,
    pub ip: String,
    #[serde(with = "false_if_none", default)]
    pub domain: Option<String>,
    pub class: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Seconds since the unix epoch
    pub timestamp: i64,
    /// The normalized report as a JSON document
    pub information: String,
}

impl Incident {
    pub fn build(report: &Report, source: &str, feed: &FeedConfig) -> Result<Self, MessageError> {
        let ip = report
            .get(ArfField::SourceIp)
            .filter(|ip| !ip.is_empty())
            .ok_or_else(|| MessageError::MissingFields(vec![ArfField::SourceIp]))?;
        let received = report
            .get(ArfField::ReceivedDate)
            .filter(|date| !date.is_empty())
            .ok_or_else(|| MessageError::MissingFields(vec![ArfField::ReceivedDate]))?;

        let timestamp = parse_date_time(received)?.timestamp();
        let information = report
            .to_json()
            .map_err(|err| MessageError::Serialize(format!("{err:#}")))?;

        Ok(Self {
            source: source.to_string(),
            source_id: None,
            ip: ip.to_string(),
            domain: None,
            class: feed.class.clone(),
            kind: feed.kind.clone(),
            timestamp,
            information,
        })
    }
}

/// Parses an RFC 5322 date-time, as used by the Arrival-Date and
/// Received-Date report fields. A trailing comment such as `(UTC)`
/// is ignored.
pub fn parse_date_time(value: &str) -> Result<DateTime<Utc>, MessageError> {
    let mut input = value.trim();
    if input.ends_with(')') {
        if let Some(idx) = input.rfind('(') {
            input = input[..idx].trim_end();
        }
    }

    DateTime::parse_from_rfc2822(input)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|err| MessageError::InvalidTimestamp {
            value: value.to_string(),
            reason: format!("{err:#}"),
        })
}

/// The incident record uses `false` rather than null for
/// references that this parser never fills in
mod false_if_none {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, ser: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => ser.serialize_str(value),
            None => ser.serialize_bool(false),
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Flag(bool),
        Value(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
        match Option::<Wire>::deserialize(de)? {
            Some(Wire::Value(value)) => Ok(Some(value)),
            Some(Wire::Flag(true)) => Err(D::Error::custom("expected false or a string")),
            Some(Wire::Flag(false)) | None => Ok(None),
        }
    }
}
