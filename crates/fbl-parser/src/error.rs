use crate::field::ArfField;
use thiserror::Error;

/// Problems with the configuration snapshot. These are detected
/// when the parser is constructed and are never produced while
/// processing an individual message.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid alias pattern {pattern:?}: {reason}")]
    InvalidAliasPattern { pattern: String, reason: String },
    #[error("reading file: {file_name}: {reason}")]
    Io { file_name: String, reason: String },
    #[error("decoding {file_name} as FblConfig: {reason}")]
    Decode { file_name: String, reason: String },
    #[error("{0}: configuration files must have either .toml or .json filename extension")]
    UnsupportedExtension(String),
}

/// Reasons for dropping a single feedback message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error(
        "The e-mail received at the parser is not RFC822 compliant, and therefor not a FBL message"
    )]
    NotRfc822,
    #[error("malformed feedback report: {0}")]
    MalformedEnvelope(String),
    #[error("failed to parse the embedded evidence message: {0}")]
    Evidence(String),
    #[error("required fields are missing from the report: {}", join_fields(.0))]
    MissingFields(Vec<ArfField>),
    #[error("Received-Date {value:?} is not a valid date-time: {reason}")]
    InvalidTimestamp { value: String, reason: String },
    #[error("serializing incident information: {0}")]
    Serialize(String),
}

fn join_fields(fields: &[ArfField]) -> String {
    fields
        .iter()
        .map(|f| f.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}
