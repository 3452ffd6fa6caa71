//! The embedded copy of the reported message
use crate::error::MessageError;
use mailparse::{parse_mail, MailHeader, ParsedMail};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// A header from the evidence message. Headers that occur more
/// than once keep every value in the order they appeared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Single(String),
    Multiple(Vec<String>),
}

impl HeaderValue {
    fn push(&mut self, value: String) {
        match self {
            Self::Single(first) => {
                let first = std::mem::take(first);
                *self = Self::Multiple(vec![first, value]);
            }
            Self::Multiple(values) => values.push(value),
        }
    }

    /// The first value of the header
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Multiple(values) => values.first().map(|s| s.as_str()),
        }
    }
}

/// Evidence header names are lowercased
pub type EvidenceHeaders = BTreeMap<String, HeaderValue>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvidenceOutcome {
    Present {
        headers: EvidenceHeaders,
        body: String,
    },
    Absent,
}

impl EvidenceOutcome {
    pub fn extract(evidence: Option<&str>) -> Result<Self, MessageError> {
        let text = match evidence {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Ok(Self::Absent),
        };

        let mail =
            parse_mail(text.as_bytes()).map_err(|err| MessageError::Evidence(format!("{err:#}")))?;

        let headers = collect_headers(&mail.headers);
        let body = message_body(&mail)?;

        Ok(Self::Present { headers, body })
    }
}

fn collect_headers(headers: &[MailHeader]) -> EvidenceHeaders {
    let mut result = EvidenceHeaders::new();
    for hdr in headers {
        let name = hdr.get_key_ref().to_ascii_lowercase();
        let value = hdr.get_value();
        match result.entry(name) {
            Entry::Vacant(entry) => {
                entry.insert(HeaderValue::Single(value));
            }
            Entry::Occupied(mut entry) => entry.get_mut().push(value),
        }
    }
    result
}

/// Returns the text of the message. For a multipart message this
/// is the first text/plain part, or an empty string if it has none.
fn message_body(mail: &ParsedMail) -> Result<String, MessageError> {
    if mail.subparts.is_empty() {
        return mail
            .get_body()
            .map_err(|err| MessageError::Evidence(format!("{err:#}")));
    }

    match first_text_part(mail) {
        Some(part) => part
            .get_body()
            .map_err(|err| MessageError::Evidence(format!("{err:#}"))),
        None => Ok(String::new()),
    }
}

fn first_text_part<'a, 'b>(mail: &'b ParsedMail<'a>) -> Option<&'b ParsedMail<'a>> {
    if mail.subparts.is_empty() {
        return (mail.ctype.mimetype == "text/plain").then_some(mail);
    }
    mail.subparts.iter().find_map(first_text_part)
}
