//! Tokenizing and normalizing the machine readable report block
use crate::evidence::EvidenceHeaders;
use crate::field::ArfField;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Raw `Name: value` pairs from the report block. Names are case sensitive.
pub type ReportFields = BTreeMap<String, String>;

static FIELD_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([A-Za-z0-9_-]+): (.*?)[ ]*$").unwrap());

/// Splits the report block into fields. Lines that are not of the
/// form `Name: value` are ignored, and a repeated name keeps the
/// value of its last occurrence.
pub fn tokenize(report_text: &str) -> ReportFields {
    let text = report_text.replace('\r', "");
    let mut fields = ReportFields::new();
    for caps in FIELD_LINE.captures_iter(&text) {
        fields.insert(caps[1].to_string(), caps[2].to_string());
    }
    tracing::trace!("tokenized {} report fields", fields.len());
    fields
}

/// Falls back to Arrival-Date when the report has no usable Received-Date
pub fn reconcile_dates(fields: &mut ReportFields) {
    let received = ArfField::ReceivedDate.as_ref();
    let arrival = ArfField::ArrivalDate.as_ref();

    if fields.get(received).is_some_and(|v| !v.is_empty()) {
        return;
    }
    if let Some(date) = fields.get(arrival).filter(|v| !v.is_empty()).cloned() {
        fields.remove(arrival);
        fields.insert(received.to_string(), date);
    }
}

/// A normalized report: the tokenized fields merged with the
/// headers and body of the evidence message.
///
/// It serializes as a single flat JSON object in which `headers`
/// and `body` sit next to the report fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    #[serde(flatten)]
    pub fields: ReportFields,
    pub headers: EvidenceHeaders,
    pub body: String,
}

impl Report {
    pub const HEADERS: &'static str = "headers";
    pub const BODY: &'static str = "body";

    /// Merge evidence into the fields. The evidence takes precedence
    /// over report fields that happen to be named `headers` or `body`.
    pub fn assemble(mut fields: ReportFields, headers: EvidenceHeaders, body: String) -> Self {
        fields.remove(Self::HEADERS);
        fields.remove(Self::BODY);
        Self {
            fields,
            headers,
            body,
        }
    }

    pub fn get(&self, field: ArfField) -> Option<&str> {
        self.fields.get(field.as_ref()).map(|s| s.as_str())
    }

    /// True if the field is present with a non-empty value
    pub fn has(&self, field: ArfField) -> bool {
        self.get(field).is_some_and(|v| !v.is_empty())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
