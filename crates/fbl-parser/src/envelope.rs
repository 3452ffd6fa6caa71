//! ARF envelope detection
use crate::error::MessageError;
use mailparse::{parse_mail, ParsedMail};
use serde::{Deserialize, Serialize};

const FEEDBACK_REPORT: &str = "message/feedback-report";
const EVIDENCE_TYPES: &[&str] = &["message/rfc822", "text/rfc822-headers"];

/// The parts of an ARF message that the parser consumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEnvelope {
    /// The body of the message/feedback-report part
    pub report_text: String,
    /// The embedded copy of the reported message, if there was one
    #[serde(default)]
    pub evidence_text: Option<String>,
}

impl RawEnvelope {
    pub fn new<S: Into<String>>(report_text: S, evidence_text: Option<String>) -> Self {
        Self {
            report_text: report_text.into(),
            evidence_text,
        }
    }

    /// Locate the report and evidence parts of a complete feedback
    /// message.
    ///
    /// Returns `Ok(None)` when the message is not a
    /// `multipart/report; report-type=feedback-report`, and
    /// [`MessageError::MalformedEnvelope`] when it claims to be one but
    /// cannot be read or has no machine readable part.
    pub fn from_mail(input: &[u8]) -> Result<Option<Self>, MessageError> {
        let mail = parse_mail(input).map_err(malformed)?;
        if !is_feedback_report(&mail) {
            return Ok(None);
        }

        let report = mail
            .subparts
            .iter()
            .find(|part| part.ctype.mimetype == FEEDBACK_REPORT)
            .ok_or_else(|| {
                MessageError::MalformedEnvelope(format!("no {FEEDBACK_REPORT} part"))
            })?;
        let report_text = report.get_body().map_err(malformed)?;

        // When several parts qualify the last one is used
        let evidence_text = match mail
            .subparts
            .iter()
            .rev()
            .find(|part| EVIDENCE_TYPES.contains(&part.ctype.mimetype.as_str()))
        {
            Some(part) => Some(embedded_text(part)?),
            None => None,
        };

        Ok(Some(Self {
            report_text,
            evidence_text,
        }))
    }
}

fn is_feedback_report(mail: &ParsedMail) -> bool {
    mail.ctype.mimetype == "multipart/report"
        && mail
            .ctype
            .params
            .get("report-type")
            .is_some_and(|t| t.eq_ignore_ascii_case("feedback-report"))
}

/// The embedded message, transfer-decoded but otherwise untouched,
/// with line endings normalized to `\n`
fn embedded_text(part: &ParsedMail) -> Result<String, MessageError> {
    let raw = part.get_body_raw().map_err(malformed)?;
    Ok(String::from_utf8_lossy(&raw).replace("\r\n", "\n"))
}

fn malformed(err: mailparse::MailParseError) -> MessageError {
    MessageError::MalformedEnvelope(format!("{err:#}"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn feedback_report() {
        let envelope = RawEnvelope::from_mail(include_bytes!("../data/arf-yahoo.eml"))
            .unwrap()
            .unwrap();
        assert!(envelope.report_text.contains("Feedback-Type: abuse"));
        assert!(envelope.report_text.contains("Source-IP: 203.0.113.5"));
        let evidence = envelope.evidence_text.unwrap();
        assert!(evidence.starts_with("Received: from mta.example.org"), "{evidence}");
        assert!(evidence.contains("\n\nHello, buy our stuff"), "{evidence}");
    }

    #[test]
    fn headers_only_evidence() {
        let envelope = RawEnvelope::from_mail(include_bytes!("../data/arf-headers-only.eml"))
            .unwrap()
            .unwrap();
        assert!(envelope.report_text.contains("Arrival-Date:"));
        let evidence = envelope.evidence_text.unwrap();
        assert!(evidence.starts_with("From: <spammer@example.org>"), "{evidence}");
    }

    #[test]
    fn not_arf() {
        k9::assert_equal!(
            RawEnvelope::from_mail(include_bytes!("../data/evidence-plain.eml")).unwrap(),
            None
        );
        k9::assert_equal!(
            RawEnvelope::from_mail(include_bytes!("../data/delivery-status.eml")).unwrap(),
            None
        );
    }

    #[test]
    fn missing_report_part() {
        k9::assert_equal!(
            RawEnvelope::from_mail(include_bytes!("../data/arf-no-report.eml")),
            Err(MessageError::MalformedEnvelope(
                "no message/feedback-report part".to_string()
            ))
        );
    }
}
