use crate::config::{FblConfig, FeedConfig};
use crate::envelope::RawEnvelope;
use crate::error::{ConfigError, MessageError};
use crate::evidence::EvidenceOutcome;
use crate::feed::{FeedResolver, Resolution};
use crate::filter::{DropEmptyFields, RemoveFields, ReportFilter};
use crate::incident::Incident;
use crate::report::{reconcile_dates, tokenize, Report};
use crate::validate::check_required;
use mailparse::{MailHeaderMap, ParsedMail};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Header access to the outer feedback message
pub trait OuterMessage {
    /// Returns the value of the first header with this name,
    /// compared case insensitively
    fn header(&self, name: &str) -> Option<String>;
}

impl OuterMessage for ParsedMail<'_> {
    fn header(&self, name: &str) -> Option<String> {
        self.headers.get_first_value(name)
    }
}

impl OuterMessage for BTreeMap<String, String> {
    fn header(&self, name: &str) -> Option<String> {
        self.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }
}

impl OuterMessage for HashMap<String, String> {
    fn header(&self, name: &str) -> Option<String> {
        self.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The feed is unknown or disabled
    Skipped,
    Failed,
    Succeeded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOutcome {
    pub status: Status,
    #[serde(default)]
    pub incidents: Vec<Incident>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ParseOutcome {
    pub fn skipped() -> Self {
        Self {
            status: Status::Skipped,
            incidents: vec![],
            error: None,
        }
    }

    pub fn failed(err: &MessageError) -> Self {
        Self {
            status: Status::Failed,
            incidents: vec![],
            error: Some(err.to_string()),
        }
    }

    pub fn succeeded(incidents: Vec<Incident>) -> Self {
        Self {
            status: Status::Succeeded,
            incidents,
            error: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == Status::Failed
    }
}

/// Turns ARF feedback loop messages into incidents.
///
/// The parser holds a compiled, immutable view of the configuration
/// and may be shared between threads that process different messages.
pub struct FblParser {
    config: FblConfig,
    resolver: FeedResolver,
    filters: Vec<Box<dyn ReportFilter>>,
}

impl FblParser {
    pub fn new(config: FblConfig) -> Result<Self, ConfigError> {
        let resolver = FeedResolver::new(&config.parser.aliases)?;
        Ok(Self {
            config,
            resolver,
            filters: vec![],
        })
    }

    /// Append a filter to the chain. Filters run in the order they
    /// were added, after the feed's own `filters` have been applied.
    pub fn with_filter<F: ReportFilter + 'static>(mut self, filter: F) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn config(&self) -> &FblConfig {
        &self.config
    }

    /// Process one message. `envelope` is `None` when the message
    /// did not contain an ARF report, which is not an error.
    pub fn parse<M>(&self, message: &M, envelope: Option<&RawEnvelope>) -> ParseOutcome
    where
        M: OuterMessage + ?Sized,
    {
        let Some(envelope) = envelope else {
            tracing::debug!("ARF mail not detected, nothing to do");
            return ParseOutcome::succeeded(vec![]);
        };

        let from = message.header("from").unwrap_or_default();
        let resolution = self.resolver.resolve(&from, &self.config.feeds);

        let feed = match self.config.feed(&resolution.feed_name) {
            None => {
                tracing::info!(
                    "skipping report from {}: feed {} is not configured",
                    resolution.source,
                    resolution.feed_name
                );
                return ParseOutcome::skipped();
            }
            Some(feed) if !feed.enabled => {
                tracing::info!(
                    "skipping report from {}: feed {} is disabled",
                    resolution.source,
                    resolution.feed_name
                );
                return ParseOutcome::skipped();
            }
            Some(feed) => feed,
        };

        match self.process(envelope, &resolution, feed) {
            Ok(incident) => ParseOutcome::succeeded(vec![incident]),
            Err(err) => {
                tracing::warn!("report from {} rejected: {err:#}", resolution.source);
                ParseOutcome::failed(&err)
            }
        }
    }

    fn process(
        &self,
        envelope: &RawEnvelope,
        resolution: &Resolution,
        feed: &FeedConfig,
    ) -> Result<Incident, MessageError> {
        let mut fields = tokenize(&envelope.report_text);
        reconcile_dates(&mut fields);

        let report = match EvidenceOutcome::extract(envelope.evidence_text.as_deref())? {
            EvidenceOutcome::Present { headers, body } => Report::assemble(fields, headers, body),
            EvidenceOutcome::Absent => return Err(MessageError::NotRfc822),
        };

        check_required(&report, &self.config.parser.required_fields, &feed.fields)?;

        let report = self.apply_filters(report, feed);
        Incident::build(&report, &resolution.source, feed)
    }

    fn apply_filters(&self, report: Report, feed: &FeedConfig) -> Report {
        let report = RemoveFields::new(feed.filters.iter().cloned()).transform(report);
        let report = DropEmptyFields.transform(report);
        self.filters
            .iter()
            .fold(report, |report, filter| filter.transform(report))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const CONFIG: &str = r#"
[parser]
aliases = { "^alice@" = "A", "^a.*@" = "B", "@disabled\\.example" = "Off" }

[feeds.default]
class = "SPAM"
type = "Abuse"

[feeds.B]
class = "SPAM"
type = "Info"
filters = ["Original-Rcpt-To"]

[feeds.Off]
enabled = false
class = "SPAM"
type = "Abuse"
"#;

    const REPORT: &str = "Feedback-Type: abuse\r\n\
                          User-Agent: test/1.0\r\n\
                          Version: 1\r\n\
                          Original-Rcpt-To: <victim@example.com>\r\n\
                          Arrival-Date: Mon, 01 Jan 2024 00:00:00 +0000\r\n\
                          Source-IP: 203.0.113.5\r\n";

    const EVIDENCE: &str = "From: <spammer@example.org>\nSubject: hi\n\nbuy things\n";

    fn parser() -> FblParser {
        FblParser::new(FblConfig::from_toml_str(CONFIG).unwrap()).unwrap()
    }

    fn from(addr: &str) -> BTreeMap<String, String> {
        [("From".to_string(), addr.to_string())].into_iter().collect()
    }

    #[test]
    fn not_arf_is_empty_success() {
        let outcome = parser().parse(&from("alice@example.com"), None);
        k9::assert_equal!(outcome, ParseOutcome::succeeded(vec![]));
    }

    #[test]
    fn alias_with_feed_section() {
        let envelope = RawEnvelope::new(REPORT, Some(EVIDENCE.to_string()));
        let outcome = parser().parse(&from("alice@example.com"), Some(&envelope));
        k9::assert_equal!(outcome.status, Status::Succeeded);
        k9::assert_equal!(outcome.incidents.len(), 1);

        let incident = &outcome.incidents[0];
        k9::assert_equal!(incident.source, "B");
        k9::assert_equal!(incident.kind, "Info");
        k9::assert_equal!(incident.timestamp, 1704067200);

        let info: serde_json::Value = serde_json::from_str(&incident.information).unwrap();
        k9::assert_equal!(info["Received-Date"], "Mon, 01 Jan 2024 00:00:00 +0000");
        assert!(info.get("Arrival-Date").is_none());
        assert!(info.get("Original-Rcpt-To").is_none());
        k9::assert_equal!(info["headers"]["subject"], "hi");
    }

    #[test]
    fn unmatched_sender_uses_default_feed() {
        let envelope = RawEnvelope::new(REPORT, Some(EVIDENCE.to_string()));
        let outcome = parser().parse(&from("fbl@example.net"), Some(&envelope));
        k9::assert_equal!(outcome.status, Status::Succeeded);
        k9::assert_equal!(outcome.incidents[0].source, "fbl@example.net");
        k9::assert_equal!(outcome.incidents[0].kind, "Abuse");

        let info: serde_json::Value =
            serde_json::from_str(&outcome.incidents[0].information).unwrap();
        k9::assert_equal!(info["Original-Rcpt-To"], "<victim@example.com>");
    }

    #[test]
    fn disabled_feed_is_skipped() {
        let envelope = RawEnvelope::new(REPORT, Some(EVIDENCE.to_string()));
        let outcome = parser().parse(&from("fbl@disabled.example"), Some(&envelope));
        k9::assert_equal!(outcome, ParseOutcome::skipped());

        // validity of the report does not matter
        let envelope = RawEnvelope::new("garbage", None);
        let outcome = parser().parse(&from("fbl@disabled.example"), Some(&envelope));
        k9::assert_equal!(outcome, ParseOutcome::skipped());
    }

    #[test]
    fn unknown_feed_is_skipped() {
        let config = FblConfig::from_toml_str("[feeds.Yahoo]\nclass = 'SPAM'\ntype = 'Abuse'\n")
            .unwrap();
        let parser = FblParser::new(config).unwrap();
        let envelope = RawEnvelope::new(REPORT, Some(EVIDENCE.to_string()));
        k9::assert_equal!(
            parser.parse(&from("fbl@example.net"), Some(&envelope)),
            ParseOutcome::skipped()
        );
    }

    #[test]
    fn caller_filters_run_in_order() {
        let parser = parser()
            .with_filter(|mut report: Report| {
                report.body = "first".to_string();
                report
            })
            .with_filter(|mut report: Report| {
                report.body.push_str(" second");
                report
            });
        let envelope = RawEnvelope::new(REPORT, Some(EVIDENCE.to_string()));
        let outcome = parser.parse(&from("fbl@example.net"), Some(&envelope));
        let info: serde_json::Value =
            serde_json::from_str(&outcome.incidents[0].information).unwrap();
        k9::assert_equal!(info["body"], "first second");
    }

    #[test]
    fn outcome_serialization() {
        let json = serde_json::to_value(ParseOutcome::failed(&MessageError::NotRfc822)).unwrap();
        k9::assert_equal!(
            json,
            serde_json::json!({
                "status": "failed",
                "incidents": [],
                "error": "The e-mail received at the parser is not RFC822 compliant, and therefor not a FBL message",
            })
        );
        k9::assert_equal!(
            serde_json::to_value(ParseOutcome::skipped()).unwrap(),
            serde_json::json!({"status": "skipped", "incidents": []})
        );
    }

    #[test]
    fn parser_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FblParser>();
    }
}
