//! Extracts abuse incidents from ARF (RFC 5965) feedback loop messages.
//!
//! A message passes through these stages:
//!
//! * the sender of the outer message is resolved to a feed via the
//!   configured alias rules ([`feed`]); unknown or disabled feeds are skipped
//! * the machine readable report block is tokenized into fields and
//!   the dates are reconciled ([`report`])
//! * the embedded evidence message is parsed and merged ([`evidence`])
//! * required fields are checked ([`validate`]), filters are applied
//!   ([`filter`]) and a single [`Incident`] is built ([`incident`])
//!
//! [`FblParser`] sequences all of this and reports the result as a
//! [`ParseOutcome`].
pub mod config;
pub mod envelope;
pub mod error;
pub mod evidence;
pub mod feed;
pub mod field;
pub mod filter;
pub mod incident;
pub mod parser;
pub mod report;
pub mod validate;

pub use config::{FblConfig, FeedConfig, ParserSection, DEFAULT_FEED};
pub use envelope::RawEnvelope;
pub use error::{ConfigError, MessageError};
pub use evidence::{EvidenceHeaders, EvidenceOutcome, HeaderValue};
pub use feed::{FeedResolver, Resolution};
pub use field::ArfField;
pub use filter::{DropEmptyFields, RemoveFields, ReportFilter};
pub use incident::Incident;
pub use parser::{FblParser, OuterMessage, ParseOutcome, Status};
pub use report::{Report, ReportFields};
