//! The field names that may appear in the machine readable part
//! of an ARF report (RFC 5965 and the RFC 6591 auth-failure extension).
use serde_with::{DeserializeFromStr, SerializeDisplay};

#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Ord,
    PartialOrd,
    strum::EnumString,
    strum::Display,
    strum::AsRefStr,
    strum::EnumIter,
    SerializeDisplay,
    DeserializeFromStr,
)]
pub enum ArfField {
    #[strum(to_string = "Feedback-Type")]
    FeedbackType,
    #[strum(to_string = "User-Agent")]
    UserAgent,
    #[strum(to_string = "Version")]
    Version,
    #[strum(to_string = "Arrival-Date")]
    ArrivalDate,
    /// Not part of RFC 5965, but emitted by several large
    /// mailbox providers in place of Arrival-Date
    #[strum(to_string = "Received-Date")]
    ReceivedDate,
    #[strum(to_string = "Source-IP")]
    SourceIp,
    #[strum(to_string = "Source-Port")]
    SourcePort,
    #[strum(to_string = "Original-Mail-From")]
    OriginalMailFrom,
    #[strum(to_string = "Original-Rcpt-To")]
    OriginalRcptTo,
    #[strum(to_string = "Original-Envelope-Id")]
    OriginalEnvelopeId,
    #[strum(to_string = "Reporting-MTA")]
    ReportingMta,
    #[strum(to_string = "Reported-Domain")]
    ReportedDomain,
    #[strum(to_string = "Reported-URI")]
    ReportedUri,
    #[strum(to_string = "Authentication-Results")]
    AuthenticationResults,
    #[strum(to_string = "Incidents")]
    Incidents,
    #[strum(to_string = "Removal-Recipient")]
    RemovalRecipient,
    #[strum(to_string = "Auth-Failure")]
    AuthFailure,
    #[strum(to_string = "Delivery-Result")]
    DeliveryResult,
    #[strum(to_string = "Identity-Alignment")]
    IdentityAlignment,
}
