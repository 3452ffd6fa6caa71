use crate::error::MessageError;
use crate::field::ArfField;
use crate::report::Report;

/// Returns the required fields that are absent or empty, in the
/// order they were listed, without duplicates.
pub fn missing_fields<'a, I>(report: &Report, required: I) -> Vec<ArfField>
where
    I: IntoIterator<Item = &'a ArfField>,
{
    let mut missing: Vec<ArfField> = vec![];
    for &field in required {
        if !report.has(field) && !missing.contains(&field) {
            missing.push(field);
        }
    }
    missing
}

/// Checks the global required fields followed by any that are
/// specific to the feed
pub fn check_required(
    report: &Report,
    required: &[ArfField],
    feed_required: &[ArfField],
) -> Result<(), MessageError> {
    let missing = missing_fields(report, required.iter().chain(feed_required));
    if missing.is_empty() {
        Ok(())
    } else {
        Err(MessageError::MissingFields(missing))
    }
}
