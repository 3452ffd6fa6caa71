//! Report filters run after validation and before the incident is built
use crate::report::Report;

pub trait ReportFilter: Send + Sync {
    fn transform(&self, report: Report) -> Report;
}

impl<F> ReportFilter for F
where
    F: Fn(Report) -> Report + Send + Sync,
{
    fn transform(&self, report: Report) -> Report {
        (self)(report)
    }
}

/// Removes the named fields. `headers` and `body` clear the
/// corresponding evidence data.
#[derive(Debug, Clone, Default)]
pub struct RemoveFields {
    names: Vec<String>,
}

impl RemoveFields {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl ReportFilter for RemoveFields {
    fn transform(&self, mut report: Report) -> Report {
        for name in &self.names {
            match name.as_str() {
                Report::HEADERS => report.headers.clear(),
                Report::BODY => report.body.clear(),
                _ => {
                    report.fields.remove(name);
                }
            }
        }
        report
    }
}

/// Drops report fields whose value is empty
#[derive(Debug, Clone, Copy, Default)]
pub struct DropEmptyFields;

impl ReportFilter for DropEmptyFields {
    fn transform(&self, mut report: Report) -> Report {
        report.fields.retain(|_, value| !value.is_empty());
        report
    }
}
