use anyhow::Context;
use clap::Parser;
use fbl_parser::{FblConfig, FblParser, MessageError, ParseOutcome, RawEnvelope};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
/// Parses feedback loop messages and prints the outcome.
///
/// One JSON object is printed per input file. The exit status
/// is non-zero if any message failed to parse.
pub struct ParseCommand {
    /// Parser configuration, in TOML or JSON format
    #[arg(long)]
    config: PathBuf,

    /// Pretty print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Paths to .eml files
    files: Vec<PathBuf>,
}

impl ParseCommand {
    pub fn run(&self) -> anyhow::Result<bool> {
        let config = FblConfig::load_file(&self.config)?;
        let parser = FblParser::new(config)?;

        let mut ok = true;
        for path in &self.files {
            let outcome = parse_file(&parser, path)?;
            if outcome.is_failed() {
                ok = false;
            }

            let json = if self.pretty {
                serde_json::to_string_pretty(&outcome)?
            } else {
                serde_json::to_string(&outcome)?
            };
            println!("{json}");
        }
        Ok(ok)
    }
}

/// A file that cannot be read aborts the run; a file that cannot be
/// parsed is reported as a failed outcome and the batch continues.
fn parse_file(parser: &FblParser, path: &Path) -> anyhow::Result<ParseOutcome> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(parse_message(parser, &data).unwrap_or_else(|err| {
        tracing::warn!("{}: {err:#}", path.display());
        ParseOutcome::failed(&err)
    }))
}

fn parse_message(parser: &FblParser, data: &[u8]) -> Result<ParseOutcome, MessageError> {
    let mail = mailparse::parse_mail(data)
        .map_err(|err| MessageError::MalformedEnvelope(format!("{err:#}")))?;
    let envelope = RawEnvelope::from_mail(data)?;
    Ok(parser.parse(&mail, envelope.as_ref()))
}
