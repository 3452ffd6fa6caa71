use clap::Parser;
use fbl_parser::{FblConfig, FblParser};

#[derive(Debug, Parser)]
/// Validates feedback loop parser configuration files.
///
/// Each file is decoded and its alias patterns are compiled.
/// Files must have either a .toml or .json extension.
pub struct ValidateConfigCommand {
    files: Vec<String>,
}

impl ValidateConfigCommand {
    pub fn run(&self) -> anyhow::Result<bool> {
        let mut ok = true;
        for file_name in &self.files {
            match check_file(file_name) {
                Ok(()) => println!("{file_name}: OK"),
                Err(err) => {
                    eprintln!("{file_name}: {err:#}");
                    ok = false;
                }
            }
        }
        Ok(ok)
    }
}

fn check_file(file_name: &str) -> anyhow::Result<()> {
    let config = FblConfig::load_file(file_name)?;
    let parser = FblParser::new(config)?;
    if parser.config().feeds.is_empty() {
        tracing::warn!("{file_name}: no feeds are configured; every report will be skipped");
    }
    Ok(())
}
