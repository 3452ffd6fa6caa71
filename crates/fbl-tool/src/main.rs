use clap::{Parser, ValueEnum};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Layer};

mod parse;
mod validate_config;

/// Feedback loop (ARF) report parser.
///
/// Reads abuse feedback messages and prints the incidents
/// that they describe as JSON.
#[derive(Debug, Parser)]
#[command(about, version)]
struct Opt {
    /// How diagnostic logs are rendered on stderr.
    /// The log filter is taken from FBL_LOG in the environment.
    #[arg(long, value_enum, default_value = "compact")]
    diag_format: DiagnosticFormat,

    #[command(subcommand)]
    cmd: SubCommand,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
#[clap(rename_all = "kebab_case")]
enum DiagnosticFormat {
    Pretty,
    Full,
    Compact,
    Json,
}

#[derive(Debug, Parser)]
enum SubCommand {
    Parse(parse::ParseCommand),
    ValidateConfig(validate_config::ValidateConfigCommand),
}

impl SubCommand {
    fn run(&self) -> anyhow::Result<bool> {
        match self {
            Self::Parse(cmd) => cmd.run(),
            Self::ValidateConfig(cmd) => cmd.run(),
        }
    }
}

const DEFAULT_LOG_FILTER: &str = "fbl_parser=info,fbl_tool=info";

fn init_logging(format: DiagnosticFormat) -> anyhow::Result<()> {
    let layer = fmt::layer().with_writer(std::io::stderr);
    let layer = match format {
        DiagnosticFormat::Pretty => layer.pretty().boxed(),
        DiagnosticFormat::Full => layer.boxed(),
        DiagnosticFormat::Compact => layer.compact().boxed(),
        DiagnosticFormat::Json => layer.json().boxed(),
    };

    let env_filter = EnvFilter::try_new(
        std::env::var("FBL_LOG")
            .as_deref()
            .unwrap_or(DEFAULT_LOG_FILTER),
    )?;

    tracing_subscriber::registry()
        .with(layer.with_filter(env_filter))
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let opts = Opt::parse();
    init_logging(opts.diag_format)?;

    if !opts.cmd.run()? {
        std::process::exit(1);
    }
    Ok(())
}
