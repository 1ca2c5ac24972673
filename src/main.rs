mod bundle;
mod commands;
mod config;
mod dependencies;
mod error;
mod excerpt;
mod grammar;
mod patterns;
mod resolver;
mod scanner;
mod types;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};

use crate::commands::{Request, SummaryFormat};

/// Log output format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Human-readable lines.
    Text,
}

#[derive(Parser)]
#[command(
    name = "toolctx",
    version,
    about = "Generate an LLM context pack for a tool page by collecting related code files and relevant text excerpts"
)]
struct Cli {
    /// Line context radius for non-heading excerpts (minimum 1).
    #[arg(long, value_name = "N")]
    context_lines: Option<usize>,

    /// Summary format printed on success.
    #[arg(long, value_enum, default_value_t = SummaryFormat::Text)]
    format: SummaryFormat,

    /// Log format on stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Maximum extracted sections per referencing text file (minimum 1).
    #[arg(long, value_name = "N")]
    max_sections_per_file: Option<usize>,

    /// Output file path. Defaults to context/code-dump-<slug>.txt under the repository root.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Repository root. Defaults to the parent of this executable's directory.
    #[arg(long)]
    repo_root: Option<PathBuf>,

    /// Explicit path to the tool page. Relative paths resolve from the repository root.
    #[arg(long)]
    target: Option<PathBuf>,

    /// Tool id or page name, e.g. json-tool or json-tool.html.
    #[arg(short, long)]
    tool: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// The run inputs carried by the parsed flags.
    fn request(&self) -> Request {
        return Request {
            context_lines: self.context_lines,
            max_sections_per_file: self.max_sections_per_file,
            output: self.output.clone(),
            repo_root: self.repo_root.clone(),
            target: self.target.clone(),
            tool: self.tool.clone(),
        };
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    let outcome = commands::run(&cli.request()).and_then(|summary| return commands::print_summary(&summary, cli.format));
    return match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        },
    };
}

/// Install the stderr subscriber. `RUST_LOG` overrides the verbosity flag.
fn init_tracing(verbose: u8, format: LogFormat) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match verbose {
        0 => "toolctx=warn",
        1 => "toolctx=info",
        2 => "toolctx=debug",
        _ => "toolctx=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| return EnvFilter::new(filter));

    match format {
        LogFormat::Json => fmt().json().with_env_filter(env_filter).with_writer(std::io::stderr).init(),
        LogFormat::Text => fmt().with_env_filter(env_filter).with_target(false).with_writer(std::io::stderr).init(),
    }
    return;
}
