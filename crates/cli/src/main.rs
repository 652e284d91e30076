//! mise-en-gitlab command-line entry point.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use mise_en_gitlab::cli::{self, Commands};
use mise_en_gitlab::logging::{
    self, LOG_LEVEL_ENV, Level, TracingConfig, TracingFormat, resolve_level,
};
use mise_en_gitlab::{ExitStatus, try_generate};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = cli::parse();

    let env_level = std::env::var(LOG_LEVEL_ENV).ok();
    let level = resolve_level(env_level.as_deref(), cli.command.verbose(), cli.level);
    let config = TracingConfig {
        format: if cli.json_logs {
            TracingFormat::Json
        } else {
            TracingFormat::Compact
        },
        level: Level::from(level),
        ..TracingConfig::default()
    };
    if let Err(err) = logging::init_tracing(config) {
        eprintln!("{err:?}");
        return ExitStatus::InvalidInput.into();
    }

    match cli.command {
        Commands::Generate { input, output, .. } => {
            if !input.exists() {
                eprintln!("Input file not found: {}", input.display());
                return ExitStatus::InvalidInput.into();
            }

            match try_generate(&input, &output) {
                Ok(_) => {
                    println!("Generated GitLab CI YAML → {}", output.display());
                    ExitStatus::Success.into()
                }
                Err(err) => {
                    let status = ExitStatus::for_error(&err);
                    if status == ExitStatus::NoCiTasks {
                        eprintln!("No CI-annotated tasks found. Add [tasks.<name>.ci] sections.");
                    } else {
                        eprintln!("{:?}", miette::Report::new(err));
                    }
                    status.into()
                }
            }
        }
    }
}
