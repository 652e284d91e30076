use crate::logging::LogLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mise-en-gitlab")]
#[command(about = "Generate GitLab CI pipelines from mise.toml tasks")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    #[arg(long, global = true, help = "Output logs in JSON format")]
    pub json_logs: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Generate a GitLab CI pipeline from annotated tasks")]
    Generate {
        #[arg(
            long = "in",
            value_name = "PATH",
            help = "Task file to read",
            default_value = "mise.toml"
        )]
        input: PathBuf,
        #[arg(
            long = "out",
            value_name = "PATH",
            help = "Pipeline file to write",
            default_value = "generated-ci.yml"
        )]
        output: PathBuf,
        #[arg(short, long, help = "Enable debug logging")]
        verbose: bool,
    },
}

impl Commands {
    /// Whether the subcommand asked for debug logging.
    #[must_use]
    pub const fn verbose(&self) -> bool {
        match self {
            Self::Generate { verbose, .. } => *verbose,
        }
    }
}

#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["mise-en-gitlab", "generate"]).unwrap();

        assert!(matches!(cli.level, LogLevel::Warn));
        assert!(!cli.json_logs);
        let Commands::Generate {
            input,
            output,
            verbose,
        } = cli.command;
        assert_eq!(input, PathBuf::from("mise.toml"));
        assert_eq!(output, PathBuf::from("generated-ci.yml"));
        assert!(!verbose);
    }

    #[test]
    fn test_cli_paths_and_verbose() {
        let cli = Cli::try_parse_from([
            "mise-en-gitlab",
            "generate",
            "--in",
            "conf/mise.toml",
            "--out",
            "out/.gitlab-ci.yml",
            "-v",
        ])
        .unwrap();

        assert!(cli.command.verbose());
        let Commands::Generate { input, output, .. } = cli.command;
        assert_eq!(input, PathBuf::from("conf/mise.toml"));
        assert_eq!(output, PathBuf::from("out/.gitlab-ci.yml"));
    }

    #[test]
    fn test_cli_log_level_parsing() {
        let cli = Cli::try_parse_from(["mise-en-gitlab", "--level", "trace", "generate"]).unwrap();
        assert!(matches!(cli.level, LogLevel::Trace));

        let cli = Cli::try_parse_from(["mise-en-gitlab", "generate", "-l", "error"]).unwrap();
        assert!(matches!(cli.level, LogLevel::Error));
    }

    #[test]
    fn test_cli_json_logs_flag() {
        let cli = Cli::try_parse_from(["mise-en-gitlab", "generate", "--json-logs"]).unwrap();
        assert!(cli.json_logs);
    }

    #[test]
    fn test_cli_rejects_unknown_level() {
        assert!(Cli::try_parse_from(["mise-en-gitlab", "--level", "loud", "generate"]).is_err());
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["mise-en-gitlab"]).is_err());
    }
}
