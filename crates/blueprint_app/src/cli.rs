use std::path::PathBuf;
use std::time::Duration;

use blueprint_engine::{ClientSettings, DEFAULT_API_URL};
use clap::{Parser, Subcommand, ValueEnum};
use engine_logging::LogDestination;

/// Blueprint hackathon assistant: generate ideas, check a submission for
/// similar projects and turn ideas into implementation guides.
#[derive(Parser, Debug)]
#[command(name = "blueprint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the Blueprint API
    #[arg(long, global = true, env = "BLUEPRINT_API_URL", default_value = DEFAULT_API_URL, value_name = "URL")]
    pub api_url: String,

    /// Directory for saved reports, guides and client state
    #[arg(long, global = true, env = "BLUEPRINT_OUTPUT_DIR", default_value = "output", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Give up on a stream after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub stream_timeout_secs: Option<u64>,

    /// Time allowed for an implementation guide
    #[arg(long, global = true, default_value_t = 120, value_name = "SECS")]
    pub breakdown_timeout_secs: u64,

    /// Where log records go
    #[arg(long, global = true, value_enum, default_value_t = LogTarget::File)]
    pub log: LogTarget,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true, env = "BLUEPRINT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Generate project ideas for a hackathon
    Generate {
        /// Hackathon page, e.g. https://cal-hacks-12-0.devpost.com.
        /// Defaults to the last one generated for.
        hackathon_url: Option<String>,
    },
    /// Check a Devpost submission against similar projects
    Check {
        devpost_url: String,
        /// Save the finished report as JSON
        #[arg(long)]
        save: bool,
    },
    /// List the ideas in a generated ideas file
    Ideas {
        /// Defaults to the file produced by the last `generate`
        ideas_file: Option<String>,
    },
    /// Request an implementation guide for one idea
    Breakdown {
        /// Idea number as shown by `ideas`
        number: u32,
        #[arg(long, value_name = "FILE")]
        ideas_file: Option<String>,
        /// Save the guide as markdown
        #[arg(long)]
        save: bool,
    },
    /// Check that the API is reachable
    Health,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
    Off,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
            LogTarget::Off => LogDestination::Off,
        }
    }
}

impl Cli {
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.api_url.clone(),
            breakdown_timeout: Duration::from_secs(self.breakdown_timeout_secs),
            stream_timeout: self.stream_timeout_secs.map(Duration::from_secs),
            ..ClientSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_options_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "blueprint",
            "check",
            "https://devpost.com/software/demo",
            "--save",
            "--stream-timeout-secs",
            "90",
            "--api-url",
            "http://api.test:9000",
        ])
        .unwrap();

        assert_eq!(
            cli.command,
            Command::Check {
                devpost_url: "https://devpost.com/software/demo".to_string(),
                save: true,
            }
        );
        let settings = cli.client_settings();
        assert_eq!(settings.base_url, "http://api.test:9000");
        assert_eq!(settings.stream_timeout, Some(Duration::from_secs(90)));
        assert_eq!(settings.breakdown_timeout, Duration::from_secs(120));
    }

    #[test]
    fn breakdown_takes_number_and_optional_file() {
        let cli =
            Cli::try_parse_from(["blueprint", "breakdown", "3", "--ideas-file", "hack/ideas.txt"])
                .unwrap();
        assert_eq!(
            cli.command,
            Command::Breakdown {
                number: 3,
                ideas_file: Some("hack/ideas.txt".to_string()),
                save: false,
            }
        );
        assert_eq!(cli.log, LogTarget::File);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
