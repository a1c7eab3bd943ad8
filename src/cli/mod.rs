pub mod onboard;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "attendance",
    about = "Personal class attendance tracker"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Onboard,
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    Status,
    Doctor,
    /// Print the weekly timetable.
    Timetable,
    Subject {
        #[command(subcommand)]
        command: SubjectCommands,
    },
    /// Show the scheduled periods and recorded entries of a date.
    Day {
        #[arg(long)]
        date: Option<String>,
        /// Days to move from the date, e.g. -1 for the day before.
        #[arg(long, allow_hyphen_values = true, default_value_t = 0)]
        offset: i64,
    },
    /// Record present/absent/cancelled for a regular period.
    Mark {
        subject: String,
        status: String,
        #[arg(long)]
        date: Option<String>,
    },
    Proxy {
        #[command(subcommand)]
        command: ProxyCommands,
    },
    Extra {
        #[command(subcommand)]
        command: ExtraCommands,
    },
    Stats,
    Report {
        #[arg(long)]
        date: Option<String>,
    },
    Serve,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}

#[derive(Debug, Subcommand)]
pub enum SubjectCommands {
    Add {
        name: String,
        /// Comma-separated weekdays, e.g. mon,wed,fri
        #[arg(long, value_delimiter = ',', required = true)]
        days: Vec<String>,
    },
    Remove {
        name: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProxyCommands {
    Add {
        scheduled: String,
        replacement: String,
        #[arg(long)]
        date: Option<String>,
    },
    Status {
        index: usize,
        status: String,
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ExtraCommands {
    Add {
        subject: String,
        #[arg(long)]
        teacher: Option<String>,
        #[arg(long)]
        date: Option<String>,
    },
    Status {
        index: usize,
        status: String,
        #[arg(long)]
        date: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_mark_with_date() {
        let cli = Cli::parse_from(["attendance", "mark", "DWM", "present", "--date", "2025-09-15"]);

        match cli.command {
            Commands::Mark {
                subject,
                status,
                date,
            } => {
                assert_eq!(subject, "DWM");
                assert_eq!(status, "present");
                assert_eq!(date.as_deref(), Some("2025-09-15"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_subject_days_list() {
        let cli = Cli::parse_from(["attendance", "subject", "add", "Yoga", "--days", "mon,fri"]);

        match cli.command {
            Commands::Subject {
                command: SubjectCommands::Add { name, days },
            } => {
                assert_eq!(name, "Yoga");
                assert_eq!(days, vec!["mon", "fri"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
