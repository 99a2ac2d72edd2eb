//! Clap derive structures for the `timetable` CLI.
//!
//! Defines the command tree, global flags, and shared value types.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use timetable_core::{EntityId, WeekAlternation};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// timetable -- manage a school timetable backend from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "timetable",
    version,
    about = "Administer school timetable data from the command line",
    long_about = "Browse and maintain the records behind a school timetable:\n\
        classrooms, courses, disciplines, subjects, groups, teachers,\n\
        user accounts, the weekly schedule and dated changes to it.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend API root (overrides the config file)
    #[arg(long, short = 'u', env = "TIMETABLE_URL", global = true)]
    pub url: Option<String>,

    /// Bearer token (overrides the config file)
    #[arg(long, env = "TIMETABLE_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "TIMETABLE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Rows fetched per request
    #[arg(long, global = true)]
    pub page_size: Option<usize>,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one id per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List records of one kind
    #[command(alias = "ls")]
    List(ListArgs),

    /// Delete records by id
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Issue a new registration key
    AccessKey,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Record collections served by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceKind {
    #[value(alias = "classroom")]
    Classrooms,
    #[value(alias = "course")]
    Courses,
    #[value(alias = "discipline")]
    Disciplines,
    #[value(alias = "subject")]
    Subjects,
    #[value(alias = "group")]
    Groups,
    #[value(alias = "teacher")]
    Teachers,
    #[value(alias = "user")]
    Users,
    Schedule,
    #[value(alias = "change")]
    Changes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WeekArg {
    Numerator,
    Denominator,
}

impl From<WeekArg> for WeekAlternation {
    fn from(week: WeekArg) -> Self {
        match week {
            WeekArg::Numerator => Self::Numerator,
            WeekArg::Denominator => Self::Denominator,
        }
    }
}

// ── List ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ListArgs {
    /// What to list
    pub resource: ResourceKind,

    /// Free-text search
    #[arg(long)]
    pub query: Option<String>,

    /// Stop after this many rows (0 = everything)
    #[arg(long, short = 'l', default_value = "50")]
    pub limit: usize,

    /// Only groups of this course id
    #[arg(long)]
    pub course: Option<EntityId>,

    /// Only teachers of this discipline id
    #[arg(long)]
    pub discipline: Option<EntityId>,

    /// Only entries for this group id
    #[arg(long)]
    pub group: Option<EntityId>,

    /// Only entries taught by this teacher id
    #[arg(long)]
    pub teacher: Option<EntityId>,

    /// Day of the week, 1 (Monday) to 7
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=7))]
    pub day: Option<u8>,

    /// Numerator or denominator week
    #[arg(long)]
    pub week: Option<WeekArg>,

    /// Only changes on this date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

// ── Delete ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// What to delete
    pub resource: ResourceKind,

    /// Ids of the records to delete
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<EntityId>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Print the effective configuration (token redacted)
    Show,

    /// Write a default config file
    Init {
        /// Backend API root to store
        #[arg(long)]
        base_url: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }
}
