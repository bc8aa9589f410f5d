//! CLI argument definitions for the tabletalk binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use tabletalk_storage::SeedPlan;

/// Tabletalk - ask questions about a SQL database in plain language.
#[derive(Parser, Debug)]
#[command(name = "tabletalk", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file.
    #[arg(short = 'd', long = "database", global = true)]
    pub database: Option<PathBuf>,

    /// Model identifier for query synthesis.
    #[arg(short = 'm', long = "model", global = true)]
    pub model: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Interactive chat session (default).
    Chat,
    /// Introspect the database and print or write the schema feed.
    Schema {
        /// Write the YAML feed here instead of stdout.
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Create and fill the demo company tables.
    Seed(SeedArgs),
    /// Run one statement through the safety gate and print the result.
    Query {
        /// SQL statement to run.
        sql: String,
    },
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct SeedArgs {
    #[arg(long, default_value_t = 10)]
    pub departments: usize,
    #[arg(long, default_value_t = 150)]
    pub employees: usize,
    #[arg(long, default_value_t = 30)]
    pub projects: usize,
    #[arg(long, default_value_t = 220)]
    pub assignments: usize,
    /// RNG seed; the same seed and date give the same rows.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl SeedArgs {
    pub fn plan(&self) -> SeedPlan {
        SeedPlan {
            departments: self.departments,
            employees: self.employees,
            projects: self.projects,
            assignments: self.assignments,
            seed: self.seed,
            ..SeedPlan::default()
        }
    }
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat)
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > TABLETALK_CONFIG env var > ~/.tabletalk/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("TABLETALK_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Database path override, if given.
    pub fn resolve_database(&self) -> Option<String> {
        self.database
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    pub fn resolve_model(&self) -> Option<String> {
        self.model.clone()
    }

    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".tabletalk").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".tabletalk").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_default_command_is_chat() {
        let args = parse(&["tabletalk"]);
        assert_eq!(args.command(), Command::Chat);
    }

    #[test]
    fn test_config_flag_wins() {
        let args = parse(&["tabletalk", "--config", "/tmp/custom.toml"]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/custom.toml"));
    }

    #[test]
    fn test_global_overrides_after_subcommand() {
        let args = parse(&["tabletalk", "query", "SELECT 1;", "--database", "/tmp/x.db", "-m", "local"]);
        assert_eq!(
            args.command(),
            Command::Query {
                sql: "SELECT 1;".to_string()
            }
        );
        assert_eq!(args.resolve_database().as_deref(), Some("/tmp/x.db"));
        assert_eq!(args.resolve_model().as_deref(), Some("local"));
        assert!(args.resolve_log_level().is_none());
    }

    #[test]
    fn test_seed_defaults_and_overrides() {
        let Command::Seed(seed) = parse(&["tabletalk", "seed"]).command() else {
            panic!("expected seed");
        };
        let plan = seed.plan();
        assert_eq!(
            (plan.departments, plan.employees, plan.projects, plan.assignments, plan.seed),
            (10, 150, 30, 220, 42)
        );

        let Command::Seed(seed) =
            parse(&["tabletalk", "seed", "--employees", "5", "--seed", "7"]).command()
        else {
            panic!("expected seed");
        };
        assert_eq!(seed.employees, 5);
        assert_eq!(seed.plan().seed, 7);
    }

    #[test]
    fn test_schema_output() {
        let args = parse(&["tabletalk", "schema", "-o", "feed.yaml"]);
        assert_eq!(
            args.command(),
            Command::Schema {
                output: Some(PathBuf::from("feed.yaml"))
            }
        );
    }
}
