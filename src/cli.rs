//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::NewAccount;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SecAssess - security self-assessment client
///
/// Answer domain-grouped assessment questions, review scored dashboards
/// and administer the assessment platform from the terminal.
///
/// Examples:
///   secassess register --first-name Sam --last-name Analyst --organization Acme \
///     --designation Analyst --account-email sam@acme.test --account-password <PASSWORD>
///   secassess domains
///   secassess take --domain <DOMAIN_ID> --answers answers.json --submit
///   secassess dashboard
///   secassess dashboard --assessment <ID> --domain <DOMAIN_ID> --format json
///   secassess admin stats
///   secassess init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Assessment API base URL (including the /api prefix)
    #[arg(long, global = true, value_name = "URL", env = "SECASSESS_API_URL")]
    pub api_url: Option<String>,

    /// Account email used to sign in
    #[arg(long, global = true, env = "SECASSESS_EMAIL")]
    pub email: Option<String>,

    /// Account password used to sign in
    #[arg(long, global = true, env = "SECASSESS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Pre-issued bearer token (skips sign-in)
    #[arg(long, global = true, env = "SECASSESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .secassess.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate a default .secassess.toml configuration file
    InitConfig,

    /// Create a regular account
    Register(AccountArgs),

    /// List assessment domains
    Domains,

    /// Render the scored dashboard of an assessment
    Dashboard(DashboardArgs),

    /// Answer the questions of a domain from a file and optionally submit
    Take(TakeArgs),

    /// List your submitted assessments
    Assessments,

    /// Platform administration
    Admin {
        #[command(subcommand)]
        action: AdminCommand,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct DashboardArgs {
    /// Assessment to show (defaults to your latest)
    #[arg(short, long, value_name = "ID")]
    pub assessment: Option<String>,

    /// Drill into a domain
    #[arg(long, value_name = "ID")]
    pub domain: Option<String>,

    /// Drill into a subdomain of the selected domain
    #[arg(long, value_name = "ID", requires = "domain")]
    pub subdomain: Option<String>,

    /// Drill into a control of the selected subdomain
    #[arg(long, value_name = "ID", requires = "subdomain")]
    pub control: Option<String>,

    /// Highlight a metric of the selected control
    #[arg(long, value_name = "ID", requires = "control")]
    pub metric: Option<String>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the dashboard to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct TakeArgs {
    /// Domain to answer
    #[arg(long, value_name = "ID")]
    pub domain: String,

    /// JSON file with [{"question_id": ..., "selected_answer_id": ...}]
    #[arg(long, value_name = "FILE")]
    pub answers: PathBuf,

    /// Submit once every question of the domain is answered
    #[arg(long)]
    pub submit: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AdminCommand {
    /// Platform-wide user, assessment and content statistics
    Stats,
    /// List all accounts
    Users,
    /// Create an account
    CreateUser {
        #[command(flatten)]
        account: AccountArgs,

        /// Grant the admin role
        #[arg(long)]
        admin: bool,
    },
    /// Block an account
    Block { user_id: String },
    /// Reactivate a blocked account
    Unblock { user_id: String },
    /// Permanently delete an account
    DeleteUser { user_id: String },
}

/// Profile and credentials of a new account.
#[derive(clap::Args, Debug, Clone)]
pub struct AccountArgs {
    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    /// Organization name
    #[arg(long, value_name = "NAME")]
    pub organization: String,

    /// Job title
    #[arg(long)]
    pub designation: String,

    /// Sign-in email of the new account
    #[arg(long, value_name = "EMAIL")]
    pub account_email: String,

    /// Password of the new account
    #[arg(long, env = "SECASSESS_ACCOUNT_PASSWORD", hide_env_values = true)]
    pub account_password: String,

    #[arg(long, value_name = "EMAIL")]
    pub corporate_email: Option<String>,

    #[arg(long, value_name = "PHONE")]
    pub contact_number: Option<String>,
}

impl AccountArgs {
    pub fn to_new_account(&self) -> NewAccount {
        NewAccount {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            organization_name: self.organization.clone(),
            email: self.account_email.clone(),
            corporate_email: self.corporate_email.clone(),
            designation: self.designation.clone(),
            contact_number: self.contact_number.clone(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        if !self.account_email.contains('@') {
            return Err(format!("Invalid account email: {}", self.account_email));
        }
        if self.account_password.is_empty() {
            return Err("Account password must not be empty".to_string());
        }
        Ok(())
    }
}

/// Output format for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Whether the command talks to the API at all.
    pub fn needs_api(&self) -> bool {
        !matches!(self.command, Command::InitConfig)
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for init-config
        if !self.needs_api() {
            return Ok(());
        }

        // Validate API URL format
        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        match self.command {
            Command::Take(ref take) if !take.answers.is_file() => {
                return Err(format!(
                    "Answers file does not exist: {}",
                    take.answers.display()
                ));
            }
            Command::Register(ref account)
            | Command::Admin {
                action: AdminCommand::CreateUser { ref account, .. },
            } => account.validate()?,
            _ => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
