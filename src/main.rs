//! SecAssess - security self-assessment client
//!
//! A CLI for answering domain-grouped security assessment questions,
//! reviewing scored dashboards and administering the assessment platform
//! through its HTTP API.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, config, sign-in failure, etc.)
//!   2 - Submission refused because the domain is incomplete

mod analysis;
mod api;
mod cli;
mod config;
mod models;
mod report;
mod session;
mod viewmodel;

use anyhow::{bail, Context, Result};
use api::{ApiClient, ApiError, CatalogService, SessionCatalog};
use cli::{AccountArgs, AdminCommand, Args, Command, DashboardArgs, OutputFormat, TakeArgs};
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use models::{AccountStatus, Response, Role};
use secrecy::SecretString;
use session::Session;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use viewmodel::{AssessmentFlow, DashboardViewModel, FetchOutcome, FlowError, SelectionAction};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    // Load configuration
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config);

    info!("SecAssess v{}", env!("CARGO_PKG_VERSION"));
    debug!("Command: {:?}", args.command);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            if let Some(api_error) = api_error_of(&e) {
                if api_error.is_unauthorized() {
                    eprintln!("   Your session was rejected. Sign in again with --email and --password.");
                } else if api_error.is_forbidden() {
                    eprintln!("   This account is not allowed to do that.");
                }
            }
            std::process::exit(1);
        }
    }
}

/// The API error behind a command failure, if there is one.
fn api_error_of(e: &anyhow::Error) -> Option<&ApiError> {
    e.downcast_ref::<ApiError>()
        .or_else(|| match e.downcast_ref::<FlowError>() {
            Some(FlowError::Api(inner)) => Some(inner),
            _ => None,
        })
}

/// Handle init-config: generate a default .secassess.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  .secassess.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .secassess.toml")?;

    println!("✅ Created .secassess.toml with default settings.");
    println!("   Edit it to set the API URL, your account email and report options.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Dispatch the command. Returns the process exit code.
async fn run(args: Args, config: Config) -> Result<i32> {
    let client = ApiClient::new((&config.api).into())?;
    info!("Using assessment API at {}", client.base_url());

    // Commands that run without a session.
    match args.command {
        Command::Domains => return list_domains(&client, args.quiet).await,
        Command::Register(ref account) => return register(&client, account, args.quiet).await,
        _ => {}
    }

    let session = open_session(&client, &args, &config).await?;

    let result = match &args.command {
        Command::Dashboard(dashboard) => {
            run_dashboard(&client, &session, dashboard, &config, args.quiet).await
        }
        Command::Take(take) => run_take(&client, &session, take, args.quiet).await,
        Command::Assessments => list_assessments(&client, &session).await,
        Command::Admin { action } => run_admin(&client, &session, action, args.quiet).await,
        Command::InitConfig | Command::Domains | Command::Register(_) => Ok(0),
    };

    session.logout();
    result
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location. Logging is not up yet, so warn on stderr.
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            if !args.quiet {
                eprintln!("⚠️  Ignoring .secassess.toml: {:#}", e);
            }
            Ok(Config::default())
        }
    }
}

/// Open a session from a token or by signing in.
async fn open_session(client: &ApiClient, args: &Args, config: &Config) -> Result<Session> {
    if let Some(ref token) = args.token {
        debug!("Using pre-issued token");
        return Ok(Session::from_token(token.clone()));
    }

    let (Some(email), Some(password)) = (config.api.email.as_deref(), args.password.as_ref())
    else {
        bail!("Sign-in required: provide --email and --password (or --token)");
    };

    let password = SecretString::new(password.clone());
    let pb = spinner("Signing in...", args.quiet);
    let session = client.login(email, &password).await;
    finish_spinner(pb);

    session.context("Sign-in failed")
}

/// Create a spinner unless running quietly.
fn spinner(message: &str, quiet: bool) -> Option<ProgressBar> {
    if quiet {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

fn finish_spinner(spinner: Option<ProgressBar>) {
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
}

/// Create a regular account.
async fn register(client: &ApiClient, account: &AccountArgs, quiet: bool) -> Result<i32> {
    let password = SecretString::new(account.account_password.clone());

    let pb = spinner("Creating account...", quiet);
    let session = client.register(&account.to_new_account(), &password).await;
    finish_spinner(pb);
    let session = session.context("Registration failed")?;

    let email = session
        .user()
        .map(|u| u.email.clone())
        .unwrap_or_else(|| account.account_email.clone());
    println!("✅ Registered {}", email);
    println!("   Sign in with: secassess --email {} --password <PASSWORD> assessments", email);

    session.logout();
    Ok(0)
}

/// List the assessment domains.
async fn list_domains(client: &ApiClient, quiet: bool) -> Result<i32> {
    let pb = spinner("Loading domains...", quiet);
    let domains = client.list_domains().await;
    finish_spinner(pb);
    let domains = domains.context("Failed to load domains")?;

    if domains.is_empty() {
        println!("No domains are configured.");
        return Ok(0);
    }

    println!("📚 Assessment domains:\n");
    for domain in &domains {
        println!(
            "   {} {} ({})",
            domain.icon.as_deref().unwrap_or("•"),
            domain.name,
            domain.id
        );
        if let Some(ref description) = domain.description {
            println!("      {}", description);
        }
    }
    Ok(0)
}

/// Render the dashboard of an assessment.
async fn run_dashboard(
    client: &ApiClient,
    session: &Session,
    args: &DashboardArgs,
    config: &Config,
    quiet: bool,
) -> Result<i32> {
    let assessment_id = match args.assessment {
        Some(ref id) => id.clone(),
        None => {
            let assessments = client
                .my_assessments(session)
                .await
                .context("Failed to list assessments")?;
            match assessments.first() {
                Some(latest) => latest.id.clone(),
                None => bail!("No submitted assessments yet; run `secassess take` first"),
            }
        }
    };
    info!("Loading dashboard for assessment {}", assessment_id);

    let catalog = SessionCatalog::new(client, session);
    let mut view_model = DashboardViewModel::new();

    let pb = spinner("Loading dashboard...", quiet);
    let loaded = load_dashboard(&mut view_model, &catalog, &assessment_id, args).await;
    finish_spinner(pb);
    loaded?;

    let report = report::DashboardReport::from_view_model(&view_model, &assessment_id);
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
    };

    let output_path = args
        .output
        .clone()
        .or_else(|| config.general.output.as_ref().map(PathBuf::from));

    match output_path {
        Some(ref path) => {
            report::write_output(&output, path)?;
            println!("✅ Dashboard saved to: {}", path.display());

            if let (false, Some(stats)) = (quiet, view_model.stats()) {
                println!("\n📊 Summary:");
                for line in analysis::generate_summary_text(stats).lines() {
                    println!("   {}", line);
                }
            }
        }
        None => println!("{}", output),
    }

    Ok(0)
}

/// Load the overview and apply the requested drill-down path.
async fn load_dashboard(
    view_model: &mut DashboardViewModel,
    catalog: &dyn CatalogService,
    assessment_id: &str,
    args: &DashboardArgs,
) -> Result<()> {
    view_model
        .load_overview(catalog, assessment_id)
        .await
        .context("Failed to load dashboard")?;

    drill_down(view_model, catalog, args).await
}

/// Select the requested hierarchy path, one level at a time.
async fn drill_down(
    view_model: &mut DashboardViewModel,
    catalog: &dyn CatalogService,
    args: &DashboardArgs,
) -> Result<()> {
    let path = [
        SelectionAction::Domain(args.domain.clone()),
        SelectionAction::Subdomain(args.subdomain.clone()),
        SelectionAction::Control(args.control.clone()),
        SelectionAction::Metric(args.metric.clone()),
    ];

    for action in path {
        warn_if_unknown(view_model, &action);
        let Some(request) = view_model.dispatch(action) else {
            continue;
        };

        let result = request.run(catalog).await;
        let error = result.as_ref().err().cloned();
        if view_model.resolve(&request, result) == FetchOutcome::Failed {
            let message = view_model
                .last_error()
                .unwrap_or("Failed to load catalog")
                .to_string();
            return Err(match error {
                Some(e) => anyhow::Error::new(e).context(message),
                None => anyhow::anyhow!(message),
            });
        }
    }

    Ok(())
}

/// Warn when a drill-down id is not among the entities loaded for its level.
fn warn_if_unknown(view_model: &DashboardViewModel, action: &SelectionAction) {
    let (level, id, known) = match action {
        SelectionAction::Domain(Some(id)) => {
            ("domain", id, view_model.domains().iter().any(|d| &d.id == id))
        }
        SelectionAction::Subdomain(Some(id)) => (
            "subdomain",
            id,
            view_model.subdomains().iter().any(|s| &s.id == id),
        ),
        SelectionAction::Control(Some(id)) => (
            "control",
            id,
            view_model.controls().iter().any(|c| &c.id == id),
        ),
        SelectionAction::Metric(Some(id)) => {
            ("metric", id, view_model.metrics().iter().any(|m| &m.id == id))
        }
        _ => return,
    };

    if !known {
        warn!("Unknown {} '{}'; the chart will be empty", level, id);
    }
}

/// Answer a domain's questions from a file and optionally submit.
async fn run_take(
    client: &ApiClient,
    session: &Session,
    args: &TakeArgs,
    quiet: bool,
) -> Result<i32> {
    let content = std::fs::read_to_string(&args.answers)
        .with_context(|| format!("Failed to read {}", args.answers.display()))?;
    let responses: Vec<Response> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", args.answers.display()))?;

    let catalog = SessionCatalog::new(client, session);

    let pb = spinner("Loading questions...", quiet);
    let questions = catalog.domain_questions(&args.domain).await;
    finish_spinner(pb);
    let questions = questions.context("Failed to load questions")?;

    let mut flow = AssessmentFlow::new();
    flow.load_domain(&args.domain, questions);

    let mut rejected = 0;
    for response in &responses {
        if let Err(e) = flow.handle_answer_select(&response.question_id, &response.selected_answer_id)
        {
            warn!("Skipping response: {}", e);
            rejected += 1;
        }
    }

    print_progress(&flow, &args.domain);
    if rejected > 0 {
        println!("   ⚠️  {} response(s) did not match this domain's questions", rejected);
    }

    if !args.submit {
        if flow.can_submit(&args.domain) {
            println!("\n✅ All questions answered. Re-run with --submit to send them.");
        }
        return Ok(0);
    }

    if !flow.can_submit(&args.domain) {
        eprintln!(
            "\n⛔ Cannot submit: {} of {} questions answered.",
            flow.progress_for_domain(&args.domain).answered,
            flow.progress_for_domain(&args.domain).total
        );
        return Ok(2);
    }

    let receipt = flow
        .submit(&[args.domain.clone()], &catalog)
        .await
        .context("Submission failed")?;

    println!("\n✅ Assessment submitted: {}", receipt.assessment_id);
    println!(
        "   View it with: secassess dashboard --assessment {}",
        receipt.assessment_id
    );
    Ok(0)
}

/// Print answered counts per subdomain and for the whole domain.
fn print_progress(flow: &AssessmentFlow, domain_id: &str) {
    let questions = flow.questions(domain_id);
    let grouped = analysis::group_by_subdomain(questions);

    let mut subdomains: Vec<_> = grouped.values().collect();
    subdomains.sort_by(|a, b| a[0].subdomain.cmp(&b[0].subdomain));

    println!("📝 Progress for domain {} ({}):\n", domain_id, flow.state(domain_id));
    for group in subdomains {
        let answered = group
            .iter()
            .filter(|q| flow.selected_answer(&q.id).is_some())
            .count();
        println!("   {}: {}/{}", group[0].subdomain, answered, group.len());
    }
    println!("\n   Total: {}", flow.progress_for_domain(domain_id));
}

/// List the signed-in user's assessments.
async fn list_assessments(client: &ApiClient, session: &Session) -> Result<i32> {
    let assessments = client
        .my_assessments(session)
        .await
        .context("Failed to list assessments")?;

    if assessments.is_empty() {
        println!("No submitted assessments yet.");
        return Ok(0);
    }

    println!("🗂️  Your assessments (newest first):\n");
    for assessment in &assessments {
        println!(
            "   {}  {}  [{}]",
            assessment.submission_date.format("%Y-%m-%d %H:%M"),
            assessment.id,
            assessment.status
        );
    }
    Ok(0)
}

/// Run an administration command.
async fn run_admin(
    client: &ApiClient,
    session: &Session,
    action: &AdminCommand,
    quiet: bool,
) -> Result<i32> {
    if session.user().is_some() && !session.is_admin() {
        bail!("Admin access required");
    }

    match action {
        AdminCommand::Stats => {
            let pb = spinner("Loading platform statistics...", quiet);
            let result = futures::try_join!(
                client.platform_stats(session),
                client.content_stats(session)
            );
            finish_spinner(pb);
            let (platform, content) = result.context("Failed to load statistics")?;

            println!("📊 Platform Statistics:");
            println!(
                "   Users: {} ({} admin, {} regular)",
                platform.user_stats.total_users,
                platform.user_stats.admin_users,
                platform.user_stats.regular_users
            );
            println!(
                "   Assessments: {} | Responses: {} | Avg responses/assessment: {:.2}",
                platform.assessment_stats.total_assessments,
                platform.assessment_stats.total_responses,
                platform.assessment_stats.average_responses_per_assessment
            );
            println!(
                "   Content: {} domains, {} subdomains, {} controls, {} metrics, {} questions",
                content.domains, content.subdomains, content.controls, content.metrics, content.questions
            );

            if !platform.recent_assessments.is_empty() {
                println!("\n   Recent assessments:");
                for recent in &platform.recent_assessments {
                    println!(
                        "     {}  {} <{}>",
                        recent.submission_date.format("%Y-%m-%d %H:%M"),
                        recent.user_name,
                        recent.user_email
                    );
                }
            }

            if !platform.user_activities.is_empty() {
                println!("\n   User activity:");
                for activity in &platform.user_activities {
                    let latest = activity
                        .latest_assessment
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "never".to_string());
                    println!(
                        "     {} ({}) - {} assessment(s), latest {} [{}]",
                        activity.name,
                        activity.organization,
                        activity.assessment_count,
                        latest,
                        activity.status
                    );
                }
            }
        }
        AdminCommand::Users => {
            let users = client
                .list_users(session)
                .await
                .context("Failed to list users")?;

            println!("👥 Accounts ({}):\n", users.len());
            for user in &users {
                println!(
                    "   {}  {} <{}>  {}  {} [{}]",
                    user.id,
                    user.full_name(),
                    user.email,
                    user.organization_name,
                    user.role,
                    user.status
                );
            }
        }
        AdminCommand::CreateUser { account, admin } => {
            let role = if *admin { Role::Admin } else { Role::User };
            let password = SecretString::new(account.account_password.clone());
            let user = client
                .create_user(session, &account.to_new_account(), &password, role)
                .await
                .context("Failed to create user")?;
            println!(
                "✅ Created {} {} <{}> as {}",
                user.id,
                user.full_name(),
                user.email,
                user.role
            );
        }
        AdminCommand::DeleteUser { user_id } => {
            client
                .delete_user(session, user_id)
                .await
                .context("Failed to delete user")?;
            println!("✅ Deleted {}", user_id);
        }
        AdminCommand::Block { user_id } => {
            client
                .set_user_status(session, user_id, AccountStatus::Blocked)
                .await
                .context("Failed to block user")?;
            println!("✅ Blocked {}", user_id);
        }
        AdminCommand::Unblock { user_id } => {
            client
                .set_user_status(session, user_id, AccountStatus::Active)
                .await
                .context("Failed to unblock user")?;
            println!("✅ Reactivated {}", user_id);
        }
    }

    Ok(0)
}
