//! Campus CLI - command-line client for the Campus learning platform
//!
//! Every invocation boots a session from the persisted token, runs one
//! command through the same guard, cache and 401 policy a screen would use,
//! and exits.

use anyhow::{anyhow, bail, Context, Result};
use campus_applications::{
    filter_by_status, sort_overview, CampusApp, CourseStatus, GuardDecision, Location,
    NavigationHistory, SortOrder,
};
use campus_core::{
    init_logging, log_operation_error, log_operation_start, log_operation_success, CampusConfig,
    ProfileUpdate, Role,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "campus")]
#[command(about = "Command-line client for the Campus learning platform")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        email: String,

        /// Password (falls back to CAMPUS_PASSWORD)
        #[arg(short, long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Log out and forget the stored token
    Logout,

    /// Show who is logged in
    Whoami,

    /// Check whether a screen would open, and where it redirects otherwise
    Open {
        /// Screen path, e.g. /teacher/courses
        path: String,

        /// Roles allowed on the screen; any logged-in user when omitted
        #[arg(short, long, value_delimiter = ',')]
        role: Vec<Role>,
    },

    /// List the course catalogue
    Courses,

    /// Show one course
    Course { course_id: String },

    /// Show enrolled courses with progress
    Enrollments {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,

        #[arg(long, value_enum, default_value = "title")]
        sort: SortArg,
    },

    /// Enroll in a course
    Enroll { course_id: String },

    /// Mark a lesson as completed
    Complete { course_id: String, lesson_id: String },

    /// Show progress in one course
    Progress { course_id: String },

    /// Show the dashboard for the logged-in role
    Dashboard,

    /// List notifications or mark them read
    Notifications {
        /// Mark one notification as read
        #[arg(long)]
        read: Option<String>,

        /// Mark every notification as read
        #[arg(long, conflicts_with = "read")]
        read_all: bool,
    },

    /// Update the own profile
    Profile {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        avatar: Option<String>,
    },

    /// List users (admin only)
    Users,

    /// Change a user's role (admin only)
    SetRole { user_id: String, role: Role },

    /// Configuration management
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Validate configuration
        #[arg(long)]
        validate: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    NotStarted,
    InProgress,
    Completed,
}

impl From<StatusArg> for CourseStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::NotStarted => CourseStatus::NotStarted,
            StatusArg::InProgress => CourseStatus::InProgress,
            StatusArg::Completed => CourseStatus::Completed,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Title,
    Progress,
    Activity,
}

impl From<SortArg> for SortOrder {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Title => SortOrder::Title,
            SortArg::Progress => SortOrder::ProgressDesc,
            SortArg::Activity => SortOrder::LastActivity,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Commands::Config {
        show,
        init,
        validate,
    } = &cli.command
    {
        return handle_config(cli.config.as_deref(), *show, *init, *validate);
    }

    let mut config = CampusConfig::load(cli.config.as_deref())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    init_logging(&config.logging).map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting Campus CLI v{}", env!("CARGO_PKG_VERSION"));

    let history = Arc::new(NavigationHistory::new());
    let app = CampusApp::from_config(&config, history.clone())?;
    app.boot().await;

    match cli.command {
        Commands::Login { email, password } => handle_login(&app, &email, &password).await,
        Commands::Logout => {
            app.sign_out().await;
            println!("👋 Logged out");
            Ok(())
        }
        Commands::Whoami => handle_whoami(&app),
        Commands::Open { path, role } => handle_open(&app, &path, &role),
        Commands::Config { .. } => Ok(()),
        command => {
            require_login(&app)?;
            run_authenticated(&app, command).await
        }
    }
}

async fn handle_login(app: &CampusApp, email: &str, password: &str) -> Result<()> {
    app.navigate(Location::new("/login"), None);

    log_operation_start!("login", email = %email);
    match app.sign_in(email, password).await {
        Ok(landing) => {
            log_operation_success!("login", landing = %landing);
            let session = app.session().current();
            if let Some(user) = session.identity {
                println!("✅ Logged in as {} ({})", user.label(), user.role);
            }
            println!("➡️  {}", landing);
            Ok(())
        }
        Err(e) => {
            log_operation_error!("login", e);
            bail!("Login failed: {}", e.user_message())
        }
    }
}

fn handle_whoami(app: &CampusApp) -> Result<()> {
    match app.session().current().identity {
        Some(user) => {
            println!("{} <{}>", user.label(), user.email);
            println!("  id:   {}", user.id);
            println!("  role: {}", user.role);
            println!("  home: {}", user.role.home_path());
        }
        None => println!("Not logged in"),
    }
    Ok(())
}

fn handle_open(app: &CampusApp, path: &str, roles: &[Role]) -> Result<()> {
    let required = (!roles.is_empty()).then_some(roles);
    match app.navigate(Location::parse(path), required) {
        GuardDecision::Render => println!("✅ {} renders", path),
        GuardDecision::Loading => println!("⏳ Session still loading"),
        GuardDecision::RedirectToLogin { location } => {
            println!("🔒 Login required, redirecting to {}", location)
        }
        GuardDecision::RedirectHome { location } => println!("↪️  Redirecting to {}", location),
    }
    Ok(())
}

fn require_login(app: &CampusApp) -> Result<()> {
    if app.session().current().is_authenticated() {
        return Ok(());
    }
    bail!("Not logged in. Run `campus login --email <email>` first.")
}

async fn run_authenticated(app: &CampusApp, command: Commands) -> Result<()> {
    let outcome = execute(app, command).await;

    if !app.session().current().is_authenticated() {
        debug!("Session ended during command");
        eprintln!("🔒 Your session has expired. Run `campus login` again.");
    }
    outcome
}

async fn execute(app: &CampusApp, command: Commands) -> Result<()> {
    let data = app.data();
    match command {
        Commands::Courses => {
            for course in data.courses().await? {
                let state = if course.published { "" } else { " (draft)" };
                println!("[{}] {}{}", course.id, course.title, state);
            }
            Ok(())
        }
        Commands::Course { course_id } => {
            let course = data.course(&course_id).await?;
            println!("{}", serde_json::to_string_pretty(&course)?);
            Ok(())
        }
        Commands::Enrollments { status, sort } => {
            let mut overview = data.overview().await?;
            if let Some(status) = status {
                overview = filter_by_status(&overview, status.into());
            }
            sort_overview(&mut overview, sort.into());

            if overview.is_empty() {
                println!("No enrolled courses");
            }
            for course in overview {
                println!(
                    "[{}] {:<40} {:>3}% ({}/{}) {}",
                    course.course_id,
                    course.title.as_deref().unwrap_or("-"),
                    course.percentage,
                    course.completed_lessons,
                    course.total_lessons,
                    course.status.label()
                );
            }
            Ok(())
        }
        Commands::Enroll { course_id } => {
            let enrollment = data.enroll(&course_id).await?;
            println!("✅ Enrolled in course {}", enrollment.course_id);
            Ok(())
        }
        Commands::Complete {
            course_id,
            lesson_id,
        } => {
            let progress = data.complete_lesson(&course_id, &lesson_id).await?;
            println!(
                "✅ Lesson {} completed ({}/{})",
                lesson_id, progress.completed_lessons, progress.total_lessons
            );
            Ok(())
        }
        Commands::Progress { course_id } => {
            let progress = data.course_progress(&course_id).await?;
            let percentage = campus_applications::completion_percentage(
                progress.completed_lessons,
                progress.total_lessons,
            );
            println!(
                "Course {}: {}% ({}/{} lessons)",
                progress.course_id, percentage, progress.completed_lessons, progress.total_lessons
            );
            Ok(())
        }
        Commands::Dashboard => {
            let role = app
                .session()
                .current()
                .role()
                .context("Session has no role")?;
            let summary = data.dashboard(role).await?;
            println!("📊 {} dashboard", role);
            for (key, value) in summary {
                println!("  {}: {}", key, value);
            }
            Ok(())
        }
        Commands::Notifications { read, read_all } => {
            if let Some(id) = read {
                data.mark_notification_read(&id).await?;
            } else if read_all {
                data.mark_all_notifications_read().await?;
            }
            for notification in data.notifications().await? {
                let marker = if notification.read { " " } else { "•" };
                println!("{} [{}] {}", marker, notification.id, notification.message);
            }
            Ok(())
        }
        Commands::Profile { name, avatar } => {
            if name.is_none() && avatar.is_none() {
                bail!("Nothing to update. Pass --name and/or --avatar.");
            }
            let user = data
                .update_profile(&ProfileUpdate {
                    display_name: name,
                    avatar,
                })
                .await?;
            println!("✅ Profile updated: {}", user.label());
            Ok(())
        }
        Commands::Users => {
            ensure_role(app, Role::Admin)?;
            for user in data.admin_users().await? {
                println!("[{}] {:<30} {}", user.id, user.email, user.role);
            }
            Ok(())
        }
        Commands::SetRole { user_id, role } => {
            ensure_role(app, Role::Admin)?;
            let user = data.update_user_role(&user_id, role).await?;
            println!("✅ {} is now {}", user.label(), user.role);
            Ok(())
        }
        Commands::Login { .. }
        | Commands::Logout
        | Commands::Whoami
        | Commands::Open { .. }
        | Commands::Config { .. } => Ok(()),
    }
}

fn ensure_role(app: &CampusApp, role: Role) -> Result<()> {
    match app.session().current().role() {
        Some(current) if current == role => Ok(()),
        Some(current) => bail!("This command needs the {} role (you are {})", role, current),
        None => bail!("Not logged in"),
    }
}

fn handle_config(path: Option<&std::path::Path>, show: bool, init: bool, validate: bool) -> Result<()> {
    if init {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => CampusConfig::default_path()
                .context("Could not determine the configuration directory")?,
        };
        if config_path.exists() {
            bail!("Configuration already exists at {:?}", config_path);
        }
        CampusConfig::default().save_to_file(&config_path)?;
        println!("✅ Configuration initialized at: {:?}", config_path);
    }

    if show {
        let config = CampusConfig::load(path)?;
        println!("📋 Current configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
    }

    if validate {
        match CampusConfig::load(path) {
            Ok(_) => println!("✅ Configuration is valid"),
            Err(e) => {
                println!("❌ Configuration validation failed: {}", e);
                return Err(e.into());
            }
        }
    }

    if !(init || show || validate) {
        println!("Nothing to do. Use --show, --init or --validate.");
    }
    Ok(())
}
