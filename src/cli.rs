use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::api::{self, AppState};
use crate::calendar::{month_of, week_of, year_of};
use crate::client::{ClientError, PlannerClient};
use crate::config::Config;
use crate::database::Database;
use crate::models::{NewTask, Task, TaskFilter, TaskPatch};
use crate::schema::validate_month;
use crate::stats;
use crate::store::{SessionStore, StoreError};
use crate::theme::{Theme, ThemeContext, ThemeError};
use crate::utils::{format_month, parse_date};

#[derive(Parser)]
#[command(name = "planner")]
#[command(about = "Daily planner: dated tasks, day notes, month goals and rules")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind, overrides the config
        #[arg(long)]
        bind: Option<String>,
    },
    /// Issue and revoke sessions
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },
    /// Show or change the theme
    Theme {
        #[command(subcommand)]
        action: ThemeCommand,
    },
    /// Tasks on the server
    Tasks {
        #[command(flatten)]
        remote: Remote,
        #[command(subcommand)]
        action: TaskCommand,
    },
    /// Personal rules on the server
    Rules {
        #[command(flatten)]
        remote: Remote,
        #[command(subcommand)]
        action: RuleCommand,
    },
    /// The note for one day
    Note {
        #[command(flatten)]
        remote: Remote,
        #[command(subcommand)]
        action: NoteCommand,
    },
    /// The goal for one month
    Goal {
        #[command(flatten)]
        remote: Remote,
        #[command(subcommand)]
        action: GoalCommand,
    },
    /// Reputation and completion rates
    Stats {
        #[command(flatten)]
        remote: Remote,
        /// Day to compute from (YYYY-MM-DD), defaults to today
        #[arg(long)]
        today: Option<String>,
    },
    /// Show the signed-in user
    Whoami {
        #[command(flatten)]
        remote: Remote,
    },
}

#[derive(Args)]
pub struct Remote {
    /// API base URL, overrides the config
    #[arg(long, env = "PLANNER_SERVER")]
    pub server: Option<String>,
    /// Session token
    #[arg(long, env = "PLANNER_TOKEN", hide_env_values = true)]
    pub token: String,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Issue a session for a user and print its token
    Create {
        #[arg(long)]
        user: String,
        /// Lifetime in hours, overrides the config
        #[arg(long)]
        ttl_hours: Option<u32>,
    },
    /// Revoke a session token
    Revoke { token: String },
    /// Delete expired sessions
    Purge,
}

#[derive(Subcommand)]
pub enum ThemeCommand {
    Show,
    List,
    Set { name: String },
}

#[derive(Args, Default)]
pub struct RangeArgs {
    /// First day (YYYY-MM-DD), needs --end
    #[arg(long, requires = "end", conflicts_with_all = ["week", "month", "year"])]
    pub start: Option<String>,
    /// Last day (YYYY-MM-DD), needs --start
    #[arg(long, requires = "start")]
    pub end: Option<String>,
    /// Any day of the week to show
    #[arg(long, conflicts_with_all = ["month", "year"])]
    pub week: Option<String>,
    /// Month to show (YYYY-MM)
    #[arg(long, conflicts_with = "year")]
    pub month: Option<String>,
    /// Year to show
    #[arg(long)]
    pub year: Option<i32>,
}

#[derive(Subcommand)]
pub enum TaskCommand {
    List {
        #[command(flatten)]
        range: RangeArgs,
    },
    Add {
        /// Day (YYYY-MM-DD)
        date: String,
        content: String,
        #[arg(long)]
        completed: bool,
    },
    /// Flip a task between open and done
    Toggle { id: i64 },
    Edit {
        id: i64,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum RuleCommand {
    List,
    Add { content: String },
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum NoteCommand {
    Show { date: String },
    Set { date: String, content: String },
}

#[derive(Subcommand)]
pub enum GoalCommand {
    /// Month (YYYY-MM), defaults to the current month
    Show { month: Option<String> },
    Set { month: String, content: String },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] StoreError),
    #[error("{0}")]
    RequestFailed(String),
    #[error("{0}")]
    ThemeError(#[from] ThemeError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Open the configured database, creating it on first use
pub fn open_database(config: &Config) -> Result<Database, CliError> {
    let path = config.get_database_path();
    let path = path.to_str().ok_or_else(|| {
        CliError::IoError(std::io::Error::other("Database path contains invalid UTF-8"))
    })?;
    Ok(Database::new(path)?)
}

/// Handle the serve command
pub async fn handle_serve(config: &Config, bind: Option<String>) -> Result<(), CliError> {
    let db = Arc::new(open_database(config)?);
    let purged = db.purge_expired_sessions()?;
    if purged > 0 {
        tracing::info!(purged, "removed expired sessions");
    }
    let state = AppState::new(db.clone(), db, &config.session_cookie);
    let bind = bind.unwrap_or_else(|| config.bind_address.clone());
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    api::serve(listener, state).await?;
    Ok(())
}

/// Handle the session commands
pub fn handle_session(config: &Config, action: SessionCommand) -> Result<(), CliError> {
    let db = open_database(config)?;
    match action {
        SessionCommand::Create { user, ttl_hours } => {
            let ttl = ttl_hours
                .map(|hours| Duration::from_secs(u64::from(hours) * 3600))
                .unwrap_or_else(|| config.session_ttl());
            let session = db.create_session(&user, ttl)?;
            println!("{}", session.token);
            eprintln!("Session for '{}' expires at {}", session.user_id, session.expires_at);
        }
        SessionCommand::Revoke { token } => {
            if db.revoke_session(&token)? {
                println!("Session revoked");
            } else {
                println!("No such session");
            }
        }
        SessionCommand::Purge => {
            let removed = db.purge_expired_sessions()?;
            println!("Removed {} expired session(s)", removed);
        }
    }
    Ok(())
}

/// Handle the theme commands
pub fn handle_theme(config: &Config, action: ThemeCommand) -> Result<(), CliError> {
    let mut ctx = ThemeContext::init_from_storage(config.get_theme_path());
    match action {
        ThemeCommand::Show => println!("{}", ctx.theme()),
        ThemeCommand::List => {
            for theme in Theme::ALL {
                let marker = if theme == ctx.theme() { "*" } else { " " };
                println!("{} {}", marker, theme);
            }
        }
        ThemeCommand::Set { name } => {
            ctx.set_theme(name.parse()?)?;
            println!("Theme set to {}", ctx.theme());
        }
    }
    Ok(())
}

fn connect(config: &Config, remote: &Remote) -> PlannerClient {
    let server = remote.server.as_deref().unwrap_or(&config.server_url);
    PlannerClient::new(server, &remote.token)
}

/// Map a client failure to what the user sees: validation text as sent by
/// the server, `fallback` for everything else.
fn notify(fallback: &'static str) -> impl Fn(ClientError) -> CliError {
    move |err| {
        tracing::debug!(error = %err, "request failed");
        CliError::RequestFailed(err.notification(fallback))
    }
}

/// Turn the range flags into a task filter
pub fn resolve_range(range: &RangeArgs) -> Result<TaskFilter, CliError> {
    if let Some(week) = &range.week {
        return Ok(week_of(parse_day(week)?).to_filter());
    }
    if let Some(month) = &range.month {
        validate_month("month", month).map_err(|e| CliError::DateParseError(e.message))?;
        return Ok(month_of(parse_day(&format!("{month}-01"))?).to_filter());
    }
    if let Some(year) = range.year {
        let range = year_of(year)
            .ok_or_else(|| CliError::DateParseError(format!("Year out of range: {}", year)))?;
        return Ok(range.to_filter());
    }
    Ok(TaskFilter {
        start: range.start.clone(),
        end: range.end.clone(),
    })
}

fn parse_day(value: &str) -> Result<NaiveDate, CliError> {
    parse_date(value)
        .map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", value, e)))
}

fn print_task(task: &Task) {
    let mark = if task.completed { "x" } else { " " };
    println!("{:>5}  {}  [{}] {}", task.id, task.date, mark, task.content);
}

/// Handle the tasks commands
pub async fn handle_tasks(
    config: &Config,
    remote: Remote,
    action: TaskCommand,
) -> Result<(), CliError> {
    let client = connect(config, &remote);
    match action {
        TaskCommand::List { range } => {
            let tasks = client
                .list_tasks(&resolve_range(&range)?)
                .await
                .map_err(notify("Failed to fetch tasks"))?;
            if tasks.is_empty() {
                println!("No tasks");
            }
            tasks.iter().for_each(print_task);
        }
        TaskCommand::Add {
            date,
            content,
            completed,
        } => {
            let task = client
                .create_task(&NewTask {
                    date,
                    content,
                    completed,
                })
                .await
                .map_err(notify("Failed to save task"))?;
            println!("Task created successfully (ID: {})", task.id);
        }
        TaskCommand::Toggle { id } => {
            let task = client
                .list_tasks(&TaskFilter::default())
                .await
                .map_err(notify("Failed to fetch tasks"))?
                .into_iter()
                .find(|t| t.id == id)
                .ok_or_else(|| CliError::RequestFailed(format!("Task {} not found", id)))?;
            let task = client
                .toggle_task(&task)
                .await
                .map_err(notify("Failed to save task"))?;
            print_task(&task);
        }
        TaskCommand::Edit { id, date, content } => {
            let patch = TaskPatch {
                date,
                content,
                completed: None,
            };
            let task = client
                .update_task(id, &patch)
                .await
                .map_err(notify("Failed to save task"))?;
            print_task(&task);
        }
        TaskCommand::Delete { id } => {
            client
                .delete_task(id)
                .await
                .map_err(notify("Failed to delete task"))?;
            println!("Task {} deleted", id);
        }
    }
    Ok(())
}

/// Handle the rules commands
pub async fn handle_rules(
    config: &Config,
    remote: Remote,
    action: RuleCommand,
) -> Result<(), CliError> {
    let client = connect(config, &remote);
    match action {
        RuleCommand::List => {
            let rules = client
                .list_rules()
                .await
                .map_err(notify("Failed to fetch rules"))?;
            for rule in rules {
                println!("{:>5}  {}", rule.id, rule.content);
            }
        }
        RuleCommand::Add { content } => {
            let rule = client
                .create_rule(&content)
                .await
                .map_err(notify("Failed to save rule"))?;
            println!("Rule created successfully (ID: {})", rule.id);
        }
        RuleCommand::Delete { id } => {
            client
                .delete_rule(id)
                .await
                .map_err(notify("Failed to delete rule"))?;
            println!("Rule {} deleted", id);
        }
    }
    Ok(())
}

/// Handle the note commands
pub async fn handle_note(
    config: &Config,
    remote: Remote,
    action: NoteCommand,
) -> Result<(), CliError> {
    let client = connect(config, &remote);
    match action {
        NoteCommand::Show { date } => {
            let note = client
                .get_note(&date)
                .await
                .map_err(notify("Failed to fetch note"))?;
            match note {
                Some(note) => println!("{}", note.content),
                None => println!("No note for {}", date),
            }
        }
        NoteCommand::Set { date, content } => {
            client
                .save_note(&date, &content)
                .await
                .map_err(notify("Failed to save note"))?;
            println!("Note for {} saved", date);
        }
    }
    Ok(())
}

/// Handle the goal commands
pub async fn handle_goal(
    config: &Config,
    remote: Remote,
    action: GoalCommand,
) -> Result<(), CliError> {
    let client = connect(config, &remote);
    match action {
        GoalCommand::Show { month } => {
            let month = month.unwrap_or_else(|| format_month(chrono::Local::now().date_naive()));
            let goal = client
                .get_month_goal(&month)
                .await
                .map_err(notify("Failed to fetch month goal"))?;
            match goal {
                Some(goal) => println!("{}", goal.content),
                None => println!("No goal for {}", month),
            }
        }
        GoalCommand::Set { month, content } => {
            client
                .save_month_goal(&month, &content)
                .await
                .map_err(notify("Failed to save month goal"))?;
            println!("Goal for {} saved", month);
        }
    }
    Ok(())
}

/// Handle the stats command
pub async fn handle_stats(
    config: &Config,
    remote: Remote,
    today: Option<String>,
) -> Result<(), CliError> {
    let today = match today {
        Some(day) => parse_day(&day)?,
        None => chrono::Local::now().date_naive(),
    };
    let client = connect(config, &remote);
    let tasks = client
        .list_tasks(&TaskFilter::default())
        .await
        .map_err(notify("Failed to fetch tasks"))?;
    let summary = stats::summarize(&tasks, today);

    println!("{}", summary.sentence);
    println!("Reputation: {}", summary.reputation);
    println!(
        "This week:  {}% done ({} completed, {} failed)",
        summary.week.pct, summary.week.completed, summary.week.failed
    );
    println!(
        "This month: {}% done ({} completed, {} failed)",
        summary.month.pct, summary.month.completed, summary.month.failed
    );
    Ok(())
}

/// Handle the whoami command
pub async fn handle_whoami(config: &Config, remote: Remote) -> Result<(), CliError> {
    let principal = connect(config, &remote)
        .current_user()
        .await
        .map_err(notify("Failed to fetch user"))?;
    println!("{}", principal.id);
    Ok(())
}
