//! Command-line interface and command handlers.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing::warn;

use tasklist_core::api::FieldErrors;
use tasklist_core::models::{
    move_task, Credentials, DueWindow, NewUser, Priority, TaskDraft, TaskFilter, TaskStatus,
};
use tasklist_core::{AppContext, AuthError, Config};

use crate::format::{format_stats, format_task_row};

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 150;

/// Startup behaviour of the stored session, shown under `--help`.
const SESSION_HELP: &str = "\
Every command first checks the stored session. An expired access token is
cleared together with its refresh token, so once it expires you need to run
`tasklist login` again. While it is still valid, a token the server rejects is
renewed automatically.";

#[derive(Parser)]
#[command(
    name = "tasklist",
    version,
    about = "Personal to-do list in your terminal",
    after_help = SESSION_HELP
)]
pub struct Cli {
    /// API base URL, e.g. http://localhost:8000/api
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in and keep the session for later commands
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },
    /// Forget the stored session
    Logout,
    /// Show who is signed in (an expired session shows as signed out)
    Status,
    /// List tasks with summary stats
    Tasks(FilterArgs),
    /// Create a task
    Add {
        title: String,
        /// Due date, YYYY-MM-DD
        #[arg(long)]
        due: NaiveDate,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
    },
    /// Move a task to its next status (pending, in progress, completed)
    Advance { id: i64 },
    /// Delete a task
    Delete { id: i64 },
    /// Move a task to another task's position in the (filtered) list
    Move {
        id: i64,
        /// The task whose position to take
        over: i64,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Show task statistics
    Stats,
}

#[derive(Args, Clone, Default)]
pub struct FilterArgs {
    #[arg(long)]
    pub status: Option<TaskStatus>,
    #[arg(long)]
    pub priority: Option<Priority>,
    /// today, upcoming or overdue
    #[arg(long)]
    pub due: Option<DueWindow>,
    #[arg(long)]
    pub search: Option<String>,
}

impl From<FilterArgs> for TaskFilter {
    fn from(args: FilterArgs) -> Self {
        TaskFilter {
            status: args.status,
            priority: args.priority,
            due: args.due,
            search: args.search,
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub async fn run(command: Command, ctx: &AppContext, config: &mut Config) -> Result<()> {
    match command {
        Command::Login { username } => login(ctx, config, username).await,
        Command::Register {
            username,
            email,
            first_name,
            last_name,
        } => {
            let password = prompt_new_password()?;
            register(
                ctx,
                NewUser {
                    first_name,
                    last_name,
                    username,
                    email,
                    password,
                },
            )
            .await
        }
        Command::Logout => {
            ctx.session.logout();
            println!("Logged out.");
            Ok(())
        }
        Command::Status => {
            let state = ctx.session.state();
            match state.user {
                Some(user) if state.is_authenticated => {
                    println!("Signed in as {} (id {})", user.username, user.id)
                }
                _ => println!("Not signed in."),
            }
            Ok(())
        }
        Command::Tasks(filter) => {
            require_login(ctx)?;
            list_tasks(ctx, filter.into()).await
        }
        Command::Add {
            title,
            due,
            description,
            priority,
        } => {
            require_login(ctx)?;
            let mut draft = TaskDraft::new(title, due);
            draft.description = description;
            draft.priority = priority;
            add_task(ctx, draft).await
        }
        Command::Advance { id } => {
            require_login(ctx)?;
            let task = ctx.api.get_task(id).await?;
            let updated = ctx.api.advance_status(&task).await?;
            println!("{}: {} -> {}", updated.title, task.status, updated.status);
            Ok(())
        }
        Command::Delete { id } => {
            require_login(ctx)?;
            ctx.api.delete_task(id).await?;
            println!("Deleted task {}.", id);
            Ok(())
        }
        Command::Move { id, over, filter } => {
            require_login(ctx)?;
            move_task_to(ctx, id, over, filter.into()).await
        }
        Command::Stats => {
            require_login(ctx)?;
            let stats = ctx.api.stats().await?;
            println!("{}", format_stats(&stats));
            Ok(())
        }
    }
}

fn require_login(ctx: &AppContext) -> Result<()> {
    if !ctx.session.is_authenticated() {
        bail!("Not signed in. Run `tasklist login` first.");
    }
    Ok(())
}

async fn login(ctx: &AppContext, config: &mut Config, username: Option<String>) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => prompt_username(config.last_username.as_deref())?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    match ctx.session.login(&Credentials::new(username.clone(), password)).await {
        Ok(user) => {
            config.last_username = Some(username);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            println!("Welcome, {}!", user.username);
            Ok(())
        }
        Err(e) => bail!("Login failed: {}", e),
    }
}

async fn register(ctx: &AppContext, user: NewUser) -> Result<()> {
    match ctx.session.register(&user).await {
        Ok(created) => {
            println!("Account '{}' created. Run `tasklist login` to sign in.", created.username);
            Ok(())
        }
        Err(AuthError::Validation(errors)) => {
            print_field_errors(&errors);
            bail!("Registration failed");
        }
        Err(e) => bail!("Registration failed: {}", e),
    }
}

async fn list_tasks(ctx: &AppContext, filter: TaskFilter) -> Result<()> {
    // Fetch everything and filter locally, so the stats cover the whole list
    let (tasks, stats) = ctx.api.dashboard(&TaskFilter::default()).await?;
    let today = today();

    println!("{}", format_stats(&stats));
    let visible = filter.apply(&tasks, today);
    if visible.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }
    for task in visible {
        println!("{}", format_task_row(task, today));
    }
    Ok(())
}

async fn add_task(ctx: &AppContext, draft: TaskDraft) -> Result<()> {
    if let Err(errors) = draft.validate(today()) {
        print_field_errors(&errors);
        bail!("Task not created");
    }
    let task = ctx.api.create_task(&draft).await?;
    println!("Created task {}: {}", task.id, task.title);
    Ok(())
}

async fn move_task_to(ctx: &AppContext, id: i64, over: i64, filter: TaskFilter) -> Result<()> {
    let tasks = ctx.api.list_tasks(&TaskFilter::default()).await?;
    let today = today();
    let mut visible: Vec<_> = filter.apply(&tasks, today).into_iter().cloned().collect();

    let Some(orders) = move_task(&mut visible, id, over) else {
        bail!("Nothing to move: both tasks must be in the list and differ");
    };
    ctx.api
        .reorder_tasks(&orders)
        .await
        .context("Failed to save new order")?;

    for task in &visible {
        println!("{}", format_task_row(task, today));
    }
    Ok(())
}

fn print_field_errors(errors: &FieldErrors) {
    for (field, messages) in errors.fields() {
        for message in messages {
            eprintln!("  {}: {}", field, message);
        }
    }
}

fn prompt_username(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    let username = match (input.is_empty(), last) {
        (true, Some(last)) => last.to_string(),
        _ => input.to_string(),
    };
    if username.len() > MAX_USERNAME_LENGTH {
        bail!("Username is too long");
    }
    Ok(username)
}

fn prompt_new_password() -> Result<String> {
    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != confirm {
        bail!("Passwords do not match");
    }
    Ok(password)
}
