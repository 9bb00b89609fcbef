//! TaskAgent - personal task tracker
//!
//! CLI entry point: serves the API or runs one operation against the store.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use eyre::{Context, Result};
use serde::Serialize;
use tracing::info;

use taskagent::cli::{Cli, Command, OutputFormat, step_patch};
use taskagent::config::Config;
use taskagent::domain::DayKey;
use taskagent::events::{ListenerHub, NullSink};
use taskagent::server::{self, AppState};
use taskagent::service::TaskService;
use taskstore::{Achievement, Step, TaskWithSteps};

fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskagent")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Log to file only; stdout belongs to command output
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("taskagent.log"))
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        "TaskAgent loaded config: provider={}, model={}, store={}",
        config.llm.provider,
        config.llm.model,
        config.storage.expanded_dir().display()
    );

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    if let Command::Serve { bind } = command {
        return cmd_serve(&config, bind).await;
    }

    let service = TaskService::from_config(&config, Arc::new(NullSink))?;
    let result = run_command(&service, command).await;
    service.shutdown().await?;
    result
}

async fn run_command(service: &TaskService, command: Command) -> Result<()> {
    match command {
        Command::Serve { .. } => eyre::bail!("serve is not a one-shot command"),
        Command::Add { title, format } => {
            let task = service.create_task(&title).await?;
            print_task(&task, format)
        }
        Command::List { format } => {
            let tasks = service.list_incomplete().await?;
            match format {
                OutputFormat::Json => print_json(&tasks),
                OutputFormat::Text => {
                    if tasks.is_empty() {
                        println!("No open tasks");
                    }
                    for task in &tasks {
                        println!(
                            "{}  {}  [{}/{} steps, {} min]",
                            task.task.id,
                            task.task.title,
                            task.completed_steps(),
                            task.total_steps(),
                            task.task.estimated_minutes
                        );
                    }
                    Ok(())
                }
            }
        }
        Command::Show { task_id, format } => match service.get_task(&task_id).await? {
            Some(task) => print_task(&task, format),
            None => not_found("task", &task_id),
        },
        Command::Step {
            step_id,
            done,
            undone,
            content,
            format,
        } => {
            let patch = step_patch(done, undone, content);
            match service.update_step(&step_id, patch).await? {
                Some(step) => print_step(&step, format),
                None => not_found("step", &step_id),
            }
        }
        Command::Complete { task_id, format } => match service.complete_task(&task_id).await? {
            Some(completion) => match format {
                OutputFormat::Json => print_json(&completion),
                OutputFormat::Text => {
                    println!("{}", completion.summary);
                    Ok(())
                }
            },
            None => not_found("task", &task_id),
        },
        Command::Summary { date, format } => {
            let day = date.unwrap_or_else(DayKey::today);
            let summary = service.daily_summary(day).await?;
            match format {
                OutputFormat::Json => print_json(&serde_json::json!({ "summary_markdown": summary })),
                OutputFormat::Text => {
                    println!("{}", summary);
                    Ok(())
                }
            }
        }
        Command::Achievements { page, limit, format } => {
            let achievements = service.list_achievements(page, limit).await?;
            print_achievements(&achievements, format)
        }
    }
}

async fn cmd_serve(config: &Config, bind: Option<String>) -> Result<()> {
    let hub = Arc::new(ListenerHub::new());
    let service = Arc::new(TaskService::from_config(config, hub.clone())?);
    let addr = bind.unwrap_or_else(|| config.server.bind.clone());

    println!("TaskAgent listening on {}", addr);
    let state = AppState {
        service: service.clone(),
        hub,
    };
    let result = server::run(&addr, state).await;
    service.shutdown().await?;
    result
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn not_found(what: &str, id: &str) -> Result<()> {
    eprintln!("No {} found with id {}", what, id);
    Ok(())
}

fn print_task(task: &TaskWithSteps, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(task);
    }
    println!("{}", task.task.title);
    println!("  id:        {}", task.task.id);
    println!("  estimate:  {} minutes", task.task.estimated_minutes);
    if let Some(at) = task.task.completed_at.and_then(chrono::DateTime::from_timestamp_millis) {
        println!("  completed: {}", at.format("%Y-%m-%d %H:%M UTC"));
    }
    for step in &task.steps {
        let mark = if step.done { "x" } else { " " };
        println!("  [{}] {}. {} ({} min)", mark, step.order_idx + 1, step.content, step.estimate_minutes);
        println!("        {}", step.id);
    }
    Ok(())
}

fn print_step(step: &Step, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(step);
    }
    let mark = if step.done { "x" } else { " " };
    println!("[{}] {}", mark, step.content);
    Ok(())
}

fn print_achievements(achievements: &[Achievement], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(&achievements);
    }
    if achievements.is_empty() {
        println!("No achievements yet");
    }
    for a in achievements {
        println!(
            "{}  {} tasks, {} steps, {} min",
            a.day_key, a.task_count, a.step_count, a.consumed_minutes
        );
    }
    Ok(())
}
