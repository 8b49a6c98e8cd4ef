//! Signs in through the device flow, loads the session store and prints a
//! dashboard.
//!
//! Usage: `workboard [config.json]`. Without a path, configuration comes
//! from `WORKBOARD_*` environment variables.

use std::sync::Arc;

use chrono::Utc;
use log::info;

use workboard::identity::{DeviceCode, DevicePrompt, IdentityError};
use workboard::views::{
    dashboard_summary, is_project_overdue, project_progress, recent_projects, upcoming_deadlines,
};
use workboard::{
    init_logging, load_config, Config, DataGateway, Database, DeviceFlowProvider,
    IdentityGateway, SessionHost,
};

struct ConsolePrompt;

impl DevicePrompt for ConsolePrompt {
    fn show(&self, code: &DeviceCode) {
        println!();
        println!("  Open {} and enter code {}", code.verification_uri, code.user_code);
        if let Some(complete) = &code.verification_uri_complete {
            println!("  (or go straight to {})", complete);
        }
        println!();
    }
}

async fn run() -> workboard::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(path)?,
        None => Config::from_env()?,
    };
    init_logging(&config.logging);
    info!(
        "Starting workboard v{} for project {}",
        env!("CARGO_PKG_VERSION"),
        config.backend.project_id
    );

    if config.backend.resolve_api_key()?.is_some() {
        log::debug!("Backend API key configured");
    }

    let db_path = config.backend.database_path();
    let db = Database::open(&db_path)?;
    info!("Using database {}", db_path.display());
    let gateway = DataGateway::sqlite(db);

    if !config.identity.is_configured() {
        return Err(IdentityError::Config(
            "set identity.clientId, deviceAuthUrl, tokenUrl and userinfoUrl".to_string(),
        )
        .into());
    }
    let provider = DeviceFlowProvider::new(&config.identity, Arc::new(ConsolePrompt))?;
    let identity = IdentityGateway::new(Arc::new(provider));

    let host = Arc::new(SessionHost::new(gateway, config.store.clone()));
    let mut stores = host.watch();
    let _session = host.attach(&identity);

    let user = identity.sign_in().await?;
    let store = stores
        .wait_for(Option::is_some)
        .await
        .ok()
        .and_then(|active| active.clone())
        .ok_or_else(|| IdentityError::Provider("session ended during load".to_string()))?;

    let now = Utc::now();
    let projects = store.projects();
    let tasks = store.tasks();
    let summary = dashboard_summary(&projects, &tasks, &store.employees(), now);

    println!("Signed in as {}", user.label());
    println!(
        "Projects: {} ({} active, {} completed, {} overdue)",
        summary.total_projects,
        summary.active_projects,
        summary.completed_projects,
        summary.overdue_projects
    );
    println!(
        "Tasks: {} ({} completed, {} overdue) - {}% complete",
        summary.total_tasks, summary.completed_tasks, summary.overdue_tasks, summary.completion_rate
    );
    println!("Team members: {}", summary.team_members);

    let recent = recent_projects(&projects, 5);
    if !recent.is_empty() {
        println!("\nRecent projects:");
        for project in recent {
            let marker = if is_project_overdue(project, now) { " (overdue)" } else { "" };
            println!(
                "  {:<32} {:<12} {:>3}%{}",
                project.name,
                project.status.label(),
                project_progress(&tasks, &project.id),
                marker
            );
        }
    }

    let upcoming = upcoming_deadlines(&tasks, now, 7);
    if !upcoming.is_empty() {
        println!("\nDue this week:");
        for task in upcoming {
            if let Some(due) = task.due_date {
                println!("  {:<32} {}", task.name, due.format("%Y-%m-%d"));
            }
        }
    }

    if let Some(error) = store.error() {
        println!("\nSome data failed to load: {}", error);
    }

    identity.sign_out().await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        log::error!("{}", e);
        eprintln!("workboard: {}", e);
        std::process::exit(1);
    }
}
