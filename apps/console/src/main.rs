use std::{future::Future, path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use console_core::{
    AutoReloadController, CommandDispatcher, ConsoleApi, DispatchOutcome, Document,
    EntitlementDecision, EntitlementGate, Field, Form, FormValidationGuard, HeadlessPage,
    HttpConsoleApi, Page, PageEvent,
};
use shared::{
    domain::{FormId, ReloadState},
    protocol::NEEDS_VALIDATION_CLASS,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, DEFAULT_CONFIG_PATH};

const COMMAND_FORM_ID: &str = "command-form";
const MAX_COMMAND_LEN: usize = 256;

#[derive(Parser, Debug)]
#[command(name = "cluster-console", version, about = "Operate the cluster console from a terminal")]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Overrides `base_url` from the config file and environment.
    #[arg(long)]
    base_url: Option<String>,
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Send a command to a cluster after an entitlement check.
    Send {
        #[arg(long)]
        cluster: String,
        #[arg(long)]
        command: String,
    },
    /// Check whether the configured session is entitled.
    Entitled,
    /// Keep the console view open, reloading while auto-reload is on.
    Watch {
        /// Switch auto-reload on as if the toggle had been clicked.
        #[arg(long)]
        enable: bool,
    },
}

/// How a subcommand finished; maps onto the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Done,
    Invalid,
    Denied,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        match exit {
            Exit::Done => ExitCode::SUCCESS,
            Exit::Invalid => ExitCode::from(2),
            Exit::Denied => ExitCode::from(3),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = load_settings(&args.config)?;
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }

    let api: Arc<dyn ConsoleApi> = Arc::new(
        HttpConsoleApi::new(&settings.base_url)?.with_credentials(settings.credentials()),
    );
    let page = Arc::new(HeadlessPage::open(&settings.base_url)?);

    let exit = match args.action {
        Action::Send { cluster, command } => {
            send(api, page, settings.redirect_delay(), &cluster, &command).await?
        }
        Action::Entitled => entitled(api, &page).await?,
        Action::Watch { enable } => {
            let shutdown = async {
                tokio::signal::ctrl_c()
                    .await
                    .context("failed to listen for ctrl-c")
            };
            watch(api, page, settings.reload_interval(), enable, shutdown).await?
        }
    };
    Ok(exit.into())
}

fn command_form(cluster: &str, command: &str) -> Form {
    Form::new(COMMAND_FORM_ID)
        .with_class(NEEDS_VALIDATION_CLASS)
        .with_field(Field::new("cluster", cluster).required())
        .with_field(
            Field::new("command", command)
                .required()
                .max_length(MAX_COMMAND_LEN),
        )
}

async fn send(
    api: Arc<dyn ConsoleApi>,
    page: Arc<HeadlessPage>,
    redirect_delay: Duration,
    cluster: &str,
    command: &str,
) -> Result<Exit> {
    let form_id = FormId::from(COMMAND_FORM_ID);
    let mut document = Document::new().with_form(command_form(cluster, command));
    let guard = FormValidationGuard::install(&document);

    if guard.submit(&mut document, &form_id)?.default_prevented() {
        if let Some(form) = document.form(&form_id) {
            for (field, message) in form.invalid_fields() {
                eprintln!("{field}: {message}");
            }
        }
        return Ok(Exit::Invalid);
    }

    let mut events = page.subscribe();
    let dispatcher =
        CommandDispatcher::new(api, page.clone()).with_redirect_delay(redirect_delay);

    match dispatcher.dispatch(cluster, command).await? {
        DispatchOutcome::Denied => {
            println!("not entitled; page is now {}", page.location());
            Ok(Exit::Denied)
        }
        DispatchOutcome::Sent(dispatch_id) => {
            wait_for_navigation(&mut events).await?;
            println!(
                "sent '{command}' to {cluster} ({dispatch_id}); page is now {}",
                page.location()
            );
            Ok(Exit::Done)
        }
    }
}

async fn entitled(api: Arc<dyn ConsoleApi>, page: &HeadlessPage) -> Result<Exit> {
    let gate = EntitlementGate::new(api);

    match gate.enforce(page).await? {
        EntitlementDecision::Authorized => {
            println!("entitled");
            Ok(Exit::Done)
        }
        EntitlementDecision::Denied => {
            println!("not entitled; page is now {}", page.location());
            Ok(Exit::Denied)
        }
    }
}

/// Renders the view on every load until auto-reload is off, the page
/// navigates away, or `shutdown` resolves.
async fn watch(
    api: Arc<dyn ConsoleApi>,
    page: Arc<HeadlessPage>,
    interval: Duration,
    enable: bool,
    shutdown: impl Future<Output = Result<()>>,
) -> Result<Exit> {
    tokio::pin!(shutdown);
    let mut events = page.subscribe();
    let mut enable = enable;

    loop {
        render_view(api.as_ref(), page.as_ref()).await;

        // Every load starts from a fresh controller, as a real page would.
        let mut controller =
            AutoReloadController::new(page.clone()).with_interval(interval);
        let mut state = controller.on_page_load();
        if enable && state == ReloadState::Off {
            state = controller.toggle(true);
        }
        enable = false;

        if state == ReloadState::Off {
            println!("auto-reload is off");
            return Ok(Exit::Done);
        }
        println!(
            "auto-reload is on; next refresh in {}s",
            controller.interval().as_secs()
        );

        tokio::select! {
            reloaded = next_page_load(&mut events) => {
                if !reloaded? {
                    println!("navigated to {}", page.location());
                    return Ok(Exit::Done);
                }
            }
            signal = &mut shutdown => {
                signal?;
                controller.toggle(false);
                println!("auto-reload switched off");
                return Ok(Exit::Done);
            }
        }
    }
}

async fn render_view(api: &dyn ConsoleApi, page: &HeadlessPage) {
    let location = page.location();
    match api.load_view(location.as_str()).await {
        Ok(view) => println!(
            "[{}] {location} -> {} ({} bytes)",
            Local::now().format("%H:%M:%S"),
            view.status,
            view.bytes
        ),
        Err(error) => {
            warn!(%location, error = %format!("{error:#}"), "failed to load console view")
        }
    }
}

/// Resolves to `true` on a reload and `false` on a navigation away.
async fn next_page_load(events: &mut broadcast::Receiver<PageEvent>) -> Result<bool> {
    loop {
        match events.recv().await {
            Ok(PageEvent::Reloaded(_)) => return Ok(true),
            Ok(PageEvent::Navigated(_)) => return Ok(false),
            Ok(PageEvent::Replaced(_)) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => bail!("page closed"),
        }
    }
}

async fn wait_for_navigation(events: &mut broadcast::Receiver<PageEvent>) -> Result<()> {
    while next_page_load(events).await? {}
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
