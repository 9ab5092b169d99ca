//! NutriAI terminal client.
//!
//! Hosts the session core in a terminal: sign in and out, inspect the
//! account, and watch a session until it ends through inactivity.

mod host;

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use futures::future::try_join;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nutri_core::models::{LoginRequest, PlanSlot, RecordId, Registration};
use nutri_core::navigation::LOGIN_PATH;
use nutri_core::session::{Activity, ActivityFeed};
use nutri_core::{ApiError, Config, SessionController};

use host::{Host, TerminalNotifier};

// ============================================================================
// Constants
// ============================================================================

/// Page a command pretends to be on unless it says otherwise.
const HOME_PAGE: &str = "/index.html";

const LOG_FILE: &str = "nutri.log";

const DEFAULT_RECOMMENDATION_LIMIT: &str = "10";

const USAGE: &str = "\
Usage: nutri <command>

Commands:
  login <identifier>         Sign in (password from NUTRI_PASSWORD or prompt)
  register <name> <email>    Create an account and sign in
  logout                     Forget the stored token
  whoami                     Show who is signed in
  profile                    Show profile and preferences
  recommendations [limit]    List recent recommendations
  meal <id>                  Show one meal
  watch [page]               Keep a session open until it ends; each line on
                             stdin counts as activity";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr, filtered by `RUST_LOG` (default `warn`), and to a
/// file in `log_dir` when one can be opened.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir.and_then(open_log_file) {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();
    guard
}

fn open_log_file(dir: &Path) -> Option<RollingFileAppender> {
    std::fs::create_dir_all(dir).ok()?;
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(dir)
        .ok()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut config = Config::load().context("Failed to load config")?;
    if let Ok(base) = std::env::var("NUTRI_API_BASE") {
        config.api_base_url = base;
    }

    let _guard = init_tracing(config.cache_dir().ok().as_deref());
    info!(api = %config.api_base_url, "NutriAI client starting");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let result = match args.as_slice() {
        ["login", identifier] => login(config, identifier).await,
        ["register", name, email] => register(config, name, email).await,
        ["logout"] => logout(config),
        ["whoami"] => whoami(config).await,
        ["profile"] => profile(config).await,
        ["recommendations"] => recommendations(config, DEFAULT_RECOMMENDATION_LIMIT).await,
        ["recommendations", limit] => recommendations(config, limit).await,
        ["meal", id] => meal(config, id).await,
        ["watch"] => watch(config, HOME_PAGE).await,
        ["watch", page] => watch(config, page).await,
        _ => {
            eprintln!("{}", USAGE);
            return Ok(());
        }
    };

    if let Err(e) = result {
        match e.downcast_ref::<ApiError>() {
            Some(api_error) => eprintln!("Error: {}", api_error.user_message()),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
    Ok(())
}

fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var("NUTRI_PASSWORD") {
        return Ok(password);
    }
    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        bail!("Password required");
    }
    Ok(password)
}

fn controller_for(host: &Host) -> (SessionController, Arc<ActivityFeed>) {
    let feed = Arc::new(ActivityFeed::new());
    let controller = SessionController::new(
        host.api.clone(),
        feed.clone(),
        Arc::new(TerminalNotifier),
        host.config.inactivity_window(),
    );
    (controller, feed)
}

async fn login(config: Config, identifier: &str) -> Result<()> {
    let host = Host::new(config, LOGIN_PATH)?;
    let password = read_password()?;
    let (controller, _) = controller_for(&host);

    let state = controller
        .sign_in(&LoginRequest::new(identifier, password))
        .await?;
    match state.profile() {
        Some(profile) => println!("Signed in as {}", profile.display_label()),
        None => bail!("Login succeeded but the server did not confirm the session"),
    }
    Ok(())
}

async fn register(config: Config, name: &str, email: &str) -> Result<()> {
    let host = Host::new(config, "/registration.html")?;
    if host.api.check_email(email).await? {
        bail!("An account with {} already exists", email);
    }
    let password = read_password()?;
    let (controller, _) = controller_for(&host);

    let registration = Registration {
        name: name.to_string(),
        email: email.to_string(),
        password,
        ..Default::default()
    };
    let state = controller.sign_up(&registration).await?;
    match state.profile() {
        Some(profile) => println!("Welcome, {}", profile.display_label()),
        None => println!("Account created; sign in with `nutri login {}`", email),
    }
    Ok(())
}

fn logout(config: Config) -> Result<()> {
    let host = Host::new(config, HOME_PAGE)?;
    if !host.api.has_credential() {
        println!("Not signed in");
        return Ok(());
    }
    host.api.logout();
    println!("Signed out");
    Ok(())
}

async fn whoami(config: Config) -> Result<()> {
    let host = Host::new(config, HOME_PAGE)?;
    match host.api.me().await {
        Ok(Some(profile)) if host.api.has_credential() => {
            println!("{}", profile.display_label());
            if let Some(email) = profile.email() {
                println!("{}", email);
            }
        }
        Ok(_) | Err(ApiError::Unauthorized { .. }) => println!("Not signed in"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn profile(config: Config) -> Result<()> {
    let host = Host::new(config, "/profile.html")?;
    let (profile, preferences) =
        try_join(host.api.get_profile(), host.api.get_preferences()).await?;

    let profile = profile.map(|p| p.into_value()).unwrap_or_default();
    println!("{}", serde_json::to_string_pretty(&profile)?);
    match preferences {
        Some(preferences) => println!("{}", serde_json::to_string_pretty(&preferences)?),
        None => println!("No preferences saved"),
    }
    Ok(())
}

async fn recommendations(config: Config, limit: &str) -> Result<()> {
    let limit: u32 = limit
        .parse()
        .with_context(|| format!("Invalid limit: {}", limit))?;
    let limit = limit.to_string();
    let host = Host::new(config, "/myplan.html")?;
    let items = host
        .api
        .list_recommendations(&[("limit", limit.as_str())])
        .await?;

    if items.is_empty() {
        println!("No recommendations yet");
    }
    for item in items {
        let id = item.id.as_ref().map(RecordId::as_str).unwrap_or("-");
        let meal = item.meal.as_ref().map(|m| m.display_name()).unwrap_or("-");
        let slot = item.plan_slot.as_ref().map(PlanSlot::label).unwrap_or("-");
        let status = item.status.as_deref().unwrap_or("-");
        println!("{:<10} {:<32} {:<10} {}", id, meal, slot, status);
    }
    Ok(())
}

async fn meal(config: Config, id: &str) -> Result<()> {
    let host = Host::new(config, HOME_PAGE)?;
    match host.api.get_meal(&RecordId::new(id)).await? {
        Some(meal) => {
            println!("{}", meal.display_name());
            println!("{}", meal.macro_summary());
            if let Some(description) = meal.description.as_deref() {
                println!("\n{}", description);
            }
        }
        None => println!("Meal not found"),
    }
    Ok(())
}

/// Hold a session open on `page` until it ends.
async fn watch(config: Config, page: &str) -> Result<()> {
    let host = Host::new(config, page)?;
    let (controller, feed) = controller_for(&host);
    let mut states = controller.subscribe();

    let state = controller.load().await;
    let Some(profile) = state.profile() else {
        println!("Not signed in");
        return Ok(());
    };
    println!(
        "Signed in as {} on {}; signing out after {} minutes without input",
        profile.display_label(),
        host.redirector.current_path(),
        host.config.inactivity_window().as_secs() / 60
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut reading = true;
    loop {
        tokio::select! {
            line = lines.next_line(), if reading => match line {
                Ok(Some(_)) => {
                    feed.emit(Activity::KeyDown);
                }
                Ok(None) => reading = false,
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    reading = false;
                }
            },
            changed = states.changed() => {
                if changed.is_err() || !states.borrow_and_update().is_authenticated() {
                    break;
                }
            }
        }
    }

    println!("Session ended");
    Ok(())
}
