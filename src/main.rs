mod api;
mod app;
mod config;
mod error;
mod form;
mod model;
mod theme;
mod ui;
mod view;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{ApiClient, ApiStatus};
use app::{App, Popup};
use config::AppConfig;
use form::FormState;
use model::{InputData, ModelConfig};
use view::ResultView;

#[derive(Parser, Debug)]
#[command(name = "modelform")]
#[command(version)]
#[command(about = "A terminal form client for ML prediction APIs")]
struct Args {
    /// Base URL of the prediction API (overrides MODELFORM_API_URL and the config file)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Output API status as JSON
    #[arg(short, long)]
    status: bool,

    /// Print the model configuration served by the API
    #[arg(long)]
    show_config: bool,

    /// Run a single prediction from NAME=VALUE pairs
    #[arg(short, long, value_name = "NAME=VALUE", num_args = 0..)]
    predict: Option<Vec<String>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (stderr, so it stays out of piped JSON output)
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let settings = AppConfig::load().unwrap_or_default();
    let api_url = settings.resolve_api_url(args.api_url.as_deref());
    tracing::debug!("Using API at {}", api_url);
    let client = ApiClient::new(api_url)?;

    // Handle CLI-only commands
    if args.status {
        return print_status(&client).await;
    }

    if args.show_config {
        return print_config(&client).await;
    }

    if let Some(pairs) = args.predict {
        return predict_once(&client, &pairs).await;
    }

    // Run TUI
    run_tui(client).await
}

async fn print_status(client: &ApiClient) -> Result<()> {
    let status = match client.check_status().await {
        Ok(info) => ApiStatus::Connected(info),
        Err(e) => {
            tracing::warn!("{}", e);
            ApiStatus::Disconnected
        }
    };

    let (model, version) = match &status {
        ApiStatus::Connected(info) => (info.model.clone(), info.version.clone()),
        _ => (None, None),
    };

    let output = serde_json::json!({
        "connected": status.is_connected(),
        "api_url": client.base_url(),
        "model": model,
        "version": version,
    });

    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

async fn print_config(client: &ApiClient) -> Result<()> {
    let config = client.fetch_config().await?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

async fn predict_once(client: &ApiClient, pairs: &[String]) -> Result<()> {
    let config = client.fetch_config().await?;
    let input = fill_from_pairs(&config, pairs)?;
    let result = client.predict(&input).await?;

    let view = ResultView::new(&result, &input, &config);
    if view.unit == "$" {
        println!("{}{}", view.unit, view.value);
    } else {
        println!("{} {}", view.value, view.unit);
    }
    for (label, value) in &view.details {
        println!("  {}: {}", label, value);
    }
    Ok(())
}

/// Split a `NAME=VALUE` argument
fn parse_assignment(pair: &str) -> Result<(&str, &str)> {
    pair.split_once('=')
        .map(|(name, value)| (name.trim(), value.trim()))
        .filter(|(name, _)| !name.is_empty())
        .with_context(|| format!("Expected NAME=VALUE, got '{}'", pair))
}

/// Fill a fresh form from CLI pairs and run the same checks the TUI does
fn fill_from_pairs(config: &ModelConfig, pairs: &[String]) -> Result<InputData> {
    let mut form = FormState::build(config)?;

    for pair in pairs {
        let (name, value) = parse_assignment(pair)?;
        let index = config
            .features
            .iter()
            .position(|f| f.name == name)
            .with_context(|| {
                let known: Vec<&str> = config.features.iter().map(|f| f.name.as_str()).collect();
                format!("Unknown feature '{}' (expected one of: {})", name, known.join(", "))
            })?;
        form.set_text(&config.features[index], index, value)?;
    }

    let errors = form.validate(config);
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Invalid input:\n  {}", messages.join("\n  "));
    }

    Ok(form.collect(config)?)
}

async fn run_tui(client: ApiClient) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = App::new(client);

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    // Show "Checking API..." while the startup sequence runs
    terminal.draw(|f| ui::draw(f, &app.view(), app.popup))?;
    app.initialize().await;

    loop {
        terminal.draw(|f| ui::draw(f, &app.view(), app.popup))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('c') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        KeyCode::Char('q') | KeyCode::Esc
                            if app.popup == Popup::None && !app.editing_text() =>
                        {
                            return Ok(())
                        }
                        _ => app.handle_key(key).await,
                    }
                }
            }
        }

        // Collect finished predictions, expire the error banner
        app.tick();
    }
}
