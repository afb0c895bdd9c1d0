use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

use uclases_core::AppConfig;
use uclases_lookup::{
    AjaxClient, HttpMatchSource, HttpNotificationBackend, MatchSource, NotificationBackend,
};
use uclases_tui::{App, DemoMode, DemoOptions};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "uclases",
    about = "Server-backed autocomplete and notification widgets, headless",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format. Also enabled by setting UCLASES_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Query a lookup endpoint the way an autocomplete container would.
    Lookup {
        /// Endpoint URL, absolute or relative to `[lookup] base_url`.
        url: String,
        query: String,
        /// Maximum number of matches to print.
        #[arg(long)]
        max: Option<usize>,
    },

    /// Interactive terminal demo of one autocomplete container.
    Demo {
        #[arg(long, default_value = "/search/users")]
        url: String,
        #[arg(long, value_enum, default_value_t = ModeArg::Hidden)]
        mode: ModeArg,
        /// Submit the owning form after every selection.
        #[arg(long)]
        auto_submit: bool,
        /// Write logs here; without it the demo logs nothing.
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// POST a notification read-state form, as the page toggles do.
    Notify {
        /// Form action, absolute or relative to `[notifications] base_url`.
        action: String,
        /// Use the mark-all-as-read endpoint shape.
        #[arg(long)]
        all: bool,
        /// Form field as `name=value`; repeatable.
        #[arg(long = "field", value_parser = parse_field, action = clap::ArgAction::Append)]
        fields: Vec<(String, String)>,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Hidden,
    Single,
    Multi,
}

impl From<ModeArg> for DemoMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Hidden => DemoMode::Hidden,
            ModeArg::Single => DemoMode::Single,
            ModeArg::Multi => DemoMode::Multi,
        }
    }
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file location.
    Path,
    /// Show the effective configuration.
    Show,
    /// Write the default configuration to the config file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();
    let json_output = cli.json || std::env::var("UCLASES_JSON").as_deref() == Ok("1");
    let config = AppConfig::load()?;

    match cli.command {
        Commands::Lookup { url, query, max } => {
            init_logging(&config.logging.filter, LogSink::Stderr)?;
            let max = max.unwrap_or(config.autocomplete.max_results);
            let source = HttpMatchSource::new(&config.lookup.user_agent)?
                .with_base_url(&config.lookup.base_url);

            let mut items = source.lookup(&url, &query).await?;
            items.truncate(max);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": items, "total": items.len(), "query": query },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if items.is_empty() {
                println!("{}", config.autocomplete.empty_label);
            } else {
                for item in &items {
                    match item.visible_description() {
                        Some(description) => {
                            println!("{id:<10}  {label:<40}  {description}", id = item.id, label = item.label)
                        }
                        None => println!("{id:<10}  {label}", id = item.id, label = item.label),
                    }
                }
            }
        }

        Commands::Demo {
            url,
            mode,
            auto_submit,
            log_file,
        } => {
            let sink = match log_file.as_deref() {
                Some(path) => LogSink::File(path),
                None => LogSink::Off,
            };
            init_logging(&config.logging.filter, sink)?;
            let source = HttpMatchSource::new(&config.lookup.user_agent)?
                .with_base_url(&config.lookup.base_url);
            let mut app = App::new(
                Arc::new(source),
                DemoOptions {
                    url,
                    mode: mode.into(),
                    auto_submit,
                    defaults: config.autocomplete.clone(),
                },
            )?;
            tokio::task::block_in_place(|| uclases_tui::run_tui(&mut app))?;
            info!(submissions = app.submissions, "demo finished");
        }

        Commands::Notify {
            action,
            all,
            fields,
        } => {
            init_logging(&config.logging.filter, LogSink::Stderr)?;
            let client = AjaxClient::new(&config.lookup.user_agent)?;
            let backend = HttpNotificationBackend::new(client, &config.notifications.base_url);

            let data = if all {
                serde_json::to_value(backend.mark_all_read(&action, &fields).await?)?
            } else {
                serde_json::to_value(backend.toggle_read(&action, &fields).await?)?
            };
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":data,"meta":{"duration_ms":dur}}))?;
            } else {
                print_notify_reply(&data);
            }
        }

        Commands::Config { action } => {
            init_logging(&config.logging.filter, LogSink::Stderr)?;
            let path = AppConfig::config_path();
            match action {
                ConfigAction::Path => {
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":{"path":path}}))?;
                    } else {
                        println!("{}", path.display());
                    }
                }
                ConfigAction::Show => {
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":config}))?;
                    } else {
                        print!("{}", toml_string(&config)?);
                    }
                }
                ConfigAction::Init { force } => {
                    if path.exists() && !force {
                        bail!("{} already exists (use --force to overwrite)", path.display());
                    }
                    AppConfig::default().save_to(&path)?;
                    debug!(path = %path.display(), "default config written");
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":{"path":path}}))?;
                    } else {
                        println!("Wrote {}", path.display());
                    }
                }
            }
        }
    }

    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

enum LogSink<'a> {
    Stderr,
    File(&'a Path),
    /// The TUI owns the terminal.
    Off,
}

/// Install the fmt subscriber. `RUST_LOG` wins over the configured filter.
fn init_logging(default_filter: &str, sink: LogSink<'_>) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match sink {
        LogSink::Stderr => fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogSink::File(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        LogSink::Off => {}
    }
    Ok(())
}

fn parse_field(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => bail!("expected name=value, got `{raw}`"),
    }
}

fn print_notify_reply(data: &serde_json::Value) {
    let success = data["success"].as_bool().unwrap_or(false);
    if !success {
        let error = data["error"].as_str().unwrap_or("request rejected");
        println!("rejected: {error}");
        return;
    }
    match data.get("unread_count").and_then(|c| c.as_u64()) {
        Some(count) => {
            let state = if data["is_read"].as_bool().unwrap_or(false) { "read" } else { "unread" };
            println!("{state}, {count} unread");
            if let Some(url) = data["new_url"].as_str() {
                println!("next action: {url}");
            }
        }
        None => println!("all notifications marked as read"),
    }
}

fn toml_string(config: &AppConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}
