mod autocomplete;
mod client;
mod config;
mod error;
mod formatting;
mod history;
mod models;
mod orchestrator;
mod render;
mod signal;
mod storage;
#[cfg(test)]
mod testing;
mod utils;
mod view;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::autocomplete::runtime::{AutocompleteRuntime, InputEvent};
use crate::autocomplete::{Key, TickerInput};
use crate::client::{AnalysisService, HttpAnalysisClient};
use crate::config::AppConfig;
use crate::history::HistoryStore;
use crate::models::Period;
use crate::orchestrator::AnalysisOrchestrator;
use crate::storage::{KeyValueStore, MemoryStore, Repository};
use crate::view::terminal::TerminalView;
use crate::view::DashboardView;

type Store = Box<dyn KeyValueStore>;
type Orchestrator = AnalysisOrchestrator<HttpAnalysisClient, TerminalView, Store>;

#[derive(Parser)]
#[command(name = "whichticker", about = "Pairwise security comparison dashboard", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Keep history in memory instead of the DuckDB file
    #[arg(long, global = true)]
    memory: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Compare two tickers once
    Analyze {
        ticker_a: String,
        ticker_b: String,
        /// Lookback: 1mo, 3mo, 6mo, 1y, 2y, 5y
        #[arg(short, long, default_value = "1y")]
        period: Period,
    },

    /// Look up ticker symbols
    Search { query: String },

    /// Show recent comparisons
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },

    /// Line-driven dashboard session
    Interactive,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Delete one entry
    Remove { index: usize },
    /// Re-run one entry with its stored period
    Replay { index: usize },
}

fn lock<V>(m: &Mutex<V>) -> MutexGuard<'_, V> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn open_store(config: &AppConfig, memory: bool) -> Result<Store> {
    if memory {
        return Ok(Box::new(MemoryStore::new()));
    }
    let repo = Repository::open(&config.storage.db_path)
        .with_context(|| format!("opening {:?}", config.storage.db_path))?;
    repo.run_migrations().context("applying storage schema")?;
    Ok(Box::new(repo))
}

async fn analyze<S, V, K>(orchestrator: &AnalysisOrchestrator<S, V, K>, a: &str, b: &str, period: Period) -> Result<()>
where
    S: AnalysisService,
    V: DashboardView,
    K: KeyValueStore,
{
    orchestrator
        .submit(a, b, period)
        .await
        .with_context(|| format!("analysis {} vs {} failed", a, b))?;
    Ok(())
}

async fn replay<S, V, K>(orchestrator: &AnalysisOrchestrator<S, V, K>, index: usize) -> Result<()>
where
    S: AnalysisService,
    V: DashboardView,
    K: KeyValueStore,
{
    let Some(entry) = orchestrator.history_entry(index) else {
        println!("No history entry at index {}", index);
        return Ok(());
    };
    orchestrator
        .replay(&entry)
        .await
        .with_context(|| format!("replaying {} vs {} failed", entry.ticker_a, entry.ticker_b))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "whichticker=info,warn",
        1 => "whichticker=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;
    let service = Arc::new(HttpAnalysisClient::new(&config.api).context("building HTTP client")?);
    let view = Arc::new(Mutex::new(TerminalView::new()));
    let history = HistoryStore::new(open_store(&config, cli.memory)?, config.storage.history_key.clone());
    let orchestrator: Arc<Orchestrator> = Arc::new(AnalysisOrchestrator::new(
        Arc::clone(&service),
        Arc::clone(&view),
        history,
        config.charts.clone(),
    ));

    match cli.command {
        Command::Analyze { ticker_a, ticker_b, period } => {
            analyze(&orchestrator, &ticker_a, &ticker_b, period).await?;
        }

        Command::Search { query } => {
            let mut runtime = AutocompleteRuntime::new(service, config.autocomplete.clone());
            runtime.handle_input(InputEvent::Text(TickerInput::A, query), &mut *lock(&view));
            while !runtime.is_settled() {
                let Some(event) = runtime.next_event().await else { break };
                runtime.apply(event, &mut *lock(&view));
            }
        }

        Command::History { action: None } => {
            orchestrator.refresh_history();
        }

        Command::History { action: Some(HistoryAction::Remove { index }) } => {
            match orchestrator.remove_history(index) {
                Some(e) => info!("Removed {} vs {} ({})", e.ticker_a, e.ticker_b, e.period),
                None => println!("No history entry at index {}", index),
            }
        }

        Command::History { action: Some(HistoryAction::Replay { index }) } => {
            replay(&orchestrator, index).await?;
        }

        Command::Interactive => interactive(orchestrator, service, view, &config).await?,
    }

    Ok(())
}

// ── Interactive session ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum ReplCommand {
    Input(InputEvent),
    Period(Period),
    Go,
    History,
    Remove(usize),
    Replay(usize),
    Help,
    Quit,
}

const HELP: &str = "a|b <text>  focus|blur a|b  down|up|enter|esc [a|b]  pick <i> [a|b]  click
period <1mo|3mo|6mo|1y|2y|5y>  go  history  rm <i>  replay <i>  quit";

fn parse_input(word: Option<&str>, focused: TickerInput) -> Result<TickerInput, String> {
    match word.map(str::to_ascii_lowercase).as_deref() {
        None => Ok(focused),
        Some("a") => Ok(TickerInput::A),
        Some("b") => Ok(TickerInput::B),
        Some(other) => Err(format!("unknown input '{}'", other)),
    }
}

fn parse_index(word: Option<&str>) -> Result<usize, String> {
    word.ok_or_else(|| "missing index".to_string())?
        .parse()
        .map_err(|e| format!("bad index: {}", e))
}

fn parse_command(line: &str, focused: TickerInput) -> Result<ReplCommand, String> {
    let line = line.trim();
    let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
    let mut words = rest.split_whitespace();
    let (first, second) = (words.next(), words.next());

    let key = |k| parse_input(first, focused).map(|i| ReplCommand::Input(InputEvent::Key(i, k)));
    match head.to_ascii_lowercase().as_str() {
        "a" => Ok(ReplCommand::Input(InputEvent::Text(TickerInput::A, rest.to_string()))),
        "b" => Ok(ReplCommand::Input(InputEvent::Text(TickerInput::B, rest.to_string()))),
        "focus" => Ok(ReplCommand::Input(InputEvent::Focus(parse_input(first, focused)?))),
        "blur" => Ok(ReplCommand::Input(InputEvent::Blur(parse_input(first, focused)?))),
        "down" => key(Key::Down),
        "up" => key(Key::Up),
        "enter" => key(Key::Enter),
        "esc" => key(Key::Escape),
        "pick" => {
            let index = parse_index(first)?;
            Ok(ReplCommand::Input(InputEvent::Pick(parse_input(second, focused)?, index)))
        }
        "click" => Ok(ReplCommand::Input(InputEvent::OutsideClick)),
        "period" => first
            .ok_or_else(|| "missing period".to_string())?
            .parse()
            .map(ReplCommand::Period),
        "go" => Ok(ReplCommand::Go),
        "history" => Ok(ReplCommand::History),
        "rm" => parse_index(first).map(ReplCommand::Remove),
        "replay" => parse_index(first).map(ReplCommand::Replay),
        "help" | "?" => Ok(ReplCommand::Help),
        "quit" | "exit" => Ok(ReplCommand::Quit),
        other => Err(format!("unknown command '{}'", other)),
    }
}

fn spawn_submit(orchestrator: &Arc<Orchestrator>, ticker_a: String, ticker_b: String, period: Period) {
    let orchestrator = Arc::clone(orchestrator);
    tokio::spawn(async move {
        if let Err(e) = orchestrator.submit(&ticker_a, &ticker_b, period).await {
            warn!("Analysis {} vs {} ended with {} error: {}", ticker_a, ticker_b, e.kind(), e);
        }
    });
}

async fn interactive(
    orchestrator: Arc<Orchestrator>,
    service: Arc<HttpAnalysisClient>,
    view: Arc<Mutex<TerminalView>>,
    config: &AppConfig,
) -> Result<()> {
    let mut runtime = AutocompleteRuntime::new(service, config.autocomplete.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut focused = TickerInput::A;
    let mut period = Period::default();

    println!("{}", HELP);
    orchestrator.refresh_history();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let command = match parse_command(&line, focused) {
                    Ok(c) => c,
                    Err(e) => {
                        println!("  {}", e);
                        continue;
                    }
                };
                match command {
                    ReplCommand::Input(event) => {
                        if let InputEvent::Text(i, _) | InputEvent::Focus(i) = &event {
                            focused = *i;
                        }
                        if runtime.handle_input(event, &mut *lock(&view)) {
                            let (a, b) = runtime.values();
                            spawn_submit(&orchestrator, a, b, period);
                        }
                    }
                    ReplCommand::Period(p) => {
                        period = p;
                        println!("  period = {}", p.label());
                    }
                    ReplCommand::Go => {
                        let (a, b) = runtime.values();
                        spawn_submit(&orchestrator, a, b, period);
                    }
                    ReplCommand::History => {
                        orchestrator.refresh_history();
                    }
                    ReplCommand::Remove(index) => {
                        if orchestrator.remove_history(index).is_none() {
                            println!("  no history entry at {}", index);
                        }
                    }
                    ReplCommand::Replay(index) => {
                        let Some(entry) = orchestrator.history_entry(index) else {
                            println!("  no history entry at {}", index);
                            continue;
                        };
                        {
                            let mut v = lock(&view);
                            runtime.set_value(TickerInput::A, &entry.ticker_a, &mut *v);
                            runtime.set_value(TickerInput::B, &entry.ticker_b, &mut *v);
                        }
                        match entry.period.parse() {
                            Ok(p) => period = p,
                            Err(e) => warn!("Stored period unusable: {}", e),
                        }
                        spawn_submit(&orchestrator, entry.ticker_a, entry.ticker_b, period);
                    }
                    ReplCommand::Help => println!("{}", HELP),
                    ReplCommand::Quit => break,
                }
            }
            Some(event) = runtime.next_event() => {
                if runtime.apply(event, &mut *lock(&view)) {
                    let (a, b) = runtime.values();
                    spawn_submit(&orchestrator, a, b, period);
                }
            }
        }
    }

    Ok(())
}
