use anyhow::{Context, Result};
use augur_client::prelude::*;
use clap::Parser;
use cli::{Cli, Commands, SettingsAction, ThemeArg, TraceLevel};
use colored::Colorize;
use dotenv::dotenv;
use serde::Serialize;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, error, info, subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

mod cli;
mod ui;

fn preprocess(trace_level: Level) {
    dotenv().ok();
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .with_writer(std::io::stderr)
        .finish();
    if subscriber::set_global_default(my_subscriber).is_err() {
        eprintln!("tracing subscriber was already set");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.trace {
        TraceLevel::DEBUG => Level::DEBUG,
        TraceLevel::INFO => Level::INFO,
        TraceLevel::WARN => Level::WARN,
        TraceLevel::ERROR => Level::ERROR,
    };

    preprocess(log_level);
    trace!("Command line input recorded: {cli:#?}");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ErrorKind>() {
                Some(kind) => eprintln!("{}", ui::error_line(kind)),
                None => eprintln!("{}", format!("error: {e:#}").red().bold()),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let store = JsonFileStore::new(&cli.settings);

    // cli framework:
    // "> augur <COMMAND>"
    match &cli.command {
        // "> augur predict <SYMBOL>"
        Commands::Predict { symbol } => {
            let dashboard = connect(&cli, &store).await?;
            let comparison = with_spinner("Fetching forecasts", dashboard.get_prediction(symbol)).await?;
            emit(cli.json, &comparison, ui::print_comparison)?;
        }

        // "> augur compare <SYMBOL>"
        Commands::Compare { symbol } => {
            let dashboard = connect(&cli, &store).await?;
            let comparison = with_spinner("Comparing models", dashboard.compare_models(symbol)).await?;
            emit(cli.json, &comparison, ui::print_comparison)?;
        }

        // "> augur past-trends"
        Commands::PastTrends => {
            let dashboard = connect(&cli, &store).await?;
            let series = with_spinner("Fetching past trends", dashboard.get_past_trends()).await?;
            emit(cli.json, &series, |series| print_all(series, "past trends"))?;
        }

        // "> augur realtime"
        Commands::Realtime => {
            let dashboard = connect(&cli, &store).await?;
            let series = with_spinner("Fetching realtime prices", dashboard.get_realtime()).await?;
            emit(cli.json, &series, |series| print_all(series, "realtime prices"))?;
        }

        // "> augur watch [--interval N] [--count N]"
        // poll the realtime feed, one block of output per update
        Commands::Watch { interval, count } => {
            let dashboard = connect(&cli, &store).await?;
            let every = interval
                .map(|secs| Duration::from_secs(secs.max(1)))
                .unwrap_or_else(|| dashboard.settings().refresh_interval());
            watch(&dashboard, every, *count, cli.json).await?;
        }

        // "> augur risk <SYMBOL>"
        Commands::Risk { symbol } => {
            let dashboard = connect(&cli, &store).await?;
            let risk = with_spinner("Scoring risk", dashboard.get_risk_score(symbol)).await?;
            emit(cli.json, &risk, ui::print_risk)?;
        }

        // "> augur events"
        Commands::Events => {
            let dashboard = connect(&cli, &store).await?;
            let events = with_spinner("Fetching event impacts", dashboard.get_event_impacts()).await?;
            emit(cli.json, &events, |events| ui::print_events(events))?;
        }

        // "> augur narrative <SYMBOL>"
        Commands::Narrative { symbol } => {
            let dashboard = connect(&cli, &store).await?;
            let text = with_spinner("Fetching narrative", dashboard.get_narrative(symbol)).await?;
            emit(cli.json, &text, |text| {
                if text.trim().is_empty() {
                    println!("{}", ui::no_data("narrative"));
                } else {
                    println!("{text}");
                }
            })?;
        }

        // "> augur tracker"
        Commands::Tracker => {
            let dashboard = connect(&cli, &store).await?;
            let rows = with_spinner("Fetching tracker", dashboard.get_tracker()).await?;
            emit(cli.json, &rows, |rows| ui::print_tracker(rows))?;
        }

        // "> augur settings [show set]"
        // never touches the backend
        Commands::Settings { action } => {
            settings(&store, action, cli.json).await?;
        }
    }

    Ok(())
}

async fn connect(cli: &Cli, store: &JsonFileStore) -> Result<Dashboard> {
    let mut config = TransportConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config = config.with_base_url(url)?;
    }
    info!("Using backend at {}", config.base_url);

    let saved = store.load().await?;
    Ok(Dashboard::connect(&config)?.with_settings(saved))
}

async fn with_spinner<T, F>(msg: &str, fut: F) -> augur_client::Result<T>
where
    F: std::future::Future<Output = augur_client::Result<T>>,
{
    let pb = ui::spinner(msg);
    let outcome = fut.await;
    pb.finish_and_clear();
    outcome
}

fn emit<T, F>(json: bool, value: &T, print: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(&T),
{
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print(value);
    }
    Ok(())
}

fn print_all(series: &[TimeSeries], what: &str) {
    if series.is_empty() {
        println!("{}", ui::no_data(what));
    }
    for s in series {
        ui::print_series(s);
    }
}

async fn watch(dashboard: &Dashboard, every: Duration, count: Option<usize>, json: bool) -> Result<()> {
    let mut session = dashboard.poll_realtime_every(every);
    info!("Polling realtime prices every {}s", every.as_secs());
    session.start();

    let mut seen = 0;
    let mut failure = None;
    let polling = session.subscribe(|session, update| {
        seen += 1;
        debug!("Update #{} (seq {})", seen, update.seq);

        match &update.error {
            Some(e) => {
                error!("Realtime fetch failed: {e}");
                eprintln!("{}", ui::error_line(e));
                failure = Some(e.clone());
            }
            None => failure = None,
        }

        if json {
            match serde_json::to_string(&update.data) {
                Ok(line) => println!("{line}"),
                Err(e) => error!("Could not encode update: {e}"),
            }
        } else if let Some(series) = &update.data {
            println!("{}", format!("-- update {} --", update.seq).dimmed());
            print_all(series, "realtime prices");
        } else {
            println!("{}", ui::no_data("realtime prices"));
        }

        if count.is_some_and(|limit| seen >= limit) {
            session.stop();
        }
    });

    tokio::select! {
        _ = polling => trace!("Polling finished"),
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

async fn settings(store: &JsonFileStore, action: &SettingsAction, json: bool) -> Result<()> {
    let mut current = store
        .load()
        .await
        .with_context(|| format!("reading {}", store.path().display()))?;

    if let SettingsAction::Set { theme, refresh } = action {
        if let Some(theme) = theme {
            current.theme = match theme {
                ThemeArg::Light => Theme::Light,
                ThemeArg::Dark => Theme::Dark,
            };
        }
        if let Some(refresh) = refresh {
            current.refresh_interval_seconds = *refresh;
        }
        store.save(&current).await?;
        info!("Saved settings to {}", store.path().display());
    }

    emit(json, &current, |s| {
        println!("theme            {:?}", s.theme);
        println!("refresh interval {}s", s.refresh_interval_seconds);
    })
}
