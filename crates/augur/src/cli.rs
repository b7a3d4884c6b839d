use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing
    #[arg(long, global = true, ignore_case = true, default_value = "INFO")]
    pub trace: TraceLevel,

    /// Base url of the analytics backend (overrides AUGUR_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Where user settings are kept
    #[arg(long, global = true, default_value = "./augur-settings.json")]
    pub settings: PathBuf,

    /// Print the normalized result as JSON instead of a table
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Forecasts from every model for one symbol.
    Predict { symbol: String },

    /// The four models side by side on one date axis.
    Compare { symbol: String },

    /// Historic model performance.
    PastTrends,

    /// One snapshot of the realtime feed.
    Realtime,

    /// Poll the realtime feed until interrupted.
    Watch {
        /// Seconds between polls (defaults to the saved refresh interval)
        #[arg(long)]
        interval: Option<u64>,

        /// Stop after this many updates
        #[arg(long)]
        count: Option<usize>,
    },

    /// Risk score and bucket for one symbol.
    Risk { symbol: String },

    /// Latest event impacts.
    Events,

    /// Narrative explanation for one symbol.
    Narrative { symbol: String },

    /// Prediction vs reality tracker.
    Tracker,

    /// Show or change saved settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    Show,
    Set {
        #[arg(long)]
        theme: Option<ThemeArg>,

        /// Realtime refresh interval in seconds (minimum 1)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        refresh: Option<u64>,
    },
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum ThemeArg {
    Light,
    Dark,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
#[value(rename_all = "UPPER")]
pub enum TraceLevel {
    DEBUG,
    INFO,
    WARN,
    ERROR,
}
