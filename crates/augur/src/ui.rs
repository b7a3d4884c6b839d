use augur_client::prelude::*;
use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn error_line(err: &ErrorKind) -> ColoredString {
    let hint = match err.kind() {
        ErrorClass::Network => "is the backend running?",
        ErrorClass::Timeout => "the backend is slow to respond",
        ErrorClass::ServerError => "the backend rejected the request",
        ErrorClass::Malformed => "the backend sent something unexpected",
    };
    format!("error: {err} ({hint})").red().bold()
}

pub fn no_data(what: &str) -> ColoredString {
    format!("no {what} available").dimmed()
}

pub fn bucket(bucket: RiskBucket) -> ColoredString {
    let text = bucket.to_string();
    match bucket {
        RiskBucket::Low => text.green(),
        RiskBucket::Moderate => text.yellow(),
        RiskBucket::High => text.red(),
    }
}

pub fn severity(severity: Severity) -> ColoredString {
    let text = format!("{severity:?}");
    match severity {
        Severity::Low => text.green(),
        Severity::Medium => text.yellow(),
        Severity::High => text.red(),
    }
}

pub fn value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:>12.2}"),
        None => format!("{:>12}", "-"),
    }
}

pub fn print_series(series: &TimeSeries) {
    println!("{}", series.label.bold());
    if series.is_empty() {
        println!("  {}", no_data("points"));
        return;
    }
    for point in &series.points {
        println!("  {:<25} {}", point.timestamp, value(point.value));
    }
}

pub fn print_comparison(comparison: &ModelComparison) {
    let header = format!("{} ({} models)", comparison.symbol, comparison.series.len());
    println!("{}", header.bold());
    if comparison.partial {
        println!("{}", "partial result: model series were truncated to a common length".yellow());
    }
    if comparison.is_empty() {
        println!("{}", no_data("forecasts"));
        return;
    }

    // one row per date, one column per model
    let axis = comparison
        .series
        .values()
        .find(|s| !s.is_empty())
        .map(|s| s.timestamps().map(str::to_string).collect::<Vec<_>>())
        .unwrap_or_default();

    print!("{:<25}", "date");
    for model in comparison.models() {
        print!(" {:>12}", model.as_str());
    }
    println!();

    for (row, date) in axis.iter().enumerate() {
        print!("{date:<25}");
        for series in comparison.series.values() {
            let v = series.points.get(row).and_then(|p| p.value);
            print!(" {}", value(v));
        }
        println!();
    }
}

pub fn print_tracker(rows: &[TrackerRow]) {
    if rows.is_empty() {
        println!("{}", no_data("tracking data"));
        return;
    }
    println!(
        "{:<12} {:>12} {:>12} {:>12}",
        "date".bold(),
        "predicted".bold(),
        "actual".bold(),
        "error %".bold()
    );
    for row in rows {
        println!(
            "{:<12} {} {} {}",
            row.date,
            value(row.predicted),
            value(row.actual),
            if row.is_pending() {
                format!("{:>12}", "pending").dimmed().to_string()
            } else {
                value(row.error_percent)
            }
        );
    }
}

pub fn print_events(events: &[EventImpact]) {
    if events.is_empty() {
        println!("{}", no_data("event impacts"));
        return;
    }
    for event in events {
        let arrow = if event.is_positive() { "▲".green() } else { "▼".red() };
        println!(
            "{} {} [{}] {} {}",
            arrow,
            event.title.as_deref().unwrap_or("Untitled event").bold(),
            severity(event.severity),
            event
                .impact
                .map(|i| format!("{i:+.2}"))
                .unwrap_or_else(|| "n/a".to_string()),
            event.timestamp.as_deref().unwrap_or("--").dimmed()
        );
    }
}

pub fn print_risk(risk: &RiskAssessment) {
    println!(
        "{} risk score {:.1}: {} ({})",
        risk.symbol.bold(),
        risk.score,
        bucket(risk.bucket),
        risk.bucket.description()
    );
}
