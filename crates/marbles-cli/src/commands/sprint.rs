use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;

use chrono::{Local, Utc};
use clap::Subcommand;
use marbles_core::settings::SettingsStore;
use marbles_core::{Phase, SprintEngine, SprintEvent};

/// Poll cadence for the foreground countdown, same as the desktop host.
const POLL_MS: u64 = 250;

#[derive(Subcommand)]
pub enum SprintAction {
    /// Run a sprint in the foreground, printing the countdown
    Run {
        /// Sprint length in minutes (defaults to the saved SprintTime)
        #[arg(long, allow_hyphen_values = true)]
        sprint: Option<String>,
        /// Rest length in minutes (defaults to the saved RestTime)
        #[arg(long, allow_hyphen_values = true)]
        rest: Option<String>,
        /// Time multiplier for trying out the system quickly
        #[arg(long, default_value_t = 1.0)]
        time_scale: f64,
    },
    /// Print an idle status snapshot as JSON
    Status,
    /// Show how many marbles are done today
    Done,
}

pub fn run(action: SprintAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SprintAction::Run {
            sprint,
            rest,
            time_scale,
        } => run_sprint(sprint, rest, time_scale),
        SprintAction::Status => {
            let mut engine = SprintEngine::new();
            let snapshot = engine.status(Utc::now());
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(())
        }
        SprintAction::Done => {
            let mut store = SettingsStore::open_default()?;
            store.load(Utc::now());
            println!("{}", done_summary(store.record(), &today_string()));
            Ok(())
        }
    }
}

fn run_sprint(
    sprint: Option<String>,
    rest: Option<String>,
    time_scale: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = SettingsStore::open_default()?;
    store.load(Utc::now());

    let sprint_text = sprint.unwrap_or_else(|| store.record().sprint_time.clone());
    let rest_text = rest.unwrap_or_else(|| store.record().rest_time.clone());

    // The engine assumes clean inputs; validation happens here, at the point
    // of starting a run.
    let sprint_min = parse_minutes("sprint", &sprint_text)?;
    let rest_min = parse_minutes("rest", &rest_text)?;
    if sprint_min <= 0.0 {
        return Err("sprint must be longer than zero minutes".into());
    }
    if rest_min < 0.0 {
        return Err("rest cannot be negative".into());
    }

    // Remember what the user asked for, as typed.
    store.record_mut().sprint_time = sprint_text;
    store.record_mut().rest_time = rest_text;
    store.save(Utc::now());

    let mut engine = SprintEngine::new();
    engine.set_time_scale(time_scale);

    let completed = Rc::new(Cell::new(false));
    let flag = Rc::clone(&completed);
    engine.subscribe(move |event| {
        if matches!(event, SprintEvent::Completed { .. }) {
            flag.set(true);
        }
    });

    engine.start(sprint_min * 60.0, rest_min * 60.0, Utc::now());
    println!("Sprint started: {sprint_min} min deep work, {rest_min} min rest.");

    let mut last_phase = Phase::Working;
    loop {
        std::thread::sleep(std::time::Duration::from_millis(POLL_MS));
        let now = Utc::now();
        store.pump(now);
        let status = engine.status(now);

        if status.phase != last_phase {
            match status.phase {
                Phase::Resting => println!("\nDeep work done. Rest."),
                Phase::Elapsed => println!("\nDone."),
                _ => {}
            }
            last_phase = status.phase;
        }

        match status.phase {
            Phase::Working => print_countdown("Deep Work", status.seconds_remaining),
            Phase::Resting => print_countdown("Rest", status.seconds_remaining),
            Phase::Elapsed | Phase::Idle => break,
        }
    }

    if completed.get() {
        record_marble(&mut store, &today_string());
    }
    Ok(())
}

fn print_countdown(label: &str, seconds_remaining: f64) {
    print!("\r{label} {}   ", format_countdown(seconds_remaining));
    let _ = std::io::stdout().flush();
}

/// Caller-side validation of user-typed duration text.
fn parse_minutes(label: &str, text: &str) -> Result<f64, String> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| format!("{label} is not a number: '{text}'"))
}

/// mm:ss, rounding up like the desktop timer label.
fn format_countdown(seconds_remaining: f64) -> String {
    let seconds = seconds_remaining.max(0.0).ceil() as i64;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn today_string() -> String {
    Local::now().format("%m/%d/%Y").to_string()
}

fn done_summary(record: &marbles_core::SettingsRecord, today: &str) -> String {
    let done = if record.date_today == today {
        record.marbles_done_today
    } else {
        0
    };
    if done == 0 {
        "No marbles done yet today.".to_string()
    } else {
        format!("{done} marble{} done.", if done == 1 { "" } else { "s" })
    }
}

/// Roll the daily counter, resetting it when the saved date is stale, and
/// persist the result.
fn record_marble(store: &mut SettingsStore, today: &str) {
    let record = store.record_mut();
    if record.date_today != today {
        record.date_today = today.to_string();
        record.marbles_done_today = 0;
    }
    record.marbles_done_today += 1;
    let done = record.marbles_done_today;
    store.save(Utc::now());
    println!("{done} marble{} done today.", if done == 1 { "" } else { "s" });
}
