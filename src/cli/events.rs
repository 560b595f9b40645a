use crate::config::data_dir;
use crate::counter::Counter;
use crate::report::{count_for_days, today_count, DASHBOARD_DAYS};
use crate::timestamp::now_local;
use crate::types::{Event, Notification};
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;

/// Run the init command
pub fn run_init(path: Option<&str>) -> Result<(), String> {
    let path = path.map(PathBuf::from).unwrap_or_else(data_dir);

    if path.join("events.db").exists() {
        return Err(format!("Already initialized at {}", path.display()));
    }

    let counter = Counter::init(&path)?;
    println!("Initialized prompt counter at {}", counter.data_path().display());

    Ok(())
}

/// Run the ingest command - handle a single JSON message
pub fn run_ingest(message: Option<&str>, origin: Option<i64>) -> Result<(), String> {
    let mut counter = Counter::open()?;

    let raw = match message {
        Some(m) => m.to_string(),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("Failed to read message: {}", e))?;
            buf
        }
    };

    let response = counter.respond(&raw, origin);
    let json =
        serde_json::to_string(&response).map_err(|e| format!("Failed to serialize: {}", e))?;
    println!("{}", json);

    Ok(())
}

/// Run the listen command - one JSON message per stdin line, one reply per line.
///
/// A single counter serves the whole session so duplicate detections across
/// messages are collapsed.
pub fn run_listen(origin: Option<i64>) -> Result<(), String> {
    let mut counter = Counter::open()?;
    log::info!("Listening for messages on stdin");

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line.map_err(|e| format!("Failed to read message: {}", e))?;
        if line.trim().is_empty() {
            continue;
        }

        let response = counter.respond(&line, origin);
        let json = serde_json::to_string(&response)
            .map_err(|e| format!("Failed to serialize: {}", e))?;
        writeln!(stdout, "{}", json).map_err(|e| format!("Failed to write reply: {}", e))?;
        stdout
            .flush()
            .map_err(|e| format!("Failed to write reply: {}", e))?;
    }

    log::info!("Input closed, stopping");
    Ok(())
}

/// Run the count command - record a manual +1
pub fn run_count(tool: &str) -> Result<(), String> {
    let mut counter = Counter::open()?;

    let notification = Notification::ManualCount {
        tool: tool.to_string(),
    };
    let id = counter
        .handle_notification(&notification, None)
        .map_err(|e| e.to_string())?;

    match id {
        Some(id) => println!("Counted {} [{}]", tool, id),
        None => println!("Already counted."),
    }

    let today = today_count(&counter.events(), now_local().date());
    let week = count_for_days(counter.store(), DASHBOARD_DAYS);
    println!("Today: {}  Last {} days: {}", today, DASHBOARD_DAYS, week);

    Ok(())
}

/// Run the list command
pub fn run_list(limit: usize) -> Result<(), String> {
    let counter = Counter::open()?;
    let events = counter.events();

    if events.is_empty() {
        println!("No events yet.");
        return Ok(());
    }

    let skip = events.len().saturating_sub(limit);
    for e in events.iter().skip(skip).rev() {
        print_event(e);
    }

    Ok(())
}

/// Run the reset command - delete every stored event
pub fn run_reset(force: bool) -> Result<(), String> {
    let mut counter = Counter::open()?;
    let total = counter.events().len();

    if !force {
        print!("Delete all {} events? This cannot be undone. [y/N] ", total);
        io::stdout()
            .flush()
            .map_err(|e| format!("Failed to prompt: {}", e))?;

        let mut input = String::new();
        io::stdin()
            .read_line(&mut input)
            .map_err(|e| format!("Failed to read answer: {}", e))?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    counter
        .delete_all()
        .map_err(|e| format!("Failed to delete events: {}", e))?;
    println!("Deleted {} events.", total);

    Ok(())
}

fn print_event(e: &Event) {
    let label = e.tool_kind().map(|t| t.label()).unwrap_or(e.tool.as_str());
    println!("{}  {:8} {:7} {}", e.timestamp, label, e.source, e.id);
}
