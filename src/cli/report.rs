use crate::counter::Counter;
use crate::report::{export_file_name, summarize, to_csv, today_count, MAX_REPORT_DAYS};
use crate::timestamp::now_local;
use std::fs;
use std::io::{self, Write};

/// Run the today command
pub fn run_today() -> Result<(), String> {
    let counter = Counter::open()?;
    let count = today_count(&counter.events(), now_local().date());
    println!("{}", count);
    Ok(())
}

/// Run the stats command - the dashboard view
pub fn run_stats(days: i64, json: bool) -> Result<(), String> {
    if !(1..=MAX_REPORT_DAYS).contains(&days) {
        return Err(format!("Days must be between 1 and {}", MAX_REPORT_DAYS));
    }

    let counter = Counter::open()?;
    let summary = summarize(counter.store(), days);

    if json {
        let out = serde_json::to_string_pretty(&summary)
            .map_err(|e| format!("Failed to serialize: {}", e))?;
        println!("{}", out);
        return Ok(());
    }

    println!("Prompt Statistics");
    println!("=================\n");

    println!("Today:        {}", summary.today);
    println!("Last {} days: {}", days, summary.window_total);

    println!("\nPer day:");
    let peak = summary.daily.iter().map(|d| d.count).max().unwrap_or(0);
    for day in &summary.daily {
        println!("  {}  {:5}  {}", day.date, day.count, bar(day.count, peak));
    }

    println!("\nPer tool:");
    for entry in &summary.by_tool {
        println!("  {:10} {}", entry.tool.label(), entry.count);
    }

    Ok(())
}

fn bar(count: usize, peak: usize) -> String {
    const WIDTH: usize = 30;
    if peak == 0 {
        return String::new();
    }
    "#".repeat((count * WIDTH).div_ceil(peak))
}

/// Run the export command
pub fn run_export(output: Option<&str>, stdout: bool) -> Result<(), String> {
    let counter = Counter::open()?;
    let events = counter.events();
    let csv = to_csv(&events);

    if stdout {
        let mut out = io::stdout().lock();
        out.write_all(csv.as_bytes())
            .and_then(|_| out.write_all(b"\n"))
            .map_err(|e| format!("Failed to write CSV: {}", e))?;
        return Ok(());
    }

    let path = output
        .map(|p| p.to_string())
        .unwrap_or_else(|| export_file_name(now_local()));
    fs::write(&path, csv).map_err(|e| format!("Failed to write {}: {}", path, e))?;

    println!("Exported {} events to {}", events.len(), path);
    Ok(())
}
