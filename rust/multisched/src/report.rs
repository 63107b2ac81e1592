//! Text report: execution chart, per-task table and averages.

use std::io::{self, Write};

use crate::engine::SimulationResult;
use crate::types::Tick;

const ID_COL: usize = 4;

/// Write the full report for a finished run.
pub fn write_report(result: &SimulationResult, out: &mut impl Write) -> io::Result<()> {
    write_chart(result, out)?;
    writeln!(out)?;
    write_table(result, out)?;
    writeln!(out)?;
    write_summary(result, out)
}

/// One row per task, one column per tick: `*` where the task ran.
///
/// A two-line ruler gives the tens and units digit of each absolute tick.
pub fn write_chart(result: &SimulationResult, out: &mut impl Write) -> io::Result<()> {
    let ticks: Vec<Tick> = (result.start..result.end).collect();

    let tens: String = ticks
        .iter()
        .map(|t| {
            if t % 10 == 0 {
                char::from_digit((t / 10) % 10, 10).unwrap_or('?')
            } else {
                ' '
            }
        })
        .collect();
    let units: String = ticks
        .iter()
        .map(|t| char::from_digit(t % 10, 10).unwrap_or('?'))
        .collect();
    writeln!(out, "{:ID_COL$}{}", "", tens.trim_end())?;
    writeln!(out, "{:ID_COL$}{}", "", units)?;

    for entry in result.trace.entries() {
        let row: String = entry
            .occupancy()
            .iter()
            .map(|b| if *b { '*' } else { ' ' })
            .collect();
        writeln!(out, "{:<ID_COL$}{}", entry.id.as_str(), row.trim_end())?;
    }
    Ok(())
}

fn opt(v: Option<Tick>) -> String {
    v.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Per-task input fields and derived times.
pub fn write_table(result: &SimulationResult, out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "{:<4}{:>6}{:>8}{:>9}{:>10}{:>10}{:>12}{:>9}",
        "ID", "Class", "Arrive", "Service", "Priority", "Complete", "Turnaround", "Waiting"
    )?;
    for s in &result.stats.tasks {
        writeln!(
            out,
            "{:<4}{:>6}{:>8}{:>9}{:>10}{:>10}{:>12}{:>9}",
            s.id.as_str(),
            s.class.code(),
            s.arrival,
            s.service,
            s.priority,
            opt(s.completion),
            opt(s.turnaround),
            opt(s.waiting),
        )?;
    }
    Ok(())
}

/// Averages and elapsed time.
pub fn write_summary(result: &SimulationResult, out: &mut impl Write) -> io::Result<()> {
    let stats = &result.stats;
    writeln!(out, "Average turnaround time: {:.2}", stats.avg_turnaround())?;
    writeln!(out, "Average waiting time:    {:.2}", stats.avg_waiting())?;
    writeln!(
        out,
        "Completed tasks:         {}/{}",
        stats.completed(),
        stats.tasks.len()
    )?;
    writeln!(out, "Elapsed ticks:           {}", result.elapsed())?;
    writeln!(
        out,
        "CPU utilization:         {:.1}%",
        100.0 * stats.utilization()
    )
}
