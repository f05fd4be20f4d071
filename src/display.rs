use std::fs::File;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Local};
use csv::Writer;

use crate::error::{ExportError, SolveError};
use crate::schedule::{Assignment, BudgetLimit, Problem, SearchOutcome, SolveReport};

/// Narrowest an event column gets in the console table
const MIN_EVENT_WIDTH: usize = 8;

/// Assigned events for each participant, in the participant's preference
/// order. Events the participant never listed go last in assignment order.
/// Rows are sorted by participant name.
pub fn ordered_rows(assignment: &Assignment, problem: &Problem) -> Vec<(String, Vec<String>)> {
    assignment
        .by_participant
        .iter()
        .map(|(participant, events)| {
            let mut ordered = events.clone();
            ordered.sort_by_key(|event| problem.preference_rank(participant, event).unwrap_or(usize::MAX));
            (participant.clone(), ordered)
        })
        .collect()
}

fn header(columns: usize) -> Vec<String> {
    std::iter::once("Student".to_string())
        .chain((1..=columns).map(|i| format!("Event{}", i)))
        .collect()
}

/// Renders the assignment as a column-aligned table
pub fn format_assignment_table(assignment: &Assignment, problem: &Problem) -> String {
    let rows = ordered_rows(assignment, problem);
    let columns = rows.iter().map(|(_, events)| events.len()).max().unwrap_or(0);

    let name_width = rows
        .iter()
        .map(|(name, _)| name.len())
        .chain(std::iter::once("Student".len()))
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            rows.iter()
                .filter_map(|(_, events)| events.get(i).map(|e| e.len()))
                .fold(MIN_EVENT_WIDTH, usize::max)
        })
        .collect();

    let render = |cells: &[String]| {
        let mut line = format!("{:<w$}", cells[0], w = name_width);
        for (i, w) in widths.iter().enumerate() {
            let value = cells.get(i + 1).map(String::as_str).unwrap_or("");
            line.push_str(&format!("  {:<w$}", value, w = *w));
        }
        line.trim_end().to_string()
    };

    let header_line = render(&header(columns));
    let mut out = String::new();
    out.push_str(&header_line);
    out.push('\n');
    out.push_str(&"-".repeat(header_line.len()));
    out.push('\n');
    for (name, events) in rows {
        let cells: Vec<String> = std::iter::once(name).chain(events).collect();
        out.push_str(&render(&cells));
        out.push('\n');
    }
    out
}

/// Prints the assignment and a short summary of the run
pub fn print_assignment(report: &SolveReport, problem: &Problem) {
    match &report.outcome {
        SearchOutcome::Solved { assignment } => {
            println!("\n=== Assignment ===");
            println!(
                "Filled {} slots across {} events for {} students (at least {} events each)",
                problem.total_slots(),
                problem.activities.len(),
                problem.participants.len(),
                problem.minimum_load(),
            );
            println!();
            print!("{}", format_assignment_table(assignment, problem));
        }
        other => println!("\n{}", describe_failure(other)),
    }
    println!(
        "\nSearch explored {} nodes with {} backtracks in {} ms",
        report.stats.nodes, report.stats.backtracks, report.stats.elapsed_ms
    );
}

pub fn describe_failure(outcome: &SearchOutcome) -> String {
    match outcome {
        SearchOutcome::Solved { .. } => "Found a complete assignment.".to_string(),
        SearchOutcome::Exhausted => {
            "Failed to find a complete assignment with given constraints.".to_string()
        }
        SearchOutcome::BudgetExhausted { limit } => {
            let which = match limit {
                BudgetLimit::Nodes => "node",
                BudgetLimit::Time => "time",
            };
            format!("Search stopped by its {} limit before finding a complete assignment.", which)
        }
    }
}

pub fn describe_error(err: &SolveError) -> String {
    if err.is_reference_error() {
        format!("Invalid roster: {}", err)
    } else {
        format!("Impossible roster: {}", err)
    }
}

/// `<dir>/event_scheduler_output_<timestamp>.<extension>`
pub fn output_path(dir: &Path, at: DateTime<Local>, extension: &str) -> PathBuf {
    dir.join(format!(
        "event_scheduler_output_{}.{}",
        at.format("%Y%m%d_%H%M%S"),
        extension
    ))
}

/// Writes the assignment as CSV, one row per student, padded to the widest row
pub fn write_assignment_csv(assignment: &Assignment, problem: &Problem, path: &Path) -> Result<(), ExportError> {
    let rows = ordered_rows(assignment, problem);
    let columns = rows.iter().map(|(_, events)| events.len()).max().unwrap_or(0);

    let mut writer = Writer::from_path(path)?;
    writer.write_record(header(columns))?;
    for (name, events) in rows {
        let padding = columns - events.len();
        let record: Vec<String> = std::iter::once(name)
            .chain(events)
            .chain(std::iter::repeat(String::new()).take(padding))
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the assignment as pretty-printed JSON
pub fn write_assignment_json(assignment: &Assignment, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, assignment)?;
    Ok(())
}
