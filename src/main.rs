use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use event_scheduler::config::SchedulerConfig;
use event_scheduler::display::{describe_error, output_path, print_assignment, write_assignment_csv, write_assignment_json};
use event_scheduler::parser::load_roster;
use event_scheduler::schedule::solve;
use event_scheduler::web;

#[derive(Parser)]
#[command(name = "event-scheduler", version, about = "Assigns students to events under capacity, block and rule constraints")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve a roster CSV and write the assignment
    Solve(SolveArgs),
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SolveArgs {
    /// Roster CSV file
    csv: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    max_per_participant: Option<usize>,
    #[arg(long)]
    max_builds: Option<usize>,
    #[arg(long)]
    node_limit: Option<u64>,
    #[arg(long)]
    time_limit_secs: Option<f64>,
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Also write the assignment as JSON
    #[arg(long)]
    json: bool,
    /// Skip the CSV export
    #[arg(long)]
    no_csv: bool,
}

impl SolveArgs {
    fn apply(&self, config: &mut SchedulerConfig) {
        if let Some(n) = self.max_per_participant {
            config.caps.max_per_participant = n;
        }
        if let Some(n) = self.max_builds {
            config.caps.max_builds = n;
        }
        if self.node_limit.is_some() {
            config.search.node_limit = self.node_limit;
        }
        if self.time_limit_secs.is_some() {
            config.search.time_limit_secs = self.time_limit_secs;
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if self.json {
            config.output.json = true;
        }
        if self.no_csv {
            config.output.csv = false;
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_solve(args: SolveArgs) -> anyhow::Result<bool> {
    let mut config = SchedulerConfig::resolve(args.config.as_deref()).context("loading configuration")?;
    args.apply(&mut config);
    config.validate()?;

    println!("Loading roster from {}...", args.csv.display());
    let problem = load_roster(&args.csv).with_context(|| format!("reading {}", args.csv.display()))?;
    println!(
        "Loaded {} students and {} events ({} slots)",
        problem.participants.len(),
        problem.activities.len(),
        problem.total_slots()
    );
    if let Some(limit) = config.budget().time_limit.filter(|t| *t > Duration::ZERO) {
        println!("Search time limit: {:.1}s", limit.as_secs_f64());
    }

    let report = match solve(&problem, &config.caps, &config.budget()) {
        Ok(report) => report,
        Err(e) => {
            println!("{}", describe_error(&e));
            return Ok(false);
        }
    };
    print_assignment(&report, &problem);

    let Some(assignment) = report.assignment() else {
        return Ok(false);
    };

    let now = chrono::Local::now();
    let dir = &config.output.dir;
    if config.output.csv || config.output.json {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    if config.output.csv {
        let path = output_path(dir, now, "csv");
        write_assignment_csv(assignment, &problem, &path).with_context(|| format!("writing {}", path.display()))?;
        println!("\nWrote assignments to {}", path.display());
    }
    if config.output.json {
        let path = output_path(dir, now, "json");
        write_assignment_json(assignment, &path).with_context(|| format!("writing {}", path.display()))?;
        println!("Wrote assignments to {}", path.display());
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port, config } => {
            let config = SchedulerConfig::resolve(config.as_deref()).context("loading configuration")?;
            println!("Starting web server on port {}...", port);
            println!("POST a roster CSV to http://localhost:{}/api/solve", port);
            web::start_server(port, config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Solve(args) => {
            // The search is synchronous and may run for a while
            let solved = tokio::task::spawn_blocking(move || run_solve(args)).await??;
            Ok(if solved { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_values() {
        let cli = Cli::parse_from([
            "event-scheduler", "solve", "roster.csv",
            "--max-per-participant", "3",
            "--node-limit", "500",
            "--time-limit-secs", "1.5",
            "--output-dir", "out",
            "--json", "--no-csv",
        ]);
        let Command::Solve(args) = cli.command else {
            panic!("expected the solve command");
        };
        let mut config = SchedulerConfig::default();
        config.caps.max_builds = 1;
        args.apply(&mut config);

        assert_eq!(config.caps.max_per_participant, 3);
        assert_eq!(config.caps.max_builds, 1);
        assert_eq!(config.search.node_limit, Some(500));
        assert_eq!(config.search.time_limit_secs, Some(1.5));
        assert_eq!(config.output.dir, PathBuf::from("out"));
        assert!(config.output.json);
        assert!(!config.output.csv);
    }

    #[test]
    fn absent_flags_leave_config_alone() {
        let cli = Cli::parse_from(["event-scheduler", "solve", "roster.csv"]);
        let Command::Solve(args) = cli.command else {
            panic!("expected the solve command");
        };
        let mut config = SchedulerConfig::default();
        config.search.node_limit = Some(42);
        let before = config.clone();
        args.apply(&mut config);
        assert_eq!(config, before);
    }
}
