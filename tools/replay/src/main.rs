//! replay: run a recorded command log through a leading/trailing instance pair.
//!
//! Usage:
//!   replay run --log commands.json [--config sim.json] [--ticks N] [--delay N] [--seed N]
//!   replay view --log commands.json --ticks N [--config sim.json]
//!
//! Prints one `frame hash` line per tick. Exits with status 2 on desync.

use std::path::{Path, PathBuf};
use std::process;

use skirmish_core::commands::Command;
use skirmish_sim::{SimConfig, Simulation, TrailingPair};

const DEFAULT_DELAY: u64 = 8;

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "run" => cmd_run(&args[2..]),
        "view" => cmd_view(&args[2..]),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

fn print_usage() {
    eprintln!(
        "replay: deterministic command log replay\n\
         \n\
         Commands:\n\
         \n\
         run       Replay a log through a leading and a trailing instance\n\
         \n\
           --log <path>       JSON array of commands (required)\n\
           --config <path>    JSON simulation config (optional, default built in)\n\
           --ticks <N>        Frames to simulate (default: last command frame + 1)\n\
           --delay <N>        Frames the trailing instance lags (default: 8)\n\
           --seed <N>         Override the config seed\n\
         \n\
         view      Replay a log and print the final render view as JSON\n\
         \n\
           --log, --config, --ticks, --seed as above\n\
         \n\
         Environment:\n\
         \n\
           RUST_LOG           Log filter (default: info)\n\
           LOG_FORMAT=json    Emit logs as JSON\n"
    );
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_number(args: &[String], flag: &str) -> Option<u64> {
    let value = parse_flag(args, flag)?;
    match value.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            eprintln!("Error: {flag} expects a number, got '{value}'");
            process::exit(1);
        }
    }
}

fn load_config(args: &[String]) -> SimConfig {
    let mut config = match parse_flag(args, "--config") {
        Some(path) => {
            let json = read_file(Path::new(&path));
            serde_json::from_str(&json).unwrap_or_else(|e| {
                eprintln!("Error: invalid config {path}: {e}");
                process::exit(1);
            })
        }
        None => SimConfig::default(),
    };
    if let Err(e) = config.catalog.validate() {
        eprintln!("Error: invalid catalog: {e}");
        process::exit(1);
    }
    if let Some(seed) = parse_number(args, "--seed") {
        config.seed = seed;
    }
    config
}

fn load_log(args: &[String]) -> Vec<Command> {
    let Some(path) = parse_flag(args, "--log").map(PathBuf::from) else {
        eprintln!("Error: --log is required");
        process::exit(1);
    };
    let json = read_file(&path);
    serde_json::from_str(&json).unwrap_or_else(|e| {
        eprintln!("Error: invalid command log {}: {e}", path.display());
        process::exit(1);
    })
}

fn read_file(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error: cannot read {}: {e}", path.display());
        process::exit(1);
    })
}

fn tick_count(args: &[String], commands: &[Command]) -> u64 {
    parse_number(args, "--ticks")
        .unwrap_or_else(|| commands.iter().map(|c| c.frame + 1).max().unwrap_or(1))
}

fn cmd_run(args: &[String]) {
    let config = load_config(args);
    let commands = load_log(args);
    let ticks = tick_count(args, &commands);
    let delay = parse_number(args, "--delay").unwrap_or(DEFAULT_DELAY);

    let mut pair = TrailingPair::new(config, delay);
    let mut stale = 0usize;
    for command in commands {
        if pair.enqueue(command).is_err() {
            stale += 1;
        }
    }
    tracing::info!(ticks, delay, stale, "replay started");

    for _ in 0..ticks {
        match pair.step() {
            Ok(report) => println!("{} {:016x}", report.frame, report.hash),
            Err(desync) => {
                eprintln!("{desync}");
                process::exit(2);
            }
        }
    }
    if let Err(desync) = pair.finish() {
        eprintln!("{desync}");
        process::exit(2);
    }
    tracing::info!(
        frames = pair.leading().frame(),
        hash = format_args!("{:016x}", pair.leading().state_hash()),
        "replay verified"
    );
}

fn cmd_view(args: &[String]) {
    let config = load_config(args);
    let commands = load_log(args);
    let ticks = tick_count(args, &commands);

    let mut sim = Simulation::new(config);
    sim.enqueue_all(commands);
    for _ in 0..ticks {
        sim.tick();
    }
    match serde_json::to_string_pretty(&sim.view()) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: cannot serialize view: {e}");
            process::exit(1);
        }
    }
}
