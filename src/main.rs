//! OS Simulator - Main Entry Point
//!
//! Usage: os-sim [OPTIONS] <scenario_file> [output_file]
//!
//! Arguments:
//!   scenario_file - JSON file with bankers / paging / scheduling sections
//!   output_file   - Where to write the report (stdout when omitted)
//!
//! Options:
//!   -j, --json        Emit JSON instead of the text report
//!   -s, --sample <N>  Use built-in paging sample N (1-3)
//!   -v, --verbose     Debug logging to stderr
//!   -h, --help        Print help information

use std::env;
use std::process;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use os_concepts_sim::constants::PAGING_SAMPLES;
use os_concepts_sim::io::{load_scenario, write_output, PagingInput};
use os_concepts_sim::report::render_outcome;
use os_concepts_sim::runner::run_scenario;

/// Command-line configuration
struct Config {
    scenario_file: String,
    output_file: Option<String>,
    json: bool,
    sample: Option<usize>,
    verbose: bool,
}

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    init_logging(config.verbose);

    if let Err(e) = run(&config) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_help(program: &str) {
    eprintln!("OS Simulator - Banker's algorithm, page replacement and CPU scheduling");
    eprintln!();
    eprintln!("Usage: {} [OPTIONS] <scenario_file> [output_file]", program);
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  scenario_file - JSON file with bankers/paging/scheduling sections");
    eprintln!("  output_file   - Output file for the report (stdout when omitted)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -j, --json        Emit JSON instead of the text report");
    eprintln!("  -s, --sample <N>  Replace the paging section with a built-in sample:");
    for (i, (label, _, frames)) in PAGING_SAMPLES.iter().enumerate() {
        eprintln!("                      {} = {} ({} frames)", i + 1, label, frames);
    }
    eprintln!("  -v, --verbose     Debug logging to stderr (RUST_LOG overrides)");
    eprintln!("  -h, --help        Print this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} scenario.json", program);
    eprintln!("  {} -j scenario.json results.json", program);
}

fn parse_args() -> Result<Config, String> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("os-sim", String::as_str);

    let mut json = false;
    let mut verbose = false;
    let mut sample = None;
    let mut positional: Vec<&String> = Vec::new();

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help(program);
                process::exit(0);
            }
            "-j" | "--json" => json = true,
            "-v" | "--verbose" => verbose = true,
            "-s" | "--sample" => {
                let value = iter
                    .next()
                    .ok_or_else(|| format!("{} requires a sample number", arg))?;
                let n: usize = value
                    .parse()
                    .map_err(|_| format!("Invalid sample number: {}", value))?;
                if n == 0 || n > PAGING_SAMPLES.len() {
                    return Err(format!(
                        "Sample number must be between 1 and {}",
                        PAGING_SAMPLES.len()
                    ));
                }
                sample = Some(n);
            }
            _ if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}\nUse --help for usage information.", arg));
            }
            _ => positional.push(arg),
        }
    }

    if positional.is_empty() || positional.len() > 2 {
        print_help(program);
        return Err(format!("\nError: Expected 1 or 2 arguments, got {}", positional.len()));
    }

    Ok(Config {
        scenario_file: positional[0].clone(),
        output_file: positional.get(1).map(|s| s.to_string()),
        json,
        sample,
        verbose,
    })
}

/// Main logic separated from main() for cleaner error handling
fn run(config: &Config) -> Result<(), String> {
    let mut scenario = load_scenario(&config.scenario_file).map_err(|e| e.to_string())?;
    info!(file = %config.scenario_file, "scenario loaded");

    if let Some(n) = config.sample {
        scenario.paging = PagingInput::sample(n);
        debug!(sample = n, "using built-in paging sample");
    }

    let outcome = run_scenario(&scenario);

    let content = if config.json {
        serde_json::to_string_pretty(&outcome).map_err(|e| format!("Failed to encode JSON: {}", e))?
    } else {
        render_outcome(&outcome)
    };

    match &config.output_file {
        Some(path) => {
            write_output(path, &content).map_err(|e| e.to_string())?;
            info!(file = %path, "results written");
        }
        None => print!("{}", content),
    }

    Ok(())
}
