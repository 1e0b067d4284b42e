// Copyright 2025. Command-line runner for the axiplot drawing tests.
//
// Usage:
//   plot-tests [-b NAME[:OPT,...]]... [--list] [TEST...]
//
// Runs the named tests (all when none are given) against every selected
// backend (default: recording). Set RUST_LOG to see drain diagnostics.

use plot_tests::{catalog, find, run_test, BackendChoice, Outcome, PlotTest};
use std::process;
use tracing_subscriber::EnvFilter;

use axiplot::Registry;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut choices = Vec::new();
    let mut names = Vec::new();
    let mut list = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-b" | "--backend" => {
                let Some(choice) = args.get(i + 1) else {
                    eprintln!("Missing backend after {}", args[i]);
                    print_usage();
                    process::exit(1);
                };
                choices.push(BackendChoice::parse(choice));
                i += 2;
            }
            "--list" => {
                list = true;
                i += 1;
            }
            "-h" | "--help" => {
                print_usage();
                return;
            }
            arg if arg.starts_with('-') => {
                eprintln!("Unknown option: {}", arg);
                print_usage();
                process::exit(1);
            }
            name => {
                names.push(name.to_string());
                i += 1;
            }
        }
    }

    let registry = Registry::with_defaults();
    if list {
        cmd_list(&registry);
        return;
    }

    let tests = select_tests(&names);
    if choices.is_empty() {
        choices.push(BackendChoice::parse("recording"));
    }
    let failures = cmd_run(&registry, &choices, &tests);
    if failures > 0 {
        println!("{} failure(s)", failures);
    } else {
        println!("all tests passed");
    }
}

fn print_usage() {
    eprintln!("plot-tests: run axiplot drawing tests");
    eprintln!();
    eprintln!("Usage: plot-tests [-b NAME[:OPT,...]]... [--list] [TEST...]");
    eprintln!();
    eprintln!("  -b, --backend NAME[:OPT,...]");
    eprintln!("      Draw on the named backend (repeatable, default: recording).");
    eprintln!("  --list");
    eprintln!("      List backends and tests.");
}

fn cmd_list(registry: &Registry) {
    println!("Backends:");
    for name in registry.names() {
        println!("  {}", name);
    }
    println!("Tests:");
    for t in catalog() {
        println!("  {:<10} {}", t.name, t.description);
    }
}

fn select_tests(names: &[String]) -> Vec<&'static PlotTest> {
    if names.is_empty() {
        return catalog().iter().collect();
    }
    let mut tests = Vec::new();
    for name in names {
        match find(name) {
            Some(t) => tests.push(t),
            None => {
                eprintln!("Unknown test: {}", name);
                print_usage();
                process::exit(1);
            }
        }
    }
    tests
}

/// Run every test on every backend and return the failure count.
fn cmd_run(registry: &Registry, choices: &[BackendChoice], tests: &[&PlotTest]) -> usize {
    let mut failures = 0;
    for choice in choices {
        // Fail fast on a backend that cannot be created at all.
        if let Err(e) = choice.make(registry) {
            eprintln!("Backend {}: {}", choice.name, e);
            process::exit(1);
        }
        for test in tests {
            let outcome = match choice.make(registry) {
                Ok(backend) => run_test(test, backend),
                Err(e) => Outcome::Failed(e.to_string()),
            };
            match &outcome {
                Outcome::Passed { instructions } => {
                    println!("[{}] {:<10} ok ({} instructions)", choice.name, test.name, instructions)
                }
                Outcome::Failed(why) => {
                    tracing::error!(backend = %choice.name, test = test.name, %why, "test failed");
                    println!("[{}] {:<10} FAILED: {}", choice.name, test.name, why);
                }
            }
            if outcome.is_failure() {
                failures += 1;
            }
        }
    }
    failures
}
