// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::Context;
use clap::{Parser, Subcommand};
use labwired_irqc::metrics::IrqMetrics;
use labwired_irqc::simulation::{Simulation, SimulationReport};
use labwired_irqc_config::{load_scenario, Scenario, ScenarioAssertion, StopReason};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

const EXIT_PASS: u8 = 0;
const EXIT_ASSERT_FAIL: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

const RESULT_SCHEMA_VERSION: &str = "1.0";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "LabWired native interrupt controller simulator",
    long_about = None
)]
struct Cli {
    /// Enable debug-level tracing of controller activity
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a scenario and evaluate its assertions.
    Run(RunArgs),

    /// Load and validate a scenario without running it.
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Path to the scenario (YAML)
    #[arg(short = 'c', long)]
    scenario: PathBuf,

    /// Directory to write result.json
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Override the scenario's max_time limit
    #[arg(long)]
    max_time: Option<u64>,

    /// Override the scenario's max_events limit
    #[arg(long)]
    max_events: Option<u64>,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Path to the scenario (YAML)
    #[arg(short = 'c', long)]
    scenario: PathBuf,
}

#[derive(Debug, Serialize)]
struct AssertionResult {
    assertion: ScenarioAssertion,
    passed: bool,
}

#[derive(Debug, Serialize)]
struct MetricsSummary {
    raises: u64,
    hw_wakes: u64,
    sw_wakes: u64,
    lock_changes: u64,
    deliveries_by_line: BTreeMap<u32, u64>,
}

#[derive(Debug, Serialize)]
struct RunResult {
    result_schema_version: String,
    scenario: String,
    status: String,
    report: SimulationReport,
    metrics: MetricsSummary,
    assertions: Vec<AssertionResult>,
}

/// Result emitted when a scenario cannot be loaded or built.
#[derive(Debug, Serialize)]
struct ConfigErrorResult {
    result_schema_version: String,
    scenario: String,
    status: String,
    stop_reason: StopReason,
    message: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.trace {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => run_scenario(args),
        Commands::Validate(args) => run_validate(args),
    }
}

fn run_validate(args: ValidateArgs) -> ExitCode {
    match load_scenario(&args.scenario) {
        Ok(scenario) => {
            info!("Scenario '{}' is valid", scenario.name);
            ExitCode::from(EXIT_PASS)
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

fn run_scenario(args: RunArgs) -> ExitCode {
    let mut scenario = match load_scenario(&args.scenario) {
        Ok(s) => s,
        Err(e) => {
            error!("{:#}", e);
            return config_error(&args, format!("{:#}", e));
        }
    };
    if let Some(max_time) = args.max_time {
        scenario.limits.max_time = max_time;
    }
    if let Some(max_events) = args.max_events {
        scenario.limits.max_events = max_events;
    }

    let mut sim = match Simulation::from_scenario(&scenario) {
        Ok(sim) => sim,
        Err(e) => {
            error!("Failed to build simulation: {}", e);
            return config_error(&args, e.to_string());
        }
    };

    let metrics = Arc::new(IrqMetrics::new());
    sim.controller_mut().add_observer(metrics.clone());

    info!("Running scenario '{}'", scenario.name);
    let report = sim.run();
    let result = build_result(&scenario, report, &metrics);

    for a in result.assertions.iter().filter(|a| !a.passed) {
        error!("Assertion failed: {:?}", a.assertion);
    }

    match serde_json::to_string(&result) {
        Ok(line) => println!("{}", line),
        Err(e) => {
            error!("Failed to serialize result: {}", e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    }

    if let Some(dir) = &args.output_dir {
        if let Err(e) = write_result(dir, &result) {
            error!("{:#}", e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    }

    if result.status == "pass" {
        ExitCode::from(EXIT_PASS)
    } else {
        ExitCode::from(EXIT_ASSERT_FAIL)
    }
}

fn config_error(args: &RunArgs, message: String) -> ExitCode {
    let result = ConfigErrorResult {
        result_schema_version: RESULT_SCHEMA_VERSION.to_string(),
        scenario: args.scenario.display().to_string(),
        status: "error".to_string(),
        stop_reason: StopReason::ConfigError,
        message,
    };
    match serde_json::to_string(&result) {
        Ok(line) => println!("{}", line),
        Err(e) => error!("Failed to serialize result: {}", e),
    }
    if let Some(dir) = &args.output_dir {
        if let Err(e) = write_result(dir, &result) {
            error!("{:#}", e);
        }
    }
    ExitCode::from(EXIT_CONFIG_ERROR)
}

fn build_result(scenario: &Scenario, report: SimulationReport, metrics: &IrqMetrics) -> RunResult {
    let assertions: Vec<AssertionResult> = scenario
        .assertions
        .iter()
        .map(|assertion| AssertionResult {
            assertion: assertion.clone(),
            passed: report.check(assertion),
        })
        .collect();
    let status = if assertions.iter().all(|a| a.passed) {
        "pass"
    } else {
        "fail"
    };

    RunResult {
        result_schema_version: RESULT_SCHEMA_VERSION.to_string(),
        scenario: scenario.name.clone(),
        status: status.to_string(),
        report,
        metrics: MetricsSummary {
            raises: metrics.get_raises(),
            hw_wakes: metrics.get_hw_wakes(),
            sw_wakes: metrics.get_sw_wakes(),
            lock_changes: metrics.get_lock_changes(),
            deliveries_by_line: metrics.deliveries_by_line(),
        },
        assertions,
    }
}

fn write_result<T: Serialize>(dir: &Path, result: &T) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {:?}", dir))?;
    let path = dir.join("result.json");
    let f = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create {:?}", path))?;
    serde_json::to_writer_pretty(f, result).context("Failed to write result.json")?;
    info!("Wrote {:?}", path);
    Ok(())
}
