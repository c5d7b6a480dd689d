#![warn(missing_docs)]
//! ipsbench CLI Library
//!
//! Command line harness for benchmark binaries. Register named groups on a
//! [`Harness`] and call [`Harness::run`] from `main`; every group becomes one
//! run of a suite, and the suite summary is printed (or written as JSON) at
//! the end.
//!
//! # Example
//!
//! ```ignore
//! use ipsbench::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     Harness::new()
//!         .group("strings", |job| {
//!             job.report("format", || format!("{}-{}", 1, 2));
//!             job.report("concat", || "1".to_string() + "-2");
//!         })
//!         .run()
//! }
//! ```

mod config;

pub use config::*;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ipsbench_core::{
    BenchmarkJob, Engine, IpsConfig, IpsError, Suite, TrimCleaner, pin_to_cpu, run_job,
};
use ipsbench_report::{OutputFormat, generate_json_report};
use regex::Regex;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

/// ipsbench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "ipsbench")]
#[command(author, version, about = "ipsbench - iterations per second micro-benchmarks")]
pub struct Cli {
    /// Optional subcommand (List, Run); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Filter items by regex pattern over their labels
    #[arg(default_value = ".*")]
    pub filter: String,

    /// Measurement time per item in seconds
    #[arg(long)]
    pub time: Option<f64>,

    /// Warmup time per item in seconds
    #[arg(long)]
    pub warmup: Option<f64>,

    /// Suppress per-item progress lines
    #[arg(short, long)]
    pub quiet: bool,

    /// Print warmup and batch size diagnostics
    #[arg(short, long)]
    pub verbose: bool,

    /// Print a relative-speed comparison after each group
    #[arg(long)]
    pub compare: bool,

    /// Output format: human, json
    #[arg(long)]
    pub format: Option<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Cleanup before each timed phase: none, trim
    #[arg(long)]
    pub clean_env: Option<CleanEnv>,

    /// Pin the measuring thread to this CPU
    #[arg(long)]
    pub pin_cpu: Option<usize>,

    /// Internal: Absorb cargo bench's --bench flag
    #[arg(long, hide = true)]
    pub bench: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all registered groups and items
    List,
    /// Run benchmarks (default)
    Run,
}

/// Effective settings after layering ips.toml under the command line
#[derive(Debug, Clone)]
pub struct Settings {
    /// Durations handed to the engine
    pub ips: IpsConfig,
    /// Suppress per-item progress lines
    pub quiet: bool,
    /// Print warmup and batch size diagnostics
    pub verbose: bool,
    /// Request a comparison for every group
    pub compare: bool,
    /// Cleanup mode
    pub clean_env: CleanEnv,
    /// CPU to pin to
    pub pin_cpu: Option<usize>,
    /// Summary format
    pub format: OutputFormat,
    /// Summary destination
    pub output: Option<PathBuf>,
    /// Label filter
    pub filter: Regex,
}

impl Settings {
    /// Layer: ips.toml values first, CLI flags override
    pub fn resolve(cli: &Cli, config: &IpsConfigFile) -> anyhow::Result<Self> {
        let time = match cli.time {
            Some(secs) => duration_from_secs(secs, "--time")?,
            None => config.time()?,
        };
        let warmup = match cli.warmup {
            Some(secs) => duration_from_secs(secs, "--warmup")?,
            None => config.warmup()?,
        };

        let format = cli
            .format
            .as_deref()
            .unwrap_or(config.output.format.as_str())
            .parse::<OutputFormat>()
            .map_err(|e| anyhow::anyhow!(e))?;

        let filter = Regex::new(&cli.filter)
            .with_context(|| format!("invalid filter pattern '{}'", cli.filter))?;

        Ok(Self {
            ips: IpsConfig::new(time, warmup),
            quiet: cli.quiet || config.runner.quiet,
            verbose: cli.verbose || config.runner.verbose,
            compare: cli.compare,
            clean_env: cli.clean_env.unwrap_or(config.runner.clean_env),
            pin_cpu: cli.pin_cpu.or(config.runner.pin_cpu),
            format,
            output: cli.output.clone().or_else(|| config.output.file.as_ref().map(PathBuf::from)),
            filter,
        })
    }

    /// Engine with these durations and cleanup mode
    pub fn engine(&self) -> Engine {
        let engine = Engine::new(self.ips);
        match self.clean_env {
            CleanEnv::None => engine,
            CleanEnv::Trim => engine.with_cleaner(TrimCleaner),
        }
    }
}

fn duration_from_secs(secs: f64, flag: &str) -> anyhow::Result<std::time::Duration> {
    if !secs.is_finite() || secs < 0.0 {
        anyhow::bail!("{} must be a non-negative number of seconds, got {}", flag, secs);
    }
    Ok(std::time::Duration::from_secs_f64(secs))
}

type GroupFn = Box<dyn Fn(&mut BenchmarkJob<'static>) -> Result<(), IpsError>>;

/// Result of running every group
#[derive(Debug)]
pub struct HarnessOutcome {
    /// Suite holding one run per successful group
    pub suite: Suite,
    /// Groups whose run failed
    pub failed: Vec<String>,
}

/// Named benchmark groups plus the command line driver
#[derive(Default)]
pub struct Harness {
    groups: Vec<(String, GroupFn)>,
}

impl Harness {
    /// Create a harness without groups
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group; `register` fills a fresh job each time the group runs
    pub fn group(
        self,
        name: impl Into<String>,
        register: impl Fn(&mut BenchmarkJob<'static>) + 'static,
    ) -> Self {
        self.try_group(name, move |job| {
            register(job);
            Ok(())
        })
    }

    /// Add a group whose registration can fail.
    ///
    /// A registration error stops the harness before anything is measured.
    pub fn try_group(
        mut self,
        name: impl Into<String>,
        register: impl Fn(&mut BenchmarkJob<'static>) -> Result<(), IpsError> + 'static,
    ) -> Self {
        self.groups.push((name.into(), Box::new(register)));
        self
    }

    /// Group names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.groups.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Parse the process arguments and run.
    /// This is the main entry point for benchmark binaries.
    pub fn run(self) -> anyhow::Result<()> {
        let cli = Cli::parse();
        self.run_with_cli(cli)
    }

    /// Run with pre-parsed arguments
    pub fn run_with_cli(self, cli: Cli) -> anyhow::Result<()> {
        // Initialize logging
        let filter = if cli.verbose { "ipsbench=debug" } else { "ipsbench=info" };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();

        // Discover ips.toml configuration (CLI flags override)
        let config = IpsConfigFile::discover().unwrap_or_default();
        let settings = Settings::resolve(&cli, &config)?;

        match cli.command {
            Some(Commands::List) => {
                print!("{}", self.plan(&settings.filter)?);
                Ok(())
            }
            Some(Commands::Run) | None => self.run_and_report(&settings),
        }
    }

    /// Listing of groups and the items matching `filter`
    pub fn plan(&self, filter: &Regex) -> anyhow::Result<String> {
        let mut output = String::from("ipsbench Plan:\n");
        let mut total = 0;

        for (name, register) in &self.groups {
            let job = build_job(name, register.as_ref(), filter)?;
            output.push_str(&format!("├── group: {}\n", name));
            for label in job.labels() {
                output.push_str(&format!("│   ├── {}\n", label));
                total += 1;
            }
        }

        output.push_str(&format!("{} items found.\n", total));
        Ok(output)
    }

    /// Measure every group under one suite.
    ///
    /// All groups are registered first; a registration error is returned
    /// before any group is measured.
    pub fn execute(&self, settings: &Settings) -> anyhow::Result<HarnessOutcome> {
        let jobs = self
            .groups
            .iter()
            .map(|(name, register)| {
                build_job(name, register.as_ref(), &settings.filter).map(|job| (name, job))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        if let Some(cpu) = settings.pin_cpu {
            pin_to_cpu(cpu).with_context(|| format!("pinning to CPU {}", cpu))?;
            debug!(cpu, "pinned measuring thread");
        }

        let (suite, failed) = Suite::create(|suite| {
            if settings.quiet {
                suite.quiet();
            }
            if settings.verbose {
                suite.verbose();
            }

            let mut failed = Vec::new();
            for (name, mut job) in jobs {
                if job.is_empty() {
                    debug!(group = %name, "no items match the filter");
                    continue;
                }
                if settings.compare {
                    job.compare();
                }

                info!(group = %name, items = job.len(), "running group");
                let mut engine = settings.engine();
                let ok = suite.run(name, || {
                    run_job(&mut job, &mut engine, Some(suite)).map(|_| ())
                });
                if !ok {
                    failed.push(name.clone());
                }
            }
            failed
        });

        Ok(HarnessOutcome { suite, failed })
    }

    fn run_and_report(&self, settings: &Settings) -> anyhow::Result<()> {
        let outcome = self.execute(settings)?;

        // Generate output
        let output = match settings.format {
            OutputFormat::Json => generate_json_report(&outcome.suite.summary())?,
            OutputFormat::Human => format!("\n{}", outcome.suite.render()),
        };

        // Write output
        if let Some(ref path) = settings.output {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            file.write_all(output.as_bytes())?;
            println!("Report written to: {}", path.display());
        } else {
            print!("{}", output);
        }

        if !outcome.failed.is_empty() {
            anyhow::bail!(
                "{} group(s) failed: {}",
                outcome.failed.len(),
                outcome.failed.join(", ")
            );
        }

        Ok(())
    }
}

fn build_job(
    name: &str,
    register: &dyn Fn(&mut BenchmarkJob<'static>) -> Result<(), IpsError>,
    filter: &Regex,
) -> anyhow::Result<BenchmarkJob<'static>> {
    let mut job = BenchmarkJob::new();
    register(&mut job).with_context(|| format!("registering group '{}'", name))?;
    job.retain(|label| filter.is_match(label));
    Ok(job)
}
