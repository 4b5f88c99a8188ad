use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use crossbeam_channel::unbounded;
use std::sync::Arc;
use std::time::Duration;
use weft_core::{Rational, State, TimeSpan};
use weft_engine::{
    run_for, ChannelSink, Clock, Registry, Scheduler, SchedulerConfig, SystemClock,
};

#[derive(Parser)]
#[command(name = "weft")]
#[command(about = "Pattern tools for the Weft live-coding engine", long_about = None)]
struct Cli {
    /// Log verbosity; repeat for more (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a mini-notation pattern parses.
    Validate { pattern: String },

    /// Reprint a mini-notation pattern in canonical form.
    Fmt { pattern: String },

    /// Show the syntax tree of a mini-notation pattern.
    Ast {
        pattern: String,

        /// Output format (debug or json).
        #[arg(long, default_value = "debug")]
        format: String,
    },

    /// Evaluate an expression and list the events it produces.
    Events {
        /// Host-language expression; bare strings are mini notation.
        expr: String,

        /// First cycle to query.
        #[arg(long, default_value = "0")]
        from: i64,

        /// How many cycles to query.
        #[arg(long, default_value = "1")]
        cycles: i64,

        /// Output format (debug or json).
        #[arg(long, default_value = "debug")]
        format: String,
    },

    /// Play an expression through the scheduler, printing timed events.
    Run {
        expr: String,

        /// Tempo in cycles per second.
        #[arg(long, default_value = "0.5")]
        cps: f64,

        /// Tempo in beats per minute (4 beats per cycle); overrides --cps.
        #[arg(long)]
        bpm: Option<f64>,

        /// How many cycles to play before stopping.
        #[arg(long, default_value = "4")]
        cycles: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::Level::Warn,
        1 => log::Level::Info,
        _ => log::Level::Debug,
    };
    simple_logger::init_with_level(level).context("installing logger")?;

    match cli.command {
        Commands::Validate { pattern } => {
            weft_mini::parse(&pattern).map_err(|e| anyhow!("parse error: {}", e))?;
            println!("ok");
            Ok(())
        }

        Commands::Fmt { pattern } => {
            let ast = weft_mini::parse(&pattern).map_err(|e| anyhow!("parse error: {}", e))?;
            println!("{}", weft_mini::format(&ast));
            Ok(())
        }

        Commands::Ast { pattern, format } => {
            let ast = weft_mini::parse(&pattern).map_err(|e| anyhow!("parse error: {}", e))?;
            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&ast)?),
                _ => println!("{:#?}", ast),
            }
            Ok(())
        }

        Commands::Events {
            expr,
            from,
            cycles,
            format,
        } => {
            let registry = Registry::new();
            let pattern = registry
                .evaluate(&expr)
                .map_err(|e| anyhow!("{}", e))?;
            let span = TimeSpan::new(
                Rational::from_integer(from),
                Rational::from_integer(from + cycles.max(1)),
            );
            let haps = pattern.query(&State::new(span));

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&haps)?),
                _ => {
                    println!("{} event(s)", haps.len());
                    for hap in &haps {
                        println!("  {}", hap);
                    }
                }
            }
            Ok(())
        }

        Commands::Run {
            expr,
            cps,
            bpm,
            cycles,
        } => {
            let registry = Registry::new();
            let pattern = registry
                .evaluate(&expr)
                .map_err(|e| anyhow!("{}", e))?;

            let cps = match bpm {
                Some(bpm) => bpm / 60.0 / 4.0,
                None => cps,
            };
            if cps <= 0.0 {
                return Err(anyhow!("tempo must be positive"));
            }

            let (tx, rx) = unbounded();
            let clock = Arc::new(SystemClock::new());
            let epoch = clock.epoch();
            let sink = Arc::new(ChannelSink::new(tx));
            let mut scheduler = Scheduler::new(
                clock,
                sink,
                SchedulerConfig {
                    cps: Rational::approximate(cps),
                    ..Default::default()
                },
            );
            let diagnostics = scheduler.diagnostics();
            scheduler.play(pattern);

            let printer = std::thread::spawn(move || {
                while let Ok(event) = rx.recv() {
                    let at = event.time.saturating_duration_since(epoch);
                    println!(
                        "{:>10.3}s  {}  ({:.3}s)",
                        at.as_secs_f64(),
                        event.value,
                        event.duration.as_secs_f64()
                    );
                }
            });

            run_for(
                &mut scheduler,
                Duration::from_secs_f64(cycles / cps),
            );
            scheduler.stop();
            scheduler.tick();
            drop(scheduler);
            printer.join().ok();

            for diag in diagnostics.try_iter() {
                eprintln!("{}", diag);
            }
            Ok(())
        }
    }
}
