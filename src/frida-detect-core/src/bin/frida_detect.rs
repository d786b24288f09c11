//! frida-detect CLI - run the Frida probes against this host or captured files.
//!
//! Useful for checking the heuristics against a `/proc` snapshot pulled from
//! a device with `adb shell cat /proc/<pid>/maps > maps.txt`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use frida_detect_core::{ProbeConfig, ProbeKind, ProbeSet};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// frida-detect - heuristic Frida instrumentation probes.
///
/// Exits with status 1 when something was detected, 0 otherwise.
#[derive(Parser)]
#[command(name = "frida-detect")]
#[command(version = VERSION)]
#[command(about = "Heuristic Frida instrumentation probes")]
#[command(long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// JSON config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Memory map to scan instead of /proc/self/maps
    #[arg(long)]
    maps: Option<PathBuf>,

    /// TCP table to scan instead of /proc/net/tcp
    #[arg(long)]
    tcp: Option<PathBuf>,

    /// Status file to read instead of /proc/self/status
    #[arg(long)]
    status: Option<PathBuf>,

    /// Treat a memory scan hit as a detection in `quick`
    #[arg(long)]
    memory_decisive: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every probe and report each result
    All,
    /// Run probes in order and stop at the first detection
    Quick,
    /// Inline-hook check on libc open()
    Trampoline,
    /// Frida server port check
    Server,
    /// Suspicious memory region scan
    Memory,
    /// Tracer attached check
    Debugger,
    /// Frida files on disk
    Files,
}

fn build_config(cli: &Cli) -> Result<ProbeConfig, String> {
    let mut config = match &cli.config {
        Some(path) => ProbeConfig::from_json_file(path).map_err(|e| e.to_string())?,
        None => ProbeConfig::default(),
    };
    if let Some(maps) = &cli.maps {
        config.maps_path = maps.clone();
    }
    if let Some(tcp) = &cli.tcp {
        config.tcp_table_path = tcp.clone();
    }
    if let Some(status) = &cli.status {
        config.status_path = status.clone();
    }
    if cli.memory_decisive {
        config.memory_scan_decisive = true;
    }
    Ok(config)
}

fn run_all(probes: &ProbeSet, json: bool) -> bool {
    let report = probes.run_all();
    if json {
        println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    } else {
        println!("\nFRIDA PROBES");
        println!("============\n");
        for kind in ProbeKind::ALL {
            let mark = if report.get(kind) { "DETECTED" } else { "clean" };
            println!("  {:<16} {}", kind.as_str(), mark);
        }
        println!();
    }
    report.any()
}

fn run_quick(probes: &ProbeSet, json: bool) -> bool {
    let detection = probes.quick_check();
    if json {
        println!("{}", serde_json::to_string_pretty(&detection).unwrap_or_default());
    } else {
        match &detection {
            Some(d) => println!("Detected ({}): {}", d.kind(), d),
            None => println!("No instrumentation evidence found"),
        }
    }
    detection.is_some()
}

fn run_single(probes: &ProbeSet, kind: ProbeKind, json: bool) -> bool {
    let detected = probes.run(kind);
    if json {
        let value = serde_json::json!({ "probe": kind, "detected": detected });
        println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
    } else {
        let mark = if detected { "DETECTED" } else { "clean" };
        println!("{}: {}", kind, mark);
    }
    detected
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let json_output = cli.format == "json";

    // Initialize logging (suppress for JSON output)
    if json_output {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::ERROR)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    } else if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return ExitCode::from(2);
        },
    };
    let probes = ProbeSet::new(config);

    let detected = match cli.command.unwrap_or(Commands::Quick) {
        Commands::All => run_all(&probes, json_output),
        Commands::Quick => run_quick(&probes, json_output),
        Commands::Trampoline => run_single(&probes, ProbeKind::Trampoline, json_output),
        Commands::Server => run_single(&probes, ProbeKind::ServerPort, json_output),
        Commands::Memory => run_single(&probes, ProbeKind::MemoryScan, json_output),
        Commands::Debugger => run_single(&probes, ProbeKind::Debugger, json_output),
        Commands::Files => run_single(&probes, ProbeKind::ArtifactFiles, json_output),
    };

    if detected {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
