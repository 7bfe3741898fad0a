//! `kachaka` – interactive console for the Kachaka command client.
//!
//! This binary:
//!
//! 1. Checks for `~/.kachaka/config.toml`; runs a **First-Run Wizard** when
//!    the file is absent.
//! 2. Builds a [`KachakaApiClient`] over an in-process [`SimulatedRobot`]
//!    seeded from the `[simulator]` table, and loads the resolver catalog.
//! 3. Drops the user into an **interactive REPL** with slash-commands
//!    (`/move`, `/state`, `/cancel`, `/help`, ...).
//! 4. Intercepts **Ctrl-C** to cancel any running command and exit.

mod repl;

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use kachaka_client::config::{self, ClientConfig, validate_target};
use kachaka_client::{KachakaApiClient, SimulatedRobot};
use tracing::warn;

fn main() -> ExitCode {
    // Hold the guard until exit so pending spans are flushed.
    let _telemetry = kachaka_client::init_tracing("kachaka");

    print_banner();

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => run_first_run_wizard(),
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            ClientConfig::default()
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {}", "Failed to start async runtime".red(), e);
            return ExitCode::FAILURE;
        }
    };

    let robot = Arc::new(SimulatedRobot::from_config(&cfg.simulator));
    let client = match KachakaApiClient::with_config(robot.clone(), &cfg) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("{}: {}", "Invalid configuration".red(), e);
            return ExitCode::FAILURE;
        }
    };

    println!("  Endpoint {} (simulated)", client.target().bold());
    match runtime.block_on(client.update_resolver()) {
        Ok(()) => println!("  Resolver catalog {}", "loaded".green()),
        Err(e) => println!("  Resolver catalog {}: {}", "unavailable".yellow(), e),
    }

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        let client = client.clone();
        let handle = runtime.handle().clone();
        if let Err(e) = ctrlc::set_handler(move || {
            println!();
            println!("{}", "⚠  Ctrl-C received – cancelling and exiting …".yellow().bold());
            cancel_running(&handle, &client);
            shutdown.store(true, Ordering::SeqCst);
            std::process::exit(130);
        }) {
            warn!(error = %e, "failed to install Ctrl-C handler; running commands will not be cancelled on Ctrl-C");
        }
    }

    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    // ── Interactive REPL ──────────────────────────────────────────────────
    repl::run(&runtime, &client, &robot, shutdown);

    cancel_running(runtime.handle(), &client);
    ExitCode::SUCCESS
}

/// Cancel the running command, if any, and report it.
fn cancel_running(handle: &tokio::runtime::Handle, client: &KachakaApiClient) {
    match handle.block_on(client.cancel_command()) {
        Ok((_, Some(command))) => {
            println!("{} {}", "  ✓ Cancelled".green(), command.kind().bold());
        }
        Ok((_, None)) => {}
        Err(e) => println!("{}: {}", "  Cancel failed".red(), e),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// First-Run Wizard
// ─────────────────────────────────────────────────────────────────────────────

fn run_first_run_wizard() -> ClientConfig {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║       Kachaka First-Run Wizard       ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();
    println!("  No configuration found.  Let's set up the console.\n");

    let mut cfg = ClientConfig::default();

    loop {
        let target = prompt_line(
            &format!("  Robot endpoint (host:port) [{}]: ", cfg.target),
            &cfg.target,
        );
        match validate_target(&target) {
            Ok(()) => {
                cfg.target = target;
                break;
            }
            Err(e) => println!("  {} {}", "Warning:".yellow(), e),
        }
    }

    match config::save(&cfg) {
        Ok(()) => println!(
            "\n  {} Config saved to {}\n",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
    cfg
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   __              __          __        "#.bold().cyan());
    println!("{}", r#"  / /__ ___ _____ / /  ___ _  / /_____ _ "#.bold().cyan());
    println!("{}", r#" /  '_// _ `/ __// _ \/ _ `/ /  '_/ _ `/ "#.bold().cyan());
    println!("{}", r#"/_/\_\ \_,_/\__//_//_/\_,_/ /_/\_\\_,_/  "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "Kachaka".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Command console");
    println!();
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn prompt_line(msg: &str, default: &str) -> String {
    use std::io::{BufRead, Write};
    print!("{}", msg);
    std::io::stdout().flush().ok();
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            let t = line.trim().to_string();
            if t.is_empty() { default.to_string() } else { t }
        }
        Err(_) => default.to_string(),
    }
}
