//! REPL – Read-Eval-Print Loop for the Kachaka console.
//!
//! Supported slash-commands:
//!   /help                     – show this list
//!   /refresh                  – reload shelves and locations into the resolver
//!   /move <shelf> <location>  – carry a shelf to a location
//!   /return [shelf]           – return a shelf home (default: the held shelf)
//!   /goto <location>          – drive to a location
//!   /home /dock /undock       – return home, dock or undock a shelf
//!   /speak <text>             – speak a sentence
//!   /pose <x> <y> <yaw>       – drive to a map pose
//!   /state /last              – poll state / read the last result
//!   /cancel                   – cancel the running command
//!   /finish [error-code]      – complete the simulated command
//!   /history                  – list finished commands
//!   /info                     – robot serial number, version and pose
//!   /quit | /exit             – gracefully exit the CLI

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use kachaka_client::{KachakaApiClient, SimulatedRobot, StartOptions};
use kachaka_types::{Command, CommandResult, CommandState, KachakaError};
use tokio::runtime::Runtime;

/// A parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Help,
    Refresh,
    MoveShelf { shelf: String, location: String },
    ReturnShelf { shelf: String },
    Goto { location: String },
    Home,
    Dock,
    Undock,
    Speak { text: String },
    Pose { x: f64, y: f64, yaw: f64 },
    State,
    Last,
    Cancel,
    Finish { error_code: Option<i32> },
    History,
    Info,
    Quit,
}

/// Parse one trimmed, non-empty input line.
pub fn parse(line: &str) -> Result<ReplCommand, String> {
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let cmd = match head {
        "/help" => ReplCommand::Help,
        "/refresh" => ReplCommand::Refresh,
        "/move" => match args.as_slice() {
            [shelf, location] => ReplCommand::MoveShelf {
                shelf: shelf.to_string(),
                location: location.to_string(),
            },
            _ => return Err("usage: /move <shelf> <location>".to_string()),
        },
        "/return" => match args.as_slice() {
            [] => ReplCommand::ReturnShelf {
                shelf: String::new(),
            },
            [shelf] => ReplCommand::ReturnShelf {
                shelf: shelf.to_string(),
            },
            _ => return Err("usage: /return [shelf]".to_string()),
        },
        "/goto" => match args.as_slice() {
            [location] => ReplCommand::Goto {
                location: location.to_string(),
            },
            _ => return Err("usage: /goto <location>".to_string()),
        },
        "/home" => ReplCommand::Home,
        "/dock" => ReplCommand::Dock,
        "/undock" => ReplCommand::Undock,
        "/speak" if !rest.is_empty() => ReplCommand::Speak {
            text: rest.to_string(),
        },
        "/speak" => return Err("usage: /speak <text>".to_string()),
        "/pose" => {
            let values: Result<Vec<f64>, _> = args.iter().map(|a| a.parse::<f64>()).collect();
            match values.as_deref() {
                Ok([x, y, yaw]) => ReplCommand::Pose {
                    x: *x,
                    y: *y,
                    yaw: *yaw,
                },
                _ => return Err("usage: /pose <x> <y> <yaw>".to_string()),
            }
        }
        "/state" => ReplCommand::State,
        "/last" => ReplCommand::Last,
        "/cancel" => ReplCommand::Cancel,
        "/finish" => match args.as_slice() {
            [] => ReplCommand::Finish { error_code: None },
            [code] => match code.parse::<i32>() {
                Ok(code) => ReplCommand::Finish {
                    error_code: Some(code),
                },
                Err(_) => return Err(format!("'{code}' is not an error code")),
            },
            _ => return Err("usage: /finish [error-code]".to_string()),
        },
        "/history" => ReplCommand::History,
        "/info" => ReplCommand::Info,
        "/quit" | "/exit" => ReplCommand::Quit,
        other => return Err(format!("unknown command '{other}'")),
    };
    Ok(cmd)
}

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL exits cleanly.
pub fn run(
    runtime: &Runtime,
    client: &KachakaApiClient,
    robot: &SimulatedRobot,
    shutdown: Arc<AtomicBool>,
) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "kachaka>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let cmd = match parse(line) {
            Ok(cmd) => cmd,
            Err(msg) => {
                println!(
                    "{} {}. Type {} for available commands.",
                    "Error:".red(),
                    msg.yellow(),
                    "/help".bold()
                );
                continue;
            }
        };

        match cmd {
            ReplCommand::Help => cmd_help(),
            ReplCommand::Quit => {
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            ReplCommand::Finish { error_code } => cmd_finish(robot, error_code),
            other => {
                if let Err(e) = runtime.block_on(execute(client, other)) {
                    println!("{} {}", "RPC error:".red(), e);
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "Kachaka Commands".bold().underline());
    println!("  {}                    – reload shelves and locations", "/refresh".bold().cyan());
    println!("  {}   – carry a shelf to a location", "/move <shelf> <location>".bold().cyan());
    println!("  {}            – return a shelf home", "/return [shelf]".bold().cyan());
    println!("  {}            – drive to a location", "/goto <location>".bold().cyan());
    println!("  {}        – return home, dock, undock", "/home /dock /undock".bold().cyan());
    println!("  {}              – speak a sentence", "/speak <text>".bold().cyan());
    println!("  {}        – drive to a map pose", "/pose <x> <y> <yaw>".bold().cyan());
    println!("  {}               – command state / last result", "/state /last".bold().cyan());
    println!("  {}                     – cancel the running command", "/cancel".bold().cyan());
    println!("  {}       – complete the simulated command", "/finish [error-code]".bold().cyan());
    println!("  {}              – finished commands", "/history /info".bold().cyan());
    println!("  {}                – exit the CLI", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_finish(robot: &SimulatedRobot, error_code: Option<i32>) {
    let finished = match error_code {
        None => robot.finish_running(true, 0),
        Some(code) => robot.finish_running(false, code),
    };
    match finished {
        Some(command) => println!("  {} {}", "✓ Finished".green(), describe(&command)),
        None => println!("  {}", "No command is running.".dimmed()),
    }
}

async fn execute(client: &KachakaApiClient, cmd: ReplCommand) -> Result<(), KachakaError> {
    let options = StartOptions::default();
    match cmd {
        ReplCommand::Refresh => {
            client.update_resolver().await?;
            let shelves = client.get_shelves().await?;
            let locations = client.get_locations().await?;
            println!("{}", "Shelves".bold().underline());
            for shelf in &shelves {
                println!("  {} {}", shelf.id.dimmed(), shelf.name.bold());
            }
            println!("{}", "Locations".bold().underline());
            for location in &locations {
                let marker = if location.is_default { "▶" } else { " " };
                println!(
                    "  {} {} {}",
                    marker.green(),
                    location.id.dimmed(),
                    location.name.bold()
                );
            }
        }
        ReplCommand::MoveShelf { shelf, location } => {
            report_start(client.move_shelf(&shelf, &location, options).await?);
        }
        ReplCommand::ReturnShelf { shelf } => {
            report_start(client.return_shelf(&shelf, options).await?);
        }
        ReplCommand::Goto { location } => {
            report_start(client.move_to_location(&location, options).await?);
        }
        ReplCommand::Home => report_start(client.return_home(options).await?),
        ReplCommand::Dock => report_start(client.dock_shelf(options).await?),
        ReplCommand::Undock => report_start(client.undock_shelf(options).await?),
        ReplCommand::Speak { text } => report_start(client.speak(text, options).await?),
        ReplCommand::Pose { x, y, yaw } => {
            report_start(client.move_to_pose(x, y, yaw, options).await?);
        }
        ReplCommand::State => {
            let (state, command) = client.get_command_state().await?;
            match (state, command) {
                (CommandState::Running, Some(command)) => {
                    println!("  {} {}", "RUNNING".yellow().bold(), describe(&command));
                }
                (state, _) => println!("  {}", format!("{state:?}").to_uppercase().bold()),
            }
        }
        ReplCommand::Last => match client.get_last_command_result().await? {
            (result, Some(command)) => {
                println!("  {} {}", describe(&command), outcome(result));
            }
            (_, None) => println!("  {}", "No command has finished yet.".dimmed()),
        },
        ReplCommand::Cancel => match client.cancel_command().await? {
            (_, Some(command)) => println!("  {} {}", "✓ Cancelled".green(), describe(&command)),
            (result, None) => println!(
                "  {} (code {})",
                "Nothing to cancel".dimmed(),
                result.error_code
            ),
        },
        ReplCommand::History => {
            let histories = client.get_history_list().await?;
            if histories.is_empty() {
                println!("  {}", "No history.".dimmed());
            }
            for h in &histories {
                let result = CommandResult {
                    success: h.success,
                    error_code: h.error_code,
                };
                println!(
                    "  {} {} {}",
                    h.command_executed_time.format("%H:%M:%S").to_string().dimmed(),
                    describe(&h.command),
                    outcome(result)
                );
            }
        }
        ReplCommand::Info => {
            let serial = client.get_robot_serial_number().await?;
            let version = client.get_robot_version().await?;
            let pose = client.get_robot_pose().await?;
            println!("  Serial  : {}", serial.bold());
            println!("  Version : {}", version.bold());
            println!(
                "  Pose    : x={:.2} y={:.2} θ={:.2}",
                pose.x, pose.y, pose.theta
            );
        }
        ReplCommand::Help | ReplCommand::Quit | ReplCommand::Finish { .. } => {}
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn report_start(result: CommandResult) {
    if result.success {
        println!("  {}", "✓ Accepted".green());
    } else {
        println!(
            "  {} (error code {})",
            "✗ Rejected".red(),
            result.error_code.to_string().yellow()
        );
    }
}

fn outcome(result: CommandResult) -> String {
    if result.success {
        "succeeded".green().to_string()
    } else {
        format!("{} (error code {})", "failed".red(), result.error_code)
    }
}

fn describe(command: &Command) -> String {
    match command {
        Command::MoveShelf {
            target_shelf_id,
            destination_location_id,
        } => format!("move_shelf {target_shelf_id} → {destination_location_id}"),
        Command::ReturnShelf { target_shelf_id } if target_shelf_id.is_empty() => {
            "return_shelf (held shelf)".to_string()
        }
        Command::ReturnShelf { target_shelf_id } => format!("return_shelf {target_shelf_id}"),
        Command::MoveToLocation { target_location_id } => {
            format!("move_to_location {target_location_id}")
        }
        Command::Speak { text } => format!("speak \"{text}\""),
        Command::MoveToPose { x, y, yaw } => format!("move_to_pose ({x}, {y}, {yaw})"),
        other => other.kind().to_string(),
    }
}
