//! git-bridge - a webhook bridge for GitHub and local git operations
//!
//! # Usage
//! ```bash
//! GITHUB_TOKEN=... git-bridge                 # Start server on port 8080
//! git-bridge --workspaces ~/repos --port 9000 # Custom workspace root and port
//! git-bridge status                           # Check if running
//! git-bridge kill                             # Stop running instance
//! ```

mod dispatch;
mod error;
mod hosting;
mod models;
mod routes;
mod tree;
mod workspace;

use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dispatch::AppState;
use hosting::GithubClient;
use workspace::Workspace;

/// git-bridge - dispatch webhook commands to GitHub and local git
#[derive(Parser)]
#[command(name = "git-bridge")]
#[command(about = "A webhook bridge for GitHub and local git operations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// GitHub API token used for all hosting-service calls
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Directory that holds local working copies
    #[arg(short, long, default_value = "./workspaces")]
    workspaces: String,

    /// Port to run the server on
    #[arg(short, long, default_value = "8080")]
    port: u16,
}

#[derive(Subcommand)]
enum Commands {
    /// Check if git-bridge is currently running
    Status,
    /// Stop the running git-bridge instance
    Kill,
}

/// PID file info stored as JSON
#[derive(serde::Serialize, serde::Deserialize)]
struct PidInfo {
    pid: u32,
    workspaces: String,
    port: u16,
}

fn get_pid_file_path() -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push("git-bridge.pid");
    path
}

fn read_pid_info() -> Option<PidInfo> {
    let path = get_pid_file_path();
    let mut file = fs::File::open(&path).ok()?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).ok()?;
    serde_json::from_str(&contents).ok()
}

fn write_pid_info(info: &PidInfo) -> anyhow::Result<()> {
    let path = get_pid_file_path();
    let mut file = fs::File::create(&path)?;
    file.write_all(serde_json::to_string(info)?.as_bytes())?;
    Ok(())
}

fn remove_pid_file() {
    let _ = fs::remove_file(get_pid_file_path());
}

#[cfg(unix)]
fn is_process_running(pid: u32) -> bool {
    // On Unix, sending signal 0 checks if process exists
    unsafe { libc::kill(pid as i32, 0) == 0 }
}

#[cfg(windows)]
fn is_process_running(pid: u32) -> bool {
    use std::process::Command;
    Command::new("tasklist")
        .args(&["/FI", &format!("PID eq {}", pid), "/NH"])
        .output()
        .map(|output| {
            let output_str = String::from_utf8_lossy(&output.stdout);
            output_str.contains(&pid.to_string())
        })
        .unwrap_or(false)
}

#[cfg(unix)]
fn kill_process(pid: u32) -> bool {
    unsafe { libc::kill(pid as i32, libc::SIGTERM) == 0 }
}

#[cfg(windows)]
fn kill_process(pid: u32) -> bool {
    use std::process::Command;
    Command::new("taskkill")
        .args(&["/PID", &pid.to_string(), "/F"])
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn handle_status() {
    match read_pid_info() {
        Some(info) => {
            if is_process_running(info.pid) {
                println!("✓ git-bridge is running");
                println!("  PID:        {}", info.pid);
                println!("  Workspaces: {}", info.workspaces);
                println!("  URL:        http://127.0.0.1:{}", info.port);
            } else {
                println!("✗ git-bridge is not running (stale PID file)");
                remove_pid_file();
            }
        }
        None => {
            println!("✗ git-bridge is not running");
        }
    }
}

fn handle_kill() {
    match read_pid_info() {
        Some(info) => {
            if is_process_running(info.pid) {
                if kill_process(info.pid) {
                    println!("✓ Stopped git-bridge (PID {})", info.pid);
                    remove_pid_file();
                } else {
                    println!("✗ Failed to stop git-bridge (PID {})", info.pid);
                }
            } else {
                println!("✗ git-bridge is not running (stale PID file)");
                remove_pid_file();
            }
        }
        None => {
            println!("✗ git-bridge is not running");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Status) => {
            handle_status();
            return Ok(());
        }
        Some(Commands::Kill) => {
            handle_kill();
            return Ok(());
        }
        None => {}
    }

    // Need a token to talk to the hosting service
    let github_token = cli.github_token.unwrap_or_else(|| {
        eprintln!("✗ No GitHub token configured.");
        eprintln!("  Set GITHUB_TOKEN or pass --github-token <TOKEN>.");
        std::process::exit(1);
    });

    // Check if already running
    if let Some(info) = read_pid_info() {
        if is_process_running(info.pid) {
            eprintln!("✗ git-bridge is already running (PID {})", info.pid);
            eprintln!("  URL: http://127.0.0.1:{}", info.port);
            eprintln!();
            eprintln!("Run 'git-bridge kill' to stop it first.");
            std::process::exit(1);
        } else {
            remove_pid_file();
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build the immutable per-process state
    let workspace = match Workspace::new(&cli.workspaces) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("✗ Failed to prepare workspace root: {}", e);
            eprintln!("  Path: {}", cli.workspaces);
            std::process::exit(1);
        }
    };
    let state = AppState {
        github: Arc::new(GithubClient::new(github_token)),
        workspace,
    };

    let canonical_workspaces = std::fs::canonicalize(&cli.workspaces)
        .unwrap_or_else(|_| PathBuf::from(&cli.workspaces))
        .to_string_lossy()
        .to_string();

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = routes::create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Bind to the port
    let addr = format!("127.0.0.1:{}", cli.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("✗ Failed to bind to port {}: {}", cli.port, e);
            eprintln!("  Try a different port with --port <PORT>");
            std::process::exit(1);
        }
    };

    // Write PID file
    let pid_info = PidInfo {
        pid: std::process::id(),
        workspaces: canonical_workspaces.clone(),
        port: cli.port,
    };
    write_pid_info(&pid_info)?;

    // Print startup message
    let url = format!("http://127.0.0.1:{}", cli.port);
    println!();
    println!("  ┌─────────────────────────────────────────────┐");
    println!("  │                 git-bridge                  │");
    println!("  └─────────────────────────────────────────────┘");
    println!();
    println!("  Workspaces: {}", canonical_workspaces);
    println!("  Webhook:    {}/api/webhook", url);
    println!();
    println!("  Commands:");
    println!("    git-bridge status  - Check if running");
    println!("    git-bridge kill    - Stop the server");
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    // Set up graceful shutdown
    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        println!("\n  Shutting down...");
        remove_pid_file();
    };

    // Start the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
