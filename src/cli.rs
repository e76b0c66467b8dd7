//! Command-line front end for the application shell.
//!
//! Each invocation is one short-lived session: the persisted token is
//! restored at startup, a single command runs, and any token change is
//! written back before exit.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::{AppShell, LoginOutcome, SessionState};

#[derive(Debug, Parser)]
#[command(name = "url-frontend", version, about = "URL shortener client shell")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Exchange credentials for a token and store it.
    Login {
        username: String,
        #[arg(long, env = "AUTH_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored token.
    Logout,
    /// Show the current session.
    Status,
    /// Create an account on the auth service.
    Register {
        username: String,
        #[arg(long, env = "AUTH_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        verify_password: String,
    },
    /// Ask the auth service whether the stored token is still valid.
    Verify,
    /// Resolve a location against the route table.
    Route { location: String },
    /// Print the route table.
    Routes,
}

/// run
///
/// Executes one command against the shell and maps the result to an exit code.
pub async fn run(shell: &mut AppShell, command: Command) -> ExitCode {
    match command {
        Command::Login { username, password } => {
            match shell.auth.login(&username, &password).await {
                LoginOutcome::Authenticated => {
                    println!("logged in as {username}");
                    ExitCode::SUCCESS
                }
                LoginOutcome::Failed(error) => {
                    eprintln!("login failed: {error}");
                    ExitCode::FAILURE
                }
                LoginOutcome::Superseded { latest } => {
                    eprintln!("login superseded by request #{latest}");
                    ExitCode::FAILURE
                }
            }
        }
        Command::Logout => {
            shell.auth.logout().await;
            println!("logged out");
            ExitCode::SUCCESS
        }
        Command::Status => {
            let session = shell.auth.session();
            println!("state: {}", describe(session.state()));
            match &session.token {
                Some(token) => println!("token: present ({} chars)", token.len()),
                None => println!("token: none"),
            }
            if let Some(error) = &session.error {
                println!("error: {error}");
            }
            ExitCode::SUCCESS
        }
        Command::Register {
            username,
            password,
            verify_password,
        } => match shell
            .auth
            .register(&username, &password, &verify_password)
            .await
        {
            Ok(response) => {
                println!("{}", response.message);
                ExitCode::SUCCESS
            }
            Err(error) => {
                eprintln!("register failed: {error}");
                ExitCode::FAILURE
            }
        },
        Command::Verify => match shell.auth.verify().await {
            Ok(true) => {
                println!("token is valid");
                ExitCode::SUCCESS
            }
            Ok(false) => {
                println!("no valid token");
                ExitCode::FAILURE
            }
            Err(error) => {
                eprintln!("verify failed: {error}");
                ExitCode::FAILURE
            }
        },
        Command::Route { location } => {
            let route = shell.navigator.push(&location);
            println!("{} -> {} ({})", location, route.name, route.view);
            ExitCode::SUCCESS
        }
        Command::Routes => {
            let table = shell.navigator.table();
            for route in table.routes() {
                let href = table.href(&route.name).unwrap_or_else(|_| route.path.clone());
                println!("{:<10} {:<12} {}", route.name, route.view.to_string(), href);
            }
            let fallback = table.not_found();
            println!("{:<10} {:<12} {}", fallback.name, fallback.view.to_string(), fallback.path);
            ExitCode::SUCCESS
        }
    }
}

fn describe(state: SessionState) -> &'static str {
    match state {
        SessionState::Idle => "idle",
        SessionState::LoggingIn => "logging in",
        SessionState::Authenticated => "authenticated",
        SessionState::Failed => "failed",
    }
}
