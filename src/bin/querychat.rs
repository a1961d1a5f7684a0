//! Interactive chat client for a retrieval-augmented query endpoint.
//!
//! Each line typed is posted to the endpoint together with the current
//! retrieval parameters; the answer is revealed a few characters at a time.
//!
//! # Usage
//!
//! ```bash
//! # Query the default endpoint at http://localhost:5000/query
//! querychat
//!
//! # Point at another server and tune retrieval
//! querychat --endpoint http://search.internal:8080/query --top-k 8 --alpha 0.4
//!
//! # Load defaults from a settings file
//! querychat --config querychat.yaml
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/top_k`, `/multi_n`, `/alpha` - Tune the next query
//! - `/params` - Show current parameters
//! - `/debug` - Show the last raw response or error
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application
//!
//! Press Ctrl+C while an answer is being revealed to show all of it at once,
//! or while waiting for one to give up on the query.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use querychat::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, help_text,
    parse_command,
};
use querychat::params::ParameterName;

/// Main entry point for the querychat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = ChatArgs::from_command_line_relaxed("querychat [OPTIONS]");
    let config = ChatConfig::try_from(args)?;
    let use_color = config.use_color;

    let mut session = ChatSession::new(config)?;
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut rl = DefaultEditor::new()?;

    // During a reply, Ctrl+C (or SIGTERM/SIGHUP) ends the reply.  Anywhere
    // else the signal ends the process.
    let replying = Arc::new(AtomicBool::new(false));
    let (interrupt_tx, mut interrupt_rx) = mpsc::unbounded_channel();
    let replying_clone = replying.clone();
    ctrlc::set_handler(move || {
        if !replying_clone.load(Ordering::SeqCst) || interrupt_tx.send(()).is_err() {
            std::process::exit(130);
        }
    })?;

    println!("Query Chat (endpoint: {})", session.config().endpoint);
    println!("Type /help for commands, /quit to exit\n");

    loop {
        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Set(name, value) => {
                            if session.set_parameter(name, value) {
                                let now = session.parameters().get(name);
                                renderer.print_info(&format!("{name} set to {}", describe(name, now)));
                            } else {
                                renderer.print_error("Parameters cannot change right now.");
                            }
                        }
                        ChatCommand::Params => {
                            print_params(&session);
                        }
                        ChatCommand::ShowDebug => {
                            session.open_debug_view();
                            renderer.print_debug(session.debug_payload());
                        }
                        ChatCommand::CloseDebug => {
                            session.close_debug_view();
                            renderer.print_info("Debug view closed.");
                        }
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                while interrupt_rx.try_recv().is_ok() {}

                if !session.submit(line) {
                    continue;
                }
                replying.store(true, Ordering::SeqCst);
                renderer.print_waiting();
                loop {
                    tokio::select! {
                        update = session.next_update() => match update {
                            Some(update) => renderer.render_update(&update),
                            None => break,
                        },
                        Some(()) = interrupt_rx.recv() => {
                            // Skip the reveal, or give up on the wait.
                            let update = session.finish_reveal().or_else(|| session.abandon());
                            if let Some(update) = update {
                                renderer.render_update(&update);
                            }
                        }
                    }
                }
                replying.store(false, Ordering::SeqCst);
                if session.is_debug_view_open() {
                    renderer.print_debug(session.debug_payload());
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn describe(name: ParameterName, value: f64) -> String {
    match name {
        ParameterName::HybridWeight => format!("{value:.2}"),
        ParameterName::ResultCount | ParameterName::FanOut => format!("{value:.0}"),
    }
}

fn print_params(session: &ChatSession) {
    let params = session.parameters();
    println!("    Query Parameters:");
    for name in ParameterName::ALL {
        let (lo, hi) = name.bounds();
        println!(
            "      {}: {} (range {lo}-{hi})",
            name,
            describe(name, params.get(name))
        );
    }
}

fn print_stats(session: &ChatSession) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Session id: {}", stats.session_id);
    println!("      Endpoint: {}", session.config().endpoint);
    println!("      Status: {}", stats.status);
    println!("      Messages: {}", stats.message_count);
    println!(
        "      Parameters: {}{}",
        stats.parameters,
        if stats.parameters_frozen { " (frozen)" } else { "" }
    );
    println!(
        "      Reveal: {} char(s) every {}ms",
        stats.reveal_chunk_chars,
        stats.reveal_interval.as_millis()
    );
    println!(
        "      Queries: {} sent, {} answered, {} failed, {} dropped while busy",
        stats.submissions, stats.completed, stats.failures, stats.rejections
    );
}
