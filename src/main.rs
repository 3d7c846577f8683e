use std::env;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use flint_repl::diagnostics::{self, SessionDiagnostics};
use flint_repl::engine::{EngineConfig, ReplEngine, TurnError};

fn main() {
    let args: Vec<String> = env::args().collect();
    let debug = args.iter().any(|arg| arg == "--debug");

    let default_filter = if debug { "flint_repl=debug" } else { "flint_repl=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    let sink = Arc::new(SessionDiagnostics::new());
    let mut engine = ReplEngine::new(EngineConfig::default(), sink.clone());

    println!("flint repl. Type :quit to exit, :stats for timing data.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("flint> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let line = line.trim();

        match line {
            "" => continue,
            ":quit" | ":exit" => break,
            ":stats" => {
                for (operation, stats) in sink.snapshot() {
                    println!(
                        "{operation}: {} call(s), mean {:?}, max {:?}",
                        stats.count,
                        stats.mean(),
                        stats.max
                    );
                }
                continue;
            }
            _ => {}
        }

        match engine.submit_turn(line) {
            Ok(output) => print!("{output}"),
            Err(TurnError::Classify(error)) => diagnostics::emit_classify_error(line, &error),
            Err(TurnError::Compile {
                program,
                diagnostics: compile_diagnostics,
            }) => diagnostics::emit_compile_failure(&program, &compile_diagnostics),
            Err(error) => eprintln!("{}", error.user_message()),
        }
    }

    sink.flush();
}
