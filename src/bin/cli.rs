//! quarrydb - interactive SQL shell

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use quarrydb::executor::SqlExecutor;
use quarrydb::sql::Parser;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let dir = match std::env::args().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => {
            eprintln!("Usage: quarrydb <data-dir>");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("cannot initialise database directory {}: {}", dir.display(), e);
        return ExitCode::FAILURE;
    }

    println!("(quarrydb: running with database at {})", dir.display());
    let mut executor = SqlExecutor::new(&dir);

    let stdin = io::stdin();
    loop {
        print!("SQL> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("error reading input: {}", e);
                break;
            }
        }

        let sql = line.trim();
        if sql.is_empty() {
            continue;
        }
        if sql == "quit" {
            break;
        }

        run_statement(&mut executor, sql);
    }

    ExitCode::SUCCESS
}

/// Parse and execute one statement, printing its result or error.
fn run_statement(executor: &mut SqlExecutor, sql: &str) {
    let statement = match Parser::new(sql).and_then(|mut parser| parser.parse()) {
        Ok(statement) => statement,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };
    match executor.execute(&statement) {
        Ok(result) => println!("{}", result),
        Err(e) => println!("Error: {}", e),
    }
}
