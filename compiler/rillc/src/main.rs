//! Rill compiler CLI.

use std::io::Write as _;
use std::path::Path;

use rillc::pipeline::{evaluate_source, Outcome};
use rillc::reporting::render_reports;
use rillc::session::{LineOutcome, ReplSession, HELP_TEXT};
use rillc::snapshot::run_snapshots;

fn main() {
    rillc::tracing_setup::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "repl" => {
            let no_color = args.iter().any(|a| a == "--no-color");
            let no_header = args.iter().any(|a| a == "--no-header");
            if args.iter().any(|a| a == "--help") {
                print_repl_usage();
                return;
            }
            run_repl(!no_color, !no_header);
        }
        "run" => {
            if args.len() < 3 {
                eprintln!("Usage: rill run <file.rill>");
                std::process::exit(1);
            }
            run_file(&args[2]);
        }
        "snapshot" => {
            let mut dir = "snapshots".to_owned();
            let mut update = false;
            let mut filter: Option<String> = None;
            for arg in args.iter().skip(2) {
                if arg == "--update" {
                    update = true;
                } else if let Some(f) = arg.strip_prefix("--filter=") {
                    filter = Some(f.to_owned());
                } else if !arg.starts_with('-') {
                    dir.clone_from(arg);
                }
            }
            run_snapshot_suite(&dir, update, filter.as_deref());
        }
        "help" | "--help" | "-h" => print_usage(),
        "version" | "--version" | "-v" => {
            println!("Rill Compiler {}", env!("CARGO_PKG_VERSION"));
        }
        other => {
            // A bare `.rill` path runs the file.
            if Path::new(other)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("rill"))
            {
                run_file(other);
            } else {
                eprintln!("Unknown command: {other}");
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }
}

/// The interactive REPL. Exit code 0.
fn run_repl(use_color: bool, header: bool) {
    if header {
        println!("Rill {} — :help for help, :q to quit", env!("CARGO_PKG_VERSION"));
    }
    let mut session = ReplSession::new(use_color);
    let stdin = std::io::stdin();
    loop {
        print!("» ");
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("error reading input: {e}");
                std::process::exit(2);
            }
        }
        match session.eval_line(&line) {
            LineOutcome::Empty => {}
            LineOutcome::Value(value) => println!("{value}"),
            LineOutcome::Report(report) => println!("{report}"),
            LineOutcome::Help => println!("{HELP_TEXT}"),
            LineOutcome::Exit => break,
        }
    }
}

/// Evaluate a `.rill` file and print its result value.
///
/// Exit codes: 0 on success, 1 when errors were reported, 2 on a fatal
/// or internal compiler error.
fn run_file(path: &str) {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("cannot read {path}: {e}");
            std::process::exit(1);
        }
    };
    let interner = rill_ir::StringInterner::new();
    let result = evaluate_source(&source, &interner, rill_eval::DEFAULT_CAPACITY);

    if !result.reports.is_empty() {
        eprintln!("{}", render_reports(&result.reports, &source, true));
    }
    let has_errors = result.has_errors();
    match result.outcome {
        Outcome::Value { rendered, type_str } => {
            println!("{rendered} : {type_str}");
            if has_errors {
                std::process::exit(1);
            }
        }
        Outcome::Skipped => std::process::exit(1),
        Outcome::EvalFailed { diagnostic, fatal } => {
            eprintln!("{}", render_reports(&[diagnostic], &source, true));
            std::process::exit(if fatal { 2 } else { 1 });
        }
    }
}

/// Run the snapshot suite. Exit code 1 on any failure.
fn run_snapshot_suite(dir: &str, update: bool, filter: Option<&str>) {
    let summary = run_snapshots(Path::new(dir), update, filter);
    for path in &summary.updated {
        println!("updated {}", path.display());
    }
    for (path, reason) in &summary.failed {
        eprintln!("FAILED {}: {reason}", path.display());
    }
    println!(
        "{} passed, {} failed",
        summary.passed,
        summary.failed.len()
    );
    if !summary.is_success() {
        std::process::exit(1);
    }
}

fn print_usage() {
    println!("Rill Compiler {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: rill <command> [options]");
    println!();
    println!("Commands:");
    println!("  repl [--no-color] [--no-header]   interactive session");
    println!("  run <file.rill>                   evaluate a file");
    println!("  snapshot [dir] [--update] [--filter=NAME]");
    println!("                                    run the snapshot suite");
    println!("  help                              show this text");
    println!("  version                           show the version");
}

fn print_repl_usage() {
    println!("Usage: rill repl [--no-color] [--no-header]");
    println!();
    println!("  --no-color    plain-text reports");
    println!("  --no-header   skip the greeting line");
}
