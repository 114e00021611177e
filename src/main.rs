//! CLI entry point for kurgu
//!
//! Provides the terminal player and a database validation command.

use std::fs;
use std::path::PathBuf;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = &args[1];

    match command.as_str() {
        "play" => {
            let Some(path) = args.get(2) else {
                eprintln!("Error: Missing database file path");
                eprintln!();
                print_usage();
                process::exit(1);
            };
            run_play(PathBuf::from(path));
        }
        "check" => {
            let Some(path) = args.get(2) else {
                eprintln!("Error: Missing database file path");
                eprintln!();
                print_usage();
                process::exit(1);
            };
            run_check(PathBuf::from(path));
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Error: Unknown command '{command}'");
            eprintln!();
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    println!("kurgu - Dialogue Graph Engine");
    println!();
    println!("USAGE:");
    println!("    cargo run -- <command> <database.json>");
    println!();
    println!("COMMANDS:");
    println!("    play <file>     Play a dialogue database in the terminal");
    println!("    check <file>    Validate a dialogue database");
    println!("    --help, -h      Show this help message");
    println!();
    println!("EXAMPLES:");
    println!("    cargo run -- play scenarios/demo.json");
    println!("    cargo run -- check scenarios/demo.json");
}

fn read_source(path: &PathBuf) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Error: Failed to read file '{}'", path.display());
            eprintln!("Reason: {err}");
            process::exit(1);
        }
    }
}

fn run_play(path: PathBuf) {
    let source = read_source(&path);
    if let Err(err) = kurgu::cli::play::run_play(&source) {
        eprintln!("Error: Player mode failed");
        eprintln!("Reason: {err}");
        process::exit(1);
    }
}

fn run_check(path: PathBuf) {
    let source = read_source(&path);
    match kurgu::parse_database(&source) {
        Ok(database) => {
            let nodes: usize = database.characters.iter().map(|c| c.nodes.len()).sum();
            println!(
                "OK: {} characters, {} nodes, digest {}",
                database.characters.len(),
                nodes,
                kurgu::infrastructure::source_digest(&source)
            );
        }
        Err(err) => {
            eprintln!("Invalid database: {err}");
            process::exit(1);
        }
    }
}
