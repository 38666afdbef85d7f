use std::env;
use std::io;
use std::process::ExitCode;

use levelcheck_cli::{run, CommandKind, CommonOptions};

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::from(1)
        }
    }
}

fn run_cli() -> Result<(), String> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        return Err(usage_text());
    }
    if args[0] == "-h" || args[0] == "--help" {
        print_usage();
        return Ok(());
    }

    let mut options = CommonOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "--warnings-as-errors" => {
                options.warnings_as_errors = true;
                index += 1;
            }
            "--quiet" => {
                options.quiet = true;
                index += 1;
            }
            _ => break,
        }
    }

    let command = args
        .get(index)
        .ok_or_else(|| "missing subcommand".to_string())?
        .as_str();
    let command_args = &args[(index + 1)..];

    let kind = match command {
        "check" => {
            if command_args.is_empty() {
                return Err("check requires at least one level file".to_string());
            }
            CommandKind::Check {
                paths: command_args.to_vec(),
            }
        }
        "scan" => {
            if command_args.len() != 1 {
                return Err("scan requires exactly one directory".to_string());
            }
            CommandKind::Scan {
                dir: command_args[0].clone(),
            }
        }
        other => return Err(format!("unknown subcommand '{other}'")),
    };

    run(kind, options, &mut io::stdout())
}

fn print_usage() {
    println!("{}", usage_text());
}

fn usage_text() -> String {
    [
        "levelcheck - static validation for level files",
        "",
        "Usage:",
        "  levelcheck [--warnings-as-errors] [--quiet] check <file.tmx...>",
        "  levelcheck [--warnings-as-errors] [--quiet] scan <levels-dir>",
        "",
        "Checks:",
        "  exactly one player spawn per level",
        "  portal destinations name a level in the checked set",
        "  portal handoff points land inside the destination",
        "  objects sit inside the level's pixel bounds",
        "  every level has a portal, exit, or princess",
    ]
    .join("\n")
}
