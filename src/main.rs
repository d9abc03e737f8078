//! CLI tool to check Lua source files and dump their syntax trees.

use std::fs;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        eprintln!("Usage: luaparse <command> [files...]");
        eprintln!();
        eprintln!("Commands:");
        eprintln!("  validate  Check if Lua file(s) parse");
        eprintln!("  tokens    Dump the token stream of file(s)");
        eprintln!("  ast       Print the syntax tree of file(s)");
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  luaparse validate script.lua");
        eprintln!("  luaparse ast script.lua");
        return ExitCode::from(2);
    }

    let command = args[1].as_str();
    let files = &args[2..];

    if files.is_empty() {
        eprintln!("Error: no files specified");
        return ExitCode::from(2);
    }

    let mut had_error = false;

    for path in files {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{path}: {e}");
                had_error = true;
                continue;
            }
        };

        match command {
            "validate" => match luaparse_rs::parse_str(&content) {
                Ok(parsed) => {
                    let stats = parsed.chunk.body.stats.len()
                        + usize::from(parsed.chunk.body.last.is_some());
                    let lex = parsed.lex_errors.len();
                    eprintln!("{path}: valid ({stats} statement(s), {lex} lexical error(s))");
                    if lex > 0 {
                        had_error = true;
                    }
                }
                Err(e) => {
                    eprintln!("{path}: {e}");
                    had_error = true;
                }
            },
            "tokens" => {
                let lexed = luaparse_rs::tokenize(&content);
                for tok in &lexed.tokens {
                    println!("{}:{}\t{}", tok.span.line, tok.span.column, tok.kind);
                }
                for err in &lexed.errors {
                    eprintln!("{path}: {err}");
                    had_error = true;
                }
            }
            "ast" => match luaparse_rs::parse_str(&content) {
                Ok(parsed) => {
                    println!("{:#?}", parsed.chunk);
                    for err in &parsed.lex_errors {
                        eprintln!("{path}: {err}");
                    }
                }
                Err(e) => {
                    eprintln!("{path}: {e}");
                    had_error = true;
                }
            },
            _ => {
                eprintln!("Unknown command: {command}");
                return ExitCode::from(2);
            }
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
