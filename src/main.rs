// cscc - The CompilScript frontend driver
//
// Usage:
//   cscc <input.csc>                Analyze only
//   cscc <input.csc> --emit-tac     Analyze, annotate, and print TAC
//   cscc <input.csc> --ast-dot      Print the typed AST as Graphviz DOT
//   cscc <input.csc> --scopes       Print the annotated scope tree as JSON
//   cscc <input.csc> --json         Print the full report as JSON

use std::env;
use std::fs;
use std::process;

use compilscript::compiler::{compile, CompileOptions};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let mut input_path: Option<String> = None;
    let mut emit_tac = false;
    let mut ast_dot = false;
    let mut scopes = false;
    let mut json = false;

    for arg in &args[1..] {
        match arg.as_str() {
            "--emit-tac" | "--tac" => emit_tac = true,
            "--ast-dot" | "--dot" => ast_dot = true,
            "--scopes" => scopes = true,
            "--json" => json = true,
            s if s.starts_with('-') => {
                eprintln!("error: unknown option: {s}");
                process::exit(1);
            }
            _ => {
                if input_path.is_some() {
                    eprintln!("error: multiple input files not supported");
                    process::exit(1);
                }
                input_path = Some(arg.clone());
            }
        }
    }

    let input = match input_path {
        Some(p) => p,
        None => {
            eprintln!("error: no input file");
            process::exit(1);
        }
    };

    let source = match fs::read_to_string(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read {input}: {e}");
            process::exit(1);
        }
    };

    let options = CompileOptions {
        return_ast_dot: ast_dot,
        generate_tac: emit_tac,
        annotate_memory: emit_tac || scopes,
    };
    let report = compile(&source, &options);

    for d in &report.diagnostics {
        let severity = if d.is_error() { "error" } else { "warning" };
        eprintln!(
            "{severity}[{:?}]: {}:{}:{}: {}",
            d.kind,
            input,
            d.line,
            d.column,
            d.message
        );
    }

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("error: cannot serialize report: {e}");
                process::exit(1);
            }
        }
    } else {
        if let Some(dot) = &report.ast_dot {
            println!("{dot}");
        }
        if let Some(tac) = &report.tac {
            for line in &tac.code {
                println!("{line}");
            }
        }
        if scopes {
            if let Some(tree) = &report.scopes {
                match serde_json::to_string_pretty(tree) {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        eprintln!("error: cannot serialize scopes: {e}");
                        process::exit(1);
                    }
                }
            }
        }
    }

    process::exit(if report.ok { 0 } else { 1 });
}

fn print_usage(program: &str) {
    eprintln!("cscc - The CompilScript frontend");
    eprintln!();
    eprintln!("Usage: {program} <input.csc> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --emit-tac   Generate and print three-address code");
    eprintln!("  --ast-dot    Print the typed AST as a Graphviz digraph");
    eprintln!("  --scopes     Print the annotated scope tree as JSON");
    eprintln!("  --json       Print the full report as JSON");
    eprintln!("  -h, --help   Show this help");
    eprintln!();
    eprintln!("Exit status is 0 iff no error-severity diagnostics were produced.");
}
