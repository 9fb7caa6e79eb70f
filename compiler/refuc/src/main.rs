//! `refuc` binary entry point.
//!
//! Exit codes: 0 on success, 1 on any syntax or semantic error, 2 on a
//! driver error (I/O, cycles, internal invariants).

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use refuc::{CompileOptions, Compiler};

const USAGE: &str = "\
usage: refuc [options] FILE

options:
    --print-rir              print the lowered RIR of every module
    --no-warn-implicit       silence implicit-conversion warnings
    --continue-is-exit       treat serialize 'continue' like 'exit'
    -h, --help               show this help
";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut options = CompileOptions::default();
    let mut input: Option<String> = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--print-rir" => options.print_rir = true,
            "--no-warn-implicit" => options.warn_implicit_conversions = false,
            "--continue-is-exit" => options.stop_after_serialize_continue = true,
            "-h" | "--help" => {
                print!("{USAGE}");
                return ExitCode::SUCCESS;
            }
            other if other.starts_with('-') => {
                eprintln!("unknown option '{other}'\n{USAGE}");
                return ExitCode::from(2);
            }
            file => {
                if input.replace(file.to_string()).is_some() {
                    eprintln!("more than one input file\n{USAGE}");
                    return ExitCode::from(2);
                }
            }
        }
    }
    let Some(input) = input else {
        eprintln!("no input file\n{USAGE}");
        return ExitCode::from(2);
    };

    let mut compiler = Compiler::new(options);
    let result = compiler
        .add_root_file(&input)
        .and_then(|_| compiler.run());

    // flush collected diagnostics regardless of how the run ended
    print!("{}", compiler.flush_diagnostics());

    match result {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            eprintln!("refuc: {e}");
            ExitCode::from(2)
        }
    }
}
