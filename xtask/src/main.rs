// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::path::Path;
use std::process::{Command, ExitCode};

const TASKS: &[(&str, &[&str])] = &[
    ("fmt", &["cargo fmt --all -- --check"]),
    (
        "lint",
        &["cargo clippy --workspace --all-targets -- -D warnings"],
    ),
    ("test", &["cargo test --workspace"]),
    (
        "check-contracts",
        &[
            "cargo test -p floorline-api --test error_contract --test openapi_lint",
            "cargo test -p floorline-server --test logging_format",
            "cargo test -p floorline-store --test ledger_contract",
        ],
    ),
    (
        "ci",
        &[
            "cargo fmt --all -- --check",
            "cargo clippy --workspace --all-targets -- -D warnings",
            "cargo test --workspace",
        ],
    ),
];

fn run(root: &Path, cmd: &str) -> Result<(), String> {
    let status = Command::new("sh")
        .arg("-lc")
        .arg(cmd)
        .current_dir(root)
        .status()
        .map_err(|e| format!("failed to run `{cmd}`: {e}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("command failed: {cmd}"))
    }
}

fn main() -> ExitCode {
    let arg = env::args().nth(1).unwrap_or_else(|| "help".to_string());
    let Some(root) = Path::new(env!("CARGO_MANIFEST_DIR")).parent() else {
        eprintln!("xtask must live one level below the workspace root");
        return ExitCode::FAILURE;
    };

    let result = match arg.as_str() {
        "help" | "--help" | "-h" => {
            eprintln!("xtask commands:");
            for (name, _) in TASKS {
                eprintln!("  {name}");
            }
            Ok(())
        }
        name => match TASKS.iter().find(|(task, _)| *task == name) {
            Some((_, steps)) => steps.iter().try_for_each(|step| run(root, step)),
            None => Err(format!(
                "unknown xtask command: {arg} (try `cargo run -p xtask -- help`)"
            )),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
