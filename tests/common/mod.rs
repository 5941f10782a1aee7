#![allow(dead_code)]

use assert_cmd::cargo_bin;
use std::path::Path;
use std::process::Command;

/// A `loantrack` invocation bound to `data_file`.
pub fn loantrack(data_file: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin!("loantrack"));
    cmd.arg("--data-file")
        .arg(data_file)
        .env_remove("RUST_LOG");
    cmd
}

/// Runs `loantrack add` with `args` and returns the new loan id.
pub fn add_loan(data_file: &Path, args: &[&str]) -> String {
    let output = loantrack(data_file)
        .arg("add")
        .args(args)
        .output()
        .expect("Failed to execute command");
    assert!(
        output.status.success(),
        "add failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

pub fn flat_car_loan(data_file: &Path) -> String {
    add_loan(
        data_file,
        &[
            "--name", "Car Loan", "--principal", "10000", "--rate", "10", "--term", "5",
            "--start", "2025-01-01", "--model", "flat", "--cadence", "weekly",
        ],
    )
}
