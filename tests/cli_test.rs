use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn fixture_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_cli_settles_fixture_end_to_end() {
    let file = fixture_file(
        r#"{
        "accounts": [{
            "host": 10,
            "pending_balance": "100.00",
            "current_balance": "0",
            "total_earnings": "0",
            "payouts_enabled": true,
            "connected_account_id": "acct_10",
            "transfer_capability_enabled": true
        }],
        "payouts": [{
            "id": 1,
            "host": 10,
            "booking": 100,
            "amount": "100.00",
            "eligible_at": "2024-03-01T00:00:00Z"
        }],
        "trips": [{"booking": 100, "trip_ended_at": "2024-02-28T12:00:00Z"}]
    }"#,
    );

    let mut cmd = Command::new(cargo_bin!("payout-engine"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "processed 1 payouts totalling 100.00; 0 deferred, 0 failed",
        ))
        .stdout(predicate::str::contains(
            "host,pending_balance,current_balance,total_earnings,payouts_enabled,payouts_completed,payouts_failed",
        ))
        .stdout(predicate::str::contains("10,0.00,100.00,100.00,true,1,0"));
}

#[test]
fn test_cli_nets_fees_and_reports_gross() {
    let file = fixture_file(
        r#"{
        "accounts": [{
            "host": 10,
            "pending_balance": "100.00",
            "current_balance": "0",
            "total_earnings": "0",
            "payouts_enabled": true,
            "connected_account_id": "acct_10",
            "transfer_capability_enabled": true
        }],
        "payouts": [{
            "id": 1,
            "host": 10,
            "booking": 100,
            "amount": "100.00",
            "eligible_at": "2024-03-01T00:00:00Z"
        }],
        "fees": [{"id": 1, "host": 10, "amount": "30.00"}],
        "trips": [{"booking": 100, "trip_ended_at": "2024-02-28T12:00:00Z"}]
    }"#,
    );

    let mut cmd = Command::new(cargo_bin!("payout-engine"));
    cmd.arg(file.path());

    // Fees shrink the external transfer, never the earnings figures.
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("totalling 100.00"))
        .stdout(predicate::str::contains("10,0.00,100.00,100.00,true,1,0"));
}

#[test]
fn test_cli_reports_terminal_failure_alert() {
    let file = fixture_file(
        r#"{
        "accounts": [{
            "host": 10,
            "pending_balance": "100.00",
            "current_balance": "0",
            "total_earnings": "0",
            "payouts_enabled": true,
            "connected_account_id": "acct_10",
            "transfer_capability_enabled": true
        }],
        "payouts": [{
            "id": 1,
            "host": 10,
            "booking": 100,
            "amount": "100.00",
            "eligible_at": "2024-03-01T00:00:00Z"
        }],
        "trips": [{"booking": 100, "trip_ended_at": "2024-02-28T12:00:00Z"}],
        "processor_failures": [{
            "host": 10,
            "failures": ["timeout", "timeout", "timeout"]
        }]
    }"#,
    );

    let mut cmd = Command::new(cargo_bin!("payout-engine"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1 failed"))
        .stderr(predicate::str::contains("ALERT host=10"))
        .stdout(predicate::str::contains("10,100.00,0,0,true,0,1"));
}
