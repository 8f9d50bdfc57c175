use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

const FIXTURE: &str = "tests/fixtures/grid.json";

fn answergrid() -> Command {
    Command::new(cargo_bin!("answergrid"))
}

#[test]
fn test_table_prints_current_grid() {
    answergrid()
        .args(["--fixture", FIXTURE])
        .args(["table", "--questionnaire-id", "1", "--feature-group-id", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("row,Risk,Impact,Outcome"))
        .stdout(predicate::str::contains("1,High,,"));
}

#[test]
fn test_set_resolves_combination_outcome() {
    answergrid()
        .args(["--fixture", FIXTURE])
        .args([
            "set",
            "--questionnaire-id",
            "1",
            "--feature-group-id",
            "1",
            "--row",
            "1",
            "--validation",
            "2",
            "Low",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1,High,Low,Review"));
}

#[test]
fn test_set_uses_estonian_outcome_label() {
    answergrid()
        .args(["--fixture", FIXTURE, "--locale", "et"])
        .args([
            "set",
            "--questionnaire-id",
            "1",
            "--feature-group-id",
            "1",
            "--row",
            "1",
            "--validation",
            "2",
            "Low",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1,High,Low,Vaata ule"));
}

#[test]
fn test_add_row_appends_empty_row() {
    answergrid()
        .args(["--fixture", FIXTURE])
        .args([
            "add-row",
            "--questionnaire-id",
            "1",
            "--feature-group-id",
            "1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2,,,"));
}

#[test]
fn test_delete_unknown_row_fails() {
    answergrid()
        .args(["--fixture", FIXTURE])
        .args([
            "delete-row",
            "--questionnaire-id",
            "1",
            "--feature-group-id",
            "1",
            "--row",
            "42",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("42"));
}

#[test]
fn test_summaries_follow_locale() {
    answergrid()
        .args(["--fixture", FIXTURE, "--locale", "et"])
        .args([
            "summaries",
            "--questionnaire-id",
            "1",
            "--feature-group-id",
            "1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Riskid kokku"));
}

#[test]
fn test_questionnaires_list() {
    answergrid()
        .args(["--fixture", FIXTURE])
        .args(["questionnaires", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Baseline"));
}

#[test]
fn test_questionnaires_add_with_temp_fixture() -> Result<(), Box<dyn std::error::Error>> {
    let mut fixture = NamedTempFile::new()?;
    write!(fixture, "{{}}")?;

    answergrid()
        .arg("--fixture")
        .arg(fixture.path())
        .args(["questionnaires", "add", "Regression round"])
        .assert()
        .success()
        .stdout(predicate::str::contains("created questionnaire"))
        .stdout(predicate::str::contains("Regression round"));

    Ok(())
}

#[test]
fn test_backend_flag_is_required() {
    answergrid()
        .args(["questionnaires", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--api-url"));
}

#[test]
fn test_api_url_conflicts_with_fixture() {
    answergrid()
        .args(["--api-url", "http://localhost:8080", "--fixture", FIXTURE])
        .args(["questionnaires", "list"])
        .assert()
        .failure();
}
