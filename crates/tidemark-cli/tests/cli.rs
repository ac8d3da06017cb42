use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tidemark(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tidemark").unwrap();
    cmd.current_dir(workdir);
    for var in [
        "TIDEMARK_CONFIG",
        "TIDEMARK_DIR",
        "TIDEMARK_SQLITE",
        "TIDEMARK_HIGHLIGHT",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn setup() -> TempDir {
    let workdir = TempDir::new().unwrap();
    fs::create_dir(workdir.path().join("migrations")).unwrap();
    workdir
}

fn write_migration(workdir: &TempDir, name: &str, sql: &str) {
    fs::write(workdir.path().join("migrations").join(name), sql).unwrap();
}

fn migrate(workdir: &TempDir) -> Command {
    let mut cmd = tidemark(workdir.path());
    cmd.args(["--dir", "migrations", "--sqlite", "app.db"]);
    cmd
}

#[test]
fn test_migrate_then_history() {
    let workdir = setup();
    write_migration(&workdir, "1-init.sql", "CREATE TABLE users (id INTEGER PRIMARY KEY);");
    write_migration(&workdir, "2-add-col.sql", "ALTER TABLE users ADD COLUMN email TEXT;");

    migrate(&workdir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Applying migration: 1-init.sql"))
        .stdout(predicate::str::contains("Applying migration: 2-add-col.sql"))
        .stdout(predicate::str::contains("Applied 2 migration(s)"));

    let output = migrate(&workdir).arg("history").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let newer = stdout.find("2-add-col.sql").unwrap();
    let older = stdout.find("1-init.sql").unwrap();
    assert!(newer < older, "history should be newest first:\n{stdout}");
    assert!(stdout.contains("Migration name"));
}

#[test]
fn test_second_run_is_noop() {
    let workdir = setup();
    write_migration(&workdir, "1-init.sql", "CREATE TABLE users (id INTEGER PRIMARY KEY);");

    migrate(&workdir).assert().success();
    migrate(&workdir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No pending migrations (watermark: 1)"));
}

#[test]
fn test_empty_directory_is_success() {
    let workdir = setup();
    migrate(&workdir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No pending migrations"));
}

#[test]
fn test_malformed_file_fails_before_applying() {
    let workdir = setup();
    write_migration(&workdir, "1-init.sql", "CREATE TABLE users (id INTEGER PRIMARY KEY);");
    write_migration(&workdir, "abc-notanumber.sql", "SELECT 1;");

    migrate(&workdir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("abc-notanumber.sql"))
        .stderr(predicate::str::contains("--help"));

    migrate(&workdir)
        .args(["--format", "json", "history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_failed_migration_halts_run() {
    let workdir = setup();
    write_migration(&workdir, "1-a.sql", "CREATE TABLE a (id INTEGER);");
    write_migration(&workdir, "2-b.sql", "THIS IS NOT SQL;");
    write_migration(&workdir, "3-c.sql", "CREATE TABLE c (id INTEGER);");

    migrate(&workdir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("2-b.sql"));

    let output = migrate(&workdir).args(["--format", "json", "history"]).output().unwrap();
    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<_> = records
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["1-a.sql"]);
}

#[test]
fn test_verbose_echoes_wrapped_sql() {
    let workdir = setup();
    write_migration(&workdir, "1-init.sql", "CREATE TABLE users (id INTEGER PRIMARY KEY);");

    migrate(&workdir)
        .arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "BEGIN;\nCREATE TABLE users (id INTEGER PRIMARY KEY);\nCOMMIT;",
        ));
}

#[test]
fn test_missing_directory_fails() {
    let workdir = setup();
    tidemark(workdir.path())
        .args(["--dir", "nope", "--sqlite", "app.db"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot read migration directory"));
}

#[test]
fn test_config_file_settings_are_used() {
    let workdir = setup();
    write_migration(&workdir, "1-init.sql", "CREATE TABLE users (id INTEGER PRIMARY KEY);");
    fs::write(
        workdir.path().join("tidemark.toml"),
        "dir = \"migrations\"\nsqlite = \"app.db\"\n",
    )
    .unwrap();

    tidemark(workdir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied 1 migration(s)"));

    tidemark(workdir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dir = migrations"))
        .stdout(predicate::str::contains("sqlite = app.db"));
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let workdir = setup();

    tidemark(workdir.path())
        .args(["config", "init"])
        .assert()
        .success();
    assert!(workdir.path().join("tidemark.toml").is_file());

    tidemark(workdir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn test_missing_config_file_reports_path() {
    let workdir = setup();
    tidemark(workdir.path())
        .args(["--config", "absent.toml", "config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot read config file absent.toml: "));
}

#[test]
fn test_completions_generate_script() {
    let workdir = setup();
    for shell in ["bash", "zsh", "fish"] {
        tidemark(workdir.path())
            .args(["completions", shell])
            .assert()
            .success()
            .stdout(predicate::str::contains("tidemark"));
    }

    tidemark(workdir.path())
        .args(["completions", "powershell"])
        .assert()
        .failure();
}
