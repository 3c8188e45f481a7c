//! CLI integration tests.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn para(top: f32, left: f32, text: &str) -> String {
    format!(
        r#"<p style="top:{top}pt;left:{left}pt"><span style="font-size:9pt">{text}</span></p>"#
    )
}

fn statement(rows: &[(&str, &str, &str, &str)]) -> String {
    let mut body = String::new();
    for (i, (date, desc, amount, balance)) in rows.iter().enumerate() {
        let top = 100.0 + i as f32 * 24.0;
        body.push_str(&para(top, 57.0, date));
        body.push_str(&para(top, 150.0, desc));
        body.push_str(&para(top, 400.0, amount));
        body.push_str(&para(top, 500.0, balance));
    }
    format!(r#"<html><body><div id="page0">{body}</div></body></html>"#)
}

fn statex() -> Command {
    Command::cargo_bin("statex").unwrap()
}

#[test]
fn process_prints_extracted_records() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("march.html");
    fs::write(
        &input,
        statement(&[("01.03.2024", "Coffee shop", "-32,50", "1.204,50")]),
    )
    .unwrap();

    statex()
        .args(["process", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Coffee shop"))
        .stdout(predicate::str::contains("1 records"));
}

#[test]
fn batch_writes_the_consolidated_csv() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("a.html"),
        statement(&[("01.03.2024", "Coffee shop", "-32,50", "1.204,50")]),
    )
    .unwrap();
    fs::write(
        dir.path().join("b.html"),
        statement(&[("02.03.2024", "Salary", "+1.000,00", "2.204,50")]),
    )
    .unwrap();

    statex()
        .current_dir(dir.path())
        .args(["batch", "*.html", "--output", "out.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Extracted 2 records"));

    let csv = fs::read_to_string(dir.path().join("out.csv")).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("Date,Description,Amount,Balance,SourceDocument")
    );
    assert_eq!(
        lines.next(),
        Some("2024-03-01,Coffee shop,-32.50,1204.50,a.html")
    );
    assert_eq!(
        lines.next(),
        Some("2024-03-02,Salary,1000.00,2204.50,b.html")
    );
}

#[test]
fn batch_continues_past_a_malformed_document() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("good.html"),
        statement(&[("01.03.2024", "Coffee shop", "-32,50", "1.204,50")]),
    )
    .unwrap();
    fs::write(dir.path().join("bad.html"), "<html><body>nope</body></html>").unwrap();

    statex()
        .current_dir(dir.path())
        .args(["batch", "*.html"])
        .assert()
        .success()
        .stdout(predicate::str::contains("malformed document skipped"))
        .stdout(predicate::str::contains("Extracted 1 records"));
}

#[test]
fn batch_fails_when_nothing_matches() {
    let dir = tempfile::tempdir().unwrap();

    statex()
        .current_dir(dir.path())
        .args(["batch", "*.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn name_filter_narrows_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("1001 Statement 1.html"),
        statement(&[("01.03.2024", "Coffee shop", "-32,50", "1.204,50")]),
    )
    .unwrap();
    fs::write(
        dir.path().join("notes.html"),
        statement(&[("02.03.2024", "Salary", "+1.000,00", "2.204,50")]),
    )
    .unwrap();

    statex()
        .current_dir(dir.path())
        .args(["batch", "*.html", "--name-filter", r"^\d+ Statement \d+"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 1 statements"));
}
