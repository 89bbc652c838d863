mod common;

use std::fs;

use assert_cmd::Command;
use csv_to_sql::metadata::TableReport;
use csv_to_sql::schema::ColumnType;
use predicates::str::contains;

use common::TestWorkspace;

fn csv_to_sql() -> Command {
    Command::cargo_bin("csv-to-sql").expect("binary exists")
}

#[test]
fn converts_sample_csv_into_create_and_insert() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.csv", "id,name,amount\n1,Alice,10.50\n2,Bob,5.00\n");
    let output = workspace.join("orders.sql");

    csv_to_sql()
        .args([input.to_str().unwrap(), output.to_str().unwrap()])
        .assert()
        .success();

    let sql = fs::read_to_string(&output).expect("read sql");
    assert!(sql.starts_with("DROP TABLE IF EXISTS orders;"));
    assert!(sql.contains("id INT(1) UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY"));
    assert!(sql.contains("name VARCHAR(5)"));
    assert!(sql.contains("amount DECIMAL(2,2)"));
    assert!(sql.contains("INSERT INTO orders (id, name, amount) VALUES"));
    assert!(sql.contains("(\"1\",\"Alice\",\"10.50\"),\n(\"2\",\"Bob\",\"5.00\");"));
}

#[test]
fn missing_output_argument_prints_usage() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("in.csv", "id\n1\n");

    csv_to_sql()
        .arg(input.to_str().unwrap())
        .assert()
        .failure()
        .stderr(contains("Usage"));
}

#[test]
fn unreadable_input_fails_without_output() {
    let workspace = TestWorkspace::new();
    let missing = workspace.join("missing.csv");
    let output = workspace.join("out.sql");

    csv_to_sql()
        .args([missing.to_str().unwrap(), output.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("Unable to read input"));
    assert!(!output.exists());
}

#[test]
fn ragged_row_is_reported_and_nothing_is_written() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("bad.csv", "a,b,c\n1,2,3\n4,5\n");
    let output = workspace.join("bad.sql");

    csv_to_sql()
        .args([input.to_str().unwrap(), output.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("Record 3 has 2 field(s) but the header declares 3"));
    assert!(!output.exists());
}

#[test]
fn writes_to_stdout_with_table_override() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("people.csv", "id,bio\n1,\"line one\nline \"\"two\"\"\"\n");

    csv_to_sql()
        .args([input.to_str().unwrap(), "-", "--table", "people"])
        .assert()
        .success()
        .stdout(contains("CREATE TABLE people ("))
        .stdout(contains("(\"1\",\"line one<br />line \\\"two\\\"\");"));
}

#[test]
fn custom_delimiter_and_quoted_headers() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("events.tsv", "Event ID\twhen\n1\t2024-01-01 08:00:00\n");
    let output = workspace.join("events.sql");

    csv_to_sql()
        .args([
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "--delimiter",
            "tab",
        ])
        .assert()
        .success();

    let sql = fs::read_to_string(&output).expect("read sql");
    assert!(sql.contains("`Event ID` INT(1) UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY"));
    assert!(sql.contains("when DATETIME"));
}

#[test]
fn schema_json_describes_each_column() {
    let workspace = TestWorkspace::new();
    let long = "z".repeat(1200);
    let input = workspace.write(
        "notes.csv",
        &format!("id,flag,body,delta\n1,,short,-3\n2,,{long},4\n"),
    );
    let output = workspace.join("notes.sql");
    let report_path = workspace.join("notes.json");

    csv_to_sql()
        .args([
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "--schema-json",
            report_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let report = TableReport::load(&report_path).expect("load report");
    assert_eq!(report.table, "notes");
    assert_eq!(report.primary_key.as_deref(), Some("id"));
    assert_eq!(report.rows, 2);
    assert_eq!(report.columns[1].descriptor, Some(ColumnType::FixedChar { size: 1 }));
    assert_eq!(report.columns[1].sql_type, "CHAR(1)");
    assert_eq!(report.columns[2].descriptor, Some(ColumnType::Text));
    assert_eq!(report.columns[3].sql_type, "INT(1)");
}

#[test]
fn text_threshold_flag_lowers_widening_limit() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("t.csv", "id,label\n1,abcdefghijkl\n");
    let output = workspace.join("t.sql");

    csv_to_sql()
        .args([
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "--text-threshold",
            "10",
        ])
        .assert()
        .success();

    let sql = fs::read_to_string(&output).expect("read sql");
    assert!(sql.contains("label TEXT"));
}

#[test]
fn header_only_csv_creates_table_without_insert() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("empty.csv", "id,name\n");
    let output = workspace.join("empty.sql");

    csv_to_sql()
        .args([input.to_str().unwrap(), output.to_str().unwrap()])
        .assert()
        .success();

    let sql = fs::read_to_string(&output).expect("read sql");
    assert!(sql.contains("CREATE TABLE empty ("));
    assert!(!sql.contains("INSERT INTO"));
}

#[test]
fn empty_file_is_rejected() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("blank.csv", "");
    let output = workspace.join("blank.sql");

    csv_to_sql()
        .args([input.to_str().unwrap(), output.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("Input has no header row"));
}

#[test]
fn failed_sql_output_leaves_no_schema_json() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.csv", "id,name\n1,Alice\n");
    let output = workspace.join("no_such_dir").join("orders.sql");
    let report_path = workspace.join("orders.json");

    csv_to_sql()
        .args([
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "--schema-json",
            report_path.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("Creating output file"));
    assert!(!output.exists());
    assert!(!report_path.exists());
}

#[test]
fn failed_schema_json_removes_sql_output() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.csv", "id,name\n1,Alice\n");
    let output = workspace.join("orders.sql");
    let report_path = workspace.join("no_such_dir").join("orders.json");

    csv_to_sql()
        .args([
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "--schema-json",
            report_path.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("Writing schema JSON"));
    assert!(!output.exists());
    assert!(!report_path.exists());
}
