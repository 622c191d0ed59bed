mod common;

use assert_cmd::prelude::*; // Add methods on commands
use common::*;
use predicates::prelude::*; // Used for writing assertions
use std::io::Write;
use std::process::Command; // Run programs

fn write_file(buf: &[u8]) -> Result<tempfile::NamedTempFile, Box<dyn std::error::Error>> {
    let mut f = tempfile::Builder::new().suffix(".pgdf").tempfile()?;
    f.write_all(buf)?;
    f.flush()?;
    Ok(f)
}

fn sample_file() -> Vec<u8> {
    gemini_file(&[
        track_record(1_861_000_199, &[START_MILLIS + 2000, START_MILLIS + 3000]),
        track_record(1_861_000_198, &[START_MILLIS + 1000]),
        track_record(1_861_000_203, &[START_MILLIS]),
    ])
}

#[test]
fn count_records() -> Result<(), Box<dyn std::error::Error>> {
    let f = write_file(&sample_file())?;
    let mut cmd = Command::cargo_bin("pgdf")?;

    cmd.arg("count").arg(f.path());
    cmd.assert().success().stdout(
        predicate::str::contains("3\tData")
            .and(predicate::str::contains("1\tFileHeader"))
            .and(predicate::str::contains("1\tModuleFooter")),
    );

    Ok(())
}

#[test]
fn count_records_no_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("pgdf")?;

    cmd.arg("count").arg("assets/does_not_exist.pgdf");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No such file or directory"));

    Ok(())
}

#[test]
fn list_records_to_file() -> Result<(), Box<dyn std::error::Error>> {
    let f = write_file(&sample_file())?;
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("records.txt");
    let mut cmd = Command::cargo_bin("pgdf")?;

    cmd.arg("list").arg(f.path()).arg("-o").arg(&out);
    cmd.assert().success();

    let listing = std::fs::read_to_string(&out)?;
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), 7);
    assert!(lines[0].starts_with("0\t"));
    assert!(lines[0].ends_with("\tFileHeader"));
    assert!(lines[2].ends_with("\tData(1)"));
    assert!(lines[6].ends_with("\tFileFooter"));

    Ok(())
}

#[test]
fn info_summarises_file() -> Result<(), Box<dyn std::error::Error>> {
    let f = write_file(&sample_file())?;
    let mut cmd = Command::cargo_bin("pgdf")?;

    cmd.arg("info").arg(f.path());
    cmd.assert().success().stdout(
        predicate::str::contains("Module type: Gemini Threshold Detector")
            .and(predicate::str::contains("Number of objects: 3"))
            .and(predicate::str::contains("UID range: 1861000198 to 1861000202")),
    );

    Ok(())
}

#[test]
fn tracks_sorted_and_filtered() -> Result<(), Box<dyn std::error::Error>> {
    let f = write_file(&sample_file())?;
    let mut cmd = Command::cargo_bin("pgdf")?;

    cmd.arg("tracks")
        .arg(f.path())
        .args(["--uid", "1861000198", "--uid", "1861000199"]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output)?;

    let headers: Vec<&str> = stdout.lines().filter(|l| !l.starts_with('\t')).collect();
    assert_eq!(headers, vec!["1861000198\t1 points", "1861000199\t2 points"]);

    Ok(())
}

#[test]
fn unsupported_module_needs_lenient() -> Result<(), Box<dyn std::error::Error>> {
    let buf = concat(&[
        file_header(4, "AIS Processing"),
        module_header(),
        track_record(1, &[START_MILLIS]),
        module_footer(),
        file_footer(4, 1),
    ]);
    let f = write_file(&buf)?;

    Command::cargo_bin("pgdf")?
        .arg("info")
        .arg(f.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported module type \"AIS Processing\""));

    Command::cargo_bin("pgdf")?
        .arg("--lenient")
        .arg("info")
        .arg(f.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Number of objects: 0")
                .and(predicate::str::contains("Skipped records:")),
        );

    Ok(())
}

#[test]
fn avro_export() -> Result<(), Box<dyn std::error::Error>> {
    let f = write_file(&sample_file())?;
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("points.avro");

    Command::cargo_bin("pgdf")?
        .arg("avro")
        .arg(f.path())
        .arg(&out)
        .assert()
        .success();

    let reader = apache_avro::Reader::new(std::fs::File::open(&out)?)?;
    let mut count = 0;
    for value in reader {
        value?;
        count += 1;
    }
    assert_eq!(count, 4);

    Ok(())
}
