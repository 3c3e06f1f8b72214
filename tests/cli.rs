use assert_cmd::Command;
use predicates::prelude::*;
use std::{fs, path::Path};
use tempfile::tempdir;

const SOURCE_POP: &str = "genome,mutations\ng0,1;2;3;4;8\ng1,1;2;3;4;5\ng2,1;3\n";
const RECIPIENT_POP: &str = "genome,mutations\ng0,1;2;3;7\ng1,1;2;3;4;5\ng2,1;2;4\n";

fn write_pair(dir: &Path, run: &str, rep: usize) {
    fs::write(
        dir.join(format!("run_{run}_rep{rep}_source_pop.csv")),
        SOURCE_POP,
    )
    .unwrap();
    fs::write(
        dir.join(format!("run_{run}_rep{rep}_recipient_pop.csv")),
        RECIPIENT_POP,
    )
    .unwrap();
}

#[test]
fn test_pair_writes_one_row_per_repetition() {
    let temp = tempdir().unwrap();
    write_pair(temp.path(), "1", 1);
    let out = temp.path().join("out.tsv");
    let summary = temp.path().join("summary.json");

    let mut cmd = Command::cargo_bin("lineage-tiers").unwrap();
    cmd.arg("pair")
        .arg("-s")
        .arg(temp.path().join("run_1_rep1_source_pop.csv"))
        .arg("-r")
        .arg(temp.path().join("run_1_rep1_recipient_pop.csv"))
        .arg("-o")
        .arg(&out)
        .arg("--summary")
        .arg(&summary)
        .arg("--repetitions")
        .arg("3")
        .arg("--sample-size")
        .arg("3")
        .assert()
        .success();

    let tsv = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = tsv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("simulation\trepetition\tsource_file\trecipient_file"));
    assert!(lines[0].contains("tier3_atr_signal"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary).unwrap()).unwrap();
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["repetitions"], 3);
    let tier_1 = &records[0]["tier_1"];
    let total = tier_1["correct"].as_f64().unwrap()
        + tier_1["reverse"].as_f64().unwrap()
        + tier_1["ambiguous"].as_f64().unwrap();
    assert!((total - 1.0).abs() < 1e-12);
}

#[test]
fn test_pair_is_reproducible_with_threads() {
    let temp = tempdir().unwrap();
    write_pair(temp.path(), "1", 1);

    let mut outputs = Vec::new();
    for threads in ["1", "2"] {
        let summary = temp.path().join(format!("summary_{threads}.json"));
        let mut cmd = Command::cargo_bin("lineage-tiers").unwrap();
        cmd.arg("pair")
            .arg("-s")
            .arg(temp.path().join("run_1_rep1_source_pop.csv"))
            .arg("-r")
            .arg(temp.path().join("run_1_rep1_recipient_pop.csv"))
            .arg("-o")
            .arg(temp.path().join(format!("out_{threads}.tsv")))
            .arg("--summary")
            .arg(&summary)
            .arg("--repetitions")
            .arg("8")
            .arg("--seed")
            .arg("42")
            .arg("-@")
            .arg(threads)
            .assert()
            .success();
        outputs.push(fs::read_to_string(&summary).unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn test_batch_discovers_simulations() {
    let temp = tempdir().unwrap();
    write_pair(temp.path(), "3", 1);
    write_pair(temp.path(), "3", 2);
    write_pair(temp.path(), "4", 1);
    let out = temp.path().join("out.tsv");
    let summary = temp.path().join("summary.json");

    let mut cmd = Command::cargo_bin("lineage-tiers").unwrap();
    cmd.arg("batch")
        .arg("--pop-dir")
        .arg(temp.path())
        .arg("--run-id")
        .arg("3")
        .arg("-o")
        .arg(&out)
        .arg("--summary")
        .arg(&summary)
        .arg("--repetitions")
        .arg("2")
        .assert()
        .success();

    let tsv = fs::read_to_string(&out).unwrap();
    assert_eq!(tsv.lines().count(), 5);
    assert!(tsv.contains("run_3_rep2_source_pop.csv"));
    assert!(!tsv.contains("run_4_"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary).unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 2);
}

#[test]
fn test_batch_reads_run_id_from_sim_params() {
    let temp = tempdir().unwrap();
    write_pair(temp.path(), "5", 1);
    write_pair(temp.path(), "6", 1);
    let params = temp.path().join("params.json");
    fs::write(&params, r#"{"run_id": 5, "num_generations": 100}"#).unwrap();
    let out = temp.path().join("out.tsv");

    let mut cmd = Command::cargo_bin("lineage-tiers").unwrap();
    cmd.arg("batch")
        .arg("--pop-dir")
        .arg(temp.path())
        .arg("--sim-params")
        .arg(&params)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let tsv = fs::read_to_string(&out).unwrap();
    assert_eq!(tsv.lines().count(), 2);
    assert!(tsv.contains("run_5_rep1_source_pop.csv"));
    assert!(!tsv.contains("run_6_"));
}

#[test]
fn test_batch_without_matches_fails() {
    let temp = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("lineage-tiers").unwrap();
    cmd.arg("batch")
        .arg("--pop-dir")
        .arg(temp.path())
        .arg("--run-id")
        .arg("9")
        .arg("-o")
        .arg(temp.path().join("out.tsv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No population files match"));
}

#[test]
fn test_zero_bins_rejected() {
    let temp = tempdir().unwrap();
    write_pair(temp.path(), "1", 1);
    let mut cmd = Command::cargo_bin("lineage-tiers").unwrap();
    cmd.arg("pair")
        .arg("-s")
        .arg(temp.path().join("run_1_rep1_source_pop.csv"))
        .arg("-r")
        .arg(temp.path().join("run_1_rep1_recipient_pop.csv"))
        .arg("-o")
        .arg(temp.path().join("out.tsv"))
        .arg("--bins")
        .arg("0")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Number of bins must be between 1 and 1000000",
        ));
}
