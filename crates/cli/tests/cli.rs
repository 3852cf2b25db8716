use assert_cmd::Command;
use predicates::prelude::*;

fn write_input(dir: &std::path::Path, name: &str, source: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, source).expect("write input");
    path
}

#[test]
fn splits_a_file_and_writes_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        "app.js",
        "function helper() { return 42; }\nfunction main() { return helper(); }\n",
    );
    let out = dir.path().join("dist");

    Command::cargo_bin("jsplit")
        .unwrap()
        .arg(&input)
        .arg("--out-dir")
        .arg(&out)
        .arg("--strategy")
        .arg("conservative")
        .assert()
        .success()
        .stdout(predicate::str::contains("chunk(s)"));

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("manifest.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["version"], "1.0.0");
    assert_eq!(manifest["entryPoint"], "loader.js");

    let filename = manifest["chunks"][0]["filename"].as_str().unwrap();
    assert!(out.join(filename).exists());
    assert!(out.join("loader.js").exists());
}

#[test]
fn node_target_emits_entry_with_requires() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "lib.js", "const answer = 42;\n");
    let out = dir.path().join("dist");

    Command::cargo_bin("jsplit")
        .unwrap()
        .arg(&input)
        .arg("--out-dir")
        .arg(&out)
        .arg("--target")
        .arg("node")
        .assert()
        .success();

    let entry = std::fs::read_to_string(out.join("index.js")).unwrap();
    assert!(entry.contains("require('./chunk_000.js');"));
    assert!(entry.contains("answer: globalThis.answer"));

    let chunk = std::fs::read_to_string(out.join("chunk_000.js")).unwrap();
    assert!(chunk.contains("Object.assign(globalThis, { answer })"));
}

#[test]
fn entry_name_overrides_the_default() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "lib.js", "const x = 1;\n");
    let out = dir.path().join("dist");

    Command::cargo_bin("jsplit")
        .unwrap()
        .arg(&input)
        .arg("--out-dir")
        .arg(&out)
        .arg("--entry-name")
        .arg("bootstrap.js")
        .assert()
        .success();

    assert!(out.join("bootstrap.js").exists());
    assert!(!out.join("loader.js").exists());

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("manifest.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["entryPoint"], "bootstrap.js");
}

#[test]
fn malformed_input_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "bad.js", "function ((\n");
    let out = dir.path().join("dist");

    Command::cargo_bin("jsplit")
        .unwrap()
        .arg(&input)
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("chunking failed"));
}

#[test]
fn skip_failures_continues_past_bad_files() {
    let dir = tempfile::tempdir().unwrap();
    let bad = write_input(dir.path(), "bad.js", "function ((\n");
    let good = write_input(dir.path(), "good.js", "const ok = true;\n");
    let out = dir.path().join("dist");

    Command::cargo_bin("jsplit")
        .unwrap()
        .arg(&bad)
        .arg(&good)
        .arg("--out-dir")
        .arg(&out)
        .arg("--skip-failures")
        .assert()
        .success();

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("manifest.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["chunks"].as_array().unwrap().len(), 1);
}
