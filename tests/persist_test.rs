//! Run log persistence tests

use trueno_trainkit::run::{save_log, RunConfig, RunLog};

fn run_log() -> RunLog {
    let config = RunConfig::builder()
        .run_name("persist-run")
        .dataset("mnist")
        .model("mlp")
        .procedure("adam")
        .commit("cafebabe")
        .epochs(3)
        .build();
    RunLog::from_config(&config).unwrap()
}

#[test]
fn test_save_log_creates_directory_and_file() {
    let tmp = tempfile::TempDir::new().unwrap();
    let summaries = tmp.path().join("summaries");
    let mut log = run_log();
    let before = log.clone();

    let path = save_log(&mut log, &summaries, "persist-run", "log.json").unwrap();

    assert_eq!(path, summaries.join("persist-run").join("log.json"));
    assert!(summaries.join("persist-run").is_dir());

    let written: RunLog = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written, log);
    assert!(written.end_time().unwrap() >= before.start_time());
    assert_eq!(written.run_name(), before.run_name());
    assert_eq!(written.start_time(), before.start_time());
    assert_eq!(written.epochs(), before.epochs());
}

#[test]
fn test_save_log_into_existing_directory() {
    let tmp = tempfile::TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("existing")).unwrap();
    let mut log = run_log();

    let path = save_log(&mut log, tmp.path(), "existing", "log.json").unwrap();
    assert!(path.is_file());
}

#[test]
fn test_save_log_twice_overwrites() {
    let tmp = tempfile::TempDir::new().unwrap();
    let mut log = run_log();

    let path = save_log(&mut log, tmp.path(), "twice", "log.json").unwrap();
    let first_end = log.end_time().unwrap();
    // Pad the file so truncation is observable.
    std::fs::write(&path, " ".repeat(4096)).unwrap();

    save_log(&mut log, tmp.path(), "twice", "log.json").unwrap();
    let second_end = log.end_time().unwrap();
    assert!(second_end >= first_end);

    let text = std::fs::read_to_string(&path).unwrap();
    let written: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(written["end_time"].as_f64(), Some(second_end));
    assert!(!text.ends_with(' '));
}

#[test]
fn test_save_log_reports_io_failure() {
    let tmp = tempfile::TempDir::new().unwrap();
    let blocker = tmp.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let mut log = run_log();

    let result = save_log(&mut log, &blocker, "run", "log.json");
    assert!(matches!(result, Err(trueno_trainkit::Error::Io(_))));
}

#[test]
fn test_written_json_is_single_object() {
    let tmp = tempfile::TempDir::new().unwrap();
    let mut log = run_log();
    let path = save_log(&mut log, tmp.path(), "json", "run.log").unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert!(value.is_object());
    assert_eq!(value["commit"], "cafebabe");
    assert!(value["end_time"].is_f64());
}
