//! Session configuration selection tests

use trueno_trainkit::graph::{Graph, Tensor};
use trueno_trainkit::session::{session_config, Feed, Session, SessionConfig, GPU_DEVICE};

#[test]
fn test_gpu_requested_uses_defaults() {
    assert!(session_config(true).is_none());
}

#[test]
fn test_cpu_only_hides_gpus() {
    let config = session_config(false).expect("cpu-only config");
    assert_eq!(config.device_count(GPU_DEVICE), Some(0));
    assert!(!config.gpu_allowed());
    assert_eq!(config, SessionConfig::cpu_only());
}

#[test]
fn test_selector_is_pure() {
    for use_gpu in [true, false, true, false] {
        assert_eq!(session_config(use_gpu), session_config(use_gpu));
    }
}

#[test]
fn test_session_keeps_config() {
    let mut graph = Graph::new();
    let c = graph.constant("c", Tensor::scalar(3.0));

    let mut cpu = Session::new(&graph, session_config(false));
    assert_eq!(cpu.config(), Some(&SessionConfig::cpu_only()));
    assert_eq!(cpu.run(&[c], &Feed::new()).unwrap()[0].as_scalar(), Some(3.0));

    let default = Session::new(&graph, session_config(true));
    assert!(default.config().is_none());
}

#[test]
fn test_config_json_round_trip() {
    let config = SessionConfig::cpu_only();
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(json, r#"{"device_count":{"GPU":0}}"#);
    let back: SessionConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}
