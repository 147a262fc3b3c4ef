use std::path::{Path, PathBuf};

use ai_core::{BbValue, Blackboard, Vec3};
use ai_graph::TerminateBehavior;
use graph_cli::{SimConfig, SimOverrides};

fn demo(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos").join(name)
}

#[test]
fn missing_fields_take_defaults() {
    let config = SimConfig::from_yaml_str("agents: 3\n").unwrap();

    assert_eq!(config.agents, 3);
    assert_eq!(config.ticks, SimConfig::default().ticks);
    assert_eq!(config.engine.on_terminate, TerminateBehavior::Idle);
    assert!(config.blackboard.is_empty());
    assert!(config.trace_out.is_none());
}

#[test]
fn engine_and_blackboard_sections_parse() {
    let config = SimConfig::from_yaml_str(
        r#"
engine:
  on_terminate: restart_from_root
blackboard:
  entries:
    - key: speed
      value:
        number: 2.5
"#,
    )
    .unwrap();

    assert_eq!(config.engine.on_terminate, TerminateBehavior::RestartFromRoot);
    let bb = Blackboard::load(&config.blackboard);
    assert_eq!(bb.get_value("speed"), Some(&BbValue::Number(2.5)));
}

#[test]
fn demo_config_loads_from_disk() {
    let config = SimConfig::load(&demo("sim.yaml")).unwrap();

    assert_eq!(config.agents, 4);
    let bb = Blackboard::load(&config.blackboard);
    assert_eq!(bb.get_value("position"), Some(&BbValue::Vec3(Vec3::ZERO)));
    assert_eq!(bb.get_value("counter"), Some(&BbValue::Int(0)));
}

#[test]
fn command_line_overrides_win() {
    let overrides = SimOverrides {
        agents: Some(9),
        dt_seconds: Some(0.5),
        trace_out: Some(PathBuf::from("trace.json")),
        ..SimOverrides::default()
    };
    let config = SimConfig::from_yaml_str("agents: 2\nticks: 7\n")
        .unwrap()
        .with_overrides(&overrides);

    assert_eq!(config.agents, 9);
    assert_eq!(config.ticks, 7);
    assert_eq!(config.dt_seconds, 0.5);
    assert_eq!(config.trace_out, Some(PathBuf::from("trace.json")));
}

#[test]
fn unreadable_config_is_an_error() {
    let err = SimConfig::load(&demo("does-not-exist.yaml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read sim config"));
    assert!(SimConfig::load_or_default(None).is_ok());
}
