use std::io::Write;

use ringcast_agent::{AgentConfig, AgentError};

#[test]
fn test_load_from_explicit_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[network]
bind_host = "0.0.0.0"
next_host = "10.0.0.2"
token_base_port = 7000

[timing]
poll_timeout_ms = 250
terminate_linger_ms = 200

[run]
seed = 1234
"#
    )
    .unwrap();

    let config = AgentConfig::load(Some(file.path())).unwrap();
    config.validate().unwrap();
    assert_eq!(config.network.bind_host, "0.0.0.0");
    assert_eq!(config.network.next_host(), "10.0.0.2");
    assert_eq!(config.network.token_base_port, 7000);
    assert_eq!(config.network.multicast_port, 5007);
    assert_eq!(config.timing.poll_timeout_ms, 250);
    assert_eq!(config.timing.jitter_max_ms, 300);
    assert_eq!(config.run.seed, Some(1234));
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = AgentConfig::load(Some(&dir.path().join("absent.toml")));
    assert!(matches!(result, Err(AgentError::ConfigRead { .. })));
}

#[test]
fn test_malformed_file_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[timing]\npoll_timeout_ms = \"fast\"").unwrap();

    let result = AgentConfig::load(Some(file.path()));
    assert!(matches!(result, Err(AgentError::ConfigParse { .. })));
}

#[test]
fn test_out_of_range_poll_timeout_fails_validation() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[timing]\npoll_timeout_ms = 0").unwrap();

    let config = AgentConfig::load(Some(file.path())).unwrap();
    assert!(matches!(config.validate(), Err(AgentError::Config(_))));
}
