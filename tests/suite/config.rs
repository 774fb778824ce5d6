//! Config file to running pipeline

use shorten_config::{ConfigError, OnRemoteFailure, ShortenConfig};
use shorten_context::{Shortener, Tokenizer};
use tempfile::tempdir;

#[test]
fn config_file_drives_the_plan() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("papers");
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[paths]
input_dir = "{}"
output_prefix = "short_"

[model]
name = "gpt-4"
api_key = "sk-from-file"
token_budget = 2048

[shorten]
ratio = 0.3
repeat = 2

[run]
on_remote_failure = "abort_run"
max_concurrent_documents = 2
"#,
            input.display()
        ),
    )
    .unwrap();

    let plan = ShortenConfig::load(Some(config_path.as_path()))
        .unwrap()
        .into_plan()
        .unwrap();

    assert_eq!(plan.input_dir, input);
    assert_eq!(plan.output_prefix, "short_");
    assert_eq!(plan.model, "gpt-4");
    assert_eq!(plan.repeat.get(), 2);
    assert_eq!(plan.on_remote_failure, OnRemoteFailure::AbortRun);
    assert_eq!(plan.max_concurrent_documents.get(), 2);
    assert_eq!(plan.api_config().unwrap().api_key(), "sk-from-file");

    let shortener = Shortener::new(
        Tokenizer::for_model(&plan.model).unwrap(),
        plan.request,
        plan.prompt_reserve,
        plan.sampling,
        plan.repeat.get(),
    )
    .unwrap();
    assert_eq!(shortener.plan(), &plan.budget);
}

#[test]
fn command_line_paths_override_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "[paths]\ninput_dir = \"from-file\"\n").unwrap();

    let mut config = ShortenConfig::load(Some(config_path.as_path())).unwrap();
    let out = dir.path().join("out");
    config.override_paths(Some(dir.path()), Some(out.as_path()));
    let plan = config.into_plan().unwrap();

    assert_eq!(plan.input_dir, dir.path());
    assert_eq!(plan.output_dir, dir.path().join("out"));
}

#[test]
fn malformed_config_names_the_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "[shorten\nratio = ").unwrap();

    let err = ShortenConfig::load(Some(config_path.as_path())).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.toml"));
}
