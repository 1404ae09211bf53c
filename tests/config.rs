use anyhow::Result;
use ironsieve::testing::TempDirPath;
use ironsieve::*;
use std::time::Duration;

#[test]
fn defaults_match_documented_values() {
    let cfg = PipelineConfig::default();
    assert_eq!(cfg.batch_size, 1000);
    assert_eq!(cfg.worker_count, 4);
    assert_eq!(cfg.partition_capacity, 1_048_575);
    assert_eq!(cfg.shutdown_timeout, Duration::from_secs(60));
    assert_eq!(cfg.delimiter, ',');
    assert!(cfg.has_headers);
    assert!(cfg.validate().is_ok());
}

#[test]
fn missing_keys_keep_defaults() -> Result<()> {
    let cfg = PipelineConfig::from_json_str(r#"{ "worker_count": 2, "shutdown_timeout_secs": 1.5 }"#)?;
    assert_eq!(cfg.worker_count, 2);
    assert_eq!(cfg.shutdown_timeout, Duration::from_millis(1500));
    assert_eq!(cfg.batch_size, 1000);
    assert_eq!(PipelineConfig::from_json_str("{}")?, PipelineConfig::default());
    Ok(())
}

#[test]
fn unknown_or_negative_values_fail_to_parse() {
    for json in [
        r#"{ "batch_sise": 10 }"#,
        r#"{ "batch_size": -1 }"#,
        r#"{ "shutdown_timeout_secs": -3 }"#,
        "not json",
    ] {
        let err = PipelineConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigParse(_)), "{json}: {err}");
        assert!(err.is_config_error());
    }
}

#[test]
fn validate_names_the_offending_option() {
    let cases = [
        (PipelineConfig::default().with_batch_size(0), "batch_size"),
        (PipelineConfig::default().with_worker_count(0), "worker_count"),
        (PipelineConfig::default().with_partition_capacity(0), "partition_capacity"),
        (
            PipelineConfig::default().with_shutdown_timeout(Duration::ZERO),
            "shutdown_timeout",
        ),
        (PipelineConfig::default().with_delimiter('é'), "delimiter"),
        (PipelineConfig::default().with_delimiter('"'), "delimiter"),
    ];
    for (cfg, expected) in cases {
        match cfg.validate() {
            Err(PipelineError::InvalidConfig { option, .. }) => assert_eq!(option, expected),
            other => panic!("{expected}: expected InvalidConfig, got {other:?}"),
        }
    }
}

#[test]
fn delimiter_byte_follows_the_char() {
    assert_eq!(PipelineConfig::default().with_delimiter('\t').delimiter_byte(), b'\t');
    assert_eq!(PipelineConfig::default().delimiter_byte(), b',');
}

#[test]
fn config_file_round_trips_through_disk() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("run.json");
    let cfg = PipelineConfig::default()
        .with_batch_size(50)
        .with_shutdown_timeout(Duration::from_secs(5));
    std::fs::write(&path, serde_json::to_string(&cfg)?)?;

    assert_eq!(PipelineConfig::from_json_file(&path)?, cfg);
    Ok(())
}

#[test]
fn missing_config_file_is_an_io_error() {
    let err = PipelineConfig::from_json_file("/no/such/config.json").unwrap_err();
    assert!(matches!(err, PipelineError::Io(_)));
    assert!(!err.is_config_error());
}
