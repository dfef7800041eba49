//! Tests for pipeline configuration.

use std::time::Duration;

use giftgenie::gift_pipeline::PipelineConfig;

#[test]
fn test_config_defaults() {
    let config = PipelineConfig::default();

    assert_eq!(config.finalist_target, 3);
    assert_eq!(config.lookup_concurrency, 3);
    assert!(config.deadline.is_none());
}

#[test]
fn test_config_custom_finalists() {
    let config = PipelineConfig {
        finalist_target: 5,
        ..Default::default()
    };

    assert_eq!(config.finalist_target, 5);
    assert_eq!(config.lookup_concurrency, 3);
}

#[test]
fn test_config_with_deadline() {
    let config = PipelineConfig {
        deadline: Some(Duration::from_secs(1200)),
        ..Default::default()
    };

    assert_eq!(config.deadline, Some(Duration::from_secs(1200)));
}
