// Logging tests
//
// The global subscriber can only be installed once per process, so every
// assertion about installation lives in a single test.

use shadowmark::logging::{init_subscriber, LogFormat};

#[test]
fn test_can_initialize_tracing_subscriber_once() {
    let result = init_subscriber(LogFormat::Json);
    assert!(
        result.is_ok(),
        "Tracing subscriber initialization should succeed, got error: {:?}",
        result.err()
    );

    // Events are accepted once a subscriber is installed
    tracing::info!(images = 3, "Batch started");

    // A second global subscriber is rejected instead of panicking
    assert!(init_subscriber(LogFormat::Text).is_err());
}

#[test]
fn test_log_format_parsing() {
    assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
    assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
    assert_eq!(LogFormat::default(), LogFormat::Text);
    assert_eq!(LogFormat::Json.to_string(), "json");

    let err = "yaml".parse::<LogFormat>().unwrap_err();
    assert!(err.contains("yaml"));
}
