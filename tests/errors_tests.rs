use std::error::Error;

use portfolio::errors::{FieldErrors, PortfolioError};

#[test]
fn test_portfolio_error_implements_error_trait() {
    fn assert_error<T: Error>(_: &T) {}

    let error = PortfolioError::Store("disk full".to_string());
    assert_error(&error);
}

#[test]
fn test_portfolio_error_display() {
    let error = PortfolioError::NotFound("Project".to_string());
    assert_eq!(format!("{error}"), "Project not found");

    let error = PortfolioError::Http("Connection error".to_string());
    assert_eq!(
        format!("{error}"),
        "Failed to send HTTP request: Connection error"
    );

    let mut fields = FieldErrors::new();
    fields.insert("email".into(), vec!["Not a valid email address.".into()]);
    fields.insert("name".into(), vec!["Missing data for required field.".into()]);
    assert_eq!(
        format!("{}", PortfolioError::Validation(fields)),
        "Validation failed: email: Not a valid email address.; name: Missing data for required field."
    );
}

#[test]
fn test_status_codes() {
    assert_eq!(PortfolioError::invalid_field("name", "bad").status_code(), 422);
    assert_eq!(PortfolioError::NotFound("Project".into()).status_code(), 404);
    assert_eq!(PortfolioError::Credential("missing".into()).status_code(), 500);
    assert_eq!(PortfolioError::Notification("smtp".into()).status_code(), 500);
}

#[test]
fn test_portfolio_error_from_conversions() {
    let err = anyhow::anyhow!("test error");
    let converted: PortfolioError = err.into();
    match converted {
        PortfolioError::Store(msg) => assert!(msg.contains("test error")),
        _ => panic!("Unexpected error type"),
    }

    let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    match PortfolioError::from(parse_err) {
        PortfolioError::Store(msg) => assert!(msg.starts_with("serialization:")),
        _ => panic!("Unexpected error type"),
    }

    // Compile-time check that the reqwest conversion exists
    #[allow(unused)]
    #[allow(clippy::items_after_statements)]
    fn _check_reqwest_conversion(err: reqwest::Error) -> PortfolioError {
        PortfolioError::from(err)
    }
}
