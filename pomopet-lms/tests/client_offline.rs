//! Offline client checks.
//!
//! No real LMS is contacted: requests go to a closed local port so the retry
//! loop and error mapping can be exercised deterministically.

use std::time::Duration;

use pomopet_lms::{Course, LmsClient, LmsConfig, LmsError, LmsProvider};

fn unreachable_canvas(max_retries: u32) -> LmsClient {
    LmsClient::new(
        LmsProvider::Canvas {
            base_url: "http://127.0.0.1:9".to_string(),
            token: "test-token".to_string(),
        },
        max_retries,
        Duration::from_millis(500),
    )
}

#[tokio::test]
async fn unreachable_host_exhausts_retries() {
    let client = unreachable_canvas(2);
    match client.list_courses().await {
        Err(LmsError::RetriesExhausted { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn assignment_fetch_also_retries() {
    let client = unreachable_canvas(0);
    let course = Course {
        id: 42,
        name: "Physics".to_string(),
    };
    assert!(matches!(
        client.list_assignments(&course).await,
        Err(LmsError::RetriesExhausted { attempts: 1, .. })
    ));
}

#[tokio::test]
async fn upcoming_fails_when_course_list_fails() {
    let client = unreachable_canvas(0);
    assert!(client.fetch_upcoming().await.is_err());
}

#[test]
fn client_from_config() {
    let config = LmsConfig::from_toml(
        r#"
        provider = "canvas"
        base_url = "https://school.instructure.com"
        token = "t"
        max_retries = 5
        "#,
    )
    .expect("parse");
    let client = LmsClient::from_config(&config).expect("valid");
    assert!(client.is_available());

    let disabled = LmsClient::from_config(&LmsConfig::default()).expect("valid");
    assert!(!disabled.is_available());
}
