use rcex::{CommentExporter, Credentials, ExportOptions, RetryPolicy};
use std::collections::HashMap;
use std::time::Duration;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |k: &str| map.get(k).cloned()
}

const FULL: &[(&str, &str)] = &[
    ("REDDIT_CLIENT_ID", "id"),
    ("REDDIT_CLIENT_SECRET", "secret"),
    ("REDDIT_USERNAME", "alice"),
    ("REDDIT_PASSWORD", "hunter2"),
    ("REDDIT_USER_AGENT", "ua/1.0"),
];

#[test]
fn credentials_from_full_environment() {
    let c = Credentials::from_lookup(env(FULL)).unwrap();
    assert_eq!(c.client_id, "id");
    assert_eq!(c.username, "alice");
    assert_eq!(c.user_agent, "ua/1.0");
    assert!(!format!("{c:?}").contains("hunter2"), "Debug must not leak the password");
}

/// Missing (or blank) required variables are fatal and named in the error.
#[test]
fn missing_credentials_are_reported() {
    let partial: Vec<_> = FULL.iter().copied().filter(|(k, _)| *k != "REDDIT_CLIENT_SECRET").collect();
    let err = Credentials::from_lookup(env(&partial)).unwrap_err();
    assert!(err.to_string().contains("REDDIT_CLIENT_SECRET"));

    let mut blank = FULL.to_vec();
    blank[3] = ("REDDIT_PASSWORD", "  ");
    let err = Credentials::from_lookup(env(&blank)).unwrap_err();
    assert!(err.to_string().contains("REDDIT_PASSWORD"));
}

#[test]
fn user_agent_defaults_from_username() {
    let no_ua: Vec<_> = FULL.iter().copied().filter(|(k, _)| *k != "REDDIT_USER_AGENT").collect();
    let c = Credentials::from_lookup(env(&no_ua)).unwrap();
    assert!(c.user_agent.starts_with("rcex/"));
    assert!(c.user_agent.ends_with("by alice"));
}

#[test]
fn defaults_and_clamps() {
    let o = ExportOptions::default();
    assert_eq!(o.batch_size, 100);
    assert_eq!(o.max_retries, 3);
    assert_eq!(o.retry_delay, Duration::from_secs(60));
    assert_eq!(o.stop_after, None);

    let e = CommentExporter::new().batch_size(0).max_retries(0);
    assert_eq!(e.options().batch_size, 1);
    assert_eq!(e.options().max_retries, 1);
    assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
}
