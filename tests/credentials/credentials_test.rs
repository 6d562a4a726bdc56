//! `.env` loading and resolution order.

use std::collections::BTreeMap;

use folio::credentials::{load_credentials, Credentials};

#[test]
fn missing_file_yields_empty_credentials() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let creds = load_credentials(&tmp.path().join(".env")).expect("missing file is fine");
    assert!(creds.is_empty());
}

#[test]
fn parses_env_file() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let path = tmp.path().join(".env");
    std::fs::write(
        &path,
        "# comment\nRESEND_API_KEY=re_file_key\nFOLIO_OWNER_EMAIL=\"me@example.com\"\n",
    )
    .expect("write .env");

    let creds = load_credentials(&path).expect("file should parse");
    assert_eq!(creds.len(), 2);
    assert_eq!(creds.get("RESEND_API_KEY"), Some("re_file_key"));
    assert_eq!(creds.get("FOLIO_OWNER_EMAIL"), Some("me@example.com"));
}

#[test]
fn process_environment_wins_over_file() {
    let mut vars = BTreeMap::new();
    vars.insert("FOLIO_ENV".to_owned(), "production".to_owned());
    vars.insert("FOLIO_BIND".to_owned(), "127.0.0.1:4000".to_owned());
    let creds = Credentials::from_map(vars);

    let env = |key: &str| (key == "FOLIO_ENV").then(|| "development".to_owned());
    assert_eq!(creds.resolve_with("FOLIO_ENV", env).as_deref(), Some("development"));
    assert_eq!(creds.resolve_with("FOLIO_BIND", env).as_deref(), Some("127.0.0.1:4000"));
    assert_eq!(creds.resolve_with("MISSING", env), None);
}

#[test]
fn debug_output_hides_values() {
    let mut vars = BTreeMap::new();
    vars.insert("RESEND_API_KEY".to_owned(), "re_top_secret".to_owned());
    let rendered = format!("{:?}", Credentials::from_map(vars));
    assert!(rendered.contains("RESEND_API_KEY"));
    assert!(!rendered.contains("re_top_secret"));
}
