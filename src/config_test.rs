use super::*;

// =============================================================================
// env_parse
// =============================================================================

#[test]
fn env_parse_missing_returns_default() {
    let val: u16 = env_parse("__DASH_TEST_MISSING_KEY__", 42);
    assert_eq!(val, 42);
}

#[test]
fn env_parse_present_valid() {
    unsafe { std::env::set_var("__DASH_TEST_VALID__", "99") };
    let val: u64 = env_parse("__DASH_TEST_VALID__", 0);
    assert_eq!(val, 99);
    unsafe { std::env::remove_var("__DASH_TEST_VALID__") };
}

#[test]
fn env_parse_present_invalid_returns_default() {
    unsafe { std::env::set_var("__DASH_TEST_INVALID__", "soon") };
    let val: u32 = env_parse("__DASH_TEST_INVALID__", 7);
    assert_eq!(val, 7);
    unsafe { std::env::remove_var("__DASH_TEST_INVALID__") };
}

// =============================================================================
// parse_store
// =============================================================================

#[test]
fn store_defaults_to_memory_without_database_url() {
    assert_eq!(parse_store(None, None), Ok(StoreConfig::Memory));
}

#[test]
fn store_defaults_to_postgres_with_database_url() {
    let store = parse_store(None, Some("postgres://localhost/dash".into())).unwrap();
    assert!(matches!(
        store,
        StoreConfig::Postgres { ref database_url, .. } if database_url == "postgres://localhost/dash"
    ));
}

#[test]
fn explicit_memory_ignores_database_url() {
    assert_eq!(parse_store(Some("memory"), Some("postgres://x".into())), Ok(StoreConfig::Memory));
}

#[test]
fn postgres_requires_database_url() {
    assert_eq!(parse_store(Some("postgres"), None), Err(ConfigError::Missing("DATABASE_URL")));
}

#[test]
fn unknown_store_is_rejected() {
    assert_eq!(
        parse_store(Some("sqlite"), None),
        Err(ConfigError::UnknownStore("sqlite".into()))
    );
}
