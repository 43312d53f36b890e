use super::*;

fn dashboard() -> Dashboard {
    Dashboard {
        id: Uuid::new_v4(),
        title: "Ops".into(),
        is_public: false,
        owner_id: None,
        thumbnail_url: None,
        created_at: 10,
        updated_at: 10,
    }
}

#[test]
fn apply_patch_touches_only_present_fields() {
    let mut d = dashboard();
    d.apply(&DashboardPatch { is_public: Some(true), ..Default::default() }, 20);
    assert_eq!(d.title, "Ops");
    assert!(d.is_public);
    assert_eq!(d.updated_at, 20);
}

#[test]
fn apply_patch_sets_thumbnail() {
    let mut d = dashboard();
    let patch = DashboardPatch { thumbnail_url: Some("https://img/1.png".into()), ..Default::default() };
    d.apply(&patch, 11);
    assert_eq!(d.thumbnail_url.as_deref(), Some("https://img/1.png"));
}

#[test]
fn error_codes_are_stable() {
    assert_eq!(RecordError::Validation("x".into()).error_code(), "E_VALIDATION");
    assert_eq!(RecordError::block_not_found(Uuid::nil()).error_code(), "E_NOT_FOUND");
    assert_eq!(
        RecordError::RemoteStatus { status: 500, body: String::new() }.error_code(),
        "E_PERSISTENCE"
    );
    assert_eq!(RecordError::Decode("bad".into()).error_code(), "E_PERSISTENCE");
}

#[test]
fn only_persistence_errors_are_retryable() {
    assert!(!RecordError::Validation("x".into()).is_retryable());
    assert!(!RecordError::dashboard_not_found(Uuid::nil()).is_retryable());
    assert!(RecordError::RemoteStatus { status: 503, body: String::new() }.is_retryable());
}

#[test]
fn not_found_message_names_entity() {
    let id = Uuid::nil();
    assert_eq!(RecordError::dashboard_not_found(id).to_string(), format!("dashboard not found: {id}"));
}

#[test]
fn patch_skips_absent_fields_on_the_wire() {
    let patch = DashboardPatch { title: Some("New".into()), ..Default::default() };
    assert_eq!(serde_json::to_value(&patch).unwrap(), serde_json::json!({"title": "New"}));
}
