use domain::{CallbackBatch, ObjectStatus};

#[test]
fn object_status_decodes_minimal_body() {
    let status: ObjectStatus = serde_json::from_str(r#"{"id":7,"online":true}"#).expect("decode");
    assert_eq!(status.id, 7);
    assert!(status.online);
    assert!(status.last_seen_at.is_none());
}

#[test]
fn object_status_accepts_last_seen_at() {
    let status: ObjectStatus =
        serde_json::from_str(r#"{"id":7,"online":true,"last_seen_at":"2026-01-01T00:00:00Z"}"#)
            .expect("decode");
    assert!(status.last_seen_at.is_some());
}

#[test]
fn object_status_rejects_missing_online() {
    let result = serde_json::from_str::<ObjectStatus>(r#"{"id":7}"#);
    assert!(result.is_err());
}

#[test]
fn callback_batch_decodes_ids_in_order() {
    let batch: CallbackBatch =
        serde_json::from_str(r#"{"object_ids":[5,5,3,1]}"#).expect("decode");
    assert_eq!(batch.object_ids, vec![5, 5, 3, 1]);
}

#[test]
fn callback_batch_defaults_missing_key_to_empty() {
    let batch: CallbackBatch = serde_json::from_str("{}").expect("decode");
    assert!(batch.object_ids.is_empty());
}

#[test]
fn callback_batch_rejects_non_integer_ids() {
    let result = serde_json::from_str::<CallbackBatch>(r#"{"object_ids":["x"]}"#);
    assert!(result.is_err());
}
