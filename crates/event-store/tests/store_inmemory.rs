use event_store::{EventStore, InMemoryEventStore, NewEvent, PersistResult, StoreError};
use serde_json::json;
use uuid::Uuid;

#[test]
fn append_assigns_consecutive_versions() {
  let store = InMemoryEventStore::new();
  let id = Uuid::new_v4();
  store.create_stream(id, Some("process".into()), json!({})).unwrap();

  let res = store.append(&id,
                         0,
                         vec![NewEvent::new("A", json!({"n": 1})), NewEvent::new("B", json!({"n": 2}))])
                 .unwrap();
  assert_eq!(res, PersistResult::Ok { new_version: 2 });

  let res = store.append(&id, 2, vec![NewEvent::new("C", json!({"n": 3}))]).unwrap();
  assert_eq!(res, PersistResult::Ok { new_version: 3 });

  let events = store.read_events(&id, 0).unwrap();
  let versions: Vec<i64> = events.iter().map(|e| e.version).collect();
  assert_eq!(versions, vec![1, 2, 3]);
  assert_eq!(events[2].name, "C");
  assert_eq!(store.read_events(&id, 2).unwrap().len(), 1);
}

#[test]
fn stale_expected_version_conflicts_without_writing() {
  let store = InMemoryEventStore::new();
  let id = Uuid::new_v4();
  store.create_stream(id, None, json!({})).unwrap();
  store.append(&id, 0, vec![NewEvent::new("A", json!({}))]).unwrap();

  let res = store.append(&id, 0, vec![NewEvent::new("B", json!({}))]).unwrap();
  assert_eq!(res, PersistResult::Conflict);
  assert_eq!(store.count_events(&id).unwrap(), 1);
}

#[test]
fn causation_id_is_kept() {
  let store = InMemoryEventStore::new();
  let id = Uuid::new_v4();
  let cause = Uuid::new_v4();
  store.create_stream(id, None, json!({})).unwrap();
  store.append(&id, 0, vec![NewEvent::new("A", json!({})).caused_by(Some(cause))]).unwrap();
  assert_eq!(store.read_events(&id, 0).unwrap()[0].causation_id, Some(cause));
}

#[test]
fn duplicate_stream_and_missing_stream_errors() {
  let store = InMemoryEventStore::new();
  let id = Uuid::new_v4();
  store.create_stream(id, None, json!({})).unwrap();
  assert!(matches!(store.create_stream(id, None, json!({})), Err(StoreError::Conflict(_))));

  let missing = Uuid::new_v4();
  assert_eq!(store.count_events(&missing).unwrap(), -1);
  assert!(matches!(store.read_events(&missing, 0), Err(StoreError::NotFound(_))));
  assert!(matches!(store.append(&missing, 0, vec![]), Err(StoreError::NotFound(_))));
}

#[test]
fn list_filters_by_type_and_delete_removes() {
  let store = InMemoryEventStore::new();
  let a = Uuid::new_v4();
  let b = Uuid::new_v4();
  store.create_stream(a, Some("process".into()), json!({})).unwrap();
  store.create_stream(b, Some("other".into()), json!({})).unwrap();

  assert_eq!(store.list_streams(Some("process")).unwrap(), vec![a]);
  assert_eq!(store.list_streams(None).unwrap().len(), 2);

  store.delete_stream(&a).unwrap();
  assert!(!store.stream_exists(&a).unwrap());
  assert!(store.stream_exists(&b).unwrap());
}
