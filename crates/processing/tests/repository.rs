mod common;

use common::{node, RecordingEngine};
use event_store::InMemoryEventStore;
use processing::{ProcessFactory, ProcessRepository, ProcessingError};
use processing_types::TypeStubs;
use serde_json::json;
use std::sync::Arc;

fn definition() -> serde_json::Value {
  json!({
    "process_type": "linear_messaging",
    "tasks": [
      {"task_type": "collect_data", "source": "crm", "processing_type": "User"},
      {"task_type": "collect_data", "source": "crm", "processing_type": "Address"}
    ]
  })
}

#[test]
fn saved_process_is_loaded_with_the_same_state() -> Result<(), ProcessingError> {
  let factory = ProcessFactory::new(node("wf"), Arc::new(TypeStubs::sample_registry()?));
  let repo = ProcessRepository::new(Arc::new(InMemoryEventStore::new()));
  let engine = RecordingEngine::default();

  let mut process = factory.create_process_from_definition(&definition(), None)?;
  process.perform(&engine, None)?;
  repo.add(&mut process)?;
  assert!(process.pending_events().is_empty());

  let loaded = repo.get(process.process_id())?;
  assert_eq!(loaded.task_list(), process.task_list());
  assert_eq!(loaded.version(), process.version());
  assert_eq!(repo.process_ids()?, vec![*process.process_id()]);
  Ok(())
}

#[test]
fn concurrent_writers_get_a_concurrency_error() -> Result<(), ProcessingError> {
  let factory = ProcessFactory::new(node("wf"), Arc::new(TypeStubs::sample_registry()?));
  let repo = ProcessRepository::new(Arc::new(InMemoryEventStore::new()));
  let engine = RecordingEngine::default();

  let mut process = factory.create_process_from_definition(&definition(), None)?;
  repo.add(&mut process)?;

  let mut first = repo.get(process.process_id())?;
  let mut second = repo.get(process.process_id())?;
  first.perform(&engine, None)?;
  second.perform(&engine, None)?;
  repo.save(&mut first)?;
  let err = repo.save(&mut second).unwrap_err();
  assert!(matches!(err, ProcessingError::Concurrency(_)));
  Ok(())
}

#[test]
fn adding_twice_is_rejected() -> Result<(), ProcessingError> {
  let factory = ProcessFactory::new(node("wf"), Arc::new(TypeStubs::sample_registry()?));
  let repo = ProcessRepository::new(Arc::new(InMemoryEventStore::new()));
  let mut process = factory.create_process_from_definition(&definition(), None)?;
  repo.add(&mut process)?;
  let mut again = repo.get(process.process_id())?;
  assert!(repo.add(&mut again).is_err());
  Ok(())
}
