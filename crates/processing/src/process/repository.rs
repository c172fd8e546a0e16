// Archivo: repository.rs
// Propósito: persistir procesos como streams de eventos sobre un
// `EventStore` con control de concurrencia optimista.
use crate::errors::{ProcessingError, Result};
use crate::process::events::ProcessEvent;
use crate::process::{Process, ProcessId};
use event_store::{EventStore, PersistResult};
use log::debug;
use serde_json::json;
use std::sync::Arc;

pub const PROCESS_STREAM_TYPE: &str = "process";

pub struct ProcessRepository {
  store: Arc<dyn EventStore>,
}

impl ProcessRepository {
  pub fn new(store: Arc<dyn EventStore>) -> Self {
    Self { store }
  }

  /// Crea el stream del proceso y guarda sus eventos pendientes.
  pub fn add(&self, process: &mut Process) -> Result<()> {
    let id = process.process_id().as_uuid();
    if self.store.stream_exists(id)? {
      return Err(ProcessingError::Concurrency(format!("el proceso {} ya existe", id)));
    }
    let metadata = json!({
      "node_name": process.node_name().as_str(),
      "parent_position": process.parent_task_list_position().map(|p| p.to_string()),
    });
    self.store.create_stream(*id, Some(PROCESS_STREAM_TYPE.to_string()), metadata)?;
    self.save(process)
  }

  /// Agrega los eventos pendientes esperando la versión previa a ellos.
  pub fn save(&self, process: &mut Process) -> Result<()> {
    let pending = process.take_pending_events();
    if pending.is_empty() {
      return Ok(());
    }
    let expected = process.version() - pending.len() as i64;
    let events = pending.iter()
                        .map(|p| p.event.to_new_event(p.causation_id))
                        .collect::<Result<Vec<_>>>()?;
    let id = process.process_id().as_uuid();
    match self.store.append(id, expected, events)? {
      PersistResult::Ok { new_version } => {
        debug!("proceso {}: guardado en version {}", id, new_version);
        Ok(())
      }
      PersistResult::Conflict => {
        Err(ProcessingError::Concurrency(format!("el proceso {} cambio desde la version {}", id, expected)))
      }
    }
  }

  pub fn get(&self, process_id: &ProcessId) -> Result<Process> {
    let stored = self.store.read_events(process_id.as_uuid(), 0)?;
    let history = stored.iter().map(ProcessEvent::from_stored).collect::<Result<Vec<_>>>()?;
    Process::reconstitute(history)
  }

  pub fn contains(&self, process_id: &ProcessId) -> Result<bool> {
    Ok(self.store.stream_exists(process_id.as_uuid())?)
  }

  pub fn process_ids(&self) -> Result<Vec<ProcessId>> {
    Ok(self.store
           .list_streams(Some(PROCESS_STREAM_TYPE))?
           .into_iter()
           .map(ProcessId::from_uuid)
           .collect())
  }
}
