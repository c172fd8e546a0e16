//! Eventos del agregado `Process` y su aplicación pura sobre el estado.
//!
//! El estado nunca se modifica fuera de `apply`: tanto la ejecución en vivo
//! como la reconstrucción desde el almacén pasan por la misma función.

use crate::config::ProcessConfig;
use crate::errors::{ProcessingError, Result};
use crate::message::LogMessage;
use crate::process::ProcessId;
use crate::task::{Task, TaskList, TaskListPosition, TaskStatus};
use chrono::{DateTime, Utc};
use event_store::{NewEvent, StoredEvent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProcessEvent {
  ProcessSetUp {
    process_id: ProcessId,
    parent_position: Option<TaskListPosition>,
    task_list: TaskList,
    config: ProcessConfig,
  },
  ProcessStarted {
    at: DateTime<Utc>,
  },
  TaskEntryMarkedAsRunning {
    position: TaskListPosition,
    at: DateTime<Utc>,
  },
  TaskEntryMarkedAsDone {
    position: TaskListPosition,
    at: DateTime<Utc>,
    result: Option<Uuid>,
  },
  TaskEntryMarkedAsFailed {
    position: TaskListPosition,
    at: DateTime<Utc>,
  },
  LogMessageReceived {
    position: TaskListPosition,
    log: LogMessage,
  },
}

impl ProcessEvent {
  pub fn name(&self) -> &'static str {
    match self {
      ProcessEvent::ProcessSetUp { .. } => "process_set_up",
      ProcessEvent::ProcessStarted { .. } => "process_started",
      ProcessEvent::TaskEntryMarkedAsRunning { .. } => "task_entry_marked_as_running",
      ProcessEvent::TaskEntryMarkedAsDone { .. } => "task_entry_marked_as_done",
      ProcessEvent::TaskEntryMarkedAsFailed { .. } => "task_entry_marked_as_failed",
      ProcessEvent::LogMessageReceived { .. } => "log_message_received",
    }
  }

  pub fn to_new_event(&self, causation_id: Option<Uuid>) -> Result<NewEvent> {
    Ok(NewEvent::new(self.name(), serde_json::to_value(self)?).caused_by(causation_id))
  }

  pub fn from_stored(event: &StoredEvent) -> Result<Self> {
    let parsed: ProcessEvent = serde_json::from_value(event.payload.clone())?;
    if parsed.name() != event.name {
      return Err(ProcessingError::InvalidMessage(format!("evento {} con payload de {}", event.name, parsed.name())));
    }
    Ok(parsed)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessStatus {
  Created,
  Running,
  AwaitingSubProcess,
  Finished,
  Failed,
}

impl ProcessStatus {
  pub fn is_terminal(&self) -> bool {
    matches!(self, ProcessStatus::Finished | ProcessStatus::Failed)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessState {
  pub process_id: ProcessId,
  pub parent_position: Option<TaskListPosition>,
  pub task_list: TaskList,
  pub config: ProcessConfig,
  pub started: bool,
}

impl ProcessState {
  /// Estado derivado de la lista de tareas y de la configuración.
  pub fn status(&self) -> ProcessStatus {
    if !self.started {
      return ProcessStatus::Created;
    }
    if self.task_list.is_finished() {
      return ProcessStatus::Finished;
    }
    if self.config.stop_on_error() && self.task_list.has_failed_entries() {
      return ProcessStatus::Failed;
    }
    match self.task_list.current_entry() {
      Some(e) if e.status() == TaskStatus::Running && matches!(e.task(), Task::RunSubProcess(_)) => {
        ProcessStatus::AwaitingSubProcess
      }
      _ => ProcessStatus::Running,
    }
  }
}

/// Aplica un evento y devuelve el estado resultante.
///
/// Marcar una tarea como hecha mueve el cursor. Un fallo lo mueve solo si
/// el proceso no se detiene ante errores.
pub fn apply(state: Option<ProcessState>, event: &ProcessEvent) -> Result<ProcessState> {
  match (state, event) {
    (None, ProcessEvent::ProcessSetUp { process_id, parent_position, task_list, config }) => {
      Ok(ProcessState { process_id: *process_id,
                        parent_position: parent_position.clone(),
                        task_list: task_list.clone(),
                        config: config.clone(),
                        started: false })
    }
    (None, other) => {
      Err(ProcessingError::ProtocolViolation(format!("la historia debe empezar con process_set_up, no con {}",
                                                     other.name())))
    }
    (Some(s), ProcessEvent::ProcessSetUp { .. }) => {
      Err(ProcessingError::ProtocolViolation(format!("el proceso {} ya fue configurado", s.process_id)))
    }
    (Some(mut s), ProcessEvent::ProcessStarted { .. }) => {
      s.started = true;
      Ok(s)
    }
    (Some(mut s), ProcessEvent::TaskEntryMarkedAsRunning { position, at }) => {
      s.task_list.mark_running(position, *at)?;
      Ok(s)
    }
    (Some(mut s), ProcessEvent::TaskEntryMarkedAsDone { position, at, result }) => {
      s.task_list.mark_done(position, *at, *result)?;
      s.task_list.advance()?;
      Ok(s)
    }
    (Some(mut s), ProcessEvent::TaskEntryMarkedAsFailed { position, at }) => {
      s.task_list.mark_failed(position, *at)?;
      if !s.config.stop_on_error() {
        s.task_list.advance()?;
      }
      Ok(s)
    }
    (Some(mut s), ProcessEvent::LogMessageReceived { position, log }) => {
      s.task_list.add_log(position, log.clone())?;
      Ok(s)
    }
  }
}
