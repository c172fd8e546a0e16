use crate::errors::{ProcessingError, Result};
use crate::message::LogMessage;
use crate::task::position::{TaskListId, TaskListPosition};
use crate::task::task::Task;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
  NotStarted,
  Running,
  Done,
  Failed,
}

impl TaskStatus {
  pub fn is_terminal(&self) -> bool {
    matches!(self, TaskStatus::Done | TaskStatus::Failed)
  }

  // Las transiciones solo avanzan: NOT_STARTED -> RUNNING -> DONE|FAILED.
  // Un paso que falla antes de arrancar puede ir directo a FAILED.
  fn can_move_to(&self, next: TaskStatus) -> bool {
    matches!((self, next),
             (TaskStatus::NotStarted, TaskStatus::Running)
             | (TaskStatus::NotStarted, TaskStatus::Failed)
             | (TaskStatus::Running, TaskStatus::Done)
             | (TaskStatus::Running, TaskStatus::Failed))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskListEntry {
  position: TaskListPosition,
  task: Task,
  status: TaskStatus,
  started_on: Option<DateTime<Utc>>,
  finished_on: Option<DateTime<Utc>>,
  /// uuid del mensaje que completó la tarea, si hubo.
  result: Option<Uuid>,
  #[serde(default)]
  log: Vec<LogMessage>,
}

impl TaskListEntry {
  fn new(position: TaskListPosition, task: Task) -> Self {
    Self { position,
           task,
           status: TaskStatus::NotStarted,
           started_on: None,
           finished_on: None,
           result: None,
           log: Vec::new() }
  }

  pub fn position(&self) -> &TaskListPosition {
    &self.position
  }

  pub fn task(&self) -> &Task {
    &self.task
  }

  pub fn status(&self) -> TaskStatus {
    self.status
  }

  pub fn started_on(&self) -> Option<DateTime<Utc>> {
    self.started_on
  }

  pub fn finished_on(&self) -> Option<DateTime<Utc>> {
    self.finished_on
  }

  pub fn result(&self) -> Option<&Uuid> {
    self.result.as_ref()
  }

  pub fn log(&self) -> &[LogMessage] {
    &self.log
  }

  fn transition(&mut self, next: TaskStatus) -> Result<()> {
    if !self.status.can_move_to(next) {
      return Err(ProcessingError::ProtocolViolation(format!("transicion invalida {:?} -> {:?} en {}",
                                                            self.status, next, self.position)));
    }
    self.status = next;
    Ok(())
  }
}

/// Secuencia ordenada de tareas con un cursor 1-based.
///
/// El cursor apunta a la tarea actual; vale `len() + 1` cuando la lista
/// terminó. Toda marca de estado se valida contra el cursor, por lo que las
/// entradas previas quedan congeladas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskList {
  task_list_id: TaskListId,
  entries: Vec<TaskListEntry>,
  cursor: usize,
}

impl TaskList {
  pub fn schedule_tasks(task_list_id: TaskListId, tasks: Vec<Task>) -> Result<Self> {
    let mut entries = Vec::with_capacity(tasks.len());
    for (i, task) in tasks.into_iter().enumerate() {
      entries.push(TaskListEntry::new(TaskListPosition::at(task_list_id.clone(), i + 1)?, task));
    }
    Ok(Self { task_list_id,
              entries,
              cursor: 1 })
  }

  pub fn task_list_id(&self) -> &TaskListId {
    &self.task_list_id
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn cursor(&self) -> usize {
    self.cursor
  }

  pub fn entries(&self) -> &[TaskListEntry] {
    &self.entries
  }

  /// Entrada bajo el cursor; `None` cuando la lista terminó.
  pub fn current_entry(&self) -> Option<&TaskListEntry> {
    self.entries.get(self.cursor - 1)
  }

  pub fn current_position(&self) -> Option<&TaskListPosition> {
    self.current_entry().map(|e| e.position())
  }

  pub fn entry(&self, position: &TaskListPosition) -> Option<&TaskListEntry> {
    if position.task_list_id() != &self.task_list_id || position.position() == 0 {
      return None;
    }
    self.entries.get(position.position() - 1)
  }

  pub fn is_finished(&self) -> bool {
    self.cursor > self.entries.len()
  }

  pub fn has_failed_entries(&self) -> bool {
    self.entries.iter().any(|e| e.status == TaskStatus::Failed)
  }

  pub fn has_started(&self) -> bool {
    self.entries.iter().any(|e| e.status != TaskStatus::NotStarted)
  }

  pub fn mark_running(&mut self, position: &TaskListPosition, at: DateTime<Utc>) -> Result<()> {
    let entry = self.current_mut(position)?;
    entry.transition(TaskStatus::Running)?;
    entry.started_on = Some(at);
    Ok(())
  }

  pub fn mark_done(&mut self, position: &TaskListPosition, at: DateTime<Utc>, result: Option<Uuid>) -> Result<()> {
    let entry = self.current_mut(position)?;
    entry.transition(TaskStatus::Done)?;
    entry.finished_on = Some(at);
    entry.result = result;
    Ok(())
  }

  pub fn mark_failed(&mut self, position: &TaskListPosition, at: DateTime<Utc>) -> Result<()> {
    let entry = self.current_mut(position)?;
    entry.transition(TaskStatus::Failed)?;
    entry.finished_on = Some(at);
    Ok(())
  }

  /// Adjunta un log a la entrada indicada. Los duplicados (mismo uuid) se
  /// ignoran.
  pub fn add_log(&mut self, position: &TaskListPosition, log: LogMessage) -> Result<()> {
    let idx = self.index_of(position)?;
    let entry = &mut self.entries[idx];
    if !entry.log.iter().any(|l| l.uuid() == log.uuid()) {
      entry.log.push(log);
    }
    Ok(())
  }

  /// Mueve el cursor a la siguiente entrada. La actual debe estar en un
  /// estado terminal.
  pub fn advance(&mut self) -> Result<()> {
    let entry = self.current_entry()
                    .ok_or_else(|| ProcessingError::ProtocolViolation("la lista de tareas ya termino".into()))?;
    if !entry.status.is_terminal() {
      return Err(ProcessingError::ProtocolViolation(format!("no se puede avanzar: {} esta en {:?}",
                                                            entry.position, entry.status)));
    }
    self.cursor += 1;
    Ok(())
  }

  fn index_of(&self, position: &TaskListPosition) -> Result<usize> {
    if position.task_list_id() != &self.task_list_id {
      return Err(ProcessingError::ProtocolViolation(format!("{} no pertenece a {}", position, self.task_list_id)));
    }
    let idx = position.position() - 1;
    if idx >= self.entries.len() {
      return Err(ProcessingError::ProtocolViolation(format!("posicion fuera de rango: {}", position)));
    }
    Ok(idx)
  }

  fn current_mut(&mut self, position: &TaskListPosition) -> Result<&mut TaskListEntry> {
    let idx = self.index_of(position)?;
    if idx + 1 != self.cursor {
      return Err(ProcessingError::ProtocolViolation(format!("{} no es la tarea actual (cursor {})",
                                                            position, self.cursor)));
    }
    Ok(&mut self.entries[idx])
  }
}
