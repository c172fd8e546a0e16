//! Direcciones de tareas.
//!
//! Formato en texto:
//! - `TaskListId`: `<nodo>:<process id>`
//! - `TaskListPosition`: `<task list id>-<posicion>`
//!
//! El parseo divide por el último `-` y luego por el último `:`, de modo que
//! los guiones del uuid no interfieren.

use crate::errors::{ProcessingError, Result};
use crate::node::NodeName;
use crate::process::ProcessId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskListId {
  node_name: NodeName,
  process_id: ProcessId,
}

impl TaskListId {
  pub fn link_with(node_name: NodeName, process_id: ProcessId) -> Self {
    Self { node_name,
           process_id }
  }

  pub fn node_name(&self) -> &NodeName {
    &self.node_name
  }

  pub fn process_id(&self) -> &ProcessId {
    &self.process_id
  }
}

impl fmt::Display for TaskListId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.node_name, self.process_id)
  }
}

impl FromStr for TaskListId {
  type Err = ProcessingError;

  fn from_str(s: &str) -> Result<Self> {
    let (node, process) =
      s.rsplit_once(':').ok_or_else(|| ProcessingError::InvalidArgument(format!("task list id invalido: {}", s)))?;
    Ok(Self::link_with(NodeName::new(node)?, process.parse()?))
  }
}

impl TryFrom<String> for TaskListId {
  type Error = ProcessingError;

  fn try_from(value: String) -> Result<Self> {
    value.parse()
  }
}

impl From<TaskListId> for String {
  fn from(value: TaskListId) -> Self {
    value.to_string()
  }
}

/// Posición 1-based dentro de una `TaskList`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskListPosition {
  task_list_id: TaskListId,
  position: usize,
}

impl TaskListPosition {
  pub fn at(task_list_id: TaskListId, position: usize) -> Result<Self> {
    if position == 0 {
      return Err(ProcessingError::InvalidArgument("las posiciones empiezan en 1".into()));
    }
    Ok(Self { task_list_id,
              position })
  }

  pub fn task_list_id(&self) -> &TaskListId {
    &self.task_list_id
  }

  pub fn position(&self) -> usize {
    self.position
  }

  pub fn process_id(&self) -> &ProcessId {
    self.task_list_id.process_id()
  }

  pub fn node_name(&self) -> &NodeName {
    self.task_list_id.node_name()
  }
}

impl fmt::Display for TaskListPosition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.task_list_id, self.position)
  }
}

impl FromStr for TaskListPosition {
  type Err = ProcessingError;

  fn from_str(s: &str) -> Result<Self> {
    let (id, position) =
      s.rsplit_once('-').ok_or_else(|| ProcessingError::InvalidArgument(format!("posicion invalida: {}", s)))?;
    let position = position.parse::<usize>()
                           .map_err(|e| ProcessingError::InvalidArgument(format!("posicion invalida '{}': {}", s, e)))?;
    Self::at(id.parse()?, position)
  }
}

impl TryFrom<String> for TaskListPosition {
  type Error = ProcessingError;

  fn try_from(value: String) -> Result<Self> {
    value.parse()
  }
}

impl From<TaskListPosition> for String {
  fn from(value: TaskListPosition) -> Self {
    value.to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn position_string_survives_uuid_dashes() {
    let id = TaskListId::link_with(NodeName::new("crm").unwrap(), ProcessId::generate());
    let pos = TaskListPosition::at(id.clone(), 3).unwrap();
    let text = pos.to_string();
    assert!(text.starts_with("crm:"));
    assert!(text.ends_with("-3"));
    let parsed: TaskListPosition = text.parse().unwrap();
    assert_eq!(parsed, pos);
    assert_eq!(parsed.task_list_id(), &id);
  }

  #[test]
  fn position_zero_is_rejected() {
    let id = TaskListId::link_with(NodeName::default_name(), ProcessId::generate());
    assert!(TaskListPosition::at(id, 0).is_err());
    assert!("localhost:not-a-uuid-1".parse::<TaskListPosition>().is_err());
  }
}
