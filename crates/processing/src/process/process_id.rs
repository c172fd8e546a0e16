use crate::errors::{ProcessingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identidad de un proceso. Coincide con el id del stream de eventos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(Uuid);

impl ProcessId {
  pub fn generate() -> Self {
    Self(Uuid::new_v4())
  }

  pub fn from_uuid(uuid: Uuid) -> Self {
    Self(uuid)
  }

  pub fn as_uuid(&self) -> &Uuid {
    &self.0
  }
}

impl fmt::Display for ProcessId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl FromStr for ProcessId {
  type Err = ProcessingError;

  fn from_str(s: &str) -> Result<Self> {
    Uuid::parse_str(s).map(Self)
                      .map_err(|e| ProcessingError::InvalidArgument(format!("process id invalido '{}': {}", s, e)))
  }
}
