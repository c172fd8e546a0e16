use crate::errors::{ProcessingError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static DEFAULT_NODE_NAME: Lazy<NodeName> = Lazy::new(|| NodeName("localhost".to_string()));

/// Nombre de un nodo: destino de enrutamiento que posee un bus de comandos
/// y uno de eventos.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeName(String);

impl NodeName {
  pub fn new(name: &str) -> Result<Self> {
    let name = name.trim();
    if name.is_empty() {
      return Err(ProcessingError::InvalidArgument("el nombre de nodo no puede estar vacio".into()));
    }
    Ok(Self(name.to_string()))
  }

  /// Nodo por defecto (`localhost`).
  pub fn default_name() -> Self {
    DEFAULT_NODE_NAME.clone()
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for NodeName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl FromStr for NodeName {
  type Err = ProcessingError;

  fn from_str(s: &str) -> Result<Self> {
    Self::new(s)
  }
}

impl TryFrom<String> for NodeName {
  type Error = ProcessingError;

  fn try_from(value: String) -> Result<Self> {
    Self::new(&value)
  }
}

impl TryFrom<&str> for NodeName {
  type Error = ProcessingError;

  fn try_from(value: &str) -> Result<Self> {
    Self::new(value)
  }
}

impl From<NodeName> for String {
  fn from(value: NodeName) -> Self {
    value.0
  }
}
