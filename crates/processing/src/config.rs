//! Configuración de procesos y de nodo.
//!
//! `ProcessConfig` es el mapa libre de opciones de una definición de proceso
//! (clave `config`). `NodeConfig` se carga desde variables de entorno (con
//! soporte `.env` vía dotenvy) y describe el nodo donde corre el runtime.

use crate::errors::{ProcessingError, Result};
use crate::node::NodeName;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::PathBuf;

/// Clave que decide si un fallo detiene el proceso o se avanza best-effort.
pub const STOP_ON_ERROR: &str = "stop_on_error";
/// Un sub-proceso con esta clave reenvía sus logs a la posición padre.
pub const SYNC_LOG_MESSAGES: &str = "sync_log_messages";

/// Opciones de un proceso. Preserva el orden de inserción.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessConfig(IndexMap<String, JsonValue>);

impl ProcessConfig {
  pub fn new() -> Self {
    Self::default()
  }

  /// Acepta un objeto JSON o `null` (configuración vacía).
  pub fn from_json(value: &JsonValue) -> Result<Self> {
    match value {
      JsonValue::Null => Ok(Self::default()),
      JsonValue::Object(map) => Ok(Self(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())),
      other => Err(ProcessingError::Definition(format!("config debe ser un objeto, se recibio {}", other))),
    }
  }

  pub fn get(&self, key: &str) -> Option<&JsonValue> {
    self.0.get(key)
  }

  pub fn set(&mut self, key: &str, value: JsonValue) {
    self.0.insert(key.to_string(), value);
  }

  pub fn contains(&self, key: &str) -> bool {
    self.0.contains_key(key)
  }

  /// Interpreta `true`, `"true"`, `"1"` y números distintos de cero como
  /// verdadero. Ausente => `false`.
  pub fn boolean_value(&self, key: &str) -> bool {
    match self.0.get(key) {
      Some(JsonValue::Bool(b)) => *b,
      Some(JsonValue::String(s)) => matches!(s.to_ascii_lowercase().as_str(), "true" | "1"),
      Some(JsonValue::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
      _ => false,
    }
  }

  pub fn string_value(&self, key: &str) -> Option<String> {
    match self.0.get(key) {
      Some(JsonValue::String(s)) => Some(s.clone()),
      Some(JsonValue::Null) | None => None,
      Some(other) => Some(other.to_string()),
    }
  }

  pub fn stop_on_error(&self) -> bool {
    self.boolean_value(STOP_ON_ERROR)
  }

  pub fn to_json(&self) -> JsonValue {
    JsonValue::Object(self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
  }
}

/// Configuración del nodo de ejecución.
#[derive(Debug, Clone)]
pub struct NodeConfig {
  pub node_name: NodeName,
  /// Nodo al que se envían los `StartSubProcess` sin destino explícito.
  pub sub_processor: NodeName,
  /// Ruta opcional a una definición de proceso en JSON.
  pub definition_path: Option<PathBuf>,
}

impl NodeConfig {
  /// Lee `PROCESSING_NODE_NAME`, `PROCESSING_SUB_PROCESSOR` y
  /// `PROCESSING_DEFINITION`. Los nombres ausentes caen en `localhost`.
  pub fn from_env() -> Result<Self> {
    dotenvy::dotenv().ok();
    let node_name = match std::env::var("PROCESSING_NODE_NAME") {
      Ok(v) => NodeName::new(&v)?,
      Err(_) => NodeName::default_name(),
    };
    let sub_processor = match std::env::var("PROCESSING_SUB_PROCESSOR") {
      Ok(v) => NodeName::new(&v)?,
      Err(_) => node_name.clone(),
    };
    let definition_path = std::env::var("PROCESSING_DEFINITION").ok()
                                                                 .filter(|p| !p.trim().is_empty())
                                                                 .map(PathBuf::from);
    Ok(Self { node_name,
              sub_processor,
              definition_path })
  }
}

impl Default for NodeConfig {
  fn default() -> Self {
    Self { node_name: NodeName::default_name(),
           sub_processor: NodeName::default_name(),
           definition_path: None }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn boolean_value_accepts_true_one_and_nonzero() {
    let cfg = ProcessConfig::from_json(&json!({"a": true, "b": "TRUE", "c": 1, "d": "no", "e": "yes", "f": "1"})).unwrap();
    assert!(cfg.boolean_value("a"));
    assert!(cfg.boolean_value("b"));
    assert!(cfg.boolean_value("c"));
    assert!(!cfg.boolean_value("d"));
    assert!(!cfg.boolean_value("e"));
    assert!(cfg.boolean_value("f"));
    assert!(!cfg.boolean_value("missing"));
    assert!(!cfg.stop_on_error());
  }

  #[test]
  fn config_must_be_an_object() {
    assert!(ProcessConfig::from_json(&json!([1, 2])).is_err());
    assert!(ProcessConfig::from_json(&JsonValue::Null).unwrap().to_json().as_object().unwrap().is_empty());
  }
}
