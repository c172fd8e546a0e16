use crate::errors::{ProcessingError, Result};
use crate::node::NodeName;
use crate::task::manipulation::PayloadManipulation;
use processing_types::Prototype;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Unidad de trabajo de un proceso. Es un valor inmutable: una vez
/// planificada en una `TaskList` no cambia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task_type", rename_all = "snake_case")]
pub enum Task {
  CollectData(CollectData),
  ProcessData(ProcessData),
  RunSubProcess(RunSubProcess),
  ManipulatePayload(ManipulatePayload),
}

impl Task {
  /// Nombre corto usado en logs y en los parámetros de `LogMessage`.
  pub fn kind_name(&self) -> &'static str {
    match self {
      Task::CollectData(_) => "collect_data",
      Task::ProcessData(_) => "process_data",
      Task::RunSubProcess(_) => "run_sub_process",
      Task::ManipulatePayload(_) => "manipulate_payload",
    }
  }

  pub fn to_json(&self) -> Result<JsonValue> {
    Ok(serde_json::to_value(self)?)
  }
}

/// Pide a `source` un valor del tipo descrito por `prototype`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectData {
  source: NodeName,
  prototype: Prototype,
  #[serde(default)]
  metadata: JsonMap<String, JsonValue>,
}

impl CollectData {
  pub fn from(source: NodeName, prototype: Prototype) -> Self {
    Self { source,
           prototype,
           metadata: JsonMap::new() }
  }

  pub fn with_metadata(mut self, metadata: JsonMap<String, JsonValue>) -> Self {
    self.metadata = metadata;
    self
  }

  pub fn source(&self) -> &NodeName {
    &self.source
  }

  pub fn prototype(&self) -> &Prototype {
    &self.prototype
  }

  pub fn metadata(&self) -> &JsonMap<String, JsonValue> {
    &self.metadata
  }
}

/// Entrega el payload del paso anterior a `target`.
///
/// Si el tipo entrante no está en `allowed_types` se convierte a
/// `preferred_type`; sin tipo preferido el mensaje se rechaza.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessData {
  target: NodeName,
  allowed_types: Vec<String>,
  preferred_type: Option<Prototype>,
}

impl ProcessData {
  pub fn address(target: NodeName, allowed_types: Vec<String>, preferred_type: Option<Prototype>) -> Result<Self> {
    if allowed_types.is_empty() {
      return Err(ProcessingError::Definition("process_data requiere al menos un tipo permitido".into()));
    }
    if let Some(preferred) = &preferred_type {
      if !allowed_types.iter().any(|t| t == preferred.of_type()) {
        return Err(ProcessingError::Definition(format!("el tipo preferido {} no esta entre los permitidos {:?}",
                                                       preferred.of_type(),
                                                       allowed_types)));
      }
    }
    Ok(Self { target,
              allowed_types,
              preferred_type })
  }

  pub fn target(&self) -> &NodeName {
    &self.target
  }

  pub fn allowed_types(&self) -> &[String] {
    &self.allowed_types
  }

  pub fn preferred_type(&self) -> Option<&Prototype> {
    self.preferred_type.as_ref()
  }

  pub fn allows(&self, kind: &str) -> bool {
    self.allowed_types.iter().any(|t| t == kind)
  }
}

/// Delega una definición de proceso completa a otro nodo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSubProcess {
  target_node_name: NodeName,
  process_definition: JsonValue,
  #[serde(default)]
  sync_log_messages: bool,
}

impl RunSubProcess {
  /// La definición se guarda tal cual para reenviarla sin pérdida.
  pub fn setup(target_node_name: NodeName, process_definition: JsonValue, sync_log_messages: bool) -> Result<Self> {
    if !process_definition.is_object() {
      return Err(ProcessingError::Definition("process_definition debe ser un objeto".into()));
    }
    Ok(Self { target_node_name,
              process_definition,
              sync_log_messages })
  }

  pub fn target_node_name(&self) -> &NodeName {
    &self.target_node_name
  }

  pub fn process_definition(&self) -> &JsonValue {
    &self.process_definition
  }

  pub fn sync_log_messages(&self) -> bool {
    self.sync_log_messages
  }
}

/// Transforma localmente el payload del paso anterior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManipulatePayload {
  manipulation: PayloadManipulation,
}

impl ManipulatePayload {
  pub fn with(manipulation: PayloadManipulation) -> Self {
    Self { manipulation }
  }

  pub fn manipulation(&self) -> &PayloadManipulation {
    &self.manipulation
  }
}
