use crate::config::ProcessConfig;
use crate::errors::{ProcessingError, Result};
use crate::factory::definition::*;
use crate::message::WorkflowMessage;
use crate::node::NodeName;
use crate::process::{Process, ProcessId};
use crate::task::{CollectData, ManipulatePayload, PayloadManipulation, ProcessData, RunSubProcess, Task,
                  TaskListPosition};
use log::debug;
use processing_types::{Prototype, TypeRegistry};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::HashMap;
use std::sync::Arc;

type JsonObject = JsonMap<String, JsonValue>;

/// Construye procesos a partir de definiciones JSON.
///
/// Las definiciones se validan por completo antes de crear nada: tipo de
/// proceso, tipo de cada tarea, parámetros obligatorios y que los tipos de
/// datos nombrados existan en el registro.
pub struct ProcessFactory {
  node_name: NodeName,
  types: Arc<TypeRegistry>,
  // definiciones para derivar procesos, por nombre de mensaje
  definitions: HashMap<String, JsonValue>,
}

impl ProcessFactory {
  pub fn new(node_name: NodeName, types: Arc<TypeRegistry>) -> Self {
    Self { node_name,
           types,
           definitions: HashMap::new() }
  }

  pub fn node_name(&self) -> &NodeName {
    &self.node_name
  }

  pub fn types(&self) -> &TypeRegistry {
    &self.types
  }

  /// Asocia una definición al nombre de mensaje que la dispara.
  pub fn register_definition(&mut self, message_name: &str, definition: JsonValue) -> Result<()> {
    self.parse_definition(&definition)?;
    self.definitions.insert(message_name.to_string(), definition);
    Ok(())
  }

  pub fn has_definition_for(&self, message_name: &str) -> bool {
    self.definitions.contains_key(message_name)
  }

  pub fn create_process_from_definition(&self,
                                        definition: &JsonValue,
                                        parent_position: Option<TaskListPosition>)
                                        -> Result<Process> {
    let (tasks, config) = self.parse_definition(definition)?;
    Process::set_up(ProcessId::generate(), self.node_name.clone(), tasks, config, parent_position)
  }

  /// Crea un proceso para un mensaje entrante según la definición
  /// registrada para su nombre. El mensaje se entrega después con
  /// `Process::perform`.
  pub fn derive_process_from_message(&self, message: &WorkflowMessage) -> Result<Process> {
    let name = message.message_name();
    let definition = self.definitions.get(&name).ok_or_else(|| {
                                                    ProcessingError::Definition(format!("no hay definicion de proceso para {}",
                                                                                        name))
                                                  })?;
    self.create_process_from_definition(definition, None)
  }

  fn parse_definition(&self, definition: &JsonValue) -> Result<(Vec<Task>, ProcessConfig)> {
    let object = definition.as_object()
                           .ok_or_else(|| ProcessingError::Definition("la definicion debe ser un objeto".into()))?;
    let process_type: ProcessType = required_str(object, PROCESS_TYPE, "proceso")?.parse()?;
    let tasks = match object.get(TASKS) {
      None | Some(JsonValue::Null) => Vec::new(),
      Some(JsonValue::Array(items)) => items.iter().map(|t| self.build_task(t)).collect::<Result<Vec<_>>>()?,
      Some(_) => return Err(ProcessingError::Definition(format!("'{}' debe ser una lista", TASKS))),
    };
    let config = ProcessConfig::from_json(object.get(CONFIG).unwrap_or(&JsonValue::Null))?;
    debug!("definicion {} con {} tareas", process_type, tasks.len());
    Ok((tasks, config))
  }

  fn build_task(&self, definition: &JsonValue) -> Result<Task> {
    let task = definition.as_object()
                         .ok_or_else(|| ProcessingError::Definition("cada tarea debe ser un objeto".into()))?;
    let task_type = required_str(task, TASK_TYPE, "tarea")?;
    match task_type {
      TASK_COLLECT_DATA => {
        let source = NodeName::new(required_str(task, SOURCE, task_type)?)?;
        let prototype = self.prototype(required_str(task, PROCESSING_TYPE, task_type)?)?;
        let metadata = match task.get(METADATA) {
          None | Some(JsonValue::Null) => JsonMap::new(),
          Some(JsonValue::Object(m)) => m.clone(),
          Some(_) => return Err(ProcessingError::Definition(format!("{}: '{}' debe ser un objeto", task_type, METADATA))),
        };
        Ok(Task::CollectData(CollectData::from(source, prototype).with_metadata(metadata)))
      }
      TASK_PROCESS_DATA => {
        let target = NodeName::new(required_str(task, TARGET, task_type)?)?;
        let allowed = task.get(ALLOWED_TYPES)
                          .and_then(|v| v.as_array())
                          .ok_or_else(|| missing(ALLOWED_TYPES, task_type))?;
        let mut allowed_types = Vec::with_capacity(allowed.len());
        for kind in allowed {
          let kind = kind.as_str()
                         .ok_or_else(|| ProcessingError::Definition(format!("{}: tipos permitidos deben ser texto",
                                                                            task_type)))?;
          allowed_types.push(self.prototype(kind)?.of_type().to_string());
        }
        let preferred = match task.get(PREFERRED_TYPE).and_then(|v| v.as_str()) {
          Some(kind) => Some(self.prototype(kind)?),
          None => None,
        };
        Ok(Task::ProcessData(ProcessData::address(target, allowed_types, preferred)?))
      }
      TASK_RUN_SUB_PROCESS => {
        let sub_definition = task.get(PROCESS_DEFINITION).ok_or_else(|| missing(PROCESS_DEFINITION, task_type))?;
        // la definición anidada se valida aquí pero viaja sin cambios
        self.parse_definition(sub_definition)?;
        let target = match task.get(TARGET_NODE_NAME).and_then(|v| v.as_str()) {
          Some(name) => NodeName::new(name)?,
          None => NodeName::default_name(),
        };
        let sync = task.get(SYNC_LOG_MESSAGES).and_then(|v| v.as_bool()).unwrap_or(false);
        Ok(Task::RunSubProcess(RunSubProcess::setup(target, sub_definition.clone(), sync)?))
      }
      TASK_MANIPULATE_PAYLOAD => {
        let ops = task.get(MANIPULATION).ok_or_else(|| missing(MANIPULATION, task_type))?;
        let ops = serde_json::from_value(ops.clone()).map_err(|e| {
                                                        ProcessingError::Definition(format!("{}: {}", MANIPULATION, e))
                                                      })?;
        Ok(Task::ManipulatePayload(ManipulatePayload::with(PayloadManipulation::new(ops)?)))
      }
      other => Err(ProcessingError::Definition(format!("tipo de tarea desconocido: {}", other))),
    }
  }

  fn prototype(&self, kind: &str) -> Result<Prototype> {
    self.types
        .prototype_of(kind)
        .cloned()
        .map_err(|e| ProcessingError::Definition(e.to_string()))
  }
}

fn missing(key: &str, owner: &str) -> ProcessingError {
  ProcessingError::Definition(format!("{}: falta el parametro '{}'", owner, key))
}

fn required_str<'a>(object: &'a JsonObject, key: &str, owner: &str) -> Result<&'a str> {
  object.get(key).and_then(|v| v.as_str()).ok_or_else(|| missing(key, owner))
}
