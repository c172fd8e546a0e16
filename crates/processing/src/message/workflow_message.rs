use crate::errors::{ProcessingError, Result};
use crate::message::name_utils::{message_name_for, MessageType};
use crate::message::service_bus::{HeaderType, MessageHeader, ServiceBusMessage};
use crate::node::NodeName;
use crate::task::{TaskListId, TaskListPosition};
use chrono::{DateTime, Utc};
use processing_types::{Prototype, TypeRegistry, TypedValue};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use uuid::Uuid;

/// Payload de un mensaje de workflow: nombre del tipo más datos nativos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
  #[serde(rename = "typeClass")]
  type_class: String,
  data: JsonValue,
}

impl Payload {
  pub fn from_typed_value(value: &TypedValue) -> Self {
    Self { type_class: value.kind().to_string(),
           data: value.native_value().clone() }
  }

  /// Payload sin datos, como el de un `collect-data`.
  pub fn empty(kind: &str) -> Self {
    Self { type_class: kind.to_string(),
           data: JsonValue::Null }
  }

  pub fn type_class(&self) -> &str {
    &self.type_class
  }

  pub fn data(&self) -> &JsonValue {
    &self.data
  }

  /// Reconstruye el valor tipado con el prototipo registrado.
  pub fn to_typed_value(&self, types: &TypeRegistry) -> Result<TypedValue> {
    let prototype = types.prototype_of(&self.type_class)?;
    Ok(TypedValue::from_native_value(prototype, self.data.clone())?)
  }
}

/// Mensaje del protocolo de workflow.
///
/// Es inmutable: cada paso del protocolo produce un mensaje nuevo.
/// - `collect_data_of` y `new_data_collected` crean versión 1.
/// - `answer_with` y `answer_with_data_processing_completed` incrementan la
///   versión e invierten origen y destino.
/// - `prepare_data_processing` conserva la versión.
///
/// Toda transformación salvo `reconnect_to_process_task` genera un uuid
/// nuevo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMessage {
  uuid: Uuid,
  version: u32,
  created_on: DateTime<Utc>,
  message_type: MessageType,
  payload: Payload,
  origin: NodeName,
  target: NodeName,
  position: Option<TaskListPosition>,
  metadata: JsonMap<String, JsonValue>,
}

impl WorkflowMessage {
  /// Comando que pide a `target` un valor del tipo `prototype`.
  pub fn collect_data_of(prototype: &Prototype,
                         origin: NodeName,
                         target: NodeName,
                         metadata: JsonMap<String, JsonValue>)
                         -> Self {
    Self { uuid: Uuid::new_v4(),
           version: 1,
           created_on: Utc::now(),
           message_type: MessageType::CollectData,
           payload: Payload::empty(prototype.of_type()),
           origin,
           target,
           position: None,
           metadata }
  }

  /// Evento de datos recolectados emitido espontáneamente por una fuente.
  pub fn new_data_collected(value: &TypedValue,
                            origin: NodeName,
                            target: NodeName,
                            metadata: JsonMap<String, JsonValue>)
                            -> Self {
    Self { uuid: Uuid::new_v4(),
           version: 1,
           created_on: Utc::now(),
           message_type: MessageType::DataCollected,
           payload: Payload::from_typed_value(value),
           origin,
           target,
           position: None,
           metadata }
  }

  /// Adjunta una posición. Falla si el mensaje ya pertenece a otra lista.
  pub fn connect_to_process_task(&self, position: &TaskListPosition) -> Result<Self> {
    if let Some(current) = &self.position {
      if current.task_list_id() != position.task_list_id() {
        return Err(ProcessingError::InvalidMessage(format!("{} ya esta conectado a {}; use reconnect para moverlo a {}",
                                                           self.uuid, current, position)));
      }
    }
    let mut next = self.clone();
    next.uuid = Uuid::new_v4();
    next.position = Some(position.clone());
    Ok(next)
  }

  /// Reemplaza la posición sin restricciones y conserva el resto, uuid
  /// incluido.
  pub fn reconnect_to_process_task(&self, position: &TaskListPosition) -> Self {
    let mut next = self.clone();
    next.position = Some(position.clone());
    next
  }

  /// Responde un `collect-data` con el valor recolectado.
  pub fn answer_with(&self, value: &TypedValue) -> Result<Self> {
    self.expect_type(MessageType::CollectData, "answer_with")?;
    if value.kind() != self.payload.type_class {
      return Err(ProcessingError::TypeMismatch { expected: self.payload.type_class.clone(),
                                                 actual: value.kind().to_string() });
    }
    self.reply(MessageType::DataCollected, Payload::from_typed_value(value))
  }

  /// Convierte un evento (normalmente `data-collected`) en el comando
  /// `process-data` para `target`. Conserva versión, payload y posición.
  pub fn prepare_data_processing(&self, target: NodeName) -> Result<Self> {
    if self.is_command() {
      return Err(ProcessingError::InvalidMessage(format!("prepare_data_processing requiere un evento pero se recibio {}",
                                                         self.message_name())));
    }
    let mut next = self.clone();
    next.uuid = Uuid::new_v4();
    next.created_on = Utc::now();
    next.message_type = MessageType::ProcessData;
    next.origin = self.target.clone();
    next.target = target;
    Ok(next)
  }

  /// Confirma un `process-data`.
  pub fn answer_with_data_processing_completed(&self) -> Result<Self> {
    self.expect_type(MessageType::ProcessData, "answer_with_data_processing_completed")?;
    self.reply(MessageType::DataProcessed, self.payload.clone())
  }

  /// Convierte el payload al prototipo indicado.
  pub(crate) fn convert_payload_to(&self, prototype: &Prototype) -> Result<Self> {
    let converted =
      TypedValue::from_native_value(prototype, self.payload.data.clone()).map_err(|_| {
                                                                              ProcessingError::TypeMismatch {
                                                                                expected: prototype.of_type().to_string(),
                                                                                actual: self.payload.type_class.clone(),
                                                                              }
                                                                            })?;
    let mut next = self.clone();
    next.payload = Payload::from_typed_value(&converted);
    Ok(next)
  }

  /// Sustituye los datos conservando el tipo declarado.
  pub(crate) fn with_payload_data(&self, data: JsonValue) -> Self {
    let mut next = self.clone();
    next.uuid = Uuid::new_v4();
    next.payload.data = data;
    next
  }

  fn reply(&self, message_type: MessageType, payload: Payload) -> Result<Self> {
    let version = self.version.checked_add(1).ok_or_else(|| {
      ProcessingError::InvalidArgument(format!("la version {} del mensaje {} no puede incrementarse",
                                               self.version,
                                               self.uuid))
    })?;
    Ok(Self { uuid: Uuid::new_v4(),
              version,
              created_on: Utc::now(),
              message_type,
              payload,
              origin: self.target.clone(),
              target: self.origin.clone(),
              position: self.position.clone(),
              metadata: self.metadata.clone() })
  }

  fn expect_type(&self, expected: MessageType, operation: &str) -> Result<()> {
    if self.message_type != expected {
      return Err(ProcessingError::InvalidMessage(format!("{} requiere un mensaje {} pero se recibio {}",
                                                         operation,
                                                         expected.suffix(),
                                                         self.message_name())));
    }
    Ok(())
  }

  pub fn uuid(&self) -> &Uuid {
    &self.uuid
  }

  pub fn version(&self) -> u32 {
    self.version
  }

  pub fn created_on(&self) -> DateTime<Utc> {
    self.created_on
  }

  pub fn message_type(&self) -> MessageType {
    self.message_type
  }

  pub fn message_name(&self) -> String {
    message_name_for(&self.payload.type_class, self.message_type)
  }

  pub fn payload(&self) -> &Payload {
    &self.payload
  }

  pub fn origin(&self) -> &NodeName {
    &self.origin
  }

  pub fn target(&self) -> &NodeName {
    &self.target
  }

  pub fn process_task_list_position(&self) -> Option<&TaskListPosition> {
    self.position.as_ref()
  }

  pub fn task_list_id(&self) -> Option<&TaskListId> {
    self.position.as_ref().map(|p| p.task_list_id())
  }

  pub fn metadata(&self) -> &JsonMap<String, JsonValue> {
    &self.metadata
  }

  pub fn is_command(&self) -> bool {
    self.message_type.is_command()
  }

  pub fn to_service_bus_message(&self) -> Result<ServiceBusMessage> {
    let mut payload = JsonMap::new();
    payload.insert("payload".into(), serde_json::to_value(&self.payload)?);
    payload.insert("origin".into(), json!(self.origin.as_str()));
    payload.insert("target".into(), json!(self.target.as_str()));
    payload.insert("processTaskListPosition".into(),
                   self.position.as_ref().map(|p| json!(p.to_string())).unwrap_or(JsonValue::Null));
    payload.insert("metadata".into(), JsonValue::Object(self.metadata.clone()));
    let header = MessageHeader { uuid: self.uuid,
                                 created_on: self.created_on,
                                 version: self.version,
                                 message_type: if self.is_command() { HeaderType::Command } else { HeaderType::Event } };
    Ok(ServiceBusMessage::new(self.message_name(), header, payload))
  }

  pub fn from_service_bus_message(message: &ServiceBusMessage) -> Result<Self> {
    let message_type = MessageType::from_message_name(&message.name).ok_or_else(|| {
                         ProcessingError::InvalidMessage(format!("'{}' no es un mensaje de workflow", message.name))
                       })?;
    if message_type.is_command() != message.is_command() {
      return Err(ProcessingError::InvalidMessage(format!("{}: el header no coincide con el tipo de mensaje",
                                                         message.name)));
    }
    let payload: Payload = serde_json::from_value(message.field("payload")?.clone())?;
    if message_name_for(&payload.type_class, message_type) != message.name {
      return Err(ProcessingError::InvalidMessage(format!("{}: el tipo {} no corresponde al nombre",
                                                         message.name, payload.type_class)));
    }
    let position = match message.opt_str_field("processTaskListPosition")? {
      Some(p) => Some(p.parse()?),
      None => None,
    };
    Ok(Self { uuid: message.header.uuid,
              version: message.header.version,
              created_on: message.header.created_on,
              message_type,
              payload,
              origin: NodeName::new(message.str_field("origin")?)?,
              target: NodeName::new(message.str_field("target")?)?,
              position,
              metadata: message.object_field("metadata")? })
  }
}
