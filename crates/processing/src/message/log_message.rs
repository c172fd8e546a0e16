use crate::errors::{ProcessingError, Result};
use crate::message::name_utils::LOG_MESSAGE_NAME;
use crate::message::service_bus::{HeaderType, MessageHeader, ServiceBusMessage};
use crate::task::{Task, TaskListPosition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use uuid::Uuid;

pub const CODE_DEBUG: u16 = 0;
pub const CODE_WARNING: u16 = 100;
pub const CODE_DATA_PROCESSING_STARTED: u16 = 202;
pub const CODE_NO_MESSAGE_RECEIVED: u16 = 412;
pub const CODE_WRONG_MESSAGE_RECEIVED: u16 = 415;
pub const CODE_UNSUPPORTED_MESSAGE: u16 = 416;
pub const CODE_ERROR: u16 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
  Debug,
  Warning,
  Info,
  Error,
}

impl LogLevel {
  // < 100 debug, < 200 warning, < 400 info, resto error
  fn from_code(code: u16) -> Self {
    match code {
      0..=99 => LogLevel::Debug,
      100..=199 => LogLevel::Warning,
      200..=399 => LogLevel::Info,
      _ => LogLevel::Error,
    }
  }
}

/// Evento de log asociado a una posición de tarea.
///
/// Los parámetros solo admiten valores escalares (texto, número, booleano)
/// para que el log sea serializable sin ambigüedad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
  uuid: Uuid,
  created_on: DateTime<Utc>,
  position: TaskListPosition,
  technical_msg: String,
  msg_code: u16,
  msg_params: JsonMap<String, JsonValue>,
}

impl LogMessage {
  pub fn with_params(position: &TaskListPosition,
                     technical_msg: impl Into<String>,
                     msg_code: u16,
                     msg_params: JsonMap<String, JsonValue>)
                     -> Result<Self> {
    if let Some((key, _)) = msg_params.iter().find(|(_, v)| !is_scalar(v)) {
      return Err(ProcessingError::InvalidArgument(format!("el parametro de log '{}' no es escalar", key)));
    }
    Ok(Self::build(position, technical_msg.into(), msg_code, msg_params))
  }

  pub fn log_debug_msg(msg: impl Into<String>, position: &TaskListPosition) -> Self {
    Self::build(position, msg.into(), CODE_DEBUG, JsonMap::new())
  }

  pub fn log_warning_msg(msg: impl Into<String>, position: &TaskListPosition) -> Self {
    Self::build(position, msg.into(), CODE_WARNING, JsonMap::new())
  }

  pub fn log_error_msg(msg: impl Into<String>, position: &TaskListPosition) -> Self {
    Self::build(position, msg.into(), CODE_ERROR, JsonMap::new())
  }

  pub fn log_info_data_processing_started(position: &TaskListPosition) -> Self {
    let mut params = JsonMap::new();
    params.insert("started_on".into(), json!(Utc::now().to_rfc3339()));
    Self::build(position, "Data processing was started".into(), CODE_DATA_PROCESSING_STARTED, params)
  }

  /// Log de error a partir de un fallo inesperado.
  pub fn log_exception(error: &dyn std::error::Error, position: &TaskListPosition) -> Self {
    let mut params = JsonMap::new();
    params.insert("trace".into(), json!(format!("{:?}", error)));
    Self::build(position, error.to_string(), CODE_ERROR, params)
  }

  pub fn log_no_message_received_for(task: &Task, position: &TaskListPosition) -> Self {
    let params = Self::task_params(task, position);
    Self::build(position,
                format!("Task {} could not be started: no message received", task.kind_name()),
                CODE_NO_MESSAGE_RECEIVED,
                params)
  }

  pub fn log_wrong_message_received_for(task: &Task, position: &TaskListPosition, message_name: &str) -> Self {
    let mut params = Self::task_params(task, position);
    params.insert("message_name".into(), json!(message_name));
    Self::build(position,
                format!("Task {} received wrong message {}", task.kind_name(), message_name),
                CODE_WRONG_MESSAGE_RECEIVED,
                params)
  }

  pub fn log_unsupported_message_received(message_name: &str,
                                          handler_name: &str,
                                          position: &TaskListPosition)
                                          -> Self {
    let mut params = JsonMap::new();
    params.insert("message_name".into(), json!(message_name));
    params.insert("workflow_message_handler".into(), json!(handler_name));
    Self::build(position,
                format!("Message {} is not supported by {}", message_name, handler_name),
                CODE_UNSUPPORTED_MESSAGE,
                params)
  }

  /// Copia con uuid nuevo apuntando a otra posición. `created_on` se
  /// conserva.
  pub fn reconnect_to_process_task(&self, position: &TaskListPosition) -> Self {
    let mut next = self.clone();
    next.uuid = Uuid::new_v4();
    next.position = position.clone();
    next
  }

  fn build(position: &TaskListPosition, technical_msg: String, msg_code: u16, msg_params: JsonMap<String, JsonValue>) -> Self {
    Self { uuid: Uuid::new_v4(),
           created_on: Utc::now(),
           position: position.clone(),
           technical_msg,
           msg_code,
           msg_params }
  }

  fn task_params(task: &Task, position: &TaskListPosition) -> JsonMap<String, JsonValue> {
    let mut params = JsonMap::new();
    params.insert("process_id".into(), json!(position.process_id().to_string()));
    params.insert("task_list_position".into(), json!(position.to_string()));
    params.insert("task_class".into(), json!(task.kind_name()));
    // el json de la tarea viaja como texto para mantener los params escalares
    let task_json = task.to_json().map(|v| v.to_string()).unwrap_or_default();
    params.insert("task_as_json".into(), json!(task_json));
    params
  }

  pub fn uuid(&self) -> &Uuid {
    &self.uuid
  }

  pub fn created_on(&self) -> DateTime<Utc> {
    self.created_on
  }

  pub fn process_task_list_position(&self) -> &TaskListPosition {
    &self.position
  }

  pub fn technical_msg(&self) -> &str {
    &self.technical_msg
  }

  pub fn msg_code(&self) -> u16 {
    self.msg_code
  }

  pub fn msg_params(&self) -> &JsonMap<String, JsonValue> {
    &self.msg_params
  }

  pub fn level(&self) -> LogLevel {
    LogLevel::from_code(self.msg_code)
  }

  pub fn is_debug(&self) -> bool {
    self.level() == LogLevel::Debug
  }

  pub fn is_warning(&self) -> bool {
    self.level() == LogLevel::Warning
  }

  pub fn is_info(&self) -> bool {
    self.level() == LogLevel::Info
  }

  pub fn is_error(&self) -> bool {
    self.level() == LogLevel::Error
  }

  pub fn message_name(&self) -> &'static str {
    LOG_MESSAGE_NAME
  }

  pub fn to_service_bus_message(&self) -> ServiceBusMessage {
    let mut payload = JsonMap::new();
    payload.insert("processTaskListPosition".into(), json!(self.position.to_string()));
    payload.insert("technicalMsg".into(), json!(self.technical_msg));
    payload.insert("msgParams".into(), JsonValue::Object(self.msg_params.clone()));
    payload.insert("msgCode".into(), json!(self.msg_code));
    let header = MessageHeader { uuid: self.uuid,
                                 created_on: self.created_on,
                                 version: 1,
                                 message_type: HeaderType::Event };
    ServiceBusMessage::new(LOG_MESSAGE_NAME, header, payload)
  }

  pub fn from_service_bus_message(message: &ServiceBusMessage) -> Result<Self> {
    if message.name != LOG_MESSAGE_NAME {
      return Err(ProcessingError::InvalidMessage(format!("'{}' no es un mensaje de log", message.name)));
    }
    let code = message.field("msgCode")?
                      .as_u64()
                      .and_then(|c| u16::try_from(c).ok())
                      .ok_or_else(|| ProcessingError::InvalidMessage("msgCode invalido".into()))?;
    let position: TaskListPosition = message.str_field("processTaskListPosition")?.parse()?;
    let mut log = Self::with_params(&position,
                                    message.str_field("technicalMsg")?,
                                    code,
                                    message.object_field("msgParams")?)?;
    log.uuid = message.header.uuid;
    log.created_on = message.header.created_on;
    Ok(log)
  }
}

fn is_scalar(value: &JsonValue) -> bool {
  matches!(value, JsonValue::String(_) | JsonValue::Number(_) | JsonValue::Bool(_))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::node::NodeName;
  use crate::process::ProcessId;
  use crate::task::TaskListId;

  fn position() -> TaskListPosition {
    TaskListPosition::at(TaskListId::link_with(NodeName::default_name(), ProcessId::generate()), 1).unwrap()
  }

  #[test]
  fn codes_map_to_levels() {
    let pos = position();
    assert!(LogMessage::log_debug_msg("d", &pos).is_debug());
    assert!(LogMessage::log_warning_msg("w", &pos).is_warning());
    assert!(LogMessage::log_info_data_processing_started(&pos).is_info());
    assert!(LogMessage::log_error_msg("e", &pos).is_error());
    let err = ProcessingError::Routing("sin bus".into());
    let log = LogMessage::log_exception(&err, &pos);
    assert_eq!(log.msg_code(), CODE_ERROR);
    assert!(log.technical_msg().contains("sin bus"));
  }

  #[test]
  fn level_buckets_follow_code_ranges() {
    let pos = position();
    let level = |code| LogMessage::with_params(&pos, "x", code, JsonMap::new()).unwrap().level();
    assert_eq!(level(0), LogLevel::Debug);
    assert_eq!(level(42), LogLevel::Debug);
    assert_eq!(level(99), LogLevel::Debug);
    assert_eq!(level(100), LogLevel::Warning);
    assert_eq!(level(199), LogLevel::Warning);
    assert_eq!(level(200), LogLevel::Info);
    assert_eq!(level(399), LogLevel::Info);
    assert_eq!(level(400), LogLevel::Error);
  }

  #[test]
  fn params_must_be_scalar() {
    let mut params = JsonMap::new();
    params.insert("nested".into(), json!({"a": 1}));
    assert!(LogMessage::with_params(&position(), "x", 100, params).is_err());
  }

  #[test]
  fn reconnect_mints_new_uuid_and_keeps_created_on() {
    let log = LogMessage::log_warning_msg("w", &position());
    let other = position();
    let moved = log.reconnect_to_process_task(&other);
    assert_ne!(moved.uuid(), log.uuid());
    assert_eq!(moved.created_on(), log.created_on());
    assert_eq!(moved.process_task_list_position(), &other);
  }

  #[test]
  fn envelope_round_trip_keeps_uuid() {
    let log = LogMessage::log_error_msg("boom", &position());
    let envelope = log.to_service_bus_message();
    assert_eq!(envelope.name, LOG_MESSAGE_NAME);
    assert_eq!(envelope.header.version, 1);
    let back = LogMessage::from_service_bus_message(&envelope).unwrap();
    assert_eq!(back, log);
  }
}
