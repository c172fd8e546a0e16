//! Mensajes de coordinación entre un proceso y sus sub-procesos.

use crate::errors::{ProcessingError, Result};
use crate::message::log_message::LogMessage;
use crate::message::name_utils::{LOG_MESSAGE_NAME, START_SUB_PROCESS, SUB_PROCESS_FINISHED};
use crate::message::service_bus::{HeaderType, MessageHeader, ServiceBusMessage};
use crate::message::workflow_message::WorkflowMessage;
use crate::node::NodeName;
use crate::process::ProcessId;
use crate::task::TaskListPosition;
use chrono::{DateTime, Utc};
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use uuid::Uuid;

/// Comando para arrancar un sub-proceso en `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct StartSubProcess {
  uuid: Uuid,
  created_on: DateTime<Utc>,
  parent_position: TaskListPosition,
  sub_process_definition: JsonValue,
  sync_log_messages: bool,
  stop_on_error: bool,
  target: NodeName,
  previous_message: Option<WorkflowMessage>,
}

impl StartSubProcess {
  pub fn at(parent_position: TaskListPosition,
            sub_process_definition: JsonValue,
            sync_log_messages: bool,
            stop_on_error: bool,
            target: NodeName,
            previous_message: Option<WorkflowMessage>)
            -> Self {
    Self { uuid: Uuid::new_v4(),
           created_on: Utc::now(),
           parent_position,
           sub_process_definition,
           sync_log_messages,
           stop_on_error,
           target,
           previous_message }
  }

  pub fn uuid(&self) -> &Uuid {
    &self.uuid
  }

  pub fn created_on(&self) -> DateTime<Utc> {
    self.created_on
  }

  pub fn parent_task_list_position(&self) -> &TaskListPosition {
    &self.parent_position
  }

  pub fn sub_process_definition(&self) -> &JsonValue {
    &self.sub_process_definition
  }

  pub fn sync_log_messages(&self) -> bool {
    self.sync_log_messages
  }

  pub fn stop_on_error(&self) -> bool {
    self.stop_on_error
  }

  pub fn target(&self) -> &NodeName {
    &self.target
  }

  pub fn previous_message(&self) -> Option<&WorkflowMessage> {
    self.previous_message.as_ref()
  }

  pub fn message_name(&self) -> &'static str {
    START_SUB_PROCESS
  }

  pub fn to_service_bus_message(&self) -> Result<ServiceBusMessage> {
    let previous = match &self.previous_message {
      Some(m) => m.to_service_bus_message()?.to_json()?,
      None => JsonValue::Null,
    };
    let mut payload = JsonMap::new();
    payload.insert("parentTaskListPosition".into(), json!(self.parent_position.to_string()));
    payload.insert("subProcessDefinition".into(), self.sub_process_definition.clone());
    payload.insert("syncLogMessages".into(), json!(self.sync_log_messages));
    payload.insert("stopOnError".into(), json!(self.stop_on_error));
    payload.insert("target".into(), json!(self.target.as_str()));
    payload.insert("previousMessage".into(), previous);
    let header = MessageHeader { uuid: self.uuid,
                                 created_on: self.created_on,
                                 version: 1,
                                 message_type: HeaderType::Command };
    Ok(ServiceBusMessage::new(START_SUB_PROCESS, header, payload))
  }

  pub fn from_service_bus_message(message: &ServiceBusMessage) -> Result<Self> {
    if message.name != START_SUB_PROCESS {
      return Err(ProcessingError::InvalidMessage(format!("'{}' no es {}", message.name, START_SUB_PROCESS)));
    }
    let previous_message = match message.payload.get("previousMessage") {
      None | Some(JsonValue::Null) => None,
      Some(v) => Some(WorkflowMessage::from_service_bus_message(&ServiceBusMessage::from_json(v.clone())?)?),
    };
    Ok(Self { uuid: message.header.uuid,
              created_on: message.header.created_on,
              parent_position: message.str_field("parentTaskListPosition")?.parse()?,
              sub_process_definition: message.field("subProcessDefinition")?.clone(),
              sync_log_messages: message.bool_field("syncLogMessages")?,
              stop_on_error: message.bool_field("stopOnError")?,
              target: NodeName::new(message.str_field("target")?)?,
              previous_message })
  }
}

/// Último mensaje de un sub-proceso: el workflow message que lo cerró o el
/// log que lo hizo fallar.
#[derive(Debug, Clone, PartialEq)]
pub enum LastMessage {
  Workflow(WorkflowMessage),
  Log(LogMessage),
}

impl LastMessage {
  fn to_json(&self) -> Result<JsonValue> {
    match self {
      LastMessage::Workflow(m) => m.to_service_bus_message()?.to_json(),
      LastMessage::Log(l) => l.to_service_bus_message().to_json(),
    }
  }

  fn from_json(value: &JsonValue) -> Result<Self> {
    let envelope = ServiceBusMessage::from_json(value.clone())?;
    if envelope.name == LOG_MESSAGE_NAME {
      Ok(LastMessage::Log(LogMessage::from_service_bus_message(&envelope)?))
    } else {
      Ok(LastMessage::Workflow(WorkflowMessage::from_service_bus_message(&envelope)?))
    }
  }
}

/// Evento que informa al proceso padre del resultado de un sub-proceso.
/// Se enruta al bus de eventos del nodo de la posición padre.
#[derive(Debug, Clone, PartialEq)]
pub struct SubProcessFinished {
  uuid: Uuid,
  created_on: DateTime<Utc>,
  node_name: NodeName,
  sub_process_id: ProcessId,
  succeed: bool,
  last_message: Option<LastMessage>,
  parent_position: TaskListPosition,
}

impl SubProcessFinished {
  pub fn record(node_name: NodeName,
                sub_process_id: ProcessId,
                succeed: bool,
                last_message: Option<LastMessage>,
                parent_position: TaskListPosition)
                -> Self {
    Self { uuid: Uuid::new_v4(),
           created_on: Utc::now(),
           node_name,
           sub_process_id,
           succeed,
           last_message,
           parent_position }
  }

  pub fn uuid(&self) -> &Uuid {
    &self.uuid
  }

  pub fn created_on(&self) -> DateTime<Utc> {
    self.created_on
  }

  pub fn processing_node_name(&self) -> &NodeName {
    &self.node_name
  }

  pub fn sub_process_id(&self) -> &ProcessId {
    &self.sub_process_id
  }

  pub fn succeed(&self) -> bool {
    self.succeed
  }

  pub fn last_message(&self) -> Option<&LastMessage> {
    self.last_message.as_ref()
  }

  pub fn parent_task_list_position(&self) -> &TaskListPosition {
    &self.parent_position
  }

  /// Nodo del proceso padre.
  pub fn target(&self) -> &NodeName {
    self.parent_position.node_name()
  }

  pub fn message_name(&self) -> &'static str {
    SUB_PROCESS_FINISHED
  }

  pub fn to_service_bus_message(&self) -> Result<ServiceBusMessage> {
    let last = match &self.last_message {
      Some(m) => m.to_json()?,
      None => JsonValue::Null,
    };
    let mut payload = JsonMap::new();
    payload.insert("processorNodeName".into(), json!(self.node_name.as_str()));
    payload.insert("subProcessId".into(), json!(self.sub_process_id.to_string()));
    payload.insert("succeed".into(), json!(self.succeed));
    payload.insert("lastMessage".into(), last);
    payload.insert("parentTaskListPosition".into(), json!(self.parent_position.to_string()));
    let header = MessageHeader { uuid: self.uuid,
                                 created_on: self.created_on,
                                 version: 1,
                                 message_type: HeaderType::Event };
    Ok(ServiceBusMessage::new(SUB_PROCESS_FINISHED, header, payload))
  }

  pub fn from_service_bus_message(message: &ServiceBusMessage) -> Result<Self> {
    if message.name != SUB_PROCESS_FINISHED {
      return Err(ProcessingError::InvalidMessage(format!("'{}' no es {}", message.name, SUB_PROCESS_FINISHED)));
    }
    let last_message = match message.payload.get("lastMessage") {
      None | Some(JsonValue::Null) => None,
      Some(v) => Some(LastMessage::from_json(v)?),
    };
    Ok(Self { uuid: message.header.uuid,
              created_on: message.header.created_on,
              node_name: NodeName::new(message.str_field("processorNodeName")?)?,
              sub_process_id: message.str_field("subProcessId")?.parse()?,
              succeed: message.bool_field("succeed")?,
              last_message,
              parent_position: message.str_field("parentTaskListPosition")?.parse()? })
  }
}
