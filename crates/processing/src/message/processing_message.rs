use crate::errors::Result;
use crate::message::log_message::LogMessage;
use crate::message::name_utils::{LOG_MESSAGE_NAME, START_SUB_PROCESS, SUB_PROCESS_FINISHED};
use crate::message::service_bus::ServiceBusMessage;
use crate::message::sub_process::{StartSubProcess, SubProcessFinished};
use crate::message::workflow_message::WorkflowMessage;
use crate::node::NodeName;
use crate::task::TaskListPosition;
use uuid::Uuid;

/// Cualquier mensaje que el motor sabe enrutar.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingMessage {
  Workflow(WorkflowMessage),
  Log(LogMessage),
  StartSubProcess(StartSubProcess),
  SubProcessFinished(SubProcessFinished),
}

impl ProcessingMessage {
  pub fn message_name(&self) -> String {
    match self {
      ProcessingMessage::Workflow(m) => m.message_name(),
      ProcessingMessage::Log(m) => m.message_name().to_string(),
      ProcessingMessage::StartSubProcess(m) => m.message_name().to_string(),
      ProcessingMessage::SubProcessFinished(m) => m.message_name().to_string(),
    }
  }

  pub fn uuid(&self) -> &Uuid {
    match self {
      ProcessingMessage::Workflow(m) => m.uuid(),
      ProcessingMessage::Log(m) => m.uuid(),
      ProcessingMessage::StartSubProcess(m) => m.uuid(),
      ProcessingMessage::SubProcessFinished(m) => m.uuid(),
    }
  }

  /// Los comandos van al bus de comandos del destino; el resto al de
  /// eventos.
  pub fn is_command(&self) -> bool {
    match self {
      ProcessingMessage::Workflow(m) => m.is_command(),
      ProcessingMessage::StartSubProcess(_) => true,
      ProcessingMessage::Log(_) | ProcessingMessage::SubProcessFinished(_) => false,
    }
  }

  /// Nodo destino para el enrutamiento. Los logs van al nodo dueño de la
  /// posición y `SubProcessFinished` al nodo del proceso padre.
  pub fn target(&self) -> &NodeName {
    match self {
      ProcessingMessage::Workflow(m) => m.target(),
      ProcessingMessage::Log(m) => m.process_task_list_position().node_name(),
      ProcessingMessage::StartSubProcess(m) => m.target(),
      ProcessingMessage::SubProcessFinished(m) => m.target(),
    }
  }

  /// Posición con la que el proceso receptor correlaciona el mensaje.
  pub fn process_task_list_position(&self) -> Option<&TaskListPosition> {
    match self {
      ProcessingMessage::Workflow(m) => m.process_task_list_position(),
      ProcessingMessage::Log(m) => Some(m.process_task_list_position()),
      ProcessingMessage::StartSubProcess(m) => Some(m.parent_task_list_position()),
      ProcessingMessage::SubProcessFinished(m) => Some(m.parent_task_list_position()),
    }
  }

  pub fn to_service_bus_message(&self) -> Result<ServiceBusMessage> {
    match self {
      ProcessingMessage::Workflow(m) => m.to_service_bus_message(),
      ProcessingMessage::Log(m) => Ok(m.to_service_bus_message()),
      ProcessingMessage::StartSubProcess(m) => m.to_service_bus_message(),
      ProcessingMessage::SubProcessFinished(m) => m.to_service_bus_message(),
    }
  }

  pub fn from_service_bus_message(message: &ServiceBusMessage) -> Result<Self> {
    Ok(match message.name.as_str() {
         LOG_MESSAGE_NAME => ProcessingMessage::Log(LogMessage::from_service_bus_message(message)?),
         START_SUB_PROCESS => ProcessingMessage::StartSubProcess(StartSubProcess::from_service_bus_message(message)?),
         SUB_PROCESS_FINISHED => {
           ProcessingMessage::SubProcessFinished(SubProcessFinished::from_service_bus_message(message)?)
         }
         _ => ProcessingMessage::Workflow(WorkflowMessage::from_service_bus_message(message)?),
       })
  }
}

impl From<WorkflowMessage> for ProcessingMessage {
  fn from(value: WorkflowMessage) -> Self {
    ProcessingMessage::Workflow(value)
  }
}

impl From<LogMessage> for ProcessingMessage {
  fn from(value: LogMessage) -> Self {
    ProcessingMessage::Log(value)
  }
}

impl From<StartSubProcess> for ProcessingMessage {
  fn from(value: StartSubProcess) -> Self {
    ProcessingMessage::StartSubProcess(value)
  }
}

impl From<SubProcessFinished> for ProcessingMessage {
  fn from(value: SubProcessFinished) -> Self {
    ProcessingMessage::SubProcessFinished(value)
  }
}

impl TryFrom<&ServiceBusMessage> for ProcessingMessage {
  type Error = crate::errors::ProcessingError;

  fn try_from(value: &ServiceBusMessage) -> Result<Self> {
    Self::from_service_bus_message(value)
  }
}
