use crate::engine::bus::{CommandBus, EventBus};
use crate::errors::{ProcessingError, Result};
use crate::message::{LogMessage, ProcessingMessage, ServiceBusMessage, StartSubProcess, SubProcessFinished,
                     WorkflowMessage};
use crate::node::NodeName;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::debug;
use std::sync::Arc;

/// Lo que acepta `WorkflowEngine::dispatch`: un mensaje de dominio o su
/// envelope de transporte.
#[derive(Debug, Clone)]
pub enum Dispatchable {
  Message(ProcessingMessage),
  ServiceBus(ServiceBusMessage),
}

impl From<ProcessingMessage> for Dispatchable {
  fn from(value: ProcessingMessage) -> Self {
    Dispatchable::Message(value)
  }
}

impl From<ServiceBusMessage> for Dispatchable {
  fn from(value: ServiceBusMessage) -> Self {
    Dispatchable::ServiceBus(value)
  }
}

impl From<WorkflowMessage> for Dispatchable {
  fn from(value: WorkflowMessage) -> Self {
    Dispatchable::Message(value.into())
  }
}

impl From<LogMessage> for Dispatchable {
  fn from(value: LogMessage) -> Self {
    Dispatchable::Message(value.into())
  }
}

impl From<StartSubProcess> for Dispatchable {
  fn from(value: StartSubProcess) -> Self {
    Dispatchable::Message(value.into())
  }
}

impl From<SubProcessFinished> for Dispatchable {
  fn from(value: SubProcessFinished) -> Self {
    Dispatchable::Message(value.into())
  }
}

/// Punto de entrada para enviar mensajes. El `Process` solo conoce este
/// trait.
pub trait WorkflowEngine: Send + Sync {
  fn dispatch(&self, message: Dispatchable) -> Result<()>;
}

/// Motor que enruta por nodo destino usando buses registrados.
///
/// Cada nodo tiene a lo sumo un bus de comandos y uno de eventos. El
/// registro es atómico: si algún destino ya está ocupado no se registra
/// ninguno.
#[derive(Default)]
pub struct RegistryWorkflowEngine {
  command_buses: DashMap<NodeName, Arc<CommandBus>>,
  event_buses: DashMap<NodeName, Arc<EventBus>>,
}

impl RegistryWorkflowEngine {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register_command_bus(&self, bus: Arc<CommandBus>, targets: impl IntoIterator<Item = NodeName>) -> Result<()> {
    register(&self.command_buses, bus, targets, "comandos")
  }

  pub fn register_event_bus(&self, bus: Arc<EventBus>, targets: impl IntoIterator<Item = NodeName>) -> Result<()> {
    register(&self.event_buses, bus, targets, "eventos")
  }

  pub fn get_command_bus_for(&self, target: &NodeName) -> Result<Arc<CommandBus>> {
    self.command_buses
        .get(target)
        .map(|b| b.value().clone())
        .ok_or_else(|| ProcessingError::Routing(format!("no hay bus de comandos para {}", target)))
  }

  pub fn get_event_bus_for(&self, target: &NodeName) -> Result<Arc<EventBus>> {
    self.event_buses
        .get(target)
        .map(|b| b.value().clone())
        .ok_or_else(|| ProcessingError::Routing(format!("no hay bus de eventos para {}", target)))
  }
}

fn register<B>(buses: &DashMap<NodeName, Arc<B>>,
               bus: Arc<B>,
               targets: impl IntoIterator<Item = NodeName>,
               kind: &str)
               -> Result<()> {
  let mut inserted: Vec<NodeName> = Vec::new();
  for target in targets {
    let duplicate = match buses.entry(target.clone()) {
      Entry::Occupied(_) => true,
      Entry::Vacant(v) => {
        v.insert(bus.clone());
        false
      }
    };
    if duplicate {
      for t in &inserted {
        buses.remove(t);
      }
      return Err(ProcessingError::Routing(format!("ya existe un bus de {} para {}", kind, target)));
    }
    inserted.push(target);
  }
  Ok(())
}

impl WorkflowEngine for RegistryWorkflowEngine {
  fn dispatch(&self, message: Dispatchable) -> Result<()> {
    let message = match message {
      Dispatchable::Message(m) => m,
      Dispatchable::ServiceBus(envelope) => ProcessingMessage::from_service_bus_message(&envelope)?,
    };
    let target = message.target().clone();
    debug!("dispatch {} ({}) -> {}", message.message_name(), message.uuid(), target);
    if message.is_command() {
      self.get_command_bus_for(&target)?.dispatch(&message)
    } else {
      self.get_event_bus_for(&target)?.dispatch(&message)
    }
  }
}
