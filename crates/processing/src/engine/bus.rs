//! Buses en memoria.
//!
//! `CommandBus` entrega cada comando a exactamente un handler; `EventBus`
//! entrega cada evento a cero o más suscriptores. Ambos admiten handlers
//! por nombre de mensaje y handlers "catch-all" (útil para un
//! `WorkflowProcessor` que recibe cualquier mensaje de su nodo).

use crate::errors::{ProcessingError, Result};
use crate::message::ProcessingMessage;
use dashmap::DashMap;
use std::sync::{Arc, RwLock};

pub trait MessageHandler: Send + Sync {
  fn handle(&self, message: &ProcessingMessage) -> Result<()>;
}

impl<F> MessageHandler for F where F: Fn(&ProcessingMessage) -> Result<()> + Send + Sync
{
  fn handle(&self, message: &ProcessingMessage) -> Result<()> {
    self(message)
  }
}

type SharedHandler = Arc<dyn MessageHandler>;

fn read_all(lock: &RwLock<Vec<SharedHandler>>) -> Vec<SharedHandler> {
  lock.read().unwrap_or_else(|e| e.into_inner()).clone()
}

#[derive(Default)]
pub struct CommandBus {
  name: String,
  routes: DashMap<String, SharedHandler>,
  fallback: RwLock<Vec<SharedHandler>>,
}

impl CommandBus {
  pub fn new(name: &str) -> Self {
    Self { name: name.to_string(),
           ..Default::default() }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Registra el handler de un comando. Un comando solo tiene un handler.
  pub fn route(&self, message_name: &str, handler: SharedHandler) -> Result<()> {
    use dashmap::mapref::entry::Entry;
    match self.routes.entry(message_name.to_string()) {
      Entry::Occupied(_) => Err(ProcessingError::Routing(format!("{}: el comando {} ya tiene handler",
                                                                 self.name, message_name))),
      Entry::Vacant(v) => {
        v.insert(handler);
        Ok(())
      }
    }
  }

  /// Handler para los comandos sin ruta explícita.
  pub fn route_all(&self, handler: SharedHandler) -> Result<()> {
    let mut guard = self.fallback.write().unwrap_or_else(|e| e.into_inner());
    if !guard.is_empty() {
      return Err(ProcessingError::Routing(format!("{}: ya existe un handler por defecto", self.name)));
    }
    guard.push(handler);
    Ok(())
  }

  pub fn dispatch(&self, message: &ProcessingMessage) -> Result<()> {
    let name = message.message_name();
    // se clona el Arc para no retener el shard durante el handler
    let handler = match self.routes.get(&name).map(|h| h.value().clone()) {
      Some(h) => h,
      None => read_all(&self.fallback).into_iter().next().ok_or_else(|| {
                                                            ProcessingError::Routing(format!("{}: no hay handler para {}",
                                                                                             self.name, name))
                                                          })?,
    };
    handler.handle(message)
  }
}

#[derive(Default)]
pub struct EventBus {
  name: String,
  routes: DashMap<String, Vec<SharedHandler>>,
  catch_all: RwLock<Vec<SharedHandler>>,
}

impl EventBus {
  pub fn new(name: &str) -> Self {
    Self { name: name.to_string(),
           ..Default::default() }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn route(&self, message_name: &str, handler: SharedHandler) {
    self.routes.entry(message_name.to_string()).or_default().push(handler);
  }

  pub fn route_all(&self, handler: SharedHandler) {
    self.catch_all.write().unwrap_or_else(|e| e.into_inner()).push(handler);
  }

  /// Entrega el evento a todos los suscriptores. Sin suscriptores no es un
  /// error. El primer fallo de un handler corta la entrega.
  pub fn dispatch(&self, message: &ProcessingMessage) -> Result<()> {
    let name = message.message_name();
    let mut handlers = self.routes.get(&name).map(|h| h.value().clone()).unwrap_or_default();
    handlers.extend(read_all(&self.catch_all));
    for handler in handlers {
      handler.handle(message)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::message::LogMessage;
  use crate::node::NodeName;
  use crate::process::ProcessId;
  use crate::task::{TaskListId, TaskListPosition};
  use std::sync::atomic::{AtomicUsize, Ordering};

  fn log() -> ProcessingMessage {
    let pos = TaskListPosition::at(TaskListId::link_with(NodeName::default_name(), ProcessId::generate()), 1).unwrap();
    LogMessage::log_debug_msg("hola", &pos).into()
  }

  #[test]
  fn event_bus_without_subscribers_is_fine() {
    let bus = EventBus::new("events");
    assert!(bus.dispatch(&log()).is_ok());
  }

  #[test]
  fn event_bus_fans_out() {
    let bus = EventBus::new("events");
    let hits = Arc::new(AtomicUsize::new(0));
    for _ in 0..2 {
      let hits = hits.clone();
      bus.route("processing-log-message",
                Arc::new(move |_: &ProcessingMessage| -> Result<()> {
                  hits.fetch_add(1, Ordering::SeqCst);
                  Ok(())
                }));
    }
    bus.dispatch(&log()).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn command_bus_needs_exactly_one_handler() {
    let bus = CommandBus::new("commands");
    assert!(matches!(bus.dispatch(&log()), Err(ProcessingError::Routing(_))));
    bus.route("processing-log-message", Arc::new(|_: &ProcessingMessage| -> Result<()> { Ok(()) })).unwrap();
    assert!(bus.route("processing-log-message", Arc::new(|_: &ProcessingMessage| -> Result<()> { Ok(()) })).is_err());
    assert!(bus.dispatch(&log()).is_ok());
  }
}
