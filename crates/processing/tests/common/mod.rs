#![allow(dead_code)]
use processing::{Dispatchable, NodeName, ProcessingMessage, Result, WorkflowEngine};
use processing_types::{TypeStubs, TypedValue};
use serde_json::json;
use std::sync::Mutex;

/// Motor que solo registra lo despachado.
#[derive(Default)]
pub struct RecordingEngine {
  sent: Mutex<Vec<ProcessingMessage>>,
}

impl RecordingEngine {
  pub fn take(&self) -> Vec<ProcessingMessage> {
    std::mem::take(&mut *self.sent.lock().unwrap())
  }
}

impl WorkflowEngine for RecordingEngine {
  fn dispatch(&self, message: Dispatchable) -> Result<()> {
    let message = match message {
      Dispatchable::Message(m) => m,
      Dispatchable::ServiceBus(envelope) => ProcessingMessage::from_service_bus_message(&envelope)?,
    };
    self.sent.lock().unwrap().push(message);
    Ok(())
  }
}

pub fn node(name: &str) -> NodeName {
  NodeName::new(name).unwrap()
}

pub fn user_value() -> TypedValue {
  TypedValue::from_native_value(&TypeStubs::user_prototype(),
                                json!({"id": 1, "name": "Alex",
                                       "address": {"street": "Main Street", "streetNumber": 10,
                                                   "zip": "12345", "city": "Test City"}}))
    .unwrap()
}
