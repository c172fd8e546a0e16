//! Envelope de transporte: `{name, header, payload}`.
//!
//! Es la forma con la que los mensajes cruzan límites de nodo. Los mensajes
//! de dominio se convierten desde y hacia este formato; el payload es un
//! mapa de valores nativos JSON.

use crate::errors::{ProcessingError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderType {
  Command,
  Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageHeader {
  pub uuid: Uuid,
  pub created_on: DateTime<Utc>,
  pub version: u32,
  #[serde(rename = "type")]
  pub message_type: HeaderType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceBusMessage {
  pub name: String,
  pub header: MessageHeader,
  pub payload: JsonMap<String, JsonValue>,
}

impl ServiceBusMessage {
  pub fn new(name: impl Into<String>, header: MessageHeader, payload: JsonMap<String, JsonValue>) -> Self {
    Self { name: name.into(),
           header,
           payload }
  }

  pub fn is_command(&self) -> bool {
    self.header.message_type == HeaderType::Command
  }

  pub fn to_json(&self) -> Result<JsonValue> {
    Ok(serde_json::to_value(self)?)
  }

  pub fn from_json(value: JsonValue) -> Result<Self> {
    Ok(serde_json::from_value(value)?)
  }

  pub(crate) fn field(&self, key: &str) -> Result<&JsonValue> {
    self.payload
        .get(key)
        .ok_or_else(|| ProcessingError::InvalidMessage(format!("{}: falta el campo '{}'", self.name, key)))
  }

  pub(crate) fn str_field(&self, key: &str) -> Result<&str> {
    self.field(key)?
        .as_str()
        .ok_or_else(|| ProcessingError::InvalidMessage(format!("{}: '{}' debe ser texto", self.name, key)))
  }

  /// Campo de texto opcional; `null` cuenta como ausente.
  pub(crate) fn opt_str_field(&self, key: &str) -> Result<Option<&str>> {
    match self.payload.get(key) {
      None | Some(JsonValue::Null) => Ok(None),
      Some(JsonValue::String(s)) => Ok(Some(s.as_str())),
      Some(_) => Err(ProcessingError::InvalidMessage(format!("{}: '{}' debe ser texto", self.name, key))),
    }
  }

  pub(crate) fn bool_field(&self, key: &str) -> Result<bool> {
    self.field(key)?
        .as_bool()
        .ok_or_else(|| ProcessingError::InvalidMessage(format!("{}: '{}' debe ser booleano", self.name, key)))
  }

  pub(crate) fn object_field(&self, key: &str) -> Result<JsonMap<String, JsonValue>> {
    match self.payload.get(key) {
      None | Some(JsonValue::Null) => Ok(JsonMap::new()),
      Some(JsonValue::Object(map)) => Ok(map.clone()),
      Some(_) => Err(ProcessingError::InvalidMessage(format!("{}: '{}' debe ser un objeto", self.name, key))),
    }
  }
}
