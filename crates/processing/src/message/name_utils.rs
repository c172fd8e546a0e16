//! Nombres de mensajes.
//!
//! Un mensaje de workflow se llama `<tipo normalizado>-<sufijo>`, donde el
//! tipo se pasa a minúsculas y pierde todo carácter no alfanumérico
//! (`TargetUser` => `targetuser-collect-data`).

use serde::{Deserialize, Serialize};

pub const LOG_MESSAGE_NAME: &str = "processing-log-message";
pub const START_SUB_PROCESS: &str = "start-sub-process";
pub const SUB_PROCESS_FINISHED: &str = "sub-process-finished";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
  CollectData,
  DataCollected,
  ProcessData,
  DataProcessed,
}

impl MessageType {
  pub fn suffix(&self) -> &'static str {
    match self {
      MessageType::CollectData => "collect-data",
      MessageType::DataCollected => "data-collected",
      MessageType::ProcessData => "process-data",
      MessageType::DataProcessed => "data-processed",
    }
  }

  pub fn is_command(&self) -> bool {
    matches!(self, MessageType::CollectData | MessageType::ProcessData)
  }

  /// Detecta el tipo por el sufijo de un nombre de mensaje.
  pub fn from_message_name(name: &str) -> Option<Self> {
    [MessageType::CollectData, MessageType::DataCollected, MessageType::ProcessData, MessageType::DataProcessed]
      .into_iter()
      .find(|t| name.len() > t.suffix().len() && name.ends_with(&format!("-{}", t.suffix())))
  }
}

pub fn normalize_kind(kind: &str) -> String {
  kind.chars().filter(|c| c.is_alphanumeric()).flat_map(|c| c.to_lowercase()).collect()
}

pub fn message_name_for(kind: &str, message_type: MessageType) -> String {
  format!("{}-{}", normalize_kind(kind), message_type.suffix())
}

pub fn is_workflow_message(name: &str) -> bool {
  MessageType::from_message_name(name).is_some()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kind_is_lowercased_and_stripped() {
    assert_eq!(message_name_for("TargetUser", MessageType::CollectData), "targetuser-collect-data");
    assert_eq!(message_name_for("Order-Item_2", MessageType::DataProcessed), "orderitem2-data-processed");
  }

  #[test]
  fn message_type_is_detected_from_suffix() {
    assert_eq!(MessageType::from_message_name("user-data-collected"), Some(MessageType::DataCollected));
    assert_eq!(MessageType::from_message_name("user-process-data"), Some(MessageType::ProcessData));
    assert_eq!(MessageType::from_message_name("collect-data"), None);
    assert!(!is_workflow_message(LOG_MESSAGE_NAME));
  }
}
