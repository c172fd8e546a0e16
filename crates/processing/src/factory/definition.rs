//! Vocabulario de las definiciones de proceso en JSON.
//!
//! ```json
//! {
//!   "process_type": "linear_messaging",
//!   "tasks": [
//!     {"task_type": "collect_data", "source": "crm", "processing_type": "User"},
//!     {"task_type": "process_data", "target": "erp", "allowed_types": ["User"]}
//!   ],
//!   "config": {"stop_on_error": true}
//! }
//! ```

use crate::errors::{ProcessingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const PROCESS_TYPE: &str = "process_type";
pub const TASKS: &str = "tasks";
pub const CONFIG: &str = "config";
pub const TASK_TYPE: &str = "task_type";

pub const TASK_COLLECT_DATA: &str = "collect_data";
pub const TASK_PROCESS_DATA: &str = "process_data";
pub const TASK_RUN_SUB_PROCESS: &str = "run_sub_process";
pub const TASK_MANIPULATE_PAYLOAD: &str = "manipulate_payload";

pub const SOURCE: &str = "source";
pub const TARGET: &str = "target";
pub const PROCESSING_TYPE: &str = "processing_type";
pub const ALLOWED_TYPES: &str = "allowed_types";
pub const PREFERRED_TYPE: &str = "preferred_type";
pub const METADATA: &str = "metadata";
pub const PROCESS_DEFINITION: &str = "process_definition";
pub const TARGET_NODE_NAME: &str = "target_node_name";
pub const SYNC_LOG_MESSAGES: &str = "sync_log_messages";
pub const MANIPULATION: &str = "manipulation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessType {
  /// Ejecuta las tareas una tras otra, enviando mensajes.
  LinearMessaging,
}

impl ProcessType {
  pub fn as_str(&self) -> &'static str {
    match self {
      ProcessType::LinearMessaging => "linear_messaging",
    }
  }
}

impl fmt::Display for ProcessType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for ProcessType {
  type Err = ProcessingError;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "linear_messaging" => Ok(ProcessType::LinearMessaging),
      other => Err(ProcessingError::Definition(format!("tipo de proceso desconocido: {}", other))),
    }
  }
}
