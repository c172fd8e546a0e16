pub mod log_message;
pub mod name_utils;
pub mod processing_message;
pub mod service_bus;
pub mod sub_process;
pub mod workflow_message;

pub use log_message::{LogLevel, LogMessage};
pub use name_utils::{message_name_for, normalize_kind, MessageType, LOG_MESSAGE_NAME, START_SUB_PROCESS,
                     SUB_PROCESS_FINISHED};
pub use processing_message::ProcessingMessage;
pub use service_bus::{HeaderType, MessageHeader, ServiceBusMessage};
pub use sub_process::{LastMessage, StartSubProcess, SubProcessFinished};
pub use workflow_message::{Payload, WorkflowMessage};
