//! processing: motor de orquestación de procesos por mensajes
//!
//! Un `Process` recorre una `TaskList` emitiendo `WorkflowMessage`s a través
//! de un `WorkflowEngine`, que los entrega al bus de comandos o de eventos
//! registrado para el nodo destino. Las respuestas vuelven al proceso como
//! nuevas llamadas a `perform`, correlacionadas por `TaskListPosition`.
//!
//! Piezas principales:
//! - `message`: protocolo de mensajes versionados (`WorkflowMessage`,
//!   `LogMessage`, `StartSubProcess`, `SubProcessFinished`) y su envelope de
//!   transporte.
//! - `task`: tareas, lista de tareas y posiciones.
//! - `process`: el agregado `Process`, sus eventos y su repositorio.
//! - `factory`: construcción de procesos a partir de definiciones JSON.
//! - `engine`: buses y enrutamiento por nodo destino.
//! - `processor`: recepción de mensajes en un nodo.

pub mod config;
pub mod engine;
pub mod errors;
pub mod factory;
pub mod message;
pub mod node;
pub mod process;
pub mod processor;
pub mod task;

pub use config::{NodeConfig, ProcessConfig};
pub use engine::{CommandBus, Dispatchable, EventBus, MessageHandler, RegistryWorkflowEngine, WorkflowEngine};
pub use errors::{ProcessingError, Result};
pub use factory::{ProcessFactory, ProcessType};
pub use message::{LastMessage, LogLevel, LogMessage, MessageType, Payload, ProcessingMessage, ServiceBusMessage,
                  StartSubProcess, SubProcessFinished, WorkflowMessage};
pub use node::NodeName;
pub use process::{Process, ProcessEvent, ProcessId, ProcessRepository, ProcessStatus};
pub use processor::{MessageQueue, WorkflowProcessor};
pub use task::{Task, TaskList, TaskListEntry, TaskListId, TaskListPosition, TaskStatus};
