pub mod bus;
pub mod workflow_engine;

pub use bus::{CommandBus, EventBus, MessageHandler};
pub use workflow_engine::{Dispatchable, RegistryWorkflowEngine, WorkflowEngine};
