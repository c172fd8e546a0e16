pub mod queue;
pub mod workflow_processor;

pub use queue::MessageQueue;
pub use workflow_processor::WorkflowProcessor;
