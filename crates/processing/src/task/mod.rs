pub mod manipulation;
pub mod position;
#[allow(clippy::module_inception)]
pub mod task;
pub mod task_list;

pub use manipulation::{ManipulationOp, PayloadManipulation};
pub use position::{TaskListId, TaskListPosition};
pub use task::{CollectData, ManipulatePayload, ProcessData, RunSubProcess, Task};
pub use task_list::{TaskList, TaskListEntry, TaskStatus};
