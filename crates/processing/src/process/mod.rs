pub mod events;
#[allow(clippy::module_inception)]
pub mod process;
pub mod process_id;
pub mod repository;

pub use events::{apply, ProcessEvent, ProcessState, ProcessStatus};
pub use process::{PendingEvent, Process};
pub use process_id::ProcessId;
pub use repository::{ProcessRepository, PROCESS_STREAM_TYPE};
