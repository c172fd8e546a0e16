pub mod definition;
pub mod process_factory;

pub use definition::ProcessType;
pub use process_factory::ProcessFactory;
