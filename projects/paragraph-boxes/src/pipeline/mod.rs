// Page pipeline: read, extract, save, and the batch pool around them

pub mod finalize;
pub mod orchestrator;
pub mod reader;
pub mod types;
