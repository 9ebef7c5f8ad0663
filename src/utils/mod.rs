pub mod progress;
pub mod scan;
