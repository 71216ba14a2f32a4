pub mod event;
pub mod prediction;
pub mod runtime;
