pub mod config;
pub mod emitter;
pub mod error;
pub mod materialize;
pub mod query;
pub mod result;
pub mod scheduler;
pub mod session;
pub mod terminal;
