//! Event system: a handler trait with no-op defaults and a synchronous
//! dispatcher. Lets embedders observe skipped sessions, coverage gaps and
//! regressions without the engine knowing who is listening.

pub mod dispatcher;
pub mod handler;
pub mod types;

pub use dispatcher::EventDispatcher;
pub use handler::AnalysisEventHandler;
