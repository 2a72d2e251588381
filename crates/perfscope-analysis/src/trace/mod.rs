//! Trace assembly: capture-session discovery, wire parsing and de-hashing.

pub mod assembler;
pub mod metadata;
pub mod session;
pub mod wire;

pub use assembler::{AssembledTrace, SessionTrace, SkippedSession, TraceAssembler};
pub use metadata::SessionMetadata;
pub use session::{discover_sessions, CaptureSession};
