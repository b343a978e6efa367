//! MCP server discovery and tool enumeration behind a small read-only
//! registry interface.
//!
//! Stdio transports only; HTTP is intentionally out of scope to keep the
//! surface area small.

pub mod discovery;
pub mod enumerator;
pub mod stdio;
pub mod types;

pub use stdio::*;
pub use types::*;
