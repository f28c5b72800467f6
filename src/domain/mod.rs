// Domain types and value objects
pub mod instrument;
pub mod window;

// Re-export commonly used types
pub use instrument::{TrackedInstrument, active_names};
pub use window::{ClosePolicy, WindowDescriptor, WindowId, WindowWidth};
