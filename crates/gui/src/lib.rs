// Library crate: the headless exercise engine, exposed for integration tests
// and the JSON command protocol. GUI-specific modules (app, ui, viewport
// painting, image loading) remain in the binary crate.

pub mod command;
pub mod diagnostics;
pub mod error;
pub mod fixtures;
pub mod geometry;
pub mod harness;
pub mod model;
pub mod placement;
pub mod session;
pub mod state;
pub mod surface;
pub mod sync;
pub mod validation;

pub use error::{EngineError, Result};
pub use session::{ExerciseSession, SessionConfig};
