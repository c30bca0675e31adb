//! Startup and shutdown lifecycle.
//!
//! ```text
//! 1. Configuration snapshot
//!    ↓
//! 2. Loader runs init steps in order   ← fail-fast
//!    ↓  (each step: handle → CloserRegistry, option → builder)
//! 3. Dependency container built
//!    ↓
//! 4. Modules constructed
//!    ↓
//! [Running...]
//!    ↓
//! 5. Shutdown signal (SIGTERM/SIGINT)
//!    ↓
//! 6. CloserRegistry drained in reverse ← every close attempted
//! ```

mod closer;
mod error;
mod loader;
mod shutdown;

pub use closer::CloserRegistry;
pub use error::{ShutdownFailure, ShutdownReport};
pub use loader::{BootContext, InitStep, Loader, StepOutput};
pub use shutdown::{ShutdownHandler, shutdown_signal};
