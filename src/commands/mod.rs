//! Enveloped operations exposed to the application shell.

pub mod backup;
pub mod response;
pub mod screenshots;
pub mod settings;
pub mod stats;
pub mod theses;
pub mod trades;

pub use backup::*;
pub use response::ApiResponse;
pub use screenshots::*;
pub use settings::*;
pub use stats::*;
pub use theses::*;
pub use trades::*;
