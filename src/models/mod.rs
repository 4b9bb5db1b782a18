pub mod backup;
pub mod screenshot;
pub mod settings;
pub mod thesis;
pub mod trade;
pub mod version;

pub use backup::*;
pub use screenshot::*;
pub use settings::*;
pub use thesis::*;
pub use trade::*;
pub use version::*;
