pub mod error;
pub mod geometry;
pub mod frame;
pub mod project;
pub mod solve;
#[cfg(feature = "serde")]
pub mod scene;
#[cfg(feature = "serde")]
pub mod report;

pub use error::RectifyError;
