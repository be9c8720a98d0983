pub mod builder;
pub mod capture;
pub mod context;

pub use builder::{Exchange, Spec};
pub use capture::{Capture, CaptureSource};
pub use context::SpecContext;
