pub mod path;
pub mod resolver;
pub mod types;

pub use path::{FieldPath, Segment};
pub use resolver::{Interpolator, value_to_string};
pub use types::ValueStore;
