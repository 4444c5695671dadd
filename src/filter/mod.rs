pub mod distance;
pub mod edges;

pub use distance::{DistanceFilter, IncludedPersons};
pub use edges::EdgeFilter;
