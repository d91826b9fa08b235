//! ImageMagick `convert` invocations: frame coalescing and the requested
//! transform.

mod coalesce;
mod transform;

pub use coalesce::coalesce;
pub use transform::transform;
