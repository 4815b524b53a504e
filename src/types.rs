/// Type of the number of points in the instance.
pub type PointCount = usize;
/// Type of the number of groups (colors / attributes).
pub type GroupCount = usize;
/// Type of a per-group lower bound on the number of centers.
pub type Requirement = usize;
/// Type of a duration measured in seconds.
pub type DurationInSec = f64;

pub type PointIdx = usize;
pub type GroupIdx = usize;
pub type SubsetIdx = usize;
pub type Distance = f64;
pub type Cost = f64;
