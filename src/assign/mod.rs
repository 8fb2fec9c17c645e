//! Trail (assignment stack + BCP) and variable-activity branching.
pub mod heap;
pub mod trail;

pub use heap::VarActivityHeap;
pub use trail::{Conflict, Trail};
