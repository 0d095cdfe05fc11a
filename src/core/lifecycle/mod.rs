//! Invoice lifecycle rules: id allocation and status transitions

pub mod engine;
pub mod id_allocator;

pub use engine::{month_name, TransitionEngine};
pub use id_allocator::IdAllocator;
