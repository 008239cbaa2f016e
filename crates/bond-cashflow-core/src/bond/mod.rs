pub mod analysis;
pub mod duration;
pub mod schedule;
pub mod sensitivity;
pub mod terms;
pub mod yields;
