//! Controller layer: tabs, status areas, error modeling and intent orchestration.

pub mod events;
pub mod orchestration;
