pub mod events;
pub mod lifecycle;
pub mod model;
pub mod stats;
