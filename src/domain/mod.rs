// Domain layer: wire/data models and the ports the planner talks through.

pub mod model;
pub mod ports;
