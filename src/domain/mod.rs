// Domain layer: data model and the traits the session talks to.

pub mod model;
pub mod ports;
