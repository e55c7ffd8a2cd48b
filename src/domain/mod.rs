// Domain layer: questionnaire data and the ports to the outside world.

pub mod model;
pub mod ports;
