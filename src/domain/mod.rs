// Domain layer: request/response models and the ports the front-ends talk to.

pub mod model;
pub mod ports;
