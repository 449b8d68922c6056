// Domain layer: table/issue models and ports (interfaces).

pub mod model;
pub mod ports;
