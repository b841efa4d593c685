// Domain layer: records, input shapes and ports. No I/O here.

pub mod model;
pub mod ports;
pub mod source;
