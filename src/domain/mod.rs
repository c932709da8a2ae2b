// Domain layer: the retail tables, result row types and the ports the
// pipeline is built against.

pub mod dataset;
pub mod model;
pub mod ports;
pub mod report;
