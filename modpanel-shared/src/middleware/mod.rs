mod tracing_layer;

pub use tracing_layer::*;
