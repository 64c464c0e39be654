pub mod config;
pub mod model;
pub mod pipeline;
pub mod postprocess;
pub mod preprocess;
