pub mod cli;
pub mod detect;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod parsers;
pub mod render;
pub mod report;
