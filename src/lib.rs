pub mod cli;
pub mod compliance;
pub mod config;
pub mod duration;
pub mod error;
pub mod export;
pub mod ingest;
pub mod normalize;
pub mod report;
pub mod schema;
pub mod sector;
pub mod session;
pub mod util;
