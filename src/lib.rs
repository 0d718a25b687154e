pub mod config;
pub mod filter;
pub mod ingest;
pub mod logging;
pub mod mapper;
pub mod menu;
pub mod player;
pub mod queries;
pub mod schema;
pub mod selection;
pub mod source;
pub mod store;
