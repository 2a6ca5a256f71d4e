pub mod capabilities;
pub mod catalog;
pub mod config;
pub mod context;
pub mod daemon;
pub mod db;
pub mod discovery;
pub mod error;
pub mod hosting;
pub mod imaging;
pub mod instagram;
pub mod interfaces;
pub mod logging;
pub mod media_fsm;
pub mod pipeline;
pub mod providers;
pub mod runtime_paths;
pub mod scheduler;
pub mod store;

pub type Result<T> = std::result::Result<T, error::ReachPosterError>;

pub const GIT_SHA: &str = env!("REACH_POSTER_GIT_SHA");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
