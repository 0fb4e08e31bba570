mod assets;
pub mod config;
pub mod content;
pub mod git;
pub mod markdown;
pub mod parallel;
pub mod serve;
pub mod site;
pub mod watch;

pub use config::Config;
pub use site::{Context, SiteError};
