pub mod assemble;
pub mod browser;
pub mod cli;
pub mod config;
pub mod dates;
pub mod dom;
pub mod filter;
pub mod harvest;
pub mod jsonld;
pub mod logging;
pub mod manager;
pub mod metadata;

pub use browser::{PageDriver, SessionLauncher};
pub use config::ScrapeConfig;
pub use manager::ScraperManager;

pub use cli::{handle_command, ScraperArgs};

pub mod prelude {
    pub use super::browser::{PageDriver, SessionLauncher};
    pub use super::manager::ScraperManager;
    pub use warta_core::{Candidate, DateRange, Error, Metadata, Result, ScrapeResult};
}
