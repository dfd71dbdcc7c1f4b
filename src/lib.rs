pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{assets::CardImages, openai::OpenAiChatClient};
pub use config::{cli::LocalStorage, AppConfig};
#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use core::{
    catalog::{CardCatalog, CatalogCache},
    narrative::NarrativePipeline,
    session::{DrawnReading, ReadingSession},
};
pub use utils::error::{Result, TarotError};
