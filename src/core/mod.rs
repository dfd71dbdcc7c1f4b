pub mod candidates;
pub mod catalog;
pub mod dealer;
pub mod layout;
pub mod narrative;
pub mod session;
pub mod similarity;

pub use crate::domain::model::{
    AgeBracket, CardDefinition, ChatMessage, ChatRole, DealtCard, FacingDirection, Orientation,
    Questioner, Reading, Sex, SPREAD_SIZE,
};
pub use crate::domain::ports::{
    BufferSink, ConfigProvider, ImageResolver, Narrator, RandomSource, SeededRandom, Storage,
    StreamSink, Translator,
};
pub use crate::utils::error::Result;
pub use catalog::{CardCatalog, CatalogCache, CatalogLoad};
