// Adapters layer: concrete implementations of the domain ports (LLM backend,
// card images, report output).

pub mod assets;
pub mod openai;
pub mod report;
