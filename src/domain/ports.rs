use crate::domain::model::ChatMessage;
use crate::utils::error::Result;
use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Single source of randomness for significator fallback, dealing and
/// layout mirroring.
pub trait RandomSource {
    /// Uniform index in `0..upper`. Callers guarantee `upper > 0`.
    fn next_index(&mut self, upper: usize) -> usize;

    /// Fair coin flip.
    fn next_bool(&mut self) -> bool;
}

/// Default [`RandomSource`] backed by ChaCha8.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_index(&mut self, upper: usize) -> usize {
        self.rng.gen_range(0..upper)
    }

    fn next_bool(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }
}

/// Receives streamed narrative text as it arrives.
pub trait StreamSink: Send {
    fn begin(&mut self, _title: &str) {}
    fn chunk(&mut self, text: &str);
    fn end(&mut self) {}
}

/// Collects streamed chunks without rendering them.
#[derive(Debug, Default, Clone)]
pub struct BufferSink {
    pub titles: Vec<String>,
    pub text: String,
}

impl StreamSink for BufferSink {
    fn begin(&mut self, title: &str) {
        self.titles.push(title.to_string());
    }

    fn chunk(&mut self, text: &str) {
        self.text.push_str(text);
    }
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Best-effort translation of the questioner's query into the corpus language.
    async fn translate(&self, text: &str) -> Result<String>;
}

#[async_trait]
pub trait Narrator: Send + Sync {
    /// Streams a completion into `sink` and returns the full text once the
    /// stream is exhausted.
    async fn stream(&self, messages: &[ChatMessage], sink: &mut dyn StreamSink) -> Result<String>;
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Image lookup for rendering only; selection never needs image bytes.
pub trait ImageResolver: Send + Sync {
    /// Base64-encoded PNG for `image_id`, or a placeholder when missing.
    fn resolve_image(&self, image_id: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn cards_path(&self) -> &str;
    fn meta_path(&self) -> &str;
    fn images_dir(&self) -> &str;
    fn output_path(&self) -> &str;
}
