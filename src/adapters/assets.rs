use crate::core::ImageResolver;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// 1x1 透明 PNG，找不到卡片圖檔時使用
pub const PLACEHOLDER_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR4nGMAAQAABQABDQottgAAAABJRU5ErkJggg==";

/// 讀取 `<dir>/<image_id>.png` 並快取 base64 結果
#[derive(Debug)]
pub struct CardImages {
    dir: PathBuf,
    cache: Mutex<HashMap<String, String>>,
}

impl CardImages {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn encode(&self, image_id: &str) -> String {
        let path = self.dir.join(format!("{}.png", image_id));
        match std::fs::read(&path) {
            Ok(bytes) => STANDARD.encode(bytes),
            Err(e) => {
                tracing::debug!("Image {} unavailable ({}), using placeholder", path.display(), e);
                PLACEHOLDER_PNG_BASE64.to_string()
            }
        }
    }
}

impl ImageResolver for CardImages {
    fn resolve_image(&self, image_id: &str) -> String {
        let Ok(mut cache) = self.cache.lock() else {
            return self.encode(image_id);
        };
        cache
            .entry(image_id.to_string())
            .or_insert_with(|| self.encode(image_id))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_existing_image_is_base64_encoded() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("07.png"), b"png-bytes").unwrap();

        let images = CardImages::new(dir.path());
        assert_eq!(images.resolve_image("07"), STANDARD.encode(b"png-bytes"));
    }

    #[test]
    fn test_missing_image_uses_placeholder() {
        let dir = TempDir::new().unwrap();
        let images = CardImages::new(dir.path());
        assert_eq!(images.resolve_image("77"), PLACEHOLDER_PNG_BASE64);
    }
}
