use crate::core::{CardDefinition, FacingDirection, Storage};
use crate::utils::error::{Result, TarotError};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// 依 index 升冪排序、不可變的卡片集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardCatalog {
    cards: Vec<CardDefinition>,
}

impl CardCatalog {
    /// 由已驗證的卡片建立集合，並依 index 排序
    pub fn new(mut cards: Vec<CardDefinition>) -> Self {
        cards.sort_by_key(|c| c.index);
        Self { cards }
    }

    pub fn cards(&self) -> &[CardDefinition] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<&CardDefinition> {
        self.cards
            .binary_search_by_key(&index, |c| c.index)
            .ok()
            .map(|pos| &self.cards[pos])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CardDefinition> {
        self.cards.iter()
    }
}

/// 載入結果：卡片集合、被略過的筆數與診斷訊息
#[derive(Debug, Clone, Default)]
pub struct CatalogLoad {
    pub catalog: CardCatalog,
    pub skipped: usize,
    pub diagnostic: Option<String>,
}

impl CatalogLoad {
    fn failed(diagnostic: String) -> Self {
        tracing::error!("{}", diagnostic);
        Self {
            catalog: CardCatalog::default(),
            skipped: 0,
            diagnostic: Some(diagnostic),
        }
    }

    /// 沒有任何可用卡片時回傳 `DataUnavailable`
    pub fn require_cards(&self) -> Result<&CardCatalog> {
        if self.catalog.is_empty() {
            return Err(TarotError::data_unavailable(
                self.diagnostic
                    .clone()
                    .unwrap_or_else(|| "card catalog is empty".to_string()),
            ));
        }
        Ok(&self.catalog)
    }
}

/// 從 JSON 文字解析卡片定義；格式錯誤的元素會被略過並計數
pub fn parse_catalog(source_name: &str, content: &str) -> CatalogLoad {
    let data: Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => return CatalogLoad::failed(format!("Failed to parse {}: {}", source_name, e)),
    };

    let Value::Array(items) = data else {
        return CatalogLoad::failed(format!("The root of {} must be an array", source_name));
    };

    let mut cards = Vec::with_capacity(items.len());
    let mut seen = HashSet::new();
    let mut skipped = 0;

    for (position, item) in items.iter().enumerate() {
        match normalize_record(position, item) {
            Ok(card) if seen.insert(card.index) => cards.push(card),
            Ok(card) => {
                tracing::debug!("Duplicate card index {} at element {}", card.index, position);
                skipped += 1;
            }
            Err(e) => {
                tracing::debug!("{}", e);
                skipped += 1;
            }
        }
    }

    let diagnostic = if skipped > 0 {
        let msg = format!(
            "Skipped {} malformed element(s) in {}",
            skipped, source_name
        );
        tracing::warn!("{}", msg);
        Some(msg)
    } else {
        None
    };

    CatalogLoad {
        catalog: CardCatalog::new(cards),
        skipped,
        diagnostic,
    }
}

/// 透過 Storage 讀取卡片檔；檔案不存在時回傳空集合與診斷，而非錯誤
pub async fn load_catalog<S: Storage>(storage: &S, path: &str) -> CatalogLoad {
    match storage.read_file(path).await {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(content) => parse_catalog(path, &content),
            Err(e) => CatalogLoad::failed(format!("{} is not valid UTF-8: {}", path, e)),
        },
        Err(TarotError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            CatalogLoad::failed(format!("{} was not found", path))
        }
        Err(e) => CatalogLoad::failed(format!("Failed to read {}: {}", path, e)),
    }
}

fn normalize_record(position: usize, raw: &Value) -> Result<CardDefinition> {
    let malformed = |reason: String| TarotError::MalformedRecord { position, reason };

    // 元素可以是物件，或是包著物件的 JSON 字串
    let decoded;
    let obj: &Map<String, Value> = match raw {
        Value::Object(obj) => obj,
        Value::String(s) => {
            decoded = serde_json::from_str::<Value>(s)
                .map_err(|e| malformed(format!("embedded JSON is invalid: {}", e)))?;
            decoded
                .as_object()
                .ok_or_else(|| malformed("embedded JSON is not an object".to_string()))?
        }
        other => return Err(malformed(format!("unexpected element type: {}", other))),
    };

    let index = coerce_index(obj.get("index")).map_err(malformed)?;
    let text = |key: &str| coerce_text(key, obj.get(key)).map_err(malformed);

    Ok(CardDefinition {
        index,
        image_id: CardDefinition::image_id_for(index),
        display_name: text("name")?,
        localized_name: text("japanese_name")?,
        facing: FacingDirection::parse(&text("looking")?),
        symbol_text: text("symbol")?,
        upright_meaning: text("upright")?,
        reversed_meaning: text("reversed")?,
    })
}

fn coerce_index(value: Option<&Value>) -> std::result::Result<u32, String> {
    let parsed: Option<i64> = match value {
        None | Some(Value::Null) => Some(0),
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };

    match parsed {
        Some(i) if i >= 0 && i <= u32::MAX as i64 => Ok(i as u32),
        Some(i) => Err(format!("index {} is out of range", i)),
        None => Err(format!("index {:?} is not an integer", value)),
    }
}

fn coerce_text(key: &str, value: Option<&Value>) -> std::result::Result<String, String> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(format!("field '{}' has unsupported value {}", key, other)),
    }
}

/// 以路徑為鍵的快取：同一來源只讀取一次，之後回傳同一個 Arc
#[derive(Debug, Default)]
pub struct CatalogCache {
    entries: HashMap<String, Arc<CatalogLoad>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load<S: Storage>(&mut self, storage: &S, path: &str) -> Arc<CatalogLoad> {
        if let Some(hit) = self.entries.get(path) {
            tracing::debug!("Catalog cache hit for {}", path);
            return Arc::clone(hit);
        }

        let loaded = Arc::new(load_catalog(storage, path).await);
        tracing::info!(
            "Loaded {} card(s) from {} ({} skipped)",
            loaded.catalog.len(),
            path,
            loaded.skipped
        );
        self.entries.insert(path.to_string(), Arc::clone(&loaded));
        loaded
    }

    /// 清除所有快取；下次載入會重新讀取 Storage
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStorage {
        content: Option<String>,
        reads: AtomicUsize,
    }

    impl Storage for CountingStorage {
        async fn read_file(&self, _path: &str) -> Result<Vec<u8>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            match &self.content {
                Some(c) => Ok(c.clone().into_bytes()),
                None => Err(TarotError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "missing",
                ))),
            }
        }

        async fn write_file(&self, _path: &str, _data: &[u8]) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_normalizes_and_sorts_records() {
        let json = r#"[
            {"index": 2, "name": "The High Priestess", "looking": "LEFT", "symbol": "veil"},
            {"index": "1", "name": "The Magician", "japanese_name": "魔術師"},
            {"index": 0.0, "name": "The Fool", "img_id": "99", "looking": "right"}
        ]"#;

        let load = parse_catalog("cards.json", json);
        assert_eq!(load.skipped, 0);
        assert!(load.diagnostic.is_none());

        let indices: Vec<u32> = load.catalog.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);

        let fool = load.catalog.get(0).unwrap();
        assert_eq!(fool.image_id, "00");
        assert_eq!(fool.facing, FacingDirection::Right);

        let magician = load.catalog.get(1).unwrap();
        assert_eq!(magician.localized_name, "魔術師");
        assert_eq!(magician.facing, FacingDirection::Unspecified);
        assert_eq!(magician.symbol_text, "");

        assert_eq!(load.catalog.get(2).unwrap().facing, FacingDirection::Left);
    }

    #[test]
    fn test_skips_malformed_records_and_counts_them() {
        let json = r#"[
            {"index": 0, "name": "The Fool"},
            42,
            {"index": "abc", "name": "Broken"},
            {"index": -3, "name": "Negative"},
            "{\"index\": 5, \"name\": \"Encoded\"}",
            "not json",
            {"index": 0, "name": "Duplicate Fool"},
            {"index": 6, "name": ["array"]}
        ]"#;

        let load = parse_catalog("cards.json", json);
        assert_eq!(load.catalog.len(), 2);
        assert_eq!(load.skipped, 6);
        assert!(load.diagnostic.as_deref().unwrap().contains('6'));
        assert_eq!(load.catalog.get(0).unwrap().display_name, "The Fool");
        assert_eq!(load.catalog.get(5).unwrap().display_name, "Encoded");
    }

    #[test]
    fn test_missing_index_defaults_to_zero() {
        let load = parse_catalog("cards.json", r#"[{"name": "Nameless"}]"#);
        assert_eq!(load.catalog.cards()[0].index, 0);
        assert_eq!(load.catalog.cards()[0].image_id, "00");
    }

    #[test]
    fn test_non_list_root_yields_empty_catalog() {
        let load = parse_catalog("cards.json", r#"{"index": 0}"#);
        assert!(load.catalog.is_empty());
        assert!(load.diagnostic.is_some());
        assert!(matches!(
            load.require_cards(),
            Err(TarotError::DataUnavailable { .. })
        ));

        let load = parse_catalog("cards.json", "{ not json");
        assert!(load.catalog.is_empty());
        assert!(load.diagnostic.is_some());
    }

    #[tokio::test]
    async fn test_missing_source_is_not_fatal() {
        let storage = CountingStorage {
            content: None,
            reads: AtomicUsize::new(0),
        };
        let load = load_catalog(&storage, "data/tarot_cards.json").await;
        assert!(load.catalog.is_empty());
        assert!(load.diagnostic.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_cache_reads_storage_once() {
        let storage = CountingStorage {
            content: Some(r#"[{"index": 0, "name": "The Fool"}]"#.to_string()),
            reads: AtomicUsize::new(0),
        };
        let mut cache = CatalogCache::new();

        let first = cache.load(&storage, "cards.json").await;
        let second = cache.load(&storage, "cards.json").await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(storage.reads.load(Ordering::SeqCst), 1);

        cache.clear();
        let third = cache.load(&storage, "cards.json").await;
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(storage.reads.load(Ordering::SeqCst), 2);
    }
}
