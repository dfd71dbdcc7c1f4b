use crate::core::{Orientation, Storage};
use serde::Deserialize;
use std::collections::HashMap;

/// 正位置／逆位置的顯示標籤（tarot_meta.json 的 orient_label）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrientationLabels {
    pub upright: String,
    pub reversed: String,
}

impl Default for OrientationLabels {
    fn default() -> Self {
        Self {
            upright: "正位置(upright)".to_string(),
            reversed: "逆位置(reversed)".to_string(),
        }
    }
}

impl OrientationLabels {
    pub fn label(&self, orientation: Orientation) -> &str {
        match orientation {
            Orientation::Upright => &self.upright,
            Orientation::Reversed => &self.reversed,
            Orientation::NotApplicable => Orientation::NotApplicable.key(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct MetaFile {
    #[serde(default)]
    orient_label: HashMap<String, String>,
}

/// 解析 `tarot_meta.json`；缺少的標籤沿用預設值
pub fn parse_meta(content: &str) -> crate::utils::error::Result<OrientationLabels> {
    let meta: MetaFile = serde_json::from_str(content)?;
    let mut labels = OrientationLabels::default();
    if let Some(upright) = meta.orient_label.get("upright") {
        labels.upright = upright.clone();
    }
    if let Some(reversed) = meta.orient_label.get("reversed") {
        labels.reversed = reversed.clone();
    }
    Ok(labels)
}

pub async fn load_meta<S: Storage>(storage: &S, path: &str) -> OrientationLabels {
    let content = match storage.read_file(path).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::warn!("Could not read {} ({}), using default labels", path, e);
            return OrientationLabels::default();
        }
    };

    parse_meta(&content).unwrap_or_else(|e| {
        tracing::warn!("Could not parse {} ({}), using default labels", path, e);
        OrientationLabels::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meta_overrides_labels() {
        let labels = parse_meta(r#"{"orient_label": {"upright": "正", "reversed": "逆"}}"#).unwrap();
        assert_eq!(labels.label(Orientation::Upright), "正");
        assert_eq!(labels.label(Orientation::Reversed), "逆");
        assert_eq!(labels.label(Orientation::NotApplicable), "N/A (Significator)");
    }

    #[test]
    fn test_partial_meta_keeps_defaults() {
        let labels = parse_meta(r#"{"orient_label": {"upright": "Upright"}}"#).unwrap();
        assert_eq!(labels.upright, "Upright");
        assert_eq!(labels.reversed, "逆位置(reversed)");

        assert_eq!(parse_meta("{}").unwrap(), OrientationLabels::default());
        assert!(parse_meta("[1, 2]").is_err());
    }
}
