use serde::{Deserialize, Serialize};
use std::fmt;

/// 凱爾特十字發出的張數（不含象徵卡）
pub const SPREAD_SIZE: usize = 10;

/// 卡片人物的視線方向，只用於決定象徵卡的左右鏡像配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FacingDirection {
    Right,
    Left,
    #[default]
    Unspecified,
}

impl FacingDirection {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "right" => Self::Right,
            "left" => Self::Left,
            _ => Self::Unspecified,
        }
    }
}

/// 卡片定義（載入後不可變）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub index: u32,
    pub image_id: String,
    pub display_name: String,
    pub localized_name: String,
    pub facing: FacingDirection,
    pub symbol_text: String,
    pub upright_meaning: String,
    pub reversed_meaning: String,
}

impl CardDefinition {
    /// 由 index 推導的圖檔鍵，不從輸入讀取
    pub fn image_id_for(index: u32) -> String {
        format!("{:02}", index)
    }

    pub fn meaning_for(&self, orientation: Orientation) -> &str {
        match orientation {
            Orientation::Upright => &self.upright_meaning,
            Orientation::Reversed => &self.reversed_meaning,
            Orientation::NotApplicable => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Upright,
    Reversed,
    /// 象徵卡沒有正逆位置
    NotApplicable,
}

impl Orientation {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Upright => "upright",
            Self::Reversed => "reversed",
            Self::NotApplicable => "N/A (Significator)",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// 單次占卜中放在某個位置的卡片
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DealtCard<'a> {
    pub position: usize,
    pub card: &'a CardDefinition,
    pub orientation: Orientation,
}

impl<'a> DealtCard<'a> {
    pub fn significator(card: &'a CardDefinition) -> Self {
        Self {
            position: 0,
            card,
            orientation: Orientation::NotApplicable,
        }
    }

    pub fn is_significator(&self) -> bool {
        self.position == 0
    }

    /// 依正逆位置取得意義；象徵卡為空字串
    pub fn meaning(&self) -> &'a str {
        self.card.meaning_for(self.orientation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Sex {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBracket {
    Under40,
    Over40,
}

impl AgeBracket {
    pub fn from_over_40(over_40: bool) -> Self {
        if over_40 {
            Self::Over40
        } else {
            Self::Under40
        }
    }

    pub fn is_over_40(&self) -> bool {
        matches!(self, Self::Over40)
    }
}

/// 提問者的屬性與問題
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Questioner {
    pub sex: Sex,
    pub age: AgeBracket,
    pub self_directed: bool,
    pub query: String,
}

/// 一次完整的占卜：象徵卡加上 10 張展開的卡片
#[derive(Debug, Clone, Serialize)]
pub struct Reading<'a> {
    pub questioner: Questioner,
    pub translated_query: String,
    pub significator: DealtCard<'a>,
    pub spread: Vec<DealtCard<'a>>,
}

impl<'a> Reading<'a> {
    /// 象徵卡在前，接著依發牌順序的第 1..=10 張
    pub fn all_cards(&self) -> Vec<DealtCard<'a>> {
        std::iter::once(self.significator)
            .chain(self.spread.iter().copied())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// 傳給 chat-completion 後端的一則訊息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}
