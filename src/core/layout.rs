use crate::core::{
    CardDefinition, DealtCard, FacingDirection, Orientation, RandomSource, SPREAD_SIZE,
};
use crate::utils::error::{Result, TarotError};
use serde::Serialize;
use std::collections::HashSet;

/// Slot "What is Behind".
pub const BEHIND_SLOT: usize = 5;
/// Slot "What is Before".
pub const BEFORE_SLOT: usize = 6;

pub const POSITION_LABELS_EN: [&str; SPREAD_SIZE + 1] = [
    "The Significator - Represents the Querant or The Issue",
    "Position 1 - What Covers",
    "Position 2 – What Crosses",
    "Position 3 – What Crowns",
    "Position 4 - What is Beneath",
    "Position 5 – What is Behind",
    "Position 6 – What is Before",
    "Position 7 - Himself",
    "Position 8 – His House",
    "Position 9 – Hopes and Fears",
    "Position 10 - What Will Come",
];

pub const POSITION_LABELS_JA: [&str; SPREAD_SIZE + 1] = [
    "象徴カード",
    "1枚目 現状",
    "2枚目 試練",
    "3枚目 目標",
    "4枚目 原因",
    "5枚目 過去",
    "6枚目 未来",
    "7枚目 本音",
    "8枚目 周囲",
    "9枚目 予感",
    "10枚目 結果",
];

pub fn position_label_en(position: usize) -> String {
    POSITION_LABELS_EN
        .get(position)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("{}th", position))
}

pub fn position_label_ja(position: usize) -> String {
    POSITION_LABELS_JA
        .get(position)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("{}枚目", position))
}

/// Mirrored board side. "What is Before" goes where the significator looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutSide {
    Right,
    Left,
}

impl LayoutSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Right => "right",
            Self::Left => "left",
        }
    }
}

/// Picks the mirrored layout from the significator's facing direction.
/// Unspecified direction costs exactly one coin flip, shared by both slots.
pub fn layout_side(facing: FacingDirection, rng: &mut dyn RandomSource) -> LayoutSide {
    match facing {
        FacingDirection::Right => LayoutSide::Right,
        FacingDirection::Left => LayoutSide::Left,
        FacingDirection::Unspecified => {
            if rng.next_bool() {
                LayoutSide::Right
            } else {
                LayoutSide::Left
            }
        }
    }
}

/// Placement of one slot, in percent of the board container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlotGeometry {
    pub top_pct: f32,
    pub left_pct: f32,
    /// Fixed rotation of the slot itself (the crossing card lies sideways).
    pub base_rotation_deg: i16,
}

const fn slot(top_pct: f32, left_pct: f32) -> SlotGeometry {
    SlotGeometry {
        top_pct,
        left_pct,
        base_rotation_deg: 0,
    }
}

const BOARD: [SlotGeometry; SPREAD_SIZE + 1] = [
    slot(41.0, 33.0),
    slot(40.0, 34.0),
    SlotGeometry {
        top_pct: 41.0,
        left_pct: 33.5,
        base_rotation_deg: -90,
    },
    slot(4.0, 33.0),
    slot(76.0, 33.0),
    // 5 與 6 依 LayoutSide 左右互換
    slot(41.0, 4.0),
    slot(41.0, 61.0),
    slot(76.0, 86.0),
    slot(52.0, 86.0),
    slot(28.0, 86.0),
    slot(4.0, 86.0),
];

/// Geometry of all eleven slots for the given side.
pub fn layout(side: LayoutSide) -> [SlotGeometry; SPREAD_SIZE + 1] {
    let mut geometry = BOARD;
    if side == LayoutSide::Left {
        geometry.swap(BEHIND_SLOT, BEFORE_SLOT);
    }
    geometry
}

/// Visual rotation of a card image: reversed spread cards turn 180°, the
/// significator never does.
pub fn card_rotation(dealt: &DealtCard<'_>) -> u16 {
    if !dealt.is_significator() && dealt.orientation == Orientation::Reversed {
        180
    } else {
        0
    }
}

/// Significator at position 0 followed by the spread in dealt order.
///
/// Broken bookkeeping (wrong size, positions out of sequence, a card used
/// twice) is reported as a contract violation.
pub fn assign_positions<'a>(
    significator: &'a CardDefinition,
    spread: &[DealtCard<'a>],
) -> Result<Vec<DealtCard<'a>>> {
    if spread.len() != SPREAD_SIZE {
        return Err(TarotError::contract(format!(
            "spread has {} cards, expected {}",
            spread.len(),
            SPREAD_SIZE
        )));
    }

    let mut seen = HashSet::from([significator.index]);
    let mut cards = Vec::with_capacity(SPREAD_SIZE + 1);
    cards.push(DealtCard::significator(significator));

    for (i, dealt) in spread.iter().enumerate() {
        if dealt.position != i + 1 {
            return Err(TarotError::contract(format!(
                "card '{}' is at position {}, expected {}",
                dealt.card.display_name,
                dealt.position,
                i + 1
            )));
        }
        if dealt.orientation == Orientation::NotApplicable {
            return Err(TarotError::contract(format!(
                "spread card at position {} has no orientation",
                dealt.position
            )));
        }
        if !seen.insert(dealt.card.index) {
            return Err(TarotError::contract(format!(
                "card index {} appears twice in one reading",
                dealt.card.index
            )));
        }
        cards.push(*dealt);
    }

    Ok(cards)
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacedCard<'a> {
    pub dealt: DealtCard<'a>,
    pub geometry: SlotGeometry,
    pub rotation_deg: u16,
}

/// The complete Celtic Cross board.
#[derive(Debug, Clone, Serialize)]
pub struct CelticCross<'a> {
    pub side: LayoutSide,
    pub slots: Vec<PlacedCard<'a>>,
}

impl<'a> CelticCross<'a> {
    pub fn new(side: LayoutSide, cards: &[DealtCard<'a>]) -> Self {
        let geometry = layout(side);
        let slots = cards
            .iter()
            .map(|dealt| PlacedCard {
                dealt: *dealt,
                geometry: geometry[dealt.position.min(SPREAD_SIZE)],
                rotation_deg: card_rotation(dealt),
            })
            .collect();
        Self { side, slots }
    }
}
