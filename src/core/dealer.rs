use crate::core::{CardCatalog, CardDefinition, DealtCard, Orientation, RandomSource, SPREAD_SIZE};
use crate::utils::error::{Result, TarotError};

/// Draws ten distinct cards from the catalog minus the significator, each
/// with an independent coin flip for orientation.
///
/// The exclusion is by card identity (index), never by name. Positions
/// 1..=10 follow the order the cards were drawn.
pub fn deal<'a>(
    catalog: &'a CardCatalog,
    exclude: &CardDefinition,
    rng: &mut dyn RandomSource,
) -> Result<Vec<DealtCard<'a>>> {
    let mut pool: Vec<&'a CardDefinition> = catalog
        .iter()
        .filter(|card| card.index != exclude.index)
        .collect();

    if pool.len() < SPREAD_SIZE {
        return Err(TarotError::InsufficientPool {
            available: pool.len(),
            required: SPREAD_SIZE,
        });
    }

    // 部分 Fisher-Yates：前 SPREAD_SIZE 格即為抽樣結果
    for i in 0..SPREAD_SIZE {
        let j = i + rng.next_index(pool.len() - i);
        pool.swap(i, j);
    }
    pool.truncate(SPREAD_SIZE);

    let spread = pool
        .into_iter()
        .enumerate()
        .map(|(i, card)| DealtCard {
            position: i + 1,
            card,
            orientation: if rng.next_bool() {
                Orientation::Reversed
            } else {
                Orientation::Upright
            },
        })
        .collect();

    Ok(spread)
}
