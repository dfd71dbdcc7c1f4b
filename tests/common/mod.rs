#![allow(dead_code)]

use tarot_reader::core::catalog::parse_catalog;
use tarot_reader::core::{AgeBracket, CardCatalog, Questioner, Sex};

pub const DECK_PATH: &str = "data/tarot_cards.json";

pub fn deck_json() -> String {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(DECK_PATH);
    std::fs::read_to_string(path).unwrap()
}

/// The bundled 78-card deck.
pub fn full_deck() -> CardCatalog {
    let load = parse_catalog(DECK_PATH, &deck_json());
    assert_eq!(load.skipped, 0);
    load.catalog
}

pub fn questioner(sex: Sex, over_40: bool, self_directed: bool, query: &str) -> Questioner {
    Questioner {
        sex,
        age: AgeBracket::from_over_40(over_40),
        self_directed,
        query: query.to_string(),
    }
}
