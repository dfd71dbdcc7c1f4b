use crate::core::{AgeBracket, CardCatalog, CardDefinition, Sex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourtRank {
    Page,
    Knight,
    Queen,
    King,
}

impl CourtRank {
    pub const ALL: [CourtRank; 4] = [Self::Page, Self::Knight, Self::Queen, Self::King];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Page => "Page",
            Self::Knight => "Knight",
            Self::Queen => "Queen",
            Self::King => "King",
        }
    }

    /// Court cards are named "<Rank> of <Suit>".
    pub fn matches(&self, card: &CardDefinition) -> bool {
        card.display_name
            .strip_prefix(self.name())
            .is_some_and(|rest| rest.starts_with(" of "))
    }
}

/// Court ranks that may represent a questioner of this sex and age.
pub fn target_ranks(sex: Sex, age: AgeBracket) -> &'static [CourtRank] {
    use CourtRank::*;
    match (sex, age) {
        (Sex::Male, AgeBracket::Over40) => &[Knight],
        (Sex::Male, AgeBracket::Under40) => &[King],
        (Sex::Female, AgeBracket::Over40) => &[Queen],
        (Sex::Female, AgeBracket::Under40) => &[Page],
        (Sex::Other, AgeBracket::Over40) => &[Knight, Queen],
        (Sex::Other, AgeBracket::Under40) => &[King, Page],
    }
}

fn cards_of_ranks<'a>(catalog: &'a CardCatalog, ranks: &[CourtRank]) -> Vec<&'a CardDefinition> {
    catalog
        .iter()
        .filter(|card| ranks.iter().any(|rank| rank.matches(card)))
        .collect()
}

/// Narrows the catalog to significator candidates.
///
/// Questions about someone else may draw any card. Self-directed questions
/// draw from the court ranks for the questioner, falling back to every court
/// card and then to the whole catalog, so the result is only empty when the
/// catalog is.
pub fn candidates(
    catalog: &CardCatalog,
    self_directed: bool,
    sex: Sex,
    age: AgeBracket,
) -> Vec<&CardDefinition> {
    if !self_directed {
        return catalog.iter().collect();
    }

    let targets = target_ranks(sex, age);
    let courts = cards_of_ranks(catalog, targets);
    if !courts.is_empty() {
        return courts;
    }

    tracing::debug!("No cards for ranks {:?}, falling back to all court cards", targets);
    let courts = cards_of_ranks(catalog, &CourtRank::ALL);
    if !courts.is_empty() {
        return courts;
    }

    tracing::debug!("Catalog has no court cards, using every card as candidate");
    catalog.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FacingDirection;

    fn card(index: u32, name: &str) -> CardDefinition {
        CardDefinition {
            index,
            image_id: CardDefinition::image_id_for(index),
            display_name: name.to_string(),
            localized_name: String::new(),
            facing: FacingDirection::Unspecified,
            symbol_text: String::new(),
            upright_meaning: String::new(),
            reversed_meaning: String::new(),
        }
    }

    fn names<'a>(cards: &[&'a CardDefinition]) -> Vec<&'a str> {
        cards.iter().map(|c| c.display_name.as_str()).collect()
    }

    fn court_catalog() -> CardCatalog {
        CardCatalog::new(vec![
            card(0, "The Fool"),
            card(1, "Page of Wands"),
            card(2, "Knight of Wands"),
            card(3, "Queen of Wands"),
            card(4, "King of Wands"),
            card(5, "Knight of Cups"),
            card(6, "Knightly Virtue"),
        ])
    }

    #[test]
    fn test_not_self_directed_returns_full_catalog() {
        let catalog = court_catalog();
        let result = candidates(&catalog, false, Sex::Male, AgeBracket::Over40);
        assert_eq!(result.len(), catalog.len());
    }

    #[test]
    fn test_rank_table() {
        let catalog = court_catalog();
        let pick = |sex, age| names(&candidates(&catalog, true, sex, age));

        assert_eq!(pick(Sex::Male, AgeBracket::Over40), vec!["Knight of Wands", "Knight of Cups"]);
        assert_eq!(pick(Sex::Male, AgeBracket::Under40), vec!["King of Wands"]);
        assert_eq!(pick(Sex::Female, AgeBracket::Over40), vec!["Queen of Wands"]);
        assert_eq!(pick(Sex::Female, AgeBracket::Under40), vec!["Page of Wands"]);
        assert_eq!(
            pick(Sex::Other, AgeBracket::Over40),
            vec!["Knight of Wands", "Queen of Wands", "Knight of Cups"]
        );
        assert_eq!(pick(Sex::Other, AgeBracket::Under40), vec!["Page of Wands", "King of Wands"]);
    }

    #[test]
    fn test_falls_back_to_all_courts() {
        let catalog = CardCatalog::new(vec![card(0, "The Fool"), card(1, "Page of Cups")]);
        let result = candidates(&catalog, true, Sex::Male, AgeBracket::Over40);
        assert_eq!(names(&result), vec!["Page of Cups"]);
    }

    #[test]
    fn test_falls_back_to_full_catalog() {
        let catalog = CardCatalog::new(vec![card(0, "The Fool"), card(1, "The Magician")]);
        let result = candidates(&catalog, true, Sex::Female, AgeBracket::Under40);
        assert_eq!(names(&result), vec!["The Fool", "The Magician"]);
    }

    #[test]
    fn test_empty_catalog_yields_no_candidates() {
        let catalog = CardCatalog::default();
        assert!(candidates(&catalog, true, Sex::Other, AgeBracket::Over40).is_empty());
    }
}
