use crate::core::candidates::candidates;
use crate::core::dealer::deal;
use crate::core::layout::{assign_positions, layout_side, CelticCross};
use crate::core::similarity::{select_significator, SelectionMethod};
use crate::core::{CardCatalog, DealtCard, Questioner, RandomSource, Reading, Translator};
use crate::utils::error::{Result, TarotError};

/// Translates the query into the language of the card texts. A blank query
/// is not sent, and a failed translation counts as blank.
pub async fn translate_query(translator: &dyn Translator, query: &str) -> String {
    if query.trim().is_empty() {
        return String::new();
    }

    match translator.translate(query).await {
        Ok(translated) => {
            let translated = translated.trim().to_string();
            tracing::debug!("Translated query: {}", translated);
            translated
        }
        Err(e) => {
            tracing::warn!(
                "Translation unavailable ({}), significator will be chosen at random",
                e
            );
            String::new()
        }
    }
}

/// Output of one draw: the reading, its board layout and how the
/// significator was picked.
#[derive(Debug, Clone)]
pub struct DrawnReading<'a> {
    pub reading: Reading<'a>,
    pub cross: CelticCross<'a>,
    pub selection: SelectionMethod,
}

impl<'a> DrawnReading<'a> {
    /// Cards in board order: significator first.
    pub fn cards(&self) -> Vec<DealtCard<'a>> {
        self.reading.all_cards()
    }
}

/// State of one reading. Build a fresh session per submission and drop it on reset.
#[derive(Debug, Clone)]
pub struct ReadingSession<'a> {
    catalog: &'a CardCatalog,
    questioner: Questioner,
    translated_query: String,
}

impl<'a> ReadingSession<'a> {
    pub fn new(catalog: &'a CardCatalog, questioner: Questioner) -> Result<Self> {
        if catalog.is_empty() {
            return Err(TarotError::data_unavailable("card catalog is empty"));
        }
        Ok(Self {
            catalog,
            questioner,
            translated_query: String::new(),
        })
    }

    pub fn questioner(&self) -> &Questioner {
        &self.questioner
    }

    pub fn translated_query(&self) -> &str {
        &self.translated_query
    }

    pub fn with_translated_query(mut self, translated: impl Into<String>) -> Self {
        self.translated_query = translated.into();
        self
    }

    pub async fn translate(&mut self, translator: &dyn Translator) {
        self.translated_query = translate_query(translator, &self.questioner.query).await;
    }

    /// Filter, select, deal and lay out one reading.
    pub fn draw(&self, rng: &mut dyn RandomSource) -> Result<DrawnReading<'a>> {
        let q = &self.questioner;
        let pool = candidates(self.catalog, q.self_directed, q.sex, q.age);
        tracing::debug!("{} significator candidate(s)", pool.len());

        let selection = select_significator(&pool, &self.translated_query, rng)?;
        let significator = selection.card;
        tracing::info!(
            "Significator: {} ({})",
            significator.display_name,
            significator.localized_name
        );

        let spread = deal(self.catalog, significator, rng)?;
        let cards = assign_positions(significator, &spread)?;
        let side = layout_side(significator.facing, rng);
        let cross = CelticCross::new(side, &cards);

        let reading = Reading {
            questioner: self.questioner.clone(),
            translated_query: self.translated_query.clone(),
            significator: cards[0],
            spread: cards[1..].to_vec(),
        };

        Ok(DrawnReading {
            reading,
            cross,
            selection: selection.method,
        })
    }
}
