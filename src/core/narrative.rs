//! Narrative generation stages.
//!
//! Card interpretations, summary and advice run strictly in order; each
//! stage receives the previous stage's typed output instead of reading a
//! shared conversation history.

use crate::config::meta::OrientationLabels;
use crate::core::layout::{position_label_en, position_label_ja};
use crate::core::{ChatMessage, DealtCard, Narrator, Reading, StreamSink};
use crate::utils::error::Result;
use serde::Serialize;

pub const SYSTEM_PROMPT: &str = "あなたは、経験豊富で思慮深く、思いやりがあり、優れた直感と霊感に満ち、よく当たると評判のタロット占い師です。すべて日本語で回答してください。";

pub const SUMMARY_TITLE: &str = "まとめ";
pub const ADVICE_TITLE: &str = "アドバイス";

/// Heading shown above one card's interpretation.
pub fn card_title(card: &DealtCard<'_>, labels: &OrientationLabels) -> String {
    let base = format!(
        "{}: {}（{}）",
        position_label_ja(card.position),
        card.card.localized_name,
        card.card.display_name
    );
    if card.is_significator() {
        base
    } else {
        format!("{} / {}", base, labels.label(card.orientation))
    }
}

/// Prompt for one card. The significator carries no orientation or meaning.
pub fn card_prompt(
    significator: &DealtCard<'_>,
    query: &str,
    card: &DealtCard<'_>,
    labels: &OrientationLabels,
) -> String {
    let mut prompt = format!("今回の質問: {}\n\n", query);
    prompt.push_str("[現在リーディングしようとしているカードの情報]\n");
    prompt.push_str(&format!(
        "カード名: {}（{}）\n",
        card.card.localized_name, card.card.display_name
    ));
    prompt.push_str(&format!("位置: {}\n", position_label_ja(card.position)));

    let orient_text = if card.is_significator() {
        ""
    } else {
        labels.label(card.orientation)
    };
    if !orient_text.is_empty() {
        prompt.push_str(&format!("向き: {}\n", orient_text));
    }

    prompt.push_str("カードが象徴するもの:\n");
    prompt.push_str(&card.card.symbol_text);
    prompt.push('\n');

    let meaning = card.meaning();
    if !meaning.is_empty() {
        prompt.push_str(&format!(
            "このカードの{}でのリーディングにおける意味:\n{}\n",
            orient_text, meaning
        ));
    }

    prompt.push_str(&format!(
        "\n今回のスプレッド全体に関する象徴カード(Significator): {}({})\n\n",
        significator.card.localized_name, significator.card.display_name
    ));
    prompt.push_str("上記カードの意味と位置を踏まえ、質問内容に対するリーディングを簡潔に短く解説してください。\n");
    prompt.push_str("改行を適宜入れ、読みやすい文章にしてください。回答に表題は不要です。\n");
    prompt.push_str("回答はすべて日本語でお願いします。\n");
    prompt
}

/// Ordered overview of every dealt card, shared by the summary and advice prompts.
pub fn spread_overview(reading: &Reading<'_>, labels: &OrientationLabels) -> String {
    let mut text = format!(
        "significator = {}\nquery_text = {}\n\n[スプレッド概要 / Spread]\n",
        reading.significator.card.display_name, reading.questioner.query
    );
    for card in reading.all_cards() {
        let orientation = if card.is_significator() {
            "N/A (Significator)"
        } else {
            labels.label(card.orientation)
        };
        text.push_str(&format!(
            "・{}: {}（{}） / {}\n",
            position_label_en(card.position),
            card.card.localized_name,
            card.card.display_name,
            orientation
        ));
    }
    text
}

pub fn summary_prompt(reading: &Reading<'_>, labels: &OrientationLabels) -> String {
    let mut prompt = spread_overview(reading, labels);
    prompt.push_str("\n上記を踏まえた簡潔な短いまとめを、わかりやすく、ていねいな日本語で提示してください。回答に表題は不要です。");
    prompt
}

pub fn advice_prompt(reading: &Reading<'_>, labels: &OrientationLabels, summary: &Summary) -> String {
    let mut prompt = spread_overview(reading, labels);
    prompt.push_str("\n上記の流れと次のまとめをふまえて、実践的でやさしい日本語のアドバイスを簡潔に短く提示してください。回答に表題は不要です。\n");
    prompt.push_str("[まとめ / Summary]\n");
    prompt.push_str(&summary.0);
    prompt
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardReading {
    pub position: usize,
    pub title: String,
    pub body: String,
}

/// Summary stage output; required to build the advice prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advice(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct Narrative {
    pub card_readings: Vec<CardReading>,
    pub summary: Summary,
    pub advice: Advice,
}

/// Runs the narrator stages in order: eleven cards, summary, advice.
pub struct NarrativePipeline<'n> {
    narrator: &'n dyn Narrator,
    labels: OrientationLabels,
}

impl<'n> NarrativePipeline<'n> {
    pub fn new(narrator: &'n dyn Narrator, labels: OrientationLabels) -> Self {
        Self { narrator, labels }
    }

    async fn stream_stage(
        &self,
        title: &str,
        prompt: String,
        sink: &mut dyn StreamSink,
    ) -> Result<String> {
        let messages = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];
        sink.begin(title);
        let text = self.narrator.stream(&messages, sink).await?;
        sink.end();
        Ok(text)
    }

    pub async fn interpret_cards(
        &self,
        reading: &Reading<'_>,
        sink: &mut dyn StreamSink,
    ) -> Result<Vec<CardReading>> {
        let mut readings = Vec::with_capacity(reading.spread.len() + 1);
        for card in reading.all_cards() {
            let title = card_title(&card, &self.labels);
            tracing::debug!("Interpreting {}", title);
            let prompt = card_prompt(&reading.significator, &reading.questioner.query, &card, &self.labels);
            let body = self.stream_stage(&title, prompt, sink).await?;
            readings.push(CardReading {
                position: card.position,
                title,
                body,
            });
        }
        Ok(readings)
    }

    pub async fn summarize(&self, reading: &Reading<'_>, sink: &mut dyn StreamSink) -> Result<Summary> {
        let prompt = summary_prompt(reading, &self.labels);
        let text = self.stream_stage(SUMMARY_TITLE, prompt, sink).await?;
        Ok(Summary(text))
    }

    pub async fn advise(
        &self,
        reading: &Reading<'_>,
        summary: &Summary,
        sink: &mut dyn StreamSink,
    ) -> Result<Advice> {
        let prompt = advice_prompt(reading, &self.labels, summary);
        let text = self.stream_stage(ADVICE_TITLE, prompt, sink).await?;
        Ok(Advice(text))
    }

    pub async fn run(&self, reading: &Reading<'_>, sink: &mut dyn StreamSink) -> Result<Narrative> {
        let card_readings = self.interpret_cards(reading, sink).await?;
        let summary = self.summarize(reading, sink).await?;
        let advice = self.advise(reading, &summary, sink).await?;
        tracing::info!("Narrative complete: {} card readings", card_readings.len());
        Ok(Narrative {
            card_readings,
            summary,
            advice,
        })
    }
}
