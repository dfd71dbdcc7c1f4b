//! HTML and JSON output for a finished reading.

use crate::config::meta::OrientationLabels;
use crate::core::layout::{CelticCross, LayoutSide};
use crate::core::narrative::{card_title, Narrative, ADVICE_TITLE, SUMMARY_TITLE};
use crate::core::session::DrawnReading;
use crate::core::{ImageResolver, Storage};
use crate::utils::error::Result;
use chrono::{DateTime, Local};
use serde::Serialize;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn paragraphs(text: &str) -> String {
    escape_html(text).replace('\n', "<br>\n")
}

/// Board CSS. Slots 5 and 6 follow the mirrored side.
pub fn layout_css(cross: &CelticCross<'_>) -> String {
    let mut css = String::from(
        ".celtic-cross-container {\n  position: relative; width: 704px; height: 556px;\n  margin: 0 auto 10px; border: 1px solid #ccc;\n}\n.card-position { position: absolute; }\n.card-position img {\n  width: 70px; height: auto;\n  filter: drop-shadow(0 0 3px darkgray);\n}\n",
    );
    for placed in &cross.slots {
        let g = placed.geometry;
        css.push_str(&format!(
            ".card-pos{} {{ top: {}%; left: {}%;{} }}\n",
            placed.dealt.position,
            g.top_pct,
            g.left_pct,
            if g.base_rotation_deg != 0 {
                format!(" transform: rotate({}deg);", g.base_rotation_deg)
            } else {
                String::new()
            }
        ));
    }
    css
}

pub fn board_html(cross: &CelticCross<'_>, images: &dyn ImageResolver) -> String {
    let cards: String = cross
        .slots
        .iter()
        .map(|placed| {
            format!(
                "<div class=\"card-position card-pos{idx}\"><img src=\"data:image/png;base64,{img}\" alt=\"card{idx}\" style=\"transform:rotate({rot}deg);\" /></div>",
                idx = placed.dealt.position,
                img = images.resolve_image(&placed.dealt.card.image_id),
                rot = placed.rotation_deg,
            )
        })
        .collect();
    format!(
        "<div class=\"celtic-cross-container\" data-layout=\"{}\">{}</div>",
        cross.side.as_str(),
        cards
    )
}

pub fn render_html(
    drawn: &DrawnReading<'_>,
    narrative: Option<&Narrative>,
    images: &dyn ImageResolver,
    labels: &OrientationLabels,
) -> String {
    let cards = drawn.cards();
    let card_lines = cards
        .iter()
        .map(|card| escape_html(&card_title(card, labels)))
        .collect::<Vec<_>>()
        .join("<br>\n");

    let mut body = String::new();
    body.push_str("<h1>生成AIによるタロット占い: 古代ケルト十字法</h1>\n");
    body.push_str(&format!(
        "<p class=\"query\">{}</p>\n",
        escape_html(&drawn.reading.questioner.query)
    ));
    body.push_str("<h2>選ばれたカードの一覧</h2>\n");
    body.push_str(&board_html(&drawn.cross, images));
    body.push_str(&format!("\n<p>{}</p>\n", card_lines));

    if let Some(narrative) = narrative {
        body.push_str("<h2>各カードのリーディング</h2>\n");
        for (reading, placed) in narrative.card_readings.iter().zip(&drawn.cross.slots) {
            body.push_str(&format!(
                "<h3>{}</h3>\n<img src=\"data:image/png;base64,{}\" alt=\"{}\" style=\"width:240px; height:auto; transform:rotate({}deg);\" />\n<p>{}</p>\n",
                escape_html(&reading.title),
                images.resolve_image(&placed.dealt.card.image_id),
                escape_html(&placed.dealt.card.display_name),
                placed.rotation_deg,
                paragraphs(&reading.body)
            ));
        }
        body.push_str(&format!(
            "<h2>{}</h2>\n<p>{}</p>\n<h2>{}</h2>\n<p>{}</p>\n",
            SUMMARY_TITLE,
            paragraphs(&narrative.summary.0),
            ADVICE_TITLE,
            paragraphs(&narrative.advice.0)
        ));
    }

    format!(
        "<!DOCTYPE html>\n<html lang=\"ja\">\n<head>\n<meta charset=\"utf-8\">\n<title>タロット占い</title>\n<style>\n{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        layout_css(&drawn.cross),
        body
    )
}

#[derive(Debug, Serialize)]
struct ReportJson<'r, 'a> {
    created_at: String,
    layout: LayoutSide,
    reading: &'r crate::core::Reading<'a>,
    board: &'r CelticCross<'a>,
    narrative: Option<&'r Narrative>,
}

/// Paths written by [`write_report`], relative to the storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFiles {
    pub html: String,
    pub json: String,
}

pub async fn write_report<S: Storage>(
    storage: &S,
    drawn: &DrawnReading<'_>,
    narrative: Option<&Narrative>,
    images: &dyn ImageResolver,
    labels: &OrientationLabels,
    now: DateTime<Local>,
) -> Result<ReportFiles> {
    let stem = format!("reading_{}", now.format("%Y%m%d_%H%M%S"));
    let files = ReportFiles {
        html: format!("{}.html", stem),
        json: format!("{}.json", stem),
    };

    let html = render_html(drawn, narrative, images, labels);
    storage.write_file(&files.html, html.as_bytes()).await?;

    let json = serde_json::to_string_pretty(&ReportJson {
        created_at: now.to_rfc3339(),
        layout: drawn.cross.side,
        reading: &drawn.reading,
        board: &drawn.cross,
        narrative,
    })?;
    storage.write_file(&files.json, json.as_bytes()).await?;

    tracing::debug!("Report written to {} and {}", files.html, files.json);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"Cups\" & 'Wands'</b>"),
            "&lt;b&gt;&quot;Cups&quot; &amp; &#39;Wands&#39;&lt;/b&gt;"
        );
        assert_eq!(paragraphs("a\nb"), "a<br>\nb");
    }
}
