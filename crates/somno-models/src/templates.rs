//! Template text assembly.
//!
//! Titles, descriptions and generation prompts are assembled from a JSON
//! template file with `{placeholder}` substitution for the run's season,
//! mood and AI-generated variation phrases.

use std::collections::HashMap;
use std::path::Path;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or applying templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to read template file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid template JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template list is empty: {0}")]
    EmptyList(&'static str),

    #[error("Expected exactly 4 seasons, found {0}")]
    SeasonCount(usize),
}

/// A mood in both languages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mood {
    pub jp: String,
    pub en: String,
}

/// A season in both languages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Season {
    pub jp: String,
    pub en: String,
}

/// The full template file (`config/templates.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Templates {
    pub moods: Vec<Mood>,
    /// Spring, summer, autumn, winter — in that order.
    pub seasons: Vec<Season>,
    pub title_category: String,
    pub title_catchphrase_templates_jp: Vec<String>,
    pub title_main_templates_en: Vec<String>,
    pub title_emojis: Vec<String>,
    pub description_catchphrase_jp: String,
    pub description_main_jp: Vec<String>,
    pub description_cta_jp: String,
    pub description_ai_note_jp: String,
    pub description_catchphrase_en: String,
    pub description_main_en: Vec<String>,
    pub description_cta_en: String,
    pub description_ai_note_en: String,
    pub description_recommended: String,
    pub description_credits: String,
    pub hashtags_main: Vec<String>,
    /// Seasonal hashtags keyed by the English season name.
    pub hashtags_seasonal: HashMap<String, Vec<String>>,
    pub suno_prompt_jp: String,
    pub suno_prompt_en: String,
    pub image_bg_prompt_jp: String,
    pub image_bg_prompt_en: String,
    pub image_thumb_prompt_jp: String,
    pub image_thumb_prompt_en: String,
    pub tags: Vec<String>,
}

/// All run-specific text produced from the templates.
#[derive(Debug, Clone)]
pub struct BuiltTexts {
    pub title: String,
    pub description: String,
    pub suno_prompt: String,
    pub bg_prompt: String,
    pub thumb_prompt: String,
}

/// Section separator used in descriptions.
const SECTION_BREAK: &str = "⸻";

impl Templates {
    /// Load and validate templates from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let raw = std::fs::read_to_string(path)?;
        let templates: Templates = serde_json::from_str(&raw)?;
        templates.validate()?;
        Ok(templates)
    }

    fn validate(&self) -> Result<(), TemplateError> {
        if self.seasons.len() != 4 {
            return Err(TemplateError::SeasonCount(self.seasons.len()));
        }
        if self.moods.is_empty() {
            return Err(TemplateError::EmptyList("moods"));
        }
        if self.title_catchphrase_templates_jp.is_empty() {
            return Err(TemplateError::EmptyList("title_catchphrase_templates_jp"));
        }
        if self.title_main_templates_en.is_empty() {
            return Err(TemplateError::EmptyList("title_main_templates_en"));
        }
        if self.title_emojis.is_empty() {
            return Err(TemplateError::EmptyList("title_emojis"));
        }
        Ok(())
    }

    /// Season for a calendar month: 3-5 spring, 6-8 summer, 9-11 autumn,
    /// 12-2 winter.
    pub fn season_for_month(&self, month: u32) -> &Season {
        let index = match month {
            3..=5 => 0,
            6..=8 => 1,
            9..=11 => 2,
            _ => 3,
        };
        &self.seasons[index]
    }

    /// Pick a random mood for the run.
    pub fn choose_mood(&self, rng: &mut impl Rng) -> &Mood {
        self.moods.choose(rng).expect("validated non-empty")
    }

    /// Assemble all run texts from the chosen mood, season and variation
    /// phrases.
    pub fn build_texts(
        &self,
        rng: &mut impl Rng,
        mood: &Mood,
        season: &Season,
        bg_variation: &str,
        thumb_variation: &str,
    ) -> BuiltTexts {
        let catchphrase_jp = fill(
            self.title_catchphrase_templates_jp
                .choose(rng)
                .expect("validated non-empty"),
            season,
            mood,
            None,
        );
        let main_en = fill(
            self.title_main_templates_en
                .choose(rng)
                .expect("validated non-empty"),
            season,
            mood,
            None,
        );
        let emoji = self.title_emojis.choose(rng).expect("validated non-empty");
        let title = format!("{}{}｜{} {}", self.title_category, catchphrase_jp, main_en, emoji);

        BuiltTexts {
            title,
            description: self.build_description(mood, season),
            suno_prompt: format!(
                "{}\n{}",
                fill(&self.suno_prompt_jp, season, mood, None),
                fill(&self.suno_prompt_en, season, mood, None)
            ),
            bg_prompt: format!(
                "{}\n{}",
                fill(&self.image_bg_prompt_jp, season, mood, Some(bg_variation)),
                fill(&self.image_bg_prompt_en, season, mood, Some(bg_variation))
            ),
            thumb_prompt: format!(
                "{}\n{}",
                fill(&self.image_thumb_prompt_jp, season, mood, Some(thumb_variation)),
                fill(&self.image_thumb_prompt_en, season, mood, Some(thumb_variation))
            ),
        }
    }

    fn build_description(&self, mood: &Mood, season: &Season) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut push = |s: String| {
            parts.push(s);
            parts.push(String::new());
        };

        // Japanese section
        push(fill(&self.description_catchphrase_jp, season, mood, None));
        for line in &self.description_main_jp {
            push(fill(line, season, mood, None));
        }
        push(self.description_cta_jp.clone());
        push(fill(&self.description_ai_note_jp, season, mood, None));
        push(SECTION_BREAK.to_string());

        // English section
        push(fill(&self.description_catchphrase_en, season, mood, None));
        for line in &self.description_main_en {
            push(fill(line, season, mood, None));
        }
        push(self.description_cta_en.clone());
        push(fill(&self.description_ai_note_en, season, mood, None));
        push(SECTION_BREAK.to_string());

        push("🎧 Recommended for:".to_string());
        push(self.description_recommended.clone());
        push(SECTION_BREAK.to_string());

        push("🎨 Credits".to_string());
        push(self.description_credits.clone());
        push(SECTION_BREAK.to_string());

        push("🎧 Hashtags".to_string());

        let mut hashtags = self.hashtags_main.clone();
        if let Some(seasonal) = self.hashtags_seasonal.get(&season.en) {
            hashtags.extend(seasonal.iter().cloned());
        }
        parts.push(hashtags.join(" "));

        parts.join("\n")
    }
}

/// Substitute `{season_jp}`, `{season_en}`, `{mood_jp}`, `{mood_en}` and
/// optionally `{variation}` placeholders.
fn fill(template: &str, season: &Season, mood: &Mood, variation: Option<&str>) -> String {
    let mut out = template
        .replace("{season_jp}", &season.jp)
        .replace("{season_en}", &season.en)
        .replace("{mood_jp}", &mood.jp)
        .replace("{mood_en}", &mood.en);
    if let Some(variation) = variation {
        out = out.replace("{variation}", variation);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Templates {
        serde_json::from_value(serde_json::json!({
            "moods": [{"jp": "安らぎ", "en": "calm"}],
            "seasons": [
                {"jp": "春", "en": "Spring"},
                {"jp": "夏", "en": "Summer"},
                {"jp": "秋", "en": "Autumn"},
                {"jp": "冬", "en": "Winter"}
            ],
            "title_category": "【睡眠用BGM】",
            "title_catchphrase_templates_jp": ["{season_jp}の{mood_jp}"],
            "title_main_templates_en": ["{mood_en} {season_en} Sleep Music"],
            "title_emojis": ["🌙"],
            "description_catchphrase_jp": "{season_jp}の夜に",
            "description_main_jp": ["{mood_jp}のひととき"],
            "description_cta_jp": "チャンネル登録をお願いします",
            "description_ai_note_jp": "AI生成 ({season_en})",
            "description_catchphrase_en": "{mood_en} nights in {season_en}",
            "description_main_en": ["Drift into {mood_en} sleep"],
            "description_cta_en": "Please subscribe",
            "description_ai_note_en": "AI generated ({season_en})",
            "description_recommended": "Sleep, study, meditation",
            "description_credits": "Music and art by AI",
            "hashtags_main": ["#sleepmusic"],
            "hashtags_seasonal": {"Summer": ["#summernights"]},
            "suno_prompt_jp": "{season_jp}の{mood_jp}な音楽",
            "suno_prompt_en": "{mood_en} ambient music for {season_en}",
            "image_bg_prompt_jp": "{season_jp}の星空、{variation}",
            "image_bg_prompt_en": "{season_en} starry sky, {variation}",
            "image_thumb_prompt_jp": "{season_jp}の夜空、{variation}",
            "image_thumb_prompt_en": "{season_en} night sky, {variation}",
            "tags": ["sleep music", "ambient"]
        }))
        .unwrap()
    }

    #[test]
    fn test_season_for_month() {
        let templates = fixture();
        assert_eq!(templates.season_for_month(4).en, "Spring");
        assert_eq!(templates.season_for_month(7).en, "Summer");
        assert_eq!(templates.season_for_month(10).en, "Autumn");
        assert_eq!(templates.season_for_month(12).en, "Winter");
        assert_eq!(templates.season_for_month(1).en, "Winter");
    }

    #[test]
    fn test_build_texts_substitutes_placeholders() {
        let templates = fixture();
        let mut rng = rand::rng();
        let mood = templates.moods[0].clone();
        let season = templates.season_for_month(7).clone();

        let texts = templates.build_texts(&mut rng, &mood, &season, "流れ星, shooting stars", "湖, lake");

        assert_eq!(texts.title, "【睡眠用BGM】夏の安らぎ｜calm Summer Sleep Music 🌙");
        assert!(texts.suno_prompt.contains("calm ambient music for Summer"));
        assert!(texts.bg_prompt.contains("shooting stars"));
        assert!(texts.thumb_prompt.contains("lake"));
        assert!(!texts.bg_prompt.contains("{variation}"));
    }

    #[test]
    fn test_description_includes_seasonal_hashtags() {
        let templates = fixture();
        let mood = &templates.moods[0];
        let summer = templates.season_for_month(7).clone();
        let winter = templates.season_for_month(1).clone();

        let with_seasonal = templates.build_description(mood, &summer);
        assert!(with_seasonal.contains("#sleepmusic #summernights"));

        // Winter has no seasonal hashtags configured.
        let without = templates.build_description(mood, &winter);
        assert!(without.contains("#sleepmusic"));
        assert!(!without.contains("#summernights"));
    }

    #[test]
    fn test_validation_rejects_wrong_season_count() {
        let mut templates = fixture();
        templates.seasons.pop();
        assert!(matches!(
            templates.validate(),
            Err(TemplateError::SeasonCount(3))
        ));
    }
}
