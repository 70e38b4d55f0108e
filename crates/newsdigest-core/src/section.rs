use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// One of the six fixed news portal sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Politics,
    Economy,
    Society,
    LifeCulture,
    World,
    ItScience,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Politics,
        Section::Economy,
        Section::Society,
        Section::LifeCulture,
        Section::World,
        Section::ItScience,
    ];

    /// Stable slug used in URLs, the database, and JSON.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Section::Politics => "politics",
            Section::Economy => "economy",
            Section::Society => "society",
            Section::LifeCulture => "life_culture",
            Section::World => "world",
            Section::ItScience => "it_science",
        }
    }

    /// Numeric section code used by the portal (`/section/{code}`).
    #[must_use]
    pub fn portal_code(self) -> u16 {
        match self {
            Section::Politics => 100,
            Section::Economy => 101,
            Section::Society => 102,
            Section::LifeCulture => 103,
            Section::World => 104,
            Section::ItScience => 105,
        }
    }

    /// Section name as the portal displays it.
    #[must_use]
    pub fn portal_name(self) -> &'static str {
        match self {
            Section::Politics => "정치",
            Section::Economy => "경제",
            Section::Society => "사회",
            Section::LifeCulture => "생활",
            Section::World => "세계",
            Section::ItScience => "IT",
        }
    }

    /// English display label for dashboards and CLI output.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Section::Politics => "Politics",
            Section::Economy => "Economy",
            Section::Society => "Society",
            Section::LifeCulture => "Life & Culture",
            Section::World => "World",
            Section::ItScience => "IT & Science",
        }
    }

    /// Path of the section listing page relative to the portal root.
    #[must_use]
    pub fn listing_path(self) -> String {
        format!("/section/{}", self.portal_code())
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Section {
    type Err = CoreError;

    /// Accepts the slug (case-insensitive) or the portal's display name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lowered = trimmed.to_ascii_lowercase();
        Section::ALL
            .into_iter()
            .find(|section| section.slug() == lowered || section.portal_name() == trimmed)
            .ok_or_else(|| CoreError::UnknownSection(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_slugs_case_insensitively() {
        assert_eq!("politics".parse::<Section>(), Ok(Section::Politics));
        assert_eq!("IT_SCIENCE".parse::<Section>(), Ok(Section::ItScience));
        assert_eq!(" world ".parse::<Section>(), Ok(Section::World));
    }

    #[test]
    fn parses_portal_names() {
        assert_eq!("경제".parse::<Section>(), Ok(Section::Economy));
        assert_eq!("IT".parse::<Section>(), Ok(Section::ItScience));
        assert_eq!("생활".parse::<Section>(), Ok(Section::LifeCulture));
    }

    #[test]
    fn rejects_unknown_section() {
        assert_eq!(
            "sports".parse::<Section>(),
            Err(CoreError::UnknownSection("sports".to_string()))
        );
    }

    #[test]
    fn portal_codes_are_contiguous() {
        let codes: Vec<u16> = Section::ALL.iter().map(|s| s.portal_code()).collect();
        assert_eq!(codes, vec![100, 101, 102, 103, 104, 105]);
        assert_eq!(Section::Society.listing_path(), "/section/102");
    }

    #[test]
    fn serializes_as_slug() {
        let json = serde_json::to_string(&Section::LifeCulture).unwrap();
        assert_eq!(json, "\"life_culture\"");
        let parsed: Section = serde_json::from_str("\"it_science\"").unwrap();
        assert_eq!(parsed, Section::ItScience);
    }
}
