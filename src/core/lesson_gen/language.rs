//! Learning direction between the two supported languages.
//!
//! Templates receive the direction through a handful of context keys so a
//! single template body can serve German and Bulgarian speakers alike.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Which language the learner reads from and which they learn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LanguageDirection {
    #[default]
    #[serde(rename = "DE_BG")]
    GermanToBulgarian,
    #[serde(rename = "BG_DE")]
    BulgarianToGerman,
}

impl LanguageDirection {
    pub fn opposite(self) -> Self {
        match self {
            Self::GermanToBulgarian => Self::BulgarianToGerman,
            Self::BulgarianToGerman => Self::GermanToBulgarian,
        }
    }

    pub fn source_code(self) -> &'static str {
        match self {
            Self::GermanToBulgarian => "de",
            Self::BulgarianToGerman => "bg",
        }
    }

    pub fn target_code(self) -> &'static str {
        self.opposite().source_code()
    }

    pub fn source_name(self) -> &'static str {
        match self {
            Self::GermanToBulgarian => "German",
            Self::BulgarianToGerman => "Bulgarian",
        }
    }

    pub fn target_name(self) -> &'static str {
        self.opposite().source_name()
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Self::GermanToBulgarian => "→",
            Self::BulgarianToGerman => "←",
        }
    }

    /// `DE→BG` or `BG→DE`.
    pub fn label(self) -> &'static str {
        match self {
            Self::GermanToBulgarian => "DE→BG",
            Self::BulgarianToGerman => "BG→DE",
        }
    }

    /// Context entries injected into every section.
    pub fn context_entries(self) -> Vec<(&'static str, Value)> {
        vec![
            ("sourceLanguage", json!(self.source_code())),
            ("targetLanguage", json!(self.target_code())),
            ("sourceLanguageName", json!(self.source_name())),
            ("targetLanguageName", json!(self.target_name())),
            ("directionText", json!(self.label())),
            ("directionArrow", json!(self.arrow())),
        ]
    }
}
