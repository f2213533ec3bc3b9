//! Part-of-speech correction and per-item grammar notes.
//!
//! Some entries in the vocabulary data carry a wrong part of speech
//! (greetings filed as nouns, number words as adjectives). Lessons use the
//! corrected classification for filtering and display.

use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::vocabulary::VocabularyItem;

const NO_GRAMMAR_INFO: &str = "No additional grammar information available.";

/// Known misclassifications, keyed by vocabulary item id.
static CORRECTIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // greetings and set phrases
        ("zdravej_001", "interjection"),
        ("dobro_utro_002", "phrase"),
        ("guten_tag", "phrase"),
        ("guten_abend", "phrase"),
        ("gute_nacht", "phrase"),
        ("auf_wiedersehen", "phrase"),
        ("bitte", "interjection"),
        ("entschuldigung", "interjection"),
        ("es_tut_mir_leid", "phrase"),
        // question words
        ("a1_question_001", "pronoun"),
        ("a1_question_003", "adverb"),
        ("a1_question_004", "adverb"),
        ("a1_question_005", "adverb"),
        ("a1_question_006", "adverb"),
        ("a1_question_007", "adverb"),
        ("a1_question_008", "pronoun"),
        ("a1_question_009", "pronoun"),
        ("a1_question_010", "adverb"),
        ("a1_question_011", "adverb"),
        ("a1_question_012", "conjunction"),
        // numbers
        ("eins", "number"),
        ("zwei", "number"),
        ("drei", "number"),
        ("vier", "number"),
        ("funf", "number"),
        ("sechs", "number"),
        ("sieben", "number"),
        ("acht", "number"),
        ("neun", "number"),
        ("zehn", "number"),
        ("elf", "number"),
        ("zwoelf", "number"),
        ("dreizehn", "number"),
        ("zwanzig", "number"),
        ("a1_number_200", "number"),
    ])
});

/// Corrected part of speech for an item, falling back to the recorded one.
/// The older `numeral` spelling reads as `number`.
pub fn validated_part_of_speech<'a>(pos: &'a str, item_id: &str) -> &'a str {
    match CORRECTIONS.get(item_id) {
        Some(corrected) => *corrected,
        None if pos == "numeral" => "number",
        None => pos,
    }
}

/// Display label for a part of speech. Unknown labels pass through.
pub fn display_part_of_speech(pos: &str) -> String {
    let label = match pos {
        "noun" => "Noun",
        "verb" => "Verb",
        "adjective" => "Adjective",
        "adverb" => "Adverb",
        "pronoun" => "Pronoun",
        "preposition" => "Preposition",
        "conjunction" => "Conjunction",
        "interjection" => "Interjection",
        "number" | "numeral" => "Numeral",
        "article" => "Article",
        "phrase" => "Phrase",
        other => other,
    };
    label.to_string()
}

/// Short grammar note shown next to an item of the given part of speech.
pub fn grammar_info(pos: &str) -> &'static str {
    match pos {
        "interjection" => "Interjections are words or phrases used to express emotion or greeting. They are often used at the beginning of sentences.",
        "pronoun" => "Pronouns replace nouns to avoid repetition. They must agree with the noun they replace in gender, number, and case.",
        "adverb" => "Adverbs describe verbs, adjectives, or other adverbs. They often answer questions like \"how?\", \"when?\", \"where?\", or \"to what extent?\".",
        "number" | "numeral" => "Numerals represent numbers and can be cardinal (one, two) or ordinal (first, second). They are used for counting and ordering.",
        "phrase" => "Phrases are groups of words that function as a single unit in the syntax of a sentence. They often express greetings, farewells, or common expressions.",
        "conjunction" => "Conjunctions connect words, phrases, or clauses. They can be coordinating (and, but, or) or subordinating (because, although, if).",
        _ => NO_GRAMMAR_INFO,
    }
}

/// Item serialized for a rendering context, with `correctedPartOfSpeech`
/// and `grammarInfo` added.
pub fn enrich_item(item: &VocabularyItem) -> Value {
    let pos = validated_part_of_speech(&item.part_of_speech, &item.id);
    let mut map = match serde_json::to_value(item) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    map.insert(
        "correctedPartOfSpeech".to_string(),
        Value::String(display_part_of_speech(pos)),
    );
    map.insert(
        "grammarInfo".to_string(),
        Value::String(grammar_info(pos).to_string()),
    );
    Value::Object(map)
}

pub fn enrich_items(items: &[VocabularyItem]) -> Vec<Value> {
    items.iter().map(enrich_item).collect()
}
