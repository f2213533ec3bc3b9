//! Property-based tests for template selection
//!
//! Tests invariants:
//! - A lookup succeeds exactly when the template's range covers the level
//! - A returned template always has the requested type

use proptest::prelude::*;

use crate::core::lesson_gen::{CefrLevel, LessonTemplateRepository, LessonType};
use crate::tests::common::template_record;

fn arb_level() -> impl Strategy<Value = CefrLevel> {
    prop::sample::select(CefrLevel::ALL.to_vec())
}

fn arb_range() -> impl Strategy<Value = (CefrLevel, CefrLevel)> {
    (arb_level(), arb_level()).prop_map(|(a, b)| if a <= b { (a, b) } else { (b, a) })
}

proptest! {
    /// Property: Selection honours the difficulty range
    #[test]
    fn prop_selection_honours_range((start, end) in arb_range(), level in arb_level()) {
        let record = template_record(
            "ranged",
            "grammar",
            [start.as_str(), end.as_str()],
            "Body",
        );
        let repo = LessonTemplateRepository::from_records("prop", vec![record]);

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let result = runtime.block_on(repo.get_template(LessonType::Grammar, level));

        let covered = start <= level && level <= end;
        prop_assert_eq!(result.is_ok(), covered);
        if let Ok(template) = result {
            prop_assert_eq!(template.lesson_type, LessonType::Grammar);
            prop_assert_eq!(template.id.as_str(), "ranged");
        }
    }
}
