use std::sync::Arc;

use proptest::prelude::*;
use rstest::rstest;
use waste_sorter::WasteClassifier;
use waste_sorter::classification::CapabilitySet;
use waste_sorter::domain::{Category, KnowledgeBase};
use waste_sorter::error::ClassifyError;

fn classifier() -> WasteClassifier {
    WasteClassifier::new(
        CapabilitySet::absent(),
        Arc::new(KnowledgeBase::embedded().unwrap()),
    )
}

#[test]
fn test_compost_text_is_organic_with_high_confidence() {
    let result = classifier().classify_text("banana peel for compost").unwrap();

    assert_eq!(result.category, Category::Organic);
    assert!(result.confidence > 0.65);
    assert_eq!(result.waste_name, "Organic Waste");
    assert!(!result.disposal.methods.is_empty());
}

#[test]
fn test_gibberish_defaults_to_dry_waste() {
    let result = classifier().classify_text("xyz unrelated gibberish").unwrap();

    assert_eq!(result.category, Category::DryWaste);
    assert_eq!(result.confidence, 0.50);
    assert_eq!(
        result.detection_method,
        "Classified based on text analysis: 'xyz unrelated gibberish...'"
    );
}

#[rstest]
#[case("expired medicine and pesticide spray", Category::Hazardous)]
#[case("old television and printer cartridges", Category::EWaste)]
#[case("cardboard boxes and aluminum cans", Category::Recyclable)]
#[case("styrofoam cup and chip wrapper", Category::DryWaste)]
#[case("eggshells and coffee grounds", Category::Organic)]
fn test_text_categories(#[case] text: &str, #[case] expected: Category) {
    assert_eq!(classifier().classify_text(text).unwrap().category, expected);
}

#[test]
fn test_blank_text_is_input_validation_error() {
    let error = classifier().classify_text("  ").unwrap_err();
    assert!(matches!(error, ClassifyError::InputValidation(_)));
}

#[test]
fn test_text_classification_is_deterministic() {
    let classifier = classifier();
    let first = classifier.classify_text("a leaking car battery").unwrap();
    let second = classifier.classify_text("a leaking car battery").unwrap();
    assert_eq!(first, second);
}

proptest! {
    #[test]
    fn prop_text_results_are_bounded(text in "[a-zA-Z ,.!-]{1,80}") {
        prop_assume!(!text.trim().is_empty());
        let result = classifier().classify_text(&text).unwrap();
        prop_assert!((0.0..=1.0).contains(&result.confidence));
        prop_assert!(Category::ALL.contains(&result.category));
    }
}
