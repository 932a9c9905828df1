use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_test::traced_test;
use waste_sorter::WasteClassifier;
use waste_sorter::classification::preprocess::decode;
use waste_sorter::classification::{CapabilitySet, ClassificationPipeline};
use waste_sorter::domain::KnowledgeBase;
use waste_sorter::test_support::png_bytes;

#[traced_test]
#[test]
fn test_escalations_are_logged_per_tier() {
    let pipeline = ClassificationPipeline::new(CapabilitySet::absent());
    let image = decode(&png_bytes(4, 4, [0, 0, 0])).unwrap();
    let mut rng = StdRng::seed_from_u64(3);

    pipeline.run_with_rng(&image, "img_0001.png", &mut rng);

    assert!(logs_contain("tier escalated"));
    assert!(logs_contain("tier=\"custom_model\""));
    assert!(logs_contain("tier=\"filename_heuristic\""));
    assert!(logs_contain("image classified"));
}

#[traced_test]
#[test]
fn test_missing_knowledge_record_is_warned() {
    let classifier = WasteClassifier::new(
        CapabilitySet::absent(),
        Arc::new(KnowledgeBase::embedded().unwrap()),
    );

    classifier
        .classify_image(&png_bytes(4, 4, [0, 0, 0]), "used_syringe.jpg")
        .unwrap();

    assert!(logs_contain("no knowledge record; using placeholder"));
}
