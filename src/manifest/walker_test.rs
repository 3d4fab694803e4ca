//! Tests for manifest traversal and region derivation

#[cfg(test)]
mod tests {
    use super::super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn manifest_with_annotation(label: &str, target: &str) -> Manifest {
        let doc = json!({
            "@context": "http://iiif.io/api/presentation/3/context.json",
            "id": "https://example.org/manifest.json",
            "type": "Manifest",
            "items": [{
                "id": "C1",
                "type": "Canvas",
                "width": 1000,
                "height": 800,
                "items": [{
                    "id": "C1/annotation/page",
                    "type": "AnnotationPage",
                    "items": [{
                        "id": "C1/annotation/image",
                        "type": "Annotation",
                        "motivation": "painting",
                        "body": {
                            "id": "https://img/svc/full/max/0/default.jpg",
                            "type": "Image",
                            "format": "image/jpeg",
                            "service": [{
                                "id": "https://img/svc",
                                "type": "ImageService2",
                                "profile": "level1"
                            }],
                            "width": 1000,
                            "height": 800
                        },
                        "target": "C1"
                    }]
                }],
                "annotations": [{
                    "id": "C1/annotations",
                    "type": "AnnotationPage",
                    "items": [{
                        "id": "C1/annotation/5a787182-2dbd-42eb-98e2-a8c1e224e04e",
                        "type": "Annotation",
                        "motivation": "commenting",
                        "body": {
                            "type": "TextualBody",
                            "value": label,
                            "format": "text/plain"
                        },
                        "target": target
                    }]
                }]
            }]
        });
        Manifest::parse(&doc.to_string()).unwrap()
    }

    #[test]
    fn finds_searchable_region_and_derives_crop_url() {
        let manifest = manifest_with_annotation("photograph: dog", "C1#xywh=10,10,50,50");
        let classifier = KeywordClassifier::new("photograph");

        let regions: Vec<_> = searchable_regions(&manifest, &classifier).collect();
        assert_eq!(regions.len(), 1);

        let region = &regions[0];
        assert_eq!(region.canvas_id, "C1");
        assert_eq!(region.label, "photograph: dog");
        assert_eq!(region.region, Region { x: 10, y: 10, w: 50, h: 50 });
        assert_eq!(region.crop_url, "https://img/svc/10,10,50,50/max/0/default.jpg");
    }

    #[test]
    fn traversal_is_restartable() {
        let manifest = manifest_with_annotation("photograph: dog", "C1#xywh=10,10,50,50");
        let classifier = KeywordClassifier::new("photograph");

        let first: Vec<_> = searchable_regions(&manifest, &classifier).collect();
        let second: Vec<_> = searchable_regions(&manifest, &classifier).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn non_matching_label_is_not_searchable() {
        let manifest = manifest_with_annotation("signature: illegible", "C1#xywh=10,10,50,50");
        let classifier = KeywordClassifier::new("photograph");
        assert_eq!(searchable_regions(&manifest, &classifier).count(), 0);
    }

    #[test]
    fn keyword_classifier_is_case_insensitive() {
        let classifier = KeywordClassifier::new("Photograph");
        assert!(classifier.is_searchable("PHOTOGRAPH: dog"));
        assert!(classifier.is_searchable("a photograph of a cat"));
        assert!(!classifier.is_searchable("drawing: dog"));
    }

    #[test]
    fn closures_are_valid_classifiers() {
        let manifest = manifest_with_annotation("signature: illegible", "C1#xywh=10,10,50,50");
        let accept_all = |_: &str| true;
        assert_eq!(searchable_regions(&manifest, &accept_all).count(), 1);
    }

    #[test]
    fn target_without_fragment_is_skipped() {
        let manifest = manifest_with_annotation("photograph: dog", "C1");
        let classifier = KeywordClassifier::new("photograph");
        assert_eq!(searchable_regions(&manifest, &classifier).count(), 0);
    }

    #[test]
    fn region_exceeding_canvas_bounds_is_skipped() {
        // 990 + 50 > canvas width 1000
        let manifest = manifest_with_annotation("photograph: dog", "C1#xywh=990,10,50,50");
        let classifier = KeywordClassifier::new("photograph");
        assert_eq!(searchable_regions(&manifest, &classifier).count(), 0);
    }

    #[test]
    fn canvas_without_painting_annotation_is_skipped() {
        let doc = json!({
            "id": "https://example.org/manifest.json",
            "type": "Manifest",
            "items": [{
                "id": "C1",
                "type": "Canvas",
                "width": 1000,
                "height": 800,
                "items": [],
                "annotations": [{
                    "id": "C1/annotations",
                    "type": "AnnotationPage",
                    "items": [{
                        "id": "C1/annotation/a",
                        "type": "Annotation",
                        "motivation": "commenting",
                        "body": { "type": "TextualBody", "value": "photograph: dog" },
                        "target": "C1#xywh=10,10,50,50"
                    }]
                }]
            }]
        });
        let manifest = Manifest::parse(&doc.to_string()).unwrap();
        let classifier = KeywordClassifier::new("photograph");
        assert_eq!(searchable_regions(&manifest, &classifier).count(), 0);
    }

    #[test]
    fn region_fragment_parsing() {
        assert_eq!(
            Region::from_fragment("C1#xywh=10,20,30,40"),
            Some(Region { x: 10, y: 20, w: 30, h: 40 })
        );
        assert_eq!(Region::from_fragment("C1"), None);
        assert_eq!(Region::from_fragment("C1#xywh=10,20,30"), None);
        assert_eq!(Region::from_fragment("C1#xywh=10,20,30,40,50"), None);
        assert_eq!(Region::from_fragment("C1#xywh=-1,20,30,40"), None);
        assert_eq!(Region::from_fragment("C1#xywh=a,b,c,d"), None);
    }

    #[test]
    fn manifest_parse_rejects_wrong_document_type() {
        let doc = json!({ "id": "x", "type": "Collection", "items": [] });
        let err = Manifest::parse(&doc.to_string()).unwrap_err();
        assert!(err.to_string().contains("Manifest"));
    }

    #[test]
    fn manifest_parse_rejects_zero_sized_canvas() {
        let doc = json!({
            "id": "x",
            "type": "Manifest",
            "items": [{ "id": "C1", "type": "Canvas", "width": 0, "height": 800 }]
        });
        assert!(Manifest::parse(&doc.to_string()).is_err());
    }

    #[test]
    fn manifest_parse_rejects_invalid_json() {
        assert!(Manifest::parse("{not json").is_err());
    }

    #[test]
    fn manifest_roundtrip_preserves_unmodelled_fields() {
        let doc = json!({
            "@context": "http://iiif.io/api/presentation/3/context.json",
            "id": "https://example.org/manifest.json",
            "type": "Manifest",
            "label": { "en": ["Generated Manifest from CSV"] },
            "items": []
        });
        let manifest = Manifest::parse(&doc.to_string()).unwrap();
        let round_tripped: serde_json::Value =
            serde_json::to_value(&manifest).unwrap();
        assert_eq!(round_tripped["label"]["en"][0], "Generated Manifest from CSV");
        assert_eq!(
            round_tripped["@context"],
            "http://iiif.io/api/presentation/3/context.json"
        );
    }

    proptest! {
        #[test]
        fn region_fragment_roundtrip(
            x in 0u32..10_000,
            y in 0u32..10_000,
            w in 0u32..10_000,
            h in 0u32..10_000,
        ) {
            let target = format!("C1#xywh={x},{y},{w},{h}");
            let region = Region::from_fragment(&target);
            prop_assert_eq!(region, Some(Region { x, y, w, h }));
            prop_assert_eq!(region.unwrap().to_string(), format!("{x},{y},{w},{h}"));
        }
    }
}
