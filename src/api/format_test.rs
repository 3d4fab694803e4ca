//! Tests for IIIF Search API response formatting

#[cfg(test)]
mod tests {
    use super::super::format::*;
    use crate::storage::{PointPayload, SearchHit};
    use proptest::prelude::*;

    fn hit(canvas_id: &str, xywh: &str, label: &str, thumbnail_url: &str) -> SearchHit {
        SearchHit {
            score: 0.9,
            payload: PointPayload {
                canvas_id: canvas_id.to_string(),
                annotation_id: format!("{canvas_id}/annotation/a"),
                label: label.to_string(),
                xywh: xywh.to_string(),
                thumbnail_url: thumbnail_url.to_string(),
                manifest_id: "https://example.org/manifest.json".to_string(),
            },
        }
    }

    #[test]
    fn resources_carry_target_label_and_thumbnail() {
        let hits = vec![hit(
            "C1",
            "10,10,50,50",
            "photograph: dog",
            "https://img/svc/10,10,50,50/max/0/default.jpg",
        )];
        let list = format_annotation_list(
            "http://localhost:5001/search?q=dog",
            "http://localhost:5001/search",
            &hits,
        );

        assert_eq!(list.resources.len(), 1);
        let resource = &list.resources[0];
        assert_eq!(resource.on, "C1#xywh=10,10,50,50");
        assert_eq!(resource.resource.chars, "photograph: dog");
        assert_eq!(
            resource.thumbnail.as_deref(),
            Some("https://img/svc/10,10,50,50/max/0/default.jpg")
        );
    }

    #[test]
    fn annotation_ids_are_rank_ordered() {
        let hits = vec![
            hit("C1", "0,0,10,10", "a", ""),
            hit("C2", "0,0,10,10", "b", ""),
        ];
        let list = format_annotation_list("u", "http://localhost:5001/search", &hits);

        assert_eq!(list.resources[0].id, "http://localhost:5001/search/anno/0");
        assert_eq!(list.resources[1].id, "http://localhost:5001/search/anno/1");
        assert_eq!(list.hits[0].annotations[0], list.resources[0].id);
        assert_eq!(list.hits[1].annotations[0], list.resources[1].id);
    }

    #[test]
    fn empty_thumbnail_is_omitted() {
        let hits = vec![hit("C1", "0,0,10,10", "a", "")];
        let list = format_annotation_list("u", "b", &hits);
        assert!(list.resources[0].thumbnail.is_none());

        let value = serde_json::to_value(&list).unwrap();
        assert!(value["resources"][0].get("thumbnail").is_none());
    }

    #[test]
    fn serialized_document_uses_iiif_vocabulary() {
        let hits = vec![hit("C1", "10,10,50,50", "photograph: dog", "t")];
        let list = format_annotation_list("http://localhost:5001/search?q=dog", "b", &hits);
        let value = serde_json::to_value(&list).unwrap();

        assert_eq!(value["@type"], "sc:AnnotationList");
        assert_eq!(value["@id"], "http://localhost:5001/search?q=dog");
        assert_eq!(value["@context"][0], PRESENTATION_CONTEXT);
        assert_eq!(value["@context"][1], SEARCH_CONTEXT);
        assert_eq!(value["within"]["@type"], "sc:Layer");
        assert_eq!(value["resources"][0]["@type"], "oa:Annotation");
        assert_eq!(value["resources"][0]["motivation"], "sc:painting");
        assert_eq!(value["resources"][0]["resource"]["@type"], "cnt:ContentAsText");
        assert_eq!(value["hits"][0]["@type"], "search:Hit");
    }

    #[test]
    fn empty_term_list_stub() {
        let terms = TermList::empty("http://localhost:5001/search/autocomplete");
        let value = serde_json::to_value(&terms).unwrap();
        assert_eq!(value["@type"], "search:TermList");
        assert_eq!(value["terms"].as_array().unwrap().len(), 0);
    }

    proptest! {
        /// Every formatted response keeps resources, hits, and the total in
        /// lockstep, whatever the hit sequence looks like.
        #[test]
        fn resources_hits_and_total_agree(labels in prop::collection::vec("[a-z ]{0,30}", 0..25)) {
            let hits: Vec<_> = labels
                .iter()
                .map(|label| hit("C1", "0,0,1,1", label, ""))
                .collect();
            let list = format_annotation_list("u", "b", &hits);

            prop_assert_eq!(list.resources.len(), hits.len());
            prop_assert_eq!(list.hits.len(), hits.len());
            prop_assert_eq!(list.within.total, hits.len());
        }
    }
}
