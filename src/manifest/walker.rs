//! Manifest traversal: locating searchable regions and deriving crop URLs.

use std::fmt;

use crate::manifest::{Annotation, Canvas, Manifest};

/// Rectangular sub-region of a canvas, in canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Region {
    /// Parse the `#xywh=x,y,w,h` fragment of an annotation target.
    /// Returns `None` when the fragment is absent or not four integers.
    pub fn from_fragment(target: &str) -> Option<Self> {
        let (_, fragment) = target.split_once("#xywh=")?;
        let mut parts = fragment.split(',');
        let x = parts.next()?.parse().ok()?;
        let y = parts.next()?.parse().ok()?;
        let w = parts.next()?.parse().ok()?;
        let h = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { x, y, w, h })
    }

    /// Whether the region lies entirely within a canvas of the given size.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x.checked_add(self.w).is_some_and(|right| right <= width)
            && self.y.checked_add(self.h).is_some_and(|bottom| bottom <= height)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.w, self.h)
    }
}

/// Searchability policy: decides which annotation labels get indexed.
///
/// The default deployment indexes labels containing a keyword, but the
/// selection rule is injected so traversal stays policy-free.
pub trait Classifier: Send + Sync {
    fn is_searchable(&self, label: &str) -> bool;
}

impl<F> Classifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_searchable(&self, label: &str) -> bool {
        self(label)
    }
}

/// Case-insensitive substring match on the annotation label.
pub struct KeywordClassifier {
    keyword: String,
}

impl KeywordClassifier {
    pub fn new(keyword: &str) -> Self {
        Self {
            keyword: keyword.to_lowercase(),
        }
    }
}

impl Classifier for KeywordClassifier {
    fn is_searchable(&self, label: &str) -> bool {
        label.to_lowercase().contains(&self.keyword)
    }
}

/// One indexable region found during traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchableRegion {
    pub canvas_id: String,
    pub annotation_id: String,
    pub label: String,
    pub region: Region,
    pub crop_url: String,
}

/// Walk a manifest and yield every searchable region.
///
/// Re-traversal of the same manifest yields the same sequence. Canvases
/// without a painting annotation are skipped with a warning; commenting
/// annotations without an `#xywh=` target fragment are skipped silently.
pub fn searchable_regions<'a>(
    manifest: &'a Manifest,
    classifier: &'a dyn Classifier,
) -> impl Iterator<Item = SearchableRegion> + 'a {
    manifest
        .items
        .iter()
        .flat_map(move |canvas| canvas_regions(canvas, classifier))
}

fn canvas_regions<'a>(
    canvas: &'a Canvas,
    classifier: &'a dyn Classifier,
) -> Box<dyn Iterator<Item = SearchableRegion> + 'a> {
    let service_base = match painting_service_base(canvas) {
        Some(base) => base,
        None => {
            tracing::warn!(
                canvas = %canvas.id,
                "no painting annotation with an image service; skipping canvas"
            );
            return Box::new(std::iter::empty());
        }
    };

    let iter = canvas
        .annotations
        .iter()
        .flat_map(|page| page.items.iter())
        .filter_map(move |annotation| {
            annotation_region(canvas, &service_base, annotation, classifier)
        });
    Box::new(iter)
}

/// Image-service base URL from the canvas's painting annotation.
fn painting_service_base(canvas: &Canvas) -> Option<String> {
    canvas
        .items
        .iter()
        .flat_map(|page| page.items.iter())
        .find(|annotation| annotation.motivation == "painting")
        .and_then(|annotation| annotation.body.service.first())
        .map(|service| service.id.trim_end_matches('/').to_string())
}

fn annotation_region(
    canvas: &Canvas,
    service_base: &str,
    annotation: &Annotation,
    classifier: &dyn Classifier,
) -> Option<SearchableRegion> {
    if annotation.motivation != "commenting" || annotation.body.kind != "TextualBody" {
        return None;
    }
    let label = annotation.body.value.as_deref()?;
    if !classifier.is_searchable(label) {
        return None;
    }

    let region = match Region::from_fragment(&annotation.target) {
        Some(region) => region,
        None => {
            tracing::debug!(
                annotation = %annotation.id,
                "target has no #xywh fragment; cannot derive a crop"
            );
            return None;
        }
    };
    if !region.fits_within(canvas.width, canvas.height) {
        tracing::warn!(
            annotation = %annotation.id,
            region = %region,
            "region exceeds canvas bounds; skipping"
        );
        return None;
    }

    Some(SearchableRegion {
        canvas_id: canvas.id.clone(),
        annotation_id: annotation.id.clone(),
        label: label.to_string(),
        region,
        crop_url: format!("{service_base}/{region}/max/0/default.jpg"),
    })
}
