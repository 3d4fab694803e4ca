//! IIIF manifest schema and traversal

pub mod document;
pub mod walker;

pub use document::{Annotation, AnnotationBody, AnnotationPage, Canvas, ImageService, Manifest};
pub use walker::{searchable_regions, Classifier, KeywordClassifier, Region, SearchableRegion};

#[cfg(test)]
mod walker_test;
