use crate::catalog::PageCatalog;
use crate::error::{ResolverError, Result};
use crate::normalize::{fold_label, similarity, MatchThresholds};
use sitelink_protocol::page_paths::{last_segment, normalize_page_path};
use sitelink_protocol::{Page, PageRef, ResolutionMethod};

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub page_id: String,
    pub method: ResolutionMethod,
    /// Ratio that accepted a fuzzy match.
    pub similarity: Option<f64>,
}

/// Resolves symbolic references against one catalog snapshot.
///
/// Rules are tried in order and the first hit wins:
/// exact path, exact label, fuzzy label, path last segment.
#[derive(Debug, Clone)]
pub struct PageResolver {
    catalog: PageCatalog,
    thresholds: MatchThresholds,
}

impl PageResolver {
    pub fn new(catalog: PageCatalog, thresholds: MatchThresholds) -> Self {
        Self {
            catalog,
            thresholds,
        }
    }

    pub fn catalog(&self) -> &PageCatalog {
        &self.catalog
    }

    pub fn resolve(&self, reference: &PageRef) -> Result<Resolution> {
        if reference.is_empty() {
            return Err(ResolverError::EmptyReference);
        }

        let label = reference.label_str();
        let path = reference.path_str();

        if let Some(page) = path.and_then(|p| self.by_exact_path(p)) {
            log::debug!("[resolve] path match {reference} -> {}", page.id);
            return Ok(resolved(page, ResolutionMethod::PathExact, None));
        }

        if let Some(page) = label.and_then(|l| self.by_exact_label(l)) {
            log::debug!("[resolve] label match {reference} -> {}", page.id);
            return Ok(resolved(page, ResolutionMethod::LabelExact, None));
        }

        let mut best_similarity = None;
        if let Some(label) = label {
            if let Some((page, ratio)) = self.best_fuzzy(label) {
                if ratio >= self.thresholds.fuzzy_accept {
                    log::debug!(
                        "[resolve] fuzzy match {reference} -> {} (sim {ratio:.2})",
                        page.id
                    );
                    return Ok(resolved(page, ResolutionMethod::LabelFuzzy, Some(ratio)));
                }
                log::debug!(
                    "[resolve] low fuzzy similarity for '{label}': best {ratio:.2} < {:.2}",
                    self.thresholds.fuzzy_accept
                );
                best_similarity = Some(ratio);
            }
        }

        if let Some(page) = path.and_then(|p| self.by_last_segment(p)) {
            log::debug!("[resolve] last-segment match {reference} -> {}", page.id);
            return Ok(resolved(page, ResolutionMethod::PathLastSegment, None));
        }

        Err(ResolverError::Unresolved {
            reference: reference.to_string(),
            best_similarity,
        })
    }

    fn by_exact_path(&self, path: &str) -> Option<&Page> {
        let normalized = normalize_page_path(path);
        if normalized.is_empty() {
            return None;
        }
        self.catalog.find_by_path(&normalized)
    }

    fn by_exact_label(&self, label: &str) -> Option<&Page> {
        let needle = fold_label(label);
        if needle.is_empty() {
            return None;
        }
        self.catalog
            .pages()
            .iter()
            .find(|page| fold_label(&page.grouping_label) == needle)
    }

    /// Best fuzzy candidate over grouping labels and display names; earlier pages win ties.
    fn best_fuzzy(&self, label: &str) -> Option<(&Page, f64)> {
        let mut best: Option<(&Page, f64)> = None;
        for page in self.catalog.pages() {
            for target in [&page.grouping_label, &page.display_name] {
                let ratio = similarity(label, target);
                if ratio > best.map_or(0.0, |(_, r)| r) {
                    best = Some((page, ratio));
                }
            }
        }
        best
    }

    fn by_last_segment(&self, path: &str) -> Option<&Page> {
        let needle = last_segment(path).to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.catalog
            .pages()
            .iter()
            .find(|page| last_segment(&page.path).to_lowercase() == needle)
    }
}

fn resolved(page: &Page, method: ResolutionMethod, similarity: Option<f64>) -> Resolution {
    Resolution {
        page_id: page.id.clone(),
        method,
        similarity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn page(id: &str, name: &str, label: &str, path: &str) -> Page {
        Page {
            id: id.to_string(),
            display_name: name.to_string(),
            grouping_label: label.to_string(),
            path: path.to_string(),
            intent: None,
        }
    }

    fn resolver() -> PageResolver {
        let catalog = PageCatalog::new(vec![
            page("p1", "Laptopy", "laptopy", "/laptopy/"),
            page("p2", "Laptopy do gier", "laptopy-gaming", "/laptopy/gaming/"),
            page("p3", "Laptopy biurowe", "laptopy biurowe", "/laptopy/biurowe/"),
            page("p4", "Karty graficzne", "karty graficzne", "/podzespoly/karty-graficzne/"),
        ])
        .unwrap();
        PageResolver::new(catalog, MatchThresholds::default())
    }

    #[test]
    fn exact_path_ignores_slashes() {
        let res = resolver().resolve(&PageRef::path("laptopy/gaming")).unwrap();
        assert_eq!(res.page_id, "p2");
        assert_eq!(res.method, ResolutionMethod::PathExact);
    }

    #[test]
    fn path_rule_runs_before_label_rule() {
        let reference = PageRef::new(Some("laptopy biurowe"), Some("/laptopy/gaming/"));
        let res = resolver().resolve(&reference).unwrap();
        assert_eq!(res.page_id, "p2");
        assert_eq!(res.method, ResolutionMethod::PathExact);
    }

    #[test]
    fn exact_label_is_case_insensitive() {
        let res = resolver().resolve(&PageRef::label("Laptopy Biurowe")).unwrap();
        assert_eq!(res.page_id, "p3");
        assert_eq!(res.method, ResolutionMethod::LabelExact);
    }

    #[test]
    fn exact_label_ignores_surrounding_whitespace() {
        let res = resolver().by_exact_label("  Laptopy Biurowe\t").map(|page| page.id.clone());
        assert_eq!(res.as_deref(), Some("p3"));
        assert!(resolver().by_exact_label("   ").is_none());
    }

    #[test]
    fn fuzzy_label_accepts_dropped_filler_word() {
        let catalog = PageCatalog::new(vec![page(
            "kawa",
            "Ekspresy do kawy",
            "ekspresy do kawy",
            "/agd/ekspresy/",
        )])
        .unwrap();
        let res = PageResolver::new(catalog, MatchThresholds::default())
            .resolve(&PageRef::label("Ekspresy kawa"))
            .unwrap();
        assert_eq!(res.page_id, "kawa");
        assert_eq!(res.method, ResolutionMethod::LabelFuzzy);
        assert!((res.similarity.unwrap() - 24.0 / 29.0).abs() < 1e-9);
    }

    #[test]
    fn fuzzy_label_resolves_separator_variants() {
        let res = resolver().resolve(&PageRef::label("Laptopy Gaming")).unwrap();
        assert_eq!(res.page_id, "p2");
        assert_eq!(res.method, ResolutionMethod::LabelFuzzy);
        assert!(res.similarity.unwrap() >= 0.80);
    }

    #[test]
    fn fuzzy_label_matches_display_names() {
        let res = resolver().resolve(&PageRef::label("laptopy do gie")).unwrap();
        assert_eq!(res.page_id, "p2");
        assert_eq!(res.method, ResolutionMethod::LabelFuzzy);
    }

    #[test]
    fn last_segment_is_the_final_fallback() {
        let reference = PageRef::new(Some("zupełnie inna nazwa"), Some("/stare/Karty-Graficzne/"));
        let res = resolver().resolve(&reference).unwrap();
        assert_eq!(res.page_id, "p4");
        assert_eq!(res.method, ResolutionMethod::PathLastSegment);
    }

    #[test]
    fn unmatched_reference_reports_best_similarity() {
        let err = resolver()
            .resolve(&PageRef::label("ekspresy do kawy"))
            .unwrap_err();
        match err {
            ResolverError::Unresolved {
                reference,
                best_similarity,
            } => {
                assert!(reference.contains("ekspresy do kawy"));
                assert!(best_similarity.unwrap_or(0.0) < 0.80);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_reference_is_rejected() {
        let err = resolver().resolve(&PageRef::default()).unwrap_err();
        assert_eq!(err, ResolverError::EmptyReference);
    }

    proptest! {
        #[test]
        fn resolution_is_idempotent(label in "[a-z -]{0,24}", path in "[a-z/]{0,24}") {
            let resolver = resolver();
            let reference = PageRef::new(Some(&label), Some(&path));
            let first = resolver.resolve(&reference);
            let second = resolver.resolve(&reference);
            prop_assert_eq!(first, second);
        }
    }
}
