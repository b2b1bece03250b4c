//! Shared building blocks of the similarity metric.
//!
//! Per-kind formulas live next to their element kinds; everything two or more kinds
//! share (name comparison, parent comparison, endpoint pairing, container weighting)
//! lives here as free functions.

use super::{ElementRef, Endpoint};

/// Weight of the name in [`nested_name_similarity`].
pub const NESTED_NAME_WEIGHT: f64 = 0.8;
/// Weight of the parent in [`nested_name_similarity`].
pub const NESTED_PARENT_WEIGHT: f64 = 0.2;
/// Weight of each endpoint in [`link_similarity`].
pub const LINK_ENDPOINT_WEIGHT: f64 = 0.5;

/// Which similarity to use when comparing neighbours such as relationship endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Local,
    Overall,
}

impl Depth {
    pub fn compare(self, a: &ElementRef<'_>, b: &ElementRef<'_>) -> f64 {
        match self {
            Depth::Local => a.local_similarity(b),
            Depth::Overall => a.overall_similarity(b),
        }
    }
}

pub fn clamp_unit(score: f64) -> f64 {
    if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) }
}

/// Edit distance between two strings, counted in characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            let deletion = previous[j + 1] + 1;
            let insertion = current[j] + 1;
            current[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Case-insensitive normalized edit-distance similarity.
///
/// `1 - distance / max_len`; two empty names are identical.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a == b {
        return 1.0;
    }

    let max_len = a.chars().count().max(b.chars().count());
    1.0 - levenshtein(&a, &b) as f64 / max_len as f64
}

/// Equality under the same case folding [`name_similarity`] uses.
pub fn equals_ignore_case(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// `1.0` when equal ignoring case, `0.0` otherwise.
pub fn equality(a: &str, b: &str) -> f64 {
    if equals_ignore_case(a, b) { 1.0 } else { 0.0 }
}

/// Similarity of the containers two elements sit in.
///
/// Both top-level is a full match, exactly one top-level is no match.
pub fn parent_similarity(a: &ElementRef<'_>, b: &ElementRef<'_>) -> f64 {
    match (a.parent(), b.parent()) {
        (None, None) => 1.0,
        (Some(pa), Some(pb)) => pa.local_similarity(&pb),
        _ => 0.0,
    }
}

/// Name plus parent, for named elements that can be nested in another element.
pub fn nested_name_similarity(a: &ElementRef<'_>, b: &ElementRef<'_>) -> f64 {
    NESTED_NAME_WEIGHT * name_similarity(a.name(), b.name())
        + NESTED_PARENT_WEIGHT * parent_similarity(a, b)
}

/// Best local similarity of `element` against any of `candidates`.
pub fn best_local_match(element: &ElementRef<'_>, candidates: &[ElementRef<'_>]) -> f64 {
    candidates
        .iter()
        .map(|candidate| element.local_similarity(candidate))
        .fold(0.0, f64::max)
}

/// Compares the endpoints of two relationships in both orientations and keeps the better one.
///
/// `score(a_source, a_target, b_first, b_second, reversed)` receives `b`'s endpoints
/// as `(source, target)` for the forward pass and `(target, source)` for the reversed pass.
pub fn best_orientation<F>(a: &ElementRef<'_>, b: &ElementRef<'_>, score: F) -> f64
where
    F: Fn(&Endpoint, &Endpoint, &Endpoint, &Endpoint, bool) -> f64,
{
    let (Some((a_source, a_target)), Some((b_source, b_target))) =
        (a.kind().endpoints(), b.kind().endpoints())
    else {
        return 0.0;
    };

    let forward = score(a_source, a_target, b_source, b_target, false);
    let reversed = score(a_source, a_target, b_target, b_source, true);
    forward.max(reversed)
}

/// Similarity of the elements two endpoints point at.
pub fn endpoint_similarity(
    a: &ElementRef<'_>,
    a_end: &Endpoint,
    b: &ElementRef<'_>,
    b_end: &Endpoint,
    depth: Depth,
) -> f64 {
    depth.compare(&a.resolve(a_end.element), &b.resolve(b_end.element))
}

/// Plain links that carry nothing but their endpoints.
pub fn link_similarity(a: &ElementRef<'_>, b: &ElementRef<'_>, depth: Depth) -> f64 {
    best_orientation(a, b, |a_source, a_target, b_first, b_second, _| {
        LINK_ENDPOINT_WEIGHT * endpoint_similarity(a, a_source, b, b_first, depth)
            + LINK_ENDPOINT_WEIGHT * endpoint_similarity(a, a_target, b, b_second, depth)
    })
}

/// Overall similarity of container elements (classes, objects).
///
/// The element and each of its children take one equal share, sized by the larger of
/// the two elements so a perfect score needs identical substructure counts. The side
/// with fewer elements drives the comparison; on equal counts both directions are
/// evaluated and the better one kept, so the result does not depend on argument order.
pub fn container_similarity(a: &ElementRef<'_>, b: &ElementRef<'_>) -> f64 {
    let a_count = a.children().len() + 1;
    let b_count = b.children().len() + 1;

    match a_count.cmp(&b_count) {
        std::cmp::Ordering::Greater => directed_container_similarity(b, a),
        std::cmp::Ordering::Less => directed_container_similarity(a, b),
        std::cmp::Ordering::Equal => {
            directed_container_similarity(a, b).max(directed_container_similarity(b, a))
        }
    }
}

fn directed_container_similarity(smaller: &ElementRef<'_>, larger: &ElementRef<'_>) -> f64 {
    let candidates = larger.children();
    let weight = 1.0 / (candidates.len() + 1) as f64;

    let own = weight * smaller.local_similarity(larger);
    let children: f64 = smaller
        .children()
        .iter()
        .map(|child| weight * best_local_match(child, &candidates))
        .sum();

    own + children
}
