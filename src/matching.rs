//! Closeness measures between a query term and an indexed term.

/// Relevance of a prefix match with closeness 0. An exact match reaches 1.
const PREFIX_BASE_RELEVANCE: f64 = 0.5;

/// `shorter / longer` (in chars) when one term is a prefix of the other.
pub fn prefix_closeness(query: &str, term: &str) -> Option<f64> {
    let (shorter, longer) = if query.len() <= term.len() {
        (query, term)
    } else {
        (term, query)
    };
    if shorter.is_empty() || !longer.starts_with(shorter) {
        return None;
    }
    Some(shorter.chars().count() as f64 / longer.chars().count() as f64)
}

/// Edit distance over chars.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
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
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Edit distance normalized by the longer term, in `[0, 1]`.
pub fn fuzzy_divergence(query: &str, term: &str) -> f64 {
    let longest = query.chars().count().max(term.chars().count());
    if longest == 0 {
        return 0.0;
    }
    levenshtein_distance(query, term) as f64 / longest as f64
}

/// Match quality of `term` for `query` in `[0, 1]`; 0 means no match.
///
/// A prefix match is accepted when its closeness reaches `prefix_threshold`
/// and a fuzzy match when its divergence stays within `fuzzy_threshold`.
/// The better of the accepted candidates wins.
pub fn relevance_coefficient(
    query: &str,
    term: &str,
    prefix_threshold: f64,
    fuzzy_threshold: f64,
) -> f64 {
    if query.is_empty() || term.is_empty() {
        return 0.0;
    }
    if query == term {
        return 1.0;
    }

    let mut relevance: f64 = 0.0;
    if let Some(closeness) = prefix_closeness(query, term) {
        if closeness >= prefix_threshold {
            relevance = PREFIX_BASE_RELEVANCE + (1.0 - PREFIX_BASE_RELEVANCE) * closeness;
        }
    }
    let divergence = fuzzy_divergence(query, term);
    if divergence <= fuzzy_threshold {
        relevance = relevance.max(1.0 - divergence);
    }
    relevance
}
