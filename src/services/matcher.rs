use crate::models::KnowledgeBase;

pub const DEFAULT_THRESHOLD: f64 = 0.78;

/// Case-insensitive positional similarity in `[0, 1]`: characters equal at
/// the same index, over the longer length.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    let matches = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    matches as f64 / longest as f64
}

/// Highest-scoring candidate if it reaches `threshold`. Ties go to the
/// earlier candidate.
pub fn best_match<'a, I>(value: &str, candidates: I, threshold: f64) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, f64)> = None;
    for candidate in candidates {
        let score = similarity(value, candidate);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((candidate, score));
        }
    }
    best.filter(|(_, score)| *score >= threshold)
        .map(|(candidate, _)| candidate)
}

pub fn fuzzy_service<'a>(value: &str, kb: &'a KnowledgeBase) -> Option<&'a str> {
    best_match(value.trim(), kb.service_names(), DEFAULT_THRESHOLD)
}

pub fn fuzzy_location<'a>(value: &str, kb: &'a KnowledgeBase) -> Option<&'a str> {
    best_match(value.trim(), kb.location_names(), DEFAULT_THRESHOLD)
}

/// Guesses a service from an unprompted message: a catalog name containing
/// the message ("dental"), then a message containing a catalog name ("I want
/// a dental cleaning"), then similarity scoring.
pub fn infer_service<'a>(text: &str, kb: &'a KnowledgeBase) -> Option<&'a str> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    let names = kb.service_names();
    names
        .iter()
        .find(|n| n.to_lowercase().contains(&needle))
        .or_else(|| names.iter().find(|n| needle.contains(&n.to_lowercase())))
        .copied()
        .or_else(|| best_match(&needle, names.iter().copied(), DEFAULT_THRESHOLD))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_is_positional() {
        assert_eq!(similarity("Orchard", "orchard"), 1.0);
        assert_eq!(similarity("abcd", "abxd"), 0.75);
        assert_eq!(similarity("abc", "abcdef"), 0.5);
        // A single insertion shifts every later position.
        assert!(similarity("dentl cleening", "Dental Cleaning") < 0.4);
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("", "abc"), 0.0);
    }

    #[test]
    fn test_best_match_rejects_distant_typo() {
        let candidates = ["Dental Cleaning", "Vaccination"];
        assert_eq!(best_match("dentl cleening", candidates, 0.78), None);
        assert_eq!(best_match("dental cleanin", candidates, 0.78), Some("Dental Cleaning"));
    }

    #[test]
    fn test_threshold_boundary() {
        let candidate = "a".repeat(100);
        let at = format!("{}{}", "a".repeat(78), "b".repeat(22));
        let below = format!("{}{}", "a".repeat(77), "b".repeat(23));

        assert_eq!(similarity(&at, &candidate), 0.78);
        assert_eq!(best_match(&at, [candidate.as_str()], 0.78), Some(candidate.as_str()));
        assert_eq!(similarity(&below, &candidate), 0.77);
        assert_eq!(best_match(&below, [candidate.as_str()], 0.78), None);
    }

    #[test]
    fn test_ties_go_to_first_candidate() {
        assert_eq!(best_match("abcx", ["abcy", "abcz"], 0.5), Some("abcy"));
    }

    #[test]
    fn test_fuzzy_location() {
        let kb = KnowledgeBase::default_clinic();
        assert_eq!(fuzzy_location("tampine", &kb), Some("Tampines"));
        assert_eq!(fuzzy_location("Orchrd", &kb), None);
    }

    #[test]
    fn test_infer_service() {
        let kb = KnowledgeBase::default_clinic();
        assert_eq!(infer_service("dental", &kb), Some("Dental Cleaning"));
        assert_eq!(infer_service("I want a dental cleaning", &kb), Some("Dental Cleaning"));
        assert_eq!(infer_service("vaccinatiun", &kb), Some("Vaccination"));
        assert_eq!(infer_service("what time do you open?", &kb), None);
        assert_eq!(infer_service("yes", &kb), None);
        assert_eq!(infer_service("   ", &kb), None);
    }
}
