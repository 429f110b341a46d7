//! Keyword and phrase normalization
//!
//! Every keyword that enters the taxonomy or a generated keyword set goes
//! through [`normalize_keyword`], so equality checks across the pipeline are
//! case-insensitive and whitespace-insensitive.

use std::collections::HashSet;

/// Trailing corporate designators stripped when deriving phrases from a
/// business name. Longer variants first.
const NAME_SUFFIXES: &[&str] = &[
    "limited", "ltd.", "ltd", "llp", "plc", "inc.", "inc", "llc", "& co", "and co", "co.", "co",
    "group", "uk",
];

/// Lowercase, trim, and collapse internal whitespace.
pub fn normalize_keyword(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase()
}

/// Collapse whitespace without changing case.
pub fn clean_text(raw: &str) -> String {
    raw.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Number of whitespace-separated words.
pub fn word_count(phrase: &str) -> usize {
    phrase.split_whitespace().count()
}

/// Remove duplicates (after normalization) keeping the first occurrence.
pub fn dedup_normalized<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let normalized = normalize_keyword(item.as_ref());
        if normalized.is_empty() {
            continue;
        }
        if seen.insert(normalized.clone()) {
            out.push(normalized);
        }
    }
    out
}

/// Push `value` onto `list` unless an equal value (case-insensitive) is
/// already there. Keeps the original casing of the first occurrence.
pub fn push_unique(list: &mut Vec<String>, value: &str) -> bool {
    let value = clean_text(value);
    if value.is_empty() {
        return false;
    }
    let key = value.to_lowercase();
    if list.iter().any(|existing| existing.to_lowercase() == key) {
        return false;
    }
    list.push(value);
    true
}

/// Strip corporate suffixes from a business name and lowercase it.
///
/// "Harbour Plumbing Ltd" -> "harbour plumbing"
pub fn strip_business_suffixes(name: &str) -> String {
    let mut normalized = normalize_keyword(name);
    loop {
        let before = normalized.len();
        for suffix in NAME_SUFFIXES {
            if let Some(stripped) = normalized.strip_suffix(suffix) {
                if stripped.is_empty() || stripped.ends_with(' ') || stripped.ends_with(',') {
                    normalized = stripped.trim_end_matches([' ', ',']).to_string();
                    break;
                }
            }
        }
        if normalized.len() == before {
            break;
        }
    }
    normalized
}

/// Guess a business name from a domain: "www.harbour-plumbing.co.uk" -> "Harbour Plumbing".
pub fn name_from_domain(domain: &str) -> String {
    let host = domain
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let label = host.split('.').next().unwrap_or_default();

    label
        .split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_keyword() {
        assert_eq!(normalize_keyword("  Family   Law  "), "family law");
        assert_eq!(normalize_keyword("DIVORCE\tSolicitors\n"), "divorce solicitors");
        assert_eq!(normalize_keyword("   "), "");
    }

    #[test]
    fn test_dedup_normalized_keeps_first() {
        let out = dedup_normalized(["Plumber", "plumber ", "Boiler Repair", "PLUMBER"]);
        assert_eq!(out, vec!["plumber", "boiler repair"]);
    }

    #[test]
    fn test_push_unique_is_case_insensitive() {
        let mut list = vec!["Family Law".to_string()];
        assert!(!push_unique(&mut list, "family  law"));
        assert!(push_unique(&mut list, "Commercial Law"));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_strip_business_suffixes() {
        assert_eq!(strip_business_suffixes("Harbour Plumbing Ltd"), "harbour plumbing");
        assert_eq!(strip_business_suffixes("Smith & Jones Solicitors LLP"), "smith & jones solicitors");
        assert_eq!(strip_business_suffixes("Acme Group Limited"), "acme");
        assert_eq!(strip_business_suffixes("Costco"), "costco");
    }

    #[test]
    fn test_name_from_domain() {
        assert_eq!(name_from_domain("www.harbour-plumbing.co.uk"), "Harbour Plumbing");
        assert_eq!(name_from_domain("https://acme.com/about"), "Acme");
    }
}
