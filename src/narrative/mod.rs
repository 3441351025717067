/// Shared narrative taxonomy (SPEC_FULL.md §4.7 signal 3 `timing_sync`,
/// §4.9 "Factory rhythm" / "Narrative timing"): a fixed keyword→category
/// table, with an "other" default bucket.
const CATEGORIES: &[(&str, &[&str])] = &[
    ("pepe", &["pepe"]),
    ("doge", &["doge", "shib"]),
    ("inu", &["inu"]),
    ("ai", &["ai", "gpt", "agent"]),
    ("trump", &["trump", "maga"]),
    ("elon", &["elon", "musk"]),
    ("cat", &["cat", "kitty", "neko"]),
    ("anime", &["anime", "waifu", "chan"]),
];

/// Classifies a token name/symbol into a narrative category; falls back to
/// `"other"` when no keyword matches.
pub fn classify(name: &str, symbol: &str) -> String {
    let haystack = format!("{} {}", name, symbol).to_lowercase();
    for (category, keywords) in CATEGORIES {
        if keywords.iter().any(|kw| haystack.contains(kw)) {
            return category.to_string();
        }
    }
    "other".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_keyword() {
        assert_eq!(classify("Baby Pepe Coin", "BPEPE"), "pepe");
    }

    #[test]
    fn falls_back_to_other() {
        assert_eq!(classify("Generic Token", "GEN"), "other");
    }
}
