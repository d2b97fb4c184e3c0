#![forbid(unsafe_code)]

use sammy_kernel_contracts::list::ListEntry;

/// Entries whose title or synonyms contain `search`, compared case-insensitively.
///
/// Single pass over `entries`: an entry matches when it contains the whole
/// search string or any one of its whitespace tokens. Order of `entries` is
/// preserved. A blank search matches nothing.
pub fn match_entries<'a>(entries: &'a [ListEntry], search: &str) -> Vec<&'a ListEntry> {
    let search = search.trim().to_lowercase();
    if search.is_empty() {
        return Vec::new();
    }
    entries
        .iter()
        .filter(|entry| {
            let title = entry.title.to_lowercase();
            let synonyms = entry.synonyms.to_lowercase();
            let hit = |needle: &str| title.contains(needle) || synonyms.contains(needle);
            hit(&search) || search.split_whitespace().any(hit)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sammy_kernel_contracts::query::MediaType;

    fn entry(title: &str, synonyms: &str) -> ListEntry {
        ListEntry {
            title: title.to_string(),
            synonyms: synonyms.to_string(),
            media_type: MediaType::Anime,
            status: None,
            score: None,
            progress: 0,
            series_total: 0,
            volumes_read: 0,
            series_volumes: 0,
        }
    }

    fn titles(found: Vec<&ListEntry>) -> Vec<&str> {
        found.into_iter().map(|e| e.title.as_str()).collect()
    }

    #[test]
    fn at_match_01_whole_string_is_case_insensitive() {
        let entries = [entry("Fullmetal Alchemist", ""), entry("Bleach", "")];
        assert_eq!(
            titles(match_entries(&entries, "fullmetal ALCHEMIST")),
            vec!["Fullmetal Alchemist"]
        );
    }

    #[test]
    fn at_match_02_synonyms_count() {
        let entries = [entry("Shingeki no Kyojin", "Attack on Titan; AoT")];
        assert_eq!(match_entries(&entries, "attack on titan").len(), 1);
    }

    #[test]
    fn at_match_03_any_token_matches_in_order() {
        let entries = [
            entry("One Piece", ""),
            entry("Monster", ""),
            entry("One Punch Man", ""),
        ];
        assert_eq!(
            titles(match_entries(&entries, "one thing")),
            vec!["One Piece", "One Punch Man"]
        );
    }

    #[test]
    fn at_match_04_blank_search_matches_nothing() {
        let entries = [entry("Monster", "")];
        assert!(match_entries(&entries, "  ").is_empty());
        assert!(match_entries(&entries, "naruto").is_empty());
    }
}
