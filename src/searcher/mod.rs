use std::fmt;

use clap::ValueEnum;
use rayon::prelude::*;

use crate::indexer::schema::Comic;
use crate::indexer::store::IndexStore;

/// Ways a search can fail. Every field a search can target is indexed, so
/// there are none yet; zero matches is not one of them.
#[derive(Debug)]
pub enum SearchError {}

impl fmt::Display for SearchError {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl std::error::Error for SearchError {}

/// Which part of a comic a search phrase is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SearchField {
    #[default]
    Transcript,
    Title,
    Alt,
    /// Transcript, title or alt text.
    Any,
}

impl SearchField {
    fn matches(self, comic: &Comic, phrase: &str) -> bool {
        match self {
            SearchField::Transcript => comic.transcript.contains(phrase),
            SearchField::Title => comic.title.contains(phrase),
            SearchField::Alt => comic.alt.contains(phrase),
            SearchField::Any => {
                comic.transcript.contains(phrase) || comic.title.contains(phrase) || comic.alt.contains(phrase)
            }
        }
    }
}

/// Returns every indexed comic whose `field` contains `phrase`, case-sensitively, ordered by number.
///
/// No matches, including searching an empty index, is an empty list.
pub fn search<'a>(store: &'a IndexStore, phrase: &str, field: SearchField) -> Result<Vec<&'a Comic>, SearchError> {
    let all: Vec<&Comic> = store.comics().collect();
    let mut hits: Vec<&Comic> = all
        .into_par_iter()
        .filter(|comic| field.matches(comic, phrase))
        .collect();

    hits.sort_by_key(|comic| comic.num);
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::schema::sample;

    fn store() -> IndexStore {
        let mut store = IndexStore::new("unused.json");
        store.insert(sample(1, "a cat sat"));
        store.insert(sample(2, "a dog ran"));
        store.insert(sample(3, "no match here"));
        store
    }

    fn nums(hits: &[&Comic]) -> Vec<u32> {
        hits.iter().map(|c| c.num).collect()
    }

    #[test]
    fn finds_substring_in_transcript() {
        let store = store();
        let hits = search(&store, "cat", SearchField::Transcript).unwrap();
        assert_eq!(nums(&hits), vec![1]);
    }

    #[test]
    fn no_match_is_empty_not_error() {
        let store = store();
        let hits = search(&store, "zzz", SearchField::Transcript).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn empty_phrase_matches_everything() {
        let store = store();
        let hits = search(&store, "", SearchField::Transcript).unwrap();
        assert_eq!(nums(&hits), vec![1, 2, 3]);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let store = store();
        assert!(search(&store, "Cat", SearchField::Transcript).unwrap().is_empty());
        assert_eq!(nums(&search(&store, "a ", SearchField::Transcript).unwrap()), vec![1, 2]);
    }

    #[test]
    fn other_fields() {
        let mut store = store();
        let mut comic = sample(4, "");
        comic.title = "Exploits of a Mom".to_string();
        comic.alt = "Her daughter is named Help I'm trapped in a driver's license factory.".to_string();
        store.insert(comic);

        assert_eq!(nums(&search(&store, "Mom", SearchField::Title).unwrap()), vec![4]);
        assert_eq!(nums(&search(&store, "daughter", SearchField::Alt).unwrap()), vec![4]);
        assert!(search(&store, "Mom", SearchField::Transcript).unwrap().is_empty());
        assert_eq!(nums(&search(&store, "dog", SearchField::Any).unwrap()), vec![2]);
        assert_eq!(nums(&search(&store, "Mom", SearchField::Any).unwrap()), vec![4]);
    }

    #[test]
    fn empty_index_has_no_matches() {
        let store = IndexStore::new("unused.json");
        assert!(search(&store, "", SearchField::Transcript).unwrap().is_empty());
        assert!(search(&store, "cat", SearchField::Any).unwrap().is_empty());
    }
}
