use serde::{Deserialize, Serialize};

/// How a result page was produced: free-text title search, free-text person
/// search, or genre-filtered discovery. The mode alone determines the shape
/// of the result elements (movies for `ByTitle`/`ByGenre`, people for
/// `ByPerson`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    ByTitle,
    ByPerson,
    ByGenre,
}

impl SearchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ByTitle => "by_title",
            Self::ByPerson => "by_person",
            Self::ByGenre => "by_genre",
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
