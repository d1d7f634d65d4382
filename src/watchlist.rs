//! Case-insensitive substring watchlist.

/// A set of keywords; a domain matches when it contains any of them,
/// ignoring case.
#[derive(Debug, Clone, Default)]
pub struct Watchlist {
    // (as configured, lowercased)
    keywords: Vec<(String, String)>,
}

impl Watchlist {
    /// Builds a watchlist, trimming entries and dropping empty ones.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .map(|k| {
                let lowered = k.to_lowercase();
                (k, lowered)
            })
            .collect();
        Self { keywords }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    /// Returns the first configured keyword contained in `domain`.
    pub fn first_match(&self, domain: &str) -> Option<&str> {
        if self.keywords.is_empty() {
            return None;
        }
        let domain = domain.to_lowercase();
        self.keywords
            .iter()
            .find(|(_, lowered)| domain.contains(lowered.as_str()))
            .map(|(original, _)| original.as_str())
    }

    pub fn matches(&self, domain: &str) -> bool {
        self.first_match(domain).is_some()
    }
}
