use serde::{Deserialize, Serialize};

/// A research publication as presented in listings and detail views.
///
/// The `link` always resolves to something a user can open: the DOI when the
/// record carries an absolute URL, otherwise the PMC article page derived
/// from the publication id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    /// PMC identifier, e.g. "PMC10348123".
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub r#abstract: String,
    pub link: String,
    /// Four-digit publication year, or "Unknown" when the source record
    /// carries no parseable date.
    pub year: String,
}

impl Publication {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            authors: Vec::new(),
            r#abstract: String::new(),
            link: String::new(),
            year: String::from("Unknown"),
        }
    }
}

impl std::fmt::Display for Publication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.title, self.year)?;
        if !self.authors.is_empty() {
            write!(f, " by {}", self.authors.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publication_new_defaults() {
        let publication = Publication::new("PMC123", "Test Paper");
        assert_eq!(publication.id, "PMC123");
        assert_eq!(publication.title, "Test Paper");
        assert!(publication.authors.is_empty());
        assert_eq!(publication.year, "Unknown");
    }

    #[test]
    fn test_publication_display() {
        let mut publication = Publication::new("PMC123", "Gene Therapy Advances");
        publication.year = "2023".to_string();
        publication.authors = vec!["Jane Doe".to_string(), "John Smith".to_string()];

        let display = format!("{}", publication);
        assert_eq!(display, "Gene Therapy Advances (2023) by Jane Doe, John Smith");
    }

    #[test]
    fn test_publication_display_without_authors() {
        let publication = Publication::new("PMC123", "Untitled Study");
        assert_eq!(format!("{}", publication), "Untitled Study (Unknown)");
    }

    #[test]
    fn test_publication_serialization_round_trip() {
        let mut publication = Publication::new("PMC456", "Rare Disease Review");
        publication.r#abstract = "A review of rare disease research.".to_string();
        publication.link = "https://doi.org/10.1000/test".to_string();

        let json = serde_json::to_string(&publication).unwrap();
        let parsed: Publication = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, publication);
    }
}
