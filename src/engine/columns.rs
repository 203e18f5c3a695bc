use crate::config::ColumnVocabulary;

/// Column roles inferred from a document's header list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnRoles {
    pub date: Option<usize>,
    pub length: Option<usize>,
}

impl ColumnRoles {
    pub fn classify(headers: &[String], vocabulary: &ColumnVocabulary) -> Self {
        Self {
            date: find_date_column(headers, vocabulary),
            length: find_length_column(headers, vocabulary),
        }
    }
}

pub fn find_date_column(headers: &[String], vocabulary: &ColumnVocabulary) -> Option<usize> {
    headers.iter().position(|header| {
        let lower = header.to_lowercase();
        contains_any(&lower, &vocabulary.date_keywords)
    })
}

/// An exact "checked" header wins over every other length candidate; after
/// that the first header matching a keyword or an exact short token is used.
pub fn find_length_column(headers: &[String], vocabulary: &ColumnVocabulary) -> Option<usize> {
    let lowered = headers
        .iter()
        .map(|header| header.to_lowercase())
        .collect::<Vec<String>>();

    if let Some(index) = lowered
        .iter()
        .position(|header| equals_any(header, &vocabulary.length_priority))
    {
        return Some(index);
    }

    lowered.iter().position(|header| {
        contains_any(header, &vocabulary.length_keywords)
            || equals_any(header, &vocabulary.length_exact)
    })
}

fn contains_any(header: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|keyword| !keyword.is_empty() && header.contains(&keyword.to_lowercase()))
}

fn equals_any(header: &str, tokens: &[String]) -> bool {
    tokens.iter().any(|token| header == token.to_lowercase())
}
