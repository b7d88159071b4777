//! Text normalisation shared by the extractor and the embedding code.
//!
//! Clinical notes arrive in Portuguese and English, frequently with inconsistent accents
//! ("rinomodelacao" vs "rinomodelação"). Matching is therefore done on a *folded* form:
//! lowercase with the Latin diacritics used in Portuguese removed.

/// Lowercases `text` and strips Portuguese/Latin-1 diacritics.
pub fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(strip_diacritic)
        .collect()
}

fn strip_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

const STOPWORDS: &[&str] = &[
    "a", "o", "as", "os", "e", "de", "da", "do", "das", "dos", "em", "na", "no", "nas", "nos",
    "um", "uma", "para", "por", "com", "que", "se", "ao", "the", "of", "and", "in", "on", "to",
    "is", "for", "with", "an", "or",
];

/// Splits `text` into folded alphanumeric tokens, dropping common stopwords.
pub fn tokens(text: &str) -> Vec<String> {
    fold(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !STOPWORDS.contains(t))
        .map(str::to_owned)
        .collect()
}
