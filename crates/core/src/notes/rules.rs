//! Rule-based field extraction for aesthetic-medicine notes.
//!
//! Notes are short and formulaic ("Paciente: Maria Silva, 38 anos. Botox na glabela. Retorno em
//! 15 dias."), so a handful of patterns plus the procedure catalogue recover most fields. Anything
//! the rules cannot find confidently is left absent.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::catalog::{mentions_procedure, procedure_mentions};
use super::{ExtractedFields, FieldExtractor};
use crate::constants::MAX_PLAUSIBLE_AGE;
use crate::text::fold;

static LABELLED_PATIENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:paciente|patient|nome|name)\s*[:\-–]\s*([^\n,;]+)")
        .expect("valid patient pattern")
});

static LABELLED_AGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:idade|age|aged)\s*[:\-]?\s*(\d{1,3})\b").expect("valid age pattern")
});

static SUFFIXED_AGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})\s*(?:anos|ano|years?[- ]old|years?|yrs?|y/o|yo)\b")
        .expect("valid age pattern")
});

static FOLLOW_UP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:retorno|return|follow[- ]?up|revis[aã]o|reavalia[cç][aã]o)\b\s*[:\-–]?\s*([^.;\n]*)",
    )
    .expect("valid follow-up pattern")
});

// Applied to folded clauses only.
static FOLLOW_UP_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:retorno|return|follow[- ]?up|revisao|reavaliacao)\b")
        .expect("valid follow-up clause pattern")
});

static SUGGESTION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:sugiro|sugere|sugerimos|sugerid[oa]s?|sugest(?:ao|oes)|recomend\w*|indicad[oa]s?|indica-se|indico|suggest\w*|recommend\w*|consider|considering)\b",
    )
    .expect("valid suggestion pattern")
});

static PERFORMED_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:aplicad[oa]s?|aplicacao|aplicamos|realizad[oa]s?|realizamos|feit[oa]s?|recebeu|performed|applied|administered|done)\b",
    )
    .expect("valid performed pattern")
});

/// Words that turn a following "N anos" into a duration rather than an age.
const DURATION_WORDS: &[&str] = &[
    "em", "ha", "apos", "por", "cada", "durante", "in", "for", "after", "every", "within",
];

/// Words that may precede a name but are not part of it.
const NAME_PREFIXES: &[&str] = &[
    "paciente", "patient", "pt", "sr", "sra", "srta", "dr", "dra", "mr", "mrs", "ms", "miss",
];

/// Lowercase particles allowed inside a name ("Maria da Silva").
const NAME_CONNECTORS: &[&str] = &["da", "de", "do", "das", "dos", "e", "van", "von", "del"];

const CLAUSE_DELIMITERS: [char; 5] = ['.', ';', '\n', '!', '?'];
const SEGMENT_DELIMITERS: [char; 3] = [',', ';', '\n'];

/// Deterministic extractor driven by regular expressions and the procedure catalogue.
#[derive(Clone, Copy, Debug, Default)]
pub struct RuleBasedExtractor;

impl RuleBasedExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core of the extractor.
    pub fn extract_fields(&self, text: &str) -> ExtractedFields {
        let (procedures_performed, procedures_suggested) = procedures(text);
        ExtractedFields {
            patient: patient(text),
            age: age(text),
            procedures_performed,
            follow_up: follow_up(text),
            procedures_suggested,
        }
    }
}

#[async_trait]
impl FieldExtractor for RuleBasedExtractor {
    async fn extract(&self, text: &str) -> ExtractedFields {
        self.extract_fields(text)
    }

    fn name(&self) -> &'static str {
        "rules"
    }
}

fn patient(text: &str) -> Option<String> {
    if let Some(caps) = LABELLED_PATIENT.captures(text) {
        if let Some((name, _)) = leading_name(&caps[1]) {
            return Some(name);
        }
    }

    // Unlabelled notes often open with the name: "Jane Doe, 45, rhinoplasty".
    let first = text.split(SEGMENT_DELIMITERS).next()?.trim();
    if first.is_empty() || mentions_procedure(&fold(first)) {
        return None;
    }
    match leading_name(first) {
        Some((name, true)) if (2..=5).contains(&name.split_whitespace().count()) => Some(name),
        _ => None,
    }
}

/// Reads the run of capitalised words at the start of `segment`.
///
/// Returns the name and whether it spans the whole segment.
fn leading_name(segment: &str) -> Option<(String, bool)> {
    let words: Vec<&str> = segment.split_whitespace().collect();
    let mut start = 0;
    while start < words.len()
        && NAME_PREFIXES.contains(&fold(words[start].trim_end_matches(['.', ':'])).as_str())
    {
        start += 1;
    }

    let mut name: Vec<&str> = Vec::new();
    let mut complete = true;
    for (offset, word) in words[start..].iter().enumerate() {
        let clean = word.trim_end_matches(['.', ':', ')']);
        let accepted = is_name_word(clean) || (!name.is_empty() && NAME_CONNECTORS.contains(&clean));
        if !accepted {
            complete = false;
            break;
        }
        name.push(clean);
        if clean.len() != word.len() {
            complete = start + offset + 1 == words.len();
            break;
        }
    }

    while name.last().is_some_and(|w| NAME_CONNECTORS.contains(w)) {
        name.pop();
        complete = false;
    }

    if name.is_empty() {
        None
    } else {
        Some((name.join(" "), complete))
    }
}

fn is_name_word(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => {
            chars.all(|c| c.is_alphabetic() || c == '-' || c == '\'')
        }
        _ => false,
    }
}

fn age(text: &str) -> Option<u32> {
    let plausible = |value: &str| {
        value
            .parse::<u32>()
            .ok()
            .filter(|age| *age <= MAX_PLAUSIBLE_AGE)
    };

    let follow_up_spans: Vec<(usize, usize)> = FOLLOW_UP
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();
    // "Retorno em 1 ano" and "toxina há 2 anos" are durations, not ages.
    let is_duration = |start: usize| {
        follow_up_spans
            .iter()
            .any(|(from, to)| (*from..*to).contains(&start))
            || preceded_by_duration_word(&text[..start])
    };

    LABELLED_AGE
        .captures_iter(text)
        .find_map(|caps| plausible(&caps[1]))
        .or_else(|| {
            SUFFIXED_AGE
                .captures_iter(text)
                .filter_map(|caps| caps.get(1))
                .filter(|m| !is_duration(m.start()))
                .find_map(|m| plausible(m.as_str()))
        })
        .or_else(|| {
            // A bare number between commas: "Jane Doe, 45, rhinoplasty".
            text.split(SEGMENT_DELIMITERS)
                .map(str::trim)
                .filter(|s| (1..=3).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit()))
                .find_map(plausible)
        })
}

fn preceded_by_duration_word(before: &str) -> bool {
    before
        .split_whitespace()
        .next_back()
        .map(|word| fold(word.trim_matches(|c: char| !c.is_alphanumeric())))
        .is_some_and(|word| DURATION_WORDS.contains(&word.as_str()))
}

fn follow_up(text: &str) -> Option<String> {
    FOLLOW_UP.captures_iter(text).find_map(|caps| {
        let value = caps[1].trim().trim_end_matches([',', ':']).trim_end();
        (!value.is_empty()).then(|| value.to_string())
    })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scope {
    Performed,
    Suggested,
    FollowUp,
}

/// Splits catalogue mentions into performed and suggested procedures.
///
/// Within a sentence, a mention belongs to the nearest marker before it: a suggestion word
/// ("sugiro", "recommend") makes it suggested, a follow-up word ("retorno em 15 dias para
/// retoque de toxina") drops it, and a performed word ("aplicado", "performed") or no marker at
/// all makes it performed. Scope resets at every sentence boundary.
fn procedures(text: &str) -> (Vec<String>, Vec<String>) {
    let folded = fold(text);
    let mut performed: Vec<&'static str> = Vec::new();
    let mut suggested: Vec<&'static str> = Vec::new();

    for sentence in folded.split(CLAUSE_DELIMITERS) {
        let mut markers: Vec<(usize, Scope)> = SUGGESTION_MARKER
            .find_iter(sentence)
            .map(|m| (m.start(), Scope::Suggested))
            .chain(FOLLOW_UP_CLAUSE.find_iter(sentence).map(|m| (m.start(), Scope::FollowUp)))
            .chain(PERFORMED_MARKER.find_iter(sentence).map(|m| (m.start(), Scope::Performed)))
            .collect();
        markers.sort_by_key(|(offset, _)| *offset);

        for (offset, name) in procedure_mentions(sentence) {
            let scope = markers
                .iter()
                .take_while(|(marker, _)| *marker < offset)
                .last()
                .map_or(Scope::Performed, |(_, scope)| *scope);
            let target = match scope {
                Scope::Performed => &mut performed,
                Scope::Suggested => &mut suggested,
                Scope::FollowUp => continue,
            };
            if !target.contains(&name) {
                target.push(name);
            }
        }
    }

    (
        performed.into_iter().map(String::from).collect(),
        suggested.into_iter().map(String::from).collect(),
    )
}
