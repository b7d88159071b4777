//! Procedure catalogue used by the rule-based extractor.
//!
//! Each entry maps a canonical display name to the folded spellings (see [`crate::text::fold`])
//! that clinicians use for it in notes, in Portuguese and English.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

pub struct CatalogEntry {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

pub const PROCEDURES: &[CatalogEntry] = &[
    CatalogEntry {
        name: "Toxina Botulínica",
        aliases: &[
            "toxina botulinica",
            "toxina",
            "botox",
            "dysport",
            "xeomin",
            "botulinum toxin",
            "botulinum",
        ],
    },
    CatalogEntry {
        name: "Preenchimento",
        aliases: &[
            "preenchimento labial",
            "preenchimento",
            "acido hialuronico",
            "dermal filler",
            "lip filler",
            "filler",
            "hyaluronic acid",
        ],
    },
    CatalogEntry {
        name: "Bioestimulador de Colágeno",
        aliases: &[
            "bioestimulador de colageno",
            "bioestimulador",
            "sculptra",
            "radiesse",
            "biostimulator",
        ],
    },
    CatalogEntry {
        name: "Fios de PDO",
        aliases: &[
            "fios de pdo",
            "fios pdo",
            "fios de sustentacao",
            "pdo threads",
            "thread lift",
        ],
    },
    CatalogEntry {
        name: "Peeling",
        aliases: &["peeling quimico", "peeling", "chemical peel"],
    },
    CatalogEntry {
        name: "Microagulhamento",
        aliases: &["microagulhamento", "microneedling"],
    },
    CatalogEntry {
        name: "Skinbooster",
        aliases: &["skinbooster", "skin booster"],
    },
    CatalogEntry {
        name: "Rinomodelação",
        aliases: &[
            "rinomodelacao",
            "non-surgical rhinoplasty",
            "liquid rhinoplasty",
        ],
    },
    CatalogEntry {
        name: "Rinoplastia",
        aliases: &["rinoplastia", "rhinoplasty"],
    },
    CatalogEntry {
        name: "Blefaroplastia",
        aliases: &["blefaroplastia", "blepharoplasty"],
    },
    CatalogEntry {
        name: "Lipo de Papada",
        aliases: &[
            "lipo de papada",
            "lipoaspiracao de papada",
            "enzima de papada",
            "chin liposuction",
        ],
    },
    CatalogEntry {
        name: "Harmonização Facial",
        aliases: &["harmonizacao facial", "facial harmonization"],
    },
    CatalogEntry {
        name: "Intradermoterapia",
        aliases: &["intradermoterapia", "mesoterapia", "mesotherapy"],
    },
    CatalogEntry {
        name: "Ultrassom Microfocado",
        aliases: &["ultrassom microfocado", "ultraformer", "hifu"],
    },
    CatalogEntry {
        name: "Limpeza de Pele",
        aliases: &["limpeza de pele", "facial cleansing"],
    },
    CatalogEntry {
        name: "Laser",
        aliases: &["laser"],
    },
];

static ALIAS_TO_NAME: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    PROCEDURES
        .iter()
        .flat_map(|entry| entry.aliases.iter().map(move |alias| (*alias, entry.name)))
        .collect()
});

// Longest aliases first so that "toxina botulinica" wins over "toxina" at the same position.
static ALIAS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let mut aliases: Vec<&str> = ALIAS_TO_NAME.keys().copied().collect();
    aliases.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let alternation = aliases
        .iter()
        .map(|a| regex::escape(a))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).expect("catalogue aliases form a valid regex")
});

/// Every catalogue mention in `folded` as `(byte offset, canonical name)`, in text order.
///
/// Repeated mentions are all reported. `folded` must already be normalised with
/// [`crate::text::fold`].
pub fn procedure_mentions(folded: &str) -> Vec<(usize, &'static str)> {
    ALIAS_PATTERN
        .find_iter(folded)
        .filter_map(|m| ALIAS_TO_NAME.get(m.as_str()).map(|name| (m.start(), *name)))
        .collect()
}

/// Whether `folded` mentions any catalogued procedure.
pub fn mentions_procedure(folded: &str) -> bool {
    ALIAS_PATTERN.is_match(folded)
}
