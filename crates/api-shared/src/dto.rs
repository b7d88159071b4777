//! Wire types for the HarmoniFace REST API.
//!
//! Field names follow the clinic's existing JSON contract (Portuguese keys on `/parse`), which is
//! why they differ from the English names used on the core types.

use harmoniface_core::NoteRecord;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Body of `POST /parse`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ParseNoteReq {
    /// Free-text clinical note.
    pub text: String,
}

/// Structured note returned by `POST /parse`.
///
/// All six keys are always present; fields that were not found are `null` or `[]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ParseNoteRes {
    pub paciente: Option<String>,
    pub idade: Option<u32>,
    pub procedimentos_realizados: Vec<String>,
    pub retorno: Option<String>,
    pub procedimentos_sugeridos: Vec<String>,
    /// The submitted text, unchanged.
    pub raw: String,
}

impl From<NoteRecord> for ParseNoteRes {
    fn from(record: NoteRecord) -> Self {
        Self {
            paciente: record.patient,
            idade: record.age,
            procedimentos_realizados: record.procedures_performed,
            retorno: record.follow_up,
            procedimentos_sugeridos: record.procedures_suggested,
            raw: record.raw_text,
        }
    }
}

/// One entry of a request-validation failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationDetail {
    /// Location of the offending value, e.g. `["body", "text"]`.
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Payload of a 422 response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorRes {
    pub detail: Vec<ValidationDetail>,
}

/// Payload of other error responses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}
