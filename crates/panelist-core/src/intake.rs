//! Document intake stub.
//!
//! Stands in for a résumé parser: any `.pdf` filename yields the same demo
//! candidate. Nothing is read from disk.

use serde::{Deserialize, Serialize};

use panelist_state::CandidateInfo;

use crate::domain::ValidationError;

/// Info fields every candidate carries, in display order.
pub const INFO_FIELDS: &[&str] = &[
    "dob",
    "available12",
    "phone",
    "email",
    "student_id",
    "address",
    "major",
    "grade",
    "career",
    "schedule",
];

/// A candidate as extracted from an application document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateIntake {
    pub name: String,
    pub info: CandidateInfo,
}

/// Empty info template used by new drafts.
pub fn blank_info() -> CandidateInfo {
    INFO_FIELDS
        .iter()
        .map(|field| (field.to_string(), String::new()))
        .collect()
}

/// "Parse" an application document. Rejects anything but `.pdf`.
pub fn parse_document(filename: &str) -> Result<CandidateIntake, ValidationError> {
    let is_pdf = std::path::Path::new(filename.trim())
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(ValidationError::UnsupportedDocument {
            filename: filename.to_string(),
        });
    }

    let info = [
        ("dob", "2002-05-14"),
        ("available12", "yes"),
        ("phone", "010-1234-5678"),
        ("email", "hong@kah.ac.kr"),
        ("student_id", "20220001"),
        ("address", "Yeoksam-dong, Gangnam-gu, Seoul"),
        ("major", "Computer Science and Engineering"),
        ("grade", "Year 3, first semester"),
        (
            "career",
            "Two years in the campus developer club; placed at an external hackathon",
        ),
        ("schedule", "Feb 17 14:00"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    Ok(CandidateIntake {
        name: "Hong Gildong".to_string(),
        info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_yields_demo_candidate_with_every_field() {
        let intake = parse_document("application.PDF").unwrap();
        assert_eq!(intake.name, "Hong Gildong");
        for field in INFO_FIELDS {
            assert!(
                intake.info.get(*field).is_some_and(|v| !v.is_empty()),
                "missing {field}"
            );
        }
    }

    #[test]
    fn test_non_pdf_is_rejected() {
        let err = parse_document("resume.docx").unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedDocument {
                filename: "resume.docx".to_string()
            }
        );
        assert!(parse_document("pdf").is_err());
    }

    #[test]
    fn test_blank_info_has_empty_fields() {
        let info = blank_info();
        assert_eq!(info.len(), INFO_FIELDS.len());
        assert!(info.values().all(String::is_empty));
    }
}
