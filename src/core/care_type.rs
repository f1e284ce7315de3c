use serde::{Deserialize, Serialize};

/// Kinds of childcare a profile offers or looks for.
///
/// Stored in the database as comma-separated integer codes. Historic rows
/// carried the French form labels instead; `convert_field_forward` and
/// `convert_field_backward` translate between the two representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareType {
    FullTime,
    PartTime,
    Evening,
    Shared,
    AfterSchool,
    Holidays,
    ShiftedHours,
    Night,
    Emergency,
}

/// Legacy label / storage code pairs, in code order.
const CARE_TYPE_TABLE: [(CareType, &str, u8); 9] = [
    (CareType::FullTime, "plein", 0),
    (CareType::PartTime, "partiel", 1),
    (CareType::Evening, "soir", 2),
    (CareType::Shared, "part", 3),
    (CareType::AfterSchool, "ecole", 4),
    (CareType::Holidays, "vacances", 5),
    (CareType::ShiftedHours, "decal", 6),
    (CareType::Night, "nuit", 7),
    (CareType::Emergency, "urgences", 8),
];

impl CareType {
    /// Storage code of this care type.
    pub fn code(&self) -> u8 {
        CARE_TYPE_TABLE
            .iter()
            .find(|(t, _, _)| t == self)
            .map(|(_, _, c)| *c)
            .unwrap_or(0)
    }

    /// Historic form label of this care type.
    pub fn legacy_label(&self) -> &'static str {
        CARE_TYPE_TABLE
            .iter()
            .find(|(t, _, _)| t == self)
            .map(|(_, l, _)| *l)
            .unwrap_or("plein")
    }

    pub fn from_code(code: u8) -> Option<CareType> {
        CARE_TYPE_TABLE
            .iter()
            .find(|(_, _, c)| *c == code)
            .map(|(t, _, _)| *t)
    }

    pub fn from_legacy_label(label: &str) -> Option<CareType> {
        CARE_TYPE_TABLE
            .iter()
            .find(|(_, l, _)| *l == label)
            .map(|(t, _, _)| *t)
    }
}

/// Parse a comma-separated code field into care types.
///
/// Unknown or non-numeric tokens are skipped, so a half-migrated row
/// degrades to a smaller set instead of failing the whole fetch.
pub fn parse_codes(field: &str) -> Vec<CareType> {
    field
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .filter_map(|t| t.parse::<u8>().ok())
        .filter_map(CareType::from_code)
        .collect()
}

/// Encode care types back into the comma-separated storage form.
pub fn encode_codes(types: &[CareType]) -> String {
    types
        .iter()
        .map(|t| t.code().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Rewrite a legacy label field ("plein,soir") into codes ("0,2").
///
/// Tokens that are not known labels are dropped; a field with no surviving
/// tokens converts to `None` so the column can be set back to NULL.
pub fn convert_field_forward(field: &str) -> Option<String> {
    convert_tokens(field, |t| {
        CareType::from_legacy_label(t).map(|c| c.code().to_string())
    })
}

/// Rewrite a code field ("0,2") back into legacy labels ("plein,soir").
pub fn convert_field_backward(field: &str) -> Option<String> {
    convert_tokens(field, |t| {
        t.parse::<u8>()
            .ok()
            .and_then(CareType::from_code)
            .map(|c| c.legacy_label().to_string())
    })
}

fn convert_tokens<F>(field: &str, convert: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let converted: Vec<String> = field
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .filter_map(|t| convert(t))
        .collect();

    if converted.is_empty() {
        None
    } else {
        Some(converted.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_label_round_trip() {
        for (care_type, label, code) in CARE_TYPE_TABLE {
            assert_eq!(care_type.code(), code);
            assert_eq!(care_type.legacy_label(), label);
            assert_eq!(CareType::from_code(code), Some(care_type));
            assert_eq!(CareType::from_legacy_label(label), Some(care_type));
        }
    }

    #[test]
    fn test_unknown_values() {
        assert_eq!(CareType::from_code(42), None);
        assert_eq!(CareType::from_legacy_label("garde"), None);
    }

    #[test]
    fn test_convert_forward() {
        assert_eq!(convert_field_forward("plein"), Some("0".to_string()));
        assert_eq!(convert_field_forward("plein,soir"), Some("0,2".to_string()));
        assert_eq!(convert_field_forward("urgences"), Some("8".to_string()));
    }

    #[test]
    fn test_convert_backward() {
        assert_eq!(convert_field_backward("0"), Some("plein".to_string()));
        assert_eq!(convert_field_backward("0,2"), Some("plein,soir".to_string()));
        assert_eq!(convert_field_backward("3"), Some("part".to_string()));
    }

    #[test]
    fn test_convert_round_trip() {
        let forward = convert_field_forward("partiel,ecole,nuit").unwrap();
        assert_eq!(forward, "1,4,7");
        assert_eq!(
            convert_field_backward(&forward),
            Some("partiel,ecole,nuit".to_string())
        );
    }

    #[test]
    fn test_convert_drops_unknown_tokens() {
        assert_eq!(convert_field_forward("plein,inconnu"), Some("0".to_string()));
        assert_eq!(convert_field_forward("inconnu"), None);
        assert_eq!(convert_field_forward(""), None);
        assert_eq!(convert_field_backward("99"), None);
    }

    #[test]
    fn test_parse_codes_skips_garbage() {
        assert_eq!(
            parse_codes("0, 2,xyz,99"),
            vec![CareType::FullTime, CareType::Evening]
        );
        assert!(parse_codes("").is_empty());
    }

    #[test]
    fn test_encode_codes() {
        assert_eq!(
            encode_codes(&[CareType::FullTime, CareType::Shared]),
            "0,3"
        );
    }
}
