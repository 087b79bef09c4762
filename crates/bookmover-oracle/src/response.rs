use bookmover_model::FixType;
use serde::{Deserialize, Serialize};

use crate::patch::PatchSpec;

/// The oracle's advisory output (§4.9). The supervisor always validates this
/// before acting on it; nothing here is trusted blindly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub root_cause: String,
    pub fix_type: FixType,
    pub confidence: f64,
    pub description: String,
    pub patch: Option<PatchSpec>,
    pub params: Option<String>,
}

impl Recommendation {
    /// §4.9: "unparseable responses yield fix_type = restart, confidence = 0.5".
    pub fn fallback() -> Self {
        Self {
            root_cause: "unknown".to_string(),
            fix_type: FixType::Restart,
            confidence: 0.5,
            description: "oracle response could not be parsed".to_string(),
            patch: None,
            params: None,
        }
    }
}

/// Wire shape of the oracle's raw JSON response, parsed strictly: any field
/// that fails to deserialize or is out of range falls back to
/// [`Recommendation::fallback`] rather than propagating a parse error, per
/// §4.9.
#[derive(Debug, Deserialize)]
struct RawRecommendation {
    root_cause: String,
    fix_type: FixType,
    confidence: f64,
    description: String,
    #[serde(default)]
    patch: Option<PatchSpec>,
    #[serde(default)]
    params: Option<String>,
}

pub fn parse_recommendation(body: &[u8]) -> Recommendation {
    match serde_json::from_slice::<RawRecommendation>(body) {
        Ok(raw) if (0.0..=1.0).contains(&raw.confidence) => Recommendation {
            root_cause: raw.root_cause,
            fix_type: raw.fix_type,
            confidence: raw.confidence,
            description: raw.description,
            patch: raw.patch,
            params: raw.params,
        },
        Ok(raw) => {
            tracing::warn!(confidence = raw.confidence, "oracle confidence out of range, falling back");
            Recommendation::fallback()
        }
        Err(error) => {
            tracing::warn!(%error, "oracle response failed to parse, falling back");
            Recommendation::fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_response_parses() {
        let body = br#"{"root_cause":"connection reset","fix_type":"restart","confidence":0.9,"description":"network blip"}"#;
        let rec = parse_recommendation(body);
        assert_eq!(rec.root_cause, "connection reset");
        assert_eq!(rec.confidence, 0.9);
        assert_eq!(rec.fix_type, FixType::Restart);
    }

    #[test]
    fn malformed_json_falls_back() {
        let rec = parse_recommendation(b"not json");
        assert_eq!(rec, Recommendation::fallback());
    }

    #[test]
    fn out_of_range_confidence_falls_back() {
        let body = br#"{"root_cause":"x","fix_type":"restart","confidence":1.5,"description":"y"}"#;
        let rec = parse_recommendation(body);
        assert_eq!(rec, Recommendation::fallback());
    }

    #[test]
    fn patch_field_round_trips_through_parsing() {
        let body = br#"{"root_cause":"bad loop","fix_type":"code","confidence":0.8,"description":"patch it",
            "patch":{"kind":"function_replace","name":"next_batch","body":"fn next_batch() {}"}}"#;
        let rec = parse_recommendation(body);
        assert_eq!(
            rec.patch,
            Some(PatchSpec::FunctionReplace {
                name: "next_batch".to_string(),
                body: "fn next_batch() {}".to_string(),
            })
        );
    }
}
