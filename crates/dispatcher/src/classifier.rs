use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, instrument};

use responder_core::models::{IncidentNarrative, ServiceCategory, ServiceNeedDecision};
use responder_core::traits::{CompletionPurpose, CompletionRequest, TextUnderstanding};
use responder_core::{ResponderError, ResponderResult};
use responder_domain::strip_code_fence;

const SYSTEM_INSTRUCTION: &str = "You are an emergency-dispatch analyst.";

/// Turns a narrative into a per-category need decision with a single
/// text-understanding call.
pub struct NeedClassifier {
    text: Arc<dyn TextUnderstanding>,
}

impl NeedClassifier {
    pub fn new(text: Arc<dyn TextUnderstanding>) -> Self {
        Self { text }
    }

    #[instrument(skip(self, narrative), fields(incident_id = %narrative.id))]
    pub async fn classify(&self, narrative: &IncidentNarrative) -> ResponderResult<ServiceNeedDecision> {
        let request = CompletionRequest::new(CompletionPurpose::NeedDecision, build_prompt(narrative))
            .with_system(SYSTEM_INSTRUCTION);

        let reply = self.text.complete(&request).await?;
        match parse_decision(&reply) {
            Ok(decision) => {
                debug!(
                    needed = ?decision.needed().map(|(c, _)| c).collect::<Vec<_>>(),
                    "classification parsed"
                );
                Ok(decision)
            }
            Err(e) => {
                error!(error = %e, reply = %reply, "classifier output is not a valid decision");
                Err(e)
            }
        }
    }
}

pub fn build_prompt(narrative: &IncidentNarrative) -> String {
    format!(
        "Read the transcript of an emergency phone call, decide whether each of the four \
services is REQUIRED, and output one JSON object.\n\n\
Services and criteria:\n\
- Ambulance: medical emergencies, injuries, unconscious or ill persons, accident victims with major or minor injuries.\n\
- Police: crimes, violence, safety threats, traffic collisions, someone breaking the law, disturbances caused by people nearby.\n\
- Fire: fires, explosions, gas leaks, hazardous-material spills, people trapped, crowd or rescue assistance.\n\
- Hospital: the patient will need hospital admission or specialist care (burns, trauma, cardiac, ICU) after first aid.\n\n\
OUTPUT FORMAT (exactly):\n\
{{\n  \"Fire\": \"<summary or empty string>\",\n  \"Police\": \"<summary or empty string>\",\n  \
\"Ambulance\": \"<summary or empty string>\",\n  \"Hospital\": \"<summary or empty string>\"\n}}\n\n\
Rules:\n\
- If a service is NOT needed, return an empty string for that key.\n\
- If a service IS needed, give ONE concise sentence that includes the caller's name and location and what is required.\n\
- Do not add extra keys or commentary.\n\n\
CALLER: {name}\nLOCATION: {location}\n\nTRANSCRIPT:\n{transcript}",
        name = narrative.reporter.name,
        location = narrative.location_label(),
        transcript = narrative.text,
    )
}

/// Parses the classifier reply: a JSON object with exactly the four category
/// keys, each mapped to a string. A surrounding code fence is tolerated.
pub fn parse_decision(reply: &str) -> ResponderResult<ServiceNeedDecision> {
    let body = strip_code_fence(reply);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ResponderError::classification_format(format!("not valid JSON: {e}")))?;

    let Value::Object(object) = value else {
        return Err(ResponderError::classification_format("expected a JSON object"));
    };

    if let Some(extra) = object
        .keys()
        .find(|key| !ServiceCategory::ALL.iter().any(|c| c.as_str() == key.as_str()))
    {
        return Err(ResponderError::classification_format(format!(
            "unexpected key {extra:?}"
        )));
    }

    let mut summaries = Vec::with_capacity(ServiceCategory::ALL.len());
    for category in ServiceCategory::ALL {
        match object.get(category.as_str()) {
            Some(Value::String(summary)) => summaries.push((category, summary.clone())),
            Some(other) => {
                return Err(ResponderError::classification_format(format!(
                    "{category} must be a string, got {other}"
                )))
            }
            None => {
                return Err(ResponderError::classification_format(format!(
                    "missing key {category:?}"
                )))
            }
        }
    }

    Ok(ServiceNeedDecision::from_summaries(summaries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use responder_testing_utils::{MockTextUnderstanding, NarrativeBuilder};

    const FULL_REPLY: &str = r#"{
        "Fire": "",
        "Police": "",
        "Ambulance": "Jane Doe at 123 Main St is unconscious with chest pain.",
        "Hospital": "Jane Doe needs cardiac care."
    }"#;

    #[test]
    fn test_parse_decision_with_all_keys() {
        let decision = parse_decision(FULL_REPLY).unwrap();
        assert_eq!(decision.len(), 4);
        assert!(!decision.is_needed(ServiceCategory::Fire));
        assert!(decision.is_needed(ServiceCategory::Ambulance));
        assert_eq!(
            decision.summary(ServiceCategory::Hospital),
            Some("Jane Doe needs cardiac care.")
        );
    }

    #[test]
    fn test_parse_decision_all_empty_keeps_every_key() {
        let decision =
            parse_decision(r#"{"Fire": "", "Police": " ", "Ambulance": "", "Hospital": ""}"#).unwrap();
        assert_eq!(decision.len(), 4);
        assert!(decision.is_empty());
    }

    #[test]
    fn test_parse_decision_strips_code_fence() {
        let fenced = format!("```json\n{FULL_REPLY}\n```");
        assert!(parse_decision(&fenced).unwrap().is_needed(ServiceCategory::Ambulance));
    }

    #[test]
    fn test_parse_decision_rejects_malformed_output() {
        for reply in [
            "Sure! Ambulance is needed.",
            "[\"Fire\"]",
            r#"{"Fire": "", "Police": "", "Ambulance": ""}"#,
            r#"{"Fire": "", "Police": "", "Ambulance": "", "Hospital": "", "Coast Guard": ""}"#,
            r#"{"Fire": null, "Police": "", "Ambulance": "", "Hospital": ""}"#,
        ] {
            assert!(
                matches!(parse_decision(reply), Err(ResponderError::ClassificationFormat(_))),
                "accepted {reply}"
            );
        }
    }

    #[test]
    fn test_prompt_carries_caller_details() {
        let narrative = NarrativeBuilder::new()
            .with_reporter("Ana Ruiz", "555-0199")
            .at_place("corner of Shattuck and Center")
            .with_text("there is smoke coming out of the bakery")
            .build();
        let prompt = build_prompt(&narrative);
        assert!(prompt.contains("Ana Ruiz"));
        assert!(prompt.contains("corner of Shattuck and Center"));
        assert!(prompt.contains("smoke coming out of the bakery"));
        assert!(prompt.contains("\"Hospital\""));
    }

    #[tokio::test]
    async fn test_classify_makes_exactly_one_call() {
        let text = MockTextUnderstanding::new().with_reply(CompletionPurpose::NeedDecision, FULL_REPLY);
        let classifier = NeedClassifier::new(Arc::new(text.clone()));

        let decision = classifier.classify(&NarrativeBuilder::new().build()).await.unwrap();
        assert!(decision.is_needed(ServiceCategory::Ambulance));
        assert_eq!(text.call_count(CompletionPurpose::NeedDecision), 1);
    }

    #[tokio::test]
    async fn test_classify_surfaces_format_error() {
        let text = MockTextUnderstanding::new().with_reply(CompletionPurpose::NeedDecision, "not json");
        let classifier = NeedClassifier::new(Arc::new(text.clone()));

        let err = classifier.classify(&NarrativeBuilder::new().build()).await.unwrap_err();
        assert!(matches!(err, ResponderError::ClassificationFormat(_)));
        assert_eq!(text.call_count(CompletionPurpose::NeedDecision), 1);
    }
}
