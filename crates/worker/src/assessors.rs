//! Per-service steps run before candidates are ranked. Each one decides the
//! selection policy for a request and may attach an assessment to the result.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use responder_core::models::{Assessment, DispatchRequest};
use responder_core::traits::{CompletionPurpose, CompletionRequest, ReferenceSearch, TextUnderstanding};
use responder_core::ResponderResult;
use responder_domain::{parse_ambulance_tier, parse_care_categories, SelectionPolicy};

#[derive(Debug, Clone, PartialEq)]
pub struct Assessed {
    pub policy: SelectionPolicy,
    pub assessment: Option<Assessment>,
}

#[async_trait]
pub trait Assessor: Send + Sync {
    /// An error here means the request cannot be matched; the resolver
    /// reports it as a retrieval failure without querying the directory.
    async fn assess(&self, request: &DispatchRequest) -> ResponderResult<Assessed>;

    fn name(&self) -> &str;
}

/// Fire and police: trust the directory's relevance order.
pub struct DirectoryOrderAssessor;

impl DirectoryOrderAssessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DirectoryOrderAssessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Assessor for DirectoryOrderAssessor {
    async fn assess(&self, _request: &DispatchRequest) -> ResponderResult<Assessed> {
        Ok(Assessed {
            policy: SelectionPolicy::CollaboratorOrder,
            assessment: None,
        })
    }

    fn name(&self) -> &str {
        "DirectoryOrder"
    }
}

/// Classifies the incident into an ambulance tier; the tier is a hard filter.
pub struct AmbulanceTierAssessor {
    text: Arc<dyn TextUnderstanding>,
    service_type: Option<String>,
}

impl AmbulanceTierAssessor {
    pub fn new(text: Arc<dyn TextUnderstanding>, service_type: Option<String>) -> Self {
        Self { text, service_type }
    }

    fn prompt(summary: &str) -> String {
        format!(
            "Classify this emergency as one of the following ambulance types:\n\
             - BLS: Basic Life Support (minor injuries, stable condition)\n\
             - ALS: Advanced Life Support (unconscious, respiratory or cardiac issues)\n\
             - CCT: Critical Care Transport (ICU transfer, ventilator, critical condition)\n\n\
             Incident report:\n{summary}\n\n\
             Reply with only one of: BLS, ALS, or CCT."
        )
    }
}

#[async_trait]
impl Assessor for AmbulanceTierAssessor {
    async fn assess(&self, request: &DispatchRequest) -> ResponderResult<Assessed> {
        let completion = CompletionRequest::new(CompletionPurpose::AmbulanceTier, Self::prompt(&request.summary))
            .with_system("You are a trained emergency medical classifier.");

        let reply = self.text.complete(&completion).await?;
        let tier = parse_ambulance_tier(&reply)?;
        info!(request_id = %request.id, %tier, "ambulance tier classified");

        Ok(Assessed {
            policy: SelectionPolicy::NearestOfTier {
                tier,
                service_type: self.service_type.clone(),
            },
            assessment: Some(Assessment::AmbulanceTier(tier)),
        })
    }

    fn name(&self) -> &str {
        "AmbulanceTier"
    }
}

/// Tags the post-treatment care categories a hospital must cover, using
/// reference documents as context. Tagging is informational; failures
/// degrade to an empty list and never block hospital selection.
pub struct CareCategoryAssessor {
    text: Arc<dyn TextUnderstanding>,
    references: Option<Arc<dyn ReferenceSearch>>,
    top_k: usize,
    cutoff_miles: f64,
    default_rating: f64,
}

impl CareCategoryAssessor {
    pub fn new(
        text: Arc<dyn TextUnderstanding>,
        references: Option<Arc<dyn ReferenceSearch>>,
        top_k: usize,
        cutoff_miles: f64,
        default_rating: f64,
    ) -> Self {
        Self {
            text,
            references,
            top_k,
            cutoff_miles,
            default_rating,
        }
    }

    async fn context(&self, note: &str) -> String {
        let Some(references) = &self.references else {
            return String::new();
        };
        match references.similar(note, self.top_k).await {
            Ok(documents) => {
                debug!(count = documents.len(), "reference documents retrieved");
                documents
                    .into_iter()
                    .map(|document| document.content)
                    .collect::<Vec<_>>()
                    .join("\n\n")
            }
            Err(e) => {
                warn!(error = %e, "reference search failed, classifying without context");
                String::new()
            }
        }
    }

    async fn categories(&self, note: &str) -> Vec<String> {
        let context = self.context(note).await;
        let prompt = format!(
            "You are a medical classification assistant helping 911 dispatchers.\n\n\
             Context:\n{context}\n\n\
             Paramedic Note:\n{note}\n\n\
             Classify the post-first-aid medical needs of the patient. \
             Return the result as a list like this:\n[\"burn\", \"trauma\", \"ICU\"]"
        );
        let request = CompletionRequest::new(CompletionPurpose::CareCategories, prompt);

        match self.text.complete(&request).await {
            Ok(reply) => parse_care_categories(&reply),
            Err(e) => {
                warn!(error = %e, "care category classification failed");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl Assessor for CareCategoryAssessor {
    async fn assess(&self, request: &DispatchRequest) -> ResponderResult<Assessed> {
        let categories = self.categories(&request.summary).await;
        info!(request_id = %request.id, ?categories, "care categories tagged");

        Ok(Assessed {
            policy: SelectionPolicy::BestRated {
                cutoff_miles: self.cutoff_miles,
                default_rating: self.default_rating,
            },
            assessment: Some(Assessment::CareCategories(categories)),
        })
    }

    fn name(&self) -> &str {
        "CareCategory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use responder_core::models::{AmbulanceTier, ServiceCategory};
    use responder_core::ResponderError;
    use responder_testing_utils::{DispatchRequestBuilder, MockReferenceSearch, MockTextUnderstanding};

    #[tokio::test]
    async fn test_tier_assessor_builds_tier_policy() {
        let text = MockTextUnderstanding::new().with_reply(CompletionPurpose::AmbulanceTier, "ALS");
        let assessor = AmbulanceTierAssessor::new(Arc::new(text.clone()), Some("paramedic".into()));
        let request = DispatchRequestBuilder::new(ServiceCategory::Ambulance)
            .with_summary("Unconscious man, chest pain")
            .build();

        let assessed = assessor.assess(&request).await.unwrap();
        assert_eq!(
            assessed.policy,
            SelectionPolicy::NearestOfTier {
                tier: AmbulanceTier::Advanced,
                service_type: Some("paramedic".to_string()),
            }
        );
        assert_eq!(
            assessed.assessment,
            Some(Assessment::AmbulanceTier(AmbulanceTier::Advanced))
        );
        let calls = text.calls();
        assert!(calls[0].prompt.contains("Unconscious man, chest pain"));
    }

    #[tokio::test]
    async fn test_tier_assessor_rejects_unknown_label() {
        let text = MockTextUnderstanding::new().with_reply(CompletionPurpose::AmbulanceTier, "HELICOPTER");
        let assessor = AmbulanceTierAssessor::new(Arc::new(text), None);
        let request = DispatchRequestBuilder::new(ServiceCategory::Ambulance).build();

        let err = assessor.assess(&request).await.unwrap_err();
        assert!(matches!(err, ResponderError::ClassificationFormat(_)));
    }

    #[tokio::test]
    async fn test_care_assessor_uses_reference_context() {
        let text = MockTextUnderstanding::new()
            .with_reply(CompletionPurpose::CareCategories, "[\"burn\", \"ICU\"]");
        let references = MockReferenceSearch::new()
            .with_document("Burns over 20% of body surface need a burn center.")
            .with_document("Airway compromise requires ICU admission.");
        let assessor = CareCategoryAssessor::new(
            Arc::new(text.clone()),
            Some(Arc::new(references.clone())),
            5,
            9.32,
            3.0,
        );
        let request = DispatchRequestBuilder::new(ServiceCategory::Hospital)
            .with_summary("Severe burns to both arms")
            .build();

        let assessed = assessor.assess(&request).await.unwrap();
        assert_eq!(
            assessed.assessment,
            Some(Assessment::CareCategories(vec!["burn".into(), "ICU".into()]))
        );
        assert_eq!(references.queries(), vec![("Severe burns to both arms".to_string(), 5)]);
        assert!(text.calls()[0].prompt.contains("burn center"));
    }

    #[tokio::test]
    async fn test_care_assessor_degrades_to_empty_categories() {
        let text = MockTextUnderstanding::new().with_failure(CompletionPurpose::CareCategories, "quota");
        let assessor = CareCategoryAssessor::new(Arc::new(text), None, 5, 9.32, 3.0);
        let request = DispatchRequestBuilder::new(ServiceCategory::Hospital).build();

        let assessed = assessor.assess(&request).await.unwrap();
        assert_eq!(assessed.assessment, Some(Assessment::CareCategories(Vec::new())));
        assert!(matches!(assessed.policy, SelectionPolicy::BestRated { .. }));
    }
}
