//! Query orchestration
//!
//! Classifier -> retriever -> generation backend -> enhancer -> evaluator.
//! Cross-domain queries fork into a finance and a medical branch that run
//! concurrently and are merged before evaluation. Everything except a harmful
//! query is absorbed into the response so callers always get a full result.

mod enhancer;
mod prompt;
mod stage;

pub use enhancer::{append_disclaimers, ResponseEnhancer, MAX_STEPS};
pub use prompt::{build_prompt, format_evidence};
pub use stage::{PipelineStage, StageTracker};

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use super::classifier::{Classification, ClassifierConfig, DomainClassifier};
use super::evaluation::{
    Aggregator, EvaluationResult, FairEvaluator, RobustnessConfig, ScoringInput,
};
use super::evidence::{EvidenceMatch, EvidenceProvider, EvidenceRetriever, DEFAULT_TOP_K};
use super::llm::{AnswerGenerator, SynthesisPrompt};
use super::response::{AgentResponse, PipelineNote, ResponseStatus};
use super::rules::{HarmTier, RuleTables};
use super::{Domain, DomainError, Query};

/// `model_used` reported when the crisis template replaces generation
pub const SAFETY_TEMPLATE_MODEL: &str = "safety_template";
/// `model_used` reported for caller-supplied answers
pub const EXTERNAL_ANSWER_MODEL: &str = "external";

const GENERAL_CONFIDENCE: f64 = 0.3;
const CRISIS_CONFIDENCE: f64 = 0.9;
const FALLBACK_PENALTY: f64 = 0.5;

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    pub top_k: usize,
    pub synthesis_timeout: Duration,
    pub max_query_chars: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            synthesis_timeout: Duration::from_secs(60),
            max_query_chars: 4000,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_synthesis_timeout(mut self, timeout: Duration) -> Self {
        self.synthesis_timeout = timeout;
        self
    }

    pub fn with_max_query_chars(mut self, max: usize) -> Self {
        self.max_query_chars = max;
        self
    }
}

/// Result of one domain branch up to the enhanced stage
#[derive(Debug)]
struct BranchOutcome {
    domain: Domain,
    raw: String,
    enhanced: String,
    evidence: Vec<EvidenceMatch>,
    fallback_reason: Option<String>,
    stages: StageTracker,
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    rules: Arc<RuleTables>,
    classifier: DomainClassifier,
    retriever: EvidenceRetriever,
    enhancer: ResponseEnhancer,
    evaluator: FairEvaluator,
    aggregator: Aggregator,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        rules: Arc<RuleTables>,
        provider: Arc<dyn EvidenceProvider>,
        classifier_config: ClassifierConfig,
        robustness: RobustnessConfig,
        config: OrchestratorConfig,
    ) -> Self {
        let classifier = DomainClassifier::new(rules.clone(), classifier_config);
        let retriever = EvidenceRetriever::new(provider, rules.clone());
        let evaluator = FairEvaluator::standard(
            rules.clone(),
            classifier.clone(),
            retriever.clone(),
            robustness,
        );

        Self {
            enhancer: ResponseEnhancer::new(rules.clone()),
            rules,
            classifier,
            retriever,
            evaluator,
            aggregator: Aggregator,
            config,
        }
    }

    pub fn classifier(&self) -> &DomainClassifier {
        &self.classifier
    }

    pub fn retriever(&self) -> &EvidenceRetriever {
        &self.retriever
    }

    pub fn rules(&self) -> &RuleTables {
        &self.rules
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Reject empty or oversized query text
    pub fn validate(&self, text: &str) -> Result<(), DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::validation("Query text cannot be empty"));
        }
        if text.chars().count() > self.config.max_query_chars {
            return Err(DomainError::validation(format!(
                "Query text exceeds {} characters",
                self.config.max_query_chars
            )));
        }
        Ok(())
    }

    /// Run the full pipeline for one query
    ///
    /// Only validation errors surface as `Err`; backend failures degrade the
    /// response instead.
    #[instrument(
        skip(self, query, generator),
        fields(session_id = %query.session_id(), backend = %generator.backend_name())
    )]
    pub async fn process(
        &self,
        query: &Query,
        generator: &dyn AnswerGenerator,
    ) -> Result<EvaluationResult, DomainError> {
        let started = Instant::now();
        self.validate(query.text())?;

        let query_id = uuid::Uuid::new_v4().to_string();
        let mut stages = StageTracker::default();

        let classification = self.classifier.classify(query.text());
        stages.advance(PipelineStage::Classified)?;
        debug!(
            query_id = %query_id,
            domain = %classification.domain,
            confidence = classification.confidence,
            reason = ?classification.reason,
            "Query classified"
        );

        let harm = self
            .rules
            .safety
            .scan(query.text())
            .filter(|m| m.tier >= HarmTier::High);

        let response = if let Some(harm) = harm {
            warn!(query_id = %query_id, category = %harm.category, "Harmful query detected");
            stages.advance(PipelineStage::Enhanced)?;
            self.crisis_response(classification.domain, harm.category)
        } else {
            match classification.domain {
                Domain::General => {
                    self.answer_general(query.text(), generator, &mut stages).await?
                }
                Domain::Finance | Domain::Medical => {
                    let branch = self
                        .run_branch(classification.domain, query.text(), generator, 0)
                        .await?;
                    stages.join(&[(branch.domain, &branch.stages)])?;
                    self.finish_single(query.text(), &classification, branch, generator)
                }
                Domain::CrossDomain => {
                    self.answer_cross_domain(query.text(), &classification, generator, &mut stages)
                        .await?
                }
            }
        };

        let result = self.evaluate_response(query.text(), query_id, response, None, started);
        stages.advance(PipelineStage::Evaluated)?;
        stages.advance(PipelineStage::Done)?;

        info!(
            query_id = %result.query_id,
            domain = %result.response.domain,
            status = result.response.status.as_str(),
            confidence = result.response.confidence,
            evidence_count = result.response.evidence_used.len(),
            elapsed_ms = result.processing_time_ms,
            stages = %stages.describe(),
            "Query processed"
        );

        Ok(result)
    }

    /// Score an externally produced answer without calling a backend
    pub fn evaluate_answer(
        &self,
        query: &Query,
        answer: &str,
        domain: Option<Domain>,
        confidence: Option<f64>,
        variants: Option<&[String]>,
    ) -> Result<EvaluationResult, DomainError> {
        let started = Instant::now();
        self.validate(query.text())?;

        let classification = self.classifier.classify(query.text());
        let domain = domain.unwrap_or(classification.domain);
        let evidence = match domain {
            Domain::General => Vec::new(),
            _ => self
                .retriever
                .retrieve(query.text(), domain, self.config.top_k),
        };

        let confidence = match (confidence, domain) {
            (Some(c), _) if !c.is_finite() => {
                return Err(DomainError::validation("Confidence must be a finite number"));
            }
            (Some(c), _) => c.clamp(0.0, 1.0),
            (None, Domain::General) => GENERAL_CONFIDENCE,
            (None, _) => response_confidence(&classification, &evidence, false),
        };

        let response = AgentResponse {
            domain,
            raw_text: answer.to_string(),
            enhanced_text: answer.to_string(),
            evidence_used: evidence,
            confidence,
            status: ResponseStatus::Success,
            model_used: EXTERNAL_ANSWER_MODEL.to_string(),
            notes: Vec::new(),
        };

        Ok(self.evaluate_response(
            query.text(),
            uuid::Uuid::new_v4().to_string(),
            response,
            variants,
            started,
        ))
    }

    fn evaluate_response(
        &self,
        query: &str,
        query_id: String,
        response: AgentResponse,
        variants: Option<&[String]>,
        started: Instant,
    ) -> EvaluationResult {
        let mut input = ScoringInput::new(query, &response.enhanced_text, response.domain)
            .with_evidence(&response.evidence_used)
            .with_confidence(response.confidence);
        if let Some(variants) = variants {
            input = input.with_variants(variants);
        }

        let scores = self.evaluator.evaluate(&input);
        self.aggregator
            .aggregate(query_id, response, scores, started.elapsed())
    }

    fn crisis_response(&self, domain: Domain, category: String) -> AgentResponse {
        let text = self.rules.safety.crisis_response.clone();
        AgentResponse {
            domain,
            raw_text: text.clone(),
            enhanced_text: text,
            evidence_used: Vec::new(),
            confidence: CRISIS_CONFIDENCE,
            status: ResponseStatus::SafetyIntervention,
            model_used: SAFETY_TEMPLATE_MODEL.to_string(),
            notes: vec![PipelineNote::HarmfulQueryDetected { category }],
        }
    }

    async fn answer_general(
        &self,
        query: &str,
        generator: &dyn AnswerGenerator,
        stages: &mut StageTracker,
    ) -> Result<AgentResponse, DomainError> {
        let prompt = build_prompt(&self.rules, Domain::General, query, &[], 0);
        let (raw, fallback_reason) = self
            .synthesize(Domain::General, query, &prompt, generator)
            .await;
        stages.advance(PipelineStage::Synthesized)?;

        let enhanced = self.enhancer.structure(&raw);
        stages.advance(PipelineStage::Enhanced)?;

        let mut notes = vec![PipelineNote::ClassificationAmbiguous];
        let mut confidence = GENERAL_CONFIDENCE;
        let mut status = ResponseStatus::Success;
        if let Some(reason) = fallback_reason {
            notes.push(PipelineNote::SynthesisFallback {
                domain: Domain::General,
                reason,
            });
            confidence *= FALLBACK_PENALTY;
            status = ResponseStatus::Degraded;
        }

        Ok(AgentResponse {
            domain: Domain::General,
            raw_text: raw,
            enhanced_text: enhanced,
            evidence_used: Vec::new(),
            confidence,
            status,
            model_used: generator.backend_name().to_string(),
            notes,
        })
    }

    /// Evidence, synthesis and structuring for one specialized domain
    async fn run_branch(
        &self,
        domain: Domain,
        query: &str,
        generator: &dyn AnswerGenerator,
        offset: usize,
    ) -> Result<BranchOutcome, DomainError> {
        let mut stages = StageTracker::starting_at(PipelineStage::Classified);

        let evidence = self.retriever.retrieve(query, domain, self.config.top_k);
        stages.advance(PipelineStage::EvidenceGathered)?;
        self.run_branch_with_evidence(domain, query, generator, evidence, offset, stages)
            .await
    }

    async fn run_branch_with_evidence(
        &self,
        domain: Domain,
        query: &str,
        generator: &dyn AnswerGenerator,
        evidence: Vec<EvidenceMatch>,
        offset: usize,
        mut stages: StageTracker,
    ) -> Result<BranchOutcome, DomainError> {
        let prompt = build_prompt(&self.rules, domain, query, &evidence, offset);
        let (raw, fallback_reason) = self.synthesize(domain, query, &prompt, generator).await;
        stages.advance(PipelineStage::Synthesized)?;

        let enhanced = self.enhancer.enhance_branch(&raw, &evidence, offset);
        stages.advance(PipelineStage::Enhanced)?;

        Ok(BranchOutcome {
            domain,
            raw,
            enhanced,
            evidence,
            fallback_reason,
            stages,
        })
    }

    fn finish_single(
        &self,
        query: &str,
        classification: &Classification,
        branch: BranchOutcome,
        generator: &dyn AnswerGenerator,
    ) -> AgentResponse {
        let disclaimers = self
            .enhancer
            .disclaimers(query, &branch.raw, &[branch.domain]);
        let enhanced = append_disclaimers(&branch.enhanced, &disclaimers);

        let mut notes = Vec::new();
        note_branch(&mut notes, &branch);
        let degraded = branch.fallback_reason.is_some();

        AgentResponse {
            domain: branch.domain,
            raw_text: branch.raw,
            enhanced_text: enhanced,
            confidence: response_confidence(classification, &branch.evidence, degraded),
            evidence_used: branch.evidence,
            status: if degraded {
                ResponseStatus::Degraded
            } else {
                ResponseStatus::Success
            },
            model_used: generator.backend_name().to_string(),
            notes,
        }
    }

    async fn answer_cross_domain(
        &self,
        query: &str,
        classification: &Classification,
        generator: &dyn AnswerGenerator,
        stages: &mut StageTracker,
    ) -> Result<AgentResponse, DomainError> {
        let finance_evidence = self.retriever.retrieve(query, Domain::Finance, self.config.top_k);
        let medical_evidence = self.retriever.retrieve(query, Domain::Medical, self.config.top_k);
        let medical_offset = finance_evidence.len();

        let gathered = || {
            let mut stages = StageTracker::starting_at(PipelineStage::Classified);
            stages
                .advance(PipelineStage::EvidenceGathered)
                .map(|_| stages)
        };

        let (finance_stages, medical_stages) = (gathered()?, gathered()?);

        let (finance, medical) = futures::join!(
            self.run_branch_with_evidence(
                Domain::Finance,
                query,
                generator,
                finance_evidence,
                0,
                finance_stages,
            ),
            self.run_branch_with_evidence(
                Domain::Medical,
                query,
                generator,
                medical_evidence,
                medical_offset,
                medical_stages,
            ),
        );
        let (finance, medical) = (finance?, medical?);
        stages.join(&[
            (Domain::Finance, &finance.stages),
            (Domain::Medical, &medical.stages),
        ])?;

        let raw = merge_perspectives(&finance.raw, &medical.raw);
        let merged = merge_perspectives(&finance.enhanced, &medical.enhanced);
        let disclaimers =
            self.enhancer
                .disclaimers(query, &raw, &[Domain::Finance, Domain::Medical]);

        let mut notes = Vec::new();
        note_branch(&mut notes, &finance);
        note_branch(&mut notes, &medical);
        let degraded = finance.fallback_reason.is_some() || medical.fallback_reason.is_some();

        let mut evidence = finance.evidence;
        evidence.extend(medical.evidence);

        Ok(AgentResponse {
            domain: Domain::CrossDomain,
            raw_text: raw,
            enhanced_text: append_disclaimers(&merged, &disclaimers),
            confidence: response_confidence(classification, &evidence, degraded),
            evidence_used: evidence,
            status: if degraded {
                ResponseStatus::Degraded
            } else {
                ResponseStatus::Success
            },
            model_used: generator.backend_name().to_string(),
            notes,
        })
    }

    /// Generated text, or the domain fallback template plus the failure reason
    async fn synthesize(
        &self,
        domain: Domain,
        query: &str,
        prompt: &SynthesisPrompt,
        generator: &dyn AnswerGenerator,
    ) -> (String, Option<String>) {
        let timeout = self.config.synthesis_timeout;
        let reason = match tokio::time::timeout(timeout, generator.generate(prompt)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => return (text, None),
            Ok(Ok(_)) => "backend returned an empty answer".to_string(),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("backend timed out after {}ms", timeout.as_millis()),
        };

        warn!(
            domain = %domain,
            backend = %generator.backend_name(),
            reason = %reason,
            "Synthesis failed, using fallback answer"
        );
        let fallback = self.rules.fallback.for_domain(domain).replace("{query}", query.trim());
        (fallback, Some(reason))
    }
}

fn note_branch(notes: &mut Vec<PipelineNote>, branch: &BranchOutcome) {
    if branch.evidence.is_empty() {
        notes.push(PipelineNote::EvidenceUnavailable {
            domain: branch.domain,
        });
    }
    if let Some(reason) = &branch.fallback_reason {
        notes.push(PipelineNote::SynthesisFallback {
            domain: branch.domain,
            reason: reason.clone(),
        });
    }
}

fn merge_perspectives(finance: &str, medical: &str) -> String {
    format!(
        "### Financial Perspective\n\n{}\n\n---\n\n### Medical Perspective\n\n{}",
        finance.trim(),
        medical.trim()
    )
}

/// `0.3 + 0.4 * classification + 0.3 * best evidence reliability`, halved for fallbacks
fn response_confidence(
    classification: &Classification,
    evidence: &[EvidenceMatch],
    degraded: bool,
) -> f64 {
    let top_reliability = evidence
        .iter()
        .map(|m| m.source.reliability_score)
        .fold(0.0_f64, f64::max);
    let confidence =
        (0.3 + 0.4 * classification.confidence + 0.3 * top_reliability).clamp(0.0, 1.0);

    if degraded {
        confidence * FALLBACK_PENALTY
    } else {
        confidence
    }
}
