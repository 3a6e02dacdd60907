//! Domain layer - classification, evidence, orchestration and FAIR scoring

pub mod classifier;
pub mod error;
pub mod evaluation;
pub mod evidence;
pub mod llm;
pub mod orchestrator;
pub mod query;
pub mod response;
pub mod rules;
pub mod text;

pub use classifier::{Classification, ClassificationReason, ClassifierConfig, DomainClassifier};
pub use error::DomainError;
pub use evaluation::{
    CompositeWeights, EvaluationResult, FairEvaluator, MetricName, MetricScore, RobustnessConfig,
};
pub use evidence::{
    EvidenceMatch, EvidenceProvider, EvidenceRetriever, EvidenceSource, EvidenceStore,
};
pub use llm::{
    AnswerGenerator, BackendKind, BackendSpec, GenerationParams, GeneratorFactory, LlmProvider,
    LlmRequest, LlmResponse, ModelRegistry, ProviderGenerator, SynthesisPrompt,
};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use query::{Domain, Query};
pub use response::{AgentResponse, PipelineNote, ResponseStatus};
pub use rules::RuleTables;
