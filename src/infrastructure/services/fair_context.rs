//! Process-wide context: shared read-only tables plus the switchable backend

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::domain::classifier::Classification;
use crate::domain::evaluation::{CompositeWeights, EvaluationResult};
use crate::domain::evidence::EvidenceStore;
use crate::domain::llm::{AnswerGenerator, BackendSpec, GeneratorFactory, ModelRegistry};
use crate::domain::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::domain::{Domain, DomainError, Query};
use crate::infrastructure::data;
use crate::infrastructure::llm::HttpGeneratorFactory;
use crate::infrastructure::observability::record_query;

/// Backend handle a query holds for its whole run
#[derive(Debug, Clone)]
pub struct ActiveBackend {
    pub spec: BackendSpec,
    pub generator: Arc<dyn AnswerGenerator>,
}

#[derive(Debug)]
pub struct FairContext {
    orchestrator: Orchestrator,
    registry: ModelRegistry,
    factory: Arc<dyn GeneratorFactory>,
    active: RwLock<ActiveBackend>,
    weights: CompositeWeights,
}

impl FairContext {
    pub fn new(
        orchestrator: Orchestrator,
        registry: ModelRegistry,
        factory: Arc<dyn GeneratorFactory>,
        active: &str,
        weights: CompositeWeights,
    ) -> Result<Self, DomainError> {
        let spec = registry.get(active)?.clone();
        let generator = factory.create(&spec)?;

        Ok(Self {
            orchestrator,
            registry,
            factory,
            active: RwLock::new(ActiveBackend { spec, generator }),
            weights,
        })
    }

    /// Build everything from configuration with the HTTP backends
    pub fn from_config(config: &AppConfig) -> Result<Self, DomainError> {
        let (rules, store) = data::load_all(&config.data)?;
        let pipeline = &config.pipeline;

        let orchestrator = Orchestrator::new(
            Arc::new(rules),
            Arc::new(store),
            pipeline.classifier,
            pipeline.robustness,
            OrchestratorConfig::default()
                .with_top_k(pipeline.top_k)
                .with_max_query_chars(pipeline.max_query_chars)
                .with_synthesis_timeout(Duration::from_secs(config.backend.synthesis_timeout_secs)),
        );

        let factory = HttpGeneratorFactory::new(
            config.backend.generation,
            Duration::from_secs(config.backend.request_timeout_secs),
        );

        Self::new(
            orchestrator,
            ModelRegistry::new(config.backend.models.clone())?,
            Arc::new(factory),
            &config.backend.active,
            pipeline.composite_weights,
        )
    }

    /// Context over the built-in data, for callers that bring their own factory
    pub fn with_builtin_data(
        factory: Arc<dyn GeneratorFactory>,
        registry: ModelRegistry,
        active: &str,
        config: OrchestratorConfig,
    ) -> Result<Self, DomainError> {
        let config_defaults = AppConfig::default().pipeline;
        let orchestrator = Orchestrator::new(
            Arc::new(crate::domain::rules::RuleTables::builtin()?),
            Arc::new(EvidenceStore::builtin()?),
            config_defaults.classifier,
            config_defaults.robustness,
            config,
        );
        Self::new(orchestrator, registry, factory, active, config_defaults.composite_weights)
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn composite_weights(&self) -> &CompositeWeights {
        &self.weights
    }

    pub async fn active_backend(&self) -> BackendSpec {
        self.active.read().await.spec.clone()
    }

    /// Switch the active backend
    ///
    /// Holds the write lock while the new generator is built, so switches are
    /// serialized and no query sees a half-updated handle. Returns the handle
    /// that is active once the call completes.
    #[instrument(skip(self))]
    pub async fn reconfigure(&self, name: &str) -> Result<ActiveBackend, DomainError> {
        let mut active = self.active.write().await;
        if active.spec.name == name {
            return Ok(active.clone());
        }

        let spec = self.registry.get(name)?.clone();
        let generator = self.factory.create(&spec)?;
        info!(from = %active.spec.name, to = %spec.name, "Generation backend switched");

        *active = ActiveBackend { spec, generator };
        Ok(active.clone())
    }

    /// Run a query, switching backends first when a different model is requested
    pub async fn process_query(
        &self,
        query: &Query,
        model: Option<&str>,
    ) -> Result<EvaluationResult, DomainError> {
        let started = Instant::now();
        self.orchestrator.validate(query.text())?;

        let backend = match model.map(str::trim).filter(|m| !m.is_empty()) {
            Some(name) => self.reconfigure(name).await?,
            None => self.active.read().await.clone(),
        };

        let result = self
            .orchestrator
            .process(query, backend.generator.as_ref())
            .await?;
        record_query(&result, &backend.spec.name, started.elapsed());

        Ok(result)
    }

    pub fn classify(&self, text: &str) -> Result<Classification, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::validation("Query text cannot be empty"));
        }
        Ok(self.orchestrator.classifier().classify(text))
    }

    pub fn evaluate_answer(
        &self,
        query: &Query,
        answer: &str,
        domain: Option<Domain>,
        confidence: Option<f64>,
        variants: Option<&[String]>,
    ) -> Result<EvaluationResult, DomainError> {
        self.orchestrator
            .evaluate_answer(query, answer, domain, confidence, variants)
    }
}


#[cfg(test)]
mod tests {
    use super::mock::context;
    use super::*;

    #[tokio::test]
    async fn test_process_uses_active_backend() {
        let ctx = context();
        let result = ctx
            .process_query(&Query::anonymous("What are the side effects of aspirin?"), None)
            .await
            .unwrap();

        assert_eq!(result.response.model_used, "local-a");
        assert!(result.response.raw_text.contains("Answer from local-a"));
        assert_eq!(result.metrics.len(), 6);
    }

    #[tokio::test]
    async fn test_requested_model_switches_backend() {
        let ctx = context();
        let result = ctx
            .process_query(&Query::anonymous("diabetes"), Some("local-b"))
            .await
            .unwrap();

        assert_eq!(result.response.model_used, "local-b");
        assert_eq!(ctx.active_backend().await.name, "local-b");
    }

    #[tokio::test]
    async fn test_unknown_model_leaves_backend_unchanged() {
        let ctx = context();
        let err = ctx
            .process_query(&Query::anonymous("diabetes"), Some("nope"))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound { .. }));
        assert_eq!(ctx.active_backend().await.name, "local-a");
    }

    #[tokio::test]
    async fn test_rejected_query_leaves_backend_unchanged() {
        let ctx = context();
        let too_long = "a".repeat(ctx.orchestrator().config().max_query_chars + 1);

        for text in ["   ".to_string(), too_long] {
            let err = ctx
                .process_query(&Query::anonymous(text), Some("local-b"))
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::Validation { .. }));
        }

        assert_eq!(ctx.active_backend().await.name, "local-a");
    }

    #[tokio::test]
    async fn test_concurrent_queries_and_switches() {
        let ctx = Arc::new(context());
        let mut handles = Vec::new();
        for i in 0..8 {
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move {
                let model = if i % 2 == 0 { "local-a" } else { "local-b" };
                ctx.process_query(&Query::anonymous("bitcoin"), Some(model))
                    .await
                    .map(|r| (model, r.response.model_used))
            }));
        }

        for handle in handles {
            let (requested, used) = handle.await.unwrap().unwrap();
            assert_eq!(requested, used);
        }
    }

    #[test]
    fn test_classify_rejects_empty() {
        let ctx = context();
        assert!(ctx.classify("  ").is_err());
        assert_eq!(ctx.classify("diabetes").unwrap().domain, Domain::Medical);
    }
}
