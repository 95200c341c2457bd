mod support;

use async_trait::async_trait;
use conceptpubsub_core::{
    memory::MemoryConceptRepository, model::SAME_AS_MAP_TYPE, Concept, ConceptMap,
    ConceptReferenceTerm, ConceptRepository, ConceptSource, ConfigurationError, Error,
    MappingStrategy, Result,
};
use support::TestHarness;
use uuid::Uuid;

#[tokio::test]
async fn two_full_pages_need_three_fetches() {
    let harness = TestHarness::new();
    harness.repo.seed_concepts(2000).await;
    harness.service.create_local_namespace().await.unwrap();

    let report = harness
        .service
        .add_local_mappings_to_all_concepts()
        .await
        .unwrap();

    assert_eq!(harness.service.batch_size(), 1000);
    assert_eq!(harness.repo.page_fetches(), 3);
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.concepts_visited, 2000);
    assert_eq!(report.mappings_added, 2000);
}

#[tokio::test]
async fn short_last_page_ends_the_scan() {
    let harness = TestHarness::new();
    harness.repo.seed_concepts(2500).await;
    harness.service.create_local_namespace().await.unwrap();

    let report = harness
        .service
        .add_local_mappings_to_all_concepts()
        .await
        .unwrap();

    assert_eq!(harness.repo.page_fetches(), 3);
    assert_eq!(report.concepts_visited, 2500);
}

#[tokio::test]
async fn empty_repository_fetches_one_page() {
    let harness = TestHarness::new();
    harness.service.create_local_namespace().await.unwrap();

    let report = harness
        .service
        .add_local_mappings_to_all_concepts()
        .await
        .unwrap();

    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.mappings_added, 0);
}

#[tokio::test]
async fn every_concept_gets_its_id_as_local_code() {
    let harness = TestHarness::new();
    harness.repo.seed_concepts(5).await;
    let local = harness.service.create_local_namespace().await.unwrap();

    harness
        .service
        .add_local_mappings_to_all_concepts()
        .await
        .unwrap();

    for id in 1..=5 {
        let concept = harness.repo.concept(id).await.unwrap();
        let mappings: Vec<_> = concept.mappings_in(&local).collect();
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].code, id.to_string());
    }
}

#[tokio::test]
async fn rerun_does_not_duplicate_mappings() {
    let harness = TestHarness::new().with_batch_size(10);
    harness.repo.seed_concepts(25).await;
    harness.service.create_local_namespace().await.unwrap();

    harness
        .service
        .add_local_mappings_to_all_concepts()
        .await
        .unwrap();
    let after_first = harness.repo.mapping_count().await;

    let report = harness
        .service
        .add_local_mappings_to_all_concepts()
        .await
        .unwrap();

    assert_eq!(after_first, 25);
    assert_eq!(harness.repo.mapping_count().await, after_first);
    assert_eq!(report.mappings_added, 0);
    assert_eq!(report.concepts_visited, 25);
}

#[tokio::test]
async fn existing_foreign_mappings_are_kept() {
    let harness = TestHarness::new();
    let rxnorm = ConceptSource::new("rxnorm", "RxNorm");
    harness.repo.insert_source(rxnorm.clone()).await;
    harness
        .repo
        .insert_concept(Concept::new(1).with_mapping(ConceptMap::direct(rxnorm.clone(), "4567")))
        .await;
    let local = harness.service.create_local_namespace().await.unwrap();

    harness
        .service
        .add_local_mappings_to_all_concepts()
        .await
        .unwrap();

    let concept = harness.repo.concept(1).await.unwrap();
    assert_eq!(concept.mappings.len(), 2);
    assert!(concept.has_mapping_in(&rxnorm));
    assert!(concept.has_mapping_in(&local));
}

#[tokio::test]
async fn sync_without_local_source_fails_on_first_concept() {
    let harness = TestHarness::new();
    harness.repo.seed_concepts(3).await;

    let err = harness
        .service
        .add_local_mappings_to_all_concepts()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Configuration(ConfigurationError::LocalNamespaceNotSet { .. })
    ));
    assert_eq!(harness.repo.mapping_count().await, 0);
}

#[tokio::test]
async fn failed_save_aborts_and_rerun_completes() {
    let harness = TestHarness::new().with_batch_size(10);
    harness.repo.seed_concepts(30).await;
    harness.service.create_local_namespace().await.unwrap();
    harness.repo.fail_on_save(Some(15)).await;

    let err = harness.service.add_local_mappings_to_all_concepts().await;
    assert!(matches!(err, Err(Error::Other(_))));
    assert_eq!(harness.repo.mapping_count().await, 14);

    harness.repo.fail_on_save(None).await;
    let report = harness
        .service
        .add_local_mappings_to_all_concepts()
        .await
        .unwrap();

    assert_eq!(report.mappings_added, 16);
    assert_eq!(harness.repo.mapping_count().await, 30);
}

#[tokio::test]
async fn add_mapping_by_id() {
    let harness = TestHarness::new();
    harness.repo.seed_concepts(2).await;
    let local = harness.service.create_local_namespace().await.unwrap();

    assert!(harness.service.add_local_mapping_by_id(2).await.unwrap());
    assert!(!harness.service.add_local_mapping_by_id(2).await.unwrap());

    assert!(harness.repo.concept(2).await.unwrap().has_mapping_in(&local));
    assert!(!harness.repo.concept(1).await.unwrap().has_mapping_in(&local));
}

#[tokio::test]
async fn add_mapping_to_unknown_concept() {
    let harness = TestHarness::new();
    harness.service.create_local_namespace().await.unwrap();

    let err = harness.service.add_local_mapping_by_id(42).await.unwrap_err();

    assert!(matches!(err, Error::ConceptNotFound(42)));
}

#[tokio::test]
async fn add_mapping_to_loaded_concept_updates_it_in_place() {
    let harness = TestHarness::new();
    harness.repo.seed_concepts(1).await;
    let local = harness.service.create_local_namespace().await.unwrap();
    let mut concept = harness.service.resolve_concept_by_id(1).await.unwrap().unwrap();

    let added = harness
        .service
        .add_local_mapping_to_concept(&mut concept)
        .await
        .unwrap();

    assert!(added);
    assert!(concept.has_mapping_in(&local));
}

#[tokio::test]
async fn reference_term_strategy_is_detected_and_reuses_terms() {
    let harness = TestHarness::with_repo(MemoryConceptRepository::with_reference_terms());
    assert_eq!(harness.service.strategy(), MappingStrategy::ReferenceTerm);

    harness.repo.seed_concepts(3).await;
    let local = harness.service.create_local_namespace().await.unwrap();

    harness
        .service
        .add_local_mappings_to_all_concepts()
        .await
        .unwrap();

    let terms = harness.repo.reference_terms().await;
    assert_eq!(terms.len(), 3);

    let concept = harness.repo.concept(3).await.unwrap();
    let mapping = concept.mappings_in(&local).next().unwrap();
    assert_eq!(mapping.map_type.as_deref(), Some(SAME_AS_MAP_TYPE));
    let term = terms.iter().find(|t| t.code == "3").unwrap();
    assert_eq!(mapping.reference_term, Some(term.uuid));

    harness
        .service
        .add_local_mappings_to_all_concepts()
        .await
        .unwrap();
    assert_eq!(harness.repo.reference_terms().await.len(), 3);
    assert_eq!(harness.repo.mapping_count().await, 3);
}

/// Misses every reference-term lookup, as if another run stored the term
/// between our lookup and our insert.
struct RacingTermWriter(MemoryConceptRepository);

#[async_trait]
impl ConceptRepository for RacingTermWriter {
    async fn list_concepts(&self, offset: usize, limit: usize) -> Result<Vec<Concept>> {
        self.0.list_concepts(offset, limit).await
    }

    async fn get_concept_by_id(&self, id: i32) -> Result<Option<Concept>> {
        self.0.get_concept_by_id(id).await
    }

    async fn get_concept_by_mapping(&self, source: &str, code: &str) -> Result<Option<Concept>> {
        self.0.get_concept_by_mapping(source, code).await
    }

    async fn get_source_by_uuid(&self, uuid: Uuid) -> Result<Option<ConceptSource>> {
        self.0.get_source_by_uuid(uuid).await
    }

    async fn save_source(&self, source: &ConceptSource) -> Result<()> {
        self.0.save_source(source).await
    }

    async fn save_concept(&self, concept: &Concept) -> Result<()> {
        self.0.save_concept(concept).await
    }

    async fn get_reference_term(
        &self,
        _source: &ConceptSource,
        _code: &str,
    ) -> Result<Option<ConceptReferenceTerm>> {
        Ok(None)
    }

    async fn save_reference_term(
        &self,
        term: &ConceptReferenceTerm,
    ) -> Result<ConceptReferenceTerm> {
        self.0.save_reference_term(term).await
    }

    fn supports_reference_terms(&self) -> bool {
        true
    }
}

#[tokio::test]
async fn concurrently_stored_reference_term_is_used() {
    let repo = RacingTermWriter(MemoryConceptRepository::with_reference_terms());
    let local = ConceptSource::new("CLINIC+local", "Local concept source of CLINIC");
    repo.0.insert_source(local.clone()).await;
    repo.0.insert_concept(Concept::new(7)).await;

    let existing = ConceptReferenceTerm::new(local.clone(), "7");
    repo.0.save_reference_term(&existing).await.unwrap();

    let mut concept = repo.0.concept(7).await.unwrap();
    let added = MappingStrategy::ReferenceTerm
        .attach(&repo, &mut concept, &local)
        .await
        .unwrap();

    assert!(added);
    assert_eq!(concept.mappings[0].reference_term, Some(existing.uuid));
    assert_eq!(repo.0.reference_terms().await.len(), 1);

    let stored = repo.0.concept(7).await.unwrap();
    assert_eq!(stored.mappings[0].reference_term, Some(existing.uuid));
}

#[tokio::test]
async fn explicit_strategy_overrides_detection() {
    let harness = TestHarness::with_repo(MemoryConceptRepository::with_reference_terms())
        .with_strategy(MappingStrategy::Direct);
    harness.repo.seed_concepts(2).await;
    harness.service.create_local_namespace().await.unwrap();

    harness
        .service
        .add_local_mappings_to_all_concepts()
        .await
        .unwrap();

    assert!(harness.repo.reference_terms().await.is_empty());
    assert_eq!(harness.repo.mapping_count().await, 2);
}

#[tokio::test]
async fn report_serializes_camel_case() {
    let harness = TestHarness::new();
    harness.service.create_local_namespace().await.unwrap();
    let report = harness
        .service
        .add_local_mappings_to_all_concepts()
        .await
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["pagesFetched"], 1);
    assert_eq!(json["mappingsAdded"], 0);
}
