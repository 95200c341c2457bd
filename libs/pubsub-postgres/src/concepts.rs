//! Concept repository - database access for concepts, sources and mappings

use crate::db_error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use conceptpubsub_core::{
    Concept, ConceptMap, ConceptReferenceTerm, ConceptRepository, ConceptSource, Result,
};
use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::HashMap;
use uuid::Uuid;

const SOURCE_COLUMNS: &str = "s.uuid AS source_uuid, s.name AS source_name, \
     s.description AS source_description, s.hl7_code AS source_hl7_code, \
     s.date_created AS source_date_created";

#[derive(Debug, Clone)]
pub struct PgConceptRepository {
    pool: PgPool,
    reference_terms: bool,
}

impl PgConceptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            reference_terms: true,
        }
    }

    /// Advertise (or hide) reference-term support to strategy detection
    pub fn with_reference_terms(mut self, enabled: bool) -> Self {
        self.reference_terms = enabled;
        self
    }

    /// Insert a bare concept. Used for seeding; concepts are normally owned
    /// by the dictionary that writes this table.
    pub async fn insert_concept(&self, id: i32, uuid: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO concept (concept_id, uuid) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(uuid)
        .execute(&self.pool)
        .await
        .map_err(db_error("inserting concept"))?;
        Ok(())
    }

    /// Attach the persisted mappings to each concept row, keeping row order
    async fn hydrate(&self, rows: Vec<PgRow>) -> Result<Vec<Concept>> {
        let mut concepts: Vec<Concept> = rows
            .into_iter()
            .map(|row| Concept {
                id: row.get("concept_id"),
                uuid: row.get("uuid"),
                mappings: Vec::new(),
            })
            .collect();

        if concepts.is_empty() {
            return Ok(concepts);
        }

        let ids: Vec<i32> = concepts.iter().map(|c| c.id).collect();
        let mut mappings = self.fetch_mappings(&ids).await?;
        for concept in concepts.iter_mut() {
            if let Some(found) = mappings.remove(&concept.id) {
                concept.mappings = found;
            }
        }

        Ok(concepts)
    }

    async fn fetch_mappings(&self, concept_ids: &[i32]) -> Result<HashMap<i32, Vec<ConceptMap>>> {
        let sql = format!(
            r#"
            SELECT m.concept_id, m.code, m.reference_term_uuid, m.map_type, {}
            FROM concept_map m
            JOIN concept_source s ON s.uuid = m.source_uuid
            WHERE m.concept_id = ANY($1)
            ORDER BY m.concept_map_id
            "#,
            SOURCE_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(concept_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("loading concept mappings"))?;

        let mut by_concept: HashMap<i32, Vec<ConceptMap>> = HashMap::new();
        for row in rows {
            let concept_id: i32 = row.get("concept_id");
            by_concept.entry(concept_id).or_default().push(ConceptMap {
                source: source_from_row(&row),
                code: row.get("code"),
                reference_term: row.get("reference_term_uuid"),
                map_type: row.get("map_type"),
            });
        }

        Ok(by_concept)
    }
}

fn source_from_row(row: &PgRow) -> ConceptSource {
    ConceptSource {
        uuid: row.get("source_uuid"),
        name: row.get("source_name"),
        description: row.get("source_description"),
        hl7_code: row.get("source_hl7_code"),
        date_created: row.get::<DateTime<Utc>, _>("source_date_created"),
    }
}

#[async_trait]
impl ConceptRepository for PgConceptRepository {
    async fn list_concepts(&self, offset: usize, limit: usize) -> Result<Vec<Concept>> {
        let rows = sqlx::query(
            "SELECT concept_id, uuid FROM concept ORDER BY concept_id LIMIT $1 OFFSET $2",
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing concepts"))?;

        self.hydrate(rows).await
    }

    async fn get_concept_by_id(&self, id: i32) -> Result<Option<Concept>> {
        let row = sqlx::query("SELECT concept_id, uuid FROM concept WHERE concept_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("loading concept"))?;

        Ok(self.hydrate(row.into_iter().collect()).await?.pop())
    }

    async fn get_concept_by_mapping(&self, source: &str, code: &str) -> Result<Option<Concept>> {
        let row = sqlx::query(
            r#"
            SELECT c.concept_id, c.uuid
            FROM concept c
            JOIN concept_map m ON m.concept_id = c.concept_id
            JOIN concept_source s ON s.uuid = m.source_uuid
            WHERE (s.name = $1 OR s.hl7_code = $1) AND m.code = $2
            ORDER BY c.concept_id
            LIMIT 1
            "#,
        )
        .bind(source)
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("loading concept by mapping"))?;

        Ok(self.hydrate(row.into_iter().collect()).await?.pop())
    }

    async fn get_source_by_uuid(&self, uuid: Uuid) -> Result<Option<ConceptSource>> {
        let sql = format!("SELECT {} FROM concept_source s WHERE s.uuid = $1", SOURCE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("loading concept source"))?;

        Ok(row.as_ref().map(source_from_row))
    }

    async fn save_source(&self, source: &ConceptSource) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO concept_source (uuid, name, description, hl7_code, date_created)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (uuid) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                hl7_code = EXCLUDED.hl7_code
            "#,
        )
        .bind(source.uuid)
        .bind(&source.name)
        .bind(&source.description)
        .bind(&source.hl7_code)
        .bind(source.date_created)
        .execute(&self.pool)
        .await
        .map_err(db_error("saving concept source"))?;
        Ok(())
    }

    async fn save_concept(&self, concept: &Concept) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("starting transaction"))?;

        sqlx::query(
            "INSERT INTO concept (concept_id, uuid) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(concept.id)
        .bind(concept.uuid)
        .execute(&mut *tx)
        .await
        .map_err(db_error("saving concept"))?;

        // Mappings are append-only here; already persisted rows hit the
        // unique constraint and are skipped.
        for mapping in &concept.mappings {
            sqlx::query(
                r#"
                INSERT INTO concept_map (concept_id, source_uuid, code, reference_term_uuid, map_type)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (concept_id, source_uuid, code) DO NOTHING
                "#,
            )
            .bind(concept.id)
            .bind(mapping.source.uuid)
            .bind(&mapping.code)
            .bind(mapping.reference_term)
            .bind(&mapping.map_type)
            .execute(&mut *tx)
            .await
            .map_err(db_error("saving concept mapping"))?;
        }

        tx.commit().await.map_err(db_error("committing concept"))?;
        Ok(())
    }

    async fn get_reference_term(
        &self,
        source: &ConceptSource,
        code: &str,
    ) -> Result<Option<ConceptReferenceTerm>> {
        let sql = format!(
            r#"
            SELECT t.uuid AS term_uuid, t.code, {}
            FROM concept_reference_term t
            JOIN concept_source s ON s.uuid = t.source_uuid
            WHERE t.source_uuid = $1 AND t.code = $2
            "#,
            SOURCE_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(source.uuid)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("loading reference term"))?;

        Ok(row.map(|row| ConceptReferenceTerm {
            uuid: row.get("term_uuid"),
            source: source_from_row(&row),
            code: row.get("code"),
        }))
    }

    async fn save_reference_term(
        &self,
        term: &ConceptReferenceTerm,
    ) -> Result<ConceptReferenceTerm> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let stored: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO concept_reference_term (uuid, source_uuid, code)
            VALUES ($1, $2, $3)
            ON CONFLICT (source_uuid, code) DO UPDATE SET code = EXCLUDED.code
            RETURNING uuid
            "#,
        )
        .bind(term.uuid)
        .bind(term.source.uuid)
        .bind(&term.code)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("saving reference term"))?;

        if stored != term.uuid {
            tracing::debug!(
                source = %term.source.name,
                code = %term.code,
                "Reference term already stored, reusing it"
            );
        }

        Ok(ConceptReferenceTerm {
            uuid: stored,
            ..term.clone()
        })
    }

    fn supports_reference_terms(&self) -> bool {
        self.reference_terms
    }
}
