//! SQLite storage layer for checklistgen
//!
//! This module handles persistent storage of:
//! - Segment embeddings, keyed by document fingerprint and scope
//! - Generated checklists and their status indicators

mod schema;

pub use schema::SCHEMA;

use crate::checklist::{ChecklistNode, StatusIndicatorSet};
use crate::error::{ChecklistError, Result};
use crate::ingest::{Fingerprint, Segment};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;

/// Segments and their embeddings, order-aligned
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEmbeddings {
    pub segments: Vec<Segment>,
    pub embeddings: Vec<Vec<f32>>,
}

/// Fingerprint-keyed embedding store, partitioned by scope
///
/// Scopes never share entries, even for identical fingerprints.
pub trait EmbeddingCache {
    /// Cached segments for a document; damaged entries read as a miss
    fn lookup(&self, fingerprint: &Fingerprint, scope: &str) -> Result<Option<CachedEmbeddings>>;

    /// Save segments with their embeddings, replacing any previous entry
    fn store(
        &self,
        fingerprint: &Fingerprint,
        scope: &str,
        name: &str,
        segments: &[Segment],
        embeddings: &[Vec<f32>],
    ) -> Result<()>;
}

/// A persisted checklist
#[derive(Debug, Clone, Serialize)]
pub struct StoredChecklist {
    /// Nodes in pre-order, root first
    pub nodes: Vec<ChecklistNode>,
    pub status_indicators: Vec<String>,
}

/// System of record for generated checklists
pub trait Datastore {
    /// Insert a checklist and its status indicators as one unit
    fn save_checklist(
        &self,
        nodes: &[ChecklistNode],
        indicators: Option<&StatusIndicatorSet>,
    ) -> Result<()>;

    fn load_checklist(&self, root_id: &str) -> Result<Option<StoredChecklist>>;
}

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        tracing::debug!("Opened database at {}", path.display());

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Initialize the database schema
    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(DatabaseStats {
            documents: count("SELECT COUNT(*) FROM embedded_documents")?,
            segments: count("SELECT COUNT(*) FROM segment_embeddings")?,
            checklists: count("SELECT COUNT(*) FROM checklist_nodes WHERE parent_id IS NULL")?,
            checklist_nodes: count("SELECT COUNT(*) FROM checklist_nodes")?,
            status_indicators: count("SELECT COUNT(*) FROM status_indicators")?,
        })
    }

    fn document_id(&self, fingerprint: &Fingerprint, scope: &str) -> Result<Option<(String, usize)>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, segment_count FROM embedded_documents WHERE fingerprint = ?1 AND scope = ?2",
                params![fingerprint.as_str(), scope],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        Ok(row.map(|(id, count)| (id, count.max(0) as usize)))
    }
}

impl EmbeddingCache for Database {
    fn lookup(&self, fingerprint: &Fingerprint, scope: &str) -> Result<Option<CachedEmbeddings>> {
        let Some((document_id, expected)) = self.document_id(fingerprint, scope)? else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            r#"
            SELECT order_number, content, embedding
            FROM segment_embeddings WHERE document_id = ?1
            ORDER BY order_number
            "#,
        )?;

        let rows = stmt.query_map(params![document_id], |row| {
            Ok(SegmentRow {
                order_number: row.get(0)?,
                content: row.get(1)?,
                embedding: row.get(2)?,
            })
        })?;

        let mut segments = Vec::new();
        let mut embeddings = Vec::new();
        for row in rows {
            let row = row?;
            let index = row.order_number.max(0) as usize;
            segments.push(Segment::new(index, row.content));
            if let Some(vector) = row.embedding.as_deref().and_then(blob_to_embedding) {
                embeddings.push(vector);
            }
        }

        let aligned = segments.len() == expected
            && embeddings.len() == segments.len()
            && segments.iter().enumerate().all(|(i, s)| s.index == i)
            && embeddings.windows(2).all(|w| w[0].len() == w[1].len());

        if !aligned {
            tracing::warn!(
                "Embedding cache entry for {} in scope '{}' is damaged ({} of {} segments, {} embeddings), recomputing",
                fingerprint,
                scope,
                segments.len(),
                expected,
                embeddings.len()
            );
            return Ok(None);
        }

        tracing::debug!("Embedding cache hit for {} ({} segments)", fingerprint, expected);
        Ok(Some(CachedEmbeddings {
            segments,
            embeddings,
        }))
    }

    fn store(
        &self,
        fingerprint: &Fingerprint,
        scope: &str,
        name: &str,
        segments: &[Segment],
        embeddings: &[Vec<f32>],
    ) -> Result<()> {
        if segments.len() != embeddings.len() {
            return Err(ChecklistError::InputValidation(format!(
                "cannot cache {} segments with {} embeddings",
                segments.len(),
                embeddings.len()
            )));
        }

        let tx = self.conn.unchecked_transaction()?;

        // Last write wins for the same document in the same scope
        tx.execute(
            r#"
            DELETE FROM segment_embeddings WHERE document_id IN (
                SELECT id FROM embedded_documents WHERE fingerprint = ?1 AND scope = ?2
            )
            "#,
            params![fingerprint.as_str(), scope],
        )?;
        tx.execute(
            "DELETE FROM embedded_documents WHERE fingerprint = ?1 AND scope = ?2",
            params![fingerprint.as_str(), scope],
        )?;

        let document_id = uuid::Uuid::new_v4().to_string();
        tx.execute(
            r#"
            INSERT INTO embedded_documents (id, fingerprint, scope, name, segment_count, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                document_id,
                fingerprint.as_str(),
                scope,
                name,
                segments.len() as i64,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO segment_embeddings (document_id, order_number, content, embedding)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for (order_number, (segment, embedding)) in segments.iter().zip(embeddings).enumerate() {
                stmt.execute(params![
                    document_id,
                    order_number as i64,
                    segment.text,
                    embedding_to_blob(embedding),
                ])?;
            }
        }

        tx.commit()?;
        tracing::debug!(
            "Cached {} segment embeddings for '{}' ({})",
            segments.len(),
            name,
            fingerprint
        );
        Ok(())
    }
}

impl Datastore for Database {
    fn save_checklist(
        &self,
        nodes: &[ChecklistNode],
        indicators: Option<&StatusIndicatorSet>,
    ) -> Result<()> {
        let Some(root) = nodes.first() else {
            return Ok(());
        };

        let tx = self.conn.unchecked_transaction()?;
        let created_at = chrono::Utc::now().to_rfc3339();

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO checklist_nodes (
                    id, checklist_root_id, parent_id, position, order_number,
                    title, description, priority, time_estimate, project_id, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )?;
            for (position, node) in nodes.iter().enumerate() {
                stmt.execute(params![
                    node.id,
                    node.checklist_root_id,
                    node.parent_id,
                    position as i64,
                    node.order_number as i64,
                    node.title,
                    node.description,
                    node.priority,
                    node.time_estimate,
                    node.project_id,
                    created_at,
                ])?;
            }
        }

        if let Some(indicators) = indicators {
            let mut stmt = tx.prepare(
                "INSERT INTO status_indicators (checklist_id, position, label) VALUES (?1, ?2, ?3)",
            )?;
            for (position, label) in indicators.labels().iter().enumerate() {
                stmt.execute(params![root.id, position as i64, label])?;
            }
        }

        tx.commit()?;
        tracing::info!("Saved checklist {} ({} nodes)", root.id, nodes.len());
        Ok(())
    }

    fn load_checklist(&self, root_id: &str) -> Result<Option<StoredChecklist>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, checklist_root_id, parent_id, order_number, title,
                   description, priority, time_estimate, project_id
            FROM checklist_nodes WHERE checklist_root_id = ?1
            ORDER BY position
            "#,
        )?;

        let rows = stmt.query_map(params![root_id], |row| {
            Ok(ChecklistNodeRow {
                id: row.get(0)?,
                checklist_root_id: row.get(1)?,
                parent_id: row.get(2)?,
                order_number: row.get(3)?,
                title: row.get(4)?,
                description: row.get(5)?,
                priority: row.get(6)?,
                time_estimate: row.get(7)?,
                project_id: row.get(8)?,
            })
        })?;

        let mut nodes = Vec::new();
        for row in rows {
            nodes.push(row?.into_node());
        }

        if nodes.is_empty() {
            return Ok(None);
        }

        let mut stmt = self.conn.prepare(
            "SELECT label FROM status_indicators WHERE checklist_id = ?1 ORDER BY position",
        )?;
        let status_indicators = stmt
            .query_map(params![root_id], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Some(StoredChecklist {
            nodes,
            status_indicators,
        }))
    }
}

/// Database statistics
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub documents: usize,
    pub segments: usize,
    pub checklists: usize,
    pub checklist_nodes: usize,
    pub status_indicators: usize,
}

fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// `None` for blobs that are not a whole number of f32 values
fn blob_to_embedding(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.is_empty() || bytes.len() % 4 != 0 {
        return None;
    }

    Some(
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}

// Internal row types for database mapping

struct SegmentRow {
    order_number: i64,
    content: String,
    embedding: Option<Vec<u8>>,
}

struct ChecklistNodeRow {
    id: String,
    checklist_root_id: String,
    parent_id: Option<String>,
    order_number: i64,
    title: String,
    description: Option<String>,
    priority: Option<String>,
    time_estimate: Option<String>,
    project_id: Option<String>,
}

impl ChecklistNodeRow {
    fn into_node(self) -> ChecklistNode {
        ChecklistNode {
            id: self.id,
            title: self.title,
            description: self.description,
            priority: self.priority,
            time_estimate: self.time_estimate,
            order_number: self.order_number.max(0) as usize,
            parent_id: self.parent_id,
            checklist_root_id: self.checklist_root_id,
            project_id: self.project_id,
        }
    }
}
