//! Local vector store on a SQLite file inside the store directory

use super::{ChunkRecord, VectorStore};
use crate::chunk::ChunkId;
use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::FromRow;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Database file created inside the store directory
pub const DB_FILE_NAME: &str = "chunks.db";

/// IDs per `IN (...)` lookup, below SQLite's bound-parameter limit
const LOOKUP_BATCH: usize = 500;

/// SQL schema for the chunk table
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS chunks (
    id TEXT PRIMARY KEY,
    source TEXT NOT NULL,
    page INTEGER NOT NULL,
    text TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    dimension INTEGER NOT NULL,
    embedding BLOB NOT NULL,
    ingested_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source);
"#;

#[derive(Debug, FromRow)]
struct ChunkRow {
    id: String,
    source: String,
    page: i64,
    text: String,
    content_hash: String,
    embedding: Vec<u8>,
    ingested_at: String,
}

impl ChunkRow {
    fn into_record(self) -> Result<ChunkRecord> {
        Ok(ChunkRecord {
            id: self.id.parse()?,
            source: self.source,
            page: self.page as u32,
            text: self.text,
            content_hash: self.content_hash,
            ingested_at: self.ingested_at,
            embedding: decode_embedding(&self.embedding),
        })
    }
}

/// Vector store handle over `<store_dir>/chunks.db`
///
/// Every stored vector has the dimension the store was opened with.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    dimension: usize,
}

impl SqliteStore {
    /// Open (creating if needed) the store in `dir` for vectors of `dimension`.
    ///
    /// Fails if the store already holds vectors of another dimension.
    pub async fn open(dir: &Path, dimension: usize) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let db_path = dir.join(DB_FILE_NAME);

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        debug!("Opening vector store at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(SCHEMA_SQL).execute(&pool).await?;

        let store = Self { pool, dimension };
        store.check_stored_dimension().await?;
        Ok(store)
    }

    async fn check_stored_dimension(&self) -> Result<()> {
        let stored: Option<(i64,)> =
            sqlx::query_as("SELECT dimension FROM chunks WHERE dimension != ? LIMIT 1")
                .bind(self.dimension as i64)
                .fetch_optional(&self.pool)
                .await?;

        match stored {
            Some((stored,)) => Err(Error::Store(format!(
                "Vector dimension mismatch: store holds {}-dimensional vectors, configured dimension is {}",
                stored, self.dimension
            ))),
            None => Ok(()),
        }
    }

    /// Dimension of the vectors this store accepts
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Remove the whole store directory. Returns whether anything was deleted.
    pub fn destroy(dir: &Path) -> Result<bool> {
        if !dir.exists() {
            return Ok(false);
        }

        info!("Removing vector store at {:?}", dir);
        std::fs::remove_dir_all(dir)?;
        Ok(true)
    }

    /// Fetch a stored record by ID
    pub async fn get(&self, id: &ChunkId) -> Result<Option<ChunkRecord>> {
        let row = sqlx::query_as::<_, ChunkRow>(
            "SELECT id, source, page, text, content_hash, embedding, ingested_at FROM chunks WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ChunkRow::into_record).transpose()
    }

    /// Number of stored chunks
    pub async fn count(&self) -> Result<usize> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn all_ids(&self) -> Result<HashSet<ChunkId>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT id FROM chunks")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|(id,)| id.parse()).collect()
    }

    async fn existing_ids(&self, candidates: &[ChunkId]) -> Result<HashSet<ChunkId>> {
        let mut found: HashSet<ChunkId> = HashSet::new();

        for batch in candidates.chunks(LOOKUP_BATCH) {
            let placeholders = vec!["?"; batch.len()].join(", ");
            let sql = format!("SELECT id FROM chunks WHERE id IN ({})", placeholders);

            let mut query = sqlx::query_as::<_, (String,)>(&sql);
            for id in batch {
                query = query.bind(id.as_str());
            }

            for (id,) in query.fetch_all(&self.pool).await? {
                found.insert(id.parse()?);
            }
        }

        Ok(found)
    }

    async fn add_chunks(&self, records: Vec<ChunkRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        if let Some(mismatch) = records.iter().find(|r| r.embedding.len() != self.dimension) {
            return Err(Error::Store(format!(
                "Vector dimension mismatch for {}: expected {} (got {})",
                mismatch.id,
                self.dimension,
                mismatch.embedding.len()
            )));
        }

        debug!("Inserting {} chunks", records.len());

        let mut tx = self.pool.begin().await?;
        for record in &records {
            sqlx::query(
                r#"
                INSERT INTO chunks (id, source, page, text, content_hash, dimension, embedding, ingested_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(record.id.as_str())
            .bind(&record.source)
            .bind(record.page as i64)
            .bind(&record.text)
            .bind(&record.content_hash)
            .bind(record.embedding.len() as i64)
            .bind(encode_embedding(&record.embedding))
            .bind(&record.ingested_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Little-endian f32 bytes
fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
