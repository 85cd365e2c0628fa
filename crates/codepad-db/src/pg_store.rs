//! `PostgreSQL` [`DocumentStore`] backend.
//!
//! Tables (see `migrations/`):
//!
//! | Table | Key | Notes |
//! |-------|-----|-------|
//! | `meetings` | `id` | `interviewer_ids TEXT[]`, nullable `candidate_id` |
//! | `editor_state` | `id` | `UNIQUE (meeting_id, seq)`, indexed `(meeting_id, seq DESC)` |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use codepad_types::{Meeting, MeetingId, SnapshotId, StateSnapshot, UserId};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::DbError;
use crate::settings::DatabaseSettings;
use crate::store::DocumentStore;

/// Name reported to the server in `pg_stat_activity`.
const APPLICATION_NAME: &str = "codepad";

/// Document store backed by a `PostgreSQL` connection pool.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Open a pool from `settings`, applying migrations first when
    /// `run_migrations` is set.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if `url` is unset or unparseable,
    /// [`DbError::Postgres`] if the server is unreachable, and
    /// [`DbError::Migration`] if the schema cannot be brought up to date.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, DbError> {
        let url = settings
            .url
            .as_deref()
            .ok_or_else(|| DbError::Config("database.url is not set".to_owned()))?;

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout())
            .connect_with(connect_options(url)?)
            .await?;
        let store = Self::from_pool(pool);

        if settings.run_migrations {
            store.migrate().await?;
        }

        tracing::info!(
            max_connections = settings.max_connections,
            migrated = settings.run_migrations,
            "Editor state store connected"
        );
        Ok(store)
    }

    /// Wrap a pool that is already connected.
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create or upgrade the `meetings` and `editor_state` tables.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Migration`] if any migration fails.
    pub async fn migrate(&self) -> Result<(), DbError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::debug!("Editor state schema up to date");
        Ok(())
    }

    /// The underlying pool.
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Wait for in-flight transactions and close every connection.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Editor state store closed");
    }
}

fn connect_options(url: &str) -> Result<PgConnectOptions, DbError> {
    let options: PgConnectOptions = url
        .parse()
        .map_err(|e: sqlx::Error| DbError::Config(format!("invalid database.url: {e}")))?;
    Ok(options.application_name(APPLICATION_NAME))
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    type Transaction = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Transaction, DbError> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: Self::Transaction) -> Result<(), DbError> {
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Transaction) -> Result<(), DbError> {
        tx.rollback().await?;
        Ok(())
    }

    async fn lock_meeting(
        &self,
        tx: &mut Self::Transaction,
        meeting_id: MeetingId,
    ) -> Result<Option<Meeting>, DbError> {
        let row = sqlx::query_as::<_, MeetingRow>(
            r"SELECT id, interviewer_ids, candidate_id
              FROM meetings
              WHERE id = $1
              FOR UPDATE",
        )
        .bind(meeting_id.into_inner())
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.map(Meeting::from))
    }

    async fn claim_candidate_slot(
        &self,
        tx: &mut Self::Transaction,
        meeting_id: MeetingId,
        candidate: &UserId,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"UPDATE meetings
              SET candidate_id = $2
              WHERE id = $1 AND candidate_id IS NULL",
        )
        .bind(meeting_id.into_inner())
        .bind(candidate.as_str())
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        let exists: Option<(Uuid,)> = sqlx::query_as(r"SELECT id FROM meetings WHERE id = $1")
            .bind(meeting_id.into_inner())
            .fetch_optional(&mut **tx)
            .await?;
        if exists.is_none() {
            return Err(DbError::MeetingNotFound(meeting_id));
        }
        Ok(false)
    }

    async fn latest_snapshot(
        &self,
        tx: &mut Self::Transaction,
        meeting_id: MeetingId,
    ) -> Result<Option<StateSnapshot>, DbError> {
        let row = sqlx::query_as::<_, SnapshotRow>(LATEST_SNAPSHOT_SQL)
            .bind(meeting_id.into_inner())
            .fetch_optional(&mut **tx)
            .await?;

        row.map(StateSnapshot::try_from).transpose()
    }

    async fn insert_snapshot(
        &self,
        tx: &mut Self::Transaction,
        snapshot: &StateSnapshot,
    ) -> Result<(), DbError> {
        let seq = i64::try_from(snapshot.seq)
            .map_err(|e| DbError::Corrupt(format!("seq {} exceeds BIGINT: {e}", snapshot.seq)))?;

        let result = sqlx::query(
            r"INSERT INTO editor_state (id, meeting_id, seq, content, author_id, created_at)
              VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(snapshot.id.into_inner())
        .bind(snapshot.meeting_id.into_inner())
        .bind(seq)
        .bind(&snapshot.content)
        .bind(snapshot.author_id.as_str())
        .bind(snapshot.created_at)
        .execute(&mut **tx)
        .await;

        match result {
            Ok(_) => {
                tracing::debug!(
                    meeting_id = %snapshot.meeting_id,
                    seq = snapshot.seq,
                    "Inserted editor state snapshot"
                );
                Ok(())
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DbError::DuplicateSequence {
                    meeting_id: snapshot.meeting_id,
                    seq: snapshot.seq,
                })
            }
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                Err(DbError::MeetingNotFound(snapshot.meeting_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_meeting(&self, meeting_id: MeetingId) -> Result<Option<Meeting>, DbError> {
        let row = sqlx::query_as::<_, MeetingRow>(
            r"SELECT id, interviewer_ids, candidate_id
              FROM meetings
              WHERE id = $1",
        )
        .bind(meeting_id.into_inner())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Meeting::from))
    }

    async fn find_latest_snapshot(
        &self,
        meeting_id: MeetingId,
    ) -> Result<Option<StateSnapshot>, DbError> {
        let row = sqlx::query_as::<_, SnapshotRow>(LATEST_SNAPSHOT_SQL)
            .bind(meeting_id.into_inner())
            .fetch_optional(&self.pool)
            .await?;

        row.map(StateSnapshot::try_from).transpose()
    }

    async fn insert_meeting(&self, meeting: &Meeting) -> Result<(), DbError> {
        let interviewers: Vec<String> = meeting
            .interviewer_ids
            .iter()
            .map(|u| u.as_str().to_owned())
            .collect();

        let result = sqlx::query(
            r"INSERT INTO meetings (id, interviewer_ids, candidate_id)
              VALUES ($1, $2, $3)",
        )
        .bind(meeting.id.into_inner())
        .bind(&interviewers)
        .bind(meeting.candidate_id.as_ref().map(UserId::as_str))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                tracing::debug!(meeting_id = %meeting.id, "Registered meeting");
                Ok(())
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DbError::MeetingExists(meeting.id))
            }
            Err(e) => Err(e.into()),
        }
    }
}

const LATEST_SNAPSHOT_SQL: &str = r"SELECT id, meeting_id, seq, content, author_id, created_at
  FROM editor_state
  WHERE meeting_id = $1
  ORDER BY seq DESC
  LIMIT 1";

/// A row from the `meetings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MeetingRow {
    /// Meeting UUID.
    pub id: Uuid,
    /// Interviewer auth subjects.
    pub interviewer_ids: Vec<String>,
    /// Bound candidate subject, if any.
    pub candidate_id: Option<String>,
}

impl From<MeetingRow> for Meeting {
    fn from(row: MeetingRow) -> Self {
        Self {
            id: MeetingId::from(row.id),
            interviewer_ids: row.interviewer_ids.into_iter().map(UserId::from).collect(),
            candidate_id: row.candidate_id.map(UserId::from),
        }
    }
}

/// A row from the `editor_state` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SnapshotRow {
    /// Snapshot UUID.
    pub id: Uuid,
    /// Owning meeting UUID.
    pub meeting_id: Uuid,
    /// Sequence number within the meeting.
    pub seq: i64,
    /// Full buffer text.
    pub content: String,
    /// Author's auth subject.
    pub author_id: String,
    /// Write timestamp.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<SnapshotRow> for StateSnapshot {
    type Error = DbError;

    fn try_from(row: SnapshotRow) -> Result<Self, Self::Error> {
        let seq = u64::try_from(row.seq).map_err(|e| {
            DbError::Corrupt(format!("seq {} in snapshot {}: {e}", row.seq, row.id))
        })?;
        Ok(Self {
            id: SnapshotId::from(row.id),
            meeting_id: MeetingId::from(row.meeting_id),
            seq,
            content: row.content,
            author_id: UserId::from(row.author_id),
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_without_url_is_a_config_error() {
        let result = PgDocumentStore::connect(&DatabaseSettings::default()).await;
        assert!(matches!(result, Err(DbError::Config(msg)) if msg.contains("not set")));
    }

    #[tokio::test]
    async fn connect_with_malformed_url_is_a_config_error() {
        let result = PgDocumentStore::connect(&DatabaseSettings::for_url("not a url")).await;
        assert!(matches!(result, Err(DbError::Config(msg)) if msg.contains("database.url")));
    }

    #[test]
    fn negative_seq_row_is_corrupt() {
        let row = SnapshotRow {
            id: Uuid::now_v7(),
            meeting_id: Uuid::now_v7(),
            seq: -1,
            content: String::new(),
            author_id: String::from("alice"),
            created_at: Utc::now(),
        };
        assert!(matches!(StateSnapshot::try_from(row), Err(DbError::Corrupt(_))));
    }

    #[test]
    fn meeting_row_maps_subjects() {
        let id = Uuid::now_v7();
        let row = MeetingRow {
            id,
            interviewer_ids: vec![String::from("alice"), String::from("bob")],
            candidate_id: None,
        };
        let meeting = Meeting::from(row);
        assert_eq!(meeting.id.into_inner(), id);
        assert!(meeting.is_interviewer(&UserId::from("bob")));
        assert!(meeting.candidate_slot_open());
    }
}
