use anyhow::{Context, Result};
use async_trait::async_trait;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::BigInt;

use cs_core::clipboard::ClipboardRecord;
use cs_core::ids::RecordId;
use cs_core::ports::{RecommendationChange, RecordStorePort};

use crate::db::models::record_row::EMPTY_TAGS;
use crate::db::models::ClipboardRecordRow;
use crate::db::pool::DbPool;
use crate::db::schema::t_clipboard_record::dsl::*;
use crate::db::schema::t_clipboard_record;

/// Diesel/SQLite implementation of [`RecordStorePort`].
///
/// All queries are short local-disk operations; methods run them directly
/// on the calling task (the capture path is already serialized by the
/// monitor's version guard).
pub struct DieselRecordStore {
    pool: DbPool,
}

impl DieselRecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(
        &self,
    ) -> Result<diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<SqliteConnection>>>
    {
        self.pool.get().context("get database connection")
    }
}

fn load_rows(rows: Vec<ClipboardRecordRow>) -> Result<Vec<ClipboardRecord>> {
    rows.into_iter().map(ClipboardRecordRow::into_domain).collect()
}

/// Most recent membership change, used to order the recommendation history.
const MEMBERSHIP_CHANGED_AT: &str =
    "MAX(COALESCE(recommended_at_ms, 0), COALESCE(evicted_at_ms, 0))";

#[async_trait]
impl RecordStorePort for DieselRecordStore {
    async fn insert(&self, record: &ClipboardRecord) -> Result<()> {
        let row = ClipboardRecordRow::from_domain(record)?;
        let mut conn = self.conn()?;
        diesel::insert_into(t_clipboard_record::table)
            .values(&row)
            .execute(&mut conn)
            .context("insert clipboard record")?;
        Ok(())
    }

    async fn get(&self, record_id: &RecordId) -> Result<Option<ClipboardRecord>> {
        let mut conn = self.conn()?;
        let row = t_clipboard_record::table
            .find(record_id.to_string())
            .select(ClipboardRecordRow::as_select())
            .first(&mut conn)
            .optional()
            .context("get clipboard record by id")?;
        row.map(ClipboardRecordRow::into_domain).transpose()
    }

    async fn find_by_hash(&self, hash: i64) -> Result<Option<ClipboardRecord>> {
        let mut conn = self.conn()?;
        let row = t_clipboard_record::table
            .filter(content_hash.eq(hash))
            .order(created_at_ms.desc())
            .select(ClipboardRecordRow::as_select())
            .first(&mut conn)
            .optional()
            .context("find clipboard record by content hash")?;
        row.map(ClipboardRecordRow::into_domain).transpose()
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<ClipboardRecord>> {
        let mut conn = self.conn()?;
        let rows = t_clipboard_record::table
            .order(created_at_ms.desc())
            .limit(limit)
            .offset(offset)
            .select(ClipboardRecordRow::as_select())
            .load(&mut conn)
            .context("list recent clipboard records")?;
        load_rows(rows)
    }

    async fn list_all(&self) -> Result<Vec<ClipboardRecord>> {
        let mut conn = self.conn()?;
        let rows = t_clipboard_record::table
            .order(created_at_ms.desc())
            .select(ClipboardRecordRow::as_select())
            .load(&mut conn)
            .context("list all clipboard records")?;
        load_rows(rows)
    }

    async fn count(&self) -> Result<i64> {
        let mut conn = self.conn()?;
        t_clipboard_record::table
            .count()
            .get_result(&mut conn)
            .context("count clipboard records")
    }

    async fn promote_duplicate(&self, record_id: &RecordId, now_ms: i64) -> Result<()> {
        let mut conn = self.conn()?;
        // One UPDATE: promote to head of history and register the usage
        // signal. The fresh score equals the new usage count (zero decay);
        // SET clauses see pre-update column values, hence the explicit +1.
        diesel::update(t_clipboard_record::table.find(record_id.to_string()))
            .set((
                created_at_ms.eq(now_ms),
                usage_count.eq(usage_count + 1),
                last_used_at_ms.eq(now_ms),
                recommendation_score
                    .eq(sql::<diesel::sql_types::Double>("CAST(usage_count + 1 AS REAL)")),
            ))
            .execute(&mut conn)
            .context("promote duplicate record")?;
        Ok(())
    }

    async fn record_usage(
        &self,
        record_id: &RecordId,
        now_ms: i64,
        score: f64,
        mark_recommended: bool,
    ) -> Result<()> {
        let mut conn = self.conn()?;
        let target = t_clipboard_record::table.find(record_id.to_string());

        if mark_recommended {
            diesel::update(target)
                .set((
                    usage_count.eq(usage_count + 1),
                    last_used_at_ms.eq(now_ms),
                    recommendation_score.eq(score),
                    recommended_at_ms.eq(now_ms),
                    evicted_at_ms.eq(None::<i64>),
                ))
                .execute(&mut conn)
        } else {
            diesel::update(target)
                .set((
                    usage_count.eq(usage_count + 1),
                    last_used_at_ms.eq(now_ms),
                    recommendation_score.eq(score),
                ))
                .execute(&mut conn)
        }
        .context("record usage")?;
        Ok(())
    }

    async fn update_content(
        &self,
        record_id: &RecordId,
        new_content: &str,
        new_hash: i64,
    ) -> Result<()> {
        let mut conn = self.conn()?;
        diesel::update(t_clipboard_record::table.find(record_id.to_string()))
            .set((content.eq(new_content), content_hash.eq(new_hash)))
            .execute(&mut conn)
            .context("update record content")?;
        Ok(())
    }

    async fn set_tags(&self, record_id: &RecordId, new_tags: &[String]) -> Result<()> {
        let serialized = serde_json::to_string(new_tags).context("serialize tags")?;
        let mut conn = self.conn()?;
        diesel::update(t_clipboard_record::table.find(record_id.to_string()))
            .set(tags.eq(serialized))
            .execute(&mut conn)
            .context("set record tags")?;
        Ok(())
    }

    async fn set_note(&self, record_id: &RecordId, new_note: Option<&str>) -> Result<()> {
        let mut conn = self.conn()?;
        diesel::update(t_clipboard_record::table.find(record_id.to_string()))
            .set(note.eq(new_note))
            .execute(&mut conn)
            .context("set record note")?;
        Ok(())
    }

    async fn delete(&self, record_id: &RecordId) -> Result<()> {
        let mut conn = self.conn()?;
        diesel::delete(t_clipboard_record::table.find(record_id.to_string()))
            .execute(&mut conn)
            .context("delete clipboard record")?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<usize> {
        let mut conn = self.conn()?;
        diesel::delete(t_clipboard_record::table)
            .execute(&mut conn)
            .context("clear clipboard records")
    }

    async fn oldest_untagged(&self, limit: i64) -> Result<Vec<ClipboardRecord>> {
        let mut conn = self.conn()?;
        let rows = t_clipboard_record::table
            .filter(tags.eq(EMPTY_TAGS))
            .order(created_at_ms.asc())
            .limit(limit)
            .select(ClipboardRecordRow::as_select())
            .load(&mut conn)
            .context("select retention candidates")?;
        load_rows(rows)
    }

    async fn apply_recommendation_changes(
        &self,
        changes: &[RecommendationChange],
    ) -> Result<()> {
        let mut conn = self.conn()?;
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            for change in changes {
                match change {
                    RecommendationChange::Promote { id: rid, score, at_ms } => {
                        diesel::update(t_clipboard_record::table.find(rid.to_string()))
                            .set((
                                recommendation_score.eq(*score),
                                recommended_at_ms.eq(*at_ms),
                                evicted_at_ms.eq(None::<i64>),
                            ))
                            .execute(conn)?;
                    }
                    RecommendationChange::Evict { id: rid, score, at_ms } => {
                        diesel::update(t_clipboard_record::table.find(rid.to_string()))
                            .set((
                                recommendation_score.eq(*score),
                                recommended_at_ms.eq(None::<i64>),
                                evicted_at_ms.eq(*at_ms),
                            ))
                            .execute(conn)?;
                    }
                    RecommendationChange::Rescore { id: rid, score } => {
                        diesel::update(t_clipboard_record::table.find(rid.to_string()))
                            .set(recommendation_score.eq(*score))
                            .execute(conn)?;
                    }
                }
            }
            Ok(())
        })
        .context("apply recommendation changes")?;
        Ok(())
    }

    async fn recommended(&self, limit: i64) -> Result<Vec<ClipboardRecord>> {
        let mut conn = self.conn()?;
        let rows = t_clipboard_record::table
            .filter(recommended_at_ms.is_not_null())
            .filter(evicted_at_ms.is_null())
            .order(recommendation_score.desc())
            .limit(limit)
            .select(ClipboardRecordRow::as_select())
            .load(&mut conn)
            .context("list recommended records")?;
        load_rows(rows)
    }

    async fn recommendation_history(&self, limit: i64) -> Result<Vec<ClipboardRecord>> {
        let mut conn = self.conn()?;
        let rows = t_clipboard_record::table
            .filter(recommended_at_ms.is_not_null().or(evicted_at_ms.is_not_null()))
            .order(sql::<BigInt>(MEMBERSHIP_CHANGED_AT).desc())
            .limit(limit)
            .select(ClipboardRecordRow::as_select())
            .load(&mut conn)
            .context("list recommendation history")?;
        load_rows(rows)
    }
}
