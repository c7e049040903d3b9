//! SQLite-backed Content Store
//!
//! Single bundled-SQLite connection behind a mutex. The schema lives in
//! `migrations/` and is applied on open; the FTS5 table `contents_fts`
//! mirrors each live content's title and tag names and is refreshed on
//! every content upsert and tag write.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use super::types::{
    Content, ContentKind, ContentScore, ContentStats, NewContent, RecordStats, SearchParams,
    SortOrder,
};
use super::{ContentStore, StoreError};
use crate::provider::types::Provider;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<(), StoreError> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl ContentStore for SqliteStore {
    fn upsert(&self, content: &NewContent) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        let now = fmt_ts(&Utc::now());

        let id: i64 = conn.query_row(
            "INSERT INTO contents (provider_id, provider_content_id, title, description,
                                   content_type, published_at, raw_data, deleted,
                                   created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?8)
             ON CONFLICT (provider_id, provider_content_id) DO UPDATE SET
                 title = excluded.title,
                 description = excluded.description,
                 content_type = excluded.content_type,
                 published_at = excluded.published_at,
                 raw_data = excluded.raw_data,
                 deleted = 0,
                 updated_at = excluded.updated_at
             RETURNING id",
            params![
                content.provider_id,
                content.external_id,
                content.title,
                content.description,
                content.content_type.as_str(),
                fmt_ts(&content.published_at),
                content.raw_payload,
                now
            ],
            |row| row.get(0),
        )?;

        refresh_fts(&conn, id, &content.title)?;

        Ok(id)
    }

    fn upsert_stats(&self, content_id: i64, stats: &RecordStats) -> Result<(), StoreError> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO content_stats (content_id, views, likes, reading_time, reactions, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (content_id) DO UPDATE SET
                 views = excluded.views,
                 likes = excluded.likes,
                 reading_time = excluded.reading_time,
                 reactions = excluded.reactions,
                 updated_at = excluded.updated_at",
            params![
                content_id,
                stats.views,
                stats.likes,
                stats.reading_time,
                stats.reactions,
                fmt_ts(&Utc::now())
            ],
        )?;

        Ok(())
    }

    fn upsert_score(&self, content_id: i64, score: &ContentScore) -> Result<(), StoreError> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO content_scores (content_id, base_score, type_weight, recency_score,
                                         engagement_score, final_score, calculated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (content_id) DO UPDATE SET
                 base_score = excluded.base_score,
                 type_weight = excluded.type_weight,
                 recency_score = excluded.recency_score,
                 engagement_score = excluded.engagement_score,
                 final_score = excluded.final_score,
                 calculated_at = excluded.calculated_at",
            params![
                content_id,
                score.base_score,
                score.type_weight,
                score.recency_score,
                score.engagement_score,
                score.final_score,
                fmt_ts(&score.calculated_at)
            ],
        )?;

        Ok(())
    }

    fn add_tags(&self, content_id: i64, names: &[String]) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        for name in names {
            let lowered = name.to_lowercase();
            let normalized = lowered.trim();
            if normalized.is_empty() {
                continue;
            }

            let tag_id: i64 = tx.query_row(
                "INSERT INTO tags (name) VALUES (?1)
                 ON CONFLICT (name) DO UPDATE SET name = excluded.name
                 RETURNING id",
                params![normalized],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT OR IGNORE INTO content_tags (content_id, tag_id) VALUES (?1, ?2)",
                params![content_id, tag_id],
            )?;
        }

        let title: String = tx.query_row(
            "SELECT title FROM contents WHERE id = ?1",
            params![content_id],
            |row| row.get(0),
        )?;
        refresh_fts(&tx, content_id, &title)?;

        tx.commit()?;
        Ok(())
    }

    fn find(&self, id: i64) -> Result<Option<Content>, StoreError> {
        let conn = self.lock()?;

        let result = conn
            .query_row(
                "SELECT c.id, c.provider_id, c.provider_content_id, c.title, c.description,
                        c.content_type, c.published_at, c.created_at, c.updated_at,
                        cs.content_id, cs.views, cs.likes, cs.reading_time, cs.reactions, cs.updated_at,
                        sc.content_id, sc.base_score, sc.type_weight, sc.recency_score,
                        sc.engagement_score, sc.final_score, sc.calculated_at,
                        c.raw_data
                 FROM contents c
                 LEFT JOIN content_stats cs ON cs.content_id = c.id
                 LEFT JOIN content_scores sc ON sc.content_id = c.id
                 WHERE c.id = ?1 AND c.deleted = 0",
                params![id],
                |row| {
                    let mut content = content_from_row(row)?;
                    content.raw_payload = row.get(22)?;
                    Ok(content)
                },
            )
            .optional()?;

        let Some(mut content) = result else {
            return Ok(None);
        };

        content.tags = load_tags(&conn, content.id)?;
        Ok(Some(content))
    }

    fn mark_stale_deleted(
        &self,
        provider_id: i64,
        threshold: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let conn = self.lock()?;

        let affected = conn.execute(
            "UPDATE contents SET deleted = 1, updated_at = ?1
             WHERE provider_id = ?2 AND updated_at < ?3 AND deleted = 0",
            params![fmt_ts(&Utc::now()), provider_id, fmt_ts(&threshold)],
        )?;

        if affected > 0 {
            tracing::info!(
                "{} stale contents flagged as deleted for provider {}",
                affected,
                provider_id
            );
        }

        Ok(affected as u64)
    }

    fn search(&self, params: &SearchParams) -> Result<(Vec<Content>, u64), StoreError> {
        let conn = self.lock()?;

        let match_expr = build_match_expression(&params.query);
        let mut bind: Vec<Value> = Vec::new();

        let mut from = String::from(" FROM contents c");
        let relevance_select = if let Some(expr) = &match_expr {
            bind.push(Value::Text(expr.clone()));
            from.push_str(
                " JOIN (SELECT rowid AS content_id, -bm25(contents_fts, 1.0, 0.4) AS relevance
                   FROM contents_fts WHERE contents_fts MATCH ?1) f ON f.content_id = c.id",
            );
            "f.relevance"
        } else {
            "0.0"
        };
        from.push_str(
            " LEFT JOIN content_stats cs ON cs.content_id = c.id
              LEFT JOIN content_scores sc ON sc.content_id = c.id",
        );

        let mut where_clause = String::from(" WHERE c.deleted = 0");
        if let Some(kind) = params.content_type {
            bind.push(Value::Text(kind.as_str().to_string()));
            where_clause.push_str(&format!(" AND c.content_type = ?{}", bind.len()));
        }

        let count_sql = format!("SELECT COUNT(*){}{}", from, where_clause);
        let total: i64 = conn.query_row(&count_sql, params_from_iter(bind.iter()), |row| {
            row.get(0)
        })?;

        let order_by = if params.sort == SortOrder::Relevance && match_expr.is_some() {
            " ORDER BY relevance_score DESC, c.published_at DESC"
        } else {
            " ORDER BY sc.final_score IS NULL, sc.final_score DESC, c.published_at DESC"
        };

        bind.push(Value::Integer(i64::from(params.page_size)));
        let limit_idx = bind.len();
        bind.push(Value::Integer(
            i64::from(params.page - 1) * i64::from(params.page_size),
        ));
        let offset_idx = bind.len();

        let select_sql = format!(
            "SELECT c.id, c.provider_id, c.provider_content_id, c.title, c.description,
                    c.content_type, c.published_at, c.created_at, c.updated_at,
                    cs.content_id, cs.views, cs.likes, cs.reading_time, cs.reactions, cs.updated_at,
                    sc.content_id, sc.base_score, sc.type_weight, sc.recency_score,
                    sc.engagement_score, sc.final_score, sc.calculated_at,
                    {} AS relevance_score{}{}{} LIMIT ?{} OFFSET ?{}",
            relevance_select, from, where_clause, order_by, limit_idx, offset_idx
        );

        tracing::debug!(
            "Executing search: query={:?} sort={} page={}",
            params.query,
            params.sort.as_str(),
            params.page
        );

        let mut stmt = conn.prepare(&select_sql)?;
        let mut contents = stmt
            .query_map(params_from_iter(bind.iter()), |row| {
                let mut content = content_from_row(row)?;
                content.relevance_score = row.get(22)?;
                Ok(content)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        for content in contents.iter_mut() {
            content.tags = load_tags(&conn, content.id)?;
        }

        Ok((contents, total as u64))
    }

    fn active_providers(&self) -> Result<Vec<Provider>, StoreError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT id, name, url, format, is_active FROM providers WHERE is_active = 1 ORDER BY id",
        )?;
        let providers = stmt
            .query_map([], |row| {
                Ok(Provider {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    feed_url: row.get(2)?,
                    format: row.get(3)?,
                    active: row.get::<_, i64>(4)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(providers)
    }

    fn insert_provider(
        &self,
        name: &str,
        url: &str,
        format: &str,
        active: bool,
    ) -> Result<i64, StoreError> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO providers (name, url, format, is_active) VALUES (?1, ?2, ?3, ?4)",
            params![name, url, format, active as i64],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn ping(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

/// Turn the sanitized query words into a conjunctive prefix-match
/// expression for the FTS index. Returns `None` when nothing survives
/// sanitization.
fn build_match_expression(query: &str) -> Option<String> {
    let re = Regex::new(r"[^A-Za-z0-9\s]").unwrap();
    let cleaned = re.replace_all(query, "");

    let words: Vec<String> = cleaned
        .split_whitespace()
        .map(|word| format!("{}*", word))
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(" AND "))
    }
}

fn refresh_fts(conn: &Connection, content_id: i64, title: &str) -> rusqlite::Result<()> {
    conn.execute(
        "DELETE FROM contents_fts WHERE rowid = ?1",
        params![content_id],
    )?;
    conn.execute(
        "INSERT INTO contents_fts (rowid, title, tags)
         VALUES (?1, ?2, (SELECT COALESCE(group_concat(t.name, ' '), '')
                          FROM content_tags ct
                          JOIN tags t ON t.id = ct.tag_id
                          WHERE ct.content_id = ?1))",
        params![content_id, title],
    )?;
    Ok(())
}

fn load_tags(conn: &Connection, content_id: i64) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM tags t
         JOIN content_tags ct ON ct.tag_id = t.id
         WHERE ct.content_id = ?1
         ORDER BY t.name",
    )?;
    let tags = stmt
        .query_map(params![content_id], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}

/// Maps the common column prefix shared by `find` and `search`:
/// content columns 0..=8, nullable stats 9..=14, nullable score 15..=21.
fn content_from_row(row: &Row<'_>) -> rusqlite::Result<Content> {
    let kind_str: String = row.get(5)?;
    let content_type = ContentKind::parse(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("unknown content type: {}", kind_str).into(),
        )
    })?;

    let stats = match row.get::<_, Option<i64>>(9)? {
        Some(content_id) => Some(ContentStats {
            content_id,
            views: row.get(10)?,
            likes: row.get(11)?,
            reading_time: row.get(12)?,
            reactions: row.get(13)?,
            updated_at: row
                .get::<_, Option<String>>(14)?
                .as_deref()
                .and_then(parse_ts)
                .unwrap_or_else(Utc::now),
        }),
        None => None,
    };

    let score = match row.get::<_, Option<i64>>(15)? {
        Some(_) => Some(ContentScore {
            base_score: row.get(16)?,
            type_weight: row.get(17)?,
            recency_score: row.get(18)?,
            engagement_score: row.get(19)?,
            final_score: row.get(20)?,
            calculated_at: row
                .get::<_, Option<String>>(21)?
                .as_deref()
                .and_then(parse_ts)
                .unwrap_or_else(Utc::now),
        }),
        None => None,
    };

    Ok(Content {
        id: row.get(0)?,
        provider_id: row.get(1)?,
        external_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        content_type,
        published_at: row
            .get::<_, String>(6)
            .ok()
            .as_deref()
            .and_then(parse_ts)
            .unwrap_or_else(Utc::now),
        created_at: row
            .get::<_, String>(7)
            .ok()
            .as_deref()
            .and_then(parse_ts)
            .unwrap_or_else(Utc::now),
        updated_at: row
            .get::<_, String>(8)
            .ok()
            .as_deref()
            .and_then(parse_ts)
            .unwrap_or_else(Utc::now),
        stats,
        score,
        tags: Vec::new(),
        relevance_score: 0.0,
        raw_payload: None,
    })
}

/// Fixed-width RFC-3339 UTC text; lexicographic order matches chronological
/// order, which the stale-sweep threshold comparison relies on.
pub(crate) fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
