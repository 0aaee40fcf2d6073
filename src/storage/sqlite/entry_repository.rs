use std::collections::HashSet;

use chrono::Utc;

use crate::domain::FeedEntry;
use crate::errors::{BotError, BotResult};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::EntryRepository;

/// Candidates per lookup query; two bound parameters each, kept well under SQLite's limit.
const LOOKUP_CHUNK_SIZE: usize = 200;

pub struct SqliteEntryRepository {
    storage: SqliteStorage,
}

impl SqliteEntryRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<FeedEntry> {
    Ok(FeedEntry {
        id: Some(row.get(0)?),
        feed_url: row.get(1)?,
        entry_title: row.get(2)?,
        entry_link: row.get(3)?,
        published_at: row.get(4)?,
        recorded_at: Some(row.get(5)?),
    })
}

impl EntryRepository for SqliteEntryRepository {
    fn create(&self, entries: &[FeedEntry]) -> BotResult<Vec<FeedEntry>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.storage.connection()?;
        let tx = conn.transaction()?;
        let recorded_at = Utc::now();
        let mut stored = Vec::with_capacity(entries.len());

        {
            let mut stmt = tx.prepare(
                "INSERT INTO rss_entries (rss_url, entry_title, entry_link, published_at, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;

            for entry in entries {
                stmt.execute((
                    &entry.feed_url,
                    &entry.entry_title,
                    &entry.entry_link,
                    entry.published_at,
                    recorded_at,
                ))?;

                stored.push(FeedEntry {
                    id: Some(tx.last_insert_rowid()),
                    recorded_at: Some(recorded_at),
                    ..entry.clone()
                });
            }
        }

        // Dropping `tx` on an early return above rolls everything back
        tx.commit()?;

        Ok(stored)
    }

    fn find_by_candidates(&self, candidates: &[FeedEntry]) -> BotResult<Vec<FeedEntry>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        // Repeated candidates would only bloat the query
        let mut seen = HashSet::new();
        let keys: Vec<(&str, &str)> = candidates
            .iter()
            .map(FeedEntry::identity)
            .filter(|key| seen.insert(*key))
            .collect();

        let conn = self.storage.connection()?;
        let mut existing = Vec::new();

        for chunk in keys.chunks(LOOKUP_CHUNK_SIZE) {
            let conditions: Vec<String> = (0..chunk.len())
                .map(|i| format!("(rss_url = ?{} AND entry_link = ?{})", i * 2 + 1, i * 2 + 2))
                .collect();
            let query = format!(
                "SELECT id, rss_url, entry_title, entry_link, published_at, created_at FROM rss_entries WHERE {} ORDER BY id",
                conditions.join(" OR ")
            );

            let params = chunk.iter().flat_map(|(url, link)| [*url, *link]);

            let mut stmt = conn.prepare(&query)?;
            let rows = stmt.query_map(rusqlite::params_from_iter(params), row_to_entry)?;

            for row in rows {
                existing.push(row.map_err(BotError::from)?);
            }
        }

        Ok(existing)
    }
}
