use rusqlite::types::Value;

use crate::domain::{Subscription, SubscriptionFilter};
use crate::errors::{BotError, BotResult};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::SubscriptionRepository;

const SELECT_COLUMNS: &str = "SELECT id, channel_id, rss_url, created_at FROM subscriptions";

pub struct SqliteSubscriptionRepository {
    storage: SqliteStorage,
}

impl SqliteSubscriptionRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

/// Build a `WHERE` clause from the set fields of a filter.
fn where_clause(filter: &SubscriptionFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    if let Some(id) = filter.id {
        params.push(Value::Integer(id));
        conditions.push(format!("id = ?{}", params.len()));
    }
    if let Some(channel_id) = &filter.channel_id {
        params.push(Value::Text(channel_id.clone()));
        conditions.push(format!("channel_id = ?{}", params.len()));
    }
    if let Some(feed_url) = &filter.feed_url {
        params.push(Value::Text(feed_url.clone()));
        conditions.push(format!("rss_url = ?{}", params.len()));
    }

    if conditions.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), params)
    }
}

/// Human-readable description of a filter for error messages, e.g. `id 3 in channel general`.
fn describe(filter: &SubscriptionFilter) -> String {
    let mut parts = Vec::new();

    if let Some(id) = filter.id {
        parts.push(format!("id {}", id));
    }
    if let Some(channel_id) = &filter.channel_id {
        parts.push(format!("in channel {}", channel_id));
    }
    if let Some(feed_url) = &filter.feed_url {
        parts.push(format!("for {}", feed_url));
    }

    parts.join(" ")
}

fn row_to_subscription(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        id: Some(row.get(0)?),
        channel_id: row.get(1)?,
        feed_url: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl SubscriptionRepository for SqliteSubscriptionRepository {
    fn create(&self, subscription: &Subscription) -> BotResult<i64> {
        let conn = self.storage.connection()?;

        conn.execute(
            "INSERT INTO subscriptions (channel_id, rss_url, created_at) VALUES (?1, ?2, ?3)",
            (
                &subscription.channel_id,
                &subscription.feed_url,
                subscription.created_at,
            ),
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn find_all(&self) -> BotResult<Vec<Subscription>> {
        self.find_by_model(&SubscriptionFilter::default())
    }

    fn find_by_model(&self, filter: &SubscriptionFilter) -> BotResult<Vec<Subscription>> {
        let conn = self.storage.connection()?;
        let (clause, params) = where_clause(filter);

        let mut stmt = conn.prepare(&format!("{}{} ORDER BY id", SELECT_COLUMNS, clause))?;
        let subscriptions =
            stmt.query_map(rusqlite::params_from_iter(params.iter()), row_to_subscription)?;

        subscriptions
            .collect::<Result<Vec<_>, _>>()
            .map_err(BotError::from)
    }

    fn delete(&self, filter: &SubscriptionFilter) -> BotResult<usize> {
        if filter.is_empty() {
            return Err(BotError::InvalidInput(
                "Refusing to delete subscriptions without a filter".to_string(),
            ));
        }

        let conn = self.storage.connection()?;
        let (clause, params) = where_clause(filter);

        let deleted = conn.execute(
            &format!("DELETE FROM subscriptions{}", clause),
            rusqlite::params_from_iter(params.iter()),
        )?;

        if deleted == 0 {
            return Err(BotError::SubscriptionNotFound(describe(filter)));
        }

        Ok(deleted)
    }
}
