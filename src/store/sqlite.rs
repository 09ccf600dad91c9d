use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Error::FromSqlConversionFailure;
use rusqlite::{params, Connection};
use rusqlite_migration::{Migrations, M};

use crate::app::{NotifierError, Result};
use crate::domain::{Source, SubscriberId};
use crate::store::{DeliveryLedger, SubscriptionStore};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations.to_latest(&mut conn)?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| NotifierError::StoreFailed(e.to_string()))
    }

    fn parse_datetime(column: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| s.parse::<DateTime<Utc>>())
            .map_err(|e| FromSqlConversionFailure(column, Type::Text, Box::new(e)))
    }
}

impl DeliveryLedger for SqliteStore {
    fn has_delivered(&self, subscriber_id: SubscriberId, item_id: &str) -> Result<bool> {
        let conn = self.conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM deliveries WHERE subscriber_id = ?1 AND item_id = ?2",
            params![subscriber_id, item_id],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    fn mark_delivered(&self, subscriber_id: SubscriberId, item_ids: &[String]) -> Result<()> {
        if item_ids.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        for item_id in item_ids {
            tx.execute(
                "INSERT OR IGNORE INTO deliveries (subscriber_id, item_id, delivered_at)
                 VALUES (?1, ?2, ?3)",
                params![subscriber_id, item_id, now],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

impl SubscriptionStore for SqliteStore {
    fn add_subscriber(&self, subscriber_id: SubscriberId) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT OR IGNORE INTO subscribers (id, created_at) VALUES (?1, ?2)",
            params![subscriber_id, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }

    fn get_subscribers(&self) -> Result<Vec<SubscriberId>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare("SELECT id FROM subscribers ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(ids)
    }

    fn get_sources(&self, subscriber_id: SubscriberId) -> Result<HashMap<String, Source>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, link, title, description, subscribed_at
             FROM sources WHERE subscriber_id = ?1",
        )?;

        let sources = stmt
            .query_map(params![subscriber_id], |row| {
                Ok(Source {
                    id: row.get(0)?,
                    link: row.get(1)?,
                    title: row.get(2)?,
                    description: row.get(3)?,
                    subscribed_at: Self::parse_datetime(4, &row.get::<_, String>(4)?)?,
                })
            })?
            .map(|row| row.map(|source| (source.id.clone(), source)))
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;

        Ok(sources)
    }

    fn save_sources(
        &self,
        subscriber_id: SubscriberId,
        sources: &HashMap<String, Source>,
    ) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM sources WHERE subscriber_id = ?1",
            params![subscriber_id],
        )?;

        for source in sources.values() {
            tx.execute(
                "INSERT INTO sources (subscriber_id, id, link, title, description, subscribed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    subscriber_id,
                    source.id,
                    source.link,
                    source.title,
                    source.description,
                    source.subscribed_at.to_rfc3339()
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn subscribe_count(&self, link: &str) -> Result<i64> {
        let conn = self.conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT subscriber_id) FROM sources WHERE link = ?1",
            params![link],
            |row| row.get(0),
        )?;

        Ok(count)
    }
}
