use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, params};

use crate::domain::TemplateId;
use crate::error::BridgeError;

pub trait MetadataRegistry: Send + Sync {
    fn exists(&self, id: &TemplateId) -> Result<bool, BridgeError>;

    /// Insert-if-absent. Returns `true` when a new entry was created.
    fn register(&self, id: &TemplateId) -> Result<bool, BridgeError>;

    fn list(&self) -> Result<Vec<TemplateId>, BridgeError>;
}

pub struct SqliteRegistry {
    conn: Mutex<Connection>,
}

impl SqliteRegistry {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BridgeError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| BridgeError::Filesystem(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(|err| {
            BridgeError::Registry(format!("open {}: {err}", path.display()))
        })?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self, BridgeError> {
        let conn =
            Connection::open_in_memory().map_err(|err| BridgeError::Registry(err.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, BridgeError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS templates (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                display_name TEXT,
                registered_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )
        .map_err(|err| BridgeError::Registry(format!("initialize schema: {err}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, BridgeError> {
        self.conn
            .lock()
            .map_err(|_| BridgeError::Registry("registry lock poisoned".to_string()))
    }
}

impl MetadataRegistry for SqliteRegistry {
    fn exists(&self, id: &TemplateId) -> Result<bool, BridgeError> {
        let conn = self.connection()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM templates WHERE name = ?1",
                [id.as_str()],
                |_| Ok(()),
            )
            .optional()
            .map_err(|err| BridgeError::Registry(err.to_string()))?;
        Ok(found.is_some())
    }

    fn register(&self, id: &TemplateId) -> Result<bool, BridgeError> {
        let conn = self.connection()?;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO templates (name, registered_at) VALUES (?1, ?2)",
                params![id.as_str(), chrono::Utc::now().to_rfc3339()],
            )
            .map_err(|err| BridgeError::Registry(err.to_string()))?;
        Ok(inserted > 0)
    }

    fn list(&self) -> Result<Vec<TemplateId>, BridgeError> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare("SELECT name FROM templates ORDER BY id")
            .map_err(|err| BridgeError::Registry(err.to_string()))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|err| BridgeError::Registry(err.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| BridgeError::Registry(err.to_string()))?;
        names.iter().map(|name| name.parse()).collect()
    }
}
