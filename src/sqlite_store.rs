use rusqlite::Connection;
use std::sync::Mutex;
use uuid::Uuid;
use crate::rotation::Rotation;

/// SQLite-backed persistence for rotations. Each rotation is stored as one
/// JSON snapshot, written through after every mutating operation.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a SQLite database at the given path.
    pub fn open(path: &str) -> Result<Self, String> {
        tracing::debug!(path, "opening rotation store");
        let conn = Connection::open(path).map_err(|e| e.to_string())?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS rotations (
                id TEXT PRIMARY KEY,
                data TEXT NOT NULL
            );"
        ).map_err(|e| e.to_string())?;
        Ok(SqliteStore { conn: Mutex::new(conn) })
    }

    /// Load all persisted rotations.
    pub fn load_all_rotations(&self) -> Result<Vec<Rotation>, String> {
        let conn = self.conn.lock().map_err(|e| e.to_string())?;
        let mut stmt = conn.prepare("SELECT data FROM rotations").map_err(|e| e.to_string())?;
        let rows = stmt.query_map([], |row| {
            let json: String = row.get(0)?;
            Ok(json)
        }).map_err(|e| e.to_string())?;

        let mut rotations = Vec::new();
        for row in rows {
            let json = row.map_err(|e| e.to_string())?;
            let rotation: Rotation = serde_json::from_str(&json)
                .map_err(|e| format!("Failed to deserialize rotation: {}", e))?;
            rotations.push(rotation);
        }
        Ok(rotations)
    }

    /// Insert a new rotation.
    pub fn insert_rotation(&self, rotation: &Rotation) -> Result<(), String> {
        let json = serde_json::to_string(rotation).map_err(|e| e.to_string())?;
        let id = rotation.id.to_string();
        let conn = self.conn.lock().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT OR REPLACE INTO rotations (id, data) VALUES (?1, ?2)",
            rusqlite::params![id, json],
        ).map_err(|e| e.to_string())?;
        tracing::debug!(rotation_id = %rotation.id, "rotation inserted into store");
        Ok(())
    }

    /// Update an existing rotation snapshot.
    pub fn update_rotation(&self, rotation: &Rotation) -> Result<(), String> {
        let json = serde_json::to_string(rotation).map_err(|e| e.to_string())?;
        let id = rotation.id.to_string();
        let conn = self.conn.lock().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE rotations SET data = ?2 WHERE id = ?1",
            rusqlite::params![id, json],
        ).map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Delete a rotation by id.
    pub fn delete_rotation(&self, rotation_id: Uuid) -> Result<(), String> {
        let id = rotation_id.to_string();
        let conn = self.conn.lock().map_err(|e| e.to_string())?;
        conn.execute(
            "DELETE FROM rotations WHERE id = ?1",
            rusqlite::params![id],
        ).map_err(|e| e.to_string())?;
        tracing::debug!(%rotation_id, "rotation deleted from store");
        Ok(())
    }
}
