//! SQLite-backed `DocumentStore`.

use super::{DocumentStore, StoreError, StoreResult, StoredDocument};
use crate::db::{open_db, open_db_in_memory};
use crate::model::{validate_document, DocumentKey, DocumentKind};
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    /// Wraps a connection that already has migrations applied.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    pub fn into_shared(self) -> Arc<dyn DocumentStore> {
        Arc::new(self)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn create(&self, kind: DocumentKind, body: &Value) -> StoreResult<DocumentKey> {
        validate_for_write(kind, body)?;
        let key = DocumentKey::generate();
        let text = serialize_body(body)?;

        self.conn().execute(
            "INSERT INTO documents (doc_key, kind, body) VALUES (?1, ?2, ?3);",
            params![key.as_str(), kind.as_str(), text],
        )?;

        info!(
            "event=document_create module=repo status=ok kind={kind} key={key} revision=1"
        );
        Ok(key)
    }

    fn read(&self, key: &DocumentKey) -> StoreResult<StoredDocument> {
        let row = self
            .conn()
            .query_row(
                "SELECT kind, body, revision FROM documents WHERE doc_key = ?1;",
                params![key.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((kind, body, revision)) = row else {
            debug!("event=document_read module=repo status=miss key={key}");
            return Err(StoreError::NotFound(key.clone()));
        };

        let kind = DocumentKind::parse(&kind)
            .ok_or_else(|| StoreError::InvalidData(format!("unknown kind `{kind}` for {key}")))?;
        let body = serde_json::from_str(&body)
            .map_err(|err| StoreError::InvalidData(format!("body of {key}: {err}")))?;
        let revision = u64::try_from(revision)
            .map_err(|_| StoreError::InvalidData(format!("negative revision for {key}")))?;

        debug!("event=document_read module=repo status=ok kind={kind} key={key} revision={revision}");
        Ok(StoredDocument {
            key: key.clone(),
            kind,
            body,
            revision,
        })
    }

    fn update(&self, key: &DocumentKey, body: &Value) -> StoreResult<()> {
        let conn = self.conn();
        let kind = conn
            .query_row(
                "SELECT kind FROM documents WHERE doc_key = ?1;",
                params![key.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        let kind = DocumentKind::parse(&kind)
            .ok_or_else(|| StoreError::InvalidData(format!("unknown kind `{kind}` for {key}")))?;

        validate_for_write(kind, body)?;
        let text = serialize_body(body)?;

        conn.execute(
            "UPDATE documents
             SET body = ?2,
                 revision = revision + 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE doc_key = ?1;",
            params![key.as_str(), text],
        )?;

        info!("event=document_update module=repo status=ok kind={kind} key={key}");
        Ok(())
    }

    fn delete(&self, key: &DocumentKey) -> StoreResult<()> {
        let changed = self.conn().execute(
            "DELETE FROM documents WHERE doc_key = ?1;",
            params![key.as_str()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(key.clone()));
        }

        info!("event=document_delete module=repo status=ok key={key}");
        Ok(())
    }

    fn list(&self, kind: DocumentKind) -> StoreResult<Vec<DocumentKey>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT doc_key FROM documents WHERE kind = ?1 ORDER BY seq;")?;
        let keys = stmt
            .query_map(params![kind.as_str()], |row| row.get::<_, String>(0))?
            .map(|key| key.map(DocumentKey::from_raw))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

fn validate_for_write(kind: DocumentKind, body: &Value) -> StoreResult<()> {
    validate_document(kind, body).map_err(|reason| {
        warn!("event=document_write module=repo status=rejected kind={kind} reason={reason}");
        StoreError::Rejected { kind, reason }
    })
}

fn serialize_body(body: &Value) -> StoreResult<String> {
    serde_json::to_string(body)
        .map_err(|err| StoreError::InvalidData(format!("unserializable body: {err}")))
}

#[cfg(test)]
mod tests {
    use super::SqliteDocumentStore;
    use crate::model::DocumentKind;
    use crate::repo::{DocumentStore, StoreError};
    use serde_json::json;

    fn store() -> SqliteDocumentStore {
        SqliteDocumentStore::open_in_memory().expect("in-memory store")
    }

    #[test]
    fn update_bumps_revision() {
        let store = store();
        let key = store
            .create(DocumentKind::Scene, &json!({"name": "Scene"}))
            .expect("create scene");
        assert_eq!(store.read(&key).expect("read").revision, 1);

        store
            .update(&key, &json!({"name": "Renamed"}))
            .expect("update scene");
        let stored = store.read(&key).expect("read");
        assert_eq!(stored.revision, 2);
        assert_eq!(stored.body["name"], json!("Renamed"));
    }

    #[test]
    fn missing_key_is_not_found() {
        let store = store();
        let key = crate::model::DocumentKey::generate();
        assert!(matches!(store.read(&key), Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.update(&key, &json!({"name": "x"})),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(store.delete(&key), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn list_returns_keys_of_one_kind_in_creation_order() {
        let store = store();
        let first = store
            .create(DocumentKind::Spectrum, &json!({"name": "A", "blackbody": {"temperature": 2856.0}}))
            .expect("create");
        store
            .create(DocumentKind::Scene, &json!({"name": "Scene"}))
            .expect("create");
        let second = store
            .create(DocumentKind::Spectrum, &json!({"name": "B", "monochromatic": {"wavelength": 555.0}}))
            .expect("create");

        assert_eq!(
            store.list(DocumentKind::Spectrum).expect("list"),
            vec![first, second]
        );
    }

    #[test]
    fn invalid_body_is_rejected_and_not_stored() {
        let store = store();
        let err = store
            .create(
                DocumentKind::SopTemplate,
                &json!({"name": "Mirror", "mirror": {"reflectance": -1.0}}),
            )
            .expect_err("negative reflectance");
        assert!(matches!(
            err,
            StoreError::Rejected {
                kind: DocumentKind::SopTemplate,
                ..
            }
        ));
        assert!(store.list(DocumentKind::SopTemplate).expect("list").is_empty());
    }
}
