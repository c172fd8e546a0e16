// Archivo: stubs.rs
// Propósito: implementación en memoria del `EventStore` para pruebas y
// wiring rápido. No es durable.
use crate::domain::{NewEvent, PersistResult, StoredEvent, StreamMeta};
use crate::errors::{Result, StoreError};
use crate::repository::EventStore;
use chrono::Utc;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

// Minimal in-memory event store (not durable)
pub struct InMemoryEventStore {
    /// Metadatos de stream indexados por id.
    streams: Mutex<HashMap<Uuid, StreamMeta>>,
    /// Eventos por stream, en orden de versión.
    events: Mutex<HashMap<Uuid, Vec<StoredEvent>>>,
}

impl InMemoryEventStore {
    /// Crea una nueva instancia vacía.
    pub fn new() -> Self {
        Self { streams: Mutex::new(HashMap::new()),
               events: Mutex::new(HashMap::new()) }
    }

    /// Helper para mapear `Mutex::lock()` en un `Result` con
    /// `StoreError::Storage`.
    fn lock<'a, T>(&'a self, m: &'a Mutex<T>) -> std::result::Result<MutexGuard<'a, T>, StoreError> {
        m.lock().map_err(|e| StoreError::Storage(format!("mutex poisoned: {:?}", e)))
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStore for InMemoryEventStore {
    fn create_stream(&self, stream_id: Uuid, stream_type: Option<String>, metadata: JsonValue) -> Result<()> {
        let mut streams = self.lock(&self.streams)?;
        if streams.contains_key(&stream_id) {
            return Err(StoreError::Conflict(format!("stream {} ya existe", stream_id)));
        }
        streams.insert(stream_id,
                       StreamMeta { id: stream_id,
                                    stream_type,
                                    created_at: Utc::now(),
                                    current_version: 0,
                                    metadata });
        Ok(())
    }

    fn stream_meta(&self, stream_id: &Uuid) -> Result<StreamMeta> {
        let streams = self.lock(&self.streams)?;
        streams.get(stream_id)
               .cloned()
               .ok_or(StoreError::NotFound(format!("stream {}", stream_id)))
    }

    fn stream_exists(&self, stream_id: &Uuid) -> Result<bool> {
        Ok(self.lock(&self.streams)?.contains_key(stream_id))
    }

    /// Persiste los eventos aplicando control optimista por
    /// `expected_version`. La versión de cada evento es consecutiva.
    fn append(&self, stream_id: &Uuid, expected_version: i64, events: Vec<NewEvent>) -> Result<PersistResult> {
        let mut streams = self.lock(&self.streams)?;
        let mut stored = self.lock(&self.events)?;
        let meta = streams.get_mut(stream_id)
                          .ok_or(StoreError::NotFound(format!("stream {}", stream_id)))?;
        // Optimistic concurrency: check expected_version
        if meta.current_version != expected_version {
            return Ok(PersistResult::Conflict);
        }

        let list = stored.entry(*stream_id).or_default();
        for event in events {
            meta.current_version += 1;
            list.push(StoredEvent { id: Uuid::new_v4(),
                                    stream_id: *stream_id,
                                    version: meta.current_version,
                                    name: event.name,
                                    payload: event.payload,
                                    metadata: event.metadata,
                                    causation_id: event.causation_id,
                                    created_at: Utc::now() });
        }

        Ok(PersistResult::Ok { new_version: meta.current_version })
    }

    fn read_events(&self, stream_id: &Uuid, from_version: i64) -> Result<Vec<StoredEvent>> {
        if !self.stream_exists(stream_id)? {
            return Err(StoreError::NotFound(format!("stream {}", stream_id)));
        }
        let stored = self.lock(&self.events)?;
        Ok(stored.get(stream_id)
                 .map(|list| list.iter().filter(|e| e.version > from_version).cloned().collect())
                 .unwrap_or_default())
    }

    fn count_events(&self, stream_id: &Uuid) -> Result<i64> {
        if !self.stream_exists(stream_id)? {
            return Ok(-1);
        }
        let stored = self.lock(&self.events)?;
        Ok(stored.get(stream_id).map(|v| v.len() as i64).unwrap_or(0))
    }

    fn list_streams(&self, stream_type: Option<&str>) -> Result<Vec<Uuid>> {
        let streams = self.lock(&self.streams)?;
        let mut metas: Vec<&StreamMeta> = streams.values()
                                                 .filter(|m| stream_type.is_none() || m.stream_type.as_deref() == stream_type)
                                                 .collect();
        metas.sort_by_key(|m| m.created_at);
        Ok(metas.into_iter().map(|m| m.id).collect())
    }

    fn delete_stream(&self, stream_id: &Uuid) -> Result<()> {
        let mut streams = self.lock(&self.streams)?;
        if streams.remove(stream_id).is_none() {
            return Err(StoreError::NotFound(format!("stream {}", stream_id)));
        }
        self.lock(&self.events)?.remove(stream_id);
        Ok(())
    }
}
