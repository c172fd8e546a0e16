// Archivo: domain.rs
// Propósito: tipos de datos persistidos por el almacén de eventos.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Evento ya persistido dentro de un stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: Uuid,
    pub stream_id: Uuid,
    /// Posición del evento en el stream (1-based, consecutiva).
    pub version: i64,
    /// Nombre del evento (por ejemplo `TaskEntryMarkedAsDone`).
    pub name: String,
    pub payload: JsonValue,
    pub metadata: JsonValue,
    /// Uuid del mensaje que provocó el evento, si lo hay.
    pub causation_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Evento pendiente de persistir; el almacén asigna id, versión y fecha.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub name: String,
    pub payload: JsonValue,
    pub metadata: JsonValue,
    pub causation_id: Option<Uuid>,
}

impl NewEvent {
    pub fn new(name: &str, payload: JsonValue) -> Self {
        Self { name: name.to_string(),
               payload,
               metadata: JsonValue::Object(Default::default()),
               causation_id: None }
    }

    pub fn caused_by(mut self, causation_id: Option<Uuid>) -> Self {
        self.causation_id = causation_id;
        self
    }
}

/// Metadatos ligeros de un stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMeta {
    pub id: Uuid,
    pub stream_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub current_version: i64,
    pub metadata: JsonValue,
}

/// Resultado de un `append` con control optimista.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersistResult {
    Ok { new_version: i64 },
    Conflict,
}
