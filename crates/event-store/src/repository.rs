// Archivo: repository.rs
// Propósito: definir el trait `EventStore`, el contrato que deben cumplir
// las persistencias de streams de eventos (in-memory, base de datos, etc.).
use crate::domain::{NewEvent, PersistResult, StoredEvent, StreamMeta};
use crate::errors::Result;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Contrato mínimo de un almacén de eventos append-only.
pub trait EventStore: Send + Sync {
    /// Crea un stream vacío (versión 0). Devuelve `Conflict` si ya existe.
    fn create_stream(&self, stream_id: Uuid, stream_type: Option<String>, metadata: JsonValue) -> Result<()>;

    /// Obtiene los metadatos del stream; `NotFound` si no existe.
    fn stream_meta(&self, stream_id: &Uuid) -> Result<StreamMeta>;

    /// Verifica si existe el stream.
    fn stream_exists(&self, stream_id: &Uuid) -> Result<bool>;

    /// Añade eventos de forma atómica. `expected_version` debe coincidir con
    /// la versión actual del stream; si no, devuelve
    /// `PersistResult::Conflict` sin escribir nada.
    fn append(&self, stream_id: &Uuid, expected_version: i64, events: Vec<NewEvent>) -> Result<PersistResult>;

    /// Lee los eventos con versión mayor que `from_version`, ordenados.
    fn read_events(&self, stream_id: &Uuid, from_version: i64) -> Result<Vec<StoredEvent>>;

    /// Cuenta los eventos de un stream. Devuelve -1 si no existe.
    fn count_events(&self, stream_id: &Uuid) -> Result<i64>;

    /// Lista los ids de stream, opcionalmente filtrados por tipo.
    fn list_streams(&self, stream_type: Option<&str>) -> Result<Vec<Uuid>>;

    /// Elimina un stream y sus eventos.
    fn delete_stream(&self, stream_id: &Uuid) -> Result<()>;
}
