// Archivo: errors.rs
// Propósito: errores del almacén de eventos y el alias Result<T>.
use thiserror::Error;
/// Errores comunes del almacén de eventos.
///
/// - `NotFound`: stream inexistente.
/// - `Conflict`: el stream ya existe o la versión no es consecutiva.
/// - `Storage`: error del almacenamiento subyacente.
/// - `Serialization`: payload no serializable.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Stream no encontrado.
    #[error("No encontrado: {0}")]
    NotFound(String),
    /// Conflicto de creación o de versión.
    #[error("Conflicto: {0}")]
    Conflict(String),
    /// Error genérico de almacenamiento.
    #[error("Error de almacenamiento: {0}")]
    Storage(String),
    /// Error de serialización JSON.
    #[error("Error de serializacion: {0}")]
    Serialization(#[from] serde_json::Error),
}
/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, StoreError>;
