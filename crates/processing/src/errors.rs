use event_store::StoreError;
use processing_types::TypeError;
use thiserror::Error;

// Errores del motor de procesos.
//
// `Definition` y `Routing` son fatales para quien construye procesos o
// configura el motor. `ProtocolViolation` lo captura el propio proceso y lo
// convierte en un `LogMessage`. `TypeMismatch` lo devuelven las
// transformaciones de mensajes.
#[derive(Error, Debug)]
pub enum ProcessingError {
  /// Definición de proceso o de tarea inválida.
  #[error("Error de definicion: {0}")]
  Definition(String),

  /// Mensaje que no corresponde al estado actual del proceso.
  #[error("Violacion de protocolo: {0}")]
  ProtocolViolation(String),

  /// Bus no registrado o registrado dos veces para un nodo.
  #[error("Error de enrutamiento: {0}")]
  Routing(String),

  /// El tipo del payload no coincide con el solicitado.
  #[error("Tipo incorrecto: se esperaba {expected} pero se recibio {actual}")]
  TypeMismatch { expected: String, actual: String },

  /// Mensaje o envelope mal formado, o transformación no permitida.
  #[error("Mensaje invalido: {0}")]
  InvalidMessage(String),

  #[error("Argumento invalido: {0}")]
  InvalidArgument(String),

  #[error("Error de tipo: {0}")]
  Type(#[from] TypeError),

  /// Errores originados en el almacén de eventos.
  #[error("Error de almacenamiento: {0}")]
  Store(#[from] StoreError),

  /// Otro escritor avanzó el stream del proceso.
  #[error("Conflicto de concurrencia: {0}")]
  Concurrency(String),

  #[error("Error de serializacion: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProcessingError>;
