// errors.rs
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypeError {
  #[error("Valor inválido para el tipo {kind}: {reason}")]
  InvalidType { kind: String, reason: String },
  #[error("Tipo desconocido: {0}")]
  UnknownType(String),
  #[error("Tipo ya registrado: {0}")]
  DuplicateType(String),
}

impl TypeError {
  pub fn invalid(kind: &str, reason: impl Into<String>) -> Self {
    Self::InvalidType { kind: kind.to_string(), reason: reason.into() }
  }
}

pub type Result<T> = std::result::Result<T, TypeError>;
