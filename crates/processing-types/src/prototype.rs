// prototype.rs
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tipo nativo subyacente de un prototipo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeType {
  String,
  Integer,
  Float,
  Boolean,
  Dictionary,
  Collection,
  Unknown,
}

impl fmt::Display for NativeType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      NativeType::String => "string",
      NativeType::Integer => "integer",
      NativeType::Float => "float",
      NativeType::Boolean => "boolean",
      NativeType::Dictionary => "dictionary",
      NativeType::Collection => "collection",
      NativeType::Unknown => "unknown",
    };
    write!(f, "{}", s)
  }
}

/// Descripción de un tipo: nombre estable (`of_type`), tipo nativo y, para
/// diccionarios y colecciones, los prototipos anidados.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prototype {
  of_type: String,
  native_type: NativeType,
  #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
  properties: IndexMap<String, Prototype>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  item: Option<Box<Prototype>>,
}

impl Prototype {
  pub fn scalar(of_type: &str, native_type: NativeType) -> Self {
    Self { of_type: of_type.to_string(), native_type, properties: IndexMap::new(), item: None }
  }

  pub fn dictionary<I>(of_type: &str, properties: I) -> Self
    where I: IntoIterator<Item = (String, Prototype)>
  {
    Self { of_type: of_type.to_string(),
           native_type: NativeType::Dictionary,
           properties: properties.into_iter().collect(),
           item: None }
  }

  pub fn collection(of_type: &str, item: Prototype) -> Self {
    Self { of_type: of_type.to_string(),
           native_type: NativeType::Collection,
           properties: IndexMap::new(),
           item: Some(Box::new(item)) }
  }

  pub fn unknown() -> Self {
    Self::scalar("Unknown", NativeType::Unknown)
  }

  /// Nombre estable del tipo; es la base del nombre de los mensajes.
  pub fn of_type(&self) -> &str {
    &self.of_type
  }

  pub fn native_type(&self) -> NativeType {
    self.native_type
  }

  pub fn properties(&self) -> &IndexMap<String, Prototype> {
    &self.properties
  }

  pub fn item(&self) -> Option<&Prototype> {
    self.item.as_deref()
  }
}

impl fmt::Display for Prototype {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}({})", self.of_type, self.native_type)
  }
}
