// type_registry.rs
use crate::{NativeType, Prototype, Result, TypeError};
use indexmap::IndexMap;

/// Registro de prototipos por nombre de tipo.
///
/// Se construye una vez al arrancar el nodo y se pasa explícitamente a la
/// fábrica de procesos; no existe un registro global.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
  prototypes: IndexMap<String, Prototype>,
}

impl TypeRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registro con los escalares básicos y `Unknown`.
  pub fn with_builtin_types() -> Self {
    let mut registry = Self::new();
    for prototype in [Prototype::scalar("String", NativeType::String),
                      Prototype::scalar("Integer", NativeType::Integer),
                      Prototype::scalar("Float", NativeType::Float),
                      Prototype::scalar("Boolean", NativeType::Boolean),
                      Prototype::unknown()]
    {
      registry.prototypes.insert(prototype.of_type().to_string(), prototype);
    }
    registry
  }

  pub fn register(&mut self, prototype: Prototype) -> Result<()> {
    if self.prototypes.contains_key(prototype.of_type()) {
      return Err(TypeError::DuplicateType(prototype.of_type().to_string()));
    }
    self.prototypes.insert(prototype.of_type().to_string(), prototype);
    Ok(())
  }

  pub fn get(&self, kind: &str) -> Option<&Prototype> {
    self.prototypes.get(kind)
  }

  /// Como `get` pero devuelve `UnknownType` si el tipo no existe.
  pub fn prototype_of(&self, kind: &str) -> Result<&Prototype> {
    self.get(kind).ok_or_else(|| TypeError::UnknownType(kind.to_string()))
  }

  pub fn contains(&self, kind: &str) -> bool {
    self.prototypes.contains_key(kind)
  }

  pub fn kinds(&self) -> impl Iterator<Item = &str> {
    self.prototypes.keys().map(|k| k.as_str())
  }
}
