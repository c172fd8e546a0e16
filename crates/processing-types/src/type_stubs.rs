use crate::errors::Result;
use crate::{NativeType, Prototype, TypeRegistry};

/// Prototipos de ejemplo (usuario y dirección) para demos y pruebas.
pub struct TypeStubs;

impl TypeStubs {
  pub fn address_prototype() -> Prototype {
    Self::address_named("Address")
  }

  pub fn user_prototype() -> Prototype {
    Self::user_named("User")
  }

  /// Mismo esquema que `User` bajo otro nombre; sirve como tipo destino de
  /// una conversión.
  pub fn target_user_prototype() -> Prototype {
    Self::user_named("TargetUser")
  }

  /// Registro con los tipos básicos más `User`, `TargetUser` y `Address`.
  pub fn sample_registry() -> Result<TypeRegistry> {
    let mut registry = TypeRegistry::with_builtin_types();
    for prototype in [Self::user_prototype(), Self::target_user_prototype(), Self::address_prototype()] {
      registry.register(prototype)?;
    }
    Ok(registry)
  }

  fn address_named(name: &str) -> Prototype {
    Prototype::dictionary(name,
                          [("street".to_string(), Prototype::scalar("String", NativeType::String)),
                           ("streetNumber".to_string(), Prototype::scalar("Integer", NativeType::Integer)),
                           ("zip".to_string(), Prototype::scalar("String", NativeType::String)),
                           ("city".to_string(), Prototype::scalar("String", NativeType::String))])
  }

  fn user_named(name: &str) -> Prototype {
    Prototype::dictionary(name,
                          [("id".to_string(), Prototype::scalar("Integer", NativeType::Integer)),
                           ("name".to_string(), Prototype::scalar("String", NativeType::String)),
                           ("address".to_string(), Self::address_named("Address"))])
  }
}
