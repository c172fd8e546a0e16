// typed_value.rs
use crate::{NativeType, Prototype, Result, TypeError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Valor nativo validado contra su prototipo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedValue {
  prototype: Prototype,
  value: JsonValue,
}

impl TypedValue {
  /// Construye el valor validando `value` contra `prototype`. En los
  /// diccionarios las claves no declaradas se descartan.
  pub fn from_native_value(prototype: &Prototype, value: JsonValue) -> Result<Self> {
    let value = conform(prototype, value)?;
    Ok(Self { prototype: prototype.clone(), value })
  }

  pub fn kind(&self) -> &str {
    self.prototype.of_type()
  }

  pub fn prototype(&self) -> &Prototype {
    &self.prototype
  }

  pub fn native_value(&self) -> &JsonValue {
    &self.value
  }

  pub fn into_native_value(self) -> JsonValue {
    self.value
  }
}

fn conform(prototype: &Prototype, value: JsonValue) -> Result<JsonValue> {
  let kind = prototype.of_type();
  match prototype.native_type() {
    NativeType::String if value.is_string() => Ok(value),
    NativeType::Integer if value.is_i64() || value.is_u64() => Ok(value),
    NativeType::Float if value.is_number() => Ok(value),
    NativeType::Boolean if value.is_boolean() => Ok(value),
    NativeType::Unknown if !value.is_null() => Ok(value),
    NativeType::Dictionary => {
      let JsonValue::Object(mut object) = value else {
        return Err(TypeError::invalid(kind, "se esperaba un diccionario"));
      };
      let mut out = Map::new();
      for (name, property) in prototype.properties() {
        let v = object.remove(name)
                      .ok_or_else(|| TypeError::invalid(kind, format!("falta la propiedad '{}'", name)))?;
        out.insert(name.clone(), conform(property, v)?);
      }
      Ok(JsonValue::Object(out))
    }
    NativeType::Collection => {
      let JsonValue::Array(items) = value else {
        return Err(TypeError::invalid(kind, "se esperaba una colección"));
      };
      match prototype.item() {
        Some(item) => items.into_iter()
                           .map(|v| conform(item, v))
                           .collect::<Result<Vec<_>>>()
                           .map(JsonValue::Array),
        None => Ok(JsonValue::Array(items)),
      }
    }
    native => Err(TypeError::invalid(kind, format!("el valor {} no es de tipo {}", value, native))),
  }
}
