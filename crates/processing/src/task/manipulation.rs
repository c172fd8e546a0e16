//! Operaciones de manipulación de payload sobre rutas JSON Pointer
//! (RFC 6901). Solo se navegan objetos y arrays existentes; `set` crea la
//! última clave pero no los contenedores intermedios.

use crate::errors::{ProcessingError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ManipulationOp {
  Set { path: String, value: JsonValue },
  Remove { path: String },
  Rename { from: String, to: String },
}

/// Secuencia ordenada de operaciones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayloadManipulation(Vec<ManipulationOp>);

impl PayloadManipulation {
  pub fn new(ops: Vec<ManipulationOp>) -> Result<Self> {
    if ops.is_empty() {
      return Err(ProcessingError::Definition("manipulate_payload requiere al menos una operacion".into()));
    }
    Ok(Self(ops))
  }

  pub fn ops(&self) -> &[ManipulationOp] {
    &self.0
  }

  /// Aplica las operaciones sobre una copia de `data`.
  pub fn apply(&self, data: &JsonValue) -> Result<JsonValue> {
    let mut out = data.clone();
    for op in &self.0 {
      match op {
        ManipulationOp::Set { path, value } => set_at(&mut out, path, value.clone())?,
        ManipulationOp::Remove { path } => {
          remove_at(&mut out, path)?;
        }
        ManipulationOp::Rename { from, to } => {
          let moved = remove_at(&mut out, from)?;
          set_at(&mut out, to, moved)?;
        }
      }
    }
    Ok(out)
  }
}

fn split_pointer(path: &str) -> Result<(&str, String)> {
  if !path.starts_with('/') {
    return Err(ProcessingError::InvalidArgument(format!("ruta JSON pointer invalida: '{}'", path)));
  }
  let idx = path.rfind('/').unwrap_or(0);
  let token = path[idx + 1..].replace("~1", "/").replace("~0", "~");
  Ok((&path[..idx], token))
}

fn parent_of<'a>(data: &'a mut JsonValue, parent: &str, path: &str) -> Result<&'a mut JsonValue> {
  data.pointer_mut(parent)
      .ok_or_else(|| ProcessingError::InvalidArgument(format!("no existe el contenedor de '{}'", path)))
}

fn set_at(data: &mut JsonValue, path: &str, value: JsonValue) -> Result<()> {
  let (parent, token) = split_pointer(path)?;
  match parent_of(data, parent, path)? {
    JsonValue::Object(map) => {
      map.insert(token, value);
      Ok(())
    }
    JsonValue::Array(items) => {
      let idx = token.parse::<usize>()
                     .map_err(|_| ProcessingError::InvalidArgument(format!("indice invalido en '{}'", path)))?;
      if idx < items.len() {
        items[idx] = value;
      } else if idx == items.len() {
        items.push(value);
      } else {
        return Err(ProcessingError::InvalidArgument(format!("indice fuera de rango en '{}'", path)));
      }
      Ok(())
    }
    _ => Err(ProcessingError::InvalidArgument(format!("'{}' no apunta a un objeto o array", path))),
  }
}

fn remove_at(data: &mut JsonValue, path: &str) -> Result<JsonValue> {
  let (parent, token) = split_pointer(path)?;
  let removed = match parent_of(data, parent, path)? {
    JsonValue::Object(map) => map.remove(&token),
    JsonValue::Array(items) => match token.parse::<usize>() {
      Ok(idx) if idx < items.len() => Some(items.remove(idx)),
      _ => None,
    },
    _ => None,
  };
  removed.ok_or_else(|| ProcessingError::InvalidArgument(format!("no existe un valor en '{}'", path)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn set_remove_and_rename_apply_in_order() {
    let m: PayloadManipulation = serde_json::from_value(json!([
      {"op": "set", "path": "/address/country", "value": "ES"},
      {"op": "remove", "path": "/id"},
      {"op": "rename", "from": "/name", "to": "/fullName"}
    ])).unwrap();
    let data = json!({"id": 1, "name": "Tom", "address": {"city": "Madrid"}});
    let out = m.apply(&data).unwrap();
    assert_eq!(out, json!({"fullName": "Tom", "address": {"city": "Madrid", "country": "ES"}}));
    // la entrada no cambia
    assert_eq!(data["id"], 1);
  }

  #[test]
  fn missing_paths_are_errors() {
    let m = PayloadManipulation::new(vec![ManipulationOp::Remove { path: "/nope".into() }]).unwrap();
    assert!(m.apply(&json!({})).is_err());
    let m = PayloadManipulation::new(vec![ManipulationOp::Set { path: "a/b".into(), value: json!(1) }]).unwrap();
    assert!(m.apply(&json!({})).is_err());
    assert!(PayloadManipulation::new(vec![]).is_err());
  }
}
