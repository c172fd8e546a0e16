//! processing-types: valores tipados que viajan dentro de los mensajes.
//!
//! Un `TypedValue` es un valor nativo JSON validado contra un `Prototype`.
//! El motor de procesos sólo necesita el nombre del tipo (`kind`), el
//! prototipo y la conversión desde/hacia el valor nativo; las reglas de
//! validación aquí son deliberadamente simples.
mod errors;
mod prototype;
mod type_registry;
mod type_stubs;
mod typed_value;

pub use errors::{Result, TypeError};
pub use prototype::{NativeType, Prototype};
pub use type_registry::TypeRegistry;
pub use type_stubs::TypeStubs;
pub use typed_value::TypedValue;
