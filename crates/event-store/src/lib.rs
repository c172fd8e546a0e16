//! Crate `event-store`: persistencia append-only de eventos por stream
//!
//! Cada agregado (por ejemplo un proceso) vive en un stream identificado por
//! `Uuid`. Los eventos se guardan como `StoredEvent` autocontenidos y el
//! estado se reconstruye aplicando la historia completa en orden.
//!
//! Diseño resumido:
//! - Versionado por stream: la versión es el número de eventos guardados; el
//!   primer evento tiene versión 1.
//! - Locking optimista: `append` recibe un `expected_version` y devuelve
//!   `PersistResult::Conflict` si otro escritor avanzó el stream.
//! - Trazabilidad: `causation_id` guarda el uuid del mensaje que provocó el
//!   evento.
//!
//! Ejemplo rápido:
//! ```rust
//! use event_store::{EventStore, InMemoryEventStore, NewEvent, PersistResult};
//! use serde_json::json;
//! let store = InMemoryEventStore::new();
//! let id = uuid::Uuid::new_v4();
//! store.create_stream(id, Some("process".into()), json!({})).unwrap();
//! let res = store.append(&id, 0, vec![NewEvent::new("Started", json!({}))]).unwrap();
//! assert_eq!(res, PersistResult::Ok { new_version: 1 });
//! ```
pub mod domain;
pub mod errors;
pub mod repository;
pub mod stubs;

pub use domain::*;
pub use errors::*;
pub use repository::*;
pub use stubs::*;
