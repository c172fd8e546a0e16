use crate::engine::MessageHandler;
use crate::errors::Result;
use crate::message::ProcessingMessage;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Cola FIFO en memoria entre los buses y el `WorkflowProcessor`.
///
/// Los handlers de bus solo encolan; el procesamiento ocurre al reclamar.
/// Así un proceso queda guardado antes de que llegue la respuesta a un
/// mensaje que él mismo despachó.
#[derive(Default)]
pub struct MessageQueue {
  queue: Mutex<VecDeque<ProcessingMessage>>,
}

impl MessageQueue {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn enqueue(&self, message: ProcessingMessage) {
    self.queue.lock().unwrap_or_else(|e| e.into_inner()).push_back(message);
  }

  /// Reclama el siguiente mensaje, si existe.
  pub fn claim(&self) -> Option<ProcessingMessage> {
    self.queue.lock().unwrap_or_else(|e| e.into_inner()).pop_front()
  }

  pub fn len(&self) -> usize {
    self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Handler de bus que encola una copia de cada mensaje.
  pub fn handler(self: &Arc<Self>) -> Arc<dyn MessageHandler> {
    let queue = Arc::clone(self);
    Arc::new(move |message: &ProcessingMessage| -> Result<()> {
      queue.enqueue(message.clone());
      Ok(())
    })
  }
}
