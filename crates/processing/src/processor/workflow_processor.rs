// Archivo: workflow_processor.rs
// Propósito: recibir los mensajes que llegan a un nodo y traducirlos en
// operaciones sobre procesos (crear, derivar, continuar, arrancar
// sub-procesos), cargando y guardando cada proceso en el repositorio.
use crate::config::{STOP_ON_ERROR, SYNC_LOG_MESSAGES};
use crate::engine::WorkflowEngine;
use crate::errors::Result;
use crate::factory::ProcessFactory;
use crate::message::{LastMessage, LogMessage, ProcessingMessage, StartSubProcess, SubProcessFinished};
use crate::node::NodeName;
use crate::process::{Process, ProcessId, ProcessRepository};
use crate::processor::queue::MessageQueue;
use log::{debug, error, info, warn};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;

const HANDLER_NAME: &str = "workflow-processor";

pub struct WorkflowProcessor {
  node_name: NodeName,
  engine: Arc<dyn WorkflowEngine>,
  factory: ProcessFactory,
  repository: ProcessRepository,
}

impl WorkflowProcessor {
  pub fn new(engine: Arc<dyn WorkflowEngine>, factory: ProcessFactory, repository: ProcessRepository) -> Self {
    Self { node_name: factory.node_name().clone(),
           engine,
           factory,
           repository }
  }

  pub fn node_name(&self) -> &NodeName {
    &self.node_name
  }

  pub fn factory(&self) -> &ProcessFactory {
    &self.factory
  }

  /// Crea un proceso desde una definición, lo arranca y lo guarda.
  pub fn start_process(&self, definition: &JsonValue) -> Result<ProcessId> {
    let mut process = self.factory.create_process_from_definition(definition, None)?;
    let id = *process.process_id();
    info!("nodo {}: nuevo proceso {}", self.node_name, id);
    process.perform(self.engine.as_ref(), None)?;
    self.repository.add(&mut process)?;
    Ok(id)
  }

  pub fn process(&self, process_id: &ProcessId) -> Result<Process> {
    self.repository.get(process_id)
  }

  pub fn receive(&self, message: ProcessingMessage) -> Result<()> {
    debug!("nodo {}: recibe {} ({})", self.node_name, message.message_name(), message.uuid());
    match message {
      ProcessingMessage::Workflow(wf) => {
        let own = wf.process_task_list_position().filter(|p| p.node_name() == &self.node_name).cloned();
        match own {
          Some(position) if wf.is_command() => {
            warn!("nodo {}: comando {} no soportado", self.node_name, wf.message_name());
            let log = LogMessage::log_unsupported_message_received(&wf.message_name(), HANDLER_NAME, &position);
            self.engine.dispatch(log.into())
          }
          Some(position) => self.continue_process(position.process_id(), wf.into()),
          None => {
            let mut process = self.factory.derive_process_from_message(&wf)?;
            info!("nodo {}: proceso {} derivado de {}",
                  self.node_name,
                  process.process_id(),
                  wf.message_name());
            process.perform(self.engine.as_ref(), Some(wf.into()))?;
            self.repository.add(&mut process)
          }
        }
      }
      ProcessingMessage::Log(log) => {
        let position = log.process_task_list_position().clone();
        if position.node_name() != &self.node_name || !self.repository.contains(position.process_id())? {
          debug!("nodo {}: log para {} sin proceso local", self.node_name, position);
          return Ok(());
        }
        self.continue_process(position.process_id(), log.into())
      }
      ProcessingMessage::StartSubProcess(cmd) => self.start_sub_process(cmd),
      ProcessingMessage::SubProcessFinished(event) => {
        let parent = *event.parent_task_list_position().process_id();
        self.continue_process(&parent, event.into())
      }
    }
  }

  /// Procesa la cola hasta vaciarla. Los errores de un mensaje se registran
  /// y no detienen al resto.
  pub fn drain(&self, queue: &MessageQueue) -> usize {
    let mut handled = 0;
    while let Some(message) = queue.claim() {
      let name = message.message_name();
      if let Err(e) = self.receive(message) {
        error!("nodo {}: error procesando {}: {}", self.node_name, name, e);
      }
      handled += 1;
    }
    handled
  }

  fn continue_process(&self, process_id: &ProcessId, message: ProcessingMessage) -> Result<()> {
    let mut process = self.repository.get(process_id)?;
    process.perform(self.engine.as_ref(), Some(message))?;
    self.repository.save(&mut process)
  }

  fn start_sub_process(&self, cmd: StartSubProcess) -> Result<()> {
    let parent = cmd.parent_task_list_position().clone();
    let definition = sub_process_definition(&cmd);
    let mut process = match self.factory.create_process_from_definition(&definition, Some(parent.clone())) {
      Ok(p) => p,
      Err(e) => {
        // el padre no debe quedar esperando una definición inválida
        error!("nodo {}: sub-proceso invalido para {}: {}", self.node_name, parent, e);
        let log = LogMessage::log_exception(&e, &parent);
        let finished = SubProcessFinished::record(self.node_name.clone(),
                                                  ProcessId::generate(),
                                                  false,
                                                  Some(LastMessage::Log(log)),
                                                  parent);
        return self.engine.dispatch(finished.into());
      }
    };
    info!("nodo {}: sub-proceso {} para {}", self.node_name, process.process_id(), parent);
    process.perform(self.engine.as_ref(), cmd.previous_message().cloned().map(Into::into))?;
    self.repository.add(&mut process)
  }
}

// El `stop_on_error` del padre aplica solo si la definición no lo fija.
fn sub_process_definition(cmd: &StartSubProcess) -> JsonValue {
  let mut definition = cmd.sub_process_definition().clone();
  if let Some(object) = definition.as_object_mut() {
    let config = object.entry("config").or_insert_with(|| json!({}));
    if config.is_null() {
      *config = json!({});
    }
    if let Some(config) = config.as_object_mut() {
      config.entry(STOP_ON_ERROR).or_insert(json!(cmd.stop_on_error()));
      config.insert(SYNC_LOG_MESSAGES.to_string(), json!(cmd.sync_log_messages()));
    }
  }
  definition
}
