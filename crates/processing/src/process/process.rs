use crate::config::{ProcessConfig, SYNC_LOG_MESSAGES};
use crate::engine::{Dispatchable, WorkflowEngine};
use crate::errors::{ProcessingError, Result};
use crate::message::{LastMessage, LogMessage, MessageType, ProcessingMessage, StartSubProcess, SubProcessFinished,
                     WorkflowMessage};
use crate::node::NodeName;
use crate::process::events::{apply, ProcessEvent, ProcessState, ProcessStatus};
use crate::process::ProcessId;
use crate::task::{ProcessData, Task, TaskList, TaskListId, TaskListPosition};
use chrono::Utc;
use log::{debug, error, info, warn};
use uuid::Uuid;

/// Evento aún no persistido junto con el uuid del mensaje que lo causó.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEvent {
  pub event: ProcessEvent,
  pub causation_id: Option<Uuid>,
}

// Resultado de activar una tarea.
enum Step {
  // se despachó un mensaje y la tarea espera respuesta
  Waiting,
  // la tarea terminó localmente; el mensaje alimenta a la siguiente
  Completed(WorkflowMessage),
  Failed(LogMessage),
}

/// Agregado que ejecuta una lista de tareas de forma lineal.
///
/// Todo cambio de estado se registra como `ProcessEvent` y se aplica con
/// `events::apply`. Los eventos quedan pendientes hasta que el repositorio
/// los persiste. Un mensaje que no corresponde a la tarea actual nunca
/// modifica el estado: se convierte en un `LogMessage` de error.
#[derive(Debug, Clone)]
pub struct Process {
  state: ProcessState,
  version: i64,
  pending: Vec<PendingEvent>,
  causation: Option<Uuid>,
}

impl Process {
  pub fn set_up(process_id: ProcessId,
                node_name: NodeName,
                tasks: Vec<Task>,
                config: ProcessConfig,
                parent_position: Option<TaskListPosition>)
                -> Result<Self> {
    let task_list = TaskList::schedule_tasks(TaskListId::link_with(node_name, process_id), tasks)?;
    let event = ProcessEvent::ProcessSetUp { process_id,
                                             parent_position,
                                             task_list,
                                             config };
    let state = apply(None, &event)?;
    Ok(Self { state,
              version: 1,
              pending: vec![PendingEvent { event,
                                           causation_id: None }],
              causation: None })
  }

  /// Reconstruye el proceso aplicando su historia completa.
  pub fn reconstitute(history: impl IntoIterator<Item = ProcessEvent>) -> Result<Self> {
    let mut state = None;
    let mut version = 0;
    for event in history {
      state = Some(apply(state, &event)?);
      version += 1;
    }
    let state = state.ok_or_else(|| ProcessingError::ProtocolViolation("historia de proceso vacia".into()))?;
    Ok(Self { state,
              version,
              pending: Vec::new(),
              causation: None })
  }

  pub fn process_id(&self) -> &ProcessId {
    &self.state.process_id
  }

  pub fn node_name(&self) -> &NodeName {
    self.state.task_list.task_list_id().node_name()
  }

  pub fn task_list(&self) -> &TaskList {
    &self.state.task_list
  }

  pub fn config(&self) -> &ProcessConfig {
    &self.state.config
  }

  pub fn status(&self) -> ProcessStatus {
    self.state.status()
  }

  pub fn is_sub_process(&self) -> bool {
    self.state.parent_position.is_some()
  }

  pub fn parent_task_list_position(&self) -> Option<&TaskListPosition> {
    self.state.parent_position.as_ref()
  }

  /// Terminado con o sin errores.
  pub fn is_finished(&self) -> bool {
    self.status().is_terminal()
  }

  pub fn is_successfully_done(&self) -> bool {
    self.status() == ProcessStatus::Finished && !self.state.task_list.has_failed_entries()
  }

  /// Número de eventos aplicados, persistidos o no.
  pub fn version(&self) -> i64 {
    self.version
  }

  pub fn pending_events(&self) -> &[PendingEvent] {
    &self.pending
  }

  pub fn take_pending_events(&mut self) -> Vec<PendingEvent> {
    std::mem::take(&mut self.pending)
  }

  /// Avanza el proceso.
  ///
  /// Sin mensaje arranca un proceso recién creado. Con mensaje, el mensaje
  /// debe apuntar a la tarea actual; si el proceso aún no arrancó, el
  /// mensaje es la entrada de la primera tarea.
  pub fn perform(&mut self, engine: &dyn WorkflowEngine, message: Option<ProcessingMessage>) -> Result<()> {
    self.causation = message.as_ref().map(|m| *m.uuid());
    let result = match message {
      None => self.start(engine),
      Some(m) => self.receive_message(engine, m),
    };
    self.causation = None;
    result
  }

  fn start(&mut self, engine: &dyn WorkflowEngine) -> Result<()> {
    if self.status() != ProcessStatus::Created {
      warn!("proceso {}: ya iniciado, se ignora perform sin mensaje", self.process_id());
      return Ok(());
    }
    info!("proceso {}: inicio con {} tareas", self.process_id(), self.task_list().len());
    self.record(ProcessEvent::ProcessStarted { at: Utc::now() })?;
    self.run_from_cursor(engine, None)
  }

  fn receive_message(&mut self, engine: &dyn WorkflowEngine, message: ProcessingMessage) -> Result<()> {
    match self.status() {
      ProcessStatus::Created => return self.start_with(engine, message),
      status if status.is_terminal() => {
        warn!("proceso {}: {} recibido en estado {:?}, se ignora",
              self.process_id(),
              message.message_name(),
              status);
        return Ok(());
      }
      _ => {}
    }
    let Some(entry) = self.task_list().current_entry() else {
      return Ok(());
    };
    let position = entry.position().clone();
    let task = entry.task().clone();

    if message.process_task_list_position() != Some(&position) {
      let received = message.process_task_list_position().cloned();
      warn!("proceso {}: {} dirigido a {} pero la tarea actual es {}",
            self.process_id(),
            message.message_name(),
            received.as_ref().map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
            position);
      // El aviso va a la posicion recibida, nunca a la tarea en curso ni al
      // padre. Un log nunca genera otro log.
      let is_log = matches!(message, ProcessingMessage::Log(_));
      if let Some(received) = received.filter(|_| !is_log) {
        let log = LogMessage::log_error_msg(format!("Message {} addressed to {} but current task is {}",
                                                    message.message_name(),
                                                    received,
                                                    position),
                                            &received);
        if let Err(e) = engine.dispatch(log.into()) {
          error!("proceso {}: no se pudo despachar el rechazo a {}: {}", self.process_id(), received, e);
        }
      }
      return Ok(());
    }

    match message {
      ProcessingMessage::Log(log) => self.receive_log(engine, &position, log),
      ProcessingMessage::Workflow(wf) if accepts(&task, &wf) => {
        debug!("proceso {}: {} completa {}", self.process_id(), wf.message_name(), position);
        self.record(ProcessEvent::TaskEntryMarkedAsDone { position,
                                                          at: Utc::now(),
                                                          result: Some(*wf.uuid()) })?;
        self.run_from_cursor(engine, Some(wf))
      }
      ProcessingMessage::SubProcessFinished(finished) if matches!(task, Task::RunSubProcess(_)) => {
        self.receive_sub_process_finished(engine, &position, finished)
      }
      other => {
        let log = LogMessage::log_wrong_message_received_for(&task, &position, &other.message_name());
        self.fail_task(engine, &position, log, true)?;
        self.run_from_cursor(engine, None)
      }
    }
  }

  // Proceso derivado: el mensaje entrante alimenta la primera tarea. Si la
  // primera tarea es justamente la recolección que el mensaje responde, se
  // da por cumplida.
  fn start_with(&mut self, engine: &dyn WorkflowEngine, message: ProcessingMessage) -> Result<()> {
    let ProcessingMessage::Workflow(wf) = message else {
      warn!("proceso {}: {} recibido antes de iniciar, se ignora",
            self.process_id(),
            message.message_name());
      return Ok(());
    };
    info!("proceso {}: inicio derivado de {}", self.process_id(), wf.message_name());
    self.record(ProcessEvent::ProcessStarted { at: Utc::now() })?;
    let first = self.task_list().current_entry().map(|e| (e.position().clone(), e.task().clone()));
    match first {
      Some((position, task @ Task::CollectData(_))) if accepts(&task, &wf) => {
        let wf = wf.reconnect_to_process_task(&position);
        self.record(ProcessEvent::TaskEntryMarkedAsRunning { position: position.clone(),
                                                             at: Utc::now() })?;
        self.record(ProcessEvent::TaskEntryMarkedAsDone { position,
                                                          at: Utc::now(),
                                                          result: Some(*wf.uuid()) })?;
        self.run_from_cursor(engine, Some(wf))
      }
      _ => self.run_from_cursor(engine, Some(wf)),
    }
  }

  fn receive_log(&mut self, engine: &dyn WorkflowEngine, position: &TaskListPosition, log: LogMessage) -> Result<()> {
    let awaiting = self.status() == ProcessStatus::AwaitingSubProcess;
    self.record(ProcessEvent::LogMessageReceived { position: position.clone(),
                                                   log: log.clone() })?;
    // mientras espera un sub-proceso, el resultado lo decide SubProcessFinished
    if log.is_error() && !awaiting {
      warn!("proceso {}: error reportado en {}: {}",
            self.process_id(),
            position,
            log.technical_msg());
      self.fail_task(engine, position, log, false)?;
      return self.run_from_cursor(engine, None);
    }
    debug!("proceso {}: log {} en {}: {}",
           self.process_id(),
           log.msg_code(),
           position,
           log.technical_msg());
    Ok(())
  }

  fn receive_sub_process_finished(&mut self,
                                  engine: &dyn WorkflowEngine,
                                  position: &TaskListPosition,
                                  finished: SubProcessFinished)
                                  -> Result<()> {
    if finished.succeed() {
      info!("proceso {}: sub-proceso {} terminado", self.process_id(), finished.sub_process_id());
      let next = match finished.last_message() {
        Some(LastMessage::Workflow(wf)) => Some(wf.reconnect_to_process_task(position)),
        _ => None,
      };
      self.record(ProcessEvent::TaskEntryMarkedAsDone { position: position.clone(),
                                                        at: Utc::now(),
                                                        result: Some(*finished.uuid()) })?;
      return self.run_from_cursor(engine, next);
    }
    let log = match finished.last_message() {
      Some(LastMessage::Log(log)) => log.reconnect_to_process_task(position),
      _ => LogMessage::log_error_msg(format!("Sub process {} failed", finished.sub_process_id()), position),
    };
    self.fail_task(engine, position, log, true)?;
    self.run_from_cursor(engine, None)
  }

  // Activa tareas desde el cursor hasta que una quede esperando respuesta,
  // el proceso falle o la lista termine.
  fn run_from_cursor(&mut self, engine: &dyn WorkflowEngine, mut previous: Option<WorkflowMessage>) -> Result<()> {
    let mut last = previous.clone().map(LastMessage::Workflow);
    loop {
      if self.status() == ProcessStatus::Failed {
        return Ok(());
      }
      let Some(entry) = self.task_list().current_entry() else {
        return self.finish(engine, last);
      };
      let position = entry.position().clone();
      let task = entry.task().clone();
      self.record(ProcessEvent::TaskEntryMarkedAsRunning { position: position.clone(),
                                                           at: Utc::now() })?;
      debug!("proceso {}: activa {} en {}", self.process_id(), task.kind_name(), position);

      let step = match &task {
        Task::CollectData(t) => {
          let cmd = WorkflowMessage::collect_data_of(t.prototype(),
                                                     self.node_name().clone(),
                                                     t.source().clone(),
                                                     t.metadata().clone()).connect_to_process_task(&position)?;
          self.dispatch_step(engine, cmd.into(), &position)
        }
        Task::ProcessData(t) => match previous.take() {
          None => Step::Failed(LogMessage::log_no_message_received_for(&task, &position)),
          Some(prev) => match prepare_process_data(&task, t, &position, prev) {
            Ok(cmd) => self.dispatch_step(engine, cmd.into(), &position),
            Err(log) => Step::Failed(log),
          },
        },
        Task::RunSubProcess(t) => {
          let cmd = StartSubProcess::at(position.clone(),
                                        t.process_definition().clone(),
                                        t.sync_log_messages(),
                                        self.config().stop_on_error(),
                                        t.target_node_name().clone(),
                                        previous.take().map(|m| m.reconnect_to_process_task(&position)));
          self.dispatch_step(engine, cmd.into(), &position)
        }
        Task::ManipulatePayload(t) => match previous.take() {
          None => Step::Failed(LogMessage::log_no_message_received_for(&task, &position)),
          Some(prev) => match t.manipulation().apply(prev.payload().data()) {
            Ok(data) => Step::Completed(prev.with_payload_data(data).reconnect_to_process_task(&position)),
            Err(e) => Step::Failed(LogMessage::log_exception(&e, &position)),
          },
        },
      };

      match step {
        Step::Waiting => return Ok(()),
        Step::Completed(next) => {
          self.record(ProcessEvent::TaskEntryMarkedAsDone { position,
                                                            at: Utc::now(),
                                                            result: Some(*next.uuid()) })?;
          last = Some(LastMessage::Workflow(next.clone()));
          previous = Some(next);
        }
        Step::Failed(log) => {
          self.fail_task(engine, &position, log.clone(), true)?;
          last = Some(LastMessage::Log(log));
          previous = None;
        }
      }
    }
  }

  fn dispatch_step(&self, engine: &dyn WorkflowEngine, message: Dispatchable, position: &TaskListPosition) -> Step {
    match engine.dispatch(message) {
      Ok(()) => Step::Waiting,
      Err(e) => {
        error!("proceso {}: fallo el despacho en {}: {}", self.process_id(), position, e);
        Step::Failed(LogMessage::log_exception(&e, position))
      }
    }
  }

  // Marca la tarea actual como fallida. Con `forward` el log se registra y
  // se despacha; sin él ya fue registrado al recibirlo.
  fn fail_task(&mut self,
               engine: &dyn WorkflowEngine,
               position: &TaskListPosition,
               log: LogMessage,
               forward: bool)
               -> Result<()> {
    warn!("proceso {}: tarea {} fallida: {}", self.process_id(), position, log.technical_msg());
    self.record(ProcessEvent::TaskEntryMarkedAsFailed { position: position.clone(),
                                                        at: Utc::now() })?;
    if forward {
      self.record(ProcessEvent::LogMessageReceived { position: position.clone(),
                                                     log: log.clone() })?;
      self.dispatch_log(engine, &log);
    }
    if self.status() == ProcessStatus::Failed {
      info!("proceso {}: detenido por error", self.process_id());
      self.notify_parent(engine, false, Some(LastMessage::Log(log)));
    }
    Ok(())
  }

  fn finish(&mut self, engine: &dyn WorkflowEngine, last: Option<LastMessage>) -> Result<()> {
    let succeed = !self.task_list().has_failed_entries();
    info!("proceso {}: terminado ({})",
          self.process_id(),
          if succeed { "ok" } else { "con tareas fallidas" });
    self.notify_parent(engine, succeed, last);
    Ok(())
  }

  fn notify_parent(&self, engine: &dyn WorkflowEngine, succeed: bool, last: Option<LastMessage>) {
    let Some(parent) = self.parent_task_list_position() else {
      return;
    };
    let event = SubProcessFinished::record(self.node_name().clone(), *self.process_id(), succeed, last, parent.clone());
    if let Err(e) = engine.dispatch(event.into()) {
      error!("proceso {}: no se pudo notificar al padre {}: {}", self.process_id(), parent, e);
    }
  }

  // Los fallos al despachar un log solo se registran: un log no puede
  // producir otro log.
  fn dispatch_log(&self, engine: &dyn WorkflowEngine, log: &LogMessage) {
    if let Err(e) = engine.dispatch(log.clone().into()) {
      error!("proceso {}: no se pudo despachar el log {}: {}", self.process_id(), log.uuid(), e);
    }
    if let Some(parent) = self.parent_task_list_position() {
      if self.config().boolean_value(SYNC_LOG_MESSAGES) {
        if let Err(e) = engine.dispatch(log.reconnect_to_process_task(parent).into()) {
          error!("proceso {}: no se pudo sincronizar el log con {}: {}", self.process_id(), parent, e);
        }
      }
    }
  }

  fn record(&mut self, event: ProcessEvent) -> Result<()> {
    self.state = apply(Some(self.state.clone()), &event)?;
    self.version += 1;
    self.pending.push(PendingEvent { event,
                                     causation_id: self.causation });
    Ok(())
  }
}

fn accepts(task: &Task, message: &WorkflowMessage) -> bool {
  match task {
    Task::CollectData(t) => {
      message.message_type() == MessageType::DataCollected && message.payload().type_class() == t.prototype().of_type()
    }
    Task::ProcessData(t) => {
      message.message_type() == MessageType::DataProcessed && t.allows(message.payload().type_class())
    }
    _ => false,
  }
}

// Prepara el comando process-data. Si el tipo entrante no está permitido se
// convierte al tipo preferido.
fn prepare_process_data(task: &Task,
                        process_data: &ProcessData,
                        position: &TaskListPosition,
                        previous: WorkflowMessage)
                        -> std::result::Result<WorkflowMessage, LogMessage> {
  if previous.is_command() {
    return Err(LogMessage::log_wrong_message_received_for(task, position, &previous.message_name()));
  }
  let previous = if process_data.allows(previous.payload().type_class()) {
    previous
  } else {
    match process_data.preferred_type() {
      Some(preferred) => previous.convert_payload_to(preferred)
                                 .map_err(|e| LogMessage::log_exception(&e, position))?,
      None => return Err(LogMessage::log_wrong_message_received_for(task, position, &previous.message_name())),
    }
  };
  previous.reconnect_to_process_task(position)
          .prepare_data_processing(process_data.target().clone())
          .map_err(|e| LogMessage::log_exception(&e, position))
}
