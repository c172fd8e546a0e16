mod common;

use common::{node, user_value};
use event_store::{EventStore, InMemoryEventStore};
use processing::{CommandBus, EventBus, MessageQueue, NodeName, ProcessFactory, ProcessRepository, ProcessStatus,
                 ProcessingError, ProcessingMessage, RegistryWorkflowEngine, TaskStatus, WorkflowEngine,
                 WorkflowProcessor};
use processing_types::TypeStubs;
use serde_json::json;
use std::sync::Arc;

struct Harness {
  engine: Arc<RegistryWorkflowEngine>,
  processor: WorkflowProcessor,
  store: Arc<InMemoryEventStore>,
  wf: Arc<MessageQueue>,
  remote: Arc<MessageQueue>,
}

// "wf" aloja el procesador; "crm" y "erp" son nodos remotos simulados.
fn harness() -> Harness {
  let engine = Arc::new(RegistryWorkflowEngine::new());
  let wf = Arc::new(MessageQueue::new());
  let remote = Arc::new(MessageQueue::new());

  let wf_commands = Arc::new(CommandBus::new("wf-commands"));
  wf_commands.route_all(wf.handler()).unwrap();
  let wf_events = Arc::new(EventBus::new("wf-events"));
  wf_events.route_all(wf.handler());
  engine.register_command_bus(wf_commands, [node("wf")]).unwrap();
  engine.register_event_bus(wf_events, [node("wf")]).unwrap();

  let remote_commands = Arc::new(CommandBus::new("remote-commands"));
  remote_commands.route_all(remote.handler()).unwrap();
  engine.register_command_bus(remote_commands, [node("crm"), node("erp")]).unwrap();

  let store = Arc::new(InMemoryEventStore::new());
  let factory = ProcessFactory::new(node("wf"), Arc::new(TypeStubs::sample_registry().unwrap()));
  let repository = ProcessRepository::new(store.clone());
  let processor = WorkflowProcessor::new(engine.clone(), factory, repository);
  Harness { engine,
            processor,
            store,
            wf,
            remote }
}

impl Harness {
  // Responde los comandos remotos y drena hasta que no quede nada.
  fn run(&self) -> Result<(), ProcessingError> {
    loop {
      self.processor.drain(&self.wf);
      let Some(message) = self.remote.claim() else {
        return Ok(());
      };
      let name = message.message_name();
      let ProcessingMessage::Workflow(cmd) = message else {
        panic!("comando remoto inesperado: {}", name);
      };
      let answer = if cmd.message_name().ends_with("collect-data") {
        cmd.answer_with(&user_value())?
      } else {
        cmd.answer_with_data_processing_completed()?
      };
      self.engine.dispatch(answer.into())?;
    }
  }
}

#[test]
fn processor_runs_a_process_to_completion() -> Result<(), ProcessingError> {
  let h = harness();
  let def = json!({
    "process_type": "linear_messaging",
    "tasks": [
      {"task_type": "collect_data", "source": "crm", "processing_type": "User"},
      {"task_type": "process_data", "target": "erp", "allowed_types": ["User"]}
    ]
  });
  let id = h.processor.start_process(&def)?;
  h.run()?;

  let process = h.processor.process(&id)?;
  assert_eq!(process.status(), ProcessStatus::Finished);
  assert!(process.is_successfully_done());
  // setup, inicio y running/done por cada tarea
  assert_eq!(h.store.count_events(process.process_id().as_uuid())?, 6);
  Ok(())
}

#[test]
fn sub_process_on_the_same_node_reports_back_to_its_parent() -> Result<(), ProcessingError> {
  let h = harness();
  let def = json!({
    "process_type": "linear_messaging",
    "tasks": [
      {"task_type": "collect_data", "source": "crm", "processing_type": "User"},
      {"task_type": "run_sub_process", "target_node_name": "wf", "sync_log_messages": true,
       "process_definition": {
         "process_type": "linear_messaging",
         "tasks": [{"task_type": "process_data", "target": "erp", "allowed_types": ["User"]}]
       }}
    ],
    "config": {"stop_on_error": true}
  });
  let id = h.processor.start_process(&def)?;
  h.run()?;

  let parent = h.processor.process(&id)?;
  assert!(parent.is_successfully_done());
  let ids = h.store.list_streams(Some("process"))?;
  assert_eq!(ids.len(), 2);
  let child_id = ids.into_iter().find(|i| i != id.as_uuid()).unwrap();
  let child = h.processor.process(&processing::ProcessId::from_uuid(child_id))?;
  assert!(child.is_sub_process());
  assert!(child.config().stop_on_error());
  assert_eq!(child.parent_task_list_position().map(|p| p.position()), Some(2));
  assert!(child.is_successfully_done());
  Ok(())
}

#[test]
fn invalid_sub_process_definition_fails_the_parent() -> Result<(), ProcessingError> {
  let h = harness();
  let def = json!({
    "process_type": "linear_messaging",
    "tasks": [
      {"task_type": "collect_data", "source": "crm", "processing_type": "User"},
      {"task_type": "run_sub_process", "target_node_name": "wf",
       "process_definition": {"process_type": "linear_messaging", "tasks": []}}
    ],
    "config": {"stop_on_error": true}
  });
  let id = h.processor.start_process(&def)?;
  let Some(ProcessingMessage::Workflow(cmd)) = h.remote.claim() else {
    panic!("se esperaba collect-data");
  };
  h.engine.dispatch(cmd.answer_with(&user_value())?.into())?;
  // se procesa el data-collected a mano para interceptar el StartSubProcess
  let answer = h.wf.claim().expect("data-collected en la cola de wf");
  h.processor.receive(answer)?;
  let Some(ProcessingMessage::StartSubProcess(start)) = h.wf.claim() else {
    panic!("se esperaba StartSubProcess");
  };
  // se reemplaza la definición por una inválida
  let broken = processing::StartSubProcess::at(start.parent_task_list_position().clone(),
                                               json!({"process_type": "unknown"}),
                                               false,
                                               true,
                                               NodeName::new("wf")?,
                                               None);
  h.processor.receive(broken.into())?;
  h.run()?;

  let parent = h.processor.process(&id)?;
  assert_eq!(parent.status(), ProcessStatus::Failed);
  Ok(())
}

#[test]
fn messages_for_a_finished_process_are_ignored() -> Result<(), ProcessingError> {
  let h = harness();
  let def = json!({
    "process_type": "linear_messaging",
    "tasks": [{"task_type": "collect_data", "source": "crm", "processing_type": "User"}]
  });
  let id = h.processor.start_process(&def)?;
  let Some(ProcessingMessage::Workflow(cmd)) = h.remote.claim() else {
    panic!("se esperaba collect-data");
  };
  let answer = cmd.answer_with(&user_value())?;
  h.processor.receive(answer.clone().into())?;
  let version = h.processor.process(&id)?.version();
  h.processor.receive(answer.into())?;
  let process = h.processor.process(&id)?;
  assert_eq!(process.version(), version);
  assert!(process.is_successfully_done());
  Ok(())
}

#[test]
fn duplicate_reply_is_rejected_without_touching_the_running_task() -> Result<(), ProcessingError> {
  let h = harness();
  let def = json!({
    "process_type": "linear_messaging",
    "tasks": [
      {"task_type": "collect_data", "source": "crm", "processing_type": "User"},
      {"task_type": "collect_data", "source": "crm", "processing_type": "User"}
    ],
    "config": {"stop_on_error": false}
  });
  let id = h.processor.start_process(&def)?;
  let Some(ProcessingMessage::Workflow(cmd)) = h.remote.claim() else {
    panic!("se esperaba collect-data");
  };
  let answer = cmd.answer_with(&user_value())?;
  h.engine.dispatch(answer.clone().into())?;
  h.processor.drain(&h.wf);

  let statuses = |id: &processing::ProcessId| -> Result<(usize, Vec<TaskStatus>), ProcessingError> {
    let process = h.processor.process(id)?;
    let list = process.task_list();
    Ok((list.cursor(), list.entries().iter().map(|e| e.status()).collect()))
  };
  let before = statuses(&id)?;
  assert_eq!(before, (2, vec![TaskStatus::Done, TaskStatus::Running]));

  // la misma respuesta llega de nuevo; el aviso de rechazo vuelve por el bus
  h.engine.dispatch(answer.into())?;
  h.processor.drain(&h.wf);
  assert!(h.wf.is_empty());

  assert_eq!(statuses(&id)?, before);
  assert_eq!(h.processor.process(&id)?.status(), ProcessStatus::Running);
  Ok(())
}
