mod common;

use common::{node, user_value, RecordingEngine};
use processing::message::log_message::{CODE_NO_MESSAGE_RECEIVED, CODE_WRONG_MESSAGE_RECEIVED};
use processing::{LastMessage, LogMessage, Process, ProcessFactory, ProcessStatus, ProcessingError, ProcessingMessage,
                 SubProcessFinished, TaskListPosition, TaskStatus, WorkflowMessage};
use processing_types::{TypeStubs, TypedValue};
use serde_json::{json, Map as JsonMap};
use std::sync::Arc;

fn factory() -> ProcessFactory {
  ProcessFactory::new(node("wf"), Arc::new(TypeStubs::sample_registry().unwrap()))
}

fn collect_user(stop_on_error: bool) -> serde_json::Value {
  json!({
    "process_type": "linear_messaging",
    "tasks": [
      {"task_type": "collect_data", "source": "test-case", "processing_type": "User"},
      {"task_type": "collect_data", "source": "test-case", "processing_type": "Address"}
    ],
    "config": {"stop_on_error": stop_on_error}
  })
}

fn only_workflow(sent: &[ProcessingMessage]) -> &WorkflowMessage {
  match sent {
    [ProcessingMessage::Workflow(m)] => m,
    other => panic!("se esperaba un unico workflow message, hubo {:?}", other),
  }
}

fn only_log(sent: &[ProcessingMessage]) -> &LogMessage {
  match sent {
    [ProcessingMessage::Log(l)] => l,
    other => panic!("se esperaba un unico log, hubo {:?}", other),
  }
}

#[test]
fn collect_user_process_finishes_after_answer() -> Result<(), ProcessingError> {
  let def = json!({
    "process_type": "linear_messaging",
    "tasks": [{"task_type": "collect_data", "source": "test-case", "processing_type": "User"}]
  });
  let mut process = factory().create_process_from_definition(&def, None)?;
  assert_eq!(process.task_list().len(), 1);
  assert_eq!(process.task_list().cursor(), 1);
  assert_eq!(process.status(), ProcessStatus::Created);
  assert!(!process.is_sub_process());

  let engine = RecordingEngine::default();
  process.perform(&engine, None)?;
  let sent = engine.take();
  let cmd = only_workflow(&sent);
  assert_eq!(cmd.message_name(), "user-collect-data");
  assert_eq!(cmd.version(), 1);
  assert_eq!(cmd.target().as_str(), "test-case");
  assert_eq!(cmd.process_task_list_position().map(|p| p.position()), Some(1));
  assert_eq!(process.status(), ProcessStatus::Running);

  let answer = cmd.answer_with(&user_value())?;
  assert_eq!(answer.message_name(), "user-data-collected");
  assert_eq!(answer.version(), 2);
  process.perform(&engine, Some(answer.into()))?;

  assert_eq!(process.status(), ProcessStatus::Finished);
  assert!(process.is_successfully_done());
  assert!(engine.take().is_empty());
  // un segundo perform sin mensaje no hace nada
  process.perform(&engine, None)?;
  assert!(engine.take().is_empty());
  Ok(())
}

#[test]
fn message_for_another_position_is_rejected_without_state_change() -> Result<(), ProcessingError> {
  let mut process = factory().create_process_from_definition(&collect_user(true), None)?;
  let engine = RecordingEngine::default();
  process.perform(&engine, None)?;
  let sent = engine.take();
  let cmd = only_workflow(&sent);

  let wrong_position = TaskListPosition::at(process.task_list().task_list_id().clone(), 2)?;
  let answer = cmd.answer_with(&user_value())?.reconnect_to_process_task(&wrong_position);
  let before = process.task_list().clone();
  process.perform(&engine, Some(answer.into()))?;

  assert_eq!(process.task_list(), &before);
  assert_eq!(process.status(), ProcessStatus::Running);
  let sent = engine.take();
  let log = only_log(&sent);
  assert!(log.is_error());
  // el aviso vuelve a la posicion recibida, no a la tarea en curso
  assert_eq!(log.process_task_list_position(), &wrong_position);
  Ok(())
}

#[test]
fn wrong_message_fails_and_stops_when_stop_on_error() -> Result<(), ProcessingError> {
  let mut process = factory().create_process_from_definition(&collect_user(true), None)?;
  let engine = RecordingEngine::default();
  process.perform(&engine, None)?;
  let sent = engine.take();
  let position = only_workflow(&sent).process_task_list_position().cloned().unwrap();

  let address = TypedValue::from_native_value(&TypeStubs::address_prototype(),
                                              json!({"street": "a", "streetNumber": 1, "zip": "z", "city": "c"}))
    .unwrap();
  let wrong = WorkflowMessage::new_data_collected(&address, node("test-case"), node("wf"), JsonMap::new())
    .connect_to_process_task(&position)?;
  process.perform(&engine, Some(wrong.into()))?;

  assert_eq!(process.status(), ProcessStatus::Failed);
  assert_eq!(process.task_list().entries()[0].status(), TaskStatus::Failed);
  assert_eq!(process.task_list().entries()[1].status(), TaskStatus::NotStarted);
  let sent = engine.take();
  assert_eq!(only_log(&sent).msg_code(), CODE_WRONG_MESSAGE_RECEIVED);
  Ok(())
}

#[test]
fn wrong_message_advances_when_not_stop_on_error() -> Result<(), ProcessingError> {
  let mut process = factory().create_process_from_definition(&collect_user(false), None)?;
  let engine = RecordingEngine::default();
  process.perform(&engine, None)?;
  let sent = engine.take();
  let cmd = only_workflow(&sent).clone();
  let processed = cmd.answer_with(&user_value())?;
  // un data-processed no completa una tarea collect_data
  let wrong = processed.prepare_data_processing(node("wf"))?.answer_with_data_processing_completed()?;
  process.perform(&engine, Some(wrong.into()))?;

  assert_eq!(process.status(), ProcessStatus::Running);
  assert_eq!(process.task_list().cursor(), 2);
  assert_eq!(process.task_list().entries()[0].status(), TaskStatus::Failed);
  let sent = engine.take();
  assert_eq!(sent.len(), 2);
  assert!(matches!(&sent[0], ProcessingMessage::Log(l) if l.is_error()));
  assert!(matches!(&sent[1], ProcessingMessage::Workflow(m) if m.message_name() == "address-collect-data"));
  Ok(())
}

#[test]
fn process_data_without_input_is_a_no_message_failure() -> Result<(), ProcessingError> {
  let def = json!({
    "process_type": "linear_messaging",
    "tasks": [{"task_type": "process_data", "target": "erp", "allowed_types": ["User"]}],
    "config": {"stop_on_error": true}
  });
  let mut process = factory().create_process_from_definition(&def, None)?;
  let engine = RecordingEngine::default();
  process.perform(&engine, None)?;
  assert_eq!(process.status(), ProcessStatus::Failed);
  let sent = engine.take();
  assert_eq!(only_log(&sent).msg_code(), CODE_NO_MESSAGE_RECEIVED);
  Ok(())
}

#[test]
fn derived_process_converts_to_preferred_type() -> Result<(), ProcessingError> {
  let mut f = factory();
  f.register_definition("user-data-collected",
                         json!({
                           "process_type": "linear_messaging",
                           "tasks": [{"task_type": "process_data", "target": "erp",
                                      "allowed_types": ["TargetUser"], "preferred_type": "TargetUser"}]
                         }))?;
  let event = WorkflowMessage::new_data_collected(&user_value(), node("crm"), node("wf"), JsonMap::new());
  let mut process = f.derive_process_from_message(&event)?;
  let engine = RecordingEngine::default();
  process.perform(&engine, Some(event.clone().into()))?;

  let sent = engine.take();
  let cmd = only_workflow(&sent);
  assert_eq!(cmd.message_name(), "targetuser-process-data");
  assert_eq!(cmd.payload().type_class(), "TargetUser");
  assert_eq!(cmd.payload().data()["name"], "Alex");
  assert_eq!(cmd.version(), event.version());
  assert_eq!(cmd.target().as_str(), "erp");
  assert_eq!(cmd.process_task_list_position(), process.task_list().current_position());

  let done = cmd.answer_with_data_processing_completed()?;
  process.perform(&engine, Some(done.into()))?;
  assert!(process.is_successfully_done());
  Ok(())
}

#[test]
fn derive_without_definition_is_a_definition_error() {
  let event = WorkflowMessage::new_data_collected(&user_value(), node("crm"), node("wf"), JsonMap::new());
  let err = factory().derive_process_from_message(&event).unwrap_err();
  assert!(matches!(err, ProcessingError::Definition(_)));
}

#[test]
fn manipulate_payload_feeds_the_next_task() -> Result<(), ProcessingError> {
  let def = json!({
    "process_type": "linear_messaging",
    "tasks": [
      {"task_type": "collect_data", "source": "crm", "processing_type": "User"},
      {"task_type": "manipulate_payload", "manipulation": [{"op": "set", "path": "/name", "value": "Bob"}]},
      {"task_type": "process_data", "target": "erp", "allowed_types": ["User"]}
    ]
  });
  let mut process = factory().create_process_from_definition(&def, None)?;
  let engine = RecordingEngine::default();
  process.perform(&engine, None)?;
  let sent = engine.take();
  let answer = only_workflow(&sent).answer_with(&user_value())?;
  process.perform(&engine, Some(answer.into()))?;

  let sent = engine.take();
  let cmd = only_workflow(&sent);
  assert_eq!(cmd.message_name(), "user-process-data");
  assert_eq!(cmd.payload().data()["name"], "Bob");
  assert_eq!(cmd.process_task_list_position().map(|p| p.position()), Some(3));
  assert_eq!(process.task_list().entries()[1].status(), TaskStatus::Done);
  Ok(())
}

fn sub_process_parent(stop_on_error: bool) -> serde_json::Value {
  json!({
    "process_type": "linear_messaging",
    "tasks": [
      {"task_type": "collect_data", "source": "crm", "processing_type": "User"},
      {"task_type": "run_sub_process", "target_node_name": "sub",
       "process_definition": {
         "process_type": "linear_messaging",
         "tasks": [{"task_type": "process_data", "target": "erp", "allowed_types": ["User"]}]
       }}
    ],
    "config": {"stop_on_error": stop_on_error}
  })
}

fn start_parent_until_sub_process(process: &mut Process, engine: &RecordingEngine) -> Result<(), ProcessingError> {
  process.perform(engine, None)?;
  let sent = engine.take();
  let answer = only_workflow(&sent).answer_with(&user_value())?;
  process.perform(engine, Some(answer.into()))?;
  Ok(())
}

#[test]
fn run_sub_process_sends_definition_verbatim() -> Result<(), ProcessingError> {
  let def = sub_process_parent(true);
  let mut process = factory().create_process_from_definition(&def, None)?;
  let engine = RecordingEngine::default();
  start_parent_until_sub_process(&mut process, &engine)?;

  assert_eq!(process.status(), ProcessStatus::AwaitingSubProcess);
  let sent = engine.take();
  let [ProcessingMessage::StartSubProcess(cmd)] = sent.as_slice() else {
    panic!("se esperaba StartSubProcess: {:?}", sent);
  };
  assert_eq!(cmd.sub_process_definition(), &def["tasks"][1]["process_definition"]);
  assert_eq!(cmd.target().as_str(), "sub");
  assert!(cmd.stop_on_error());
  assert_eq!(cmd.parent_task_list_position().position(), 2);
  let previous = cmd.previous_message().unwrap();
  assert_eq!(previous.message_name(), "user-data-collected");

  let finished = SubProcessFinished::record(node("sub"),
                                            processing::ProcessId::generate(),
                                            true,
                                            Some(LastMessage::Workflow(previous.clone())),
                                            cmd.parent_task_list_position().clone());
  process.perform(&engine, Some(finished.into()))?;
  assert!(process.is_successfully_done());
  Ok(())
}

#[test]
fn failed_sub_process_fails_the_parent() -> Result<(), ProcessingError> {
  let mut process = factory().create_process_from_definition(&sub_process_parent(true), None)?;
  let engine = RecordingEngine::default();
  start_parent_until_sub_process(&mut process, &engine)?;
  let sent = engine.take();
  let [ProcessingMessage::StartSubProcess(cmd)] = sent.as_slice() else {
    panic!("se esperaba StartSubProcess: {:?}", sent);
  };
  let parent = cmd.parent_task_list_position().clone();
  let failure = LogMessage::log_error_msg("erp down", &parent);
  let finished = SubProcessFinished::record(node("sub"),
                                            processing::ProcessId::generate(),
                                            false,
                                            Some(LastMessage::Log(failure)),
                                            parent);
  process.perform(&engine, Some(finished.into()))?;
  assert_eq!(process.status(), ProcessStatus::Failed);
  let log = only_log(&engine.take()).clone();
  assert_eq!(log.technical_msg(), "erp down");
  Ok(())
}

#[test]
fn empty_sub_process_reports_success_to_parent() -> Result<(), ProcessingError> {
  let parent_id = processing::TaskListId::link_with(node("wf"), processing::ProcessId::generate());
  let parent = TaskListPosition::at(parent_id, 1)?;
  let def = json!({"process_type": "linear_messaging", "tasks": []});
  let mut process = factory().create_process_from_definition(&def, Some(parent.clone()))?;
  assert!(process.is_sub_process());
  let engine = RecordingEngine::default();
  process.perform(&engine, None)?;
  let sent = engine.take();
  let [ProcessingMessage::SubProcessFinished(finished)] = sent.as_slice() else {
    panic!("se esperaba SubProcessFinished: {:?}", sent);
  };
  assert!(finished.succeed());
  assert_eq!(finished.parent_task_list_position(), &parent);
  assert_eq!(finished.target().as_str(), "wf");
  Ok(())
}

#[test]
fn replaying_events_rebuilds_the_same_state() -> Result<(), ProcessingError> {
  let mut process = factory().create_process_from_definition(&collect_user(false), None)?;
  let engine = RecordingEngine::default();
  process.perform(&engine, None)?;
  let sent = engine.take();
  let answer = only_workflow(&sent).answer_with(&user_value())?;
  process.perform(&engine, Some(answer.into()))?;

  let history: Vec<_> = process.pending_events().iter().map(|p| p.event.clone()).collect();
  let replayed = Process::reconstitute(history)?;
  assert_eq!(replayed.task_list(), process.task_list());
  assert_eq!(replayed.status(), process.status());
  assert_eq!(replayed.version(), process.version());
  assert!(replayed.pending_events().is_empty());
  Ok(())
}
