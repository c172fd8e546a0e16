// Archivo: main.rs
// Propósito: runtime de demostración de un nodo de procesamiento. Arranca
// un proceso desde una definición JSON, simula los nodos remotos que
// aparecen en ella y bombea los mensajes hasta que el proceso termina.
use processing::{CommandBus, EventBus, MessageHandler, NodeConfig, NodeName, Process, ProcessFactory,
                 ProcessRepository, ProcessingError, ProcessingMessage, RegistryWorkflowEngine, WorkflowEngine,
                 WorkflowProcessor};
use processing_types::{NativeType, Prototype, TypeRegistry, TypeStubs, TypedValue};
use serde_json::{json, Value as JsonValue};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
enum RuntimeError {
    #[error(transparent)]
    Processing(#[from] ProcessingError),
    #[error("No se pudo leer la definicion: {0}")]
    Io(#[from] std::io::Error),
    #[error("Definicion JSON invalida: {0}")]
    Json(#[from] serde_json::Error),
    #[error("El proceso no termino en {0} segundos")]
    Timeout(u64),
}

const PUMP_TIMEOUT_SECS: u64 = 10;

#[tokio::main]
async fn main() -> Result<(), RuntimeError> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
                             .init();

    let config = NodeConfig::from_env()?;
    let definition = match &config.definition_path {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => demo_definition(&config),
    };
    let process = run_node(&config, &definition).await?;

    println!("\nProceso {} -> {:?}", process.process_id(), process.status());
    println!("POS | TAREA                | ESTADO");
    println!("--------------------------------------------");
    for entry in process.task_list().entries() {
        println!("{:>3} | {:<20} | {:?}", entry.position().position(), entry.task().kind_name(), entry.status());
    }
    Ok(())
}

/// Recolecta un usuario, lo ajusta y delega su procesamiento a un
/// sub-proceso que lo convierte a `TargetUser`.
fn demo_definition(config: &NodeConfig) -> JsonValue {
    json!({
        "process_type": "linear_messaging",
        "tasks": [
            {"task_type": "collect_data", "source": "crm", "processing_type": "User"},
            {"task_type": "manipulate_payload",
             "manipulation": [{"op": "set", "path": "/name", "value": "Demo User"}]},
            {"task_type": "run_sub_process",
             "target_node_name": config.sub_processor.as_str(),
             "sync_log_messages": true,
             "process_definition": {
                 "process_type": "linear_messaging",
                 "tasks": [{"task_type": "process_data", "target": "erp",
                            "allowed_types": ["TargetUser"], "preferred_type": "TargetUser"}]
             }}
        ],
        "config": {"stop_on_error": true}
    })
}

async fn run_node(config: &NodeConfig, definition: &JsonValue) -> Result<Process, RuntimeError> {
    let types = Arc::new(TypeStubs::sample_registry().map_err(ProcessingError::from)?);
    let engine = Arc::new(RegistryWorkflowEngine::new());
    let (local_tx, mut local_rx) = mpsc::unbounded_channel::<ProcessingMessage>();
    let (remote_tx, mut remote_rx) = mpsc::unbounded_channel::<ProcessingMessage>();

    // nodos atendidos por este runtime
    let mut local_nodes = vec![config.node_name.clone()];
    if config.sub_processor != config.node_name {
        local_nodes.push(config.sub_processor.clone());
    }
    let commands = Arc::new(CommandBus::new("local-commands"));
    commands.route_all(forward_to(local_tx.clone()))?;
    let events = Arc::new(EventBus::new("local-events"));
    events.route_all(forward_to(local_tx));
    engine.register_command_bus(commands, local_nodes.clone())?;
    engine.register_event_bus(events, local_nodes.clone())?;

    let remotes = remote_nodes(definition, &local_nodes);
    if !remotes.is_empty() {
        tracing::info!("nodos remotos simulados: {:?}", remotes);
        let simulator = Arc::new(CommandBus::new("simulated-remotes"));
        simulator.route_all(simulated_remote(types.clone(), remote_tx))?;
        engine.register_command_bus(simulator, remotes)?;
    }

    let repository = ProcessRepository::new(Arc::new(event_store::InMemoryEventStore::new()));
    let factory = ProcessFactory::new(config.node_name.clone(), types);
    let processor = WorkflowProcessor::new(engine.clone(), factory, repository);
    let process_id = processor.start_process(definition)?;

    let pump = async {
        loop {
            let process = processor.process(&process_id)?;
            if process.is_finished() {
                return Ok::<Process, RuntimeError>(process);
            }
            tokio::select! {
                Some(message) = local_rx.recv() => {
                    let name = message.message_name();
                    if let Err(e) = processor.receive(message) {
                        tracing::error!("error procesando {}: {}", name, e);
                    }
                }
                Some(answer) = remote_rx.recv() => {
                    if let Err(e) = engine.dispatch(answer.into()) {
                        tracing::error!("error despachando respuesta remota: {}", e);
                    }
                }
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(PUMP_TIMEOUT_SECS), pump).await
                                                                       .map_err(|_| RuntimeError::Timeout(PUMP_TIMEOUT_SECS))?
}

fn forward_to(tx: UnboundedSender<ProcessingMessage>) -> Arc<dyn MessageHandler> {
    Arc::new(move |message: &ProcessingMessage| -> processing::Result<()> {
        tx.send(message.clone())
          .map_err(|e| ProcessingError::Routing(format!("canal local cerrado: {}", e)))
    })
}

/// Responde `collect-data` con datos de ejemplo del tipo pedido y confirma
/// cualquier `process-data`.
fn simulated_remote(types: Arc<TypeRegistry>, tx: UnboundedSender<ProcessingMessage>) -> Arc<dyn MessageHandler> {
    Arc::new(move |message: &ProcessingMessage| -> processing::Result<()> {
        let ProcessingMessage::Workflow(cmd) = message else {
            tracing::warn!("el simulador ignora {}", message.message_name());
            return Ok(());
        };
        let answer = match cmd.message_type() {
            processing::MessageType::CollectData => {
                let prototype = types.prototype_of(cmd.payload().type_class())?;
                let value = TypedValue::from_native_value(prototype, sample_for(prototype))?;
                cmd.answer_with(&value)?
            }
            _ => cmd.answer_with_data_processing_completed()?,
        };
        tracing::info!("{} responde {} con {}", cmd.target(), cmd.message_name(), answer.message_name());
        tx.send(answer.into())
          .map_err(|e| ProcessingError::Routing(format!("canal remoto cerrado: {}", e)))
    })
}

/// Valor nativo de ejemplo que cumple el prototipo.
fn sample_for(prototype: &Prototype) -> JsonValue {
    match prototype.native_type() {
        NativeType::String | NativeType::Unknown => json!(format!("sample-{}", prototype.of_type().to_lowercase())),
        NativeType::Integer => json!(1),
        NativeType::Float => json!(1.5),
        NativeType::Boolean => json!(true),
        NativeType::Dictionary => {
            JsonValue::Object(prototype.properties().iter().map(|(k, p)| (k.clone(), sample_for(p))).collect())
        }
        NativeType::Collection => json!(prototype.item().map(|i| vec![sample_for(i)]).unwrap_or_default()),
    }
}

/// Nodos `source`/`target` de la definición (sub-procesos incluidos) que no
/// atiende este runtime.
fn remote_nodes(definition: &JsonValue, local: &[NodeName]) -> Vec<NodeName> {
    fn walk(definition: &JsonValue, out: &mut BTreeSet<String>) {
        let Some(tasks) = definition.get("tasks").and_then(|t| t.as_array()) else {
            return;
        };
        for task in tasks {
            for key in ["source", "target"] {
                if let Some(name) = task.get(key).and_then(|v| v.as_str()) {
                    out.insert(name.to_string());
                }
            }
            if let Some(sub) = task.get("process_definition") {
                walk(sub, out);
            }
        }
    }
    let mut names = BTreeSet::new();
    walk(definition, &mut names);
    names.into_iter()
         .filter_map(|n| NodeName::new(&n).ok())
         .filter(|n| !local.contains(n))
         .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_definition_runs_to_completion() {
        let config = NodeConfig::default();
        let process = run_node(&config, &demo_definition(&config)).await.unwrap();
        assert!(process.is_successfully_done());
        assert_eq!(process.task_list().len(), 3);
    }

    #[test]
    fn separate_sub_processor_node_is_served_locally() {
        let config = NodeConfig { node_name: NodeName::new("wf").unwrap(),
                                  sub_processor: NodeName::new("sub").unwrap(),
                                  definition_path: None };
        let process = tokio_test::block_on(run_node(&config, &demo_definition(&config))).unwrap();
        assert!(process.is_successfully_done());
    }

    #[test]
    fn sample_values_conform_to_their_prototype() {
        let registry = TypeStubs::sample_registry().unwrap();
        for kind in ["User", "TargetUser", "Address", "Integer", "Boolean"] {
            let prototype = registry.prototype_of(kind).unwrap();
            assert!(TypedValue::from_native_value(prototype, sample_for(prototype)).is_ok(), "{}", kind);
        }
    }

    #[test]
    fn remote_nodes_skip_local_ones() {
        let config = NodeConfig::default();
        let remotes = remote_nodes(&demo_definition(&config), &[config.node_name.clone()]);
        let names: Vec<_> = remotes.iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["crm", "erp"]);
    }
}
