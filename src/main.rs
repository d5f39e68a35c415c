use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use cluster_orchestrator::bus;
use cluster_orchestrator::config::Timeouts;
use cluster_orchestrator::orchestrator::actor::{Gateway, OrchestratorActor};
use cluster_orchestrator::registry::handlers::*;
use cluster_orchestrator::registry::table::ProcessorTable;
use cluster_orchestrator::scheduler::handlers::*;
use cluster_orchestrator::scheduler::scheduler::JobScheduler;
use cluster_orchestrator::storage::actor::StorageActor;
use cluster_orchestrator::storage::handlers::*;
use cluster_orchestrator::storage::logging::MemoryLog;
use cluster_orchestrator::storage::memory::MemoryStore;
use cluster_orchestrator::supervisor::handlers::*;
use cluster_orchestrator::supervisor::registry::SupervisorRegistry;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut bind_addr: SocketAddr = "127.0.0.1:7400".parse()?;
    let mut timeouts = Timeouts::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                bind_addr = args[i + 1].parse()?;
                i += 2;
            }
            "--bus-timeout-ms" => {
                timeouts.bus_call = Duration::from_millis(args[i + 1].parse()?);
                i += 2;
            }
            "--provision-timeout-ms" => {
                timeouts.provision = Duration::from_millis(args[i + 1].parse()?);
                i += 2;
            }
            "--tick-secs" => {
                timeouts.tick = Duration::from_secs(args[i + 1].parse()?);
                i += 2;
            }
            "--help" => {
                eprintln!(
                    "Usage: {} [--bind <addr:port>] [--bus-timeout-ms N] [--provision-timeout-ms N] [--tick-secs N]",
                    args[0]
                );
                std::process::exit(0);
            }
            _ => {
                i += 1;
            }
        }
    }

    tracing::info!("Starting control plane on {}", bind_addr);

    // 1. Persistence and logging collaborators:
    let store = MemoryStore::new();
    let log = MemoryLog::new();

    let (storage_bus, storage_inbox) = bus::channel(timeouts.queue_capacity);
    tokio::spawn(StorageActor::new(store.clone()).run(storage_inbox));

    // 2. Supervisor registry:
    let registry = SupervisorRegistry::new(storage_bus.clone(), log.clone(), timeouts.clone());
    let (supervisor_bus, supervisor_inbox) = bus::channel(timeouts.queue_capacity);
    tokio::spawn(registry.clone().serve(supervisor_inbox));

    // 3. Orchestrator actor, owning the capability table:
    let table = Arc::new(ProcessorTable::new());
    let actor = OrchestratorActor::new(
        table,
        supervisor_bus.clone(),
        storage_bus.clone(),
        timeouts.clone(),
    );
    let (orchestrator_bus, orchestrator_inbox) = bus::channel(timeouts.queue_capacity);
    tokio::spawn(actor.run(orchestrator_inbox));

    // 4. Scheduler loops:
    let scheduler = JobScheduler::new(
        storage_bus.clone(),
        orchestrator_bus.clone(),
        timeouts.clone(),
    );
    scheduler.start();

    // 5. HTTP boundary:
    let gateway = Gateway::new(orchestrator_bus, timeouts.clone());

    let app = Router::new()
        .route(
            "/processor",
            post(handle_register_processor).delete(handle_deregister_processor),
        )
        .route(
            "/processor/module",
            post(handle_register_module).delete(handle_deregister_module),
        )
        .route("/module/:module/mount", post(handle_mount_module))
        .route("/module/:module/unmount", post(handle_unmount_module))
        .route(
            "/module/:module/cluster/:cluster/mount",
            post(handle_mount_cluster),
        )
        .route(
            "/module/:module/cluster/:cluster/unmount",
            post(handle_unmount_cluster),
        )
        .route("/processors", get(handle_list_processors))
        .route("/modules", get(handle_list_modules))
        .route("/module/:module/clusters", get(handle_list_clusters))
        .route(
            "/supervisor",
            post(handle_create_supervisor).put(handle_update_supervisor),
        )
        .route("/supervisor/query", post(handle_query_supervisors))
        .route("/supervisor/:id/log", post(handle_append_log))
        .route("/job", post(handle_create_job).delete(handle_delete_jobs))
        .route("/jobs", get(handle_list_jobs))
        .route("/job/query", post(handle_query_jobs))
        .route("/scheduler/queue", get(handle_queue))
        .route(
            "/config",
            post(handle_store_config)
                .put(handle_replace_config)
                .delete(handle_delete_config),
        )
        .route("/config/:module/:cluster", get(handle_get_config))
        .layer(Extension(gateway))
        .layer(Extension(scheduler))
        .layer(Extension(storage_bus))
        .layer(Extension(Arc::new(timeouts)));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Control plane listening on {}", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app).await?;

    Ok(())
}
