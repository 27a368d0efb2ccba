use crate::{config::Config, error::RuntimeError, store::SledMetadataStore};
use connectors::ConnectorRegistry;
use engine::PlanRecorder;
use model::request::{PlanStep, QueryContext, RequestMeta};
use planner::Planner;
use sql_syntax::ast::Query;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// The engine's inbound surface: submit, poll, fetch results, read plans.
/// One background worker per request; the request index is the only state
/// shared between workers, single-writer per request id.
pub struct QueryService {
    config: Config,
    registry: Arc<ConnectorRegistry>,
    store: Arc<SledMetadataStore>,
    requests: RwLock<HashMap<Uuid, RequestMeta>>,
    cancel: CancellationToken,
}

impl QueryService {
    pub fn open(config: Config) -> Result<Arc<Self>, RuntimeError> {
        let store = Arc::new(SledMetadataStore::open(
            config.metadata_base_dir.join("metadata"),
        )?);
        let registry = Arc::new(ConnectorRegistry::new(
            config.connectors.clone(),
            config.kerberos(),
        ));
        purge_spill_dir(&config.result_tmp_dir)?;

        Ok(Arc::new(QueryService {
            config,
            registry,
            store,
            requests: RwLock::new(HashMap::new()),
            cancel: CancellationToken::new(),
        }))
    }

    pub fn store(&self) -> &SledMetadataStore {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Parse synchronously so syntax errors surface to the caller, assign
    /// a fresh request id, and run the pipeline in the background.
    pub async fn submit_query(
        self: &Arc<Self>,
        sql: &str,
        ctx: &QueryContext,
    ) -> Result<Uuid, RuntimeError> {
        self.submit(sql, ctx, None, None).await
    }

    /// Resolve an endpoint through its model and submit the model's query.
    pub async fn submit_endpoint(
        self: &Arc<Self>,
        name: &str,
        ctx: &QueryContext,
    ) -> Result<Uuid, RuntimeError> {
        let endpoint = self
            .store
            .get_endpoint(name)?
            .ok_or(RuntimeError::NotFound)?;
        let model = self
            .store
            .get_model(&endpoint.model)?
            .ok_or(RuntimeError::NotFound)?;
        let query = model.query.clone();
        self.submit(&query, ctx, Some(model.name), Some(endpoint.name))
            .await
    }

    async fn submit(
        self: &Arc<Self>,
        sql: &str,
        ctx: &QueryContext,
        model: Option<String>,
        endpoint: Option<String>,
    ) -> Result<Uuid, RuntimeError> {
        let query = sql_syntax::parse(sql)?;

        let id = Uuid::new_v4();
        let mut meta = RequestMeta::new(id, sql, &ctx.username);
        meta.model = model;
        meta.endpoint = endpoint;
        self.requests.write().await.insert(id, meta);
        info!(request = %id, user = %ctx.username, "request submitted");

        let service = self.clone();
        tokio::spawn(async move { service.run_request(id, query).await });
        Ok(id)
    }

    pub async fn poll(&self, id: Uuid) -> Option<RequestMeta> {
        self.requests.read().await.get(&id).cloned()
    }

    /// The spilled result bytes, available exactly while the request is
    /// completed and unexpired. `NotFound` covers unknown ids too.
    pub async fn get_result(&self, id: Uuid) -> Result<Vec<u8>, RuntimeError> {
        let meta = self.poll(id).await.ok_or(RuntimeError::NotFound)?;
        if !meta.result_available() {
            return Err(RuntimeError::NotFound);
        }
        let path = meta.spill_path.ok_or(RuntimeError::NotFound)?;
        Ok(tokio::fs::read(path).await?)
    }

    pub async fn get_query_plan(&self, id: Uuid) -> Result<Vec<PlanStep>, RuntimeError> {
        let meta = self.poll(id).await.ok_or(RuntimeError::NotFound)?;
        Ok(meta.plan_steps)
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    async fn run_request(self: Arc<Self>, id: Uuid, query: Query) {
        let deadline = Duration::from_secs(self.config.request_deadline_secs);
        let service = self.clone();
        let mut worker = tokio::spawn(async move { service.run_pipeline(id, query).await });

        let result = tokio::select! {
            outcome = tokio::time::timeout(deadline, &mut worker) => match outcome {
                Ok(Ok(result)) => result,
                Ok(Err(join_err)) => Err(RuntimeError::Worker(join_err.to_string())),
                Err(_) => {
                    worker.abort();
                    Err(RuntimeError::DeadlineExceeded)
                }
            },
            _ = self.cancel.cancelled() => {
                worker.abort();
                Err(RuntimeError::ShutdownRequested)
            }
        };

        let mut requests = self.requests.write().await;
        let Some(meta) = requests.get_mut(&id) else {
            return;
        };
        match result {
            Ok((path, steps)) => {
                meta.complete(path.clone(), steps);
                info!(request = %id, path = %path.display(), "request completed");
                if let Err(e) = self.store.put_result_set(id, &path) {
                    warn!(request = %id, error = %e, "failed to record result set");
                }
            }
            Err(e) => {
                error!(request = %id, error = %e, "request failed");
                meta.fail(e.to_string());
            }
        }
    }

    async fn run_pipeline(
        &self,
        id: Uuid,
        query: Query,
    ) -> Result<(PathBuf, Vec<PlanStep>), RuntimeError> {
        let planner = Planner::new(self.store.as_ref(), &self.registry);
        let plan = planner.plan(&query)?;

        let mut recorder = PlanRecorder::new();
        let table = engine::execute(&plan, &self.registry, &mut recorder).await?;
        let path = engine::write_spill(&self.config.result_tmp_dir, id, &table)?;
        Ok((path, recorder.into_steps()))
    }

    /// Expire completed requests whose results are older than the
    /// configured window: remove the spill file, clear the path, record
    /// the expiry message. Failed requests have nothing to reclaim.
    pub async fn expire_now(&self) {
        let window = self.config.result_set_expiry;
        let horizon = chrono::Utc::now() - chrono::Duration::minutes(window as i64);

        let mut requests = self.requests.write().await;
        for meta in requests.values_mut() {
            let eligible = meta.status == model::request::RequestStatus::Completed
                && !meta.expired
                && meta.end_time.map(|t| t <= horizon).unwrap_or(false);
            if !eligible {
                continue;
            }
            if let Some(path) = &meta.spill_path {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!(request = %meta.id, error = %e, "failed to remove spill file");
                }
            }
            if let Err(e) = self.store.remove_result_set(meta.id) {
                warn!(request = %meta.id, error = %e, "failed to clear result-set entry");
            }
            meta.expire(format!("Result set expired after {window} minutes"));
            info!(request = %meta.id, "result set expired");
        }
    }
}

/// Startup reclaim of spill files left behind by prior runs.
fn purge_spill_dir(dir: &Path) -> Result<(), RuntimeError> {
    std::fs::create_dir_all(dir)?;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "failed to purge spill file");
            }
        }
    }
    Ok(())
}

/// Periodic expiry sweep, one tick per expiry window.
pub fn spawn_sweeper(service: Arc<QueryService>) -> tokio::task::JoinHandle<()> {
    let minutes = service.config.result_set_expiry.max(1);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(minutes * 60));
        interval.tick().await; // the first tick fires immediately
        loop {
            tokio::select! {
                _ = interval.tick() => service.expire_now().await,
                _ = service.cancel.cancelled() => break,
            }
        }
    })
}
