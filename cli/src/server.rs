#[cfg(feature = "server")]
pub mod http {
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::{IntoResponse, Json},
        routing::{get, post},
        Router,
    };
    use purelogic::rule::ExpressionSource;
    use purelogic::{
        Context, Engine, Evaluator, FunctionRegistry, LogicError, RuleExecutor, RuleReport,
        RuleSet, RuleSource, ResourceLimits, TraceEvent, UnitTestReport, Value,
    };
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use tower_http::cors::CorsLayer;
    use tower_http::trace::TraceLayer;
    use tracing::{error, info};

    /// Frozen engine state shared by every request
    pub struct Worker {
        registry: Arc<FunctionRegistry>,
        rules: Arc<RuleSet>,
        limits: ResourceLimits,
    }

    impl Worker {
        pub fn new(engine: Engine) -> Self {
            Self {
                registry: engine.evaluator().shared_registry(),
                limits: engine.limits().clone(),
                rules: Arc::new(engine.rules().clone()),
            }
        }

        fn evaluator(&self) -> Evaluator {
            Evaluator::with_registry(Arc::clone(&self.registry)).with_limits(self.limits.clone())
        }
    }

    type SharedWorker = Arc<Worker>;

    #[derive(Debug, Deserialize)]
    struct EvaluateRequest {
        expression: ExpressionSource,
        #[serde(default)]
        bindings: BTreeMap<String, Value>,
        #[serde(default)]
        trace: bool,
    }

    #[derive(Debug, Serialize)]
    struct EvaluateResponse {
        value: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace: Option<Vec<TraceEvent>>,
    }

    #[derive(Debug, Default, Deserialize)]
    struct RunRequest {
        #[serde(default)]
        bindings: BTreeMap<String, Value>,
    }

    #[derive(Debug, Serialize)]
    struct FunctionJson {
        name: String,
        params: Vec<String>,
        description: String,
    }

    #[derive(Debug, Serialize)]
    struct ErrorBody {
        kind: String,
        message: String,
    }

    #[derive(Debug, Serialize)]
    struct ErrorResponse {
        error: ErrorBody,
    }

    type ApiError = (StatusCode, Json<ErrorResponse>);

    fn api_error(status: StatusCode, kind: &str, message: impl Into<String>) -> ApiError {
        (
            status,
            Json(ErrorResponse {
                error: ErrorBody {
                    kind: kind.to_string(),
                    message: message.into(),
                },
            }),
        )
    }

    fn logic_error(error: &LogicError) -> ApiError {
        let status = match error {
            LogicError::Load(_) => StatusCode::NOT_FOUND,
            LogicError::ResourceLimitExceeded { .. } | LogicError::NonConvergentFixpoint { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::BAD_REQUEST,
        };
        api_error(status, error.kind(), error.to_string())
    }

    pub fn router(worker: Worker) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/functions", get(list_functions))
            .route("/evaluate", post(evaluate))
            .route("/rules/:id/run", post(run_rule))
            .route("/rules/:id/test", post(test_rule))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(Arc::new(worker))
    }

    pub async fn start_server(engine: Engine, host: &str, port: u16) -> anyhow::Result<()> {
        let app = router(Worker::new(engine));

        let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
        info!("PureLogic server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    async fn health_check() -> impl IntoResponse {
        Json(serde_json::json!({
            "status": "ok",
            "service": "purelogic",
            "version": env!("CARGO_PKG_VERSION")
        }))
    }

    async fn list_functions(State(worker): State<SharedWorker>) -> impl IntoResponse {
        let functions: Vec<FunctionJson> = worker
            .registry
            .descriptors()
            .map(|descriptor| FunctionJson {
                name: descriptor.name.clone(),
                params: descriptor
                    .signature
                    .params
                    .iter()
                    .map(|param| param.to_string())
                    .collect(),
                description: descriptor.description.clone(),
            })
            .collect();
        Json(functions)
    }

    /// Run `job` on the blocking pool; evaluation is CPU-bound and unbounded in time
    async fn blocking<T, F>(job: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    {
        tokio::task::spawn_blocking(job).await.map_err(|e| {
            error!("Evaluation task failed: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", "evaluation task failed")
        })?
    }

    async fn evaluate(
        State(worker): State<SharedWorker>,
        Json(payload): Json<EvaluateRequest>,
    ) -> Result<Json<EvaluateResponse>, ApiError> {
        let response = blocking(move || {
            let expression = payload
                .expression
                .into_expression("<request>", &worker.limits)
                .map_err(|e| logic_error(&e))?;

            let mut evaluator = worker.evaluator();
            evaluator.enable_tracing(payload.trace);
            let mut context = Context::with_facts(payload.bindings);
            let value = evaluator.evaluate(&expression, &mut context).map_err(|e| {
                error!("Evaluation failed: {}", e);
                logic_error(&e)
            })?;

            let trace = payload.trace.then(|| evaluator.take_trace());
            Ok(EvaluateResponse { value, trace })
        })
        .await?;

        Ok(Json(response))
    }

    async fn run_rule(
        State(worker): State<SharedWorker>,
        Path(id): Path<String>,
        payload: Option<Json<RunRequest>>,
    ) -> Result<Json<RuleReport>, ApiError> {
        let bindings = payload.map(|Json(request)| request.bindings).unwrap_or_default();
        let report = blocking(move || {
            worker.rules.load_rule(&id).map_err(|e| logic_error(&e))?;
            let mut evaluator = worker.evaluator();
            let mut executor = RuleExecutor::new(&mut evaluator, worker.rules.as_ref());
            Ok(executor.run_rule(&id, &Context::with_facts(bindings)))
        })
        .await?;

        info!("Ran rule '{}'", report.rule_id);
        Ok(Json(report))
    }

    async fn test_rule(
        State(worker): State<SharedWorker>,
        Path(id): Path<String>,
    ) -> Result<Json<UnitTestReport>, ApiError> {
        let report = blocking(move || {
            let rule = worker.rules.load_rule(&id).map_err(|e| logic_error(&e))?;
            let mut evaluator = worker.evaluator();
            let mut executor = RuleExecutor::new(&mut evaluator, worker.rules.as_ref());
            Ok(executor.execute_rule_unit_tests(&rule))
        })
        .await?;

        info!(
            "Tested rule '{}': {} passed, {} failed",
            report.rule_id,
            report.passed_count(),
            report.failed_count()
        );
        Ok(Json(report))
    }

}

#[cfg(not(feature = "server"))]
pub mod http {
    pub async fn start_server(
        _engine: purelogic::Engine,
        _host: &str,
        _port: u16,
    ) -> anyhow::Result<()> {
        anyhow::bail!("Server feature not enabled. Recompile with --features server")
    }
}
