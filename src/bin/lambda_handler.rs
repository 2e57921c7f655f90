//! AWS Lambda handler for XIRR requests
//!
//! Accepts `{"cashflows": [{"date": ..., "amount": ...}], "guess": 0.1}` and
//! returns the annualized rate with a summary of the flows. Failures come back
//! as HTTP 400 with the failure kind; no fallback rate is ever substituted.
//!
//! Supports Lambda Function URLs for direct HTTP access.

use aws_lambda_events::event::lambda_function_urls::{
    LambdaFunctionUrlRequest, LambdaFunctionUrlResponse,
};
use aws_lambda_events::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_TYPE,
};
use aws_lambda_events::http::{HeaderMap, HeaderValue};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use portfolio_xirr::{CashFlow, CashflowSet, CashflowSummary, SolverConfig, XirrSolver};
use serde::{Deserialize, Serialize};

/// Input payload
#[derive(Debug, Deserialize)]
pub struct XirrRequest {
    pub cashflows: Vec<CashFlow>,

    /// Overrides the configured initial guess
    #[serde(default)]
    pub guess: Option<f64>,
}

/// Successful output
#[derive(Debug, Serialize)]
pub struct XirrResponse {
    pub xirr: f64,
    pub xirr_pct: f64,
    pub iterations: u32,
    pub summary: CashflowSummary,
    pub execution_time_ms: u64,
}

/// Failure output
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip)]
    pub status: i64,
    pub error: String,
    pub kind: &'static str,
}

impl ErrorResponse {
    fn bad_request(error: String, kind: &'static str) -> Self {
        Self { status: 400, error, kind }
    }
}

/// Parse and solve one request body
fn evaluate(body: &str, base: &SolverConfig) -> Result<XirrResponse, ErrorResponse> {
    let start = std::time::Instant::now();

    let request: XirrRequest = serde_json::from_str(body)
        .map_err(|e| ErrorResponse::bad_request(format!("Invalid JSON: {}", e), "invalid_request"))?;

    let config = match request.guess {
        Some(guess) => base.clone().with_guess(guess),
        None => base.clone(),
    };
    let solver = XirrSolver::new(config)
        .map_err(|e| ErrorResponse::bad_request(e.to_string(), e.kind()))?;

    let set = CashflowSet::new(request.cashflows)
        .map_err(|e| ErrorResponse::bad_request(format!("XIRR error: {}", e), e.kind()))?;
    let result = solver
        .solve_set(&set)
        .map_err(|e| ErrorResponse::bad_request(format!("XIRR error: {}", e), e.kind()))?;

    Ok(XirrResponse {
        xirr: result.rate,
        xirr_pct: result.rate * 100.0,
        iterations: result.iterations,
        summary: set.summary(),
        execution_time_ms: start.elapsed().as_millis() as u64,
    })
}

fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("POST, OPTIONS"));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Content-Type"));
    headers
}

fn json_response(status: i64, body: String) -> LambdaFunctionUrlResponse {
    let mut headers = cors_headers();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    LambdaFunctionUrlResponse {
        status_code: status,
        headers,
        body: Some(body),
        is_base64_encoded: false,
        cookies: Vec::new(),
    }
}

/// Lambda handler function
async fn handler(
    event: LambdaEvent<LambdaFunctionUrlRequest>,
    config: &SolverConfig,
) -> Result<LambdaFunctionUrlResponse, Error> {
    let request = event.payload;

    // Handle CORS preflight
    if request.request_context.http.method.as_deref() == Some("OPTIONS") {
        return Ok(LambdaFunctionUrlResponse {
            status_code: 200,
            headers: cors_headers(),
            body: None,
            is_base64_encoded: false,
            cookies: Vec::new(),
        });
    }

    if request.is_base64_encoded {
        let error = ErrorResponse::bad_request(
            "Expected a JSON text body".to_string(),
            "invalid_request",
        );
        return Ok(json_response(error.status, serde_json::to_string(&error)?));
    }

    let body = request.body.as_deref().unwrap_or("{}");
    let response = match evaluate(body, config) {
        Ok(ok) => json_response(200, serde_json::to_string(&ok)?),
        Err(err) => {
            log::info!("rejected xirr request: {} ({})", err.error, err.kind);
            json_response(err.status, serde_json::to_string(&err)?)
        }
    };

    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let config = SolverConfig::from_env();
    config.validate()?;

    run(service_fn(move |event| {
        let config = config.clone();
        async move { handler(event, &config).await }
    }))
    .await
}
