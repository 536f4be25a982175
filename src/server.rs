use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::{self, TraceLayer};
use tracing::Level as TracingLevel;
use uuid::Uuid;

use log::{debug, info, warn};

use crate::board::{Board, BoardError};
use crate::solver::{self, SolveError};

/// Shared handler context.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub step_budget: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            step_budget: solver::DEFAULT_STEP_BUDGET,
        }
    }
}

/// Builds the application router.
pub fn app(config: AppConfig) -> Router {
    Router::new()
        .route("/", get(|| async { "Sudoku OCR backend running!" }))
        .route("/solve", post(solve_sudoku))
        .route("/verify", post(verify_sudoku))
        .layer(middleware::map_response(log_response))
        .layer(middleware::from_fn(log_request_response))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(TracingLevel::INFO))
                .on_request(trace::DefaultOnRequest::new().level(TracingLevel::INFO))
                .on_response(trace::DefaultOnResponse::new().level(TracingLevel::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(config)
}

// One log line pair per request, tagged with a correlation id.
async fn log_request_response(req: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let path = req.uri().path().to_owned();
    let method = req.method().clone();
    let start = Instant::now();

    info!(">> [{}] Request started: {} {}", request_id, method, path);

    let response = next.run(req).await;

    let status = response.status();
    let duration = start.elapsed();

    info!(
        "<< [{}] Request completed: {} {} - Status: {} - Duration: {:.2?}",
        request_id, method, path, status, duration
    );

    response
}

async fn log_response(response: Response) -> Response {
    debug!("Sending response: Status={}", response.status());
    response
}

// Recognizer output: one symbol string per cell, row by row.
#[derive(Debug, Deserialize)]
struct SolveRequest {
    sudoku_numbers: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct SolveResponse {
    sudoku_numbers: Board,
    solved_sudoku: Board,
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    initial_board: Board,
    solution: Board,
}

#[derive(Debug, Serialize)]
struct VerifyResponse {
    valid: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
enum ApiError {
    Grid(BoardError),
    Solve(SolveError),
}

impl From<BoardError> for ApiError {
    fn from(err: BoardError) -> Self {
        Self::Grid(err)
    }
}

impl From<SolveError> for ApiError {
    fn from(err: SolveError) -> Self {
        Self::Solve(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Grid(_) => StatusCode::BAD_REQUEST,
            ApiError::Solve(SolveError::BudgetExhausted(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Solve(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };

        let message = match self {
            ApiError::Grid(err) => err.to_string(),
            ApiError::Solve(err) => err.to_string(),
        };
        warn!("Request failed: {}", message);

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

// Takes the recognized symbol grid and returns it alongside the completed
// solution.
#[axum::debug_handler]
async fn solve_sudoku(
    State(config): State<AppConfig>,
    Json(payload): Json<SolveRequest>,
) -> Result<Json<SolveResponse>, ApiError> {
    info!("solve_sudoku called");
    debug!("Received symbols: {:?}", payload.sudoku_numbers);

    let board = Board::from_symbols(&payload.sudoku_numbers)?;
    debug!("Recognized board:\n{}", board);

    let solved = solver::solve_with_budget(&board, config.step_budget)?;
    info!("Board solved");

    Ok(Json(SolveResponse {
        sudoku_numbers: board,
        solved_sudoku: solved,
    }))
}

// Checks a candidate solution against the board it claims to solve.
#[axum::debug_handler]
async fn verify_sudoku(Json(payload): Json<VerifyRequest>) -> Json<VerifyResponse> {
    info!("verify_sudoku called");
    debug!("Received initial board: {:?}", payload.initial_board);
    debug!("Received solution: {:?}", payload.solution);

    let valid = solver::verify_solution(&payload.initial_board, &payload.solution);
    info!("Is solution valid: {}", valid);

    Json(VerifyResponse { valid })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::verify_solution;

    fn empty_symbols() -> Vec<Vec<String>> {
        vec![vec!["0".to_string(); 9]; 9]
    }

    #[tokio::test]
    async fn solve_handler_returns_grid_and_solution() {
        let request = SolveRequest {
            sudoku_numbers: empty_symbols(),
        };

        let Json(response) = solve_sudoku(State(AppConfig::default()), Json(request))
            .await
            .unwrap();

        assert_eq!(response.sudoku_numbers, Board::empty());
        assert!(verify_solution(&response.sudoku_numbers, &response.solved_sudoku));
    }

    #[tokio::test]
    async fn solve_handler_reports_conflicting_givens() {
        let mut symbols = empty_symbols();
        symbols[0][1] = "5".to_string();
        symbols[0][6] = "5".to_string();

        let err = solve_sudoku(
            State(AppConfig::default()),
            Json(SolveRequest {
                sudoku_numbers: symbols,
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Solve(SolveError::InconsistentInput)));
    }

    #[tokio::test]
    async fn solve_handler_rejects_malformed_grids() {
        let symbols = vec![vec!["0".to_string(); 9]; 4];

        let err = solve_sudoku(
            State(AppConfig::default()),
            Json(SolveRequest {
                sudoku_numbers: symbols,
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Grid(BoardError::RowCount(4))));
    }

    #[tokio::test]
    async fn verify_handler_accepts_and_rejects() {
        let solved = solver::solve(&Board::empty()).unwrap();

        let Json(response) = verify_sudoku(Json(VerifyRequest {
            initial_board: Board::empty(),
            solution: solved,
        }))
        .await;
        assert!(response.valid);

        let mut truncated = solved;
        truncated.clear(0, 0);
        let Json(response) = verify_sudoku(Json(VerifyRequest {
            initial_board: Board::empty(),
            solution: truncated,
        }))
        .await;
        assert!(!response.valid);
    }

    #[test]
    fn errors_map_to_transport_statuses() {
        let status = |err: ApiError| err.into_response().status();

        assert_eq!(
            status(ApiError::Grid(BoardError::RowCount(3))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(ApiError::Solve(SolveError::InconsistentInput)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(ApiError::Solve(SolveError::Unsolvable)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(ApiError::Solve(SolveError::BudgetExhausted(1))),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn routes_respond_over_http() {
        use tower::ServiceExt;

        let response = app(AppConfig::default())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = serde_json::json!({ "sudoku_numbers": empty_symbols() });
        let response = app(AppConfig::default())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/solve")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
