use std::io::Write;
use std::net::SocketAddr;

use chrono::Local;
use env_logger::Builder;
use log::{info, LevelFilter};
use tokio::net::TcpListener;

use sudoku_ocr_backend::server::{self, AppConfig};
use sudoku_ocr_backend::solver::DEFAULT_STEP_BUDGET;

#[tokio::main]
async fn main() {
    setup_logger();
    info!("Sudoku OCR backend starting...");

    let config = AppConfig {
        step_budget: env_u64("SUDOKU_STEP_BUDGET", DEFAULT_STEP_BUDGET),
    };

    let addr = std::env::var("SUDOKU_BACKEND_ADDR")
        .ok()
        .and_then(|addr| addr.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));

    let app = server::app(config);

    info!("Server running at http://{}", addr);

    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

// Timestamped log lines; level comes from RUST_LOG, info by default.
fn setup_logger() {
    let mut builder = Builder::new();

    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        .parse_default_env()
        .init();
}
