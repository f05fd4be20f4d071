use actix_web::{web, App, HttpServer, HttpResponse, Result, middleware};
use serde::Serialize;
use std::sync::Mutex;

use crate::config::SchedulerConfig;
use crate::display::{describe_error, describe_failure, ordered_rows};
use crate::parser::parse_roster;
use crate::schedule::{solve, Problem, SearchStats, SolveReport};
use crate::error::SolveError;

// Last successful run, kept in memory only
pub struct AppState {
    pub last: Mutex<Option<SolvedRoster>>,
    pub config: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SolvedRoster {
    rows: Vec<StudentRow>,
    stats: SearchStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentRow {
    student: String,
    events: Vec<String>,
}

fn solved_roster(report: &SolveReport, problem: &Problem) -> Option<SolvedRoster> {
    let assignment = report.assignment()?;
    let rows = ordered_rows(assignment, problem)
        .into_iter()
        .map(|(student, events)| StudentRow { student, events })
        .collect();
    Some(SolvedRoster { rows, stats: report.stats })
}

// Solve endpoint: body is the roster CSV
async fn solve_roster(
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let problem = match parse_roster(body.as_ref()) {
        Ok(problem) => problem,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": format!("Failed to process CSV: {}", e)
            })))
        }
    };

    let caps = state.config.caps;
    let budget = state.config.server_budget();
    let (problem, result) = web::block(move || {
        let result: std::result::Result<SolveReport, SolveError> = solve(&problem, &caps, &budget);
        (problem, result)
    })
    .await?;

    match result {
        Ok(report) => match solved_roster(&report, &problem) {
            Some(solved) => {
                *state.last.lock().unwrap_or_else(|e| e.into_inner()) = Some(solved.clone());
                Ok(HttpResponse::Ok().json(serde_json::json!({
                    "success": true,
                    "assignment": solved,
                    "stats": report.stats,
                })))
            }
            None => Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": false,
                "error": describe_failure(&report.outcome),
                "outcome": report.outcome,
                "stats": report.stats,
            }))),
        },
        Err(e) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": describe_error(&e),
        }))),
    }
}

async fn get_assignment(state: web::Data<AppState>) -> Result<HttpResponse> {
    let last = state.last.lock().unwrap_or_else(|e| e.into_inner());
    match last.as_ref() {
        Some(solved) => Ok(HttpResponse::Ok().json(solved)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "No assignment available"}))),
    }
}

async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({"status": "ok"})))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/solve", web::post().to(solve_roster))
        .route("/api/assignment", web::get().to(get_assignment))
        .route("/api/health", web::get().to(health));
}

pub async fn start_server(port: u16, config: SchedulerConfig) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState {
        last: Mutex::new(None),
        config,
    });

    tracing::info!(event = "server_start", port);
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(web::PayloadConfig::new(4 * 1024 * 1024))
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
