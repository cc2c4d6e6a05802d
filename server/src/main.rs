use std::fs::File;
use std::io::{Read, Write};
use std::sync::Mutex;

use axum::{
    extract::Path,
    http::{HeaderValue, Method},
    response::Html,
    routing::get,
    Json, Router,
};
use lazy_static::lazy_static;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use janus::scramble::scramble_to_str;
use janus::{Config, Cube, Metric, Naso};

const TABLE_FILE: &str = "depthTable-FTM-enares.janus";

lazy_static! {
    // one cube per process; the depth table is far too large to share any
    // other way
    static ref SOLVER: Mutex<Cube> = Mutex::new(
        Cube::new(
            Config {
                metric: Metric::FaceTurn,
                naso: Naso::Aequivalens,
            },
            |line| eprintln!("{}", line),
            |buffer: &mut [u8]| {
                match File::open(TABLE_FILE) {
                    Ok(mut file) => file.read_exact(buffer).is_ok(),
                    Err(error) => {
                        eprintln!("{}: {}", TABLE_FILE, error);
                        false
                    }
                }
            },
            |bytes: &[u8]| {
                match File::create(TABLE_FILE) {
                    Ok(mut file) => file.write_all(bytes).is_ok(),
                    Err(error) => {
                        eprintln!("{}: {}", TABLE_FILE, error);
                        false
                    }
                }
            },
        )
        .expect("depth table allocation failed")
    );
}

#[derive(Serialize)]
struct SolveResponse {
    scramble: String,
    solutions: Vec<String>,
    move_count: usize,
    solve_time_ms: u128,
}

#[derive(Serialize)]
struct SolveError {
    error: String,
}

#[tokio::main]
async fn main() {
    let cors = CorsLayer::new()
        .allow_origin("http://127.0.0.1:8080".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET]);

    let app = Router::new()
        .route("/", get(index))
        .route("/solve/:scramble", get(solve))
        .layer(cors);
    let app = app.fallback(index);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:32126")
        .await
        .unwrap();
    println!("listening on http://{}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}

async fn index() -> Html<&'static str> {
    Html(
        "<p>Solve a scramble: http://localhost:32126/solve/&lt;scramble&gt;</p>\
         <p>Example: <a href=\"http://localhost:32126/solve/R U R' U R U2 R'\">\
         http://localhost:32126/solve/R U R' U R U2 R'</a></p>\
         <p>The first request builds or loads the depth table, which can take a while.</p>",
    )
}

async fn solve(Path(scramble): Path<String>) -> Result<Json<SolveResponse>, Json<SolveError>> {
    let result = tokio::task::spawn_blocking(move || {
        let mut cube = SOLVER.lock().unwrap();
        let result = cube.solve_scramble(&scramble)?;
        Ok::<_, janus::Error>((scramble, result))
    })
    .await
    .unwrap();

    match result {
        Ok((scramble, result)) => {
            let move_count = result.solutions.first().map_or(0, |s| s.len());
            let solutions = result
                .solutions
                .iter()
                .map(|s| scramble_to_str(s).unwrap())
                .collect();
            Ok(Json(SolveResponse {
                scramble,
                solutions,
                move_count,
                solve_time_ms: result.solve_time.as_millis(),
            }))
        }
        Err(error) => Err(Json(SolveError {
            error: error.to_string(),
        })),
    }
}
