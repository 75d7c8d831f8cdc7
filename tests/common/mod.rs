// Serviço de bodegas falso (axum) para os testes de integração.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// Como o servidor responde às próximas requisições.
#[derive(Debug, Clone)]
pub enum Mode {
    /// Lista como array puro
    Bare,
    /// Lista dentro de `{ "error": false, "body": [...] }`
    Wrapped,
    /// 200 com envelope de erro
    Envelope(String),
    /// Status não-2xx com corpo texto
    Status(u16, String),
}

#[derive(Debug)]
pub struct FakeBodegas {
    pub warehouses: Mutex<Vec<Value>>,
    pub mode: Mutex<Mode>,
    pub auth_headers: Mutex<Vec<Option<String>>>,
    pub write_bodies: Mutex<Vec<Value>>,
}

impl FakeBodegas {
    pub fn set_mode(&self, mode: Mode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn last_auth(&self) -> Option<String> {
        self.auth_headers.lock().unwrap().last().cloned().flatten()
    }

    pub fn last_write(&self) -> Option<Value> {
        self.write_bodies.lock().unwrap().last().cloned()
    }

    fn record_auth(&self, headers: &HeaderMap) {
        let value = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.auth_headers.lock().unwrap().push(value);
    }

    // Resposta de erro configurada, se houver
    fn failure(&self) -> Option<Response> {
        match self.mode.lock().unwrap().clone() {
            Mode::Envelope(message) => {
                Some(Json(json!({ "error": true, "body": message })).into_response())
            }
            Mode::Status(code, body) => Some(
                (StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR), body)
                    .into_response(),
            ),
            Mode::Bare | Mode::Wrapped => None,
        }
    }
}

pub struct TestServer {
    pub base_url: String,
    pub state: Arc<FakeBodegas>,
}

pub fn warehouse_json(id: i64, nombre: &str, side: f64) -> Value {
    json!({
        "id": id,
        "nombre": nombre,
        "direccion": "Calle 1",
        "ciudad": "Bogotá",
        "ancho": side,
        "alto": side,
        "largo": side,
        "is_active": 1
    })
}

pub async fn spawn_fake_bodegas(initial: Vec<Value>) -> TestServer {
    let state = Arc::new(FakeBodegas {
        warehouses: Mutex::new(initial),
        mode: Mutex::new(Mode::Bare),
        auth_headers: Mutex::new(Vec::new()),
        write_bodies: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route(
            "/api/bodegas",
            get(list_warehouses).post(create_warehouse).put(update_warehouse),
        )
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        state,
    }
}

/// Uma URL onde ninguém escuta.
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn list_warehouses(State(state): State<Arc<FakeBodegas>>, headers: HeaderMap) -> Response {
    state.record_auth(&headers);
    if let Some(failure) = state.failure() {
        return failure;
    }
    let list = Value::Array(state.warehouses.lock().unwrap().clone());
    match state.mode.lock().unwrap().clone() {
        Mode::Wrapped => Json(json!({ "error": false, "body": list })).into_response(),
        _ => Json(list).into_response(),
    }
}

async fn create_warehouse(
    State(state): State<Arc<FakeBodegas>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record_auth(&headers);
    state.write_bodies.lock().unwrap().push(body.clone());
    if let Some(failure) = state.failure() {
        return failure;
    }

    let mut warehouses = state.warehouses.lock().unwrap();
    let id = warehouses.len() as i64 + 1;
    let mut created = body;
    created["id"] = json!(id);
    warehouses.push(created);
    (StatusCode::CREATED, Json(json!({ "error": false, "body": "Bodega creada" }))).into_response()
}

async fn update_warehouse(
    State(state): State<Arc<FakeBodegas>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record_auth(&headers);
    state.write_bodies.lock().unwrap().push(body.clone());
    if let Some(failure) = state.failure() {
        return failure;
    }

    let mut warehouses = state.warehouses.lock().unwrap();
    match warehouses.iter_mut().find(|w| w["id"] == body["id"]) {
        Some(existing) => {
            *existing = body;
            Json(json!({ "error": false, "body": "Bodega actualizada" })).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": true, "body": "Bodega no encontrada" })),
        )
            .into_response(),
    }
}
