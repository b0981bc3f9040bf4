use serde::Deserialize;

use crate::store::TimetableStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Default)]
pub struct AppState {
    pub store: TimetableStore,
}
