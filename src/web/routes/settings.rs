use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::base_system::config::write_with_comments;
use crate::web::error::ApiError;
use crate::web::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SettingsView {
    pub(crate) download_path: String,
    pub(crate) headless_mode: bool,
    pub(crate) auto_remove: bool,
    pub(crate) show_notification: bool,
}

pub(crate) async fn get_settings(State(state): State<AppState>) -> Json<SettingsView> {
    let cfg = state.config.lock().unwrap().clone();
    Json(SettingsView {
        download_path: cfg.download_path,
        headless_mode: cfg.headless_mode,
        auto_remove: cfg.auto_remove,
        show_notification: cfg.show_notification,
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct SettingsPatch {
    pub(crate) download_path: Option<String>,
    pub(crate) headless_mode: Option<bool>,
    pub(crate) auto_remove: Option<bool>,
    pub(crate) show_notification: Option<bool>,
}

pub(crate) async fn update_settings(
    State(state): State<AppState>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<SettingsView>, ApiError> {
    let (old_cfg, new_cfg) = {
        let mut g = state.config.lock().unwrap();
        let old = g.clone();

        if let Some(v) = patch.download_path {
            let v = v.trim().to_string();
            if v.is_empty() {
                return Err(ApiError::bad_request("download_path cannot be empty"));
            }
            g.download_path = v;
        }
        if let Some(v) = patch.headless_mode {
            g.headless_mode = v;
        }
        if let Some(v) = patch.auto_remove {
            g.auto_remove = v;
        }
        if let Some(v) = patch.show_notification {
            g.show_notification = v;
        }

        (old, g.clone())
    };

    if let Err(e) = write_with_comments(&new_cfg, &state.config_path) {
        // revert memory changes if persistence fails
        let mut g = state.config.lock().unwrap();
        *g = old_cfg;
        tracing::error!(target: "web_config", err = %e, "failed to persist config.yml");
        return Err(ApiError::internal(e));
    }

    Ok(Json(SettingsView {
        download_path: new_cfg.download_path,
        headless_mode: new_cfg.headless_mode,
        auto_remove: new_cfg.auto_remove,
        show_notification: new_cfg.show_notification,
    }))
}
