//! Blocking HTTP implementation of [`Backend`].
//!
//! Every call is a single synchronous request with the configured timeout.
//! Callers run it off the UI thread (see [`PollTask`](crate::PollTask) and
//! the GUI's request workers).

use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder, Response, multipart};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use glitchlamp_config::{AppConfig, Preset, Settings};
use glitchlamp_core::EffectDefinition;

use crate::backend::Backend;
use crate::error::ClientError;
use crate::status::{GenerationStatus, LogEntry, Progress, WorkerInfo, parse_logs, parse_workers};

/// [`Backend`] over the appliance's REST API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    /// Creates a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base = Url::parse(base_url.trim())
            .ok()
            .filter(|url| !url.cannot_be_a_base() && matches!(url.scheme(), "http" | "https"))
            .ok_or_else(|| ClientError::InvalidUrl(base_url.to_owned()))?;
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()
            .map_err(|e| ClientError::Transport {
                url: base.to_string(),
                message: e.to_string(),
            })?;
        tracing::debug!(base = %base, "http backend ready");
        Ok(Self { client, base })
    }

    /// Creates a client from the app configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        Self::new(config.backend_base(), config.request_timeout())
    }

    /// Base URL of the backend.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// URL of `segments` below the base. Segments are percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response, ClientError> {
        let response = request.send().map_err(|e| ClientError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        tracing::debug!(url = %url, status = status.as_u16(), "backend error");
        Err(ClientError::Status {
            status: status.as_u16(),
            message: error_detail(&body),
        })
    }

    fn decode<T: DeserializeOwned>(response: Response, url: &Url) -> Result<T, ClientError> {
        response.json().map_err(|e| ClientError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        let url = self.url(segments)?;
        let response = self.send(self.client.get(url.clone()), &url)?;
        Self::decode(response, &url)
    }

    fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.url(segments)?;
        let response = self.send(self.client.post(url.clone()).json(body), &url)?;
        Self::decode(response, &url)
    }

    fn post_empty(&self, segments: &[&str]) -> Result<(), ClientError> {
        let url = self.url(segments)?;
        self.send(self.client.post(url.clone()), &url)?;
        Ok(())
    }
}

/// Extracts FastAPI-style `{"detail": "..."}` messages, else the raw body.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| match v.get("detail") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        })
        .unwrap_or_else(|| body.trim().to_owned())
}

impl Backend for HttpBackend {
    fn effects(&self) -> Result<Vec<EffectDefinition>, ClientError> {
        self.get_json(&["effects"])
    }

    fn presets(&self) -> Result<Vec<String>, ClientError> {
        self.get_json(&["presets"])
    }

    fn preset(&self, name: &str) -> Result<Preset, ClientError> {
        let value: Value = self.get_json(&["presets", name])?;
        Ok(Preset::from_value(name, &value))
    }

    fn save_preset(&self, preset: &Preset) -> Result<(), ClientError> {
        glitchlamp_config::validate_name(&preset.name)?;
        let _: Value = self.post_json(&["presets", &preset.name], &preset.nodes)?;
        tracing::info!(name = %preset.name, "preset saved to backend");
        Ok(())
    }

    fn delete_preset(&self, name: &str) -> Result<(), ClientError> {
        let url = self.url(&["presets", name])?;
        self.send(self.client.delete(url.clone()), &url)?;
        tracing::info!(name, "preset deleted on backend");
        Ok(())
    }

    fn export_preset(&self, name: &str) -> Result<String, ClientError> {
        let url = self.url(&["presets", "export", name])?;
        let response = self.send(self.client.get(url.clone()), &url)?;
        response.text().map_err(|e| ClientError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn import_preset(&self, file_name: &str, contents: &[u8]) -> Result<String, ClientError> {
        #[derive(serde::Deserialize)]
        struct Imported {
            name: String,
        }

        let url = self.url(&["presets", "import"])?;
        let part = multipart::Part::bytes(contents.to_vec())
            .file_name(file_name.to_owned())
            .mime_str("application/json")
            .map_err(|e| ClientError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        let form = multipart::Form::new().part("file", part);
        let response = self.send(self.client.post(url.clone()).multipart(form), &url)?;
        let imported: Imported = Self::decode(response, &url)?;
        tracing::info!(name = %imported.name, "preset imported");
        Ok(imported.name)
    }

    fn settings(&self) -> Result<Settings, ClientError> {
        self.get_json(&["settings"])
    }

    fn save_settings(&self, settings: &Settings) -> Result<Settings, ClientError> {
        let stored = self.post_json(&["settings"], settings)?;
        tracing::info!("settings saved");
        Ok(stored)
    }

    fn generation_status(&self) -> Result<GenerationStatus, ClientError> {
        self.get_json(&["generation", "status"])
    }

    fn pause_generation(&self) -> Result<(), ClientError> {
        self.post_empty(&["generation", "pause"])
    }

    fn resume_generation(&self) -> Result<(), ClientError> {
        self.post_empty(&["generation", "resume"])
    }

    fn progress(&self) -> Result<Progress, ClientError> {
        self.get_json(&["progress"])
    }

    fn preview_progress(&self) -> Result<Progress, ClientError> {
        self.get_json(&["preview", "progress"])
    }

    fn generate_preview(&self) -> Result<(), ClientError> {
        self.post_empty(&["preview", "generate"])
    }

    fn workers(&self) -> Result<Vec<WorkerInfo>, ClientError> {
        Ok(parse_workers(self.get_json(&["workers"])?))
    }

    fn logs(&self) -> Result<Vec<LogEntry>, ClientError> {
        Ok(parse_logs(self.get_json(&["logs"])?))
    }
}
