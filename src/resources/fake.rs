//! In-memory Kasm deployment for controller tests

use kasmkit::backend::Backend;
use kasmkit::{
    CastConfig, CastConfigPayload, Error, Image, ImagePayload, KasmStatus, KasmStatusQuery,
    NO_TIME_LIMIT, Registry, RegistryPayload, Result,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use declarative::{CancelToken, Sleeper};

/// Stores objects the way the server does: dense, with zero values for
/// anything the payload left out.
#[derive(Default)]
pub struct FakeKasm {
    pub images: Mutex<Vec<Image>>,
    pub cast_configs: Mutex<Vec<CastConfig>>,
    pub registries: Mutex<Vec<Registry>>,
    pub sessions: Mutex<Vec<KasmStatus>>,
    /// Registries created but not yet listed, with the number of list
    /// calls they stay hidden for
    pending_registries: Mutex<Vec<(Registry, u32)>>,
    /// List calls a new registry stays hidden for
    pub registry_delay: u32,
    /// Endpoints that answer with an HTTP status instead of succeeding
    pub failures: Mutex<HashMap<&'static str, u16>>,
    pub calls: Mutex<Vec<&'static str>>,
    next_id: AtomicU32,
}

impl FakeKasm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry_delay(mut self, list_calls: u32) -> Self {
        self.registry_delay = list_calls;
        self
    }

    pub fn fail(&self, endpoint: &'static str, status: u16) {
        self.failures.lock().unwrap().insert(endpoint, status);
    }

    pub fn call_count(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == endpoint)
            .count()
    }

    fn enter(&self, endpoint: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(endpoint);
        match self.failures.lock().unwrap().get(endpoint) {
            Some(status) => Err(Error::Status {
                endpoint: endpoint.to_string(),
                status: *status,
                message: "injected failure".to_string(),
            }),
            None => Ok(()),
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn realize_image(id: String, p: &ImagePayload) -> Image {
        Image {
            image_id: id,
            name: p.name.clone(),
            friendly_name: p.friendly_name.clone(),
            description: p.description.clone().unwrap_or_default(),
            cores: p.cores.unwrap_or_default(),
            memory: p.memory.unwrap_or_default(),
            enabled: p.enabled.unwrap_or_default(),
            image_src: p.image_src.clone().unwrap_or_default(),
            docker_registry: p.docker_registry.clone().unwrap_or_default(),
            run_config: p.run_config.clone().unwrap_or_default(),
            exec_config: p.exec_config.clone().unwrap_or_default(),
            restrict_to_network: p.restrict_to_network.unwrap_or_default(),
            persistent_profile_path: p.persistent_profile_path.clone().unwrap_or_default(),
            session_time_limit: p.session_time_limit.unwrap_or(NO_TIME_LIMIT),
            categories: p.categories.clone().unwrap_or_default(),
            available: true,
        }
    }

    fn realize_cast_config(id: String, p: &CastConfigPayload) -> CastConfig {
        CastConfig {
            cast_config_id: id,
            casting_config_name: p.casting_config_name.clone(),
            image_id: p.image_id.clone(),
            key: p.key.clone(),
            allowed_referrers: p.allowed_referrers.clone(),
            limit_sessions: p.limit_sessions.unwrap_or_default(),
            session_remaining: p.session_remaining.unwrap_or_default(),
            limit_ips: p.limit_ips.unwrap_or_default(),
            ip_request_limit: p.ip_request_limit.unwrap_or_default(),
            ip_request_seconds: p.ip_request_seconds.unwrap_or_default(),
            error_url: p.error_url.clone().unwrap_or_default(),
            enable_sharing: p.enable_sharing.unwrap_or_default(),
            disable_control_panel: p.disable_control_panel.unwrap_or_default(),
            disable_tips: p.disable_tips.unwrap_or_default(),
            disable_fixed_res: p.disable_fixed_res.unwrap_or_default(),
            allow_anonymous: p.allow_anonymous.unwrap_or_default(),
            group_id: p.group_id.clone().unwrap_or_default(),
            require_recaptcha: p.require_recaptcha.unwrap_or_default(),
            kasm_url: p.kasm_url.clone().unwrap_or_default(),
            dynamic_kasm_url: p.dynamic_kasm_url.unwrap_or_default(),
            allow_resume: p.allow_resume.unwrap_or_default(),
            enforce_client_settings: p.enforce_client_settings.unwrap_or_default(),
            allow_kasm_audio: p.allow_kasm_audio.unwrap_or_default(),
            allow_kasm_uploads: p.allow_kasm_uploads.unwrap_or_default(),
            allow_kasm_downloads: p.allow_kasm_downloads.unwrap_or_default(),
            allow_kasm_clipboard_down: p.allow_kasm_clipboard_down.unwrap_or_default(),
            allow_kasm_clipboard_up: p.allow_kasm_clipboard_up.unwrap_or_default(),
            allow_kasm_microphone: p.allow_kasm_microphone.unwrap_or_default(),
            valid_until: p.valid_until.clone().unwrap_or_default(),
            image_friendly_name: String::new(),
        }
    }

    /// The server keeps only `major.minor` of a channel.
    fn normalize_channel(channel: &str) -> String {
        let mut parts = channel.split('.');
        match (parts.next(), parts.next()) {
            (Some(major), Some(minor)) => format!("{major}.{minor}"),
            _ => channel.to_string(),
        }
    }

    fn realize_registry(id: String, p: &RegistryPayload) -> Registry {
        Registry {
            registry_id: id,
            registry_url: p.registry_url.clone(),
            channel: Self::normalize_channel(p.channel.as_deref().unwrap_or("1.17")),
            do_auto_update: p.do_auto_update.unwrap_or_default(),
            name: "Kasm Technologies".to_string(),
            schema_version: "1.1".to_string(),
            is_verified: true,
        }
    }

    fn not_found(kind: &'static str, id: &str) -> Error {
        Error::Api {
            endpoint: format!("delete_{kind}"),
            message: format!("{kind} {id} does not exist"),
        }
    }
}

impl Backend for FakeKasm {
    fn list_images(&self) -> Result<Vec<Image>> {
        self.enter("get_images")?;
        Ok(self.images.lock().unwrap().clone())
    }

    fn create_image(&self, payload: &ImagePayload) -> Result<Image> {
        self.enter("create_image")?;
        let image = Self::realize_image(self.next_id("img"), payload);
        self.images.lock().unwrap().push(image.clone());
        Ok(image)
    }

    fn update_image(&self, image_id: &str, payload: &ImagePayload) -> Result<Image> {
        self.enter("update_image")?;
        let mut images = self.images.lock().unwrap();
        let slot = images
            .iter_mut()
            .find(|i| i.image_id == image_id)
            .ok_or_else(|| Self::not_found("image", image_id))?;
        *slot = Self::realize_image(image_id.to_string(), payload);
        Ok(slot.clone())
    }

    fn list_cast_configs(&self) -> Result<Vec<CastConfig>> {
        self.enter("get_cast_configs")?;
        Ok(self.cast_configs.lock().unwrap().clone())
    }

    fn get_cast_config(&self, cast_config_id: &str) -> Result<CastConfig> {
        self.enter("get_cast_config")?;
        self.cast_configs
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.cast_config_id == cast_config_id)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                kind: "cast_config",
                id: cast_config_id.to_string(),
            })
    }

    fn create_cast_config(&self, payload: &CastConfigPayload) -> Result<CastConfig> {
        self.enter("create_cast_config")?;
        let config = Self::realize_cast_config(self.next_id("cast"), payload);
        self.cast_configs.lock().unwrap().push(config.clone());
        Ok(config)
    }

    fn update_cast_config(
        &self,
        cast_config_id: &str,
        payload: &CastConfigPayload,
    ) -> Result<CastConfig> {
        self.enter("update_cast_config")?;
        let mut configs = self.cast_configs.lock().unwrap();
        let slot = configs
            .iter_mut()
            .find(|c| c.cast_config_id == cast_config_id)
            .ok_or_else(|| Self::not_found("cast_config", cast_config_id))?;
        *slot = Self::realize_cast_config(cast_config_id.to_string(), payload);
        Ok(slot.clone())
    }

    fn delete_cast_config(&self, cast_config_id: &str) -> Result<()> {
        self.enter("delete_cast_config")?;
        let mut configs = self.cast_configs.lock().unwrap();
        let before = configs.len();
        configs.retain(|c| c.cast_config_id != cast_config_id);
        if configs.len() == before {
            return Err(Self::not_found("cast_config", cast_config_id));
        }
        Ok(())
    }

    fn list_registries(&self) -> Result<Vec<Registry>> {
        self.enter("get_registries")?;
        let mut pending = self.pending_registries.lock().unwrap();
        let mut registries = self.registries.lock().unwrap();
        pending.retain_mut(|(registry, hidden_for)| {
            if *hidden_for == 0 {
                registries.push(registry.clone());
                false
            } else {
                *hidden_for -= 1;
                true
            }
        });
        Ok(registries.clone())
    }

    fn create_registry(&self, payload: &RegistryPayload) -> Result<()> {
        self.enter("create_registry")?;
        let registry = Self::realize_registry(self.next_id("reg"), payload);
        self.pending_registries
            .lock()
            .unwrap()
            .push((registry, self.registry_delay));
        Ok(())
    }

    fn update_registry(&self, registry_id: &str, payload: &RegistryPayload) -> Result<Registry> {
        self.enter("update_registry")?;
        let mut registries = self.registries.lock().unwrap();
        let slot = registries
            .iter_mut()
            .find(|r| r.registry_id == registry_id)
            .ok_or_else(|| Self::not_found("registry", registry_id))?;
        *slot = Self::realize_registry(registry_id.to_string(), payload);
        Ok(slot.clone())
    }

    fn delete_registry(&self, registry_id: &str) -> Result<()> {
        self.enter("delete_registry")?;
        let mut registries = self.registries.lock().unwrap();
        let before = registries.len();
        registries.retain(|r| r.registry_id != registry_id);
        if registries.len() == before {
            return Err(Self::not_found("registry", registry_id));
        }
        Ok(())
    }

    fn get_kasm_status(&self, query: &KasmStatusQuery) -> Result<KasmStatus> {
        self.enter("get_kasm_status")?;
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.kasm_id == query.kasm_id && s.user_id == query.user_id)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                kind: "kasm",
                id: query.kasm_id.clone(),
            })
    }
}

/// Records requested pauses instead of sleeping.
#[derive(Clone, Default)]
pub struct RecordedPauses(pub Arc<Mutex<Vec<Duration>>>);

impl Sleeper for RecordedPauses {
    fn sleep(&self, duration: Duration, cancel: &CancelToken) -> bool {
        self.0.lock().unwrap().push(duration);
        !cancel.is_cancelled()
    }
}
