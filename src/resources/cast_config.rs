//! Casting configurations
//!
//! A casting configuration publishes an image at `/#/cast/<key>`. The
//! update endpoint replaces the whole object, so updates send every flag
//! and counter with its resolved value rather than only the declared ones.

use declarative::{Field, Normalized, ObjectKind};
use kasmkit::{CastConfig, CastConfigPayload};
use serde::{Deserialize, Serialize};

/// Desired and persisted state of a casting configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CastConfigSpec {
    pub casting_config_name: String,
    pub image_id: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub allowed_referrers: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub limit_sessions: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub session_remaining: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub limit_ips: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub ip_request_limit: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub ip_request_seconds: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub error_url: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub enable_sharing: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub disable_control_panel: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub disable_tips: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub disable_fixed_res: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub allow_anonymous: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub group_id: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub require_recaptcha: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub kasm_url: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub dynamic_kasm_url: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub allow_resume: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub enforce_client_settings: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub allow_kasm_audio: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub allow_kasm_uploads: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub allow_kasm_downloads: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub allow_kasm_clipboard_down: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub allow_kasm_clipboard_up: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub allow_kasm_microphone: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub valid_until: Field<String>,

    // Computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cast_config_id: Option<String>,
}

pub struct CastConfigKind;

fn flag(value: bool, prior: Option<&Field<bool>>) -> Field<bool> {
    Field::from_remote(&value, &false, prior)
}

fn count(value: i64, prior: Option<&Field<i64>>) -> Field<i64> {
    Field::from_remote(&value, &0, prior)
}

fn text(value: &str, prior: Option<&Field<String>>) -> Field<String> {
    Field::from_remote(&value.to_string(), &String::new(), prior)
}

impl ObjectKind for CastConfigKind {
    const NAME: &'static str = "cast_config";
    const COMPUTED: &'static [&'static str] = &["cast_config_id"];

    type Spec = CastConfigSpec;
    type Remote = CastConfig;
    type Payload = CastConfigPayload;

    fn create_payload(spec: &CastConfigSpec) -> CastConfigPayload {
        CastConfigPayload {
            cast_config_id: None,
            casting_config_name: spec.casting_config_name.clone(),
            image_id: spec.image_id.clone(),
            key: spec.key.clone(),
            allowed_referrers: spec.allowed_referrers.to_present_list(),
            limit_sessions: spec.limit_sessions.to_payload(),
            session_remaining: spec.session_remaining.to_payload(),
            limit_ips: spec.limit_ips.to_payload(),
            ip_request_limit: spec.ip_request_limit.to_payload(),
            ip_request_seconds: spec.ip_request_seconds.to_payload(),
            error_url: spec.error_url.to_payload(),
            enable_sharing: spec.enable_sharing.to_payload(),
            disable_control_panel: spec.disable_control_panel.to_payload(),
            disable_tips: spec.disable_tips.to_payload(),
            disable_fixed_res: spec.disable_fixed_res.to_payload(),
            allow_anonymous: spec.allow_anonymous.to_payload(),
            group_id: spec.group_id.to_payload(),
            require_recaptcha: spec.require_recaptcha.to_payload(),
            kasm_url: spec.kasm_url.to_payload(),
            dynamic_kasm_url: spec.dynamic_kasm_url.to_payload(),
            allow_resume: spec.allow_resume.to_payload(),
            enforce_client_settings: spec.enforce_client_settings.to_payload(),
            allow_kasm_audio: spec.allow_kasm_audio.to_payload(),
            allow_kasm_uploads: spec.allow_kasm_uploads.to_payload(),
            allow_kasm_downloads: spec.allow_kasm_downloads.to_payload(),
            allow_kasm_clipboard_down: spec.allow_kasm_clipboard_down.to_payload(),
            allow_kasm_clipboard_up: spec.allow_kasm_clipboard_up.to_payload(),
            allow_kasm_microphone: spec.allow_kasm_microphone.to_payload(),
            valid_until: spec.valid_until.to_payload(),
        }
    }

    fn update_payload(spec: &CastConfigSpec) -> CastConfigPayload {
        CastConfigPayload {
            limit_sessions: Some(spec.limit_sessions.value_or(false)),
            session_remaining: Some(spec.session_remaining.value_or(0)),
            limit_ips: Some(spec.limit_ips.value_or(false)),
            ip_request_limit: Some(spec.ip_request_limit.value_or(0)),
            ip_request_seconds: Some(spec.ip_request_seconds.value_or(0)),
            enable_sharing: Some(spec.enable_sharing.value_or(false)),
            disable_control_panel: Some(spec.disable_control_panel.value_or(false)),
            disable_tips: Some(spec.disable_tips.value_or(false)),
            disable_fixed_res: Some(spec.disable_fixed_res.value_or(false)),
            allow_anonymous: Some(spec.allow_anonymous.value_or(false)),
            require_recaptcha: Some(spec.require_recaptcha.value_or(false)),
            dynamic_kasm_url: Some(spec.dynamic_kasm_url.value_or(false)),
            allow_resume: Some(spec.allow_resume.value_or(false)),
            enforce_client_settings: Some(spec.enforce_client_settings.value_or(false)),
            allow_kasm_audio: Some(spec.allow_kasm_audio.value_or(false)),
            allow_kasm_uploads: Some(spec.allow_kasm_uploads.value_or(false)),
            allow_kasm_downloads: Some(spec.allow_kasm_downloads.value_or(false)),
            allow_kasm_clipboard_down: Some(spec.allow_kasm_clipboard_down.value_or(false)),
            allow_kasm_clipboard_up: Some(spec.allow_kasm_clipboard_up.value_or(false)),
            allow_kasm_microphone: Some(spec.allow_kasm_microphone.value_or(false)),
            ..Self::create_payload(spec)
        }
    }

    fn from_remote(remote: &CastConfig, prior: Option<&CastConfigSpec>) -> Normalized<CastConfigSpec> {
        let state = CastConfigSpec {
            casting_config_name: remote.casting_config_name.clone(),
            image_id: remote.image_id.clone(),
            key: remote.key.clone(),
            allowed_referrers: Field::list_from_remote(
                &remote.allowed_referrers,
                prior.map(|p| &p.allowed_referrers),
            ),
            limit_sessions: flag(remote.limit_sessions, prior.map(|p| &p.limit_sessions)),
            session_remaining: count(remote.session_remaining, prior.map(|p| &p.session_remaining)),
            limit_ips: flag(remote.limit_ips, prior.map(|p| &p.limit_ips)),
            ip_request_limit: count(remote.ip_request_limit, prior.map(|p| &p.ip_request_limit)),
            ip_request_seconds: count(
                remote.ip_request_seconds,
                prior.map(|p| &p.ip_request_seconds),
            ),
            error_url: text(&remote.error_url, prior.map(|p| &p.error_url)),
            enable_sharing: flag(remote.enable_sharing, prior.map(|p| &p.enable_sharing)),
            disable_control_panel: flag(
                remote.disable_control_panel,
                prior.map(|p| &p.disable_control_panel),
            ),
            disable_tips: flag(remote.disable_tips, prior.map(|p| &p.disable_tips)),
            disable_fixed_res: flag(remote.disable_fixed_res, prior.map(|p| &p.disable_fixed_res)),
            allow_anonymous: flag(remote.allow_anonymous, prior.map(|p| &p.allow_anonymous)),
            group_id: text(&remote.group_id, prior.map(|p| &p.group_id)),
            require_recaptcha: flag(remote.require_recaptcha, prior.map(|p| &p.require_recaptcha)),
            kasm_url: text(&remote.kasm_url, prior.map(|p| &p.kasm_url)),
            dynamic_kasm_url: flag(remote.dynamic_kasm_url, prior.map(|p| &p.dynamic_kasm_url)),
            allow_resume: flag(remote.allow_resume, prior.map(|p| &p.allow_resume)),
            enforce_client_settings: flag(
                remote.enforce_client_settings,
                prior.map(|p| &p.enforce_client_settings),
            ),
            allow_kasm_audio: flag(remote.allow_kasm_audio, prior.map(|p| &p.allow_kasm_audio)),
            allow_kasm_uploads: flag(
                remote.allow_kasm_uploads,
                prior.map(|p| &p.allow_kasm_uploads),
            ),
            allow_kasm_downloads: flag(
                remote.allow_kasm_downloads,
                prior.map(|p| &p.allow_kasm_downloads),
            ),
            allow_kasm_clipboard_down: flag(
                remote.allow_kasm_clipboard_down,
                prior.map(|p| &p.allow_kasm_clipboard_down),
            ),
            allow_kasm_clipboard_up: flag(
                remote.allow_kasm_clipboard_up,
                prior.map(|p| &p.allow_kasm_clipboard_up),
            ),
            allow_kasm_microphone: flag(
                remote.allow_kasm_microphone,
                prior.map(|p| &p.allow_kasm_microphone),
            ),
            valid_until: text(&remote.valid_until, prior.map(|p| &p.valid_until)),
            cast_config_id: Some(remote.cast_config_id.clone()),
        };
        Normalized::new(state)
    }

    fn remote_id(remote: &CastConfig) -> String {
        remote.cast_config_id.clone()
    }

    fn natural_key(spec: &CastConfigSpec) -> String {
        spec.casting_config_name.clone()
    }

    fn matches_natural_key(spec: &CastConfigSpec, remote: &CastConfig) -> bool {
        spec.casting_config_name == remote.casting_config_name
    }
}
