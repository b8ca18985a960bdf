//! Command implementations
//!
//! Every command that talks to the server goes through [`connect`]; the
//! ones that only read local state use [`load_state`].

pub mod apply;
pub mod destroy;
pub mod import;
pub mod kinds;
pub mod lookup;
pub mod plan;
pub mod refresh;
pub mod show;

use anyhow::Result;
use declarative::Registry;
use kasmkit::Client;

use crate::Context;
use crate::config::ProviderConfig;
use crate::paths;
use crate::resources::build_registry;
use crate::state::StateFile;

/// Load provider settings and register every kind against one client.
pub fn connect(ctx: &Context) -> Result<Registry> {
    let config = ProviderConfig::load()?.merge(&ctx.overrides);
    let client_config = config.client_config()?;
    log::info!("Using Kasm deployment at {}", client_config.url);

    let client = Client::new(client_config);
    Ok(build_registry(&client, config.lookup_policy()))
}

/// State file given with `--state`, or the default one.
pub fn load_state(ctx: &Context) -> Result<StateFile> {
    let path = match &ctx.state_path {
        Some(path) => path.clone(),
        None => paths::state_file()?,
    };
    StateFile::load(&path)
}
