//! Settings and preset bridge between a [`Backend`](crate::Backend) and the chain model.
//!
//! Serialization always reads the model. Widgets write through to the
//! model as the user edits, so the chain here is the whole truth.

use glitchlamp_config::{Preset, Settings, validate_chain};
use glitchlamp_core::{ChainModel, EffectRegistry};

use crate::backend::Backend;
use crate::error::ClientError;
use crate::retry::{RetryPolicy, load_settings_with_retry};

/// Registry built from the backend catalog.
pub fn load_registry(backend: &dyn Backend) -> Result<EffectRegistry, ClientError> {
    let catalog = backend.effects()?;
    tracing::info!(effects = catalog.len(), "effect catalog loaded");
    Ok(EffectRegistry::from_catalog(catalog))
}

/// Loads settings (with retry) and the chain they describe.
pub fn load_chain(
    backend: &dyn Backend,
    registry: &EffectRegistry,
    policy: RetryPolicy,
) -> Result<(Settings, ChainModel), ClientError> {
    let settings = load_settings_with_retry(backend, policy)?;
    let chain = settings.chain(registry);
    Ok((settings, chain))
}

/// Stores `chain` into `settings` and posts them.
///
/// On success `settings` is replaced with what the backend stored.
pub fn save_chain(
    backend: &dyn Backend,
    settings: &mut Settings,
    chain: &ChainModel,
) -> Result<(), ClientError> {
    settings.store_chain(chain)?;
    *settings = backend.save_settings(settings)?;
    tracing::info!(nodes = chain.len(), "chain saved to settings");
    Ok(())
}

/// Saves `chain` as the preset `name`.
pub fn save_preset(backend: &dyn Backend, name: &str, chain: &ChainModel) -> Result<(), ClientError> {
    backend.save_preset(&Preset::from_chain(name.trim(), chain))
}

/// Loads the preset `name` as a fresh chain, with a source prepended when
/// it has none. Validation problems are logged, not fatal.
pub fn load_preset(
    backend: &dyn Backend,
    registry: &EffectRegistry,
    name: &str,
) -> Result<ChainModel, ClientError> {
    let preset = backend.preset(name)?;
    for problem in validate_chain(&preset.nodes, registry) {
        tracing::warn!(preset = name, "{problem}");
    }
    let mut chain = preset.to_chain();
    chain.ensure_source(registry);
    tracing::info!(preset = name, nodes = chain.len(), "preset loaded");
    Ok(chain)
}
