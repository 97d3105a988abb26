//! Build an initialized plant from configuration.

use std::sync::Arc;

use crate::config::PlantConfig;
use crate::core::{Plant, PlantError, WorkExecutor};
use crate::util::clock::{Clock, SystemClock};

/// Validate `cfg`, create a plant on the system clock and initialize it.
///
/// # Errors
///
/// `PlantError::InvalidConfig` for an invalid configuration, otherwise any
/// error of [`Plant::init`].
pub fn build_plant<R, E>(cfg: &PlantConfig, executor: E) -> Result<Plant<R, E>, PlantError>
where
    R: Clone + Send + 'static,
    E: WorkExecutor<R>,
{
    build_plant_with_clock(cfg, executor, Arc::new(SystemClock))
}

/// Like [`build_plant`] with an explicit clock.
///
/// # Errors
///
/// Same as [`build_plant`].
pub fn build_plant_with_clock<R, E>(
    cfg: &PlantConfig,
    executor: E,
    clock: Arc<dyn Clock>,
) -> Result<Plant<R, E>, PlantError>
where
    R: Clone + Send + 'static,
    E: WorkExecutor<R>,
{
    cfg.validate()
        .map_err(|e| PlantError::InvalidConfig(format!("config invalid: {e}")))?;

    let plant = Plant::with_clock(executor, clock);
    plant.init(cfg)?;
    Ok(plant)
}
