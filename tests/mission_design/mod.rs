use moonshot::cosmic::planets::earth_moon;
use moonshot::cosmic::{BodySet, GRAVITATIONAL_CONSTANT};
use moonshot::md::EvaluatorConfig;
use moonshot::propagators::IntegratorKind;
use moonshot::time::Unit;
use std::sync::Arc;

mod evaluation;
mod genetic;
mod hill_climb;

/// The Earth and the Moon only, cheap enough to evaluate many candidates.
pub(crate) fn cislunar() -> Arc<BodySet> {
    Arc::new(earth_moon(GRAVITATIONAL_CONSTANT).unwrap())
}

/// One day of fixed step RK4.
pub(crate) fn quick_config() -> EvaluatorConfig {
    EvaluatorConfig::builder()
        .duration(1 * Unit::Day)
        .step(60.0 * Unit::Second)
        .integrator(IntegratorKind::Rk4)
        .build()
}
