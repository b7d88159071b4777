use crate::dto::HealthRes;

/// Simple health service shared by the REST API and tooling.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Check health without creating an instance.
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "HarmoniFace AI service is alive".into(),
        }
    }
}
