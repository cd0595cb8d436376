use axum::Router;

/// A service module that contributes HTTP routes.
///
/// Each business module (auth, nameplate, ...) implements this trait
/// to register its API endpoints. The binary entry point collects all
/// modules and merges their routes under `/api`.
pub trait Module: Send + Sync {
    /// Module name, used for logging.
    fn name(&self) -> &str;

    /// Return the module's routes, to be merged under `/api` by the binary.
    fn routes(&self) -> Router;
}
