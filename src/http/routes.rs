use crate::app::AppContext;
use axum::Router;

/// Trait for composable route modules
///
/// Each module registers its own routes; the `App` merges them and applies
/// the shared [`AppContext`] state.
///
/// # Example
///
/// ```ignore
/// struct StatusModule;
///
/// impl RouteModule for StatusModule {
///     fn routes(&self) -> Router<AppContext> {
///         Router::new().route("/status/{id}", get(get_status))
///     }
/// }
/// ```
pub trait RouteModule {
    /// Returns a router with all routes for this module
    ///
    /// Handlers should use `State<AppContext>` to access the application
    /// context.
    fn routes(&self) -> Router<AppContext>;

    /// Optional: specify a path prefix for all routes in this module
    fn prefix(&self) -> Option<&str> {
        None
    }
}
