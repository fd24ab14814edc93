/// Get environment variable with APP_ prefix, falling back to unprefixed version
///
/// This helper checks for `APP_{key}` first, then falls back to `{key}` so the
/// service picks up the conventional names used by hosting platforms
/// (`PORT`, `YOCO_SECRET_KEY`, `FIREBASE_PROJECT_ID`, ...).
///
/// # Examples
///
/// ```ignore
/// use yoco_subscriptions::utils::get_env_with_prefix;
///
/// // Checks APP_PORT first, then PORT
/// let port = get_env_with_prefix("PORT");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("APP_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Split a comma separated environment value into trimmed, non-empty items
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
