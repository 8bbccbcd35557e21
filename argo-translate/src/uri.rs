//! Display form of stored link URIs.
//!
//! Stored URIs use host schemes (`internal:/about`, `route:<nolink>`) that
//! translators should not have to know. Export shows them the way an editor
//! would type them; import converts the edited string back.

const INTERNAL: &str = "internal:";
const ROUTE: &str = "route:";

/// Route placeholders an editor can type literally.
const ROUTE_PLACEHOLDERS: [&str; 3] = ["<nolink>", "<none>", "<button>"];

/// Stored URI → string shown to translators.
pub fn to_display(uri: &str) -> String {
    if let Some(path) = uri.strip_prefix(INTERNAL) {
        return match path {
            "/" => "<front>".to_string(),
            _ => path.to_string(),
        };
    }
    if let Some(route) = uri.strip_prefix(ROUTE) {
        if ROUTE_PLACEHOLDERS.contains(&route) {
            return route.to_string();
        }
    }
    uri.to_string()
}

/// String entered by a translator → stored URI.
pub fn from_display(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed == "<front>" {
        return format!("{INTERNAL}/");
    }
    if ROUTE_PLACEHOLDERS.contains(&trimmed) {
        return format!("{ROUTE}{trimmed}");
    }
    if trimmed.starts_with(['/', '?', '#']) {
        return format!("{INTERNAL}{trimmed}");
    }
    trimmed.to_string()
}
