const KNOWN_SCHEMES: [&str; 6] = ["http://", "https://", "file://", "data:", "about:", "chrome://"];

/// Normalize a user-supplied start URL by adding a missing scheme
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();

    if KNOWN_SCHEMES.iter().any(|scheme| trimmed.starts_with(scheme)) {
        return trimmed.to_string();
    }

    // local dev servers rarely speak TLS
    if trimmed.starts_with("localhost") || trimmed.starts_with("127.0.0.1") {
        return format!("http://{}", trimmed);
    }

    format!("https://{}", trimmed)
}
