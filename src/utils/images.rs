/// Turns a stored picture path into something a client can fetch.
///
/// Absolute URLs are returned verbatim, relative paths are prefixed with
/// `base_url`. Absolute URLs on one of `legacy_hosts` have their `/uploads/...`
/// tail re-rooted on `base_url`.
pub fn resolve_image_url(base_url: &str, path: Option<&str>, legacy_hosts: &[String]) -> Option<String> {
    let path = path.map(str::trim).filter(|p| !p.is_empty())?;
    let base = base_url.trim_end_matches('/');

    if path.starts_with("http://") || path.starts_with("https://") {
        let on_legacy_host = legacy_hosts
            .iter()
            .any(|host| !host.is_empty() && path.contains(host.as_str()));
        if on_legacy_host {
            if let Some(idx) = path.find("/uploads") {
                return Some(format!("{}{}", base, &path[idx..]));
            }
        }
        return Some(path.to_string());
    }

    if path.starts_with('/') {
        Some(format!("{}{}", base, path))
    } else {
        Some(format!("{}/{}", base, path))
    }
}
