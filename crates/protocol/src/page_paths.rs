/// Canonical form of a page path: scheme and host removed, surrounding whitespace and
/// slashes trimmed. `"/laptops/gaming/"`, `"laptops/gaming"` and
/// `"https://shop.example/laptops/gaming/"` all normalize to `"laptops/gaming"`.
pub fn normalize_page_path(raw: &str) -> String {
    let mut value = raw.trim().replace('\\', "/");
    if let Some(rest) = strip_scheme(&value) {
        value = match rest.find('/') {
            Some(idx) => rest[idx..].to_string(),
            None => String::new(),
        };
    }
    while value.starts_with("./") {
        value = value[2..].to_string();
    }
    let value = value.trim_matches('/');
    if value == "." {
        return String::new();
    }
    value.to_string()
}

/// Final `/`-delimited segment of a path, empty when the path is empty.
pub fn last_segment(raw: &str) -> String {
    normalize_page_path(raw)
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Top-level routing bucket of a page path.
///
/// Site paths hang below a single pillar segment (`/laptops/...`), so the bucket is the
/// segment directly below it. A single-segment path is its own bucket. Empty paths have
/// no bucket.
pub fn routing_bucket(raw: &str) -> Option<String> {
    let normalized = normalize_page_path(raw);
    if normalized.is_empty() {
        return None;
    }
    let mut segments = normalized.split('/').filter(|s| !s.is_empty());
    let first = segments.next()?;
    let bucket = segments.next().unwrap_or(first);
    Some(bucket.to_lowercase())
}

/// True when both paths resolve to the same routing bucket.
pub fn same_routing_bucket(a: &str, b: &str) -> bool {
    match (routing_bucket(a), routing_bucket(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn strip_scheme(value: &str) -> Option<&str> {
    value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
}
