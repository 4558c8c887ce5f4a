use std::env;
use std::sync::OnceLock;

static LTIR_REUSE_NODES: OnceLock<bool> = OnceLock::new();
static LTIR_CACHE_CAPACITY: OnceLock<Option<usize>> = OnceLock::new();

fn parse_bool(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    matches!(normalized.as_str(), "1" | "true" | "yes" | "on")
}

/// `LTIR_REUSE_NODES`, defaulting to enabled when unset or blank.
pub(crate) fn reuse_nodes_enabled() -> bool {
    *LTIR_REUSE_NODES.get_or_init(|| match env::var("LTIR_REUSE_NODES") {
        Ok(value) if !value.trim().is_empty() => parse_bool(&value),
        _ => true,
    })
}

/// `LTIR_CACHE_CAPACITY`; unparsable or zero values are ignored.
pub(crate) fn cache_capacity() -> Option<usize> {
    *LTIR_CACHE_CAPACITY.get_or_init(|| {
        env::var("LTIR_CACHE_CAPACITY")
            .ok()
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|capacity| *capacity > 0)
    })
}
