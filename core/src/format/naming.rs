//! Shader-safe attribute names for user-named layers.

use std::hash::Hasher;

use rustc_hash::FxHasher;

/// Maximum length of a safe attribute name.
pub const MAX_SAFE_ATTR_NAME: usize = 12;

/// Derive a short identifier-safe name from an arbitrary layer name.
///
/// Layer names are user-controlled and may contain any characters, so they
/// are hashed into a fixed alphabet instead of being used directly.
pub fn safe_attr_name(layer_name: &str) -> String {
    const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    let mut hasher = FxHasher::default();
    hasher.write(layer_name.as_bytes());
    let mut hash = hasher.finish();

    let mut name = String::with_capacity(MAX_SAFE_ATTR_NAME);
    // Leading character must not be a digit.
    name.push(ALPHABET[(hash % 52) as usize] as char);
    hash /= 52;
    while hash != 0 && name.len() < MAX_SAFE_ATTR_NAME {
        name.push(ALPHABET[(hash % 62) as usize] as char);
        hash /= 62;
    }
    name
}

/// Names a layer attribute is reachable by.
///
/// Every layer gets `{base}{safe}` and `a{safe}`. The render layer also
/// answers to `{base}` and the active layer to `a{base}`.
pub fn layer_attr_aliases(
    base_name: &str,
    layer_name: &str,
    is_active: bool,
    is_render: bool,
) -> Vec<String> {
    let safe = safe_attr_name(layer_name);
    let mut names = vec![format!("{base_name}{safe}"), format!("a{safe}")];
    if is_render {
        names.push(base_name.to_string());
    }
    if is_active {
        names.push(format!("a{base_name}"));
    }
    names
}
