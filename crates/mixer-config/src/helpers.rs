use std::path::PathBuf;

// Helper defaults
pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_public_path() -> PathBuf {
    PathBuf::from("public")
}

pub(crate) fn default_manifest_name() -> String {
    "mix-manifest.json".to_string()
}

pub(crate) fn default_hash_length() -> usize {
    20
}

pub(crate) fn default_vue_styles_file() -> String {
    "/css/vue-styles.css".to_string()
}
