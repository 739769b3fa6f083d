use super::path_has_prefix;

/// Which request paths the gate guards.
///
/// Everything under the API root is protected unless it sits under one of
/// the public prefixes; paths outside the API root are never touched.
#[derive(Debug, Clone)]
pub struct ProtectedScope {
    api_root: String,
    public_prefixes: Vec<String>,
}

impl ProtectedScope {
    pub fn new(api_root: impl Into<String>, public_prefixes: Vec<String>) -> Self {
        Self {
            api_root: api_root.into(),
            public_prefixes,
        }
    }

    pub fn covers(&self, path: &str) -> bool {
        path_has_prefix(path, &self.api_root)
            && !self
                .public_prefixes
                .iter()
                .any(|prefix| path_has_prefix(path, prefix))
    }

    pub fn public_prefixes(&self) -> &[String] {
        &self.public_prefixes
    }
}
