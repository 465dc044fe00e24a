//! Asset manifest for the offline shell.
//!
//! The manifest is the fixed, deployment-time list of resources that must be
//! available without network access. It is immutable at runtime; the only
//! invalidation mechanism is bumping [`CACHE_VERSION`].

/// Store tag for the current cache generation.
///
/// Bump on deployment to force repopulation; activation sweeps every other
/// tag from the store.
pub const CACHE_VERSION: &str = "taskshell-v3";

/// Root document served as the offline fallback for page navigations.
pub const SHELL_DOCUMENT: &str = "/index.html";

/// Shell assets pinned into the cache at install time.
const SHELL_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/style.css",
    "/app.js",
    "/manifest.json",
    "/icon-192.png",
    "/icon-512.png",
];

/// Ordered set of normalized relative paths pinned for offline use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    paths: Vec<String>,
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self { paths: SHELL_ASSETS.iter().map(|p| (*p).to_string()).collect() }
    }
}

impl AssetManifest {
    /// Build a manifest from explicit paths. Paths are kept in insertion
    /// order and compared verbatim; callers normalize before lookup.
    pub fn new(paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { paths: paths.into_iter().map(Into::into).collect() }
    }

    /// Whether the given normalized path is pinned.
    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    /// Pinned paths in manifest order.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Number of pinned assets.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
