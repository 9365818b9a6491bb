//! Avatar assignment for new accounts.

use rand::{Rng, SeedableRng, rngs::StdRng};
use std::sync::Mutex;

use super::errors::{AuthError, AuthResult};

/// Built-in avatar images, assigned at random on registration
pub const DEFAULT_AVATAR_URLS: [&str; 5] = [
    "https://i.ibb.co/NmL9Bmy/avatar2.png",
    "https://i.ibb.co/TMfXBhc/avatar3.png",
    "https://i.ibb.co/LRJ59rq/avatar4.png",
    "https://i.ibb.co/mFBRqJ8/avatar5.png",
    "https://i.ibb.co/9cc84R6/avatar6.png",
];

/// Source of avatar indices
pub trait AvatarPicker: Send + Sync {
    /// Pick an index in `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

/// Uniform picker backed by the thread-local RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPicker;

impl AvatarPicker for RandomPicker {
    fn pick(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Uniform picker with a fixed seed, for reproducible selection
pub struct SeededPicker {
    rng: Mutex<StdRng>,
}

impl SeededPicker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl AvatarPicker for SeededPicker {
    fn pick(&self, len: usize) -> usize {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.random_range(0..len)
    }
}

/// Ordered, non-empty list of avatar URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarCatalog {
    urls: Vec<String>,
}

impl AvatarCatalog {
    /// Create a catalog
    ///
    /// # Errors
    ///
    /// * `AuthError::Config` - `urls` is empty
    pub fn new(urls: Vec<String>) -> AuthResult<Self> {
        if urls.is_empty() {
            return Err(AuthError::Config(
                "avatar catalog must contain at least one URL".to_string(),
            ));
        }
        Ok(Self { urls })
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// All entries in order
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Select one entry using `picker`
    pub fn choose(&self, picker: &dyn AvatarPicker) -> &str {
        let idx = picker.pick(self.urls.len()).min(self.urls.len() - 1);
        &self.urls[idx]
    }
}

impl Default for AvatarCatalog {
    fn default() -> Self {
        Self {
            urls: DEFAULT_AVATAR_URLS.iter().map(|url| url.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(matches!(
            AvatarCatalog::new(Vec::new()),
            Err(AuthError::Config(_))
        ));
    }

    #[test]
    fn test_default_catalog_has_five_entries() {
        let catalog = AvatarCatalog::default();
        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog.urls()[0], DEFAULT_AVATAR_URLS[0]);
    }

    #[test]
    fn test_seeded_picker_is_reproducible() {
        let catalog = AvatarCatalog::default();
        let first = SeededPicker::new(7);
        let second = SeededPicker::new(7);

        for _ in 0..20 {
            assert_eq!(catalog.choose(&first), catalog.choose(&second));
        }
    }

    #[test]
    fn test_selection_is_uniform() {
        let catalog = AvatarCatalog::default();
        let picker = SeededPicker::new(42);
        let mut counts: HashMap<&str, usize> = HashMap::new();

        for _ in 0..1000 {
            *counts.entry(catalog.choose(&picker)).or_default() += 1;
        }

        assert_eq!(counts.len(), 5, "Every avatar should be selected");
        for (url, count) in counts {
            // Expected 200 each; 5 sigma is about 63
            assert!(
                (130..=270).contains(&count),
                "{} selected {} times out of 1000",
                url,
                count
            );
        }
    }

    #[test]
    fn test_random_picker_stays_in_range() {
        let catalog = AvatarCatalog::new(vec!["only".to_string()]).unwrap();
        for _ in 0..50 {
            assert_eq!(catalog.choose(&RandomPicker), "only");
        }
    }
}
