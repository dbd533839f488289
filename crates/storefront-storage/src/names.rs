//! Storage name generation
//!
//! Stored files never keep the client's filename. Each one gets 16 random bytes,
//! hex-encoded, followed by the original extension when it is on the allow-list.

use std::path::Path;

use rand::RngCore;

/// Number of random bytes in a generated name (128 bits).
pub const NAME_ENTROPY_BYTES: usize = 16;

/// Produces storage names for uploaded files.
pub trait NameGenerator: Send + Sync {
    /// Generate a fresh name for a file originally called `original_name`.
    fn generate(&self, original_name: &str) -> String;
}

/// Name generator backed by the thread-local CSPRNG.
#[derive(Debug, Clone)]
pub struct RandomNameGenerator {
    allowed_extensions: Vec<String>,
}

impl RandomNameGenerator {
    /// `allowed_extensions` are dot-prefixed (".png"); matching is case-insensitive.
    pub fn new<I, S>(allowed_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|ext| ext.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Lower-cased, dot-prefixed extension of `original_name` if it is allowed.
    pub fn safe_extension(&self, original_name: &str) -> Option<String> {
        // Clients may send full paths from either platform.
        let base = original_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(original_name);

        let ext = Path::new(base).extension()?.to_str()?;
        let ext = format!(".{}", ext.to_lowercase());

        self.allowed_extensions
            .iter()
            .any(|allowed| *allowed == ext)
            .then_some(ext)
    }
}

impl NameGenerator for RandomNameGenerator {
    fn generate(&self, original_name: &str) -> String {
        let mut name = random_token();
        if let Some(ext) = self.safe_extension(original_name) {
            name.push_str(&ext);
        }
        name
    }
}

/// 32 lowercase hex characters drawn from the OS-seeded thread RNG.
pub fn random_token() -> String {
    let mut bytes = [0u8; NAME_ENTROPY_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
