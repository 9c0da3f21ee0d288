use std::fmt;

const MAX_MASK_LEN: usize = 8;

/// Renders a secret as one `*` per character, capped at eight.
pub fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return "(none)".to_string();
    }
    "*".repeat(secret.chars().count().min(MAX_MASK_LEN))
}

/// A string that never prints its value.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&mask(&self.0))
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", mask(&self.0))
    }
}
