//! Reading Configuration

/// Paging limits for entry listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 100,
        }
    }
}

impl ReadingConfig {
    /// `default_limit` is clamped into `1..=max_limit`
    pub fn new(default_limit: u32, max_limit: u32) -> Self {
        let max_limit = max_limit.max(1);
        Self {
            default_limit: default_limit.clamp(1, max_limit),
            max_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let config = ReadingConfig::default();
        assert_eq!(config.default_limit, 50);
        assert_eq!(config.max_limit, 100);
    }

    #[test]
    fn test_new_clamps_default() {
        assert_eq!(ReadingConfig::new(500, 100).default_limit, 100);
        assert_eq!(ReadingConfig::new(0, 0), ReadingConfig::new(1, 1));
    }
}
