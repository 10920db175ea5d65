//! Type-safe cache key builders

use std::fmt;

pub const VERSION: &str = "v1";

pub mod payment {
    use super::*;

    pub const NAMESPACE: &str = "payment";

    #[derive(Debug, Clone)]
    pub struct RecordKey {
        pub lifecycle_id: String,
    }

    impl RecordKey {
        pub fn new(lifecycle_id: impl Into<String>) -> Self {
            Self {
                lifecycle_id: lifecycle_id.into(),
            }
        }
    }

    impl fmt::Display for RecordKey {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}:{}:record:{}", VERSION, NAMESPACE, self.lifecycle_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_key_format() {
        let key = payment::RecordKey::new("L1");
        assert_eq!(key.to_string(), "v1:payment:record:L1");
    }
}
