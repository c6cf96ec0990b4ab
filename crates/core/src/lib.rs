#![forbid(unsafe_code)]

pub mod graph;

pub mod ids {
    /// Identifier of one roadmap document, as it appears in the URL
    /// fragment and in storage keys.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct RoadmapId(String);

    pub const DEFAULT_ROADMAP_ID: &str = "default";

    impl RoadmapId {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn into_string(self) -> String {
            self.0
        }

        pub fn default_id() -> Self {
            Self(DEFAULT_ROADMAP_ID.to_string())
        }

        pub fn is_default(&self) -> bool {
            self.0 == DEFAULT_ROADMAP_ID
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, RoadmapIdError> {
            let value = value.into();
            validate_roadmap_id(&value)?;
            Ok(Self(value))
        }
    }

    impl std::fmt::Display for RoadmapId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum RoadmapIdError {
        Empty,
        TooLong,
        InvalidChar { ch: char, index: usize },
    }

    impl RoadmapIdError {
        pub fn message(&self) -> &'static str {
            match self {
                Self::Empty => "roadmap id must not be empty",
                Self::TooLong => "roadmap id is too long",
                Self::InvalidChar { .. } => {
                    "roadmap id may contain only letters, digits, '-' and '_'"
                }
            }
        }
    }

    fn validate_roadmap_id(value: &str) -> Result<(), RoadmapIdError> {
        if value.is_empty() {
            return Err(RoadmapIdError::Empty);
        }
        if value.len() > 64 {
            return Err(RoadmapIdError::TooLong);
        }
        for (index, ch) in value.chars().enumerate() {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
                continue;
            }
            return Err(RoadmapIdError::InvalidChar { ch, index });
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn roadmap_id_validation() {
            assert_eq!(RoadmapId::try_new("").unwrap_err(), RoadmapIdError::Empty);
            assert_eq!(
                RoadmapId::try_new("a".repeat(65)).unwrap_err(),
                RoadmapIdError::TooLong
            );
            assert_eq!(
                RoadmapId::try_new("my board").unwrap_err(),
                RoadmapIdError::InvalidChar { ch: ' ', index: 2 }
            );
            assert_eq!(
                RoadmapId::try_new("a/b").unwrap_err(),
                RoadmapIdError::InvalidChar { ch: '/', index: 1 }
            );
            assert!(RoadmapId::try_new("work_2024-q3").is_ok());
            assert!(RoadmapId::default_id().is_default());
        }
    }
}
