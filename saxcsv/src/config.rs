// SPDX-License-Identifier: Apache-2.0

//! Parser configuration.
//!
//! A [`CsvConfig`] is fixed for the lifetime of a parser. It can only be obtained
//! from [`CsvConfig::default()`] or a successful [`CsvConfigBuilder::build()`], so a
//! parser never sees an inconsistent combination of options.
//!
//! ```rust
//! use saxcsv::CsvConfig;
//!
//! let config = CsvConfig::builder()
//!     .delimiter(b';')
//!     .trim_whitespace(true)
//!     .allow_comments(true)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.delimiter(), b';');
//!
//! // Trimming would swallow tab delimiters
//! assert!(CsvConfig::builder().delimiter(b'\t').trim_whitespace(true).build().is_err());
//! ```

use crate::ConfigError;

pub(crate) const QUOTE: u8 = b'"';
pub(crate) const CR: u8 = b'\r';
pub(crate) const LF: u8 = b'\n';
pub(crate) const SPACE: u8 = b' ';
pub(crate) const TAB: u8 = b'\t';
pub(crate) const DEL: u8 = 0x7f;

/// Immutable parser options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvConfig {
    delimiter: u8,
    has_header: bool,
    trim_whitespace: bool,
    literal_preservation: bool,
    allow_comments: bool,
    comment_marker: u8,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            trim_whitespace: false,
            literal_preservation: false,
            allow_comments: false,
            comment_marker: b'#',
        }
    }
}

impl CsvConfig {
    /// Starts from the defaults: comma delimited, header row present, no trimming,
    /// no literal preservation, no comments.
    pub fn builder() -> CsvConfigBuilder {
        CsvConfigBuilder {
            config: Self::default(),
        }
    }

    /// Field separator byte.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Whether record 0 carries column names rather than data.
    pub fn has_header(&self) -> bool {
        self.has_header
    }

    /// Whether unquoted fields lose leading and trailing spaces and tabs.
    pub fn trim_whitespace(&self) -> bool {
        self.trim_whitespace
    }

    /// Whether `="payload"` fields are unwrapped to `payload`.
    pub fn literal_preservation(&self) -> bool {
        self.literal_preservation
    }

    /// Whether lines starting with the comment marker are skipped.
    pub fn allow_comments(&self) -> bool {
        self.allow_comments
    }

    pub fn comment_marker(&self) -> u8 {
        self.comment_marker
    }
}

/// Builder for [`CsvConfig`].
#[derive(Debug, Clone)]
pub struct CsvConfigBuilder {
    config: CsvConfig,
}

impl CsvConfigBuilder {
    #[must_use]
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn has_header(mut self, has_header: bool) -> Self {
        self.config.has_header = has_header;
        self
    }

    #[must_use]
    pub fn trim_whitespace(mut self, trim: bool) -> Self {
        self.config.trim_whitespace = trim;
        self
    }

    #[must_use]
    pub fn literal_preservation(mut self, enabled: bool) -> Self {
        self.config.literal_preservation = enabled;
        self
    }

    #[must_use]
    pub fn allow_comments(mut self, allow: bool) -> Self {
        self.config.allow_comments = allow;
        self
    }

    #[must_use]
    pub fn comment_marker(mut self, marker: u8) -> Self {
        self.config.comment_marker = marker;
        self
    }

    /// Validates the combination of options.
    pub fn build(self) -> Result<CsvConfig, ConfigError> {
        let config = self.config;
        let delimiter = config.delimiter;

        // TAB is the only control byte allowed as a delimiter
        let printable = (0x20..DEL).contains(&delimiter) || delimiter == TAB;
        if !printable || matches!(delimiter, QUOTE | SPACE) {
            return Err(ConfigError::InvalidDelimiter(delimiter));
        }
        if config.trim_whitespace && delimiter == TAB {
            return Err(ConfigError::TrimWithTabDelimiter);
        }

        let marker = config.comment_marker;
        if config.allow_comments {
            if !(0x21..DEL).contains(&marker) || marker == QUOTE {
                return Err(ConfigError::InvalidCommentMarker(marker));
            }
            if marker == delimiter {
                return Err(ConfigError::InvalidCommentMarker(marker));
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_defaults() {
        let config = CsvConfig::default();
        assert_eq!(config.delimiter(), b',');
        assert!(config.has_header());
        assert!(!config.trim_whitespace());
        assert!(!config.literal_preservation());
        assert!(!config.allow_comments());
        assert_eq!(config.comment_marker(), b'#');
        assert_eq!(CsvConfig::builder().build(), Ok(config));
    }

    #[test]
    fn test_trim_with_tab_rejected() {
        assert_eq!(
            CsvConfig::builder()
                .delimiter(b'\t')
                .trim_whitespace(true)
                .build(),
            Err(ConfigError::TrimWithTabDelimiter)
        );
        // Either option alone is fine
        assert!(CsvConfig::builder().delimiter(b'\t').build().is_ok());
        assert!(CsvConfig::builder().trim_whitespace(true).build().is_ok());
    }

    #[test]
    fn test_structural_delimiters_rejected() {
        for delimiter in [b'"', b' ', b'\r', b'\n', 0x00, 0x7f, 0xc3] {
            assert_eq!(
                CsvConfig::builder().delimiter(delimiter).build(),
                Err(ConfigError::InvalidDelimiter(delimiter)),
                "delimiter 0x{:02x}",
                delimiter
            );
        }
        for delimiter in [b';', b'|', b'\t', b':'] {
            assert!(CsvConfig::builder().delimiter(delimiter).build().is_ok());
        }
    }

    #[test]
    fn test_comment_marker_validation() {
        assert_eq!(
            CsvConfig::builder()
                .allow_comments(true)
                .comment_marker(b',')
                .build(),
            Err(ConfigError::InvalidCommentMarker(b','))
        );
        assert_eq!(
            CsvConfig::builder()
                .allow_comments(true)
                .comment_marker(b' ')
                .build(),
            Err(ConfigError::InvalidCommentMarker(b' '))
        );
        // Marker is irrelevant while comments are off
        assert!(CsvConfig::builder().comment_marker(b',').build().is_ok());
        assert!(CsvConfig::builder()
            .allow_comments(true)
            .comment_marker(b';')
            .build()
            .is_ok());
    }
}
