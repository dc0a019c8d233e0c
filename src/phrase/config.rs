//! Parser configuration data.

use super::chars::CharClasses;
use core::{fmt, str::FromStr};

/// The first document version which uses the 1.5 template argument grammar.
pub const QBK_1_5: u32 = 105;

/// The default limit for nested macro and template expansions.
pub const DEFAULT_DEPTH_LIMIT: usize = 100;

/// A document format version, stored as `major * 100 + minor`.
///
/// ```quickbook
/// [quickbook 1.5]
///            ^^^
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Version(pub u32);

impl Default for Version {
    fn default() -> Self {
        Self(QBK_1_5)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 100, self.0 % 100)
    }
}

/// An error parsing a [`Version`] from a string.
#[derive(Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid document version '{0}': expected 'major.minor'")]
pub struct VersionError(String);

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || VersionError(s.to_string());
        let (major, minor) = s.trim().split_once('.').ok_or_else(err)?;
        let major = major.parse::<u32>().map_err(|_| err())?;
        let minor = minor.parse::<u32>().map_err(|_| err())?;
        if minor >= 100 {
            return Err(err());
        }
        major
            .checked_mul(100)
            .and_then(|major| major.checked_add(minor))
            .map(Self)
            .ok_or_else(err)
    }
}

/// The template argument dialect of a document.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Dialect {
    /// Documents before 1.5. Arguments cannot contain escapes, and missing
    /// arguments are always taken from whitespace in the last argument.
    Qbk14,
    /// Documents from 1.5. Arguments may contain backslash escapes, and
    /// whitespace splitting only happens when there is a single argument.
    Qbk15,
}

/// Configuration for the phrase parser and elaborator.
#[derive(Clone, Debug)]
pub struct Configuration {
    /// The declared document format version.
    pub version: Version,
    /// Character classification used by the grammar.
    pub classes: CharClasses,
    /// The maximum nesting of macro and template expansions. This also
    /// limits the nesting of brackets within one phrase.
    pub depth_limit: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            version: Version::default(),
            classes: CharClasses::default(),
            depth_limit: DEFAULT_DEPTH_LIMIT,
        }
    }
}

impl Configuration {
    /// Creates a configuration for the given document version.
    pub fn new(version: Version) -> Self {
        Self {
            version,
            ..Default::default()
        }
    }

    /// Sets the character classification.
    #[must_use]
    pub fn with_classes(mut self, classes: CharClasses) -> Self {
        self.classes = classes;
        self
    }

    /// Sets the expansion depth limit.
    #[must_use]
    pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
        self.depth_limit = depth_limit;
        self
    }

    /// The template argument dialect selected by the document version.
    #[inline]
    pub fn dialect(&self) -> Dialect {
        if self.version.0 >= QBK_1_5 {
            Dialect::Qbk15
        } else {
            Dialect::Qbk14
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_parse() {
        assert_eq!("1.5".parse(), Ok(Version(105)));
        assert_eq!(" 1.4 ".parse(), Ok(Version(104)));
        assert_eq!("1.10".parse::<Version>().map(|v| v.to_string()), Ok("1.10".into()));
        assert!("1".parse::<Version>().is_err());
        assert!("1.x".parse::<Version>().is_err());
        assert!("1.100".parse::<Version>().is_err());
    }

    #[test]
    fn dialect_threshold() {
        assert_eq!(Configuration::new(Version(104)).dialect(), Dialect::Qbk14);
        assert_eq!(Configuration::new(Version(105)).dialect(), Dialect::Qbk15);
        assert_eq!(Configuration::new(Version(106)).dialect(), Dialect::Qbk15);
    }
}
