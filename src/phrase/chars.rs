//! Character class predicates used by the grammar.

use unicode_general_category::{GeneralCategory, get_general_category};

/// A character classification scheme.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CharClasses {
    /// The C locale classification, where every non-ASCII character is
    /// neither space, alphanumeric, punctuation, nor graph.
    #[default]
    Ascii,
    /// Classification by Unicode general category.
    Unicode,
}

impl CharClasses {
    /// Returns true if `c` is whitespace, including line terminators.
    #[inline]
    pub fn is_space(self, c: char) -> bool {
        match self {
            Self::Ascii => matches!(c, ' ' | '\t' | '\n' | '\x0b' | '\x0c' | '\r'),
            Self::Unicode => c.is_whitespace(),
        }
    }

    /// Returns true if `c` is a space or a tab.
    #[inline]
    pub fn is_blank(self, c: char) -> bool {
        matches!(c, ' ' | '\t')
    }

    /// Returns true if `c` is a letter or digit.
    #[inline]
    pub fn is_alnum(self, c: char) -> bool {
        match self {
            Self::Ascii => c.is_ascii_alphanumeric(),
            Self::Unicode => c.is_alphanumeric(),
        }
    }

    /// Returns true if `c` can continue an identifier.
    #[inline]
    pub fn is_identifier(self, c: char) -> bool {
        c == '_' || self.is_alnum(c)
    }

    /// Returns true if `c` is punctuation.
    #[inline]
    pub fn is_punct(self, c: char) -> bool {
        match self {
            Self::Ascii => c.is_ascii_punctuation(),
            Self::Unicode => {
                use GeneralCategory::*;
                matches!(
                    get_general_category(c),
                    ClosePunctuation
                        | ConnectorPunctuation
                        | CurrencySymbol
                        | DashPunctuation
                        | FinalPunctuation
                        | InitialPunctuation
                        | MathSymbol
                        | ModifierSymbol
                        | OpenPunctuation
                        | OtherPunctuation
                        | OtherSymbol
                )
            }
        }
    }

    /// Returns true if `c` is a printable character other than a space.
    #[inline]
    pub fn is_graph(self, c: char) -> bool {
        match self {
            Self::Ascii => c.is_ascii_graphic(),
            Self::Unicode => {
                use GeneralCategory::*;
                !c.is_whitespace()
                    && !matches!(
                        get_general_category(c),
                        Control
                            | LineSeparator
                            | ParagraphSeparator
                            | SpaceSeparator
                            | Surrogate
                            | Unassigned
                    )
            }
        }
    }
}
