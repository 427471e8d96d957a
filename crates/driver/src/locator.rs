//! Typed element queries.
//!
//! Callers describe *what* they want (a button named "Book", the text
//! "Select date and time") and the driver decides how to find it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// ARIA role of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// `button`
    Button,
    /// `textbox`
    Textbox,
    /// `link`
    Link,
    /// `dialog`
    Dialog,
}

impl Role {
    /// ARIA role name.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Button => "button",
            Role::Textbox => "textbox",
            Role::Link => "link",
            Role::Dialog => "dialog",
        }
    }
}

/// A semantic element query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    /// Element with the given role and accessible name.
    Role {
        /// Role
        role: Role,
        /// Accessible name
        name: String,
        /// Whole-name match instead of substring match
        exact: bool,
    },

    /// Element whose text content contains (or equals) the given text.
    Text {
        /// Text
        text: String,
        /// Whole-text match
        exact: bool,
    },

    /// CSS selector, for elements without a usable role or name.
    Css(String),

    /// The `index`-th (zero based) match of another locator.
    Nth {
        /// Underlying locator
        inner: Box<Locator>,
        /// Match index
        index: usize,
    },
}

impl Locator {
    /// Role + accessible name, substring match.
    pub fn role(role: Role, name: impl Into<String>) -> Self {
        Locator::Role {
            role,
            name: name.into(),
            exact: false,
        }
    }

    /// A button by accessible name, substring match.
    pub fn button(name: impl Into<String>) -> Self {
        Self::role(Role::Button, name)
    }

    /// Text content, substring match.
    pub fn text(text: impl Into<String>) -> Self {
        Locator::Text {
            text: text.into(),
            exact: false,
        }
    }

    /// CSS selector.
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    /// Require a whole-name match. No effect on CSS and nth locators.
    pub fn exact(self) -> Self {
        match self {
            Locator::Role { role, name, .. } => Locator::Role {
                role,
                name,
                exact: true,
            },
            Locator::Text { text, .. } => Locator::Text { text, exact: true },
            other => other,
        }
    }

    /// Pick the `index`-th match.
    pub fn nth(self, index: usize) -> Self {
        Locator::Nth {
            inner: Box::new(self),
            index,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Role { role, name, exact } => {
                let eq = if *exact { "=" } else { "~" };
                write!(f, "{}{}\"{}\"", role.as_str(), eq, name)
            }
            Locator::Text { text, exact: true } => write!(f, "text=\"{text}\""),
            Locator::Text { text, exact: false } => write!(f, "text~\"{text}\""),
            Locator::Css(selector) => write!(f, "css={selector}"),
            Locator::Nth { inner, index } => write!(f, "{inner} >> nth={index}"),
        }
    }
}
