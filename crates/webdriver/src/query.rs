//! Translation of semantic locators into WebDriver location strategies.
//!
//! Accessible names are approximated from what the page renders: text
//! content, `aria-label`, `value` (submit inputs), `placeholder` and
//! associated `<label>` text. Whitespace is ignored when comparing, so a
//! button built from `<span>Mon</span><span>21</span>` matches "Mon 21".

use courtres_driver::{Locator, Role};

/// A concrete lookup: strategy, expression, and which match to take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Query {
    pub using: &'static str,
    pub value: String,
    pub index: usize,
}

impl Query {
    pub(crate) fn from_locator(locator: &Locator) -> Self {
        match locator {
            Locator::Css(selector) => Query {
                using: "css selector",
                value: selector.clone(),
                index: 0,
            },
            Locator::Role { role, name, exact } => Query {
                using: "xpath",
                value: role_xpath(*role, name, *exact),
                index: 0,
            },
            Locator::Text { text, exact } => Query {
                using: "xpath",
                value: text_xpath(text, *exact),
                index: 0,
            },
            Locator::Nth { inner, index } => Query {
                index: *index,
                ..Query::from_locator(inner)
            },
        }
    }
}

/// XPath string literal for arbitrary text.
fn literal(s: &str) -> String {
    if !s.contains('\'') {
        return format!("'{s}'");
    }
    let parts: Vec<String> = s.split('\'').map(|p| format!("'{p}'")).collect();
    format!("concat({})", parts.join(", \"'\", "))
}

/// Whitespace-insensitive comparison of an XPath expression with `name`.
fn name_matches(expr: &str, name: &str, exact: bool) -> String {
    let squeezed: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    let lhs = format!("translate({expr}, ' \t\n\r\u{a0}', '')");
    if exact {
        format!("{lhs}={}", literal(&squeezed))
    } else {
        format!("contains({lhs}, {})", literal(&squeezed))
    }
}

fn role_xpath(role: Role, name: &str, exact: bool) -> String {
    let elements = match role {
        Role::Button => {
            "self::button or @role='button' or (self::input and (@type='submit' or @type='button' or @type='reset'))"
        }
        Role::Textbox => {
            "@role='textbox' or self::textarea or (self::input and (not(@type) or @type='text' or @type='email' or @type='password' or @type='search' or @type='tel' or @type='url'))"
        }
        Role::Link => "self::a[@href] or @role='link'",
        Role::Dialog => "self::dialog or @role='dialog' or @role='alertdialog'",
    };

    let mut names = vec![
        name_matches("@aria-label", name, exact),
        name_matches("@title", name, exact),
    ];
    match role {
        Role::Textbox => {
            names.push(name_matches("@placeholder", name, exact));
            names.push(name_matches("@name", name, exact));
            names.push(format!(
                "@id=//label[{}]/@for",
                name_matches("normalize-space(.)", name, exact)
            ));
            names.push(format!(
                "ancestor::label[{}]",
                name_matches("normalize-space(.)", name, exact)
            ));
        }
        _ => {
            names.push(name_matches("normalize-space(.)", name, exact));
            names.push(name_matches("@value", name, exact));
        }
    }

    format!("//*[{elements}][{}]", names.join(" or "))
}

fn text_xpath(text: &str, exact: bool) -> String {
    let here = name_matches("normalize-space(.)", text, exact);
    // Innermost element carrying the text, not every ancestor of it.
    format!(
        "//body//*[not(self::script or self::style)][{here}][not(*[{}])]",
        name_matches("normalize-space(.)", text, false)
    )
}
