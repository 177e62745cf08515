use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::errors::DomainError;

/// URL-safe client key derived from the business name. Immutable once a client exists.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientSlug(String);

impl ClientSlug {
    pub fn from_business_name(name: &str) -> Result<Self, DomainError> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(DomainError::Validation(format!(
                "business name `{}` does not produce a usable slug",
                name.trim()
            )));
        }
        Ok(Self(slug))
    }

    /// Wraps an already-normalized slug, e.g. one read back from a route or the store.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || slugify(trimmed) != trimmed {
            return Err(DomainError::Validation(format!("`{raw}` is not a valid client slug")));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Calendar providers reject underscores in their own slugs.
    pub fn hyphenated(&self) -> String {
        self.0.replace('_', "-")
    }
}

impl fmt::Display for ClientSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ClientSlug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Decomposes to NFD and drops combining marks, so precomposed and decomposed
/// spellings of the same name share a slug.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    let folded = input.nfd().filter(|ch| !is_combining_mark(*ch));
    for ch in folded.flat_map(char::to_lowercase) {
        let mapped = match transliterate(ch) {
            Some(ascii) => ascii,
            None => {
                pending_separator = true;
                continue;
            }
        };

        if pending_separator && !slug.is_empty() {
            slug.push('_');
        }
        pending_separator = false;
        slug.push(mapped);
    }

    slug
}

/// Letters with no decomposition that still have a plain ASCII reading.
fn transliterate(ch: char) -> Option<char> {
    match ch {
        'a'..='z' | '0'..='9' => Some(ch),
        'ø' => Some('o'),
        'đ' => Some('d'),
        'ł' => Some('l'),
        _ => None,
    }
}
