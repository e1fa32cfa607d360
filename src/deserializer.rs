//! Splitting of serialized array and object parameter values.
//!
//! A raw value such as `blue,black,brown` (form), `blue|black` (pipeDelimited) or
//! `R,100,G,200` (object) is cut into tokens here before the element validators see
//! it. Splitting never limits the token count, so trailing empties are kept, and a
//! zero-length token becomes `None`: the element was present but empty.
//!
//! Exploded parameters do not come through here; their occurrences are already a list.

use crate::error::ValidationError;
use crate::spec::ParameterStyle;
use std::borrow::Cow;

/// Separator family for one serialized container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerStyle {
    /// `,` (simple, form, matrix)
    Comma,
    /// ` ` (spaceDelimited)
    Space,
    /// `|` (pipeDelimited)
    Pipe,
    /// `.` (label, exploded)
    Dot,
    /// `R=100,G=200` (simple style, exploded object)
    KeyValuePairs,
}

impl ContainerStyle {
    /// Container style for a non-exploded value of the given style.
    pub fn for_style(style: ParameterStyle) -> Self {
        match style {
            ParameterStyle::SpaceDelimited => ContainerStyle::Space,
            ParameterStyle::PipeDelimited => ContainerStyle::Pipe,
            _ => ContainerStyle::Comma,
        }
    }

    pub fn separator(&self) -> char {
        match self {
            ContainerStyle::Comma | ContainerStyle::KeyValuePairs => ',',
            ContainerStyle::Space => ' ',
            ContainerStyle::Pipe => '|',
            ContainerStyle::Dot => '.',
        }
    }
}

/// Splits raw strings for one parameter; path values also need percent-decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Splitter {
    pub style: ContainerStyle,
    pub percent_decode: bool,
}

impl Splitter {
    pub fn new(style: ContainerStyle) -> Self {
        Splitter {
            style,
            percent_decode: false,
        }
    }

    pub fn decoding(mut self, percent_decode: bool) -> Self {
        self.percent_decode = percent_decode;
        self
    }

    /// Split into array elements. `None` marks an empty element.
    pub fn split_array(&self, raw: &str) -> Result<Vec<Option<String>>, ValidationError> {
        raw.split(self.style.separator())
            .map(|token| self.token(raw, token))
            .collect()
    }

    /// Split into ordered `(key, value)` pairs.
    pub fn split_object(
        &self,
        raw: &str,
    ) -> Result<Vec<(String, Option<String>)>, ValidationError> {
        if self.style == ContainerStyle::KeyValuePairs {
            return raw
                .split(',')
                .map(|entry| {
                    let (key, value) = entry.split_once('=').ok_or_else(|| {
                        ValidationError::deserialization(raw, format!("entry \"{entry}\" has no '='"))
                    })?;
                    Ok((self.key(raw, key)?, self.token(raw, value)?))
                })
                .collect();
        }

        let tokens: Vec<&str> = raw.split(self.style.separator()).collect();
        if tokens.len() % 2 != 0 {
            return Err(ValidationError::deserialization(
                raw,
                format!("object needs key/value pairs but found {} tokens", tokens.len()),
            ));
        }
        tokens
            .chunks(2)
            .map(|pair| Ok((self.key(raw, pair[0])?, self.token(raw, pair[1])?)))
            .collect()
    }

    fn key(&self, raw: &str, key: &str) -> Result<String, ValidationError> {
        match self.token(raw, key)? {
            Some(k) => Ok(k),
            None => Err(ValidationError::deserialization(raw, "empty object key")),
        }
    }

    fn token(&self, raw: &str, token: &str) -> Result<Option<String>, ValidationError> {
        if token.is_empty() {
            return Ok(None);
        }
        let decoded = if self.percent_decode {
            percent_decode(token).map_err(|e| ValidationError::deserialization(raw, e))?
        } else {
            Cow::Borrowed(token)
        };
        Ok(Some(decoded.into_owned()))
    }
}

/// Percent-decode one path token; `+` is left alone (it is not a space in paths).
pub fn percent_decode(token: &str) -> Result<Cow<'_, str>, std::string::FromUtf8Error> {
    if token.contains('%') {
        urlencoding::decode(token)
    } else {
        Ok(Cow::Borrowed(token))
    }
}
