// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Typed [`Parameter`]s of a step pattern.
//!
//! Every `{name}` placeholder of a step pattern resolves to a
//! [`ParameterKind`] once, when the pattern is compiled. The kind then owns
//! the conversion of the matched text into a [`Parameter`] value, so step
//! handlers never inspect raw strings.

use std::{fmt, str::FromStr as _};

use bigdecimal::BigDecimal;
use derive_more::with_trait::{Deref, Display, Error, From};
use num_bigint::BigInt;

/// Kind of a parameter declared inline in a step pattern.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ParameterKind {
    /// `{int}`
    Int,

    /// `{byte}`
    Byte,

    /// `{short}`
    Short,

    /// `{long}`
    Long,

    /// `{float}`
    Float,

    /// `{double}`
    Double,

    /// `{word}`
    Word,

    /// `{string}`, either single or double quoted.
    String,

    /// `{biginteger}`
    BigInteger,

    /// `{bigdecimal}`
    BigDecimal,

    /// `{}`
    Anonymous,
}

impl ParameterKind {
    /// Name used inside `{}` of a pattern.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Word => "word",
            Self::String => "string",
            Self::BigInteger => "biginteger",
            Self::BigDecimal => "bigdecimal",
            Self::Anonymous => "",
        }
    }

    /// All the [`ParameterKind`]s which aren't built into
    /// [`cucumber_expressions`], so have to be provided on compilation.
    pub const EXTRA: [Self; 6] = [
        Self::Byte,
        Self::Short,
        Self::Long,
        Self::Double,
        Self::BigInteger,
        Self::BigDecimal,
    ];

    /// Resolves the name used inside `{}` of a pattern.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "int" => Self::Int,
            "byte" => Self::Byte,
            "short" => Self::Short,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "word" => Self::Word,
            "string" => Self::String,
            "biginteger" => Self::BigInteger,
            "bigdecimal" => Self::BigDecimal,
            "" => Self::Anonymous,
            _ => return None,
        })
    }

    /// Regex of this kind, if it isn't built into [`cucumber_expressions`].
    ///
    /// Shouldn't contain capturing groups.
    #[must_use]
    pub const fn extra_regex(self) -> Option<&'static str> {
        match self {
            Self::Byte | Self::Short | Self::Long | Self::BigInteger => {
                Some(r"-?\d+")
            }
            Self::Double => Some(
                r"[+-]?(?i:inf|infinity|nan|(?:(?:\d+|\d+\.\d*|\d*\.\d+)(?:[eE][+-]?\d+)?))",
            ),
            Self::BigDecimal => {
                Some(r"[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?")
            }
            Self::Int
            | Self::Float
            | Self::Word
            | Self::String
            | Self::Anonymous => None,
        }
    }

    /// Converts the matched `raw` text into a [`Parameter`].
    ///
    /// # Errors
    ///
    /// If the text doesn't fit into the target type (an out-of-range `{int}`,
    /// for example).
    pub fn convert(self, raw: &str) -> Result<Parameter, ParameterError> {
        let fail = |reason: String| ParameterError::Conversion {
            value: raw.to_owned(),
            kind: self,
            reason,
        };

        Ok(match self {
            Self::Int => Parameter::Int(
                raw.parse::<i32>().map_err(|e| fail(format!("{e}")))?.into(),
            ),
            Self::Long => {
                Parameter::Int(raw.parse().map_err(|e| fail(format!("{e}")))?)
            }
            Self::Byte => Parameter::Int(
                raw.parse::<i8>().map_err(|e| fail(format!("{e}")))?.into(),
            ),
            Self::Short => Parameter::Int(
                raw.parse::<i16>().map_err(|e| fail(format!("{e}")))?.into(),
            ),
            Self::Float | Self::Double => {
                Parameter::Float(raw.parse().map_err(|e| fail(format!("{e}")))?)
            }
            Self::BigInteger => Parameter::BigInt(
                BigInt::from_str(raw).map_err(|e| fail(format!("{e}")))?,
            ),
            Self::BigDecimal => Parameter::BigDecimal(
                BigDecimal::from_str(raw).map_err(|e| fail(format!("{e}")))?,
            ),
            Self::String => Parameter::Str(unquote(raw)),
            Self::Word => Parameter::Word(raw.to_owned()),
            Self::Anonymous => Parameter::Anonymous(raw.to_owned()),
        })
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Strips the surrounding quotes of a `{string}` match and unescapes the
/// quote it was delimited with.
fn unquote(raw: &str) -> String {
    for quote in ['"', '\''] {
        if let Some(inner) = raw
            .strip_prefix(quote)
            .and_then(|s| s.strip_suffix(quote))
        {
            return inner.replace(&format!("\\{quote}"), &quote.to_string());
        }
    }
    raw.to_owned()
}

/// Value of a single matched step parameter.
#[derive(Clone, Debug, Display, PartialEq)]
pub enum Parameter {
    /// `{int}`, `{byte}`, `{short}` or `{long}`.
    #[display("{_0}")]
    Int(i64),

    /// `{float}` or `{double}`.
    #[display("{_0}")]
    Float(f64),

    /// `{biginteger}`.
    #[display("{_0}")]
    BigInt(BigInt),

    /// `{bigdecimal}`.
    #[display("{_0}")]
    BigDecimal(BigDecimal),

    /// `{string}` without its quotes.
    #[display("{_0}")]
    Str(String),

    /// `{word}`.
    #[display("{_0}")]
    Word(String),

    /// `{}`.
    #[display("{_0}")]
    Anonymous(String),
}

impl Parameter {
    /// Returns the integer value, if this is an integer [`Parameter`].
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        if let Self::Int(v) = self {
            Some(*v)
        } else {
            None
        }
    }

    /// Returns the floating point value, if this is a decimal [`Parameter`].
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        if let Self::Float(v) = self {
            Some(*v)
        } else {
            None
        }
    }

    /// Returns the textual value of `{string}`, `{word}` and `{}`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Word(s) | Self::Anonymous(s) => Some(s),
            Self::Int(_)
            | Self::Float(_)
            | Self::BigInt(_)
            | Self::BigDecimal(_) => None,
        }
    }

    /// Returns the arbitrary-precision integer value of `{biginteger}`.
    #[must_use]
    pub const fn as_big_int(&self) -> Option<&BigInt> {
        if let Self::BigInt(v) = self {
            Some(v)
        } else {
            None
        }
    }

    /// Returns the arbitrary-precision decimal value of `{bigdecimal}`.
    #[must_use]
    pub const fn as_big_decimal(&self) -> Option<&BigDecimal> {
        if let Self::BigDecimal(v) = self {
            Some(v)
        } else {
            None
        }
    }

    /// Short name of this [`Parameter`]'s type for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Float(_) => "decimal",
            Self::BigInt(_) => "big integer",
            Self::BigDecimal(_) => "big decimal",
            Self::Str(_) => "string",
            Self::Word(_) => "word",
            Self::Anonymous(_) => "anonymous",
        }
    }
}

/// Ordered [`Parameter`]s extracted from a single step text.
#[derive(Clone, Debug, Default, Deref, From, PartialEq)]
pub struct Parameters(Vec<Parameter>);

impl Parameters {
    /// Returns the [`Parameter`] at `index`.
    ///
    /// # Errors
    ///
    /// If there is no [`Parameter`] at `index`.
    pub fn get_at(&self, index: usize) -> Result<&Parameter, ParameterError> {
        self.0.get(index).ok_or(ParameterError::Missing(index))
    }

    /// Returns the integer [`Parameter`] at `index`.
    ///
    /// # Errors
    ///
    /// If it's absent or of another type.
    pub fn int(&self, index: usize) -> Result<i64, ParameterError> {
        let p = self.get_at(index)?;
        p.as_i64().ok_or_else(|| mismatch(index, "integer", p))
    }

    /// Returns the decimal [`Parameter`] at `index`.
    ///
    /// # Errors
    ///
    /// If it's absent or of another type.
    pub fn float(&self, index: usize) -> Result<f64, ParameterError> {
        let p = self.get_at(index)?;
        p.as_f64().ok_or_else(|| mismatch(index, "decimal", p))
    }

    /// Returns the textual [`Parameter`] at `index`.
    ///
    /// # Errors
    ///
    /// If it's absent or of another type.
    pub fn string(&self, index: usize) -> Result<&str, ParameterError> {
        let p = self.get_at(index)?;
        p.as_str().ok_or_else(|| mismatch(index, "string", p))
    }

    /// Returns the `{biginteger}` [`Parameter`] at `index`.
    ///
    /// # Errors
    ///
    /// If it's absent or of another type.
    pub fn big_int(&self, index: usize) -> Result<&BigInt, ParameterError> {
        let p = self.get_at(index)?;
        p.as_big_int().ok_or_else(|| mismatch(index, "big integer", p))
    }

    /// Returns the `{bigdecimal}` [`Parameter`] at `index`.
    ///
    /// # Errors
    ///
    /// If it's absent or of another type.
    pub fn big_decimal(
        &self,
        index: usize,
    ) -> Result<&BigDecimal, ParameterError> {
        let p = self.get_at(index)?;
        p.as_big_decimal()
            .ok_or_else(|| mismatch(index, "big decimal", p))
    }

    /// Consumes these [`Parameters`] returning the inner values.
    #[must_use]
    pub fn into_inner(self) -> Vec<Parameter> {
        self.0
    }
}

impl FromIterator<Parameter> for Parameters {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn mismatch(
    index: usize,
    expected: &'static str,
    actual: &Parameter,
) -> ParameterError {
    ParameterError::Mismatch { index, expected, actual: actual.type_name() }
}

/// Error of converting or accessing a [`Parameter`].
#[derive(Clone, Debug, Display, Error, PartialEq)]
pub enum ParameterError {
    /// Matched text doesn't fit into the [`ParameterKind`]'s type.
    #[display("Cannot convert `{value}` into {{{kind}}}: {reason}")]
    Conversion {
        /// Matched text.
        #[error(not(source))]
        value: String,

        /// Declared [`ParameterKind`].
        kind: ParameterKind,

        /// Why the conversion failed.
        reason: String,
    },

    /// No [`Parameter`] at the requested position.
    #[display("No parameter at position {_0}")]
    Missing(#[error(not(source))] usize),

    /// [`Parameter`] is of another type than requested.
    #[display("Parameter at position {index} is {actual}, not {expected}")]
    Mismatch {
        /// Requested position.
        #[error(not(source))]
        index: usize,

        /// Requested type.
        expected: &'static str,

        /// Actual type.
        actual: &'static str,
    },
}
