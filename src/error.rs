use core::fmt;
use std::borrow::Cow;

// -----------------------------------------------------------------------------
// CodecError

/// An enumeration of all error outcomes that might happen while resolving,
/// decoding or encoding a polymorphic value.
///
/// Errors raised by the underlying document format (malformed input, a scalar
/// of the wrong kind, ...) are carried through unchanged as [`Message`].
///
/// [`Message`]: CodecError::Message
#[derive(Debug, PartialEq)]
pub enum CodecError {
    /// A type tag was present but no constructor is registered for it.
    ///
    /// Fatal for a required single value; sequence and mapping decoding skip
    /// the offending entry instead.
    NotRegistered { tag: String },
    /// The tag field was absent from a keyed node, or was not a string.
    TagMissing { key: Cow<'static, str> },
    /// A decoded value could not be cast to the statically expected type.
    ///
    /// This indicates a registry misconfiguration: the constructor registered
    /// for the tag produced a different variant than the call site expects.
    TypeMismatch {
        expected: Cow<'static, str>,
        actual: String,
    },
    /// A value offered for encoding matches none of the supported slot shapes.
    NotEncodable { type_name: Cow<'static, str> },
    /// An error surfaced by the underlying document format or by a variant's
    /// own (de)serialization.
    Message(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRegistered { tag } => {
                write!(f, "no type registered for tag `{tag}`")
            }
            Self::TagMissing { key } => {
                write!(f, "tag field `{key}` is absent or not a string")
            }
            Self::TypeMismatch { expected, actual } => {
                write!(f, "expected a value of type `{expected}`, got `{actual}`")
            }
            Self::NotEncodable { type_name } => {
                write!(f, "type `{type_name}` matches no encodable slot shape")
            }
            Self::Message(message) => f.write_str(message),
        }
    }
}

impl core::error::Error for CodecError {}

impl serde_core::de::Error for CodecError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::Message(msg.to_string())
    }
}

impl serde_core::ser::Error for CodecError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::Message(msg.to_string())
    }
}

impl From<erased_serde::Error> for CodecError {
    #[inline]
    fn from(value: erased_serde::Error) -> Self {
        Self::Message(value.to_string())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::CodecError;

    #[test]
    fn display_carries_offending_context() {
        let err = CodecError::NotRegistered {
            tag: "splashscreen".to_owned(),
        };
        assert_eq!(err.to_string(), "no type registered for tag `splashscreen`");

        let err = CodecError::TypeMismatch {
            expected: "DetailScreen".into(),
            actual: "homescreen".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "expected a value of type `DetailScreen`, got `homescreen`"
        );
    }

    #[test]
    fn custom_wraps_underlying_messages() {
        let err = <CodecError as serde_core::de::Error>::custom("eof while parsing");
        assert_eq!(err, CodecError::Message("eof while parsing".to_owned()));
    }
}
