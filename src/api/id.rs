use juniper::{GraphQLScalar, InputValue, ScalarValue};
use paste::paste;
use static_assertions::const_assert;
use std::fmt;

use crate::{model::Key, prelude::*};


/// An opaque identifier for all objects the GraphQL API might return.
///
/// While clients should treat the ID as completely opaque, of course there is
/// some system in it: it consists of a two character prefix denoting the
/// kind of object, followed by the database key of that object.
///
/// Each ID is encoded as 13 byte ASCII string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, GraphQLScalar)]
#[graphql(
    name = "ID",
    description = "An opaque, unique identifier",
    parse_token(String, i32),
)]
pub(crate) struct Id {
    /// The kind of object. For example, books have the prefix `b"bk"`.
    kind: [u8; 2],

    /// The database key of the object, base64 encoded in the string form.
    ///
    /// Note that this is a private field. To get to it, you need to prove
    /// that you know what kind of ID it is using [`Self::key_for`].
    key: Key,
}


// Defines a list of "kinds", each with a two alphanumeric ASCII character
// prefix. This creates a function and a const associated with `Id`.
macro_rules! define_kinds {
    ($($name:ident = $val:literal ,)+) => {
        paste!(
            impl Id {
                $(
                    pub(crate) const [<$name:upper _KIND>]: [u8; 2] = *$val;

                    pub(crate) fn $name(key: Key) -> Self {
                        Self {
                            kind: Self:: [<$name:upper _KIND>],
                            key,
                        }
                    }
                )+
            }
        );

        $(
            const_assert!($val[0].is_ascii_alphanumeric());
            const_assert!($val[1].is_ascii_alphanumeric());
        )+

        // Duplicate prefixes result in duplicate discriminants, which fails
        // to compile.
        #[allow(non_camel_case_types, dead_code)]
        #[repr(u16)]
        enum _KindChecker {
            $( $name = u16::from_ne_bytes(*$val), )+
        }
    };
}

define_kinds![
    book = b"bk",
    author = b"au",
];


impl Id {
    /// See `invalid`.
    const INVALID_KIND: [u8; 2] = *b"!!";

    /// Returns an ID that refers to no object at all. Unparsable IDs are
    /// turned into this one. That way, a lookup just returns "nothing with
    /// that ID" instead of distinguishing between "not found" and "invalid
    /// ID syntax".
    fn invalid() -> Self {
        Self {
            kind: Self::INVALID_KIND,
            key: Key(0),
        }
    }

    /// Returns the key of this id if the kind is equal to `expected_kind`. If
    /// the kinds don't match, `None` is returned.
    pub(crate) fn key_for(&self, expected_kind: [u8; 2]) -> Option<Key> {
        if self.kind == expected_kind {
            Some(self.key)
        } else {
            None
        }
    }

    fn to_output<S: ScalarValue>(&self) -> juniper::Value<S> {
        juniper::Value::scalar(self.to_string())
    }

    /// Like the built-in `ID`, this accepts strings and integers. Anything
    /// that is not one of our IDs (including every integer) becomes
    /// [`Self::invalid`].
    fn from_input<S: ScalarValue>(input: &InputValue<S>) -> Result<Self, String> {
        if let Some(s) = input.as_string_value() {
            return Ok(s.parse().unwrap_or_else(|e| {
                trace!("Unparsable ID '{s}' ({e}), treating it as unknown");
                Self::invalid()
            }));
        }

        match input.as_int_value() {
            Some(_) => Ok(Self::invalid()),
            None => Err(format!("expected string or integer, found: {input}")),
        }
    }
}

impl std::str::FromStr for Id {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 13 || !s.is_char_boundary(2) {
            return Err("invalid length");
        }

        let bytes = s.as_bytes();
        let kind = [bytes[0], bytes[1]];
        let key = Key::from_base64(&s[2..]).ok_or("invalid base64")?;

        Ok(Self { kind, key })
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut key = [b' '; 11];
        let key = self.key.to_base64(&mut key);
        let kind = std::str::from_utf8(&self.kind).map_err(|_| fmt::Error)?;
        write!(f, "{kind}{key}")
    }
}
