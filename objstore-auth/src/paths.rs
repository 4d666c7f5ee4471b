//! unencrypted and encrypted object paths
//!
//! Paths are byte strings split on `/`. Leading, trailing and repeated
//! separators produce empty components, and those are preserved: `"a/"`
//! has two components, `"a"` and `""`. The empty path has no component.
use std::fmt;

/// separator between path components
pub const SEPARATOR: u8 = b'/';

macro_rules! path_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name {
            raw: Vec<u8>,
        }

        impl $name {
            pub fn new<T: Into<Vec<u8>>>(raw: T) -> Self {
                $name { raw: raw.into() }
            }

            /// builds a path from its components
            pub fn from_components<I, C>(components: I) -> Self
            where
                I: IntoIterator<Item = C>,
                C: AsRef<[u8]>,
            {
                $name {
                    raw: join(components),
                }
            }

            pub fn raw(&self) -> &[u8] {
                &self.raw
            }

            pub fn into_raw(self) -> Vec<u8> {
                self.raw
            }

            pub fn is_empty(&self) -> bool {
                self.raw.is_empty()
            }

            /// iterates over the path components
            pub fn iter(&self) -> Iter<'_> {
                Iter::new(&self.raw)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name::new(s)
            }
        }

        impl From<Vec<u8>> for $name {
            fn from(v: Vec<u8>) -> Self {
                $name::new(v)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.raw.escape_ascii().to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.raw.escape_ascii())
            }
        }
    };
}

path_type!(
    /// a path as seen by users
    Unencrypted
);

path_type!(
    /// a path made of encoded encrypted components
    Encrypted
);

/// joins components with the separator
pub fn join<I, C>(components: I) -> Vec<u8>
where
    I: IntoIterator<Item = C>,
    C: AsRef<[u8]>,
{
    let mut raw = Vec::new();
    for (i, component) in components.into_iter().enumerate() {
        if i > 0 {
            raw.push(SEPARATOR);
        }
        raw.extend_from_slice(component.as_ref());
    }
    raw
}

/// iterator over the components of a path
///
/// it can be cloned to remember a position in the path
#[derive(Clone, Copy, Debug)]
pub struct Iter<'a> {
    raw: &'a [u8],
    consumed: usize,
    last_empty: bool,
}

impl<'a> Iter<'a> {
    pub fn new(raw: &'a [u8]) -> Self {
        Iter {
            raw,
            consumed: 0,
            last_empty: false,
        }
    }

    /// returns true when every component was returned
    pub fn is_done(&self) -> bool {
        self.consumed == self.raw.len() && !self.last_empty
    }

    /// the part of the path already iterated over
    pub fn consumed(&self) -> &'a [u8] {
        &self.raw[..self.consumed]
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.is_done() {
            return None;
        }

        let rest = &self.raw[self.consumed..];
        match rest.iter().position(|b| *b == SEPARATOR) {
            None => {
                self.consumed += rest.len();
                self.last_empty = false;
                Some(rest)
            }
            Some(index) => {
                self.consumed += index + 1;
                self.last_empty = index == rest.len() - 1;
                Some(&rest[..index])
            }
        }
    }
}
