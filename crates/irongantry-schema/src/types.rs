//! Newtype wrappers for validated manifest values.
//!
//! Instances can only be produced by the validators in [`crate::validate`], so
//! holding one is proof that the value passed its allow-list. All newtypes
//! serialize as plain strings.

use serde::Serialize;
use std::fmt;
use std::ops::Deref;

macro_rules! validated_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub(crate) fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<std::ffi::OsStr> for $name {
            fn as_ref(&self) -> &std::ffi::OsStr {
                std::ffi::OsStr::new(&self.0)
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

validated_newtype!(
    /// Project identifier, restricted to `[A-Za-z0-9_-]+`.
    ProjectName
);

validated_newtype!(
    /// A single installer requirement: name, optional extras, optional version clauses.
    PackageSpec
);

validated_newtype!(
    /// Interpreter version in `major.minor` form.
    PythonVersion
);

validated_newtype!(
    /// Entrypoint command line whose first word is `python` or `python3`.
    Entrypoint
);

impl Entrypoint {
    /// Split the command line into words using POSIX shell quoting rules.
    ///
    /// Validation already guarantees the quoting is balanced.
    pub fn words(&self) -> Option<Vec<String>> {
        shlex::split(&self.0).filter(|w| !w.is_empty())
    }
}
