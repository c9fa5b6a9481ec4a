/// Error types that can be built from a plain message string.
///
/// Implement this for a crate's error type, then invoke [`impl_context!`]
/// inside its error module to get `.context()` and `.with_context()` on
/// `Result` and `Option`.
pub trait FromMessage: Sized {
    fn from_message(message: String) -> Self;
}

/// Formats `"<context>: <source>"`, the shape every generated `Context` uses.
#[doc(hidden)]
#[must_use]
pub fn join_context(context: &str, source: &dyn std::fmt::Display) -> String {
    format!("{context}: {source}")
}

/// Generate a crate-local `Context` trait.
///
/// Invoke inside a module that defines `Error: FromMessage` and
/// `type Result<T> = std::result::Result<T, Error>`.
///
/// ```ignore
/// // in crates/skills/src/error.rs
/// prompthub_common::impl_context!();
/// ```
#[macro_export]
macro_rules! impl_context {
    () => {
        pub trait Context<T> {
            fn context(self, context: impl Into<String>) -> Result<T>;
            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C;
        }

        impl<T, E: std::fmt::Display> Context<T> for std::result::Result<T, E> {
            fn context(self, context: impl Into<String>) -> Result<T> {
                let context = context.into();
                self.map_err(|source| {
                    <Error as $crate::FromMessage>::from_message($crate::error::join_context(
                        &context, &source,
                    ))
                })
            }

            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C,
            {
                self.map_err(|source| {
                    let context = f().into();
                    <Error as $crate::FromMessage>::from_message($crate::error::join_context(
                        &context, &source,
                    ))
                })
            }
        }

        impl<T> Context<T> for Option<T> {
            fn context(self, context: impl Into<String>) -> Result<T> {
                self.ok_or_else(|| <Error as $crate::FromMessage>::from_message(context.into()))
            }

            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C,
            {
                self.ok_or_else(|| <Error as $crate::FromMessage>::from_message(f().into()))
            }
        }
    };
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    mod local {
        pub use crate::FromMessage;

        #[derive(Debug, thiserror::Error)]
        #[error("{0}")]
        pub struct Error(String);

        impl FromMessage for Error {
            fn from_message(message: String) -> Self {
                Self(message)
            }
        }

        pub type Result<T> = std::result::Result<T, Error>;

        crate::impl_context!();
    }

    #[test]
    fn context_prefixes_the_source_message() {
        use local::Context;

        let failed: Result<(), &str> = Err("disk full");
        let err = failed.context("writing SKILL.md").unwrap_err();
        assert_eq!(err.to_string(), "writing SKILL.md: disk full");
    }

    #[test]
    fn with_context_is_lazy() {
        use local::Context;

        let ok: Result<u8, &str> = Ok(1);
        let value = ok
            .with_context(|| -> String { panic!("context built for Ok") })
            .unwrap();
        assert_eq!(value, 1);
    }

    #[test]
    fn option_context_uses_the_message_verbatim() {
        use local::Context;

        let err = None::<u8>.context("skill not found").unwrap_err();
        assert_eq!(err.to_string(), "skill not found");
    }
}
