use std::{borrow::Cow, fmt::Display, fmt::Write};

use crate::BoxError;

/// A replacement for each match found by [`Pattern::replace`](crate::Pattern::replace).
///
/// Implemented for literal strings, which replace every match with the same
/// text, and for closures taking the matched text and its byte offset:
///
/// ```
/// use scanpat::{BoxError, Pattern, ReplaceFn};
///
/// let re = Pattern::new((r"\d+", "g"))?;
/// assert_eq!(re.replace("a1b22c", "#")?, "a#b#c");
///
/// let replaced = re.replace("a1b22c", |m: &str, offset: usize| {
///     Ok::<_, BoxError>(format!("[{m}@{offset}]"))
/// })?;
/// assert_eq!(replaced, "a[1@1]b[22@3]c");
///
/// let replaced = re.replace("a1b22c", ReplaceFn(|m: &str, _: usize| m.len()))?;
/// assert_eq!(replaced, "a1b2c");
/// # Ok::<(), scanpat::Error>(())
/// ```
///
/// A failing closure fails the whole replace with
/// [`Error::Replacement`](crate::Error::Replacement).
pub trait Replacer {
    /// Append the replacement for `matched`, found at byte `offset`, to `dst`.
    fn replace_append(
        &mut self,
        matched: &str,
        offset: usize,
        dst: &mut String,
    ) -> Result<(), BoxError>;
}

impl Replacer for &str {
    fn replace_append(
        &mut self,
        _: &str,
        _: usize,
        dst: &mut String,
    ) -> Result<(), BoxError> {
        dst.push_str(self);
        Ok(())
    }
}

impl Replacer for String {
    fn replace_append(
        &mut self,
        matched: &str,
        offset: usize,
        dst: &mut String,
    ) -> Result<(), BoxError> {
        self.as_str().replace_append(matched, offset, dst)
    }
}

impl Replacer for &String {
    fn replace_append(
        &mut self,
        matched: &str,
        offset: usize,
        dst: &mut String,
    ) -> Result<(), BoxError> {
        self.as_str().replace_append(matched, offset, dst)
    }
}

impl Replacer for Cow<'_, str> {
    fn replace_append(
        &mut self,
        matched: &str,
        offset: usize,
        dst: &mut String,
    ) -> Result<(), BoxError> {
        self.as_ref().replace_append(matched, offset, dst)
    }
}

impl<F, T, E> Replacer for F
where
    F: FnMut(&str, usize) -> Result<T, E>,
    T: Display,
    E: Into<BoxError>,
{
    fn replace_append(
        &mut self,
        matched: &str,
        offset: usize,
        dst: &mut String,
    ) -> Result<(), BoxError> {
        let replacement = (self)(matched, offset).map_err(Into::into)?;
        write!(dst, "{replacement}")?;
        Ok(())
    }
}

/// A [`Replacer`] for closures that cannot fail.
#[derive(Clone, Copy, Debug)]
pub struct ReplaceFn<F>(pub F);

impl<F, T> Replacer for ReplaceFn<F>
where
    F: FnMut(&str, usize) -> T,
    T: Display,
{
    fn replace_append(
        &mut self,
        matched: &str,
        offset: usize,
        dst: &mut String,
    ) -> Result<(), BoxError> {
        let replacement = (self.0)(matched, offset);
        write!(dst, "{replacement}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::*;

    fn append(mut replacer: impl Replacer) -> Result<String, BoxError> {
        let mut dst = String::from(">");
        replacer.replace_append("ab", 3, &mut dst)?;
        Ok(dst)
    }

    #[test]
    fn literal() {
        assert_eq!(append("x").unwrap(), ">x");
        assert_eq!(append(String::from("y")).unwrap(), ">y");
        assert_eq!(append(&String::from("z")).unwrap(), ">z");
        assert_eq!(append(Cow::Borrowed("w")).unwrap(), ">w");
        assert_eq!(append("").unwrap(), ">");
    }

    #[test]
    fn closure() {
        let replaced = append(|m: &str, offset: usize| {
            Ok::<_, BoxError>(format!("{m}{offset}"))
        });
        assert_eq!(replaced.unwrap(), ">ab3");

        let replaced = append(|_: &str, offset: usize| {
            Ok::<_, std::num::ParseIntError>(offset * 2)
        });
        assert_eq!(replaced.unwrap(), ">6");

        let replaced = append(ReplaceFn(|m: &str, _: usize| m.to_uppercase()));
        assert_eq!(replaced.unwrap(), ">AB");
    }

    #[test]
    fn closure_error() {
        let err = append(|_: &str, _: usize| {
            Err::<String, _>("no replacement")
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "no replacement");
    }

    #[test]
    fn display_error() {
        struct Broken;
        impl Display for Broken {
            fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
                Err(fmt::Error)
            }
        }

        assert!(append(ReplaceFn(|_: &str, _: usize| Broken)).is_err());
    }

    #[test]
    fn stateful() {
        let mut count = 0;
        let mut counter = |_: &str, _: usize| {
            count += 1;
            Ok::<_, BoxError>(count)
        };
        let mut dst = String::new();
        counter.replace_append("a", 0, &mut dst).unwrap();
        counter.replace_append("b", 1, &mut dst).unwrap();
        assert_eq!(dst, "12");
    }
}
