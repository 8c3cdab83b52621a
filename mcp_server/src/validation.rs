//! Required-argument validation shared by every tool and prompt.

use crate::error::HandlerError;

/// How a blank required argument is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phrasing {
    /// `argument '<field>' cannot be empty` (prompts and the deploy tool)
    Quoted,
    /// `<field> argument cannot be empty` (command-backed tools)
    Suffix,
}

pub(crate) fn missing_message(field: &str, phrasing: &Phrasing) -> String {
    match phrasing {
        Phrasing::Quoted => format!("argument '{}' cannot be empty", field),
        Phrasing::Suffix => format!("{} argument cannot be empty", field),
    }
}

/// Fails on the first `(name, value)` pair whose value is empty or
/// whitespace-only. Pairs are checked in the order given.
pub fn require_non_blank<'a, I>(fields: I, phrasing: Phrasing) -> Result<(), HandlerError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    match fields
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
    {
        Some((name, _)) => Err(HandlerError::missing(name, phrasing)),
        None => Ok(()),
    }
}
