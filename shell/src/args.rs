//! Decoding of the `argv` array handed over by the SDK's command-line front end.
//!
//! The unsafe pointer walk lives in the firmware; this module only sees the
//! entries as optional byte slices, `None` standing for a null pointer.

use heapless::Vec;

/// Upper bound of arguments per console line, including the command name
pub const MAX_ARGS: usize = 16;

pub type Args<'a> = Vec<&'a str, MAX_ARGS>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArgError {
    #[error("no arguments")]
    Empty,

    #[error("argument {0} is a null pointer")]
    Null(usize),

    #[error("argument {0} is not valid utf-8")]
    Utf8(usize),

    #[error("too many arguments")]
    TooMany,
}

pub fn collect<'a, I>(raw: I) -> Result<Args<'a>, ArgError>
where
    I: IntoIterator<Item = Option<&'a [u8]>>,
{
    let mut args = Args::new();
    for (index, entry) in raw.into_iter().enumerate() {
        let bytes = entry.ok_or(ArgError::Null(index))?;
        let arg = core::str::from_utf8(bytes).map_err(|_| ArgError::Utf8(index))?;
        args.push(arg).map_err(|_| ArgError::TooMany)?;
    }

    if args.is_empty() {
        return Err(ArgError::Empty);
    }
    Ok(args)
}
