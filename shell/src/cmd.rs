//! The Rust side of the command-line interface: the [Command] enum, the parsing method
//! [parse] and the [COMMANDS] table used for the help text.
//!
//! Supports feeding uLisp lines (`a`), dropping a half-typed one (`a_cancel`), blinking
//! the LED and dumping the stack.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command<'a> {
    /// one line of uLisp tokens, the command name stripped
    Lisp(&'a [&'a str]),

    /// drops the continued uLisp command
    Cancel,

    /// toggles the board LED
    Blinky,

    /// prints the raw stack above the caller
    DumpStack,

    /// lists [COMMANDS]
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError<'a> {
    #[error("empty command line")]
    Empty,

    #[error("{0}: command unknown")]
    Unknown(&'a str),

    #[error("{0}: missing arguments")]
    MissingArguments(&'a str),
}

pub struct CommandInfo {
    pub name: &'static str,
    pub help: &'static str,
}

pub const COMMANDS: &[CommandInfo] = &[
    CommandInfo { name: "a", help: "Run the uLisp command" },
    CommandInfo { name: "a_cancel", help: "Drop the continued uLisp command" },
    CommandInfo { name: "blinky", help: "Blink the LED" },
    CommandInfo { name: "dump_stack", help: "Dump the current stack" },
    CommandInfo { name: "rust_help", help: "List the Rust commands" },
];

/// Maps a tokenized console line to a [Command], `args[0]` being the command name.
pub fn parse<'a>(args: &'a [&'a str]) -> Result<Command<'a>, CommandError<'a>> {
    let (name, rest) = args.split_first().ok_or(CommandError::Empty)?;

    match *name {
        "a" => {
            if rest.is_empty() {
                Err(CommandError::MissingArguments(*name))
            } else {
                Ok(Command::Lisp(rest))
            }
        }
        "a_cancel" => Ok(Command::Cancel),
        "blinky" => Ok(Command::Blinky),
        "dump_stack" => Ok(Command::DumpStack),
        "rust_help" => Ok(Command::Help),
        other => Err(CommandError::Unknown(other)),
    }
}
