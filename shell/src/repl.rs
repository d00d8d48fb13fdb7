//! Multi-line command accumulation for the uLisp shell.
//!
//! The console front end hands over one tokenized line at a time. A line whose last
//! token is a single backslash is continued on the next line: its tokens are kept in
//! the [CommandBuffer] and nothing is evaluated. Any other line completes the command,
//! which is passed to the [Evaluator] once and the buffer starts over empty.
//!
//! ```text
//! # a ( + 1 \
//! # a 2 \
//! # a 3 )
//! ```
//! evaluates `( + 1 2 3 ) `.

use core::cell::RefCell;
use core::mem;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use heapless::{String, Vec};

/// Size of the command buffer, including the slot held back for the NUL terminator
pub const COMMAND_CAPACITY: usize = 1024;

/// Last token of a line that is continued on the next one
pub const CONTINUATION: &str = "\\";

/// Receives a finished command, e.g. the uLisp interpreter
pub trait Evaluator {
    fn evaluate(&mut self, command: &str);
}

impl<F> Evaluator for F
where
    F: FnMut(&str),
{
    fn evaluate(&mut self, command: &str) {
        self(command)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Append {
    Complete,

    /// only a prefix fitted into the buffer
    Truncated,
}

/// Bounded text buffer that always leaves room for a terminating NUL.
pub struct CommandBuffer<const N: usize> {
    text: String<N>,
}

impl<const N: usize> CommandBuffer<N> {
    /// usable bytes, one less than `N`
    pub const LIMIT: usize = N.saturating_sub(1);

    pub const fn new() -> Self {
        CommandBuffer { text: String::new() }
    }

    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn remaining(&self) -> usize {
        Self::LIMIT - self.text.len()
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Appends as much of `s` as fits, cutting on a char boundary.
    pub fn append(&mut self, s: &str) -> Append {
        let room = self.remaining();
        if s.len() <= room {
            // cannot fail, the length was checked against LIMIT < N
            let _ = self.text.push_str(s);
            return Append::Complete;
        }

        let mut cut = room;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        let _ = self.text.push_str(&s[..cut]);
        Append::Truncated
    }

    /// Moves the content out and leaves the buffer empty.
    pub fn take(&mut self) -> String<N> {
        mem::take(&mut self.text)
    }
}

impl<const N: usize> Default for CommandBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// NUL-terminated copy of `text`; the last byte is dropped if `text` fills all `N` bytes.
pub fn c_bytes<const N: usize>(text: &str) -> Vec<u8, N> {
    let end = text.len().min(N.saturating_sub(1));
    let mut bytes: Vec<u8, N> = Vec::new();
    let _ = bytes.extend_from_slice(&text.as_bytes()[..end]);
    let _ = bytes.push(0);
    bytes
}

/// Result of [Accumulator::feed]
#[derive(Debug, PartialEq, Eq)]
pub enum Feed<const N: usize> {
    /// the line ended with the continuation marker
    Pending,

    /// a complete command, the buffer has already been reset
    Ready { text: String<N>, truncated: bool },
}

/// Result of [Accumulator::accept_line]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Accepted {
    Pending,
    Dispatched { truncated: bool },
}

pub struct Accumulator<const N: usize = COMMAND_CAPACITY> {
    buffer: CommandBuffer<N>,

    /// sticky until the command is dispatched
    truncated: bool,
}

impl<const N: usize> Accumulator<N> {
    pub const fn new() -> Self {
        Accumulator {
            buffer: CommandBuffer::new(),
            truncated: false,
        }
    }

    pub fn buffer(&self) -> &CommandBuffer<N> {
        &self.buffer
    }

    /// a continued command is waiting for more lines
    pub fn pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Drops a half-typed command.
    pub fn discard(&mut self) {
        self.buffer.clear();
        self.truncated = false;
    }

    /// Accumulates one line without evaluating it.
    ///
    /// # Panics
    ///
    /// If `tokens` is empty. The console front end always supplies at least one token,
    /// anything else is a bug in the caller.
    pub fn feed(&mut self, tokens: &[&str]) -> Feed<N> {
        let Some((last, init)) = tokens.split_last() else {
            panic!("accept_line: no tokens");
        };

        let (body, continued) = if *last == CONTINUATION {
            (init, true)
        } else {
            (tokens, false)
        };

        // nothing after a cut, a short piece could still fit behind a multi-byte char
        'tokens: for token in body {
            for piece in [until_nul(token), " "] {
                if self.truncated {
                    break 'tokens;
                }
                if self.buffer.append(piece) == Append::Truncated {
                    self.truncated = true;
                }
            }
        }

        if continued {
            trace!("continued, {} bytes buffered", self.buffer.len());
            return Feed::Pending;
        }

        if self.truncated {
            warn!("command truncated to {} bytes", self.buffer.len());
        }
        Feed::Ready {
            truncated: mem::take(&mut self.truncated),
            text: self.buffer.take(),
        }
    }

    /// Accumulates one line and evaluates the command once it is complete.
    pub fn accept_line<E: Evaluator + ?Sized>(&mut self, tokens: &[&str], evaluator: &mut E) -> Accepted {
        match self.feed(tokens) {
            Feed::Pending => Accepted::Pending,
            Feed::Ready { text, truncated } => {
                evaluator.evaluate(&text);
                Accepted::Dispatched { truncated }
            }
        }
    }
}

impl<const N: usize> Default for Accumulator<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// A token ends at its first NUL, like the C string it is handed on as.
fn until_nul(token: &str) -> &str {
    match token.find('\0') {
        Some(end) => &token[..end],
        None => token,
    }
}

/// [Accumulator] that can be placed in a `static`.
///
/// The line is accumulated inside a critical section. The evaluator runs after the
/// section is left, on a copy of the command, so a long running evaluation never
/// holds the lock.
pub struct SharedAccumulator<const N: usize = COMMAND_CAPACITY> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Accumulator<N>>>,
}

impl<const N: usize> SharedAccumulator<N> {
    pub const fn new() -> Self {
        SharedAccumulator {
            inner: Mutex::new(RefCell::new(Accumulator::new())),
        }
    }

    pub fn accept_line<E: Evaluator + ?Sized>(&self, tokens: &[&str], evaluator: &mut E) -> Accepted {
        let fed = self.inner.lock(|acc| acc.borrow_mut().feed(tokens));
        match fed {
            Feed::Pending => Accepted::Pending,
            Feed::Ready { text, truncated } => {
                evaluator.evaluate(&text);
                Accepted::Dispatched { truncated }
            }
        }
    }

    pub fn pending(&self) -> bool {
        self.inner.lock(|acc| acc.borrow().pending())
    }

    pub fn discard(&self) {
        self.inner.lock(|acc| acc.borrow_mut().discard())
    }
}

impl<const N: usize> Default for SharedAccumulator<N> {
    fn default() -> Self {
        Self::new()
    }
}
