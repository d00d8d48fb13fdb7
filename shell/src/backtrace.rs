//! Best-effort stack dump for the fatal paths.
//!
//! [dump_stack] reads the frame pointer register and prints the words above it as
//! `@ <address>: <value>` lines, the value being a possible return address. It runs
//! after something already went wrong, so none of the memory it reads is validated:
//! a corrupt stack gives garbage lines, not a second error.
//!
//! With frame pointers enabled the RISC-V calling convention stores the return
//! address at `fp - 1` word and the caller's frame pointer at `fp - 2` words.

use core::fmt::{self, Write};
use core::mem;
use core::ptr;

use crate::config::Walk;

pub const START_MARKER: &str = "=== stack start ===";
pub const END_MARKER: &str = "=== stack end ===";

/// One word read from the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    /// address the word was read from
    pub slot: usize,

    /// the word, interpreted as a return address
    pub ret: usize,
}

/// Fixed width hexadecimal address, `0x` and two digits per byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Addr(pub usize);

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#0width$x}", self.0, width = 2 + 2 * mem::size_of::<usize>())
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@ {}: {}", Addr(self.slot), Addr(self.ret))
    }
}

/// Reads `depth` consecutive words, starting one word below `fp`.
pub struct Scan {
    fp: *const usize,
    left: usize,
}

/// Follows the saved frame pointers for at most `depth` frames.
pub struct Chain {
    fp: *const usize,
    left: usize,
}

/// # Safety
///
/// Every word from `fp - 1` up to `fp + depth - 2` is read without any check. The
/// caller accepts whatever those reads do, on a faulting target that may be a trap.
pub unsafe fn scan(fp: *const usize, depth: usize) -> Scan {
    Scan { fp, left: depth }
}

/// # Safety
///
/// Each frame pointer found on the way is trusted as long as it is non-null and word
/// aligned, the words below it are read without any further check.
pub unsafe fn chain(fp: *const usize, depth: usize) -> Chain {
    Chain { fp, left: depth }
}

impl Iterator for Scan {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.left == 0 {
            return None;
        }
        self.left -= 1;

        let slot = self.fp.wrapping_sub(1);
        // SAFETY: unchecked, the caller of `scan` accepted that
        let ret = unsafe { ptr::read_volatile(slot) };
        self.fp = self.fp.wrapping_add(1);

        Some(Frame { slot: slot as usize, ret })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.left, Some(self.left))
    }
}

impl Iterator for Chain {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.left == 0 || self.fp.is_null() || !self.fp.is_aligned() {
            return None;
        }
        self.left -= 1;

        let slot = self.fp.wrapping_sub(1);
        // SAFETY: unchecked, the caller of `chain` accepted that
        let (ret, caller) = unsafe { (ptr::read_volatile(slot), ptr::read_volatile(self.fp.wrapping_sub(2))) };
        self.fp = caller as *const usize;

        Some(Frame { slot: slot as usize, ret })
    }
}

/// Prints `frames` between the start and end markers, one `\r\n` terminated line each.
pub fn write_frames<W, I>(out: &mut W, frames: I) -> fmt::Result
where
    W: Write + ?Sized,
    I: IntoIterator<Item = Frame>,
{
    write!(out, "{}\r\n", START_MARKER)?;
    for frame in frames {
        write!(out, "{}\r\n", frame)?;
    }
    write!(out, "{}\r\n", END_MARKER)
}

/// Value of the frame pointer register.
///
/// Architectures without a known frame pointer register get a null pointer, which
/// [Chain] treats as the end of the stack.
#[inline(always)]
pub fn frame_pointer() -> *const usize {
    let fp: *const usize;

    #[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
    unsafe {
        core::arch::asm!("mv {}, s0", out(reg) fp, options(nomem, nostack, preserves_flags));
    }

    #[cfg(target_arch = "x86_64")]
    unsafe {
        core::arch::asm!("mov {}, rbp", out(reg) fp, options(nomem, nostack, preserves_flags));
    }

    #[cfg(target_arch = "aarch64")]
    unsafe {
        core::arch::asm!("mov {}, x29", out(reg) fp, options(nomem, nostack, preserves_flags));
    }

    #[cfg(not(any(
        target_arch = "riscv32",
        target_arch = "riscv64",
        target_arch = "x86_64",
        target_arch = "aarch64"
    )))]
    {
        fp = ptr::null();
    }

    fp
}

/// Dumps the stack of the caller to `out`.
///
/// Never inlined: the frame pointer must be read first thing, in a frame of its own.
#[inline(never)]
pub fn dump_stack<W: Write + ?Sized>(out: &mut W, depth: usize, walk: Walk) -> fmt::Result {
    let fp = frame_pointer();
    debug!("dump_stack: frame pointer={=usize:#x}", fp as usize);

    // SAFETY: whatever the register holds is walked, garbage output is acceptable here
    match walk {
        Walk::Scan => write_frames(out, unsafe { scan(fp, depth) }),
        Walk::Chain => write_frames(out, unsafe { chain(fp, depth) }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::String;
    use std::vec::Vec;

    fn lines(out: &str) -> Vec<&str> {
        out.split("\r\n").filter(|line| !line.is_empty()).collect()
    }

    #[test]
    fn addresses_have_fixed_width() {
        let width = 2 + 2 * mem::size_of::<usize>();
        assert_eq!(Addr(0).to_string().len(), width);
        assert_eq!(Addr(usize::MAX).to_string().len(), width);
        assert!(Addr(0x2300_0010).to_string().ends_with("23000010"));
        assert!(Addr(0x2300_0010).to_string().starts_with("0x0"));
    }

    #[test]
    fn scan_reads_exactly_depth_words() {
        let stack: [usize; 130] = core::array::from_fn(|i| 0x2300_0000 + i);
        let fp = stack.as_ptr().wrapping_add(1);

        let frames: Vec<Frame> = unsafe { scan(fp, 128) }.collect();

        assert_eq!(frames.len(), 128);
        assert_eq!(frames[0], Frame { slot: stack.as_ptr() as usize, ret: 0x2300_0000 });
        assert_eq!(frames[127].slot, &stack[127] as *const usize as usize);
        assert_eq!(frames[127].ret, 0x2300_0000 + 127);
    }

    #[test]
    fn scan_does_not_stop_on_zero_words() {
        let stack = [0usize; 8];
        let fp = stack.as_ptr().wrapping_add(1);
        assert_eq!(unsafe { scan(fp, 7) }.count(), 7);
    }

    #[test]
    fn dump_has_depth_lines_between_markers() {
        let stack: [usize; 130] = core::array::from_fn(|i| i * 4);
        let fp = stack.as_ptr().wrapping_add(1);
        let mut out = String::new();

        write_frames(&mut out, unsafe { scan(fp, 128) }).unwrap();

        let lines = lines(&out);
        assert_eq!(lines.len(), 130);
        assert_eq!(lines[0], START_MARKER);
        assert_eq!(lines[129], END_MARKER);
        assert_eq!(lines[2], format!("@ {}: {}", Addr(&stack[1] as *const usize as usize), Addr(4)));
        assert!(lines[1..129].iter().all(|line| line.starts_with("@ 0x")));
    }

    #[test]
    fn chain_follows_saved_frame_pointers() {
        // two frames: [caller fp, ra] below each frame pointer, the outermost has fp 0
        // [_, inner: caller fp, inner: ra, _, outer: caller fp = 0, outer: ra]
        let mut stack = [0usize; 6];
        let base = stack.as_mut_ptr();
        let outer = base.wrapping_add(6) as usize;
        stack[5] = 0x2300_1000; // outer: ra
        stack[1] = outer; // inner: caller fp
        stack[2] = 0x2300_2000; // inner: ra
        let inner = base.wrapping_add(3) as *const usize;

        let frames: Vec<Frame> = unsafe { chain(inner, 128) }.collect();

        assert_eq!(frames.iter().map(|f| f.ret).collect::<Vec<_>>(), [0x2300_2000, 0x2300_1000]);
    }

    #[test]
    fn chain_is_bounded_and_stops_on_bad_pointers() {
        // a frame that points to itself loops until the bound
        let mut stack = [0usize; 3];
        let fp = stack.as_mut_ptr().wrapping_add(2);
        stack[0] = fp as usize;
        stack[1] = 0x42;
        assert_eq!(unsafe { chain(fp, 5) }.count(), 5);

        assert_eq!(unsafe { chain(ptr::null(), 5) }.count(), 0);
        let misaligned = (stack.as_ptr() as usize + 1) as *const usize;
        assert_eq!(unsafe { chain(misaligned, 5) }.count(), 0);
    }

    #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
    #[test]
    fn dump_of_the_live_stack() {
        let mut out = String::new();
        dump_stack(&mut out, 4, Walk::Scan).unwrap();

        let lines = lines(&out);
        assert_eq!(lines.len(), 6, "{out}");
        assert_eq!(lines[0], START_MARKER);
        assert!(lines[1..5].iter().all(|line| line.starts_with("@ 0x")), "{out}");
        assert_eq!(lines[5], END_MARKER);
    }

    #[test]
    fn empty_dump_still_has_markers() {
        let mut out = String::new();
        write_frames(&mut out, core::iter::empty()).unwrap();
        assert_eq!(out, "=== stack start ===\r\n=== stack end ===\r\n");
    }
}
