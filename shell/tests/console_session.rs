//! Console lines as the SDK front end delivers them, through argument decoding,
//! command parsing and the accumulator.

use ulisp_shell::args;
use ulisp_shell::cmd::{self, Command};
use ulisp_shell::repl::{Accepted, Accumulator, COMMAND_CAPACITY};

/// Splits a console line the way the SDK's front end does.
fn argv(line: &str) -> Vec<Option<&[u8]>> {
    line.split_whitespace().map(|arg| Some(arg.as_bytes())).collect()
}

struct Session {
    shell: Accumulator,
    evaluated: Vec<String>,
}

impl Session {
    fn new() -> Self {
        Session {
            shell: Accumulator::new(),
            evaluated: Vec::new(),
        }
    }

    fn type_line(&mut self, line: &str) -> Accepted {
        let args = args::collect(argv(line)).expect("valid console line");
        match cmd::parse(&args) {
            Ok(Command::Lisp(tokens)) => {
                let evaluated = &mut self.evaluated;
                self.shell.accept_line(tokens, &mut |command: &str| evaluated.push(command.to_string()))
            }
            Ok(Command::Cancel) => {
                self.shell.discard();
                // nothing evaluated
                Accepted::Pending
            }
            other => panic!("not a lisp line: {:?}", other),
        }
    }
}

#[test]
fn three_line_expression() {
    let mut session = Session::new();

    assert_eq!(session.type_line("a ( + 1 \\"), Accepted::Pending);
    assert_eq!(session.type_line("a 2 \\"), Accepted::Pending);
    assert!(session.evaluated.is_empty());

    assert_eq!(session.type_line("a 3 )"), Accepted::Dispatched { truncated: false });
    assert_eq!(session.evaluated, ["( + 1 2 3 ) "]);
    assert!(!session.shell.pending());
}

#[test]
fn commands_after_each_other() {
    let mut session = Session::new();

    session.type_line("a ( pinmode 11 :output )");
    session.type_line("a ( loop \\");
    session.type_line("a ( digitalwrite 11 :high ) \\");
    session.type_line("a ( delay 1000 ) )");

    assert_eq!(
        session.evaluated,
        [
            "( pinmode 11 :output ) ",
            "( loop ( digitalwrite 11 :high ) ( delay 1000 ) ) ",
        ]
    );
}

#[test]
fn cancel_drops_the_continued_command() {
    let mut session = Session::new();

    session.type_line("a ( loop \\");
    session.type_line("a ( digitalwrite 11 :high ) \\");
    assert!(session.shell.pending());

    session.type_line("a_cancel");
    assert!(!session.shell.pending());
    assert!(session.evaluated.is_empty());

    assert_eq!(session.type_line("a ( print 1 )"), Accepted::Dispatched { truncated: false });
    assert_eq!(session.evaluated, ["( print 1 ) "]);
}

#[test]
fn long_continuation_is_truncated_at_capacity() {
    let mut session = Session::new();
    // 13 tokens per line, 10 bytes each including the separator
    let line = format!("a {} \\", ["abcdefghi"; 13].join(" "));

    let mut lines = 0;
    while session.shell.buffer().remaining() > 0 {
        assert_eq!(session.type_line(&line), Accepted::Pending);
        lines += 1;
    }
    assert_eq!(lines, 8);
    assert_eq!(session.shell.buffer().len(), COMMAND_CAPACITY - 1);

    assert_eq!(session.type_line("a )"), Accepted::Dispatched { truncated: true });
    let command = &session.evaluated[0];
    assert_eq!(command.len(), COMMAND_CAPACITY - 1);
    assert!(command.starts_with("abcdefghi abcdefghi "));
}
