//! The debugger's request/response/event wire types (spec.md §4.5, §4.6).
//!
//! Requests are line-framed text: a command name (two-letter aliases as
//! well as full names, following `Commands.py`'s `TEXT_TO_COMMAND` table)
//! followed by whitespace-separated arguments, strings optionally quoted
//! (`RequestLexer.py`/`RequestParser.py`). Responses and events are
//! tagged JSON records (`DataStructures.py`'s `serialize()`), with `type`
//! naming the record kind and `body` carrying its fields.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{DebuggerError, DebuggerResult};

/// One command the debugger understands, named after `Commands.py`'s
/// `Command` enum. `BreakExpr` is this crate's addition: the original's
/// `break`/`clear` pair never carried a condition argument in the request
/// grammar even though `set_breakpoint` accepts one, so conditional
/// breakpoints get their own command here instead of overloading `break`'s
/// arity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Help,
    File,
    BpLines,
    Run,
    RunNoDebug,
    Restart,
    Stop,
    Exit,
    Continue,
    StepInto,
    StepOver,
    Pause,
    Stack,
    Frame,
    Break,
    BreakExpr,
    Clear,
}

impl Command {
    pub fn from_text(word: &str) -> Option<Command> {
        Some(match word {
            "h" | "help" => Command::Help,
            "f" | "file" => Command::File,
            "get_bp_lines" => Command::BpLines,
            "r" | "run" => Command::Run,
            "run_no_debug" => Command::RunNoDebug,
            "restart" => Command::Restart,
            "stop" => Command::Stop,
            "exit" => Command::Exit,
            "c" | "continue" => Command::Continue,
            "step_into" => Command::StepInto,
            "s" | "step_over" => Command::StepOver,
            "pause" => Command::Pause,
            "stack" => Command::Stack,
            "frame" => Command::Frame,
            "b" | "break" => Command::Break,
            "break_expr" => Command::BreakExpr,
            "clear" => Command::Clear,
            _ => return None,
        })
    }

    /// Commands taking no arguments (`Commands.py`'s `ZERO_ARG_COMMANDS`).
    pub fn is_zero_arg(self) -> bool {
        matches!(
            self,
            Command::Help
                | Command::BpLines
                | Command::Run
                | Command::RunNoDebug
                | Command::Restart
                | Command::Stop
                | Command::Exit
                | Command::Continue
                | Command::StepInto
                | Command::StepOver
                | Command::Pause
                | Command::Stack
        )
    }

    /// One-line usage string, as returned by the `help` command
    /// (`TutelDebuggerInteractive.py`'s `HELP` dict).
    pub fn usage(self) -> &'static str {
        match self {
            Command::Help => "h(elp) - Display this help message.",
            Command::File => "f(ile) filename - Import Tutel source code.",
            Command::BpLines => "get_bp_lines - Display lines at which breakpoints can be set.",
            Command::Run => "r(un) - Start debugging of Tutel code.",
            Command::RunNoDebug => "run_no_debug - Start execution of Tutel code without debugging.",
            Command::Restart => "restart - Restart execution of Tutel code from beginning.",
            Command::Stop => "stop - Stop execution of Tutel code.",
            Command::Exit => "exit - Exit debugger.",
            Command::Continue => "c(ontinue) - Continue execution.",
            Command::StepInto => "step_into - Execute next line, descending into calls.",
            Command::StepOver => "s(tep_over) - Execute next line of the currently executed function.",
            Command::Pause => "pause - Break at the next executed line.",
            Command::Stack => "stack - Display call stack.",
            Command::Frame => "frame number - Display selected stack frame.",
            Command::Break => {
                "b(reak) file - Display list of set breakpoints for given file.\n\
                 \tb(reak) file line - Set breakpoint for given file."
            }
            Command::BreakExpr => "break_expr file line expr - Set a conditional breakpoint for given file.",
            Command::Clear => {
                "clear file - Clear all breakpoints for given file.\n\
                 \tclear file line - Remove breakpoint for given file."
            }
        }
    }
}

/// The full `help` response body (`get_help_message` in
/// `TutelDebuggerInteractive.py`).
pub fn help_text() -> String {
    const ORDER: &[Command] = &[
        Command::Help,
        Command::File,
        Command::Run,
        Command::RunNoDebug,
        Command::Restart,
        Command::Stop,
        Command::Exit,
        Command::Continue,
        Command::StepInto,
        Command::StepOver,
        Command::Pause,
        Command::Stack,
        Command::Frame,
        Command::Break,
        Command::BreakExpr,
        Command::Clear,
        Command::BpLines,
    ];
    let mut out = String::from("Available commands:");
    for cmd in ORDER {
        out.push_str("\n\t");
        out.push_str(cmd.usage());
    }
    out
}

#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Word(String),
    Number(i64),
    Text(String),
}

impl Arg {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Word(s) | Arg::Text(s) => Some(s),
            Arg::Number(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Arg::Number(n) => Some(*n),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DebuggerRequest {
    pub command: Command,
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone, PartialEq)]
enum ReqTok {
    Word(String),
    Number(i64),
    Text(String),
    Etx,
}

/// Tokenizes one request line (`RequestLexer.py`): whitespace-separated
/// words and decimal numbers, plus `'...'`/`"..."` quoted text.
struct ReqLexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> ReqLexer<'a> {
    fn new(source: &'a str) -> Self {
        Self { chars: source.chars().peekable() }
    }

    fn next_token(&mut self) -> ReqTok {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
        match self.chars.peek().copied() {
            None => ReqTok::Etx,
            Some(quote @ ('"' | '\'')) => {
                self.chars.next();
                let mut text = String::new();
                for c in self.chars.by_ref() {
                    if c == quote {
                        break;
                    }
                    text.push(c);
                }
                ReqTok::Text(text)
            }
            Some(c) if c.is_ascii_digit() => {
                let mut value: i64 = 0;
                while let Some(c) = self.chars.peek().copied() {
                    if !c.is_ascii_digit() {
                        break;
                    }
                    value = value * 10 + i64::from(c as u8 - b'0');
                    self.chars.next();
                }
                ReqTok::Number(value)
            }
            Some(_) => {
                let mut word = String::new();
                while let Some(c) = self.chars.peek().copied() {
                    if c.is_whitespace() {
                        break;
                    }
                    word.push(c);
                    self.chars.next();
                }
                ReqTok::Word(word)
            }
        }
    }
}

/// Parses one request line (`RequestParser.py::parse`). `break`/`clear`
/// take a file and an optional line; `break_expr` and `file`/`frame`
/// always require their one argument; every other catalogued command
/// takes none.
pub fn parse_request(line: &str) -> DebuggerResult<DebuggerRequest> {
    let mut lexer = ReqLexer::new(line);
    let word = match lexer.next_token() {
        ReqTok::Word(word) => word,
        _ => return Err(DebuggerError::UnknownCommand),
    };
    let Some(command) = Command::from_text(&word) else {
        return Err(DebuggerError::UnknownCommand);
    };

    let args = if command.is_zero_arg() {
        Vec::new()
    } else {
        match command {
            Command::File => vec![expect_word(&mut lexer, command)?],
            Command::Frame => vec![expect_number(&mut lexer, command)?],
            Command::Break | Command::Clear => {
                let file = expect_word(&mut lexer, command)?;
                match lexer.next_token() {
                    ReqTok::Number(n) => vec![file, Arg::Number(n)],
                    ReqTok::Etx => vec![file],
                    _ => return Err(DebuggerError::InvalidArgs { usage: command.usage() }),
                }
            }
            Command::BreakExpr => {
                let file = expect_word(&mut lexer, command)?;
                let line = expect_number(&mut lexer, command)?;
                let expr = match lexer.next_token() {
                    ReqTok::Text(s) | ReqTok::Word(s) => Arg::Text(s),
                    _ => return Err(DebuggerError::InvalidArgs { usage: command.usage() }),
                };
                vec![file, line, expr]
            }
            _ => unreachable!("every non-zero-arg command is handled above"),
        }
    };

    if !matches!(lexer.next_token(), ReqTok::Etx) {
        return Err(DebuggerError::CommandNotEndedProperly);
    }

    Ok(DebuggerRequest { command, args })
}

fn expect_word(lexer: &mut ReqLexer<'_>, command: Command) -> DebuggerResult<Arg> {
    match lexer.next_token() {
        ReqTok::Word(word) => Ok(Arg::Word(word)),
        _ => Err(DebuggerError::InvalidArgs { usage: command.usage() }),
    }
}

fn expect_number(lexer: &mut ReqLexer<'_>, command: Command) -> DebuggerResult<Arg> {
    match lexer.next_token() {
        ReqTok::Number(n) => Ok(Arg::Number(n)),
        _ => Err(DebuggerError::InvalidArgs { usage: command.usage() }),
    }
}

/// A snapshot of one call-stack frame, rendered for the wire.
#[derive(Clone, Debug, Serialize)]
pub struct FrameInfo {
    pub function_name: String,
    pub line: u32,
    pub frame_index: u64,
    pub locals: BTreeMap<String, String>,
}

impl FrameInfo {
    pub fn from_frame(frame: &tutel_interp::StackFrame) -> Self {
        let locals = frame
            .locals
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), value.display()))
            .collect();
        FrameInfo {
            function_name: frame.function_name.as_str().to_string(),
            line: frame.current_line,
            frame_index: frame.frame_index,
            locals,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct BreakpointInfo {
    pub line: u32,
    pub condition: Option<String>,
}

/// A solicited reply to one request. `type`/`body` tagging matches
/// spec.md §6's response catalogue exactly.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum Response {
    FileSet { file: String },
    Started,
    Resumed,
    Frame(FrameInfo),
    StackTrace { frames: Vec<FrameInfo> },
    Breakpoints { file: String, lines: Vec<BreakpointInfo> },
    BreakpointSet { file: String, line: u32 },
    BreakpointRemoved { file: String, line: u32 },
    AllBreakpointsRemoved { file: String },
    BpLines { file: String, lines: Vec<u32> },
    Help { text: String },
    Message { text: String },
    BadRequest { message: String },
}

/// An unsolicited event, emitted while the worker runs or stops.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum Event {
    Started,
    Resumed,
    Breakpoint { frame: FrameInfo },
    StepInto { frame: FrameInfo },
    StepOver { frame: FrameInfo },
    Pause { frame: FrameInfo },
    PostMortem { message: String, traceback: String },
    End,
    Exit,
}

/// Renders spec.md §7's stack-trace format: `"Traceback (most recent call
/// last):\n"` followed by one indented `"Function <name>, line <line>"`
/// per frame, outermost first, innermost last.
pub fn render_traceback(frames: &[(String, u32)]) -> String {
    let mut out = String::from("Traceback (most recent call last):\n");
    for (name, line) in frames {
        out.push_str(&format!("  Function {name}, line {line}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_letter_aliases_resolve_to_full_commands() {
        assert_eq!(Command::from_text("r"), Some(Command::Run));
        assert_eq!(Command::from_text("c"), Some(Command::Continue));
        assert_eq!(Command::from_text("s"), Some(Command::StepOver));
        assert_eq!(Command::from_text("b"), Some(Command::Break));
        assert_eq!(Command::from_text("h"), Some(Command::Help));
    }

    #[test]
    fn parses_zero_arg_command() {
        let request = parse_request("continue").unwrap();
        assert_eq!(request.command, Command::Continue);
        assert!(request.args.is_empty());
    }

    #[test]
    fn parses_break_with_file_and_line() {
        let request = parse_request("break main.tutel 3").unwrap();
        assert_eq!(request.command, Command::Break);
        assert_eq!(request.args, vec![Arg::Word("main.tutel".to_string()), Arg::Number(3)]);
    }

    #[test]
    fn parses_break_with_file_only() {
        let request = parse_request("b main.tutel").unwrap();
        assert_eq!(request.command, Command::Break);
        assert_eq!(request.args, vec![Arg::Word("main.tutel".to_string())]);
    }

    #[test]
    fn parses_break_expr_with_quoted_condition() {
        let request = parse_request("break_expr main.tutel 5 \"x > 0\"").unwrap();
        assert_eq!(request.command, Command::BreakExpr);
        assert_eq!(
            request.args,
            vec![
                Arg::Word("main.tutel".to_string()),
                Arg::Number(5),
                Arg::Text("x > 0".to_string()),
            ]
        );
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(matches!(parse_request("frobnicate"), Err(DebuggerError::UnknownCommand)));
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        assert!(matches!(
            parse_request("continue now"),
            Err(DebuggerError::CommandNotEndedProperly)
        ));
    }

    #[test]
    fn response_serializes_with_tagged_envelope() {
        let response = Response::BreakpointSet { file: "main.tutel".to_string(), line: 3 };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"type":"breakpoint_set","body":{"file":"main.tutel","line":3}}"#);
    }
}
