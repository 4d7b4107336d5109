//! The debugger driver: orchestrates interpreter execution on a worker
//! thread while this struct's methods, invoked from the request-handling
//! thread, service commands (spec.md §4.5).
//!
//! Grounded in `TutelDebugger.py` (`check_line`, `_break`,
//! `set_breakpoint`, `stack`, `frame`) and `TutelDebuggerInteractive.py`
//! (`do_run`, `do_continue`, `do_step`/`do_next`, `do_restart`,
//! `do_stop`/`do_exit`). The Python original hands the interpreter a bound
//! method as `debug_callback` and blocks the single process thread on a
//! `threading.Event`; here the worker is a genuine OS thread, so the
//! hand-off uses a `parking_lot` mutex/condvar resume gate (spec.md §9's
//! committed redesign) instead of Python's GIL-backed busy-wait.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};
use tracing::warn;

use tutel_interp::{CallStack, GuiMock, InterpError, Interpreter};
use tutel_par::ast::Expr;
use tutel_par::Parser;

use crate::breakpoints::FileState;
use crate::condeval;
use crate::error::{DebuggerError, DebuggerResult};
use crate::protocol::{Arg, Command, DebuggerRequest, Event, FrameInfo, Response};

/// A manual-reset gate: the worker blocks in [`ResumeGate::wait`] until a
/// command thread calls [`ResumeGate::resume`] (`resume_event` in the
/// original).
#[derive(Default)]
struct ResumeGate {
    state: Mutex<bool>,
    condvar: Condvar,
}

impl ResumeGate {
    fn wait(&self) {
        let mut resume = self.state.lock();
        while !*resume {
            self.condvar.wait(&mut resume);
        }
        *resume = false;
    }

    fn resume(&self) {
        *self.state.lock() = true;
        self.condvar.notify_one();
    }
}

enum StopKind {
    Breakpoint,
    StepInto,
    StepOver,
    Pause,
}

impl StopKind {
    fn into_event(self, frame: FrameInfo) -> Event {
        match self {
            StopKind::Breakpoint => Event::Breakpoint { frame },
            StopKind::StepInto => Event::StepInto { frame },
            StopKind::StepOver => Event::StepOver { frame },
            StopKind::Pause => Event::Pause { frame },
        }
    }
}

/// The mutable state the line hook consults on every statement and the
/// driver writes between commands (spec.md §4.5's "only the debugger
/// driver writes breakpoints, `*_mode`, and `watched_frame_index`").
struct HookState {
    bp_possible_lines: Vec<u32>,
    breakpoints: BTreeMap<u32, Option<Expr>>,
    step_into: bool,
    step_over: bool,
    pause: bool,
    watched_frame: Option<u64>,
    /// The call stack as of the most recent stop, innermost-last
    /// (`CallStack::frames`'s ordering), used to answer `stack`/`frame`
    /// and to learn the watched frame for `step_over`.
    last_stack: Vec<FrameInfo>,
}

impl HookState {
    fn frame_from_top(&self, i: usize) -> Option<&FrameInfo> {
        let len = self.last_stack.len();
        if i >= len {
            None
        } else {
            self.last_stack.get(len - 1 - i)
        }
    }
}

struct Shared {
    hook: Mutex<HookState>,
    gate: ResumeGate,
}

/// Builds the interpreter's `debug_callback` closure: steps 2-6 of
/// spec.md §4.5's line hook algorithm (step 1, the cooperative-stop
/// check, is already implemented by `tutel_interp::Interpreter::line_hook`
/// itself).
fn make_hook(shared: Arc<Shared>, sink: Arc<dyn Fn(Event) + Send + Sync>) -> impl FnMut(&CallStack) + Send {
    move |call_stack: &CallStack| {
        let Some(frame) = call_stack.current() else { return };
        let line = frame.current_line;
        let frame_index = frame.frame_index;

        let mut state = shared.hook.lock();
        let stop_kind = if state.pause {
            state.pause = false;
            Some(StopKind::Pause)
        } else if state.step_into && state.bp_possible_lines.binary_search(&line).is_ok() {
            state.step_into = false;
            Some(StopKind::StepInto)
        } else if state.step_over && state.watched_frame.is_some_and(|watched| frame_index <= watched) {
            state.step_over = false;
            state.watched_frame = None;
            Some(StopKind::StepOver)
        } else if let Some(condition) = state.breakpoints.get(&line) {
            match condition {
                None => Some(StopKind::Breakpoint),
                Some(expr) => match condeval::eval_condition(expr, &frame.locals) {
                    Ok(true) => Some(StopKind::Breakpoint),
                    Ok(false) => None,
                    Err(error) => {
                        warn!(%error, line, "breakpoint condition failed to evaluate");
                        None
                    }
                },
            }
        } else {
            None
        };
        drop(state);

        if let Some(kind) = stop_kind {
            let frames: Vec<FrameInfo> = call_stack.frames().iter().map(FrameInfo::from_frame).collect();
            let current = frames.last().cloned().expect("hook only fires with a current frame");
            shared.hook.lock().last_stack = frames;
            sink(kind.into_event(current));
            shared.gate.wait();
        }
    }
}

/// Orchestrates one debugging session: at most one program runs at a
/// time, but breakpoints persist per file across runs and restarts.
pub struct Debugger {
    files: HashMap<String, FileState>,
    current_file: Option<String>,
    shared: Option<Arc<Shared>>,
    worker: Option<JoinHandle<()>>,
    stop_handle: Option<Arc<AtomicBool>>,
    active: Arc<AtomicBool>,
    event_sink: Arc<dyn Fn(Event) + Send + Sync>,
}

impl Debugger {
    pub fn new(event_sink: Arc<dyn Fn(Event) + Send + Sync>) -> Self {
        Self {
            files: HashMap::new(),
            current_file: None,
            shared: None,
            worker: None,
            stop_handle: None,
            active: Arc::new(AtomicBool::new(false)),
            event_sink,
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Loads source text for `path` directly, bypassing disk I/O
    /// (`do_file`'s body minus the `open()` call): used both by the
    /// `file` command and directly by tests.
    pub fn load_source(&mut self, path: String, source: String) {
        match self.files.get_mut(&path) {
            Some(existing) => existing.reload(source),
            None => {
                self.files.insert(path.clone(), FileState::new(source));
            }
        }
        self.current_file = Some(path);
    }

    pub fn handle_request(&mut self, request: DebuggerRequest) -> Response {
        match self.dispatch(request) {
            Ok(response) => response,
            Err(error) => Response::BadRequest { message: error.to_string() },
        }
    }

    fn dispatch(&mut self, request: DebuggerRequest) -> DebuggerResult<Response> {
        match request.command {
            Command::Help => Ok(Response::Help { text: crate::protocol::help_text() }),
            Command::File => self.do_file(word_arg(&request, 0)?.to_string()),
            Command::BpLines => self.do_get_bp_lines(),
            Command::Run => self.do_run(true),
            Command::RunNoDebug => self.do_run(false),
            Command::Restart => self.do_restart(),
            Command::Stop => self.do_stop(),
            Command::Exit => self.do_exit(),
            Command::Continue => self.do_continue(),
            Command::StepInto => self.do_step_into(),
            Command::StepOver => self.do_step_over(),
            Command::Pause => self.do_pause(),
            Command::Stack => self.do_stack(),
            Command::Frame => self.do_frame(number_arg(&request, 0)? as usize),
            Command::Break => self.do_break(&request),
            Command::BreakExpr => self.do_break_expr(&request),
            Command::Clear => self.do_clear(&request),
        }
    }

    fn do_file(&mut self, path: String) -> DebuggerResult<Response> {
        let source = std::fs::read_to_string(&path)?;
        self.load_source(path.clone(), source);
        Ok(Response::FileSet { file: path })
    }

    fn current_file_state(&self) -> DebuggerResult<&FileState> {
        let path = self.current_file.as_ref().ok_or(DebuggerError::NoFileLoaded)?;
        self.files.get(path).ok_or(DebuggerError::NoFileLoaded)
    }

    fn do_get_bp_lines(&self) -> DebuggerResult<Response> {
        let file = self.current_file.clone().ok_or(DebuggerError::NoFileLoaded)?;
        let state = self.current_file_state()?;
        let mut lines = state.bp_possible_lines().to_vec();
        lines.sort_unstable();
        Ok(Response::BpLines { file, lines })
    }

    fn do_run(&mut self, debug: bool) -> DebuggerResult<Response> {
        if self.is_running() {
            return Ok(Response::Message {
                text: "Program is already running, use command `restart` to restart it.".to_string(),
            });
        }
        self.start_worker(debug)
    }

    fn start_worker(&mut self, debug: bool) -> DebuggerResult<Response> {
        let path = self.current_file.clone().ok_or(DebuggerError::NoFileLoaded)?;
        let state = self.files.get(&path).ok_or(DebuggerError::NoFileLoaded)?;
        let program = Parser::new(&state.source)?.parse()?;

        let hook_state = HookState {
            bp_possible_lines: state.bp_possible_lines().to_vec(),
            breakpoints: state.breakpoint_conditions(),
            step_into: false,
            step_over: false,
            pause: false,
            watched_frame: None,
            last_stack: Vec::new(),
        };
        let shared = Arc::new(Shared { hook: Mutex::new(hook_state), gate: ResumeGate::default() });
        self.shared = Some(Arc::clone(&shared));

        let sink = Arc::clone(&self.event_sink);
        let active = Arc::clone(&self.active);
        active.store(true, Ordering::SeqCst);

        let (handle_tx, handle_rx) = crossbeam::channel::bounded(1);
        let worker = std::thread::Builder::new()
            .name("tutel-debugger-worker".to_string())
            .spawn(move || {
                let mut interp = Interpreter::new(Arc::new(GuiMock));
                if debug {
                    interp.set_debug_callback(Box::new(make_hook(shared, Arc::clone(&sink))));
                }
                let _ = handle_tx.send(interp.stop_handle());
                sink(Event::Started);
                match interp.execute(program, Some("main")) {
                    Ok(_) | Err(InterpError::Stop) => sink(Event::End),
                    Err(error) => {
                        let trace = interp
                            .take_captured_trace()
                            .unwrap_or_default()
                            .into_iter()
                            .map(|(name, line)| (name.as_str().to_string(), line))
                            .collect::<Vec<_>>();
                        sink(Event::PostMortem {
                            message: error.to_string(),
                            traceback: crate::protocol::render_traceback(&trace),
                        });
                    }
                }
                active.store(false, Ordering::SeqCst);
            })
            .expect("failed to spawn debugger worker thread");

        let stop_handle = handle_rx.recv().expect("worker exited before publishing its stop handle");
        self.stop_handle = Some(stop_handle);
        self.worker = Some(worker);
        Ok(Response::Started)
    }

    fn do_restart(&mut self) -> DebuggerResult<Response> {
        if !self.is_running() {
            return Ok(Response::Message {
                text: "Program is not running, use command `r(un)` to run it.".to_string(),
            });
        }
        self.stop_and_join();
        self.start_worker(true)
    }

    fn do_stop(&mut self) -> DebuggerResult<Response> {
        if !self.is_running() {
            return Ok(Response::Message {
                text: "Program is not running, use command `r(un)` to run it.".to_string(),
            });
        }
        self.stop_and_join();
        Ok(Response::Message {
            text: "Stopping program. Debugger is still running, use command `exit` to stop it.".to_string(),
        })
    }

    fn do_exit(&mut self) -> DebuggerResult<Response> {
        if self.is_running() {
            self.stop_and_join();
        }
        (self.event_sink)(Event::Exit);
        Ok(Response::Message { text: "Exiting debugger.".to_string() })
    }

    fn stop_and_join(&mut self) {
        if let Some(stop_handle) = &self.stop_handle {
            stop_handle.store(false, Ordering::SeqCst);
        }
        if let Some(shared) = &self.shared {
            shared.gate.resume();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        self.active.store(false, Ordering::SeqCst);
    }

    fn do_continue(&mut self) -> DebuggerResult<Response> {
        if !self.is_running() {
            return Ok(Response::Message {
                text: "Program is not running, use command `r(un)` to run it.".to_string(),
            });
        }
        if let Some(shared) = &self.shared {
            shared.gate.resume();
        }
        Ok(Response::Resumed)
    }

    fn do_step_into(&mut self) -> DebuggerResult<Response> {
        if !self.is_running() {
            return self.do_run(true);
        }
        if let Some(shared) = &self.shared {
            shared.hook.lock().step_into = true;
            shared.gate.resume();
        }
        Ok(Response::Resumed)
    }

    fn do_step_over(&mut self) -> DebuggerResult<Response> {
        if !self.is_running() {
            return self.do_run(true);
        }
        if let Some(shared) = &self.shared {
            let mut hook = shared.hook.lock();
            hook.step_over = true;
            hook.watched_frame = hook.last_stack.last().map(|frame| frame.frame_index);
            drop(hook);
            shared.gate.resume();
        }
        Ok(Response::Resumed)
    }

    fn do_pause(&mut self) -> DebuggerResult<Response> {
        if !self.is_running() {
            return Ok(Response::Message {
                text: "Program is not running, use command `r(un)` to run it.".to_string(),
            });
        }
        if let Some(shared) = &self.shared {
            shared.hook.lock().pause = true;
        }
        Ok(Response::Message { text: "Pausing at next line.".to_string() })
    }

    fn do_stack(&self) -> DebuggerResult<Response> {
        if !self.is_running() {
            return Ok(Response::Message { text: "Program is not running.".to_string() });
        }
        let shared = self.shared.as_ref().expect("running implies shared state exists");
        let frames = shared.hook.lock().last_stack.clone();
        Ok(Response::StackTrace { frames })
    }

    fn do_frame(&self, index: usize) -> DebuggerResult<Response> {
        if !self.is_running() {
            return Ok(Response::Message { text: "Program is not running.".to_string() });
        }
        let shared = self.shared.as_ref().expect("running implies shared state exists");
        let hook = shared.hook.lock();
        let depth = hook.last_stack.len();
        let frame = hook.frame_from_top(index).cloned().ok_or(DebuggerError::NoSuchFrame { depth })?;
        Ok(Response::Frame(frame))
    }

    fn do_break(&mut self, request: &DebuggerRequest) -> DebuggerResult<Response> {
        let file = word_arg(request, 0)?.to_string();
        match request.args.get(1) {
            None => {
                let state = self.files.get(&file).ok_or_else(|| DebuggerError::UnknownFile(file.clone()))?;
                Ok(Response::Breakpoints { file, lines: state.list_breakpoints() })
            }
            Some(Arg::Number(line)) => {
                let line = *line as u32;
                self.set_breakpoint(&file, line, None)?;
                Ok(Response::BreakpointSet { file, line })
            }
            Some(_) => Err(DebuggerError::InvalidArgs { usage: Command::Break.usage() }),
        }
    }

    fn do_break_expr(&mut self, request: &DebuggerRequest) -> DebuggerResult<Response> {
        let file = word_arg(request, 0)?.to_string();
        let line = number_arg(request, 1)? as u32;
        let expr = request
            .args
            .get(2)
            .and_then(Arg::as_str)
            .ok_or(DebuggerError::InvalidArgs { usage: Command::BreakExpr.usage() })?;
        self.set_breakpoint(&file, line, Some(expr.to_string()))?;
        Ok(Response::BreakpointSet { file, line })
    }

    fn set_breakpoint(&mut self, file: &str, line: u32, condition: Option<String>) -> DebuggerResult<()> {
        let state = self.files.get_mut(file).ok_or_else(|| DebuggerError::UnknownFile(file.to_string()))?;
        state.set_breakpoint(line, condition)?;
        self.sync_breakpoints_if_current(file);
        Ok(())
    }

    fn do_clear(&mut self, request: &DebuggerRequest) -> DebuggerResult<Response> {
        let file = word_arg(request, 0)?.to_string();
        match request.args.get(1) {
            None => {
                let state = self.files.get_mut(&file).ok_or_else(|| DebuggerError::UnknownFile(file.clone()))?;
                state.remove_all_breakpoints();
                self.sync_breakpoints_if_current(&file);
                Ok(Response::AllBreakpointsRemoved { file })
            }
            Some(Arg::Number(line)) => {
                let line = *line as u32;
                let state = self.files.get_mut(&file).ok_or_else(|| DebuggerError::UnknownFile(file.clone()))?;
                state.remove_breakpoint(line)?;
                self.sync_breakpoints_if_current(&file);
                Ok(Response::BreakpointRemoved { file, line })
            }
            Some(_) => Err(DebuggerError::InvalidArgs { usage: Command::Clear.usage() }),
        }
    }

    fn sync_breakpoints_if_current(&mut self, file: &str) {
        if self.current_file.as_deref() == Some(file) {
            if let Some(shared) = &self.shared {
                let conditions = self.files.get(file).expect("caller holds the entry").breakpoint_conditions();
                shared.hook.lock().breakpoints = conditions;
            }
        }
    }
}

fn word_arg<'a>(request: &'a DebuggerRequest, index: usize) -> DebuggerResult<&'a str> {
    request.args.get(index).and_then(Arg::as_str).ok_or(DebuggerError::InvalidArgs { usage: request.command.usage() })
}

fn number_arg(request: &DebuggerRequest, index: usize) -> DebuggerResult<i64> {
    request.args.get(index).and_then(Arg::as_i64).ok_or(DebuggerError::InvalidArgs { usage: request.command.usage() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    fn new_debugger() -> (Debugger, Arc<StdMutex<Vec<Event>>>) {
        let events = Arc::new(StdMutex::new(Vec::new()));
        let sink_events = Arc::clone(&events);
        let debugger = Debugger::new(Arc::new(move |event: Event| {
            sink_events.lock().unwrap().push(event);
        }));
        (debugger, events)
    }

    #[test]
    fn loading_source_tracks_breakpoint_possible_lines() {
        let (mut debugger, _events) = new_debugger();
        debugger.load_source("main.tutel".to_string(), "foo(){\n  x = 1;\n}\n".to_string());
        let response = debugger.do_get_bp_lines().unwrap();
        assert!(matches!(response, Response::BpLines { lines, .. } if lines == vec![1, 2]));
    }

    #[test]
    fn breaking_on_an_unloaded_file_is_rejected() {
        let (mut debugger, _events) = new_debugger();
        debugger.load_source("main.tutel".to_string(), "foo(){\n  x = 1;\n}\n".to_string());
        let request = DebuggerRequest {
            command: Command::Break,
            args: vec![Arg::Word("other.tutel".to_string()), Arg::Number(1)],
        };
        assert!(matches!(debugger.handle_request(request), Response::BadRequest { .. }));
    }

    #[test]
    fn setting_and_listing_a_breakpoint() {
        let (mut debugger, _events) = new_debugger();
        debugger.load_source("main.tutel".to_string(), "foo(){\n  x = 1;\n}\n".to_string());
        let set = DebuggerRequest {
            command: Command::Break,
            args: vec![Arg::Word("main.tutel".to_string()), Arg::Number(2)],
        };
        assert!(matches!(debugger.handle_request(set), Response::BreakpointSet { line: 2, .. }));

        let list = DebuggerRequest { command: Command::Break, args: vec![Arg::Word("main.tutel".to_string())] };
        match debugger.handle_request(list) {
            Response::Breakpoints { lines, .. } => assert_eq!(lines.len(), 1),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn commands_requiring_a_running_program_report_it_is_not_running() {
        let (debugger, _events) = new_debugger();
        assert!(matches!(debugger.do_stack().unwrap(), Response::Message { .. }));
    }
}
