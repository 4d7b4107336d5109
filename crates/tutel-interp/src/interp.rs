//! The tree-walking interpreter (spec.md §4.4).
//!
//! Grounded in `InterpreterModule/Interpreter.py`'s second `execute`
//! definition (the one with explicit `running = True`/`False`
//! bracketing — the first, superseded definition in the same file is not
//! the one the rest of that module actually calls).

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::trace;
use tutel_par::ast::{AssignOp, BinOp, Block, Expr, Function, Identifier, IfStatement, Program, Statement};
use tutel_util::{FxHashMap, Symbol};

use crate::builtins;
use crate::error::{InterpError, InterpResult};
use crate::frame::CallStack;
use crate::turtle::{Color, GuiHost, Position, Turtle};
use crate::value::Value;

/// Native call depth past which we report `Recursion` rather than risk
/// overflowing the host stack (spec.md §4.4: "native call depth is
/// exceeded").
const DEFAULT_RECURSION_LIMIT: usize = 512;

/// A visitor over the AST, driven by the current frame (spec.md §4.4).
pub struct Interpreter {
    program: Option<Program>,
    globals: FxHashMap<Symbol, Value>,
    call_stack: CallStack,
    return_flag: bool,
    last_returned: Value,
    running: Arc<AtomicBool>,
    debug_callback: Option<Box<dyn FnMut(&CallStack) + Send>>,
    host: Arc<dyn GuiHost>,
    next_turtle_id: u64,
    last_reported_line: Option<u32>,
    recursion_limit: usize,
    /// A snapshot of the call stack taken at the innermost point of the
    /// first error during the current `execute`, outermost frame first
    /// (`Traceback (most recent call last)` order), for the debugger's
    /// post-mortem rendering (spec.md §7). Frames are popped as the error
    /// propagates back out through `call_function`, so this has to be
    /// captured once, before any unwinding, or it is lost.
    captured_trace: Option<Vec<(Symbol, u32)>>,
}

impl Interpreter {
    pub fn new(host: Arc<dyn GuiHost>) -> Self {
        Self {
            program: None,
            globals: FxHashMap::default(),
            call_stack: CallStack::new(),
            return_flag: false,
            last_returned: Value::Null,
            running: Arc::new(AtomicBool::new(false)),
            debug_callback: None,
            host,
            next_turtle_id: 0,
            last_reported_line: None,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            captured_trace: None,
        }
    }

    /// Takes the traceback captured for the error just raised by
    /// `execute`, if any (`None` on success, on `Stop`, or if `execute`
    /// hasn't run yet). Each entry is `(function name, line)`, outermost
    /// frame first.
    pub fn take_captured_trace(&mut self) -> Option<Vec<(Symbol, u32)>> {
        self.captured_trace.take()
    }

    /// Invoked before each statement whose line differs from the last one
    /// reported (spec.md §4.4's "Line hook"). The debugger installs this
    /// to check breakpoints/step modes and to block on its resume gate.
    pub fn set_debug_callback(&mut self, callback: Box<dyn FnMut(&CallStack) + Send>) {
        self.debug_callback = Some(callback);
    }

    /// A handle the debugger can use to request cooperative termination
    /// from another thread without holding a reference to the
    /// interpreter itself (which is busy running on the worker thread).
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Requests cooperative termination; the next line hook raises `Stop`.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    /// Runs `entry` (default: `"main"`, or the first-defined function if
    /// `main` is absent) to completion. The call stack is guaranteed
    /// empty on every exit path: success, early return from the entry
    /// function, cooperative `Stop`, or any evaluator error.
    pub fn execute(&mut self, program: Program, entry: Option<&str>) -> InterpResult<Value> {
        if program.functions.is_empty() {
            return Err(InterpError::NothingToRun { line: 0, column: 0 });
        }

        self.next_turtle_id = 0;
        self.call_stack = CallStack::new();
        self.last_reported_line = None;
        self.captured_trace = None;
        self.globals = Self::fresh_builtins();

        for function in &program.functions {
            if self.globals.contains_key(&function.name) {
                return Err(InterpError::BuiltinFunctionShadow {
                    name: function.name.as_str().to_string(),
                    line: function.line,
                    column: function.column,
                });
            }
            self.globals.insert(function.name, Value::Function(function.name));
        }

        let entry_symbol = match entry {
            Some(explicit) => Symbol::intern(explicit),
            None => {
                let main = Symbol::intern("main");
                if program.functions.iter().any(|f| f.name == main) {
                    main
                } else {
                    program.functions[0].name
                }
            }
        };

        if !program.functions.iter().any(|f| f.name == entry_symbol) {
            return Err(InterpError::NotDefined {
                name: entry_symbol.as_str().to_string(),
                line: 0,
                column: 0,
            });
        }

        self.program = Some(program);
        self.running.store(true, Ordering::SeqCst);
        let result = self.call_function(entry_symbol, Vec::new(), 0, 0);
        self.running.store(false, Ordering::SeqCst);
        result
    }

    fn fresh_builtins() -> FxHashMap<Symbol, Value> {
        builtins::BUILTINS
            .iter()
            .map(|spec| {
                let name = Symbol::intern(spec.name);
                (name, Value::Builtin(name))
            })
            .collect()
    }

    // ---- calls & frames ----

    fn call_function(&mut self, name: Symbol, args: Vec<Value>, line: u32, column: u32) -> InterpResult<Value> {
        let function: Function = self
            .program
            .as_ref()
            .expect("call_function invoked outside execute")
            .functions
            .iter()
            .find(|f| f.name == name)
            .cloned()
            .ok_or_else(|| InterpError::NotDefined {
                name: name.as_str().to_string(),
                line,
                column,
            })?;

        if function.params.len() != args.len() {
            return Err(InterpError::MismatchedArgsCount {
                name: name.as_str().to_string(),
                min: function.params.len(),
                max: function.params.len(),
                actual: args.len(),
                line,
                column,
            });
        }

        if self.call_stack.depth() >= self.recursion_limit {
            trace!(name = name.as_str(), depth = self.call_stack.depth(), "recursion limit tripped");
            return Err(InterpError::Recursion { line, column });
        }

        trace!(name = name.as_str(), depth = self.call_stack.depth(), "call_function");
        self.call_stack.push(name);
        for (param, value) in function.params.iter().zip(args.into_iter()) {
            self.call_stack.current_mut().unwrap().locals.insert(param.name, value);
        }

        let saved_return_flag = self.return_flag;
        self.return_flag = false;
        self.last_returned = Value::Null;

        let exec_result = self.exec_block(&function.body);

        if exec_result.is_err() && self.captured_trace.is_none() {
            self.captured_trace = Some(
                self.call_stack.frames().iter().map(|frame| (frame.function_name, frame.current_line)).collect(),
            );
        }

        let returned = std::mem::replace(&mut self.last_returned, Value::Null);
        self.return_flag = saved_return_flag;
        self.call_stack.pop();

        exec_result.map(|_| returned)
    }

    // ---- statements ----

    fn exec_block(&mut self, block: &Block) -> InterpResult<()> {
        for statement in &block.statements {
            self.exec_statement(statement)?;
            if self.return_flag {
                break;
            }
        }
        Ok(())
    }

    fn exec_statement(&mut self, statement: &Statement) -> InterpResult<()> {
        self.line_hook(statement_line(statement))?;
        match statement {
            Statement::Assignment { target, op, value, line, column } => {
                self.exec_assignment(target, *op, value, *line, *column)
            }
            Statement::Expr(expr) => {
                self.eval_expr(expr)?;
                Ok(())
            }
            Statement::Return { values, .. } => self.exec_return(values),
            Statement::If(if_stmt) => self.exec_if(if_stmt),
            Statement::For { iterator, iterable, body, line, column } => {
                self.exec_for(iterator, iterable, body, *line, *column)
            }
            Statement::While { condition, body, .. } => self.exec_while(condition, body),
        }
    }

    /// Updates the current frame's line and, on a change, invokes the
    /// debug callback; re-checks `running` both before and after (spec.md
    /// §4.4, §4.5 step 1).
    fn line_hook(&mut self, line: u32) -> InterpResult<()> {
        if let Some(frame) = self.call_stack.current_mut() {
            frame.current_line = line;
        }
        if !self.running.load(Ordering::SeqCst) {
            return Err(InterpError::Stop);
        }

        if self.last_reported_line != Some(line) {
            self.last_reported_line = Some(line);
            if let Some(mut callback) = self.debug_callback.take() {
                callback(&self.call_stack);
                self.debug_callback = Some(callback);
            }
        }

        if !self.running.load(Ordering::SeqCst) {
            return Err(InterpError::Stop);
        }
        Ok(())
    }

    fn exec_assignment(
        &mut self,
        target: &Expr,
        op: AssignOp,
        value_expr: &Expr,
        line: u32,
        column: u32,
    ) -> InterpResult<()> {
        if op == AssignOp::Assign {
            let value = self.eval_expr(value_expr)?;
            return self.assign_basic(target, value, line, column);
        }
        let rhs = self.eval_expr(value_expr)?;
        self.assign_compound(target, op, rhs, line, column)
    }

    fn assign_basic(&mut self, target: &Expr, value: Value, line: u32, column: u32) -> InterpResult<()> {
        match target {
            Expr::Identifier(id) => self.assign_identifier(id, value, line, column),
            Expr::Dot { target: obj, attribute, .. } => {
                self.assign_member(obj, attribute.name.as_str(), value, line, column)
            }
            Expr::Index { target: coll, index, .. } => self.assign_index(coll, index, value, line, column),
            _ => Err(InterpError::CannotAssign { line, column }),
        }
    }

    fn assign_identifier(&mut self, id: &Identifier, value: Value, line: u32, column: u32) -> InterpResult<()> {
        if matches!(self.globals.get(&id.name), Some(Value::Builtin(_))) {
            return Err(InterpError::BuiltinFunctionShadow {
                name: id.name.as_str().to_string(),
                line,
                column,
            });
        }
        let frame = self.call_stack.current_mut().expect("assignment outside a frame");
        frame.locals.insert(id.name, value);
        Ok(())
    }

    fn assign_member(&mut self, obj_expr: &Expr, attribute: &str, value: Value, line: u32, column: u32) -> InterpResult<()> {
        let obj = self.eval_expr(obj_expr)?;
        match (&obj, attribute) {
            (Value::Turtle(turtle), "color") => {
                let color = self.expect_color(&value, line, column)?;
                turtle.borrow_mut().set_color(self.host.as_ref(), color);
                Ok(())
            }
            (Value::Turtle(turtle), "position") => {
                let position = self.expect_position(&value, line, column)?;
                turtle.borrow_mut().set_position(self.host.as_ref(), position);
                Ok(())
            }
            (Value::Turtle(turtle), "orientation") => {
                let angle = self.expect_integer(&value, line, column)?;
                turtle.borrow_mut().set_orientation(self.host.as_ref(), angle);
                Ok(())
            }
            (other, attr) => Err(InterpError::Attribute {
                type_name: other.type_name().to_string(),
                attribute: attr.to_string(),
                line,
                column,
            }),
        }
    }

    fn assign_index(&mut self, coll_expr: &Expr, index_expr: &Expr, value: Value, line: u32, column: u32) -> InterpResult<()> {
        let coll = self.eval_expr(coll_expr)?;
        let index_value = self.eval_expr(index_expr)?;
        match coll {
            Value::List(list) => {
                let idx = self.expect_integer(&index_value, line, column)?;
                let len = list.borrow().len();
                let resolved = resolve_index(idx, len, line, column)?;
                list.borrow_mut()[resolved] = value;
                Ok(())
            }
            other => Err(InterpError::Type {
                type_name: other.type_name().to_string(),
                line,
                column,
            }),
        }
    }

    /// Compound assignment (spec.md §9 Open Question): lists extend the
    /// same underlying buffer in place via `+=`, so aliases observe the
    /// growth; every other value kind rebinds the target name to a freshly
    /// computed value, which is observationally identical to "in place"
    /// for immutable scalars.
    fn assign_compound(&mut self, target: &Expr, op: AssignOp, rhs: Value, line: u32, column: u32) -> InterpResult<()> {
        let current = self.eval_expr(target)?;

        if op == AssignOp::AddAssign {
            if let Value::List(list) = &current {
                let Value::List(addition) = rhs else {
                    return Err(InterpError::UnsupportedOperand { op: "+=".to_string(), line, column });
                };
                let extra: Vec<Value> = addition.borrow().clone();
                list.borrow_mut().extend(extra);
                return Ok(());
            }
        }

        let bin_op = match op {
            AssignOp::AddAssign => BinOp::Add,
            AssignOp::SubAssign => BinOp::Sub,
            AssignOp::MulAssign => BinOp::Mul,
            AssignOp::DivAssign => BinOp::Div,
            AssignOp::ModAssign => BinOp::Mod,
            AssignOp::Assign => unreachable!("handled by assign_basic"),
        };
        let updated = self.eval_binary(bin_op, current, rhs, line, column)?;
        self.assign_basic(target, updated, line, column)
    }

    fn exec_return(&mut self, values: &[Expr]) -> InterpResult<()> {
        let evaluated: Vec<Value> = values.iter().map(|e| self.eval_expr(e)).collect::<InterpResult<_>>()?;
        self.last_returned = match evaluated.len() {
            0 => Value::Null,
            1 => evaluated.into_iter().next().unwrap(),
            _ => Value::new_list(evaluated),
        };
        self.return_flag = true;
        Ok(())
    }

    fn exec_if(&mut self, if_stmt: &IfStatement) -> InterpResult<()> {
        if self.eval_expr(&if_stmt.condition)?.truthy() {
            return self.exec_block(&if_stmt.body);
        }
        for elif in &if_stmt.elif_blocks {
            if self.eval_expr(&elif.condition)?.truthy() {
                return self.exec_block(&elif.body);
            }
        }
        if let Some(else_block) = &if_stmt.else_block {
            return self.exec_block(else_block);
        }
        Ok(())
    }

    fn exec_for(&mut self, iterator: &Identifier, iterable: &Expr, body: &Block, line: u32, column: u32) -> InterpResult<()> {
        let value = self.eval_expr(iterable)?;
        let items: Vec<Value> = match &value {
            Value::List(list) => list.borrow().clone(),
            Value::String(s) => s.chars().map(|c| Value::String(c.to_string())).collect(),
            _ => return Err(InterpError::NotIterable { line, column }),
        };

        for item in items {
            self.call_stack
                .current_mut()
                .expect("for loop outside a frame")
                .locals
                .insert(iterator.name, item);
            self.exec_block(body)?;
            if self.return_flag {
                break;
            }
        }
        Ok(())
    }

    fn exec_while(&mut self, condition: &Expr, body: &Block) -> InterpResult<()> {
        while self.eval_expr(condition)?.truthy() {
            self.exec_block(body)?;
            if self.return_flag {
                break;
            }
        }
        Ok(())
    }

    // ---- expressions ----

    fn eval_expr(&mut self, expr: &Expr) -> InterpResult<Value> {
        match expr {
            Expr::Identifier(id) => self.lookup(id.name, id.line, id.column),
            Expr::Integer { value, .. } => Ok(Value::Integer(*value)),
            Expr::StringLit { value, .. } => Ok(Value::String(value.clone())),
            Expr::Boolean { value, .. } => Ok(Value::Boolean(*value)),
            Expr::Null { .. } => Ok(Value::Null),
            Expr::List { elements, .. } => {
                let values = elements.iter().map(|e| self.eval_expr(e)).collect::<InterpResult<Vec<_>>>()?;
                Ok(Value::new_list(values))
            }
            Expr::Negate { value, line, column } => {
                let v = self.eval_expr(value)?;
                match v {
                    Value::Integer(n) => Ok(Value::Integer(-n)),
                    _ => Err(InterpError::BadOperandForUnary {
                        op: "-".to_string(),
                        line: *line,
                        column: *column,
                    }),
                }
            }
            Expr::Invert { value, .. } => {
                let v = self.eval_expr(value)?;
                Ok(Value::Boolean(!v.truthy()))
            }
            Expr::Binary { op, left, right, line, column } => self.eval_binary_expr(*op, left, right, *line, *column),
            Expr::Dot { target, attribute, line, column } => self.eval_member(target, attribute.name.as_str(), *line, *column),
            Expr::Call { callee, arguments, line, column } => self.eval_call(callee, arguments, *line, *column),
            Expr::Index { target, index, line, column } => self.eval_index(target, index, *line, *column),
        }
    }

    fn lookup(&self, name: Symbol, line: u32, column: u32) -> InterpResult<Value> {
        if let Some(frame) = self.call_stack.current() {
            if let Some(value) = frame.locals.get(&name) {
                return Ok(value.clone());
            }
        }
        if let Some(value) = self.globals.get(&name) {
            return Ok(value.clone());
        }
        Err(InterpError::NotDefined {
            name: name.as_str().to_string(),
            line,
            column,
        })
    }

    fn eval_binary_expr(&mut self, op: BinOp, left: &Expr, right: &Expr, line: u32, column: u32) -> InterpResult<Value> {
        match op {
            BinOp::Or => {
                let l = self.eval_expr(left)?;
                if l.truthy() {
                    return Ok(l);
                }
                self.eval_expr(right)
            }
            BinOp::And => {
                let l = self.eval_expr(left)?;
                if !l.truthy() {
                    return Ok(l);
                }
                self.eval_expr(right)
            }
            _ => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                self.eval_binary(op, l, r, line, column)
            }
        }
    }

    fn eval_binary(&mut self, op: BinOp, left: Value, right: Value, line: u32, column: u32) -> InterpResult<Value> {
        use BinOp::*;
        match op {
            Eq => Ok(Value::Boolean(left.structural_eq(&right))),
            NotEq => Ok(Value::Boolean(!left.structural_eq(&right))),
            Less | Greater | LessEq | GreaterEq => self.compare(op, &left, &right, line, column),
            In => self.contains(&left, &right, line, column),
            Add => self.add(left, right, line, column),
            Sub | Mul | Div | IntDiv | Mod => self.arith(op, left, right, line, column),
            Or | And => unreachable!("short-circuit operators are handled by eval_binary_expr"),
        }
    }

    fn add(&mut self, left: Value, right: Value, line: u32, column: u32) -> InterpResult<Value> {
        match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
            (Value::List(a), Value::List(b)) => {
                let mut combined = a.borrow().clone();
                combined.extend(b.borrow().iter().cloned());
                Ok(Value::new_list(combined))
            }
            _ => Err(InterpError::UnsupportedOperand { op: "+".to_string(), line, column }),
        }
    }

    fn arith(&mut self, op: BinOp, left: Value, right: Value, line: u32, column: u32) -> InterpResult<Value> {
        let (Value::Integer(a), Value::Integer(b)) = (&left, &right) else {
            return Err(InterpError::UnsupportedOperand {
                op: arith_symbol(op).to_string(),
                line,
                column,
            });
        };
        let (a, b) = (*a, *b);
        match op {
            BinOp::Sub => Ok(Value::Integer(a - b)),
            BinOp::Mul => Ok(Value::Integer(a * b)),
            BinOp::Div | BinOp::IntDiv => {
                if b == 0 {
                    return Err(InterpError::Unknown {
                        message: "division by zero".to_string(),
                        line,
                        column,
                    });
                }
                Ok(Value::Integer(floor_div(a, b)))
            }
            BinOp::Mod => {
                if b == 0 {
                    return Err(InterpError::Unknown {
                        message: "modulo by zero".to_string(),
                        line,
                        column,
                    });
                }
                Ok(Value::Integer(floor_mod(a, b)))
            }
            _ => unreachable!(),
        }
    }

    fn compare(&mut self, op: BinOp, left: &Value, right: &Value, line: u32, column: u32) -> InterpResult<Value> {
        let ordering = match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            _ => {
                return Err(InterpError::UnsupportedOperand {
                    op: compare_symbol(op).to_string(),
                    line,
                    column,
                })
            }
        };
        let result = match op {
            BinOp::Less => ordering.is_lt(),
            BinOp::LessEq => ordering.is_le(),
            BinOp::Greater => ordering.is_gt(),
            BinOp::GreaterEq => ordering.is_ge(),
            _ => unreachable!(),
        };
        Ok(Value::Boolean(result))
    }

    fn contains(&mut self, left: &Value, right: &Value, line: u32, column: u32) -> InterpResult<Value> {
        match right {
            Value::List(list) => Ok(Value::Boolean(list.borrow().iter().any(|v| v.structural_eq(left)))),
            Value::String(haystack) => {
                let Value::String(needle) = left else {
                    return Err(InterpError::UnsupportedOperand { op: "in".to_string(), line, column });
                };
                Ok(Value::Boolean(haystack.contains(needle.as_str())))
            }
            _ => Err(InterpError::UnsupportedOperand { op: "in".to_string(), line, column }),
        }
    }

    fn eval_member(&mut self, target: &Expr, attribute: &str, line: u32, column: u32) -> InterpResult<Value> {
        let obj = self.eval_expr(target)?;
        match (&obj, attribute) {
            (Value::Turtle(turtle), "color") => Ok(Value::Color(turtle.borrow().color)),
            (Value::Turtle(turtle), "position") => Ok(Value::Position(turtle.borrow().position)),
            (Value::Turtle(turtle), "orientation") => Ok(Value::Integer(turtle.borrow().orientation)),
            (Value::Color(c), "r") => Ok(Value::Integer(c.r)),
            (Value::Color(c), "g") => Ok(Value::Integer(c.g)),
            (Value::Color(c), "b") => Ok(Value::Integer(c.b)),
            (Value::Position(p), "x") => Ok(Value::Integer(p.x)),
            (Value::Position(p), "y") => Ok(Value::Integer(p.y)),
            (other, attr) => Err(InterpError::Attribute {
                type_name: other.type_name().to_string(),
                attribute: attr.to_string(),
                line,
                column,
            }),
        }
    }

    fn eval_index(&mut self, target: &Expr, index_expr: &Expr, line: u32, column: u32) -> InterpResult<Value> {
        let coll = self.eval_expr(target)?;
        let index_value = self.eval_expr(index_expr)?;
        let idx = self.expect_integer(&index_value, line, column)?;
        match coll {
            Value::List(list) => {
                let list = list.borrow();
                let resolved = resolve_index(idx, list.len(), line, column)?;
                Ok(list[resolved].clone())
            }
            Value::String(s) => {
                let chars: Vec<char> = s.chars().collect();
                let resolved = resolve_index(idx, chars.len(), line, column)?;
                Ok(Value::String(chars[resolved].to_string()))
            }
            other => Err(InterpError::Type {
                type_name: other.type_name().to_string(),
                line,
                column,
            }),
        }
    }

    fn eval_call(&mut self, callee: &Expr, arguments: &[Expr], line: u32, column: u32) -> InterpResult<Value> {
        if let Expr::Dot { target, attribute, .. } = callee {
            let receiver = self.eval_expr(target)?;
            let args = self.eval_arguments(arguments)?;
            return self.call_method(receiver, attribute.name.as_str(), args, line, column);
        }

        let value = self.eval_expr(callee)?;
        let args = self.eval_arguments(arguments)?;
        match value {
            Value::Builtin(name) => self.call_builtin(name, args, line, column),
            Value::Function(name) => self.call_function(name, args, line, column),
            other => Err(InterpError::Type {
                type_name: other.type_name().to_string(),
                line,
                column,
            }),
        }
    }

    fn eval_arguments(&mut self, arguments: &[Expr]) -> InterpResult<Vec<Value>> {
        arguments.iter().map(|e| self.eval_expr(e)).collect()
    }

    fn call_method(&mut self, receiver: Value, name: &str, mut args: Vec<Value>, line: u32, column: u32) -> InterpResult<Value> {
        match (&receiver, name) {
            (Value::List(list), "append") => {
                check_arity("append", 1, 1, args.len(), line, column)?;
                list.borrow_mut().push(args.remove(0));
                Ok(Value::Null)
            }
            (Value::Turtle(turtle), "set_color") => {
                check_arity("set_color", 1, 1, args.len(), line, column)?;
                let color = self.expect_color(&args[0], line, column)?;
                turtle.borrow_mut().set_color(self.host.as_ref(), color);
                Ok(Value::Null)
            }
            (Value::Turtle(turtle), "set_position") => {
                check_arity("set_position", 1, 1, args.len(), line, column)?;
                let position = self.expect_position(&args[0], line, column)?;
                turtle.borrow_mut().set_position(self.host.as_ref(), position);
                Ok(Value::Null)
            }
            (Value::Turtle(turtle), "set_orientation") => {
                check_arity("set_orientation", 1, 1, args.len(), line, column)?;
                let angle = self.expect_integer(&args[0], line, column)?;
                turtle.borrow_mut().set_orientation(self.host.as_ref(), angle);
                Ok(Value::Null)
            }
            (Value::Turtle(turtle), "turn_left") => {
                check_arity("turn_left", 0, 0, args.len(), line, column)?;
                turtle.borrow_mut().turn_left(self.host.as_ref());
                Ok(Value::Null)
            }
            (Value::Turtle(turtle), "turn_right") => {
                check_arity("turn_right", 0, 0, args.len(), line, column)?;
                turtle.borrow_mut().turn_right(self.host.as_ref());
                Ok(Value::Null)
            }
            (Value::Turtle(turtle), "forward") => {
                check_arity("forward", 1, 1, args.len(), line, column)?;
                let distance = self.expect_integer(&args[0], line, column)?;
                turtle.borrow_mut().forward(self.host.as_ref(), distance);
                Ok(Value::Null)
            }
            (other, attr) => Err(InterpError::Attribute {
                type_name: other.type_name().to_string(),
                attribute: attr.to_string(),
                line,
                column,
            }),
        }
    }

    fn call_builtin(&mut self, name: Symbol, args: Vec<Value>, line: u32, column: u32) -> InterpResult<Value> {
        let name_str = name.as_str();
        let spec = builtins::lookup(name_str).expect("builtin name registered in globals without a spec");
        check_arity(name_str, spec.min_args, spec.max_args, args.len(), line, column)?;
        trace!(name = name_str, argc = args.len(), "call_builtin");

        match name_str {
            "print" => {
                let rendered: Vec<String> = args.iter().map(Value::display).collect();
                println!("{}", rendered.join(" "));
                Ok(Value::Null)
            }
            "input" => {
                if let Some(prompt) = args.first() {
                    use std::io::Write;
                    print!("{}", prompt.display());
                    let _ = std::io::stdout().flush();
                }
                let mut buf = String::new();
                std::io::stdin()
                    .read_line(&mut buf)
                    .map_err(|e| InterpError::Unknown { message: e.to_string(), line, column })?;
                Ok(Value::String(buf.trim_end_matches(['\n', '\r']).to_string()))
            }
            "sleep" => {
                let seconds = self.expect_integer(&args[0], line, column)?;
                std::thread::sleep(std::time::Duration::from_secs(seconds.max(0) as u64));
                Ok(Value::Null)
            }
            "type" => Ok(Value::String(args[0].type_name().to_string())),
            "hex" => {
                let n = self.expect_integer(&args[0], line, column)?;
                Ok(Value::String(format!("{n:#x}")))
            }
            "range" => self.builtin_range(&args, line, column),
            "len" => match &args[0] {
                Value::List(list) => Ok(Value::Integer(list.borrow().len() as i64)),
                Value::String(s) => Ok(Value::Integer(s.chars().count() as i64)),
                other => Err(InterpError::Type { type_name: other.type_name().to_string(), line, column }),
            },
            "pow" => {
                let base = self.expect_integer(&args[0], line, column)?;
                let exp = self.expect_integer(&args[1], line, column)?;
                if exp < 0 {
                    return Err(InterpError::Unknown {
                        message: "pow() exponent must be non-negative".to_string(),
                        line,
                        column,
                    });
                }
                Ok(Value::Integer(base.pow(exp as u32)))
            }
            "str" => Ok(Value::String(args[0].display())),
            "int" => match &args[0] {
                Value::Integer(n) => Ok(Value::Integer(*n)),
                Value::Boolean(b) => Ok(Value::Integer(if *b { 1 } else { 0 })),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|_| InterpError::Unknown {
                        message: format!("invalid literal for int(): '{s}'"),
                        line,
                        column,
                    }),
                other => Err(InterpError::Type { type_name: other.type_name().to_string(), line, column }),
            },
            "Turtle" => {
                let id = self.next_turtle_id;
                self.next_turtle_id += 1;
                let turtle = Turtle::new(id);
                self.host.add_turtle(&turtle);
                Ok(Value::Turtle(Rc::new(RefCell::new(turtle))))
            }
            "Color" => {
                let r = self.expect_integer(&args[0], line, column)?;
                let g = self.expect_integer(&args[1], line, column)?;
                let b = self.expect_integer(&args[2], line, column)?;
                Ok(Value::Color(Color::new(r, g, b)))
            }
            "Position" => {
                let x = self.expect_integer(&args[0], line, column)?;
                let y = self.expect_integer(&args[1], line, column)?;
                Ok(Value::Position(Position::new(x, y)))
            }
            _ => unreachable!("builtin '{name_str}' is registered but has no dispatch arm"),
        }
    }

    fn builtin_range(&mut self, args: &[Value], line: u32, column: u32) -> InterpResult<Value> {
        let (start, stop, step) = match args.len() {
            1 => (0, self.expect_integer(&args[0], line, column)?, 1),
            2 => (
                self.expect_integer(&args[0], line, column)?,
                self.expect_integer(&args[1], line, column)?,
                1,
            ),
            _ => (
                self.expect_integer(&args[0], line, column)?,
                self.expect_integer(&args[1], line, column)?,
                self.expect_integer(&args[2], line, column)?,
            ),
        };
        if step == 0 {
            return Err(InterpError::Unknown {
                message: "range() step must not be zero".to_string(),
                line,
                column,
            });
        }
        let mut values = Vec::new();
        let mut current = start;
        if step > 0 {
            while current < stop {
                values.push(Value::Integer(current));
                current += step;
            }
        } else {
            while current > stop {
                values.push(Value::Integer(current));
                current += step;
            }
        }
        Ok(Value::new_list(values))
    }

    fn expect_integer(&self, value: &Value, line: u32, column: u32) -> InterpResult<i64> {
        match value {
            Value::Integer(n) => Ok(*n),
            other => Err(InterpError::Type { type_name: other.type_name().to_string(), line, column }),
        }
    }

    fn expect_color(&self, value: &Value, line: u32, column: u32) -> InterpResult<Color> {
        match value {
            Value::Color(c) => Ok(*c),
            other => Err(InterpError::Type { type_name: other.type_name().to_string(), line, column }),
        }
    }

    fn expect_position(&self, value: &Value, line: u32, column: u32) -> InterpResult<Position> {
        match value {
            Value::Position(p) => Ok(*p),
            other => Err(InterpError::Type { type_name: other.type_name().to_string(), line, column }),
        }
    }
}

fn check_arity(name: &str, min: usize, max: usize, actual: usize, line: u32, column: u32) -> InterpResult<()> {
    if actual < min || actual > max {
        return Err(InterpError::MismatchedArgsCount {
            name: name.to_string(),
            min,
            max,
            actual,
            line,
            column,
        });
    }
    Ok(())
}

fn resolve_index(idx: i64, len: usize, line: u32, column: u32) -> InterpResult<usize> {
    let normalized = if idx < 0 { idx + len as i64 } else { idx };
    if normalized < 0 || normalized as usize >= len {
        return Err(InterpError::OutOfRange { line, column });
    }
    Ok(normalized as usize)
}

fn statement_line(statement: &Statement) -> u32 {
    match statement {
        Statement::Assignment { line, .. }
        | Statement::Return { line, .. }
        | Statement::For { line, .. }
        | Statement::While { line, .. } => *line,
        Statement::If(if_stmt) => if_stmt.line,
        Statement::Expr(expr) => expr.line(),
    }
}

fn arith_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::IntDiv => "//",
        BinOp::Mod => "%",
        _ => "?",
    }
}

/// Python-style floor division: rounds toward negative infinity, not zero.
fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

/// Python-style modulo: result takes the sign of the divisor.
fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        r + b
    } else {
        r
    }
}

fn compare_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Less => "<",
        BinOp::LessEq => "<=",
        BinOp::Greater => ">",
        BinOp::GreaterEq => ">=",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turtle::GuiMock;
    use tutel_par::Parser;

    fn run(src: &str) -> Interpreter {
        let program = Parser::new(src).unwrap().parse().unwrap();
        let mut interp = Interpreter::new(Arc::new(GuiMock));
        interp.execute(program, None).unwrap();
        interp
    }

    fn run_capture_last_local(src: &str, name: &str) -> Value {
        let program = Parser::new(src).unwrap().parse().unwrap();
        let mut interp = Interpreter::new(Arc::new(GuiMock));
        interp.execute(program, None).unwrap();
        // After execute, frames are popped; re-run with an inspection hook
        // is unnecessary here since these tests check return values or
        // drive scenarios through a "report" builtin-free approach: for
        // the concrete scenarios in spec.md §8, the assigned local is
        // observed via a return statement instead.
        let _ = name;
        interp.last_returned.clone()
    }

    #[test]
    fn floor_division_rounds_toward_negative_infinity() {
        assert_eq!(floor_div(7, 2), 3);
        assert_eq!(floor_div(7, -2), -4);
        assert_eq!(floor_div(-7, 2), -4);
        assert_eq!(floor_div(-7, -2), 3);
    }

    #[test]
    fn floor_modulo_takes_the_divisor_sign() {
        assert_eq!(floor_mod(7, 2), 1);
        assert_eq!(floor_mod(7, -2), -1);
        assert_eq!(floor_mod(-7, 2), 1);
        assert_eq!(floor_mod(-7, -2), -1);
    }

    #[test]
    fn basic_assignment_scenario() {
        // spec.md §8 scenario 1, observed through a return instead of a
        // local peek (locals don't outlive the popped frame).
        let value = run_capture_last_local("main(){a = 1; return a;}", "a");
        assert!(matches!(value, Value::Integer(1)));
    }

    #[test]
    fn function_call_scenario() {
        let value = run_capture_last_local(
            "main(){x = 1; x = boo(x); return x;} boo(a){return a + 1;}",
            "x",
        );
        assert!(matches!(value, Value::Integer(2)));
    }

    #[test]
    fn for_loop_accumulates_and_leaves_last_element() {
        let value = run_capture_last_local(
            "main(){a = [1,2]; b = 0; for(el in a){ b += 1; } return [b, el];}",
            "b",
        );
        if let Value::List(list) = value {
            let list = list.borrow();
            assert!(matches!(list[0], Value::Integer(2)));
            assert!(matches!(list[1], Value::Integer(2)));
        } else {
            panic!("expected list return");
        }
    }

    #[test]
    fn direct_recursion_trips_recursion_limit() {
        let program = Parser::new("main(){main();}").unwrap().parse().unwrap();
        let mut interp = Interpreter::new(Arc::new(GuiMock));
        let err = interp.execute(program, None).unwrap_err();
        assert!(matches!(err, InterpError::Recursion { .. }));
        assert!(interp.call_stack().is_empty());
    }

    #[test]
    fn arity_mismatch_reports_expected_and_actual() {
        let program = Parser::new("main(){boo(1);} boo(){}").unwrap().parse().unwrap();
        let mut interp = Interpreter::new(Arc::new(GuiMock));
        let err = interp.execute(program, None).unwrap_err();
        match err {
            InterpError::MismatchedArgsCount { min, max, actual, .. } => {
                assert_eq!((min, max, actual), (0, 0, 1));
            }
            other => panic!("expected MismatchedArgsCount, got {other:?}"),
        }
    }

    #[test]
    fn call_stack_is_empty_after_every_terminal_path() {
        let interp = run("main(){a = 1;}");
        assert!(interp.call_stack().is_empty());
    }

    #[test]
    fn builtin_shadowing_by_a_user_function_is_rejected() {
        let program = Parser::new("print(){}").unwrap().parse().unwrap();
        let mut interp = Interpreter::new(Arc::new(GuiMock));
        let err = interp.execute(program, None).unwrap_err();
        assert!(matches!(err, InterpError::BuiltinFunctionShadow { .. }));
    }

    #[test]
    fn builtin_shadowing_by_assignment_is_rejected() {
        let program = Parser::new("main(){print = 1;}").unwrap().parse().unwrap();
        let mut interp = Interpreter::new(Arc::new(GuiMock));
        let err = interp.execute(program, None).unwrap_err();
        assert!(matches!(err, InterpError::BuiltinFunctionShadow { .. }));
    }

    #[test]
    fn not_iterable_value_in_for_loop_is_an_error() {
        let program = Parser::new("main(){for(el in 5){}}").unwrap().parse().unwrap();
        let mut interp = Interpreter::new(Arc::new(GuiMock));
        let err = interp.execute(program, None).unwrap_err();
        assert!(matches!(err, InterpError::NotIterable { .. }));
    }

    #[test]
    fn list_compound_assignment_mutates_in_place_through_aliases() {
        let value = run_capture_last_local(
            "main(){a = [1]; b = a; a += [2]; return b;}",
            "b",
        );
        if let Value::List(list) = value {
            assert_eq!(list.borrow().len(), 2);
        } else {
            panic!("expected list");
        }
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let program = Parser::new("main(){a = [1]; return a[5];}").unwrap().parse().unwrap();
        let mut interp = Interpreter::new(Arc::new(GuiMock));
        let err = interp.execute(program, None).unwrap_err();
        assert!(matches!(err, InterpError::OutOfRange { .. }));
    }

    #[test]
    fn negative_index_wraps_from_the_end() {
        let value = run_capture_last_local("main(){a = [1,2,3]; return a[-1];}", "a");
        assert!(matches!(value, Value::Integer(3)));
    }

    #[test]
    fn and_or_return_the_last_evaluated_operand() {
        let value = run_capture_last_local("main(){return 0 or 5;}", "_");
        assert!(matches!(value, Value::Integer(5)));
        let value = run_capture_last_local("main(){return 3 and 0;}", "_");
        assert!(matches!(value, Value::Integer(0)));
    }
}
