//! Execution of user-submitted `findPath` solutions.
//!
//! # Contract
//!
//! The solution is Lua source defining a global function
//!
//! ```lua
//! function findPath(grid, startRow, startCol, endRow, endCol, visit)
//!   -- grid[r + 1][c + 1] is the cell code at (r, c)
//!   -- call visit(r, c) for every cell examined, in order
//!   -- return { {r, c}, ... } from start to end, or nil when there is no path
//! end
//! ```
//!
//! Compilation and invocation are split behind the [`Evaluator`] trait so the
//! verification engine never touches the interpreter directly. Every failure
//! (syntax error, missing `findPath`, runtime error, malformed return value)
//! comes back as an error value carrying a display message; nothing here
//! panics into the caller.
//!
//! Each compiled solution owns its own Lua state. Ambient globals (`os`, `io`,
//! `require`, ...) are removed so the function only sees its six arguments and
//! the pure standard libraries. Execution has no time limit unless an
//! instruction budget is configured.

use mlua::{Function, HookTriggers, Lua, MultiValue, Table, Value, VmState};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::grid::Position;
use crate::problem::PathArgs;

/// Name of the function every solution must define.
pub const ENTRY_POINT: &str = "findPath";

/// How often the instruction budget is checked (every N instructions).
pub const INSTRUCTION_HOOK_INTERVAL: u32 = 10_000;

/// Maximum number of captured print() lines per invocation.
pub const MAX_OUTPUT_LINES: usize = 500;

/// Source text could not be turned into a callable `findPath`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub message: String,
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CompileError {}

/// `findPath` raised an error, exceeded its budget, or returned something
/// that is not a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub message: String,
    /// Whether the instruction budget stopped execution
    pub budget_exceeded: bool,
    /// Lines printed before the failure
    pub output: Vec<String>,
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// Either stage failing, for callers that compile and invoke in one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    Compile(CompileError),
    Runtime(RuntimeError),
}

impl ExecError {
    pub fn message(&self) -> &str {
        match self {
            ExecError::Compile(e) => &e.message,
            ExecError::Runtime(e) => &e.message,
        }
    }

    /// Lines printed before the failure. Compilation never captures any.
    pub fn into_output(self) -> Vec<String> {
        match self {
            ExecError::Compile(_) => Vec::new(),
            ExecError::Runtime(e) => e.output,
        }
    }
}

impl std::fmt::Display for ExecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ExecError {}

/// Everything one invocation produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Execution {
    /// Every `visit(row, col)` call, in order, duplicates kept
    pub visited: Vec<Position>,
    /// Returned path, or `None` for a falsy return
    pub path: Option<Vec<Position>>,
    /// Lines printed by the solution
    pub output: Vec<String>,
}

/// Turns solution text into something callable and calls it.
pub trait Evaluator {
    type Callable;

    fn compile(&self, source: &str) -> Result<Self::Callable, CompileError>;

    fn invoke(&self, callable: &Self::Callable, args: &PathArgs<'_>) -> Result<Execution, RuntimeError>;

    /// Compile `source` and invoke it once.
    fn execute(&self, source: &str, args: &PathArgs<'_>) -> Result<Execution, ExecError> {
        let callable = self.compile(source).map_err(ExecError::Compile)?;
        self.invoke(&callable, args).map_err(ExecError::Runtime)
    }
}

/// A solution compiled into its own Lua state.
pub struct LuaSolution {
    lua: Lua,
    find_path: Function,
    output: Rc<RefCell<OutputState>>,
}

/// Print buffer shared between the `print` override and the invoker.
struct OutputState {
    lines: Vec<String>,
    truncated: bool,
}

impl OutputState {
    fn new() -> Self {
        Self { lines: Vec::new(), truncated: false }
    }

    fn push(&mut self, line: String) {
        if self.lines.len() < MAX_OUTPUT_LINES {
            self.lines.push(line);
        } else {
            self.truncated = true;
        }
    }

    fn take(&mut self) -> Vec<String> {
        let mut lines = std::mem::take(&mut self.lines);
        if self.truncated {
            lines.push(format!("... output truncated ({} line limit)", MAX_OUTPUT_LINES));
            self.truncated = false;
        }
        lines
    }
}

/// Lua 5.4 backed [`Evaluator`].
#[derive(Debug, Clone, Default)]
pub struct LuaEvaluator {
    instruction_limit: Option<u64>,
}

impl LuaEvaluator {
    /// Evaluator without any instruction budget.
    pub fn new() -> Self {
        Self { instruction_limit: None }
    }

    /// Evaluator that stops solutions after `limit` Lua instructions.
    pub fn with_instruction_limit(limit: Option<u64>) -> Self {
        Self { instruction_limit: limit }
    }

    fn new_state(&self) -> mlua::Result<(Lua, Rc<RefCell<OutputState>>)> {
        let lua = Lua::new();
        let output = Rc::new(RefCell::new(OutputState::new()));

        {
            let state = output.clone();
            let print_fn = lua.create_function(move |_, args: MultiValue| {
                let parts: Vec<String> = args.iter().map(lua_value_to_string).collect();
                state.borrow_mut().push(parts.join("\t"));
                Ok(())
            })?;
            lua.globals().set("print", print_fn)?;
        }

        let globals = lua.globals();
        for name in ["os", "io", "debug", "package", "require", "load", "loadfile", "dofile"] {
            globals.set(name, Value::Nil)?;
        }

        Ok((lua, output))
    }

    /// Install the instruction budget hook, if any. Returns the shared budget.
    ///
    /// The hook fires every [`INSTRUCTION_HOOK_INTERVAL`] instructions, so the
    /// limit is enforced at the first multiple of the interval that reaches it.
    fn arm_budget(&self, lua: &Lua) -> Option<Arc<AtomicI64>> {
        let limit = self.instruction_limit?;
        let budget = Arc::new(AtomicI64::new(i64::try_from(limit).unwrap_or(i64::MAX)));
        let hook_budget = budget.clone();
        lua.set_hook(
            HookTriggers::new().every_nth_instruction(INSTRUCTION_HOOK_INTERVAL),
            move |_lua, _debug| {
                let step = INSTRUCTION_HOOK_INTERVAL as i64;
                let remaining = hook_budget.fetch_sub(step, Ordering::Relaxed) - step;
                if remaining <= 0 {
                    Err(mlua::Error::RuntimeError(format!(
                        "instruction limit exceeded ({} instructions)",
                        limit
                    )))
                } else {
                    Ok(VmState::Continue)
                }
            },
        );
        Some(budget)
    }

    fn disarm_budget(&self, lua: &Lua, budget: Option<Arc<AtomicI64>>) -> bool {
        match budget {
            Some(budget) => {
                lua.remove_hook();
                budget.load(Ordering::Relaxed) <= 0
            }
            None => false,
        }
    }
}

impl Evaluator for LuaEvaluator {
    type Callable = LuaSolution;

    fn compile(&self, source: &str) -> Result<LuaSolution, CompileError> {
        let (lua, output) = self.new_state().map_err(|e| CompileError {
            message: format!("failed to create Lua state: {}", format_lua_error(&e)),
        })?;

        let budget = self.arm_budget(&lua);
        let loaded = lua.load(source).set_name("solution").exec();
        self.disarm_budget(&lua, budget);
        loaded.map_err(|e| CompileError { message: format_lua_error(&e) })?;

        let entry: Value = lua
            .globals()
            .get(ENTRY_POINT)
            .map_err(|e| CompileError { message: format_lua_error(&e) })?;
        let find_path = match entry {
            Value::Function(f) => f,
            Value::Nil => {
                return Err(CompileError { message: format!("{} is not defined", ENTRY_POINT) });
            }
            other => {
                return Err(CompileError {
                    message: format!("{} is a {}, not a function", ENTRY_POINT, other.type_name()),
                });
            }
        };

        // Anything printed while loading belongs to no invocation.
        output.borrow_mut().take();

        Ok(LuaSolution { lua, find_path, output })
    }

    fn invoke(&self, solution: &LuaSolution, args: &PathArgs<'_>) -> Result<Execution, RuntimeError> {
        let lua = &solution.lua;
        let runtime = |e: mlua::Error| RuntimeError {
            message: format_lua_error(&e),
            budget_exceeded: false,
            output: Vec::new(),
        };

        let grid = grid_to_table(lua, args).map_err(runtime)?;

        let recorder: Rc<RefCell<Vec<Position>>> = Rc::new(RefCell::new(Vec::new()));
        let visit = {
            let recorder = recorder.clone();
            lua.create_function(move |_, (row, col): (i64, i64)| {
                let pos = Position::new(to_coord(row)?, to_coord(col)?);
                recorder.borrow_mut().push(pos);
                Ok(())
            })
            .map_err(runtime)?
        };

        let budget = self.arm_budget(lua);
        let result = solution.find_path.call::<Value>((
            grid,
            args.start.row,
            args.start.col,
            args.end.row,
            args.end.col,
            visit,
        ));
        let budget_exceeded = self.disarm_budget(lua, budget);
        let output = solution.output.borrow_mut().take();

        let returned = match result {
            Ok(value) => value,
            Err(e) => {
                return Err(RuntimeError { message: format_lua_error(&e), budget_exceeded, output });
            }
        };
        let path = match value_to_path(returned) {
            Ok(path) => path,
            Err(e) => return Err(RuntimeError { output, ..e }),
        };
        let visited = recorder.take();

        log::debug!(
            "findPath returned {} after {} visits",
            path.as_ref().map(|p| format!("{} steps", p.len())).unwrap_or_else(|| "no path".into()),
            visited.len()
        );

        Ok(Execution { visited, path, output })
    }
}

/// Build the Lua array-of-arrays view of the grid.
fn grid_to_table(lua: &Lua, args: &PathArgs<'_>) -> mlua::Result<Table> {
    let rows = args
        .grid
        .iter_rows()
        .map(|row| lua.create_sequence_from(row.iter().map(|cell| cell.code() as i64)))
        .collect::<mlua::Result<Vec<Table>>>()?;
    lua.create_sequence_from(rows)
}

fn to_coord(n: i64) -> mlua::Result<i32> {
    i32::try_from(n).map_err(|_| mlua::Error::external(format!("coordinate {} out of range", n)))
}

fn malformed(what: impl std::fmt::Display) -> RuntimeError {
    RuntimeError {
        message: format!(
            "{} must return a list of {{row, col}} pairs or nil, got {}",
            ENTRY_POINT, what
        ),
        budget_exceeded: false,
        output: Vec::new(),
    }
}

/// Convert the returned Lua value into a path.
///
/// `nil` and `false` mean "no path". A table must be a sequence of
/// `{row, col}` (or `{row = r, col = c}`) entries.
fn value_to_path(value: Value) -> Result<Option<Vec<Position>>, RuntimeError> {
    let table = match value {
        Value::Nil | Value::Boolean(false) => return Ok(None),
        Value::Table(t) => t,
        other => return Err(malformed(other.type_name())),
    };

    let mut path = Vec::new();
    for (i, entry) in table.sequence_values::<Value>().enumerate() {
        let entry = entry.map_err(|e| malformed(format_lua_error(&e)))?;
        let Value::Table(pair) = entry else {
            return Err(malformed(format!("{} at index {}", entry.type_name(), i + 1)));
        };
        let row = pair_coord(&pair, 1, "row").ok_or_else(|| malformed(format!("bad row at index {}", i + 1)))?;
        let col = pair_coord(&pair, 2, "col").ok_or_else(|| malformed(format!("bad col at index {}", i + 1)))?;
        path.push(Position::new(row, col));
    }
    Ok(Some(path))
}

fn pair_coord(pair: &Table, index: i64, key: &str) -> Option<i32> {
    let value = match pair.raw_get::<Value>(index).ok()? {
        Value::Nil => pair.raw_get::<Value>(key).ok()?,
        v => v,
    };
    match value {
        Value::Integer(n) => i32::try_from(n).ok(),
        Value::Number(n) if n.fract() == 0.0 && n.abs() <= i32::MAX as f64 => Some(n as i32),
        _ => None,
    }
}

/// Convert a Lua value to a display string.
fn lua_value_to_string(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{:.0}", n)
            } else {
                format!("{}", n)
            }
        }
        Value::String(s) => s.to_str().map(|s| s.to_string()).unwrap_or_else(|_| "<invalid utf8>".to_string()),
        Value::Table(_) => "table".to_string(),
        Value::Function(_) => "function".to_string(),
        other => other.type_name().to_string(),
    }
}

/// Format a Lua error for display: no chunk prefix, no traceback.
fn format_lua_error(error: &mlua::Error) -> String {
    let raw = match error {
        mlua::Error::SyntaxError { message, .. } => message.clone(),
        mlua::Error::RuntimeError(msg) => msg.clone(),
        mlua::Error::CallbackError { cause, .. } => return format_lua_error(cause),
        _ => error.to_string(),
    };
    let first = raw.split("\nstack traceback:").next().unwrap_or(&raw).trim_end();
    match first.find("]:") {
        Some(idx) if first.starts_with("[string") => {
            // `[string "solution"]:3: message` -> `line 3: message`
            let rest = &first[idx + 2..];
            match rest.split_once(": ") {
                Some((line, msg)) if line.chars().all(|c| c.is_ascii_digit()) => {
                    format!("line {}: {}", line, msg)
                }
                _ => rest.to_string(),
            }
        }
        _ => first.to_string(),
    }
}
