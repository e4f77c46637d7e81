//! Terminal I/O stream bundle.
//!
//! [`IoStreams`] owns the three logical channels of a command invocation
//! (input, output, error output) together with TTY detection, color
//! capability state, pager and progress-indicator lifecycle, and terminal
//! sizing. Exactly one of {real OS handle, injected test buffer} backs
//! each stream; there is no global state, and multiple bundles coexist
//! without interference.
//!
//! Commands receive a bundle in their options struct and use
//! `println_out()` / `println_err()` (or the `term_println!` family of
//! macros) instead of `println!()` / `eprintln!()` so output can be
//! captured in tests.

use std::io::{self, IsTerminal, Read, Write};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use console::Term;

use crate::color::ColorScheme;
use crate::env::TermEnv;
use crate::pager::{self, PagerError, PagerPipe, PagerProcess};
use crate::progress::Spinner;

/// Terminal width used when every detection avenue fails.
///
/// Text layout must never crash a command, so width queries always
/// resolve to something.
pub const DEFAULT_WIDTH: usize = 80;

/// In-memory stream backing for test bundles. Reads consume from the
/// front; writes append. Cloning shares the same storage.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn contents(&self) -> Vec<u8> {
        self.lock().clone()
    }

    pub(crate) fn append(&self, bytes: &[u8]) {
        self.lock().extend_from_slice(bytes);
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for SharedBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.lock();
        let n = inner.len().min(buf.len());
        buf[..n].copy_from_slice(&inner[..n]);
        inner.drain(..n);
        Ok(n)
    }
}

/// What backs the readable side of the bundle.
#[derive(Debug)]
enum Source {
    /// The process's real stdin.
    Stdin,
    /// A shared in-memory buffer seeded by tests.
    Buffer(SharedBuffer),
}

/// The bundle's input stream.
///
/// Owned exclusively by the bundle and closed at most once; reads after
/// close return EOF.
#[derive(Debug)]
pub struct Input {
    source: Source,
    closed: bool,
}

impl Input {
    /// Mark the input as consumed. Idempotent.
    pub fn close(&mut self) {
        self.closed = true;
    }

    fn is_tty(&self) -> bool {
        match self.source {
            Source::Stdin => io::stdin().is_terminal(),
            Source::Buffer(_) => false,
        }
    }
}

impl Read for Input {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.closed {
            return Ok(0);
        }
        match &mut self.source {
            Source::Stdin => io::stdin().read(buf),
            Source::Buffer(buffer) => buffer.read(buf),
        }
    }
}

/// What backs a writable stream at any given moment.
#[derive(Debug)]
pub(crate) enum Sink {
    /// The process's real stdout.
    Stdout,
    /// The process's real stderr.
    Stderr,
    /// A shared in-memory buffer captured by tests.
    Buffer(SharedBuffer),
    /// The stdin pipe of an active pager.
    Pager(PagerPipe),
}

impl Sink {
    fn is_tty(&self) -> bool {
        match self {
            Self::Stdout => io::stdout().is_terminal(),
            Self::Stderr => io::stderr().is_terminal(),
            Self::Buffer(_) | Self::Pager(_) => false,
        }
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Stdout => io::stdout().write(buf),
            Self::Stderr => io::stderr().write(buf),
            Self::Buffer(buffer) => buffer.write(buf),
            Self::Pager(pipe) => pipe.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stdout => io::stdout().flush(),
            Self::Stderr => io::stderr().flush(),
            Self::Buffer(buffer) => buffer.flush(),
            Self::Pager(pipe) => pipe.flush(),
        }
    }
}

/// Identity of the handle that originally backed `Output`.
///
/// Terminal-size queries go through this, not through whatever pager
/// wrapping is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OriginalOut {
    Stdout,
    Buffer,
}

/// Terminal background classification for theme-aware rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    /// Light background.
    Light,
    /// Dark background.
    Dark,
    /// Undetectable or deliberately suppressed.
    None,
}

impl Theme {
    /// The name renderers key off of.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

type TtySizeFn = Box<dyn Fn() -> io::Result<(u16, u16)> + Send + Sync>;

/// Handles to the in-memory streams backing a test bundle, for seeding
/// stdin and asserting on captured output after the command ran.
#[derive(Debug, Clone)]
pub struct TestStreams {
    input: SharedBuffer,
    output: SharedBuffer,
    error: SharedBuffer,
}

impl TestStreams {
    /// Captured stdout, lossily decoded.
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.contents()).to_string()
    }

    /// Captured stderr, lossily decoded.
    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.error.contents()).to_string()
    }

    /// Append data for the bundle's input stream to read.
    pub fn write_input(&self, data: &str) {
        self.input.append(data.as_bytes());
    }
}

/// The terminal I/O stream bundle.
///
/// Owned by exactly one command invocation; not a singleton. The only
/// internally shared mutable state is the progress-indicator slot, which
/// carries its own mutex.
#[allow(clippy::struct_excessive_bools)]
pub struct IoStreams {
    input: Input,
    out: Sink,
    err: Sink,
    original_out: OriginalOut,

    env: TermEnv,
    color_enabled: bool,
    is_256_enabled: bool,
    has_true_color: bool,
    terminal_theme: Option<Theme>,

    progress_enabled: bool,
    progress: Mutex<Option<Spinner>>,

    stdin_tty_override: Option<bool>,
    stdout_tty_override: Option<bool>,
    stderr_tty_override: Option<bool>,
    term_width_override: Option<usize>,
    tty_size: TtySizeFn,

    pager_command: Option<String>,
    pager: Option<PagerProcess>,

    never_prompt: bool,
}

impl std::fmt::Debug for IoStreams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoStreams")
            .field("color_enabled", &self.color_enabled)
            .field("progress_enabled", &self.progress_enabled)
            .field("pager_command", &self.pager_command)
            .field("pager_active", &self.pager.is_some())
            .field("never_prompt", &self.never_prompt)
            .finish_non_exhaustive()
    }
}

impl IoStreams {
    /// Create a bundle bound to the process's real stdin/stdout/stderr.
    ///
    /// The environment is snapshotted once, here; nothing else in the
    /// bundle reads it afterwards.
    pub fn system() -> Self {
        let env = TermEnv::from_env();
        let stdout_is_tty = io::stdout().is_terminal();
        let stderr_is_tty = io::stderr().is_terminal();

        Self {
            input: Input {
                source: Source::Stdin,
                closed: false,
            },
            out: Sink::Stdout,
            err: Sink::Stderr,
            original_out: OriginalOut::Stdout,
            color_enabled: env.color_forced() || (!env.color_disabled() && stdout_is_tty),
            is_256_enabled: env.is_256_color_supported(),
            has_true_color: env.is_true_color_supported(),
            terminal_theme: None,
            progress_enabled: stdout_is_tty && stderr_is_tty,
            progress: Mutex::new(None),
            // pin the answers so repeated queries skip the handle probe
            stdout_tty_override: Some(stdout_is_tty),
            stderr_tty_override: Some(stderr_is_tty),
            stdin_tty_override: None,
            term_width_override: None,
            tty_size: Box::new(system_tty_size),
            pager_command: env.pager.clone().filter(|cmd| !cmd.is_empty()),
            pager: None,
            never_prompt: false,
            env,
        }
    }

    /// Create a hermetic bundle for tests: in-memory streams, no TTYs,
    /// empty environment, failing size provider.
    ///
    /// Every TTY flag defaults to false and is settable independently.
    /// The returned [`TestStreams`] seeds stdin and reads captured
    /// output.
    pub fn test() -> (Self, TestStreams) {
        let streams = TestStreams {
            input: SharedBuffer::default(),
            output: SharedBuffer::default(),
            error: SharedBuffer::default(),
        };

        let bundle = Self {
            input: Input {
                source: Source::Buffer(streams.input.clone()),
                closed: false,
            },
            out: Sink::Buffer(streams.output.clone()),
            err: Sink::Buffer(streams.error.clone()),
            original_out: OriginalOut::Buffer,
            env: TermEnv::default(),
            color_enabled: false,
            is_256_enabled: false,
            has_true_color: false,
            terminal_theme: None,
            progress_enabled: false,
            progress: Mutex::new(None),
            stdin_tty_override: None,
            stdout_tty_override: None,
            stderr_tty_override: None,
            term_width_override: None,
            tty_size: Box::new(|| Err(io::Error::other("tty size not available in tests"))),
            pager_command: None,
            pager: None,
            never_prompt: false,
        };

        (bundle, streams)
    }

    // --- TTY state ---

    /// Whether stdin is connected to a terminal. Overrides win over
    /// handle probes; a pipe or buffer is never a TTY.
    pub fn is_stdin_tty(&self) -> bool {
        self.stdin_tty_override
            .unwrap_or_else(|| self.input.is_tty())
    }

    /// Whether stdout is connected to a terminal.
    pub fn is_stdout_tty(&self) -> bool {
        self.stdout_tty_override.unwrap_or_else(|| self.out.is_tty())
    }

    /// Whether stderr is connected to a terminal.
    pub fn is_stderr_tty(&self) -> bool {
        self.stderr_tty_override.unwrap_or_else(|| self.err.is_tty())
    }

    /// Override stdin TTY state. Idempotent.
    pub fn set_stdin_tty(&mut self, is_tty: bool) {
        self.stdin_tty_override = Some(is_tty);
    }

    /// Override stdout TTY state. Idempotent.
    pub fn set_stdout_tty(&mut self, is_tty: bool) {
        self.stdout_tty_override = Some(is_tty);
    }

    /// Override stderr TTY state. Idempotent.
    pub fn set_stderr_tty(&mut self, is_tty: bool) {
        self.stderr_tty_override = Some(is_tty);
    }

    // --- Prompting ---

    /// Whether interactive prompts may be shown: both stdin and stdout
    /// are TTYs and prompting has not been permanently disabled.
    pub fn can_prompt(&self) -> bool {
        if self.never_prompt {
            return false;
        }
        self.is_stdin_tty() && self.is_stdout_tty()
    }

    /// Permanently disable interactive prompting, for non-interactive
    /// automation contexts. One-way: there is no way to re-enable it.
    pub fn set_never_prompt(&mut self) {
        self.never_prompt = true;
    }

    /// Whether prompting has been permanently disabled.
    pub fn never_prompt(&self) -> bool {
        self.never_prompt
    }

    // --- Color ---

    /// Whether colorized output is enabled.
    pub fn color_enabled(&self) -> bool {
        self.color_enabled
    }

    /// Explicitly enable or disable color (e.g. from a `--color` flag).
    pub fn set_color_enabled(&mut self, enabled: bool) {
        self.color_enabled = enabled;
    }

    /// Whether the terminal supports the 256-color palette.
    pub fn color_support_256(&self) -> bool {
        self.is_256_enabled
    }

    /// Whether the terminal supports 24-bit color.
    pub fn has_true_color(&self) -> bool {
        self.has_true_color
    }

    /// Derive a [`ColorScheme`] from the bundle's current state.
    ///
    /// The scheme is a value: re-derive it after anything that changes
    /// color state (like [`force_terminal`](Self::force_terminal)).
    pub fn color_scheme(&self) -> ColorScheme {
        ColorScheme::new(self.color_enabled, self.is_256_enabled, self.has_true_color)
    }

    // --- Theme ---

    /// Classify the terminal background.
    ///
    /// Call before `start_pager` for a reliable answer; once a pager owns
    /// the terminal the theme reads as [`Theme::None`]. Detection runs at
    /// most once; the result is cached.
    pub fn terminal_theme(&mut self) -> Theme {
        match self.terminal_theme {
            Some(theme) => theme,
            None => self.detect_terminal_theme(),
        }
    }

    /// Re-run background detection and cache the result.
    pub fn detect_terminal_theme(&mut self) -> Theme {
        let pinned_style = self
            .env
            .md_style
            .as_deref()
            .is_some_and(|style| !style.is_empty() && style != "auto");

        let theme = if !self.color_enabled || self.pager.is_some() || pinned_style {
            Theme::None
        } else {
            match self.env.background_hint() {
                Some(7 | 15) => Theme::Light,
                _ => Theme::Dark,
            }
        };
        self.terminal_theme = Some(theme);
        theme
    }

    // --- Output ---

    /// The current output stream (pager pipe while a pager is active).
    pub fn out(&mut self) -> &mut dyn Write {
        &mut self.out
    }

    /// The error output stream.
    pub fn err_out(&mut self) -> &mut dyn Write {
        &mut self.err
    }

    /// The input stream.
    pub fn input(&mut self) -> &mut Input {
        &mut self.input
    }

    /// Write a string to output. Write errors are discarded.
    pub fn print_out(&mut self, s: &str) {
        let _ = self.out.write_all(s.as_bytes());
    }

    /// Write a string to output followed by a newline.
    pub fn println_out(&mut self, s: &str) {
        let _ = writeln!(self.out, "{s}");
    }

    /// Write a string to error output.
    pub fn print_err(&mut self, s: &str) {
        let _ = self.err.write_all(s.as_bytes());
    }

    /// Write a string to error output followed by a newline.
    pub fn println_err(&mut self, s: &str) {
        let _ = writeln!(self.err, "{s}");
    }

    /// Write formatted output.
    pub fn write_out(&mut self, args: std::fmt::Arguments<'_>) {
        let _ = self.out.write_fmt(args);
    }

    /// Write formatted output with a trailing newline.
    pub fn writeln_out(&mut self, args: std::fmt::Arguments<'_>) {
        let _ = self.out.write_fmt(args);
        let _ = self.out.write_all(b"\n");
    }

    /// Write formatted error output.
    pub fn write_err(&mut self, args: std::fmt::Arguments<'_>) {
        let _ = self.err.write_fmt(args);
    }

    /// Write formatted error output with a trailing newline.
    pub fn writeln_err(&mut self, args: std::fmt::Arguments<'_>) {
        let _ = self.err.write_fmt(args);
        let _ = self.err.write_all(b"\n");
    }

    /// Read a user-supplied file, with `"-"` meaning the bundle's input
    /// stream (which is consumed and closed).
    pub fn read_user_file(&mut self, path: &str) -> io::Result<Vec<u8>> {
        if path == "-" {
            let mut data = Vec::new();
            self.input.read_to_end(&mut data)?;
            self.input.close();
            return Ok(data);
        }
        std::fs::read(path)
    }

    // --- Pager ---

    /// Configure the pager command line. An empty command clears it.
    pub fn set_pager(&mut self, cmd: impl Into<String>) {
        let cmd = cmd.into();
        self.pager_command = if cmd.is_empty() { None } else { Some(cmd) };
    }

    /// The configured pager command, if any.
    pub fn pager_command(&self) -> Option<&str> {
        self.pager_command.as_deref()
    }

    /// Redirect output through the configured pager.
    ///
    /// A no-op when no pager is configured, the pager is the trivial
    /// `cat` passthrough, output is not a TTY, or a pager is already
    /// active. On any failure output is left unmodified; there is no
    /// partial swap.
    pub fn start_pager(&mut self) -> Result<(), PagerError> {
        if self.pager.is_some() {
            return Ok(());
        }
        let Some(pager_cmd) = self.pager_command.clone() else {
            return Ok(());
        };
        if pager_cmd == "cat" || !self.is_stdout_tty() {
            return Ok(());
        }

        let args =
            shlex::split(&pager_cmd).ok_or_else(|| PagerError::BadCommand(pager_cmd.clone()))?;
        let Some((exe_name, exe_args)) = args.split_first() else {
            return Ok(());
        };
        let exe = which::which(exe_name)?;

        let mut command = Command::new(exe);
        command
            .args(exe_args)
            .stdin(Stdio::piped())
            // strip the selection variable so the pager can't recurse
            .env_remove("PAGER");
        if self.env.less.is_none() {
            command.env("LESS", "FRX");
        }
        if self.env.lv.is_none() {
            command.env("LV", "-c");
        }

        // Wire the child's stdout/stderr to the bundle's current streams:
        // real handles are inherited, buffer-backed streams get a pump.
        let out_buffer = match &self.out {
            Sink::Buffer(buffer) => {
                command.stdout(Stdio::piped());
                Some(buffer.clone())
            }
            _ => {
                command.stdout(Stdio::inherit());
                None
            }
        };
        let err_buffer = match &self.err {
            Sink::Buffer(buffer) => {
                command.stderr(Stdio::piped());
                Some(buffer.clone())
            }
            _ => {
                command.stderr(Stdio::inherit());
                None
            }
        };

        let mut child = command.spawn().map_err(PagerError::Spawn)?;
        let stdin = child.stdin.take().ok_or(PagerError::StdinUnavailable)?;

        let mut pumps = Vec::new();
        if let Some(buffer) = out_buffer
            && let Some(child_out) = child.stdout.take()
        {
            pumps.push(pager::pump(child_out, buffer));
        }
        if let Some(buffer) = err_buffer
            && let Some(child_err) = child.stderr.take()
        {
            pumps.push(pager::pump(child_err, buffer));
        }

        tracing::debug!(command = %pager_cmd, "started pager");
        let restore = std::mem::replace(&mut self.out, Sink::Pager(PagerPipe::new(stdin)));
        self.pager = Some(PagerProcess {
            child,
            pumps,
            restore,
        });
        Ok(())
    }

    /// Tear down an active pager; safe no-op when idle.
    ///
    /// Closes the write side of the pipe before waiting for the child,
    /// otherwise a pager still reading its stdin would never see EOF and
    /// the wait would hang.
    pub fn stop_pager(&mut self) {
        let Some(mut pager) = self.pager.take() else {
            return;
        };

        let pipe = std::mem::replace(&mut self.out, pager.restore);
        drop(pipe);
        let _ = pager.child.wait();
        for pump in pager.pumps {
            let _ = pump.join();
        }
        tracing::debug!("stopped pager");
    }

    // --- Progress indicator ---

    /// Start (or keep) an unlabeled spinner on the error stream.
    pub fn start_progress_indicator(&self) {
        self.start_progress_indicator_with_label("");
    }

    /// Start a spinner with a label, or update the label of the one
    /// already running (no stop/restart flicker).
    ///
    /// No-op unless both stdout and stderr were TTYs when the bundle was
    /// constructed.
    pub fn start_progress_indicator_with_label(&self, label: &str) {
        if !self.progress_enabled {
            return;
        }
        let mut guard = self
            .progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(spinner) = guard.as_ref() {
            spinner.set_label(label);
            return;
        }
        *guard = Some(Spinner::start(label));
    }

    /// Stop and discard the spinner if one is active; safe no-op
    /// otherwise.
    pub fn stop_progress_indicator(&self) {
        let mut guard = self
            .progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(spinner) = guard.take() {
            spinner.stop();
        }
    }

    // --- Terminal size ---

    /// Width of the terminal the output stream is attached to.
    ///
    /// Resolution order: explicit override, OS size query against the
    /// original (un-wrapped) output handle, the external `tput cols`
    /// probe, and finally [`DEFAULT_WIDTH`]. Never an error.
    pub fn terminal_width(&self) -> usize {
        if let Some(width) = self.term_width_override {
            return width;
        }
        // An in-memory sink has no handle to measure.
        if self.original_out != OriginalOut::Stdout {
            return DEFAULT_WIDTH;
        }
        if let Some((_, cols)) = Term::stdout().size_checked() {
            return usize::from(cols);
        }
        // Emulated terminals where the size ioctl fails but a terminal
        // is attached (Cygwin-style).
        if let Some(width) = tput_cols() {
            return width;
        }
        DEFAULT_WIDTH
    }

    /// Width of the terminal the *process* is attached to, regardless of
    /// where output is going.
    pub fn process_terminal_width(&self) -> usize {
        match (self.tty_size)() {
            Ok((width, _)) => usize::from(width),
            Err(_) => DEFAULT_WIDTH,
        }
    }

    /// Force TTY behavior onto the output stream.
    ///
    /// `spec` is a literal width (`"72"`), a percentage of the real
    /// detected width (`"50%"`), or anything else (conventionally
    /// `"true"`) for the real detected width. Marks stdout as a TTY and
    /// recomputes color enablement from the environment snapshot.
    pub fn force_terminal(&mut self, spec: &str) {
        self.color_enabled = !self.env.color_disabled();
        self.set_stdout_tty(true);

        if let Ok(width) = spec.parse::<usize>() {
            self.term_width_override = Some(width);
            return;
        }

        let Ok((width, _)) = (self.tty_size)() else {
            return;
        };
        let mut width = usize::from(width);
        if let Some(percent) = spec.strip_suffix('%')
            && let Ok(percent) = percent.parse::<usize>()
        {
            width = width * percent / 100;
        }
        self.term_width_override = Some(width);
    }
}

fn system_tty_size() -> io::Result<(u16, u16)> {
    for term in [Term::stdout(), Term::stderr()] {
        if let Some((rows, cols)) = term.size_checked() {
            return Ok((cols, rows));
        }
    }
    Err(io::Error::other("process is not attached to a terminal"))
}

fn tput_cols() -> Option<usize> {
    let exe = which::which("tput").ok()?;
    let output = Command::new(exe)
        .arg("cols")
        .stdin(Stdio::inherit())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout).trim().parse().ok()
}

/// Write to a bundle's output, like `print!()`.
#[macro_export]
macro_rules! term_print {
    ($io:expr, $($arg:tt)*) => {
        $io.write_out(format_args!($($arg)*))
    };
}

/// Write to a bundle's output with a newline, like `println!()`.
#[macro_export]
macro_rules! term_println {
    ($io:expr) => {
        $io.println_out("")
    };
    ($io:expr, $($arg:tt)*) => {
        $io.writeln_out(format_args!($($arg)*))
    };
}

/// Write to a bundle's error output, like `eprint!()`.
#[macro_export]
macro_rules! term_eprint {
    ($io:expr, $($arg:tt)*) => {
        $io.write_err(format_args!($($arg)*))
    };
}

/// Write to a bundle's error output with a newline, like `eprintln!()`.
#[macro_export]
macro_rules! term_eprintln {
    ($io:expr) => {
        $io.println_err("")
    };
    ($io:expr, $($arg:tt)*) => {
        $io.writeln_err(format_args!($($arg)*))
    };
}
