//! The rule dispatcher.
//!
//! `evaluate(item, descriptor, parts)` always returns a verdict with a
//! non-empty explanation. Unknown rules fail, argument errors fail,
//! predicate errors fail, and a panicking predicate fails; nothing
//! propagates out.
//!
//! Predicate errors and panics are reported as
//! `<rule>: <class>: <message>` followed by a newline and the stack,
//! trimmed at the dispatcher frame.

use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use super::descriptor::Descriptor;
use super::registry::Registry;
use crate::language::Language;
use crate::predicates::Input;
use crate::types::{Item, Verdict};

/// Explanation when every extracted part is blank.
pub const NO_CANDIDATES: &str = "no candidates found";

/// Routes rule descriptors to predicates.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'r> {
    registry: &'r Registry,
}

impl Dispatcher<'static> {
    /// Dispatcher over the built-in registry.
    pub fn new() -> Self {
        Self {
            registry: Registry::global(),
        }
    }
}

impl Default for Dispatcher<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> Dispatcher<'r> {
    /// Dispatcher over a custom registry.
    pub fn with_registry(registry: &'r Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Evaluate one rule descriptor against extracted parts of `item`'s response.
    pub fn evaluate(&self, item: &Item, descriptor: &str, parts: &[String]) -> Verdict {
        let parsed = match Descriptor::parse(descriptor) {
            Ok(d) => d,
            Err(_) => return unrecognized(descriptor),
        };
        let resolved = match self.registry.resolve(&parsed) {
            Ok(Some(r)) => r,
            Ok(None) => return unrecognized(descriptor),
            Err(e) => return Verdict::fail(format!("{}: ArgumentError: {}", parsed.name, e)),
        };
        let spec = resolved.spec;

        let args = match resolved.args() {
            Ok(args) => args,
            Err(e) => return Verdict::fail(format!("{}: ArgumentError: {}", spec.name, e)),
        };

        if spec.reads_parts && parts.iter().all(|p| p.trim().is_empty()) {
            return Verdict::fail(NO_CANDIDATES);
        }

        let language = match spec.language {
            Language::Generic => working_language(item, parts),
            lang => lang,
        };

        let input = Input {
            parts,
            question: &item.question,
            response: &item.model_response,
            schema: item.json_schema.as_ref(),
            language,
        };

        tracing::debug!(rule = %spec.name, language = %language, parts = parts.len(), "Dispatching rule");

        match guarded_call(|| (spec.predicate)(&input, &args)) {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(e)) => Verdict::fail(format!(
                "{}: {}: {}\n{}",
                spec.name,
                e.kind(),
                e,
                render_stack(&Backtrace::force_capture())
            )),
            Err((payload, stack)) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::warn!(rule = %spec.name, panic = %message, "Predicate panicked");
                Verdict::fail(format!("{}: panic: {}\n{}", spec.name, message, stack))
            }
        }
    }
}

thread_local! {
    static IN_PREDICATE: Cell<bool> = const { Cell::new(false) };
    static PANIC_STACK: RefCell<Option<String>> = const { RefCell::new(None) };
}

type PanicPayload = Box<dyn std::any::Any + Send + 'static>;

/// Run `f`, turning a panic into its payload plus the stack recorded at the
/// panic site.
///
/// The hook is installed once per process. Panics on threads that are not
/// inside a predicate go to the previous hook unchanged.
fn guarded_call<T>(f: impl FnOnce() -> T) -> Result<T, (PanicPayload, String)> {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if IN_PREDICATE.with(Cell::get) {
                let location = info
                    .location()
                    .map(|l| format!("at {}", l))
                    .unwrap_or_else(|| "at <unknown>".to_string());
                let stack = format!("{}\n{}", location, render_stack(&Backtrace::force_capture()));
                PANIC_STACK.with(|s| *s.borrow_mut() = Some(stack));
            } else {
                previous(info);
            }
        }));
    });

    let was_inside = IN_PREDICATE.with(|c| c.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    IN_PREDICATE.with(|c| c.set(was_inside));

    result.map_err(|payload| {
        let stack = PANIC_STACK
            .with(|s| s.borrow_mut().take())
            .unwrap_or_else(|| "at <unknown>".to_string());
        (payload, stack)
    })
}

/// Frames from the capture point down to `Dispatcher::evaluate`.
fn render_stack(backtrace: &Backtrace) -> String {
    let full = backtrace.to_string();
    let mut kept = Vec::new();
    let mut lines = full.lines().peekable();
    while let Some(line) = lines.next() {
        kept.push(line);
        if line.contains("Dispatcher") && line.contains("evaluate") {
            if let Some(at) = lines.peek().filter(|l| l.trim_start().starts_with("at ")) {
                kept.push(at);
            }
            break;
        }
    }
    let stack = kept.join("\n");
    if stack.trim().is_empty() {
        "<no stack>".to_string()
    } else {
        stack
    }
}

fn unrecognized(descriptor: &str) -> Verdict {
    Verdict::fail(format!("unrecognized rule: {}", descriptor.trim()))
}

/// Language for generic rules: the item hint, else detection over the parts.
fn working_language(item: &Item, parts: &[String]) -> Language {
    if let Some(lang) = item.language.as_deref().and_then(Language::from_name) {
        return lang;
    }
    Language::detect(&parts.join("\n"))
}
