//! VM instruction buffer and text emission.
//!
//! The compiler appends VM lines in generation order; the only
//! non-append operation is the function-header patch (spec §4.4): a
//! `function Class.sub {LOCALS}` placeholder is emitted before the body is
//! compiled, its index in the buffer is remembered, and it is rewritten
//! with the final local count once the body is known.

use crate::error::JackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl Segment {
    fn as_str(self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        }
    }
}

/// An ordered, append-mostly sequence of emitted VM lines.
#[derive(Default)]
pub struct InstructionBuffer {
    lines: Vec<String>,
}

impl InstructionBuffer {
    pub fn new() -> Self {
        InstructionBuffer::default()
    }

    pub fn push(&mut self, seg: Segment, index: usize) {
        self.lines.push(format!("push {} {}", seg.as_str(), index));
    }

    pub fn pop(&mut self, seg: Segment, index: usize) {
        self.lines.push(format!("pop {} {}", seg.as_str(), index));
    }

    pub fn arith(&mut self, op: &str) {
        self.lines.push(op.to_string());
    }

    pub fn label(&mut self, name: &str) {
        self.lines.push(format!("label {name}"));
    }

    pub fn goto(&mut self, name: &str) {
        self.lines.push(format!("goto {name}"));
    }

    pub fn if_goto(&mut self, name: &str) {
        self.lines.push(format!("if-goto {name}"));
    }

    pub fn call(&mut self, name: &str, n_args: usize) {
        self.lines.push(format!("call {name} {n_args}"));
    }

    pub fn ret(&mut self) {
        self.lines.push("return".to_string());
    }

    /// Emit a placeholder function header and return its index in the
    /// buffer so it can later be patched with the real local count.
    pub fn function_placeholder(&mut self, name: &str) -> usize {
        let index = self.lines.len();
        self.lines.push(format!("function {name} {{LOCALS}}"));
        index
    }

    /// Rewrite the placeholder at `index` with the final local count.
    /// Fails with `InternalAssertion` if `index` does not hold an
    /// unpatched placeholder — this should be unreachable for valid
    /// compiler control flow and exists so a bug fails loudly instead of
    /// emitting malformed VM text.
    pub fn patch_function_header(
        &mut self,
        index: usize,
        n_locals: usize,
    ) -> Result<(), JackError> {
        let line = self.lines.get_mut(index).ok_or_else(|| {
            JackError::InternalAssertion(format!("function header index {index} out of bounds"))
        })?;
        if !line.ends_with("{LOCALS}") {
            return Err(JackError::InternalAssertion(format!(
                "function header placeholder at index {index} already patched or missing: {line}"
            )));
        }
        *line = line.replace("{LOCALS}", &n_locals.to_string());
        Ok(())
    }

    pub fn into_text(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    #[cfg(test)]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_format_matches_vm_text_grammar() {
        let mut buf = InstructionBuffer::new();
        buf.push(Segment::Constant, 7);
        buf.pop(Segment::Local, 2);
        assert_eq!(buf.lines(), &["push constant 7", "pop local 2"]);
    }

    #[test]
    fn function_placeholder_is_patched_in_place() {
        let mut buf = InstructionBuffer::new();
        let idx = buf.function_placeholder("Foo.bar");
        buf.push(Segment::Constant, 0);
        buf.patch_function_header(idx, 3).unwrap();
        assert_eq!(buf.lines()[0], "function Foo.bar 3");
    }

    #[test]
    fn patching_twice_is_an_internal_error() {
        let mut buf = InstructionBuffer::new();
        let idx = buf.function_placeholder("Foo.bar");
        buf.patch_function_header(idx, 0).unwrap();
        let err = buf.patch_function_header(idx, 1).unwrap_err();
        assert!(matches!(err, JackError::InternalAssertion(_)));
    }
}
