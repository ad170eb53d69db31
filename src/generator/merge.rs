//! A light structural model of an existing Rust source file.
//!
//! The merge engine never re-parses Rust properly. It works on lines and
//! recognises the few constructs it edits: doc comments (both the `///` and
//! the `/** */` conventions, outer and inner), `use` and `mod` items,
//! function declarations and marker comments. Every edit reports whether it
//! changed anything so callers can skip unchanged writes.

use regex::Regex;

/// The two doc comment conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocStyle {
    /// `///` or `//!` on every line
    Line,
    /// `/** ... */` or `/*! ... */`
    Block,
}

/// Render `text` as doc comment lines (without indentation). Empty text
/// renders as no lines.
pub fn render_doc(text: &str, inner: bool, style: DocStyle) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    match style {
        DocStyle::Line => {
            let marker = if inner { "//!" } else { "///" };
            text.lines()
                .map(|l| {
                    let l = l.trim_end();
                    if l.is_empty() {
                        marker.to_string()
                    } else {
                        format!("{marker} {l}")
                    }
                })
                .collect()
        }
        DocStyle::Block => {
            let mut lines = vec![if inner { "/*!" } else { "/**" }.to_string()];
            lines.extend(text.lines().map(|l| {
                let l = l.trim_end();
                if l.is_empty() {
                    " *".to_string()
                } else {
                    format!(" * {l}")
                }
            }));
            lines.push(" */".to_string());
            lines
        }
    }
}

fn normalize(text: &str) -> String {
    text.trim()
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DocBlock {
    start: usize,
    end: usize,
    style: DocStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    lines: Vec<String>,
    trailing_newline: bool,
}

fn indent_of(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

fn is_outer_line_doc(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("///") && !t.starts_with("////")
}

fn is_inner_line_doc(line: &str) -> bool {
    line.trim_start().starts_with("//!")
}

fn is_attribute(line: &str) -> bool {
    line.trim_start().starts_with("#[")
}

/// `use a::b;`, `pub use a::b;`, `pub(crate) use a::{b, c};` at column 0.
fn is_use_start(line: &str) -> bool {
    let rest = strip_visibility(line);
    rest.starts_with("use ") && !line.starts_with(char::is_whitespace)
}

fn strip_visibility(line: &str) -> &str {
    let t = line.trim_start();
    if let Some(rest) = t.strip_prefix("pub(") {
        match rest.find(')') {
            Some(i) => rest[i + 1..].trim_start(),
            None => t,
        }
    } else if let Some(rest) = t.strip_prefix("pub ") {
        rest.trim_start()
    } else {
        t
    }
}

/// The module name declared by a `mod name;` line, if it is one.
fn declared_mod(line: &str) -> Option<&str> {
    if line.starts_with(char::is_whitespace) {
        return None;
    }
    strip_visibility(line)
        .strip_prefix("mod ")
        .and_then(|r| r.trim().strip_suffix(';'))
        .map(str::trim)
}

fn squash(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl SourceFile {
    pub fn parse(text: &str) -> Self {
        SourceFile {
            lines: text.lines().map(str::to_string).collect(),
            trailing_newline: text.is_empty() || text.ends_with('\n'),
        }
    }

    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        if self.trailing_newline && !self.lines.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Line index of the declaration of function `name`.
    pub fn find_fn(&self, name: &str) -> Option<usize> {
        self.lines.iter().position(|line| {
            let rest = strip_visibility(line);
            let rest = rest.strip_prefix("async ").unwrap_or(rest);
            rest.strip_prefix("fn ")
                .and_then(|r| r.strip_prefix(name))
                .is_some_and(|r| r.starts_with('(') || r.starts_with('<'))
        })
    }

    /// First line of the attributes directly above `decl`, or `decl`.
    fn item_start(&self, decl: usize) -> usize {
        let mut i = decl;
        while i > 0 && is_attribute(&self.lines[i - 1]) {
            i -= 1;
        }
        i
    }

    fn outer_doc_above(&self, decl: usize) -> Option<DocBlock> {
        let end = self.item_start(decl);
        if end == 0 {
            return None;
        }
        let last = &self.lines[end - 1];
        if is_outer_line_doc(last) {
            let mut start = end - 1;
            while start > 0 && is_outer_line_doc(&self.lines[start - 1]) {
                start -= 1;
            }
            return Some(DocBlock {
                start,
                end,
                style: DocStyle::Line,
            });
        }
        if last.trim_end().ends_with("*/") {
            let start = self.block_open(end - 1)?;
            let t = self.lines[start].trim_start();
            if !t.starts_with("/**") || t.starts_with("/**/") || t.starts_with("/***") {
                return None;
            }
            return Some(DocBlock {
                start,
                end,
                style: DocStyle::Block,
            });
        }
        None
    }

    /// Line opening the block comment that closes on line `close`. `None`
    /// when an earlier comment closes in between.
    fn block_open(&self, close: usize) -> Option<usize> {
        let mut i = close;
        loop {
            let line = &self.lines[i];
            if i < close && line.contains("*/") {
                return None;
            }
            if line.contains("/*") {
                return Some(i);
            }
            i = i.checked_sub(1)?;
        }
    }

    fn inner_doc(&self) -> Option<DocBlock> {
        let first = self.lines.iter().position(|l| !l.trim().is_empty())?;
        let line = self.lines[first].trim_start();
        if is_inner_line_doc(line) {
            let mut end = first + 1;
            while end < self.lines.len() && is_inner_line_doc(&self.lines[end]) {
                end += 1;
            }
            return Some(DocBlock {
                start: first,
                end,
                style: DocStyle::Line,
            });
        }
        if line.starts_with("/*!") {
            let close = (first..self.lines.len()).find(|&i| self.lines[i].contains("*/"))?;
            return Some(DocBlock {
                start: first,
                end: close + 1,
                style: DocStyle::Block,
            });
        }
        None
    }

    fn doc_text(&self, block: DocBlock) -> String {
        let lines = &self.lines[block.start..block.end];
        let text: Vec<&str> = match block.style {
            DocStyle::Line => lines
                .iter()
                .map(|l| {
                    let t = l.trim_start();
                    let t = t
                        .strip_prefix("///")
                        .or_else(|| t.strip_prefix("//!"))
                        .unwrap_or(t);
                    t.strip_prefix(' ').unwrap_or(t)
                })
                .collect(),
            DocStyle::Block => lines
                .iter()
                .map(|l| {
                    let t = l.trim();
                    let t = t
                        .strip_prefix("/**")
                        .or_else(|| t.strip_prefix("/*!"))
                        .unwrap_or(t);
                    let t = t.strip_suffix("*/").unwrap_or(t).trim_end();
                    let t = t.strip_prefix('*').unwrap_or(t);
                    t.strip_prefix(' ').unwrap_or(t)
                })
                .collect(),
        };
        normalize(&text.join("\n"))
    }

    fn replace_lines(&mut self, start: usize, end: usize, new: Vec<String>) {
        self.lines.splice(start..end, new);
    }

    /// Make the doc comment of function `name` read `text`, keeping the
    /// existing comment convention. Returns whether the file changed.
    pub fn sync_fn_doc(&mut self, name: &str, text: &str) -> bool {
        let Some(decl) = self.find_fn(name) else {
            return false;
        };
        let indent = indent_of(&self.lines[decl]).to_string();
        let desired = normalize(text);
        match self.outer_doc_above(decl) {
            Some(block) => {
                if self.doc_text(block) == desired {
                    return false;
                }
                let new = render_doc(&desired, false, block.style)
                    .into_iter()
                    .map(|l| format!("{indent}{l}"))
                    .collect();
                self.replace_lines(block.start, block.end, new);
                true
            }
            None if desired.is_empty() => false,
            None => {
                let at = self.item_start(decl);
                let new = render_doc(&desired, false, DocStyle::Line)
                    .into_iter()
                    .map(|l| format!("{indent}{l}"))
                    .collect();
                self.replace_lines(at, at, new);
                true
            }
        }
    }

    /// Make the file's inner doc comment read `text`.
    pub fn sync_inner_doc(&mut self, text: &str) -> bool {
        let desired = normalize(text);
        match self.inner_doc() {
            Some(block) => {
                if self.doc_text(block) == desired {
                    return false;
                }
                self.replace_lines(
                    block.start,
                    block.end,
                    render_doc(&desired, true, block.style),
                );
                true
            }
            None if desired.is_empty() => false,
            None => {
                let mut new = render_doc(&desired, true, DocStyle::Line);
                new.push(String::new());
                self.replace_lines(0, 0, new);
                true
            }
        }
    }

    /// Index after the file preamble: inner docs, inner attributes and the
    /// blank lines that follow them.
    fn preamble_end(&self) -> usize {
        let mut i = self.inner_doc().map_or(0, |b| b.end);
        while i < self.lines.len() {
            let t = self.lines[i].trim_start();
            if t.is_empty() || t.starts_with("#![") {
                i += 1;
            } else {
                break;
            }
        }
        i
    }

    /// End (exclusive) of the statement starting at `start`, i.e. the line
    /// after the one carrying its terminating `;`.
    fn statement_end(&self, start: usize) -> usize {
        (start..self.lines.len())
            .find(|&i| self.lines[i].trim_end().ends_with(';'))
            .map_or(start + 1, |i| i + 1)
    }

    pub fn has_use(&self, stmt: &str) -> bool {
        let want = squash(stmt);
        self.lines.iter().any(|l| squash(l) == want)
    }

    /// Add a `use` line after the last top-level `use` item, unless an
    /// identical line exists.
    pub fn ensure_use(&mut self, stmt: &str) -> bool {
        if self.has_use(stmt) {
            return false;
        }
        match self.lines.iter().rposition(|l| is_use_start(l)) {
            Some(last) => {
                let at = self.statement_end(last);
                self.replace_lines(at, at, vec![stmt.to_string()]);
            }
            None => {
                let at = self.preamble_end();
                self.replace_lines(at, at, vec![stmt.to_string(), String::new()]);
            }
        }
        true
    }

    pub fn has_mod(&self, name: &str) -> bool {
        self.lines.iter().any(|l| declared_mod(l) == Some(name))
    }

    /// Add a module declaration (with any attribute lines above it) after
    /// the last `mod` item, unless module `name` is already declared.
    pub fn ensure_mod(&mut self, name: &str, decl: &[&str]) -> bool {
        if self.has_mod(name) {
            return false;
        }
        let new: Vec<String> = decl.iter().map(|l| (*l).to_string()).collect();
        match self.lines.iter().rposition(|l| declared_mod(l).is_some()) {
            Some(last) => self.replace_lines(last + 1, last + 1, new),
            None => {
                let at = self.preamble_end();
                let mut new = new;
                new.push(String::new());
                self.replace_lines(at, at, new);
            }
        }
        true
    }

    /// Wrap every `return Err(ident);` in `errors::trace`. Returns the
    /// number of rewritten lines.
    pub fn rewrite_err_returns(&mut self, err_return: &Regex) -> usize {
        let mut count = 0;
        for line in &mut self.lines {
            if err_return.is_match(line) {
                *line = err_return
                    .replace_all(line, "return Err(errors::trace($1));")
                    .into_owned();
                count += 1;
            }
        }
        count
    }

    /// Insert `line` (indented like the marker) right before the line
    /// containing `marker`. `None` when the marker is missing.
    pub fn insert_before_marker(&mut self, marker: &str, line: &str) -> Option<bool> {
        let at = self.lines.iter().position(|l| l.contains(marker))?;
        if self.has_use(line) {
            return Some(false);
        }
        let indent = indent_of(&self.lines[at]).to_string();
        self.replace_lines(at, at, vec![format!("{indent}{line}")]);
        Some(true)
    }

    /// Append `text` at the end of the file, separated by a blank line.
    pub fn append(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        while self.lines.last().is_some_and(|l| l.trim().is_empty()) {
            self.lines.pop();
        }
        if !self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.lines
            .extend(text.trim_matches('\n').lines().map(str::to_string));
        self.trailing_newline = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE: &str = "\
//! Old description.

use fabric::{Context, Error};

pub struct Service;

impl Service {
    /// Old doc.
    pub fn add(&self, ctx: &Context, x: i64) -> Result<i64, Error> {
        Ok(x)
    }

    /**
     * Block doc.
     */
    #[allow(unused_variables)]
    pub fn sub(&self, ctx: &Context) -> Result<(), Error> {
        Ok(())
    }

    pub fn mul(&self) {}
}
";

    #[test]
    fn test_render_roundtrip() {
        let f = SourceFile::parse(SERVICE);
        assert_eq!(f.render(), SERVICE);
    }

    #[test]
    fn test_sync_line_doc() {
        let mut f = SourceFile::parse(SERVICE);
        assert!(f.sync_fn_doc("add", "Adds numbers.\n\nReally."));
        assert!(f.render().contains("    /// Adds numbers.\n    ///\n    /// Really.\n    pub fn add("));
        assert!(!f.sync_fn_doc("add", "Adds numbers.\n\nReally."));
    }

    #[test]
    fn test_sync_block_doc_keeps_style() {
        let mut f = SourceFile::parse(SERVICE);
        assert!(!f.sync_fn_doc("sub", "Block doc."));
        assert!(f.sync_fn_doc("sub", "Subtracts."));
        let out = f.render();
        assert!(out.contains("    /**\n     * Subtracts.\n     */\n    #[allow(unused_variables)]\n    pub fn sub("), "{out}");
    }

    #[test]
    fn test_sync_missing_doc_inserts() {
        let mut f = SourceFile::parse(SERVICE);
        assert!(f.sync_fn_doc("mul", "Multiplies."));
        assert!(f.render().contains("    /// Multiplies.\n    pub fn mul(&self)"));
        assert!(!f.sync_fn_doc("div", "Divides."));
    }

    #[test]
    fn test_sync_doc_ignores_earlier_block_comments() {
        let text = "impl Service {\n    /** Adds. */\n    pub fn add(&self) {}\n\n    /* scratch note */\n    pub fn sub(&self) {}\n}\n";
        let mut f = SourceFile::parse(text);
        assert!(f.sync_fn_doc("sub", "Subtracts."));
        assert_eq!(
            f.render(),
            "impl Service {\n    /** Adds. */\n    pub fn add(&self) {}\n\n    /* scratch note */\n    /// Subtracts.\n    pub fn sub(&self) {}\n}\n"
        );
        assert!(!f.sync_fn_doc("sub", "Subtracts."));
    }

    #[test]
    fn test_sync_one_line_block_doc() {
        let text = "impl Service {\n    /** Adds. */\n    pub fn add(&self) {}\n\n    /** Old. */\n    pub fn sub(&self) {}\n}\n";
        let mut f = SourceFile::parse(text);
        assert!(!f.sync_fn_doc("add", "Adds."));
        assert!(f.sync_fn_doc("sub", "Subtracts."));
        assert_eq!(
            f.render(),
            "impl Service {\n    /** Adds. */\n    pub fn add(&self) {}\n\n    /**\n     * Subtracts.\n     */\n    pub fn sub(&self) {}\n}\n"
        );
    }

    #[test]
    fn test_sync_inner_doc() {
        let mut f = SourceFile::parse(SERVICE);
        assert!(f.sync_inner_doc("New description."));
        assert!(f.render().starts_with("//! New description.\n\nuse fabric"));
        assert!(!f.sync_inner_doc("New description."));

        let mut f = SourceFile::parse("/*!\n * Block.\n */\n\nmod a;\n");
        assert!(!f.sync_inner_doc("Block."));
        assert!(f.sync_inner_doc("Other."));
        assert_eq!(f.render(), "/*!\n * Other.\n */\n\nmod a;\n");
    }

    #[test]
    fn test_ensure_use() {
        let mut f = SourceFile::parse(SERVICE);
        assert!(f.ensure_use("use fabric::errors;"));
        assert!(!f.ensure_use("use  fabric::errors;"));
        assert!(f
            .render()
            .contains("use fabric::{Context, Error};\nuse fabric::errors;\n"));

        let mut f = SourceFile::parse("//! Doc.\n\npub struct A;\n");
        assert!(f.ensure_use("use std::fmt;"));
        assert_eq!(f.render(), "//! Doc.\n\nuse std::fmt;\n\npub struct A;\n");
    }

    #[test]
    fn test_ensure_use_after_multiline_use() {
        let mut f = SourceFile::parse("use a::{\n    b,\n    c,\n};\n\nfn x() {}\n");
        assert!(f.ensure_use("use d;"));
        assert_eq!(f.render(), "use a::{\n    b,\n    c,\n};\nuse d;\n\nfn x() {}\n");
    }

    #[test]
    fn test_ensure_mod() {
        let mut f = SourceFile::parse("//! Svc.\n\npub mod api;\nmod service;\n\npub use service::Service;\n");
        assert!(!f.ensure_mod("api", &["pub mod api;"]));
        assert!(f.ensure_mod("service_test", &["#[cfg(test)]", "mod service_test;"]));
        assert_eq!(
            f.render(),
            "//! Svc.\n\npub mod api;\nmod service;\n#[cfg(test)]\nmod service_test;\n\npub use service::Service;\n"
        );
    }

    #[test]
    fn test_rewrite_err_returns() {
        let re = Regex::new(r"return\s+Err\(\s*([A-Za-z_][A-Za-z0-9_]*)\s*\)\s*;").unwrap();
        let mut f = SourceFile::parse("fn a() {\n    return Err(e);\n    return Err(errors::trace(e));\n}\n");
        assert_eq!(f.rewrite_err_returns(&re), 1);
        assert_eq!(
            f.render(),
            "fn a() {\n    return Err(errors::trace(e));\n    return Err(errors::trace(e));\n}\n"
        );
        assert_eq!(f.rewrite_err_returns(&re), 0);
    }

    #[test]
    fn test_insert_before_marker() {
        let mut f = SourceFile::parse("fn main() {\n    run(vec![\n        // HINT: Add services here\n    ]);\n}\n");
        assert_eq!(
            f.insert_before_marker("// HINT: Add services here", "calc::Service::new(),"),
            Some(true)
        );
        assert_eq!(
            f.insert_before_marker("// HINT: Add services here", "calc::Service::new(),"),
            Some(false)
        );
        assert!(f.render().contains("        calc::Service::new(),\n        // HINT"));
        assert_eq!(f.insert_before_marker("// NOPE", "x"), None);
    }

    #[test]
    fn test_append() {
        let mut f = SourceFile::parse("impl A {}\n\n");
        f.append("\nimpl B {}\n");
        assert_eq!(f.render(), "impl A {}\n\nimpl B {}\n");
    }
}
