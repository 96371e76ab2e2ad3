//! Lightweight, language-aware scanning of code found in response sections.
//! These are heuristics over text, not parsers: they look for function
//! signatures and error-handling shapes, nothing more.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::registry::SectionKind;
use crate::template::render::guess_language;
use crate::template::FilledSection;

static FENCED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_+#.-]*)[^\n]*\n(.*?)```").expect("valid fence regex")
});

static RUST_FN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bfn\s+(?P<name>[A-Za-z_]\w*)\s*(?:<[^(]*>)?\s*\(").expect("valid rust fn regex")
});

static PYTHON_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bdef\s+(?P<name>[A-Za-z_]\w*)\s*\(").expect("valid python def regex")
});

static JS_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bfunction\s*\*?\s*(?P<name>[A-Za-z_$][\w$]*)?\s*(?:<[^(]*>)?\s*\(")
        .expect("valid function regex")
});

static JS_ARROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*(?P<annot>:[^=]+)?=\s*(?:async\s+)?\(")
        .expect("valid arrow regex")
});

static KOTLIN_FUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bfun\s+(?:<[^(]*>\s*)?(?P<name>[\w.]+)\s*\(").expect("valid kotlin regex")
});

static SWIFT_FUNC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bfunc\s+(?P<name>\w+)\s*(?:<[^(]*>)?\s*\(").expect("valid swift regex")
});

static ERROR_PRONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\b(?:fetch|open|eval|exec|readFile|readFileSync|writeFile|writeFileSync|read_to_string|urlopen|connect|parseInt)\s*\(",
        r"|\.(?:parse|json|loads|query|execute|send)\s*(?:::<[^>]*>)?\s*\(",
    ))
    .expect("valid error-prone regex")
});

static HANDLING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\btry\s*[:{]|\bcatch\b|\bexcept\b|\)\s*\?|\?\s*[;)]|\bmatch\b",
        r"|\bif\s+let\s+(?:Err|Ok|Some)\b|\bmap_err\b|\bResult\s*<|\bunwrap_or(?:_else|_default)?\b",
        r"|\bok_or(?:_else)?\b|\berr\s*!=\s*nil\b|\.catch\s*\(|\brescue\b|\bthrow\b|\braise\b|\bErr\s*\(",
    ))
    .expect("valid handling regex")
});

/// Calls that abort on failure rather than handle it.
static PANICKING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(?:unwrap|expect)\s*\(").expect("valid panicking regex"));

static TRY_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\btry\s*[:{]").expect("valid try regex"));

static TRY_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:catch|except)\b").expect("valid catch regex"));

static ERR_CHECK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\berr\s*!=\s*nil\b").expect("valid err check regex"));

/// A signature that hands failures to its caller.
static FALLIBLE_RETURN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"->\s*(?:\w+::)*(?:Result|Option)\b|\)\s*:\s*Promise\s*<|\bthrows\b")
        .expect("valid fallible return regex")
});

static SWALLOW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"catch\s*(?:\([^)]*\))?\s*\{\s*(?://[^\n]*\s*)*\}",
        r"|except[^:\n]*:\s*(?:#[^\n]*\s*)*pass\b",
        r"|\.catch\s*\(\s*(?:\([^)]*\)|\w+)?\s*=>\s*\{\s*\}\s*\)",
        r"|\blet\s+_\s*=",
        r"|if\s+err\s*!=\s*nil\s*\{\s*\}",
    ))
    .expect("valid swallow regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Rust,
    Python,
    TypeScript,
    JavaScript,
    Kotlin,
    Swift,
    /// Go, Java, C, C++, C#: parameter types are mandatory in the syntax.
    TypedByConstruction,
    Unknown,
}

impl Language {
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "rust" | "rs" => Self::Rust,
            "python" | "py" => Self::Python,
            "typescript" | "ts" | "tsx" => Self::TypeScript,
            "javascript" | "js" | "jsx" | "mjs" => Self::JavaScript,
            "kotlin" | "kt" => Self::Kotlin,
            "swift" => Self::Swift,
            "go" | "golang" | "java" | "c" | "cpp" | "c++" | "csharp" | "cs" | "c#" => {
                Self::TypedByConstruction
            }
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub language: Language,
    pub code: String,
}

/// Code carried by a section: every fenced block, or for code sections
/// without fences the whole content.
pub fn snippets(section: &FilledSection) -> Vec<Snippet> {
    let mut found: Vec<Snippet> = FENCED
        .captures_iter(&section.content)
        .map(|captures| {
            let code = captures[2].to_string();
            let tag = &captures[1];
            let language = if tag.is_empty() {
                Language::from_tag(guess_language(&code))
            } else {
                Language::from_tag(tag)
            };
            Snippet { language, code }
        })
        .collect();

    if found.is_empty() && section.kind == SectionKind::Code {
        let code = section.content.trim().to_string();
        found.push(Snippet {
            language: Language::from_tag(guess_language(&code)),
            code,
        });
    }

    found
}

/// Prose with fenced blocks removed.
pub fn strip_fenced(content: &str) -> String {
    FENCED.replace_all(content, " ").into_owned()
}

struct Signature<'a> {
    name: &'a str,
    params: &'a str,
    /// Text between the closing parenthesis and the body or line end.
    tail: &'a str,
    /// Set when the binding itself carries a type (`const f: Handler = (...)`).
    annotated: bool,
}

fn signatures<'a>(code: &'a str, pattern: &Regex) -> Vec<Signature<'a>> {
    pattern
        .captures_iter(code)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let open = whole.end() - 1;
            let close = matching_paren(code, open)?;
            let rest = &code[close + 1..];
            let tail_end = rest.find(['{', '\n']).unwrap_or(rest.len());
            Some(Signature {
                name: captures.name("name").map_or("<anonymous>", |m| m.as_str()),
                params: &code[open + 1..close],
                tail: &rest[..tail_end],
                annotated: captures.name("annot").is_some(),
            })
        })
        .collect()
}

fn matching_paren(code: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, c) in code[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits a parameter list on top-level commas.
fn split_params(params: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut previous = ' ';

    for (i, c) in params.char_indices() {
        match c {
            '(' | '[' | '{' | '<' => depth += 1,
            '>' if previous == '-' || previous == '=' => {}
            ')' | ']' | '}' | '>' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(params[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
        previous = c;
    }
    parts.push(params[start..].trim());

    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

fn is_receiver(param: &str) -> bool {
    let compact: String = param.split_whitespace().collect::<Vec<_>>().join(" ");
    matches!(
        compact.as_str(),
        "self" | "&self" | "&mut self" | "mut self" | "cls" | "this" | "*" | "/"
    ) || (compact.starts_with("&'") && compact.ends_with(" self"))
}

fn untyped_params<'a>(params: &'a str) -> Vec<&'a str> {
    split_params(params)
        .into_iter()
        .filter(|p| !is_receiver(p) && !p.contains(':'))
        .collect()
}

/// Describes every function in the snippet that lacks type annotations.
pub fn untyped_signatures(snippet: &Snippet) -> Vec<String> {
    let code = snippet.code.as_str();
    let mut problems = Vec::new();

    match snippet.language {
        Language::Rust => {
            for sig in signatures(code, &RUST_FN) {
                push_param_problem(&mut problems, &sig);
            }
        }
        Language::Python => {
            for sig in signatures(code, &PYTHON_DEF) {
                push_param_problem(&mut problems, &sig);
                if sig.name != "__init__" && !sig.tail.contains("->") {
                    problems.push(format!("function `{}` has no return annotation", sig.name));
                }
            }
        }
        Language::TypeScript => {
            for sig in signatures(code, &JS_FUNCTION)
                .into_iter()
                .chain(signatures(code, &JS_ARROW))
            {
                if sig.annotated {
                    continue;
                }
                push_param_problem(&mut problems, &sig);
                if !sig.tail.trim_start().starts_with(':') {
                    problems.push(format!("function `{}` has no return type", sig.name));
                }
            }
        }
        Language::JavaScript => {
            let has_jsdoc = code.contains("@param {") || code.contains("@type {");
            for sig in signatures(code, &JS_FUNCTION)
                .into_iter()
                .chain(signatures(code, &JS_ARROW))
            {
                if !has_jsdoc && !split_params(sig.params).is_empty() {
                    problems.push(format!(
                        "function `{}` has untyped parameters and no JSDoc types",
                        sig.name
                    ));
                }
            }
        }
        Language::Kotlin => {
            for sig in signatures(code, &KOTLIN_FUN) {
                push_param_problem(&mut problems, &sig);
            }
        }
        Language::Swift => {
            for sig in signatures(code, &SWIFT_FUNC) {
                push_param_problem(&mut problems, &sig);
            }
        }
        Language::TypedByConstruction | Language::Unknown => {}
    }

    problems
}

fn push_param_problem(problems: &mut Vec<String>, sig: &Signature<'_>) {
    let untyped = untyped_params(sig.params);
    if !untyped.is_empty() {
        problems.push(format!(
            "function `{}` has untyped parameter(s): {}",
            sig.name,
            untyped.join(", ")
        ));
    }
}

/// Returns why the snippet's error handling is insufficient, if it is.
pub fn error_handling_problem(snippet: &Snippet) -> Option<String> {
    let code = snippet.code.as_str();

    if let Some(swallow) = SWALLOW.find(code) {
        return Some(format!(
            "error is silently discarded: `{}`",
            swallow.as_str().split_whitespace().collect::<Vec<_>>().join(" ")
        ));
    }

    if let Some(panicking) = PANICKING.find(code) {
        return Some(format!(
            "`{}` aborts on failure instead of handling the error",
            panicking.as_str().trim_end_matches('(').trim()
        ));
    }

    ERROR_PRONE
        .find_iter(code)
        .find(|operation| !is_handled(code, operation.start(), operation.end()))
        .map(|operation| {
            format!(
                "`{}` can fail but no error handling is present",
                operation.as_str().trim_end_matches('(').trim()
            )
        })
}

/// An operation is handled when its own statement handles the failure, an
/// enclosing `try` catches it, a Go-style `err` check follows, or it is
/// returned from a function whose signature passes failures on.
fn is_handled(code: &str, start: usize, end: usize) -> bool {
    let statement = statement_around(code, start, end);
    let text = &code[statement.clone()];
    if HANDLING.is_match(text) {
        return true;
    }

    if TRY_OPEN.is_match(&code[..start]) && TRY_CLOSE.is_match(&code[end..]) {
        return true;
    }

    let rest = &code[statement.end..];
    if let Some(next_line) = rest.strip_prefix('\n').and_then(|r| r.lines().next()) {
        if ERR_CHECK.is_match(next_line) {
            return true;
        }
    }

    let returned = text.trim_start().starts_with("return ")
        || (!rest.starts_with(';') && rest.trim_start().starts_with('}'));
    returned && FALLIBLE_RETURN.is_match(code)
}

/// Byte range of the statement holding `start..end`: bounded by `;` and line
/// breaks, with `.method()` and `?` continuation lines folded in.
fn statement_around(code: &str, start: usize, end: usize) -> Range<usize> {
    let mut from = code[..start].rfind([';', '\n']).map_or(0, |i| i + 1);
    while from > 0 && code[from..].trim_start_matches([' ', '\t']).starts_with(['.', '?']) {
        from = code[..from - 1].rfind([';', '\n']).map_or(0, |i| i + 1);
    }

    let mut to = code[end..].find([';', '\n']).map_or(code.len(), |i| end + i);
    while code[to..].starts_with('\n')
        && code[to + 1..]
            .trim_start_matches([' ', '\t'])
            .starts_with(['.', '?'])
    {
        to = code[to + 1..].find([';', '\n']).map_or(code.len(), |i| to + 1 + i);
    }

    from..to
}
