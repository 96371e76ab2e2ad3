use std::sync::LazyLock;

use regex::Regex;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_+#.-]*)[^\n]*\n(.*?)```").expect("valid fenced block regex")
});

static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`\n]+)`").expect("valid inline code regex"));

/// `eval(input)`, `user.save()`, `fs::read(path)`.
static CALL_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*(?:(?:\.|::)[A-Za-z_][A-Za-z0-9_]*)*\([^()\n]*\)")
        .expect("valid call fragment regex")
});

/// Parenthesized plural suffixes in prose: `vendor(s)`, `library(ies)`.
const PLURAL_SUFFIXES: &[&str] = &["s", "es", "ies"];

/// `x := 1`, `a => b`, `Foo::bar`.
static OPERATOR_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z_][A-Za-z0-9_]*\s*(?:=>|::|:=)\s*\S").expect("valid operator regex")
});

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:[-*]|\d+[.)])\s+\S").expect("valid list regex"));

/// Words that say what a request wants done. Matched as whole tokens.
pub const REVIEW_INTENTS: &[&str] = &["review", "audit", "critique", "check", "inspect", "roast"];
pub const PLANNING_INTENTS: &[&str] = &["plan", "sprint", "roadmap", "estimate"];
pub const DELIVERABLE_VERBS: &[&str] = &[
    "write", "create", "add", "fix", "implement", "generate", "make", "build", "convert",
    "rename", "refactor", "update", "remove", "port",
];

/// A whitespace-delimited word of the request, lowercased and stripped of
/// surrounding punctuation. `@`, `#` and `+` survive so `@QA` and `C++` stay
/// distinct from `qa` and `c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Index among the request's tokens.
    pub position: usize,
}

pub fn tokenize(text: &str) -> Vec<Token> {
    text.split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !(c.is_alphanumeric() || matches!(c, '@' | '#' | '+')))
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .enumerate()
        .map(|(position, text)| Token { text, position })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Language tag of a fenced block, when given.
    pub language: Option<String>,
    pub code: String,
    /// True for backtick spans and call-like fragments found in prose.
    pub inline: bool,
}

/// An incoming request, analyzed once and then read by every routing stage.
#[derive(Debug, Clone)]
pub struct Request {
    raw: String,
    tokens: Vec<Token>,
    code_blocks: Vec<CodeBlock>,
    intent_keywords: Vec<Token>,
    sentence_count: usize,
    list_items: usize,
}

impl Request {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();

        let mut code_blocks = Vec::new();
        for captures in FENCED_BLOCK.captures_iter(&raw) {
            let language = captures
                .get(1)
                .map(|m| m.as_str().to_ascii_lowercase())
                .filter(|lang| !lang.is_empty());
            code_blocks.push(CodeBlock {
                language,
                code: captures[2].to_string(),
                inline: false,
            });
        }

        // Routing reads prose only; a trigger inside pasted code is not a trigger.
        let prose = FENCED_BLOCK.replace_all(&raw, " ").into_owned();

        for captures in INLINE_CODE.captures_iter(&prose) {
            code_blocks.push(CodeBlock {
                language: None,
                code: captures[1].to_string(),
                inline: true,
            });
        }
        let unquoted = INLINE_CODE.replace_all(&prose, " ");
        for fragment in CALL_FRAGMENT
            .find_iter(&unquoted)
            .filter(|m| is_call_like(m.as_str()))
            .chain(OPERATOR_FRAGMENT.find_iter(&unquoted))
        {
            code_blocks.push(CodeBlock {
                language: None,
                code: fragment.as_str().to_string(),
                inline: true,
            });
        }

        let tokens = tokenize(&prose);
        let intent_keywords = tokens
            .iter()
            .filter(|t| {
                REVIEW_INTENTS.contains(&t.text.as_str())
                    || PLANNING_INTENTS.contains(&t.text.as_str())
                    || DELIVERABLE_VERBS.contains(&t.text.as_str())
            })
            .cloned()
            .collect();

        let sentence_count = count_sentences(&prose);
        let list_items = LIST_ITEM.find_iter(&prose).count();

        Self {
            raw,
            tokens,
            code_blocks,
            intent_keywords,
            sentence_count,
            list_items,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Prose tokens in order; fenced code is excluded.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn word_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn code_blocks(&self) -> &[CodeBlock] {
        &self.code_blocks
    }

    pub fn has_code(&self) -> bool {
        !self.code_blocks.is_empty()
    }

    /// Review, planning and deliverable words, ordered by position.
    pub fn intent_keywords(&self) -> &[Token] {
        &self.intent_keywords
    }

    pub fn has_review_intent(&self) -> bool {
        self.intent_keywords
            .iter()
            .any(|t| REVIEW_INTENTS.contains(&t.text.as_str()))
    }

    pub fn deliverable_count(&self) -> usize {
        self.intent_keywords
            .iter()
            .filter(|t| DELIVERABLE_VERBS.contains(&t.text.as_str()))
            .count()
    }

    /// Several sentences, list items or deliverable verbs mean more than one artifact.
    pub fn has_multiple_deliverables(&self) -> bool {
        self.sentence_count > 1 || self.list_items > 1 || self.deliverable_count() > 1
    }

    /// Position of the first occurrence of `phrase` as consecutive tokens.
    pub fn find_phrase(&self, phrase: &str) -> Option<usize> {
        let needle: Vec<String> = tokenize(phrase).into_iter().map(|t| t.text).collect();
        if needle.is_empty() || needle.len() > self.tokens.len() {
            return None;
        }

        self.tokens
            .windows(needle.len())
            .find(|window| window.iter().zip(&needle).all(|(t, n)| &t.text == n))
            .map(|window| window[0].position)
    }
}

/// `eval(input)` is code, `vendor(s)` is prose.
fn is_call_like(fragment: &str) -> bool {
    let Some((callee, args)) = fragment.split_once('(') else {
        return false;
    };
    let args = args.trim_end_matches(')').trim().to_ascii_lowercase();
    callee.contains(['_', '.', ':']) || !PLURAL_SUFFIXES.contains(&args.as_str())
}

/// Counts sentences of more than one word. `.`, `!` and `?` end a sentence
/// only when followed by whitespace or the end of text, so `config.toml` and
/// `v1.2` stay inside one; abbreviations such as `e.g.` never end one.
fn count_sentences(prose: &str) -> usize {
    let mut count = 0;
    let mut start = 0;
    let mut chars = prose.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let boundary = match c {
            '\n' => true,
            '.' | '!' | '?' => {
                let followed_by_space = chars.peek().map_or(true, |&(_, next)| next.is_whitespace());
                followed_by_space && !ends_with_abbreviation(&prose[start..i])
            }
            _ => false,
        };
        if boundary {
            if prose[start..i].split_whitespace().count() > 1 {
                count += 1;
            }
            start = i + c.len_utf8();
        }
    }
    if prose[start..].split_whitespace().count() > 1 {
        count += 1;
    }

    count
}

fn ends_with_abbreviation(text: &str) -> bool {
    text.split_whitespace()
        .last()
        .is_some_and(|word| word.contains('.'))
}
