use crate::registry::SectionKind;

/// Renders one filled section as Markdown according to its kind.
pub fn render_section(kind: SectionKind, label: &str, content: &str) -> String {
    let body = match kind {
        SectionKind::Heading => content.trim().to_string(),
        SectionKind::Checklist => render_checklist(content),
        SectionKind::Code => render_code(content),
        SectionKind::Table => render_table(content),
    };
    format!("## {label}\n\n{body}\n")
}

fn render_checklist(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let item = strip_list_marker(line);
            if item.starts_with("[ ]") || item.starts_with("[x]") || item.starts_with("[X]") {
                format!("- {item}")
            } else {
                format!("- [ ] {item}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_list_marker(line: &str) -> &str {
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return rest.trim_start();
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return rest.trim_start();
        }
    }

    line
}

fn render_code(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    format!("```{}\n{}\n```", guess_language(trimmed), trimmed)
}

pub(crate) fn guess_language(code: &str) -> &'static str {
    if (code.contains("fn ") && code.contains("->")) || code.contains("let mut ") {
        "rust"
    } else if code.contains("def ") && code.contains(':') {
        "python"
    } else if code.contains("func ") {
        "go"
    } else if code.contains("function ") || code.contains("=> ") || code.contains("const ") {
        "typescript"
    } else {
        ""
    }
}

fn render_table(content: &str) -> String {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.iter().all(|line| line.starts_with('|')) {
        return lines.join("\n");
    }

    let mut rows = vec!["| Item | Detail |".to_string(), "|---|---|".to_string()];
    for line in lines {
        let row = match line.split_once(':') {
            Some((key, value)) => format!("| {} | {} |", key.trim(), value.trim()),
            None => format!("| {} | |", line),
        };
        rows.push(row);
    }
    rows.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checklist_adds_unchecked_markers() {
        let rendered = render_section(SectionKind::Checklist, "Critical", "- eval on input\n[x] done\n2. third");
        assert_eq!(
            rendered,
            "## Critical\n\n- [ ] eval on input\n- [x] done\n- [ ] third\n"
        );
    }

    #[test]
    fn test_code_is_fenced_once() {
        let fenced = "```rust\nfn a() -> u8 { 1 }\n```";
        assert_eq!(
            render_section(SectionKind::Code, "Implementation", fenced),
            format!("## Implementation\n\n{fenced}\n")
        );

        let bare = render_section(SectionKind::Code, "Implementation", "def f(x: int) -> int:\n    return x");
        assert!(bare.contains("```python\ndef f(x: int) -> int:"));
    }

    #[test]
    fn test_key_value_lines_become_table() {
        let rendered = render_section(SectionKind::Table, "Trade-offs", "Latency: lower\nCost: higher");
        assert_eq!(
            rendered,
            "## Trade-offs\n\n| Item | Detail |\n|---|---|\n| Latency | lower |\n| Cost | higher |\n"
        );
    }

    #[test]
    fn test_pipe_table_kept() {
        let table = "| A | B |\n|---|---|\n| 1 | 2 |";
        assert_eq!(
            render_section(SectionKind::Table, "Backlog", table),
            format!("## Backlog\n\n{table}\n")
        );
    }
}
