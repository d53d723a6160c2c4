//! Rich-text rendering of assistant replies
//!
//! Line-oriented: headings, bullet and numbered lists, block quotes and fenced
//! code blocks are recognised per line; `**bold**`, `` `code` `` and
//! `[links](url)` inside a line.

use std::sync::OnceLock;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use regex::Regex;

fn inline_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\*\*(?P<bold>[^*]+)\*\*|`(?P<code>[^`]+)`|\[(?P<label>[^\]]+)\]\((?P<url>[^)\s]+)\)")
            .expect("inline markdown pattern is valid")
    })
}

fn ordered_item_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<indent>\s*)(?P<number>\d+)[.)]\s+(?P<rest>.*)$")
            .expect("ordered list pattern is valid")
    })
}

fn code_style() -> Style {
    Style::default().fg(Color::Green)
}

/// Render a whole message as styled lines.
pub fn render(text: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut in_code_block = false;

    for raw in text.lines() {
        let trimmed = raw.trim_start();

        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }

        if in_code_block {
            lines.push(Line::from(Span::styled(format!("  {}", raw), code_style())));
            continue;
        }

        lines.push(render_line(raw));
    }

    lines
}

/// Plain rendering: one unstyled line per source line.
pub fn render_plain(text: &str) -> Vec<Line<'static>> {
    text.lines().map(|line| Line::from(line.to_string())).collect()
}

fn render_line(raw: &str) -> Line<'static> {
    let trimmed = raw.trim_start();

    if let Some((level, title)) = heading(trimmed) {
        let mut style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        if level == 1 {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        return Line::from(Span::styled(title.to_string(), style));
    }

    if let Some(rest) = trimmed.strip_prefix("> ") {
        let mut spans = vec![Span::styled("│ ", Style::default().fg(Color::DarkGray))];
        spans.extend(
            inline_spans(rest)
                .into_iter()
                .map(|span| span.patch_style(Style::default().add_modifier(Modifier::ITALIC))),
        );
        return Line::from(spans);
    }

    let indent = " ".repeat((raw.len() - trimmed.len()).min(8));

    for marker in ["- ", "* ", "+ "] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            let mut spans = vec![Span::raw(format!("{}  • ", indent))];
            spans.extend(inline_spans(rest));
            return Line::from(spans);
        }
    }

    if let Some(caps) = ordered_item_pattern().captures(raw) {
        let mut spans = vec![Span::raw(format!("{}  {}. ", indent, &caps["number"]))];
        spans.extend(inline_spans(&caps["rest"]));
        return Line::from(spans);
    }

    let spans = inline_spans(raw);
    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    line[level..].strip_prefix(' ').map(|title| (level, title.trim()))
}

fn inline_spans(text: &str) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in inline_pattern().captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            spans.push(Span::raw(text[last..whole.start()].to_string()));
        }

        if let Some(bold) = caps.name("bold") {
            spans.push(Span::styled(
                bold.as_str().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        } else if let Some(code) = caps.name("code") {
            spans.push(Span::styled(code.as_str().to_string(), code_style()));
        } else if let (Some(label), Some(url)) = (caps.name("label"), caps.name("url")) {
            spans.push(Span::styled(
                label.as_str().to_string(),
                Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
            ));
            spans.push(Span::styled(
                format!(" ({})", url.as_str()),
                Style::default().fg(Color::DarkGray),
            ));
        }

        last = whole.end();
    }

    if last < text.len() {
        spans.push(Span::raw(text[last..].to_string()));
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn bold_and_code_spans() {
        let line = render_line("Vul **het formulier** in via `Mijn UWV`.");
        assert_eq!(text_of(&line), "Vul het formulier in via Mijn UWV.");
        assert_eq!(line.spans[1].content, "het formulier");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(line.spans[3].style.fg, Some(Color::Green));
    }

    #[test]
    fn unclosed_bold_is_literal() {
        let line = render_line("dit is **niet vet");
        assert_eq!(text_of(&line), "dit is **niet vet");
    }

    #[test]
    fn links_keep_their_target_visible() {
        let line = render_line("Zie [uwv.nl](https://www.uwv.nl) voor meer.");
        assert_eq!(text_of(&line), "Zie uwv.nl (https://www.uwv.nl) voor meer.");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn headings_and_lists() {
        let lines = render("# WW-uitkering\n- Stap een\n2. Stap twee\n#geen kop");
        assert_eq!(text_of(&lines[0]), "WW-uitkering");
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(text_of(&lines[1]), "  • Stap een");
        assert_eq!(text_of(&lines[2]), "  2. Stap twee");
        assert_eq!(text_of(&lines[3]), "#geen kop");
    }

    #[test]
    fn fenced_code_is_not_parsed() {
        let lines = render("Voorbeeld:\n```\n**niet vet**\n```\nklaar");
        assert_eq!(lines.len(), 3);
        assert_eq!(text_of(&lines[1]), "  **niet vet**");
        assert_eq!(lines[1].spans[0].style.fg, Some(Color::Green));
        assert_eq!(text_of(&lines[2]), "klaar");
    }

    #[test]
    fn plain_rendering_keeps_markup() {
        let lines = render_plain("**vet**\n- item");
        assert_eq!(text_of(&lines[0]), "**vet**");
        assert_eq!(text_of(&lines[1]), "- item");
    }
}
