//! HTML to plain text.
//!
//! List items become bullet lines, paragraphs and headings are separated by a
//! blank line, every other tag is dropped. Entities are decoded by the HTML
//! parser, so the output never contains `&amp;` and friends.

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html};

pub const BULLET: &str = "\u{2022} ";

const ALWAYS_SKIPPED: [&str; 9] = [
    "head", "script", "style", "noscript", "iframe", "template", "svg", "canvas", "object",
];

/// Page chrome dropped when converting a whole document.
const CHROME: [&str; 5] = ["nav", "header", "footer", "aside", "form"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertMode {
    /// A fragment that was already selected as content; keep everything readable.
    Fragment,
    /// A full page; also strip navigation, headers, footers, asides and forms.
    Document,
}

pub fn html_to_text(html: &str, mode: ConvertMode) -> String {
    let document = match mode {
        ConvertMode::Fragment => Html::parse_fragment(html),
        ConvertMode::Document => Html::parse_document(html),
    };
    element_to_text(document.root_element(), mode)
}

pub fn element_to_text(element: ElementRef<'_>, mode: ConvertMode) -> String {
    let mut ctx = TextContext::default();
    visit_element(element, mode, &mut ctx);
    ctx.finish()
}

/// Converts a description fragment, unescaping it first if the markup arrived
/// entity-encoded (`&lt;p&gt;...`), which some JSON-LD producers do.
pub fn fragment_to_text(html: &str) -> String {
    let text = html_to_text(html, ConvertMode::Fragment);
    if html.contains("&lt;") && looks_like_markup(&text) {
        html_to_text(&text, ConvertMode::Fragment)
    } else {
        text
    }
}

/// Collapses all whitespace runs to single spaces.
pub fn clean_inline(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn inline_text(element: ElementRef<'_>) -> String {
    clean_inline(&element.text().collect::<Vec<_>>().join(" "))
}

fn looks_like_markup(text: &str) -> bool {
    text.char_indices().any(|(idx, ch)| {
        ch == '<'
            && text[idx + 1..]
                .chars()
                .next()
                .is_some_and(|next| next.is_ascii_alphabetic() || next == '/')
    })
}

fn visit_node(node: NodeRef<'_, Node>, mode: ConvertMode, ctx: &mut TextContext) {
    match node.value() {
        Node::Text(text) => ctx.append_text(text),
        Node::Element(_) => {
            if let Some(element) = ElementRef::wrap(node) {
                visit_element(element, mode, ctx);
            }
        }
        Node::Comment(_) | Node::ProcessingInstruction(_) | Node::Doctype(_) => {}
        _ => {
            for child in node.children() {
                visit_node(child, mode, ctx);
            }
        }
    }
}

fn visit_element(element: ElementRef<'_>, mode: ConvertMode, ctx: &mut TextContext) {
    let tag = element.value().name().to_ascii_lowercase();
    let tag = tag.as_str();
    if ALWAYS_SKIPPED.contains(&tag) || (mode == ConvertMode::Document && CHROME.contains(&tag)) {
        return;
    }

    match tag {
        "br" => ctx.ensure_newline(),
        "li" => {
            ctx.ensure_newline();
            ctx.push_str(BULLET);
            visit_children(element, mode, ctx);
            ctx.ensure_newline();
        }
        "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "ul" | "ol" | "dl" | "table"
        | "blockquote" | "pre" | "hr" => {
            ctx.ensure_blank_line();
            visit_children(element, mode, ctx);
            ctx.ensure_blank_line();
        }
        "div" | "section" | "article" | "main" | "header" | "footer" | "tr" | "td" | "th"
        | "dt" | "dd" | "figure" | "figcaption" | "address" => {
            ctx.ensure_newline();
            visit_children(element, mode, ctx);
            ctx.ensure_newline();
        }
        _ => visit_children(element, mode, ctx),
    }
}

fn visit_children(element: ElementRef<'_>, mode: ConvertMode, ctx: &mut TextContext) {
    for child in element.children() {
        visit_node(child, mode, ctx);
    }
}

#[derive(Default)]
struct TextContext {
    builder: String,
}

impl TextContext {
    fn append_text(&mut self, text: &str) {
        for ch in text.chars() {
            if ch.is_whitespace() {
                if self.builder.is_empty() || self.builder.ends_with(&[' ', '\n'][..]) {
                    continue;
                }
                self.builder.push(' ');
            } else {
                self.builder.push(ch);
            }
        }
    }

    fn push_str(&mut self, text: &str) {
        self.builder.push_str(text);
    }

    fn trim_trailing_spaces(&mut self) {
        let trimmed = self.builder.trim_end_matches(' ').len();
        self.builder.truncate(trimmed);
    }

    fn ensure_newline(&mut self) {
        self.trim_trailing_spaces();
        if self.builder.is_empty() || self.builder.ends_with('\n') {
            return;
        }
        self.builder.push('\n');
    }

    fn ensure_blank_line(&mut self) {
        self.ensure_newline();
        if self.builder.is_empty() || self.builder.ends_with("\n\n") {
            return;
        }
        self.builder.push('\n');
    }

    fn finish(self) -> String {
        let lines: Vec<&str> = self.builder.lines().map(str::trim).collect();
        let mut out = String::with_capacity(self.builder.len());
        let mut blank_run = 0usize;
        for line in lines {
            // Bullet lines whose item was empty carry no information.
            if line.is_empty() || line == BULLET.trim() {
                blank_run += 1;
                continue;
            }
            if !out.is_empty() {
                out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
            }
            out.push_str(line);
            blank_run = 0;
        }
        out
    }
}
