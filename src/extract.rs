//! # Structural Text Extraction
//!
//! ## Purpose
//! Converts the HTML documents served by the content endpoint into normalized
//! plain text, preserving block structure as newlines and dropping regions
//! that carry no content (scripts, styles, document head).
//!
//! ## Input/Output Specification
//! - **Input**: An HTML document, possibly malformed
//! - **Output**: Trimmed plain text with at most one blank line between blocks
//! - **Failure**: Never fails; unterminated or malformed tags are tolerated
//!
//! ## Behavior
//! The extractor walks the tag structure with a suppression depth counter:
//! entering a non-content tag increments it, leaving one decrements it
//! (clamped at zero on spurious closes), and no text is emitted while it is
//! positive. Outside suppressed regions, entering or leaving a block-level
//! tag emits a newline; all other tags are structurally transparent.
//! Character references in text data are decoded. Post-processing collapses
//! horizontal whitespace runs, strips indentation after newlines, caps
//! newline runs at two, and trims the result.

use regex::Regex;
use std::sync::OnceLock;

/// Structural category of a tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagClass {
    /// Emits a newline boundary on entry and exit.
    Block,
    /// Suppresses all contained character data.
    Suppressed,
    /// Ignored; contents are still emitted.
    Transparent,
}

fn classify(name: &str) -> TagClass {
    match name {
        "script" | "style" | "head" | "noscript" => TagClass::Suppressed,
        "p" | "div" | "br" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "li" | "tr" | "td"
        | "th" | "blockquote" | "pre" | "article" => TagClass::Block,
        _ => TagClass::Transparent,
    }
}

/// One consumed markup construct.
#[derive(Debug, PartialEq, Eq)]
enum TagEvent {
    Open(String),
    Close(String),
    SelfClose(String),
    /// Comment, declaration, processing instruction, or garbage to skip.
    Skip,
    /// A bare `<` that does not start a tag; emitted as character data.
    Literal,
}

/// Consume one construct starting at the `<` that begins `input`.
/// Returns the event and the number of bytes consumed.
fn scan_tag(input: &str) -> (TagEvent, usize) {
    let bytes = input.as_bytes();
    debug_assert!(bytes.first() == Some(&b'<'));

    if input.starts_with("<!--") {
        return match input.find("-->") {
            Some(end) => (TagEvent::Skip, end + 3),
            None => (TagEvent::Skip, input.len()),
        };
    }
    if input.starts_with("<!") || input.starts_with("<?") {
        return match input.find('>') {
            Some(end) => (TagEvent::Skip, end + 1),
            None => (TagEvent::Skip, input.len()),
        };
    }

    let (closing, name_start) = if bytes.get(1) == Some(&b'/') {
        (true, 2)
    } else {
        (false, 1)
    };

    let mut name_end = name_start;
    while name_end < bytes.len() && (bytes[name_end].is_ascii_alphanumeric()) {
        name_end += 1;
    }
    if name_end == name_start {
        // Not a tag after all; treat the `<` as ordinary text.
        return (TagEvent::Literal, 1);
    }
    let name = input[name_start..name_end].to_ascii_lowercase();

    // Scan to the closing `>`, honoring quoted attribute values so that a
    // `>` inside an attribute does not end the tag early.
    let mut quote: Option<u8> = None;
    let mut self_closing = false;
    let mut i = name_end;
    while i < bytes.len() {
        match bytes[i] {
            q @ (b'"' | b'\'') => match quote {
                Some(active) if active == q => quote = None,
                None => quote = Some(q),
                Some(_) => {}
            },
            b'>' if quote.is_none() => {
                let event = if closing {
                    TagEvent::Close(name)
                } else if self_closing {
                    TagEvent::SelfClose(name)
                } else {
                    TagEvent::Open(name)
                };
                return (event, i + 1);
            }
            b'/' if quote.is_none() => self_closing = true,
            _ if quote.is_none() && !bytes[i].is_ascii_whitespace() => self_closing = false,
            _ => {}
        }
        i += 1;
    }

    // Unterminated tag: consume the rest of the input.
    (TagEvent::Skip, input.len())
}

/// Decode one character reference starting at the `&` that begins `input`.
/// Returns the decoded character and the number of bytes consumed.
fn decode_entity(input: &str) -> Option<(char, usize)> {
    let semi = input[1..].find(';')? + 1;
    if semi == 1 || semi > 32 {
        return None;
    }
    let body = &input[1..semi];

    let ch = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        char::from_u32(u32::from_str_radix(hex, 16).ok()?)?
    } else if let Some(dec) = body.strip_prefix('#') {
        char::from_u32(dec.parse().ok()?)?
    } else {
        match body {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            "nbsp" => ' ',
            _ => return None,
        }
    };

    Some((ch, semi + 1))
}

/// Append character data, decoding character references. Unknown references
/// are kept verbatim.
fn push_data(out: &mut String, data: &str) {
    let mut rest = data;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match decode_entity(tail) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
}

fn horizontal_ws() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]+").unwrap())
}

fn indented_newline() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n[ \t]+").unwrap())
}

fn newline_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").unwrap())
}

/// Extract normalized plain text from an HTML document.
pub fn extract(markup: &str) -> String {
    let mut raw = String::with_capacity(markup.len() / 2);
    let mut suppressed: usize = 0;
    let mut rest = markup;

    while let Some(lt) = rest.find('<') {
        let (data, tail) = rest.split_at(lt);
        if suppressed == 0 {
            push_data(&mut raw, data);
        }

        let (event, consumed) = scan_tag(tail);
        match event {
            TagEvent::Open(name) => match classify(&name) {
                TagClass::Suppressed => suppressed += 1,
                TagClass::Block if suppressed == 0 => raw.push('\n'),
                _ => {}
            },
            TagEvent::Close(name) => match classify(&name) {
                TagClass::Suppressed => suppressed = suppressed.saturating_sub(1),
                TagClass::Block if suppressed == 0 => raw.push('\n'),
                _ => {}
            },
            TagEvent::SelfClose(name) => {
                if classify(&name) == TagClass::Block && suppressed == 0 {
                    raw.push('\n');
                    raw.push('\n');
                }
            }
            TagEvent::Skip => {}
            TagEvent::Literal => {
                if suppressed == 0 {
                    raw.push('<');
                }
            }
        }
        rest = &tail[consumed..];
    }
    if suppressed == 0 {
        push_data(&mut raw, rest);
    }

    let collapsed = horizontal_ws().replace_all(&raw, " ");
    let stripped = indented_newline().replace_all(&collapsed, "\n");
    let capped = newline_runs().replace_all(&stripped, "\n\n");
    capped.trim().to_string()
}
