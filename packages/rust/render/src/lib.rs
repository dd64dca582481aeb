//! Markdown-to-HTML rendering for stored documents.
//!
//! Wraps `pulldown-cmark` with the extensions readers expect from hosted
//! documentation (tables, footnotes, strikethrough, task lists), slugs an id
//! onto every heading, and makes links open in a new tab.

use std::collections::HashMap;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};
use tracing::debug;

/// Render markdown to an HTML fragment.
///
/// Rendering is a pure transform and cannot fail; malformed markdown simply
/// renders as the CommonMark spec dictates.
pub fn to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

    let mut events: Vec<Event<'_>> = Parser::new_ext(markdown, options).collect();
    assign_heading_ids(&mut events);

    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, events.into_iter().map(rewrite_link));

    debug!(input_len = markdown.len(), output_len = out.len(), "rendered markdown");
    out
}

// ---------------------------------------------------------------------------
// Heading ids
// ---------------------------------------------------------------------------

/// Give every heading without an explicit id a slug derived from its text.
/// Repeated slugs get a numeric suffix so ids stay unique within a document.
fn assign_heading_ids(events: &mut [Event<'_>]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut pending: Vec<(usize, String)> = Vec::new();

    for i in 0..events.len() {
        let Event::Start(Tag::Heading { id: None, .. }) = &events[i] else {
            continue;
        };

        let base = slugify(&heading_text(&events[i + 1..]));
        let count = counts.entry(base.clone()).or_insert(0);
        let slug = if *count == 0 {
            base.clone()
        } else {
            format!("{base}-{count}")
        };
        *count += 1;
        pending.push((i, slug));
    }

    for (i, slug) in pending {
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(slug.into());
        }
    }
}

/// Collect the visible text of a heading, up to its end tag.
fn heading_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            _ => {}
        }
    }
    text
}

/// Turn heading text into an anchor slug.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut prev_dash = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("section");
    }
    slug
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// Replace link tags with raw anchors carrying `target="_blank"`.
fn rewrite_link(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Start(Tag::Link {
            dest_url, title, ..
        }) => {
            let mut anchor = format!("<a href=\"{}\"", escape_attr(&dest_url));
            if !title.is_empty() {
                anchor.push_str(&format!(" title=\"{}\"", escape_attr(&title)));
            }
            anchor.push_str(" target=\"_blank\" rel=\"noopener\">");
            Event::Html(anchor.into())
        }
        Event::End(TagEnd::Link) => Event::Html("</a>".into()),
        other => other,
    }
}

/// Minimal HTML attribute escaping.
fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
