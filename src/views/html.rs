//! HTML rendering for the pages. Plain string building; every value that came
//! from the store or the user goes through [`escape`].

use std::fmt::Write;

use super::{ConversationSource, ConversationView, Notice, TranscriptForm, EMPTY_PLACEHOLDER};
use crate::database::ConversationSummary;

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 1.5rem 2.5rem; }
.row { display: flex; align-items: center; gap: .5rem; margin: .25rem 0; }
.avatar { width: 2rem; height: 2rem; border-radius: 50%; border: none; background: #cbd5e1; }
.avatar.selected { background: #93c5fd; }
.speaker { background: none; border: none; cursor: pointer; font-weight: bold; padding: 0; }
.speaker:hover { text-decoration: underline; }
.panel { border: 1px solid #ccc; border-radius: .5rem; padding: 1rem; margin-bottom: 1.5rem; }
.toolbar { position: sticky; top: 0; background: #fff; display: flex; gap: .5rem; padding: .5rem 0; }
.notice { color: #166534; }
.error { color: #b91c1c; }
label { display: block; margin-top: .5rem; }
"#;

/// Escape text for use in element bodies and quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n<main>\n{}</main>\n</body>\n</html>\n",
        escape(title),
        STYLE,
        body
    )
}

fn flash(out: &mut String, notice: Option<Notice>, error: Option<&str>) {
    if let Some(notice) = notice {
        let _ = writeln!(out, "<p class=\"notice\">{}</p>", escape(notice.message()));
    }
    if let Some(error) = error {
        let _ = writeln!(out, "<p class=\"error\">{}</p>", escape(error));
    }
}

pub fn render_landing(conversations: &[ConversationSummary]) -> String {
    let mut body = String::new();
    body.push_str("<p><a href=\"/conversation/1\">Conversation viewer</a> · <a href=\"/conversation/latest\">Latest conversation</a></p>\n");

    if conversations.is_empty() {
        let _ = writeln!(body, "<p>{}</p>", EMPTY_PLACEHOLDER);
    } else {
        body.push_str("<table>\n<tr><th>#</th><th>Date</th><th>Session</th><th>Conversation</th><th>Segments</th></tr>\n");
        for summary in conversations {
            let _ = writeln!(
                body,
                "<tr><td><a href=\"/conversation/{index}\">{index}</a></td><td>{date}</td><td>{session}</td><td>{conversation}</td><td>{count}</td></tr>",
                index = summary.index,
                date = escape(&summary.date),
                session = escape(&summary.key.session_id),
                conversation = summary.key.conversation,
                count = summary.segment_count,
            );
        }
        body.push_str("</table>\n");
    }

    page("Transcripts", &body)
}

fn render_nav(out: &mut String, source: ConversationSource) {
    match source {
        ConversationSource::Index(index) => {
            out.push_str("<nav class=\"row\">");
            if index > 1 {
                let _ = write!(out, "<a href=\"/conversation/{}\">Prev</a>", index - 1);
            }
            let _ = write!(out, "<a href=\"/conversation/{}\">Next</a>", index + 1);
            out.push_str("<a href=\"/\">All conversations</a></nav>\n");
        }
        ConversationSource::Latest => {
            out.push_str("<nav class=\"row\"><a href=\"/\">All conversations</a></nav>\n");
        }
    }
}

pub fn render_conversation_page(view: &ConversationView, notice: Option<Notice>, error: Option<&str>) -> String {
    let mut body = String::new();
    render_nav(&mut body, view.source());
    flash(&mut body, notice, error);

    if view.is_empty() {
        let _ = writeln!(body, "<p>{}</p>", EMPTY_PLACEHOLDER);
        return page("Conversation", &body);
    }

    let base = view.source().path();
    let first = &view.segments()[0];
    let has_selection = !view.selected().is_empty();

    let _ = writeln!(
        body,
        r#"<div class="panel">
<h1>Conversation</h1>
<div class="row"><span>SessionId: {session}</span><span>Conversation: {conversation}</span></div>
<form method="post" action="{base}/rename">
<div class="row"><span>Selected Speaker Name:</span><strong>{current}</strong></div>
<label>New Speaker Name <input name="new_speaker" placeholder="Speaker" value="{new}"></label>
<div class="row">
<button type="submit">Selected Speaker Name to New Speaker Name</button>"#,
        session = escape(&first.session_id),
        conversation = first.conversation,
        base = base,
        current = escape(view.current_speaker()),
        new = escape(view.new_speaker()),
    );
    if has_selection {
        let _ = writeln!(
            body,
            "<button type=\"submit\" formaction=\"{}/rename-selected\">Update Selected Records</button>",
            base
        );
    }
    body.push_str("</div>\n</form>\n</div>\n");

    body.push_str("<div class=\"toolbar\">\n");
    let _ = writeln!(body, "<form method=\"post\" action=\"{}/copy\"><button type=\"submit\">Copy</button></form>", base);
    if has_selection {
        let _ = writeln!(body, "<form method=\"post\" action=\"{}/delete-selected\"><button type=\"submit\">Delete selected</button></form>", base);
        let _ = writeln!(body, "<form method=\"post\" action=\"{}/clear\"><button type=\"submit\">Clear Selection</button></form>", base);
    }
    let _ = writeln!(body, "<form method=\"post\" action=\"{}/delete\"><button type=\"submit\">Delete conversation</button></form>", base);
    body.push_str("</div>\n");

    for segment in view.segments() {
        let initials: String = segment.speaker.chars().take(2).collect();
        let class = if view.is_selected(segment.id) { "avatar selected" } else { "avatar" };
        let _ = writeln!(
            body,
            r#"<div class="row" id="t{id}">
<form method="post" action="{base}/select/{id}"><input type="hidden" name="shift" value="false"><button type="submit" class="{class}" onclick="this.form.shift.value = event.shiftKey">{initials}</button></form>
<a href="/transcript/{id}" title="Edit">&#9881;</a>
<form method="post" action="{base}/speaker/{id}"><button type="submit" class="speaker">[{speaker}]:</button></form>
<span>{content}</span>
</div>"#,
            id = segment.id,
            base = base,
            class = class,
            initials = escape(&initials),
            speaker = escape(&segment.speaker),
            content = escape(&segment.content),
        );
    }

    page("Conversation", &body)
}

fn text_input(out: &mut String, label: &str, name: &str, value: &str, readonly: bool) {
    let _ = writeln!(
        out,
        "<label>{label} <input name=\"{name}\" placeholder=\"{label}\" value=\"{value}\"{ro}></label>",
        label = label,
        name = name,
        value = escape(value),
        ro = if readonly { " readonly disabled" } else { "" },
    );
}

pub fn render_transcript_page(form: &TranscriptForm, notice: Option<Notice>, error: Option<&str>) -> String {
    let mut body = String::new();
    flash(&mut body, notice, error);

    let _ = writeln!(body, "<form method=\"post\" action=\"/transcript/{}\">", form.id());
    text_input(&mut body, "Session ID", "session_id", form.session_id(), true);
    text_input(&mut body, "Conversation", "conversation", form.conversation(), false);
    text_input(&mut body, "Speaker", "speaker", form.speaker(), false);
    text_input(&mut body, "Date", "date", form.date(), false);
    text_input(&mut body, "Start Time", "start_time", form.start_time(), false);
    text_input(&mut body, "End Time", "end_time", form.end_time(), false);
    text_input(&mut body, "Duration", "duration", form.duration(), false);
    text_input(&mut body, "Content", "content", form.content(), false);
    body.push_str("<button type=\"submit\">Submit</button>\n</form>\n");

    page("Transcript", &body)
}

pub fn render_not_found(what: &str) -> String {
    render_error(&format!("{} not found", what))
}

pub fn render_error(message: &str) -> String {
    page("Error", &format!("<p class=\"error\">{}</p>\n<p><a href=\"/\">Back</a></p>\n", escape(message)))
}
