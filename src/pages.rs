//! HTML pages: landing, conversation browser and transcript editor.
//!
//! Conversation actions are plain form posts that redirect back to the page,
//! which then re-fetches from the service before rendering.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;

use crate::rpc::status_for;
use crate::service::{ByIdInput, ServiceError, ServiceResult};
use crate::state::{AppState, MountedConversation};
use crate::views::{html, ConversationSource, ConversationView, Notice, TranscriptForm};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(landing))
        .route("/conversation/:source", get(conversation_page))
        .route("/conversation/:source/select/:id", post(select_row))
        .route("/conversation/:source/speaker/:id", post(pick_speaker))
        .route("/conversation/:source/clear", post(clear_selection))
        .route("/conversation/:source/rename", post(rename))
        .route("/conversation/:source/rename-selected", post(rename_selected))
        .route("/conversation/:source/delete-selected", post(delete_selected))
        .route("/conversation/:source/delete", post(delete_conversation))
        .route("/conversation/:source/copy", post(copy_conversation))
        .route("/transcript/:id", get(transcript_page).post(submit_transcript))
}

fn error_page(error: &ServiceError) -> Response {
    (status_for(error), Html(html::render_error(&error.to_string()))).into_response()
}

fn parse_source(source: &str) -> ServiceResult<ConversationSource> {
    if source == "latest" {
        return Ok(ConversationSource::Latest);
    }
    match source.parse::<i64>() {
        Ok(index) if index >= 1 => Ok(ConversationSource::Index(index)),
        _ => Err(ServiceError::validation(format!("invalid conversation {:?}", source))),
    }
}

async fn landing(State(state): State<AppState>) -> Response {
    match state.service().list_conversations() {
        Ok(conversations) => Html(html::render_landing(&conversations)).into_response(),
        Err(e) => error_page(&e),
    }
}

/// Make sure the mounted page shows `source`, loading it if something else is mounted
fn ensure_mounted<'a>(
    state: &AppState,
    slot: &'a mut Option<MountedConversation>,
    source: ConversationSource,
) -> ServiceResult<&'a mut MountedConversation> {
    let stale = slot.as_ref().map_or(true, |m| m.view.source() != source);
    if stale {
        let view = ConversationView::load(state.service(), source)?;
        *slot = Some(MountedConversation::new(view));
    }
    slot.as_mut()
        .ok_or_else(|| ServiceError::Store(anyhow::anyhow!("conversation page not mounted")))
}

async fn conversation_page(State(state): State<AppState>, Path(source): Path<String>) -> Response {
    let source = match parse_source(&source) {
        Ok(source) => source,
        Err(e) => return error_page(&e),
    };

    let mut slot = state.conversation().write().await;
    let was_mounted = slot.as_ref().is_some_and(|m| m.view.source() == source);
    let mounted = match ensure_mounted(&state, &mut slot, source) {
        Ok(mounted) => mounted,
        Err(e) => return error_page(&e),
    };
    if was_mounted {
        if let Err(e) = mounted.view.reload(state.service()) {
            return error_page(&e);
        }
    }

    let notice = mounted.notice.take();
    let error = mounted.error.take();
    Html(html::render_conversation_page(&mounted.view, notice, error.as_deref())).into_response()
}

/// Run one action against the mounted view, stash its outcome for the next render, redirect back
async fn conversation_action<F>(state: &AppState, source: &str, action: F) -> Response
where
    F: FnOnce(&mut ConversationView, &AppState) -> ServiceResult<Option<Notice>>,
{
    let source = match parse_source(source) {
        Ok(source) => source,
        Err(e) => return error_page(&e),
    };

    let mut slot = state.conversation().write().await;
    let mounted = match ensure_mounted(state, &mut slot, source) {
        Ok(mounted) => mounted,
        Err(e) => return error_page(&e),
    };

    match action(&mut mounted.view, state) {
        Ok(notice) => {
            mounted.notice = notice;
            mounted.error = None;
        }
        Err(e) => {
            log::warn!("Conversation action failed: {}", e);
            mounted.notice = None;
            mounted.error = Some(e.to_string());
        }
    }

    Redirect::to(&source.path()).into_response()
}

#[derive(Debug, Deserialize)]
struct SelectForm {
    #[serde(default)]
    shift: String,
}

#[derive(Debug, Deserialize)]
struct SpeakerForm {
    #[serde(default)]
    new_speaker: String,
}

async fn select_row(
    State(state): State<AppState>,
    Path((source, id)): Path<(String, i64)>,
    Form(form): Form<SelectForm>,
) -> Response {
    let shift = form.shift == "true";
    conversation_action(&state, &source, |view, _| {
        view.click_row(id, shift);
        Ok(None)
    }).await
}

async fn pick_speaker(State(state): State<AppState>, Path((source, id)): Path<(String, i64)>) -> Response {
    conversation_action(&state, &source, |view, _| {
        view.pick_current_speaker(id);
        Ok(None)
    }).await
}

async fn clear_selection(State(state): State<AppState>, Path(source): Path<String>) -> Response {
    conversation_action(&state, &source, |view, _| {
        view.clear_selection();
        Ok(None)
    }).await
}

async fn rename(
    State(state): State<AppState>,
    Path(source): Path<String>,
    Form(form): Form<SpeakerForm>,
) -> Response {
    conversation_action(&state, &source, |view, state| {
        view.set_new_speaker(form.new_speaker);
        view.submit_rename(state.service()).map(Some)
    }).await
}

async fn rename_selected(
    State(state): State<AppState>,
    Path(source): Path<String>,
    Form(form): Form<SpeakerForm>,
) -> Response {
    conversation_action(&state, &source, |view, state| {
        view.set_new_speaker(form.new_speaker);
        view.rename_selected(state.service())
    }).await
}

async fn delete_selected(State(state): State<AppState>, Path(source): Path<String>) -> Response {
    conversation_action(&state, &source, |view, state| view.delete_selected(state.service())).await
}

async fn delete_conversation(State(state): State<AppState>, Path(source): Path<String>) -> Response {
    conversation_action(&state, &source, |view, state| view.delete_conversation(state.service())).await
}

async fn copy_conversation(State(state): State<AppState>, Path(source): Path<String>) -> Response {
    conversation_action(&state, &source, |view, state| Ok(view.copy_to_clipboard(state.clipboard()))).await
}

async fn transcript_page(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.service().get_by_id(ByIdInput { id }) {
        Ok(Some(segment)) => Html(html::render_transcript_page(&TranscriptForm::new(&segment), None, None)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Html(html::render_not_found(&format!("Transcript {}", id)))).into_response(),
        Err(e) => error_page(&e),
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptFields {
    conversation: String,
    speaker: String,
    #[serde(default)]
    date: String,
    start_time: String,
    end_time: String,
    duration: String,
    content: String,
}

async fn submit_transcript(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(fields): Form<TranscriptFields>,
) -> Response {
    // session id is read-only, so it comes from the stored record rather than the post
    let segment = match state.service().get_by_id(ByIdInput { id }) {
        Ok(Some(segment)) => segment,
        Ok(None) => return (StatusCode::NOT_FOUND, Html(html::render_not_found(&format!("Transcript {}", id)))).into_response(),
        Err(e) => return error_page(&e),
    };

    let mut form = TranscriptForm::new(&segment);
    form.set_conversation(fields.conversation);
    form.set_speaker(fields.speaker);
    form.set_date(fields.date);
    form.set_start_time(fields.start_time);
    form.set_end_time(fields.end_time);
    form.set_duration(fields.duration);
    form.set_content(fields.content);

    match form.submit(state.service()) {
        Ok(notice) => Html(html::render_transcript_page(&form, Some(notice), None)).into_response(),
        Err(e) => (
            status_for(&e),
            Html(html::render_transcript_page(&form, None, Some(&e.to_string()))),
        ).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::testing::RecordingClipboard;
    use crate::database::DatabaseManager;
    use crate::service::test_support::{seed, SESSION_1, SESSION_2};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    struct Harness {
        _dir: TempDir,
        state: AppState,
        clipboard: Arc<RecordingClipboard>,
        router: Router,
    }

    fn harness() -> Harness {
        let dir = tempdir().unwrap();
        let db = DatabaseManager::new(dir.path().join("test.db")).unwrap();
        let clipboard = Arc::new(RecordingClipboard::default());
        let state = AppState::with_clipboard(Arc::new(db), clipboard.clone());
        let router = router().with_state(state.clone());
        Harness { _dir: dir, state, clipboard, router }
    }

    async fn get_page(router: &Router, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn post_form(router: &Router, uri: &str, body: &str) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        router.clone().oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn landing_lists_conversations() {
        let h = harness();
        seed(h.state.service(), SESSION_1, 1, &[("Alice", "a")]);
        seed(h.state.service(), SESSION_2, 4, &[("Bob", "b")]);

        let (status, body) = get_page(&h.router, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("href=\"/conversation/1\""));
        assert!(body.contains(SESSION_2));
    }

    #[tokio::test]
    async fn empty_store_shows_placeholder() {
        let h = harness();
        let (status, body) = get_page(&h.router, "/conversation/latest").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No transcripts found"));
    }

    #[tokio::test]
    async fn invalid_conversation_parameter_is_rejected() {
        let h = harness();
        let (status, _) = get_page(&h.router, "/conversation/zero").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = get_page(&h.router, "/conversation/0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn select_then_delete_selected() {
        let h = harness();
        let seeded = seed(h.state.service(), SESSION_1, 1, &[("Alice", "a"), ("Bob", "b"), ("Dan", "c")]);

        let (_, body) = get_page(&h.router, "/conversation/1").await;
        assert!(body.contains("[Alice]:"));

        let response = post_form(&h.router, &format!("/conversation/1/select/{}", seeded[0].id), "shift=false").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/conversation/1");

        post_form(&h.router, &format!("/conversation/1/select/{}", seeded[1].id), "shift=true").await;
        let (_, body) = get_page(&h.router, "/conversation/1").await;
        assert!(body.contains("Delete selected"));

        post_form(&h.router, "/conversation/1/delete-selected", "").await;
        let (_, body) = get_page(&h.router, "/conversation/1").await;
        assert!(body.contains("Records deleted successfully"));
        assert!(!body.contains("[Alice]:"));
        assert!(!body.contains("[Bob]:"));
        assert!(body.contains("[Dan]:"));
        assert!(!body.contains("Delete selected"));
    }

    #[tokio::test]
    async fn rename_form_uses_picked_speaker() {
        let h = harness();
        let seeded = seed(h.state.service(), SESSION_1, 1, &[("Alice", "a"), ("Bob", "b"), ("Bob", "c")]);

        get_page(&h.router, "/conversation/1").await;
        post_form(&h.router, &format!("/conversation/1/speaker/{}", seeded[1].id), "").await;
        post_form(&h.router, "/conversation/1/rename", "new_speaker=Robert").await;

        let (_, body) = get_page(&h.router, "/conversation/1").await;
        assert!(body.contains("Speaker updated successfully"));
        assert!(body.contains("[Alice]:"));
        assert!(!body.contains("[Bob]:"));
        assert_eq!(body.matches("[Robert]:").count(), 2);
    }

    #[tokio::test]
    async fn copy_writes_clipboard() {
        let h = harness();
        seed(h.state.service(), SESSION_1, 1, &[("Alice", "hi"), ("Bob", "yo")]);

        post_form(&h.router, "/conversation/1/copy", "").await;
        assert_eq!(h.clipboard.last().as_deref(), Some("Alice: hi\nBob: yo"));

        let (_, body) = get_page(&h.router, "/conversation/1").await;
        assert!(body.contains("Conversation copied to clipboard"));
    }

    #[tokio::test]
    async fn transcript_edit_round_trip() {
        let h = harness();
        let seeded = seed(h.state.service(), SESSION_1, 1, &[("Alice", "hi")]);
        let uri = format!("/transcript/{}", seeded[0].id);

        let (status, body) = get_page(&h.router, &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("readonly"));

        let response = post_form(
            &h.router,
            &uri,
            "conversation=3&speaker=Alicia&date=2024-05-02&start_time=00%3A00%3A01.000&end_time=00%3A00%3A02.000&duration=00%3A00%3A01.000&content=hello",
        ).await;
        assert_eq!(response.status(), StatusCode::OK);

        let stored = h.state.service().get_by_id(ByIdInput { id: seeded[0].id }).unwrap().unwrap();
        assert_eq!(stored.session_id, SESSION_1);
        assert_eq!(stored.conversation, 3);
        assert_eq!(stored.speaker, "Alicia");
        assert_eq!(stored.content, "hello");

        let response = post_form(
            &h.router,
            &uri,
            "conversation=x&speaker=A&date=&start_time=&end_time=&duration=&content=",
        ).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let (status, _) = get_page(&h.router, "/transcript/9999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
