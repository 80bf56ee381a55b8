use std::cell::RefCell;
use std::rc::Rc;

use futures::future::{select, Either};
use gloo_net::http::Request;
use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::JsValue;
use web_sys::Document;

use quillcrew_render::{
    extract_agent_replies, locate_messages, message_sources, parse_envelope, predict_url,
    FetchError, FetchState,
};
use quillcrew_types::{Envelope, REQUEST_TIMEOUT_SECS};

use crate::dom;

pub struct StylizerApp {
    document: Document,
    state: Rc<RefCell<UiState>>,
}

struct UiState {
    fetch: FetchState,
    show_full_response: bool,
}

impl StylizerApp {
    pub fn new() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document"))?;

        let state = UiState {
            fetch: FetchState::Idle,
            show_full_response: false,
        };

        Ok(Self {
            document,
            state: Rc::new(RefCell::new(state)),
        })
    }

    pub fn start(self) -> Result<(), JsValue> {
        self.setup_generate_button()?;
        self.setup_debug_toggle()?;
        Ok(())
    }

    fn setup_generate_button(&self) -> Result<(), JsValue> {
        let button = dom::get_element_by_id(&self.document, "generateButton")?;
        let document = self.document.clone();
        let state = self.state.clone();

        dom::add_click_listener(&button, move || {
            let document = document.clone();
            let state = state.clone();
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = handle_generate(document, state).await {
                    log::error!("Generate failed: {:?}", e);
                }
            });
        })
    }

    fn setup_debug_toggle(&self) -> Result<(), JsValue> {
        let button = dom::get_element_by_id(&self.document, "debugToggle")?;
        let document = self.document.clone();
        let state = self.state.clone();

        dom::add_click_listener(&button, move || {
            {
                let mut ui = state.borrow_mut();
                ui.show_full_response = !ui.show_full_response;
            }
            // Display concern only; the fetched data is untouched
            if let Err(e) = refresh_raw_payload(&document, &state) {
                log::error!("Debug toggle failed: {:?}", e);
            }
        })
    }
}

/// One generate interaction: lock out re-submission, fetch, classify the
/// outcome, and render. The button stays disabled until the request
/// resolves; there is no way to cancel an in-flight run.
async fn handle_generate(document: Document, state: Rc<RefCell<UiState>>) -> Result<(), JsValue> {
    let input = dom::get_textarea_by_id(&document, "taskInput")?;
    let task = input.value();
    if task.trim().is_empty() {
        set_status(
            &document,
            "warning",
            "Please enter a writing request in the text area above.",
        )?;
        return Ok(());
    }

    if !state.borrow_mut().fetch.begin() {
        // A request is already in flight
        return Ok(());
    }

    let button = dom::get_button_by_id(&document, "generateButton")?;
    button.set_disabled(true);
    set_status(
        &document,
        "",
        "Sending your request to the AI Writing Team... Please wait a moment!",
    )?;
    clear_responses(&document)?;

    match fetch_task(&task).await {
        Ok(envelope) => {
            state.borrow_mut().fetch.succeed(envelope.clone());
            render_envelope(&document, &envelope)?;
        }
        Err(e) => {
            let message = e.user_message();
            state.borrow_mut().fetch.fail(message.clone());
            set_status(&document, "error", &message)?;
        }
    }

    refresh_raw_payload(&document, &state)?;
    button.set_disabled(false);
    Ok(())
}

/// Issue the request with the fixed timeout and classify the outcome.
async fn fetch_task(task: &str) -> Result<Envelope, FetchError> {
    let url = predict_url("", task);
    log::info!("Requesting: {}", url);

    let request = Request::get(&url).send();
    let timeout = TimeoutFuture::new((REQUEST_TIMEOUT_SECS * 1000) as u32);
    futures::pin_mut!(request, timeout);

    let response = match select(request, timeout).await {
        Either::Left((result, _)) => {
            result.map_err(|e| FetchError::Transport(e.to_string()))?
        }
        Either::Right(_) => return Err(FetchError::Timeout),
    };

    if response.status() != 200 {
        return Err(FetchError::Status(response.status()));
    }

    let body = response
        .text()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    parse_envelope(&body)
}

fn render_envelope(document: &Document, envelope: &Envelope) -> Result<(), JsValue> {
    if !envelope.status {
        set_status(
            document,
            "error",
            &format!("The team reported an error: {}", envelope.message),
        )?;
        return Ok(());
    }

    let data = match &envelope.data {
        Some(data) => data,
        None => {
            set_status(
                document,
                "error",
                "The API returned an unexpected response format.",
            )?;
            return Ok(());
        }
    };

    let (messages, location) = match locate_messages(data) {
        Some(found) => found,
        None => {
            set_status(document, "error", &FetchError::ContentLocation.user_message())?;
            return Ok(());
        }
    };
    log::info!("Found messages in: {}", location);

    let replies = extract_agent_replies(&messages);
    if replies.is_empty() {
        set_status(
            document,
            "warning",
            "The AI team processed your request, but no writer responses were found.",
        )?;
        let sources = message_sources(&messages);
        if !sources.is_empty() {
            log::info!("Available sources in messages: {}", sources.join(", "));
        }
        return Ok(());
    }

    set_status(document, "success", "✅ Text generated successfully!")?;

    let container = dom::get_element_by_id(document, "responses")?;
    dom::clear_element(&container);
    for (i, reply) in replies.iter().enumerate() {
        let card = dom::create_element_with_class(document, "div", "response")?;

        let heading = document.create_element("h3")?;
        dom::set_text_content(
            &heading,
            &format!("Response {} - {}", i + 1, reply.agent.display_name()),
        );
        card.append_child(&heading)?;

        match &reply.text {
            Some(text) => {
                let body = document.create_element("p")?;
                dom::set_text_content(&body, text);
                card.append_child(&body)?;
            }
            None => {
                let missing = dom::create_element_with_class(document, "p", "missing")?;
                dom::set_text_content(
                    &missing,
                    &format!("No content found for {}", reply.agent.display_name()),
                );
                card.append_child(&missing)?;
                log::warn!("Message structure: {}", reply.raw);
            }
        }

        container.append_child(&card)?;
    }

    Ok(())
}

fn refresh_raw_payload(document: &Document, state: &Rc<RefCell<UiState>>) -> Result<(), JsValue> {
    let pre = dom::get_html_element_by_id(document, "rawPayload")?;
    let ui = state.borrow();

    if !ui.show_full_response {
        dom::hide_element(&pre);
        return Ok(());
    }

    let text = match ui.fetch.envelope() {
        Some(envelope) => serde_json::to_string_pretty(envelope)
            .unwrap_or_else(|e| format!("Could not dump envelope: {}", e)),
        None => "(no response yet)".to_string(),
    };
    dom::set_text_content(&pre, &text);
    dom::show_element(&pre);
    Ok(())
}

fn set_status(document: &Document, class: &str, text: &str) -> Result<(), JsValue> {
    let status = dom::get_element_by_id(document, "statusArea")?;
    status.set_class_name(&format!("status {}", class).trim().to_string());
    dom::set_text_content(&status, text);
    Ok(())
}

fn clear_responses(document: &Document) -> Result<(), JsValue> {
    let container = dom::get_element_by_id(document, "responses")?;
    dom::clear_element(&container);
    Ok(())
}
