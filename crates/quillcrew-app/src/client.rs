//! Terminal client mode: send one task to a running quillcrew server and
//! print the writer replies, without the browser UI.

use anyhow::Result;
use colored::Colorize;
use std::time::Duration;

use quillcrew_render::{
    extract_agent_replies, locate_messages, parse_envelope, predict_url, FetchError,
};
use quillcrew_types::{Envelope, REQUEST_TIMEOUT_SECS};

use crate::cli::AskArgs;

pub async fn run_ask(args: &AskArgs) -> Result<()> {
    let url = predict_url(&args.base_url, &args.task);
    println!("Sending your request to the AI Writing Team...");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?;

    match fetch_envelope(&client, &url).await {
        Ok(envelope) => {
            print_envelope(&envelope);
            if args.debug {
                print_raw(&envelope, args.pretty);
            }
        }
        Err(e) => println!("{}", e.user_message().red()),
    }

    Ok(())
}

/// Classify the outcome of one request: connection failure, timeout,
/// non-200 status, unparsable payload, or a parsed envelope.
async fn fetch_envelope(client: &reqwest::Client, url: &str) -> Result<Envelope, FetchError> {
    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Transport(e.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let body = response
        .text()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    parse_envelope(&body)
}

fn print_envelope(envelope: &Envelope) {
    if !envelope.status {
        println!(
            "{}",
            format!("The team reported an error: {}", envelope.message).red()
        );
        return;
    }

    let data = match &envelope.data {
        Some(data) => data,
        None => {
            println!("{}", "The API returned an unexpected response format.".red());
            return;
        }
    };

    let (messages, _location) = match locate_messages(data) {
        Some(found) => found,
        None => {
            println!("{}", FetchError::ContentLocation.user_message().red());
            return;
        }
    };

    let replies = extract_agent_replies(&messages);
    if replies.is_empty() {
        println!(
            "{}",
            "The AI team processed your request, but no writer responses were found.".yellow()
        );
        return;
    }

    println!("{}", "✅ Text generated successfully!".green());
    for (i, reply) in replies.iter().enumerate() {
        println!();
        println!(
            "{}",
            format!("Response {} - {}", i + 1, reply.agent.display_name()).bold()
        );
        match &reply.text {
            Some(text) => println!("{}", text),
            None => println!(
                "{}",
                format!("No content found for {}", reply.agent.display_name()).red()
            ),
        }
    }
}

fn print_raw(envelope: &Envelope, pretty: bool) {
    let dump = if pretty {
        serde_json::to_string_pretty(envelope)
    } else {
        serde_json::to_string(envelope)
    };
    match dump {
        Ok(json) => {
            println!();
            println!("Full JSON response from the API:");
            println!("{}", json);
        }
        Err(e) => println!("{}", format!("Could not dump envelope: {}", e).red()),
    }
}
