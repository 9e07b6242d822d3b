use tracing::{Instrument, error, info, instrument, warn};

use crate::{
    base::{
        extract::first_url,
        prompts::{COMMAND_USAGE, format_failure_message, format_report_message},
        types::{AnalysisError, Void},
    },
    interaction::analysis::Pipeline,
    service::chat::ChatClient,
};

/// Handle a slash command, in the background.
///
/// Returns the text of the immediate (ephemeral) acknowledgement.
#[instrument(skip(pipeline, chat, response_url))]
pub fn handle_command(text: String, channel_id: String, response_url: String, pipeline: Pipeline, chat: ChatClient) -> String {
    let Some(url) = first_url(&text) else {
        warn!("{}", AnalysisError::TriggerNoUrl);
        return COMMAND_USAGE.to_string();
    };

    let ack = format!("🔍 Analyzing {url} ... the report will be posted here shortly.");

    tokio::spawn(
        async move {
            let result = process_command(&url, &response_url, &pipeline, &chat).await;

            if let Err(err) = &result {
                error!("Error while handling command in {channel_id}: {}", err);
            }
        }
        .in_current_span(),
    );

    ack
}

/// Analyze `url` and deliver the report (or failure) through the command's response URL.
#[instrument(skip(response_url, pipeline, chat))]
pub async fn process_command(url: &str, response_url: &str, pipeline: &Pipeline, chat: &ChatClient) -> Void {
    info!("Received command trigger.");

    let message = match pipeline.analyze(url).await {
        Ok(report) => format_report_message(&report.text, report.provenance, report.access_status),
        Err(err) => {
            error!("Analysis of {url} failed: {err}");
            format_failure_message(&err.to_string())
        }
    };

    chat.respond_to_command(response_url, &message).await
}
