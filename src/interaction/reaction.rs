use tracing::{Instrument, error, info, instrument, warn};

use crate::{
    base::{
        extract::{extract_urls, trim_url},
        prompts::{NO_URL_NOTICE, format_failure_message, format_report_message},
        types::{AnalysisError, Void},
    },
    interaction::analysis::Pipeline,
    service::chat::ChatClient,
};

/// Handle a trigger reaction on a message, in the background.
#[instrument(skip_all)]
pub fn handle_reaction(channel_id: String, message_ts: String, pipeline: Pipeline, chat: ChatClient) {
    tokio::spawn(
        async move {
            // Process the event.
            let result = process_reaction(&channel_id, &message_ts, &pipeline, &chat).await;

            // Log any errors.
            if let Err(err) = &result {
                error!("Error while handling reaction: {}", err);
            }
        }
        .in_current_span(),
    );
}

/// Analyze the first URL in the reacted message and reply in its thread.
///
/// Exactly one message is posted: the report, the no-URL notice, or the failure.
#[instrument(skip(pipeline, chat))]
pub async fn process_reaction(channel_id: &str, message_ts: &str, pipeline: &Pipeline, chat: &ChatClient) -> Void {
    info!("Received reaction trigger.");

    let config = &pipeline.config;

    let text = match chat.get_message_text(channel_id, message_ts).await {
        Ok(text) => text.unwrap_or_default(),
        Err(err) => {
            let err = AnalysisError::TriggerLookupFailed(err.to_string());
            chat.send_message(channel_id, message_ts, &format_failure_message(&err.to_string())).await?;
            return Err(err.into());
        }
    };

    let Some(url) = extract_urls(&text).first().map(|u| trim_url(u).to_string()) else {
        warn!("{}", AnalysisError::TriggerNoUrl);
        return chat.send_message(channel_id, message_ts, NO_URL_NOTICE).await;
    };

    // Progress markers are cosmetic; failing to set them must not stop the analysis.
    if let Err(err) = chat.react_to_message(channel_id, message_ts, &config.processing_reaction).await {
        warn!("Failed to add processing reaction: {err}");
    }

    match pipeline.analyze(&url).await {
        Ok(report) => {
            let message = format_report_message(&report.text, report.provenance, report.access_status);
            chat.send_message(channel_id, message_ts, &message).await?;

            if let Err(err) = chat.remove_reaction(channel_id, message_ts, &config.processing_reaction).await {
                warn!("Failed to remove processing reaction: {err}");
            }

            if let Err(err) = chat.react_to_message(channel_id, message_ts, &config.done_reaction).await {
                warn!("Failed to add done reaction: {err}");
            }

            info!("Responded with a {} report for {}.", report.provenance, report.company_name);

            Ok(())
        }
        Err(err) => {
            error!("Analysis of {url} failed: {err}");
            chat.send_message(channel_id, message_ts, &format_failure_message(&err.to_string())).await
        }
    }
}
