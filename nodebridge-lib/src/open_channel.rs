//! Channel-open outcome classification.

use async_trait::async_trait;

use crate::classify::{is_pending_channel_state, OPEN_CHANNEL_ERRORS, OPEN_CHANNEL_MESSAGES};
use crate::models::OpenChannelOutcome;
use crate::Result;

/// Marker preceding the channel id in a successful open response.
pub const CREATED_CHANNEL_MARKER: &str = "created channel";

/// Looks up the raw state string of a channel by id.
#[async_trait]
pub trait ChannelStateLookup: Send + Sync {
    /// Raw backend state, e.g. `WAIT_FOR_FUNDING_CONFIRMED` or `NORMAL`.
    async fn channel_state(&self, channel_id: &str) -> Result<String>;
}

/// Channel id announced by a `created channel <id> ...` message.
pub fn created_channel_id(message: &str) -> Option<&str> {
    let start = message.find(CREATED_CHANNEL_MARKER)? + CREATED_CHANNEL_MARKER.len();
    message[start..].split_whitespace().next()
}

/// Classify the text of an error raised by an open-channel call.
pub fn classify_open_error(message: &str) -> OpenChannelOutcome {
    OPEN_CHANNEL_ERRORS.matched(message).unwrap_or_else(|| {
        tracing::warn!("unclassified open-channel error: {}", message);
        OPEN_CHANNEL_ERRORS.fallback()
    })
}

/// Classify the success message of an open-channel call.
///
/// A created channel still waiting on its funding transaction needs more
/// confirmations. A failing state lookup is classified like an open error;
/// connectivity failures propagate, as they do from the open call itself.
pub async fn classify_open_response<L>(message: &str, lookup: &L) -> Result<OpenChannelOutcome>
where
    L: ChannelStateLookup + ?Sized,
{
    if let Some(channel_id) = created_channel_id(message) {
        match lookup.channel_state(channel_id).await {
            Ok(state) if is_pending_channel_state(&state) => {
                tracing::debug!("channel {} in {}", channel_id, state);
                return Ok(OpenChannelOutcome::NeedMoreConfirmations);
            }
            Ok(_) => {}
            Err(err) if err.is_connectivity() => return Err(err),
            Err(err) => return Ok(classify_open_error(&err.to_string())),
        }
    }

    Ok(OPEN_CHANNEL_MESSAGES.classify(message))
}
