//! Output dispatcher: resolves a destination scope into concrete
//! (workspace, channel) targets and records one delivery receipt per channel.
//!
//! The text body always goes first; images follow as separate messages and
//! never block or fail the text delivery. Each channel succeeds or fails
//! independently.

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::core::config::AppConfig;
use crate::core::models::{
    DeliveryReceipt, DeliveryStatus, DestinationGroup, DestinationScope, ImageHandle,
    NormalizedDocument, Summary,
};
use crate::errors::BotError;
use crate::slack::SlackClient;
use crate::slack::message_formatter::format_summary_message;

/// Posts text and images into one channel of one workspace. The Slack
/// implementation carries its own bounded retry; fakes in tests do not.
#[async_trait]
pub trait ChannelPoster: Send + Sync {
    async fn post_text(
        &self,
        group: DestinationGroup,
        channel_id: &str,
        text: &str,
    ) -> Result<(), BotError>;

    async fn post_image(
        &self,
        group: DestinationGroup,
        channel_id: &str,
        image: &ImageHandle,
    ) -> Result<(), BotError>;
}

/// Delivery capability consumed by the orchestration loop.
#[async_trait]
pub trait DeliverSummary: Send + Sync {
    async fn deliver(
        &self,
        document: &NormalizedDocument,
        summary: &Summary,
        scope: DestinationScope,
    ) -> Vec<DeliveryReceipt>;

    /// Best-effort failure notice to the personal destination group only.
    async fn notify_failure(&self, text: &str) -> Vec<DeliveryReceipt>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationTarget {
    pub group: DestinationGroup,
    pub channel_id: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedDestinations {
    pub targets: Vec<DestinationTarget>,
    /// Business delivery was requested but is globally disabled.
    pub business_fallback: bool,
}

/// Resolve a scope into the ordered channel targets: personal channels first,
/// then business channels when requested and globally enabled. A business
/// request with business delivery disabled silently falls back to personal,
/// and the fallback is recorded on every receipt.
#[must_use]
pub fn resolve_destinations(
    scope: DestinationScope,
    personal_channels: &[String],
    business_channels: &[String],
    business_enabled: bool,
) -> ResolvedDestinations {
    let mut targets: Vec<DestinationTarget> = personal_channels
        .iter()
        .map(|channel_id| DestinationTarget {
            group: DestinationGroup::Personal,
            channel_id: channel_id.clone(),
        })
        .collect();

    let business_requested = scope == DestinationScope::PersonalAndBusiness;
    if business_requested && business_enabled {
        targets.extend(business_channels.iter().map(|channel_id| DestinationTarget {
            group: DestinationGroup::Business,
            channel_id: channel_id.clone(),
        }));
    }

    ResolvedDestinations {
        targets,
        business_fallback: business_requested && !business_enabled,
    }
}

/// Dispatcher over any channel poster, so delivery semantics are testable
/// without a Slack workspace.
pub struct Dispatcher<P> {
    poster: P,
    personal_channels: Vec<String>,
    business_channels: Vec<String>,
    business_enabled: bool,
}

impl<P: ChannelPoster> Dispatcher<P> {
    #[must_use]
    pub fn new(
        poster: P,
        personal_channels: Vec<String>,
        business_channels: Vec<String>,
        business_enabled: bool,
    ) -> Self {
        Self {
            poster,
            personal_channels,
            business_channels,
            business_enabled,
        }
    }

    async fn post_to_target(
        &self,
        target: &DestinationTarget,
        text: &str,
        images: &[ImageHandle],
        business_fallback: bool,
    ) -> DeliveryReceipt {
        match self
            .poster
            .post_text(target.group, &target.channel_id, text)
            .await
        {
            Ok(()) => {
                for image in images {
                    if let Err(e) = self
                        .poster
                        .post_image(target.group, &target.channel_id, image)
                        .await
                    {
                        warn!(
                            channel = %target.channel_id,
                            image = %image.filename,
                            error = %e,
                            "Image upload failed, text delivery unaffected"
                        );
                    }
                }
                DeliveryReceipt {
                    destination_group: target.group,
                    channel_id: target.channel_id.clone(),
                    status: DeliveryStatus::Sent,
                    error: None,
                    business_fallback,
                }
            }
            Err(e) => {
                error!(channel = %target.channel_id, error = %e, "Channel delivery failed");
                DeliveryReceipt {
                    destination_group: target.group,
                    channel_id: target.channel_id.clone(),
                    status: DeliveryStatus::Failed,
                    error: Some(e.to_string()),
                    business_fallback,
                }
            }
        }
    }
}

#[async_trait]
impl<P: ChannelPoster> DeliverSummary for Dispatcher<P> {
    async fn deliver(
        &self,
        document: &NormalizedDocument,
        summary: &Summary,
        scope: DestinationScope,
    ) -> Vec<DeliveryReceipt> {
        let resolved = resolve_destinations(
            scope,
            &self.personal_channels,
            &self.business_channels,
            self.business_enabled,
        );
        if resolved.business_fallback {
            info!("Business delivery requested but disabled, falling back to personal channels");
        }

        let text = format_summary_message(document, summary);
        let mut receipts = Vec::with_capacity(resolved.targets.len());
        for target in &resolved.targets {
            receipts.push(
                self.post_to_target(target, &text, &document.images, resolved.business_fallback)
                    .await,
            );
        }
        receipts
    }

    async fn notify_failure(&self, text: &str) -> Vec<DeliveryReceipt> {
        let mut receipts = Vec::with_capacity(self.personal_channels.len());
        for channel_id in &self.personal_channels {
            let target = DestinationTarget {
                group: DestinationGroup::Personal,
                channel_id: channel_id.clone(),
            };
            receipts.push(self.post_to_target(&target, text, &[], false).await);
        }
        receipts
    }
}

/// Channel poster backed by the personal and (optional) business Slack
/// workspace tokens.
pub struct SlackChannelPoster {
    personal: SlackClient,
    business: Option<SlackClient>,
    http: reqwest::Client,
}

impl SlackChannelPoster {
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Self {
            personal: SlackClient::new(config.personal_bot_token.clone()),
            business: config
                .business_bot_token
                .clone()
                .map(SlackClient::new),
            http: reqwest::Client::new(),
        }
    }

    fn client_for(&self, group: DestinationGroup) -> Result<&SlackClient, BotError> {
        match group {
            DestinationGroup::Personal => Ok(&self.personal),
            DestinationGroup::Business => self.business.as_ref().ok_or_else(|| {
                BotError::Delivery("business workspace token not configured".to_string())
            }),
        }
    }
}

#[async_trait]
impl ChannelPoster for SlackChannelPoster {
    async fn post_text(
        &self,
        group: DestinationGroup,
        channel_id: &str,
        text: &str,
    ) -> Result<(), BotError> {
        self.client_for(group)?.post_message(channel_id, text).await
    }

    async fn post_image(
        &self,
        group: DestinationGroup,
        channel_id: &str,
        image: &ImageHandle,
    ) -> Result<(), BotError> {
        let response = self.http.get(&image.url).send().await?;
        if !response.status().is_success() {
            return Err(BotError::Delivery(format!(
                "image fetch for '{}' returned status {}",
                image.filename,
                response.status()
            )));
        }
        let bytes = response.bytes().await?.to_vec();
        self.client_for(group)?
            .upload_image(channel_id, &image.filename, bytes)
            .await
    }
}
