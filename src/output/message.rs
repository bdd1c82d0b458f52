use crate::ads::ResolvedAd;
use crate::url::defang;
use chrono::{DateTime, Utc};

const MESSAGE_FOOTER: &str = "This message was automatically sent by seads";

/// Builds the notification text for a set of unexpected ads
///
/// Links are always defanged, whatever the console settings.
///
/// # Arguments
///
/// * `ads` - Ads to report, usually the unexpected ones
/// * `created_at` - Timestamp printed in the header
pub fn notification_message(ads: &[&ResolvedAd], created_at: DateTime<Utc>) -> String {
    let mut message = String::from(
        "Here are the \"unexpected domains\" found during the last execution of seads:\n\n",
    );
    message.push_str(&format!(
        "Message creation date: {}\n\n",
        created_at.format("%Y-%m-%d %H:%M:%S")
    ));

    for ad in ads {
        message.push_str(&format_ad_block(ad));
        message.push('\n');
    }

    message.push('\n');
    message.push_str(MESSAGE_FOOTER);
    message
}

fn format_ad_block(ad: &ResolvedAd) -> String {
    let mut block = format!(
        "* Search engine: {}\n\tSearch term: {}\n\tDomain: {}\n\tFull link: {}\n",
        ad.engine(),
        ad.query(),
        defang(&ad.final_domain),
        defang(&ad.final_redirect_url)
    );

    if let Some(name) = &ad.observation.advertiser {
        block.push_str(&format!(
            "\tAdvertiser: {}\n\tLocation: {}\n",
            name,
            ad.observation.advertiser_location.as_deref().unwrap_or("")
        ));
    }

    block
}
