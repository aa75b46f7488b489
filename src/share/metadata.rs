//! Share URL and link-preview meta tags built from a derived view.

use serde::Serialize;
use url::Url;

use crate::coordinator::DerivedView;
use crate::session::OptionSide;

/// Product name appended to page titles.
pub const SITE_NAME: &str = "Frenbet";

/// Title of the landing page and of draft sessions.
pub const HOME_TITLE: &str = "Frenbet - Create a New Bet";

const HOME_DESCRIPTION: &str = "Create and share friendly bets with your friends";

/// Link-preview data for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareMetadata {
    /// Canonical link to share.
    pub url: String,
    /// Page title.
    pub title: String,
    /// Preview text.
    pub description: String,
    /// Preview image URL, rendered elsewhere.
    pub image: String,
}

/// Shareable link for a session slug: `{base}/bet/{slug}`.
pub fn share_url(base: &Url, slug: &str) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push("bet").push(slug);
    }
    url
}

fn og_image(base: &Url) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().extend(["api", "og"]);
    }
    url
}

impl ShareMetadata {
    /// Meta tags for the landing page.
    pub fn home(base: &Url) -> Self {
        let mut image = og_image(base);
        image.query_pairs_mut().append_pair("type", "home");

        Self {
            url: base.to_string(),
            title: HOME_TITLE.to_string(),
            description: HOME_DESCRIPTION.to_string(),
            image: image.to_string(),
        }
    }

    /// Meta tags for a session. Drafts fall back to the landing page tags.
    pub fn for_view(base: &Url, view: &DerivedView) -> Self {
        let session = &view.session;
        if !session.created {
            return Self::home(base);
        }

        let odds = OptionSide::BOTH.map(|side| view.odds(side).to_string());
        let names = OptionSide::BOTH.map(|side| session.option_name(side));
        let pool = view.total_pool.normalize().to_string();

        let mut image = og_image(base);
        image
            .query_pairs_mut()
            .append_pair("title", &session.title)
            .append_pair("option1", names[0])
            .append_pair("option2", names[1])
            .append_pair("odds1", &odds[0])
            .append_pair("odds2", &odds[1])
            .append_pair("pool", &pool);

        Self {
            url: share_url(base, &session.slug).to_string(),
            title: format!("{} | {}", session.title, SITE_NAME),
            description: format!(
                "{} ({}) vs {} ({}) - Total Pool: ${}",
                names[0], odds[0], names[1], odds[1], pool
            ),
            image: image.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerSnapshot, Wager, WagerId};
    use crate::session::{BetPercentages, Session, SessionDraft};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn base() -> Url {
        Url::parse("https://frenbet.example").unwrap()
    }

    fn session() -> Session {
        SessionDraft::new("Rain & shine?", "Rain", "Sun", "alice")
            .into_session("abc123".to_string(), BetPercentages::default())
    }

    fn wager(session: &Session, seq: u64, side: OptionSide, amount: Decimal) -> Wager {
        Wager {
            id: WagerId::new(),
            session_id: session.id,
            sequence: seq,
            player_name: format!("p{}", seq),
            side,
            amount,
            placed_at: 0,
        }
    }

    #[test]
    fn share_url_appends_slug() {
        assert_eq!(
            share_url(&base(), "abc123").as_str(),
            "https://frenbet.example/bet/abc123"
        );
        let nested = Url::parse("https://host.example/app/").unwrap();
        assert_eq!(
            share_url(&nested, "x1").as_str(),
            "https://host.example/app/bet/x1"
        );
    }

    #[test]
    fn session_meta_tags() {
        let session = session();
        let wagers = vec![
            wager(&session, 1, OptionSide::First, dec!(100)),
            wager(&session, 2, OptionSide::Second, dec!(60)),
        ];
        let view = DerivedView::build(
            session.clone(),
            LedgerSnapshot::from_wagers(session.id, &wagers),
        );

        let meta = ShareMetadata::for_view(&base(), &view);
        assert_eq!(meta.url, "https://frenbet.example/bet/abc123");
        assert_eq!(meta.title, "Rain & shine? | Frenbet");
        assert_eq!(
            meta.description,
            "Rain (0.60x) vs Sun (1.67x) - Total Pool: $160"
        );
        assert_eq!(
            meta.image,
            "https://frenbet.example/api/og?title=Rain+%26+shine%3F&option1=Rain&option2=Sun&odds1=0.60x&odds2=1.67x&pool=160"
        );
    }

    #[test]
    fn empty_pool_shows_undefined_odds() {
        let session = session();
        let view = DerivedView::build(session.clone(), LedgerSnapshot::empty(session.id));
        let meta = ShareMetadata::for_view(&base(), &view);
        assert_eq!(meta.description, "Rain (---) vs Sun (---) - Total Pool: $0");
    }

    #[test]
    fn draft_gets_home_tags() {
        let mut session = session();
        session.created = false;
        let view = DerivedView::build(session.clone(), LedgerSnapshot::empty(session.id));

        let meta = ShareMetadata::for_view(&base(), &view);
        assert_eq!(meta, ShareMetadata::home(&base()));
        assert_eq!(meta.title, HOME_TITLE);
        assert_eq!(meta.image, "https://frenbet.example/api/og?type=home");
    }
}
