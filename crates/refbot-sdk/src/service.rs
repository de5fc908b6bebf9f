use std::fmt;

use refbot_discount::{DiscountSchedule, Discounts, ReferralLinkGenerator};
use refbot_registry::{validate_platform_id, validate_user_id, UserRegistry};
use refbot_store::{JsonFileStore, RecordStore, TracedStore, UserMap};
use serde::Serialize;
use tracing::{info, info_span, warn, Span};

use crate::config::BotConfig;
use crate::error::SdkResult;
use crate::retry::{with_retry, RetryPolicy};

/// The service as deployed: a logged file store.
pub type FileService = ReferralService<TracedStore<JsonFileStore>>;

/// Result of the start command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StartOutcome {
    /// The user was already known; nothing changed.
    AlreadyRegistered,
    /// A new record was written.
    Registered {
        referral_link: String,
        referred_by: Option<String>,
    },
}

impl fmt::Display for StartOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRegistered => f.write_str("You are already registered."),
            Self::Registered { referral_link, .. } => write!(
                f,
                "You are registered.\nYour referral link: {referral_link}\nShare it with friends to earn discounts!"
            ),
        }
    }
}

/// Everything the profile view shows about one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub user_id: String,
    pub telegram_id: u64,
    pub referred_by: Option<String>,
    pub referral_link: String,
    pub referral_count: usize,
    pub discounts: Discounts,
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Your profile:")?;
        writeln!(f, "ID: {}", self.user_id)?;
        writeln!(f, "Referral link: {}", self.referral_link)?;
        writeln!(
            f,
            "Referred by: {}",
            self.referred_by.as_deref().unwrap_or("not specified")
        )?;
        writeln!(f, "Invited friends: {}", self.referral_count)?;
        writeln!(f, "Discounts:")?;
        write!(f, "{}", self.discounts)
    }
}

/// The referral flows a message handler calls into.
///
/// Every registry call runs under the configured [`RetryPolicy`]. The
/// service logs inside its own span, which callers can replace with
/// [`ReferralService::with_span`] to tie events to their own context.
#[derive(Debug)]
pub struct ReferralService<S> {
    registry: UserRegistry<S>,
    links: ReferralLinkGenerator,
    schedule: DiscountSchedule,
    retry: RetryPolicy,
    span: Span,
}

impl FileService {
    /// Validate `config` and open the file-backed service it describes.
    pub fn from_config(config: &BotConfig) -> SdkResult<Self> {
        config.validate()?;
        let links = ReferralLinkGenerator::from_config(config.bot_link.as_deref())?;
        let store = JsonFileStore::with_lock_timeout(&config.data_path, config.lock_timeout())?;
        let store = TracedStore::new(store, config.data_path.display().to_string());
        Ok(Self::new(store, links, config.retry))
    }
}

impl<S: RecordStore> ReferralService<S> {
    pub fn new(store: S, links: ReferralLinkGenerator, retry: RetryPolicy) -> Self {
        Self {
            registry: UserRegistry::new(store),
            links,
            schedule: DiscountSchedule::STANDARD,
            retry,
            span: info_span!("referral_service"),
        }
    }

    /// Log under `span` instead of the default one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn registry(&self) -> &UserRegistry<S> {
        &self.registry
    }

    pub fn links(&self) -> &ReferralLinkGenerator {
        &self.links
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Handle the start command for user `user_id`.
    ///
    /// `start_arg` is the raw argument the platform delivered with the
    /// command, i.e. the referrer id from a referral link. Blank arguments
    /// and the user's own id are ignored rather than rejected, since both
    /// come from a link the user merely clicked.
    pub fn start(&self, user_id: &str, platform_id: i64, start_arg: Option<&str>) -> SdkResult<StartOutcome> {
        let _entered = self.span.enter();
        validate_user_id(user_id)?;
        let telegram_id = validate_platform_id(platform_id)?;
        let referrer = start_arg
            .map(str::trim)
            .filter(|r| !r.is_empty() && *r != user_id);

        if let Some(referrer) = referrer {
            let known = with_retry(&self.retry, "exists", || self.registry.exists(referrer))?;
            if !known {
                warn!(user = user_id, referrer, "referrer is not registered");
            }
        }

        let inserted = with_retry(&self.retry, "register", || {
            self.registry.register(user_id, platform_id, referrer)
        })?;
        if !inserted {
            return Ok(StartOutcome::AlreadyRegistered);
        }

        info!(user = user_id, referrer, "start: new user");
        Ok(StartOutcome::Registered {
            referral_link: self.links.generate(telegram_id),
            referred_by: referrer.map(str::to_owned),
        })
    }

    /// Build the profile of `user_id`, or `None` if they are not registered.
    pub fn profile(&self, user_id: &str) -> SdkResult<Option<Profile>> {
        let _entered = self.span.enter();
        let summary = with_retry(&self.retry, "summary", || self.registry.summary(user_id))?;
        Ok(summary.map(|s| Profile {
            referral_link: self.links.generate(s.record.telegram_id),
            discounts: self.schedule.compute(s.referral_count),
            user_id: s.id,
            telegram_id: s.record.telegram_id,
            referred_by: s.record.referred_by,
            referral_count: s.referral_count,
        }))
    }

    /// Number of users `user_id` has referred.
    pub fn count_referrals(&self, user_id: &str) -> SdkResult<usize> {
        let _entered = self.span.enter();
        Ok(with_retry(&self.retry, "count_referrals", || {
            self.registry.count_referrals(user_id)
        })?)
    }

    /// Remove `user_id`. Returns `true` if they were registered.
    pub fn remove(&self, user_id: &str) -> SdkResult<bool> {
        let _entered = self.span.enter();
        Ok(with_retry(&self.retry, "remove", || self.registry.remove(user_id))?)
    }

    /// All registered users.
    pub fn users(&self) -> SdkResult<UserMap> {
        let _entered = self.span.enter();
        Ok(with_retry(&self.retry, "users", || self.registry.users())?)
    }

    /// Discounts for a referral count under this service's schedule.
    pub fn discounts(&self, referral_count: usize) -> Discounts {
        self.schedule.compute(referral_count)
    }

    /// Referral link for a platform id.
    pub fn referral_link(&self, platform_id: u64) -> String {
        self.links.generate(platform_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SdkError;
    use refbot_discount::OrderLabel;
    use refbot_store::{FileLock, InMemoryRecordStore, UserRecord};
    use std::time::Duration;

    const LINK: &str = "https://t.me/refbot";

    fn service() -> ReferralService<InMemoryRecordStore> {
        ReferralService::new(
            InMemoryRecordStore::new(),
            ReferralLinkGenerator::new(LINK).unwrap(),
            RetryPolicy::none(),
        )
    }

    fn config_in(dir: &tempfile::TempDir) -> BotConfig {
        BotConfig {
            data_path: dir.path().join("data").join("data.json"),
            bot_link: Some(LINK.into()),
            lock_timeout_ms: 100,
            retry: RetryPolicy::new(2, Duration::from_millis(10)),
        }
    }

    #[test]
    fn start_registers_once() {
        let svc = service();
        let outcome = svc.start("100", 100, None).unwrap();
        assert_eq!(
            outcome,
            StartOutcome::Registered {
                referral_link: format!("{LINK}?start=100"),
                referred_by: None,
            }
        );
        assert_eq!(svc.start("100", 100, None).unwrap(), StartOutcome::AlreadyRegistered);
    }

    #[test]
    fn start_attributes_referrer() {
        let svc = service();
        svc.start("100", 100, None).unwrap();
        svc.start("200", 200, Some("100")).unwrap();
        assert_eq!(
            svc.registry().get("200").unwrap(),
            Some(UserRecord::referred(200, "100"))
        );
        assert_eq!(svc.count_referrals("100").unwrap(), 1);
    }

    #[test]
    fn start_ignores_blank_and_self_referral() {
        let svc = service();
        svc.start("100", 100, Some("   ")).unwrap();
        svc.start("200", 200, Some("200")).unwrap();
        assert!(svc.registry().get("100").unwrap().unwrap().referred_by.is_none());
        assert!(svc.registry().get("200").unwrap().unwrap().referred_by.is_none());
    }

    #[test]
    fn start_rejects_bad_platform_id_as_correctable() {
        let svc = service();
        let err = svc.start("100", 0, None).unwrap_err();
        assert!(err.is_correctable());
        assert!(!err.is_transient());
    }

    #[test]
    fn profile_combines_count_discounts_and_link() {
        let svc = service();
        svc.start("1", 11, None).unwrap();
        for i in 2..=6 {
            svc.start(&i.to_string(), i, Some("1")).unwrap();
        }

        let profile = svc.profile("1").unwrap().unwrap();
        assert_eq!(profile.telegram_id, 11);
        assert_eq!(profile.referral_link, format!("{LINK}?start=11"));
        assert_eq!(profile.referral_count, 5);
        let labels: Vec<_> = profile.discounts.entries().iter().map(|e| (e.label, e.percent)).collect();
        assert_eq!(labels, vec![(OrderLabel::Next, 70), (OrderLabel::Order(2), 10)]);
        assert!(svc.profile("404").unwrap().is_none());
    }

    #[test]
    fn profile_renders_for_display() {
        let svc = service();
        svc.start("1", 1, None).unwrap();
        let text = svc.profile("1").unwrap().unwrap().to_string();
        assert_eq!(
            text,
            format!(
                "Your profile:\nID: 1\nReferral link: {LINK}?start=1\nReferred by: not specified\nInvited friends: 0\nDiscounts:\nDiscount on next order: 0%"
            )
        );
    }

    #[test]
    fn profile_serializes_for_json_output() {
        let svc = service();
        svc.start("1", 1, None).unwrap();
        let json = serde_json::to_value(svc.profile("1").unwrap().unwrap()).unwrap();
        assert_eq!(json["referral_count"], 0);
        assert_eq!(json["discounts"][0]["percent"], 0);
    }

    #[test]
    fn remove_then_profile_is_absent() {
        let svc = service();
        svc.start("1", 1, None).unwrap();
        svc.start("2", 2, Some("1")).unwrap();
        assert!(svc.remove("1").unwrap());
        assert!(!svc.remove("1").unwrap());
        assert!(svc.profile("1").unwrap().is_none());
        assert_eq!(svc.users().unwrap().len(), 1);
    }

    #[test]
    fn from_config_requires_link() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir);
        config.bot_link = None;
        let err = FileService::from_config(&config).unwrap_err();
        assert!(matches!(err, SdkError::ConfigMissing("bot_link")));
        assert!(!err.is_correctable());
    }

    #[test]
    fn file_service_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let svc = FileService::from_config(&config).unwrap();
        svc.start("10", 10, None).unwrap();
        svc.start("20", 20, Some("10")).unwrap();

        // A second handle on the same file sees the first one's writes.
        let other = FileService::from_config(&config).unwrap();
        assert_eq!(other.profile("10").unwrap().unwrap().referral_count, 1);
        assert_eq!(other.retry_policy().attempts, 2);
        assert_eq!(other.links().base_link(), LINK);
    }

    #[test]
    fn held_lock_exhausts_retries() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let svc = FileService::from_config(&config).unwrap();
        let _held = FileLock::acquire(svc.registry().store().inner().lock_path(), Duration::from_secs(1)).unwrap();

        let err = svc.start("1", 1, None).unwrap_err();
        assert!(err.is_transient());
        assert!(!err.is_correctable());
    }

    #[test]
    fn discounts_and_links_need_no_store() {
        let svc = service().with_span(tracing::Span::none());
        assert_eq!(svc.discounts(4).next_order_percent(), 70);
        assert_eq!(svc.referral_link(5), format!("{LINK}?start=5"));
    }
}
