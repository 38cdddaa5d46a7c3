//! Scrape orchestration: company search, per-identity enrichment and the
//! optional block / connect side effects.
//!
//! Identities and search pages are processed strictly one after another.
//! Only the sub-resource fetches of a single identity run concurrently.
//! The first 429 seen anywhere flips a persistent `on_block` flag and
//! every later scrape on the same [`StaffScraper`] is refused.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::client::{Body, Transport};
use crate::error::{FetchError, Result, ScrapeError};
use crate::facets::provenance;
use crate::fetchers::{
    standard_fetchers, CommentsFetcher, ContactInfoFetcher, ResourceFetcher, COMMENTS_PAGE_SIZE,
    VOYAGER_API,
};
use crate::models::{Comment, Company, ConnectionState, Staff};
use crate::search::{
    lookup_public_id, page_connections, page_people, resolve_company, resolve_geo,
    result_ceiling, PeopleQuery, RESULT_CEILING,
};

/// Search term recorded for identities requested by public handle.
pub const MANUAL_TERM: &str = "manual";

pub const DEFAULT_IDENTITY_TIMEOUT: Duration = Duration::from_secs(60);

const JSON_CONTENT_TYPE: (&str, &str) = ("content-type", "application/json");

/// Side effect applied to each enriched identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffAction {
    /// Block the identity so it stops showing up in later searches.
    Block,
    /// Send a connection request unless already connected or pending.
    Connect,
}

#[derive(Debug, Clone)]
pub struct ScraperOptions {
    /// Concurrent sub-resource fetches per identity.
    pub workers: usize,
    /// Upper bound on one identity's enrichment.
    pub identity_timeout: Duration,
}

impl Default for ScraperOptions {
    fn default() -> Self {
        Self {
            workers: standard_fetchers().len(),
            identity_timeout: DEFAULT_IDENTITY_TIMEOUT,
        }
    }
}

/// Progress notifications for front ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeEvent {
    SearchStarted { label: String, ceiling: usize },
    SearchFinished { label: String, found: usize },
    EnrichStarted { total: usize },
    Enriched { index: usize, total: usize, name: String },
    Halted { reason: String },
}

/// One single-facet staff search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffQuery {
    pub company: String,
    pub term: Option<String>,
    pub location: Option<String>,
    pub max_results: usize,
    /// Run every sub-resource fetcher for each visible identity.
    pub enrich: bool,
    /// Applied after enrichment; ignored unless `enrich` is set.
    pub action: Option<StaffAction>,
}

impl StaffQuery {
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            term: None,
            location: None,
            max_results: RESULT_CEILING,
            enrich: false,
            action: None,
        }
    }

    pub fn provenance(&self) -> String {
        provenance(&self.company, self.term.as_deref(), self.location.as_deref())
    }
}

/// Everything collected by one scrape call, plus the signal that ended it
/// early. Partial results are never discarded.
#[derive(Debug)]
pub struct ScrapeOutcome<T> {
    pub items: Vec<T>,
    pub halted: Option<ScrapeError>,
}

impl<T> ScrapeOutcome<T> {
    fn new(items: Vec<T>, halted: Option<ScrapeError>) -> Self {
        Self { items, halted }
    }
}

pub struct StaffScraper {
    transport: Arc<dyn Transport>,
    fetchers: Vec<Arc<dyn ResourceFetcher>>,
    contact_info: Arc<dyn ResourceFetcher>,
    options: ScraperOptions,
    on_block: AtomicBool,
    connect_disabled: AtomicBool,
    events: Option<mpsc::Sender<ScrapeEvent>>,
}

impl StaffScraper {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            fetchers: standard_fetchers(),
            contact_info: Arc::new(ContactInfoFetcher),
            options: ScraperOptions::default(),
            on_block: AtomicBool::new(false),
            connect_disabled: AtomicBool::new(false),
            events: None,
        }
    }

    pub fn with_options(mut self, options: ScraperOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_fetchers(mut self, fetchers: Vec<Arc<dyn ResourceFetcher>>) -> Self {
        self.fetchers = fetchers;
        self
    }

    pub fn with_events(mut self, events: mpsc::Sender<ScrapeEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Whether a 429 has put this scraper on cooldown.
    pub fn is_on_block(&self) -> bool {
        self.on_block.load(Ordering::SeqCst)
    }

    /// Whether connection requests were turned off for this run.
    pub fn is_connect_disabled(&self) -> bool {
        self.connect_disabled.load(Ordering::SeqCst)
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_on_block() {
            error!("{}", ScrapeError::Halted);
            return Err(ScrapeError::Halted);
        }
        Ok(())
    }

    /// Record an account-level signal. Rate limits put the scraper on cooldown.
    async fn note(&self, err: &ScrapeError) {
        if matches!(err, ScrapeError::RateLimited) {
            self.on_block.store(true, Ordering::SeqCst);
        }
        error!("{}", err);
        self.emit(ScrapeEvent::Halted {
            reason: err.to_string(),
        })
        .await;
    }

    async fn emit(&self, event: ScrapeEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }

    /// Search one facet of a company and optionally enrich what it finds.
    ///
    /// Errors before any identity is found (company lookup, cooldown) are
    /// returned as `Err`. Signals after that point end the run and are
    /// reported in [`ScrapeOutcome::halted`] alongside what was collected.
    pub async fn scrape_staff(&self, query: &StaffQuery) -> Result<ScrapeOutcome<Staff>> {
        self.ensure_active()?;
        let transport = self.transport.as_ref();
        let label = query.provenance();

        let company = match resolve_company(transport, &query.company).await {
            Ok(company) => company,
            Err(e) => {
                if e.is_account_level() {
                    self.note(&e).await;
                }
                return Err(e);
            }
        };
        let Some(company_id) = company.id.clone() else {
            return Err(ScrapeError::CompanyNotFound(query.company.clone()));
        };

        let geo_id = match &query.location {
            Some(location) => match resolve_geo(transport, location).await {
                Ok(geo_id) => Some(geo_id),
                Err(e) if e.is_account_level() => {
                    self.note(&e).await;
                    return Ok(ScrapeOutcome::new(Vec::new(), Some(e)));
                }
                Err(e) => {
                    error!("{}", e);
                    return Ok(ScrapeOutcome::new(Vec::new(), None));
                }
            },
            None => None,
        };

        let ceiling = result_ceiling(company.staff_count, query.max_results);
        self.emit(ScrapeEvent::SearchStarted {
            label: label.clone(),
            ceiling,
        })
        .await;

        let people = PeopleQuery {
            company_id,
            keywords: query.term.clone(),
            geo_id,
            search_term: label.clone(),
        };
        let paged = page_people(transport, &people, ceiling).await;
        let mut staff = paged.items;
        let mut halted = paged.error;
        if let Some(e) = &halted {
            self.note(e).await;
        }

        info!(
            "Found {} staff at {}{}",
            staff.len(),
            query.company,
            query
                .location
                .as_deref()
                .map(|l| format!(" in {}", l))
                .unwrap_or_default()
        );
        self.emit(ScrapeEvent::SearchFinished {
            label: label.clone(),
            found: staff.len(),
        })
        .await;

        if query.enrich && halted.is_none() {
            halted = self.enrich_all(&mut staff, query.action).await;
        }

        Ok(ScrapeOutcome::new(hidden_last(staff, &label), halted))
    }

    /// Resolve public handles to identities, enrich each, then apply the
    /// optional action. Handles that do not resolve are dropped.
    pub async fn scrape_users(
        &self,
        public_ids: &[String],
        action: Option<StaffAction>,
    ) -> Result<ScrapeOutcome<Staff>> {
        self.ensure_active()?;
        let transport = self.transport.as_ref();
        let total = public_ids.len();
        let mut users = Vec::with_capacity(total);
        let mut halted = None;

        for (index, public_id) in public_ids.iter().enumerate() {
            let mut user = Staff::from_public_id(public_id, MANUAL_TERM);
            match lookup_public_id(transport, public_id).await {
                Ok(Some(patch)) => patch.apply(&mut user),
                Ok(None) => {
                    warn!("Failed to find user {}", public_id);
                    continue;
                }
                Err(e) if e.is_account_level() => {
                    self.note(&e).await;
                    halted = Some(e);
                    break;
                }
                Err(e) => {
                    warn!("Failed to look up user {}: {}", public_id, e);
                    continue;
                }
            }

            info!("Fetching employee data for {} {} / {}", user.id, index + 1, total);
            let result = match self.enrich(&mut user).await {
                Ok(()) => match action {
                    Some(action) => self.apply_action(&mut user, action).await,
                    None => Ok(()),
                },
                Err(e) => Err(e),
            };
            users.push(user);
            if let Err(e) = result {
                self.note(&e).await;
                halted = Some(e);
                break;
            }
        }

        info!("Scraped {} users", users.len());
        Ok(ScrapeOutcome::new(hidden_last(users, MANUAL_TERM), halted))
    }

    /// Look up each company. Failures are logged and skipped; a rate limit
    /// ends the run.
    pub async fn scrape_companies(&self, names: &[String]) -> Result<ScrapeOutcome<Company>> {
        self.ensure_active()?;
        if names.is_empty() {
            return Err(ScrapeError::InvalidInput(
                "company names list cannot be empty".to_string(),
            ));
        }

        let mut companies = Vec::with_capacity(names.len());
        for name in names {
            match resolve_company(self.transport.as_ref(), name).await {
                Ok(company) => companies.push(company),
                Err(e) if e.is_account_level() => {
                    self.note(&e).await;
                    return Ok(ScrapeOutcome::new(companies, Some(e)));
                }
                Err(e) => error!("Failed to process company {}: {}", name, e),
            }
        }
        Ok(ScrapeOutcome::new(companies, None))
    }

    /// Page through each post's comments. Results are newest first.
    pub async fn scrape_comments(&self, post_ids: &[String]) -> Result<ScrapeOutcome<Comment>> {
        self.ensure_active()?;
        let transport = self.transport.as_ref();
        let fetcher = CommentsFetcher;
        let mut comments = Vec::new();
        let mut halted = None;

        'posts: for post_id in post_ids {
            let mut start = 0;
            loop {
                match fetcher.fetch_page(transport, post_id, start).await {
                    Ok(page) if page.raw_count == 0 => break,
                    Ok(page) => {
                        debug!("Post {}: {} comments at {}", post_id, page.raw_count, start);
                        comments.extend(page.comments);
                        start += COMMENTS_PAGE_SIZE;
                    }
                    Err(FetchError::RateLimited) => {
                        let e = ScrapeError::RateLimited;
                        self.note(&e).await;
                        halted = Some(e);
                        break 'posts;
                    }
                    Err(FetchError::Unavailable(reason)) => {
                        warn!("Failed to fetch comments for post {}: {}", post_id, reason);
                        break;
                    }
                }
            }
        }

        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        info!("Scraped {} comments from {} posts", comments.len(), post_ids.len());
        Ok(ScrapeOutcome::new(comments, halted))
    }

    /// The logged-in account's connections, optionally enriched.
    pub async fn scrape_connections(&self, max_results: usize, enrich: bool) -> Result<ScrapeOutcome<Staff>> {
        self.ensure_active()?;
        let paged = page_connections(self.transport.as_ref(), max_results).await;
        let mut staff = paged.items;
        let mut halted = paged.error;
        if let Some(e) = &halted {
            self.note(e).await;
        }
        info!("Found {} connections", staff.len());

        if enrich && halted.is_none() {
            halted = self.enrich_all(&mut staff, None).await;
        }
        Ok(ScrapeOutcome::new(staff, halted))
    }

    /// Enrich every visible identity in order. Returns the signal that
    /// stopped the loop, if any.
    async fn enrich_all(&self, staff: &mut [Staff], action: Option<StaffAction>) -> Option<ScrapeError> {
        let total = staff.iter().filter(|s| is_enrichable(s)).count();
        self.emit(ScrapeEvent::EnrichStarted { total }).await;

        for (index, member) in staff.iter_mut().filter(|s| is_enrichable(s)).enumerate() {
            info!("Fetching employee data for {} {} / {}", member.id, index + 1, total);

            let result = match (self.enrich(member).await, action) {
                (Ok(()), Some(action)) => self.apply_action(member, action).await,
                (result, _) => result,
            };
            if let Err(e) = result {
                self.note(&e).await;
                return Some(e);
            }

            self.emit(ScrapeEvent::Enriched {
                index: index + 1,
                total,
                name: member.name.clone().unwrap_or_default(),
            })
            .await;
        }
        None
    }

    /// Run every fetcher for one identity, then contact info for
    /// 1st-degree connections. A 429 from any fetcher is returned as
    /// [`ScrapeError::RateLimited`]; other failures leave fields unset.
    pub async fn enrich(&self, staff: &mut Staff) -> Result<()> {
        let transport = self.transport.as_ref();
        let snapshot = staff.clone();
        let snapshot = &snapshot;

        // Fragments live outside the timed future so finished fetches
        // survive a timeout.
        let mut fragments = Vec::with_capacity(self.fetchers.len());
        let pool = async {
            let mut results = stream::iter(self.fetchers.iter())
                .map(|fetcher| async move { (fetcher.name(), fetcher.fetch(transport, snapshot).await) })
                .buffer_unordered(self.options.workers.max(1));

            while let Some((name, result)) = results.next().await {
                match result {
                    Ok(fragment) => fragments.push(fragment),
                    Err(FetchError::RateLimited) => {
                        warn!("API rate limit exceeded for {}", name);
                        return Err(ScrapeError::RateLimited);
                    }
                    Err(FetchError::Unavailable(reason)) => {
                        debug!("{} unavailable for {}: {}", name, snapshot.id, reason);
                    }
                }
            }
            Ok(())
        };

        let finished = tokio::time::timeout(self.options.identity_timeout, pool).await;
        let timed_out = match finished {
            Ok(Ok(())) => false,
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                warn!(
                    "Timed out after {:?} enriching {}; keeping {} finished fetches",
                    self.options.identity_timeout,
                    staff.id,
                    fragments.len()
                );
                true
            }
        };
        fragments.into_iter().for_each(|f| f.apply(staff));
        if timed_out {
            return Ok(());
        }

        if staff.connection_state == ConnectionState::Connected {
            match self.contact_info.fetch(transport, staff).await {
                Ok(fragment) => fragment.apply(staff),
                Err(FetchError::RateLimited) => return Err(ScrapeError::RateLimited),
                Err(FetchError::Unavailable(reason)) => {
                    debug!("contact info unavailable for {}: {}", staff.id, reason);
                }
            }
        }
        Ok(())
    }

    async fn apply_action(&self, staff: &mut Staff, action: StaffAction) -> Result<()> {
        match action {
            StaffAction::Block => self.block(staff).await.map(|_| ()),
            StaffAction::Connect => self.connect(staff).await.map(|_| ()),
        }
    }

    /// Block an identity. Returns whether the platform accepted it; a 429
    /// is returned as [`ScrapeError::RateLimited`] and halts the run.
    pub async fn block(&self, staff: &Staff) -> Result<bool> {
        let url = format!("{}/voyagerTrustDashContentReportingForm?action=entityBlock", VOYAGER_API);
        let body = Body::Json(json!({ "contentUrn": staff.profile_urn() }));
        let response = self.transport.post(&url, body, &[JSON_CONTENT_TYPE]).await?;

        if response.is_rate_limited() {
            warn!("Block request for {} rate limited", staff.id);
            return Err(ScrapeError::RateLimited);
        }
        if response.is_success() {
            info!("Blocked {} ({})", staff.name.as_deref().unwrap_or_default(), staff.id);
            Ok(true)
        } else {
            warn!(
                "Failed to block {}: HTTP {} {}",
                staff.id,
                response.status,
                response.snippet()
            );
            Ok(false)
        }
    }

    /// Send a connection request. Skipped when already connected or
    /// pending, and for the rest of the run after the first 429.
    pub async fn connect(&self, staff: &mut Staff) -> Result<bool> {
        if self.is_connect_disabled() {
            debug!("Connect disabled; skipping {}", staff.id);
            return Ok(false);
        }
        if staff.connection_state.is_connected_or_pending() {
            info!("Already connected or pending with {}", staff.id);
            return Ok(false);
        }

        let url = format!(
            "{}/voyagerRelationshipsDashMemberRelationships?action=verifyQuotaAndCreateV2&decorationId=com.linkedin.voyager.dash.deco.relationships.InvitationCreationResultWithInvitee-2",
            VOYAGER_API
        );
        let body = Body::Json(json!({
            "invitee": {"inviteeUnion": {"memberProfile": staff.profile_urn()}}
        }));
        let response = self.transport.post(&url, body, &[JSON_CONTENT_TYPE]).await?;

        if response.is_rate_limited() {
            warn!("Connection requests rate limited; no more will be sent this run");
            self.connect_disabled.store(true, Ordering::SeqCst);
            return Ok(false);
        }
        if !response.is_success() {
            warn!(
                "Failed to connect with {}: HTTP {} {}",
                staff.id,
                response.status,
                response.snippet()
            );
            return Ok(false);
        }

        info!("Sent connection request to {}", staff.id);
        staff.connection_state = ConnectionState::Pending;
        Ok(true)
    }
}

fn is_enrichable(staff: &Staff) -> bool {
    !staff.is_hidden() && !staff.id.is_empty()
}

/// Visible identities first, hidden ones last.
fn hidden_last(staff: Vec<Staff>, label: &str) -> Vec<Staff> {
    let (visible, hidden): (Vec<_>, Vec<_>) = staff.into_iter().partition(|s| !s.is_hidden());
    info!(
        "Staff from {}: {} total, {} hidden, {} visible",
        label,
        visible.len() + hidden.len(),
        hidden.len(),
        visible.len()
    );
    visible.into_iter().chain(hidden).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::FakeTransport;
    use crate::client::ApiResponse;
    use crate::fetchers::Fragment;
    use async_trait::async_trait;
    use serde_json::Value;

    fn company() -> Value {
        json!({"elements": [{
            "universalName": "acme",
            "staffCount": 3,
            "trackingInfo": {"objectUrn": "urn:li:company:99"}
        }]})
    }

    fn hit(id: &str, name: &str) -> Value {
        json!({"item": {"entityResult": {
            "entityUrn": format!("urn:li:fsd_entityResultViewModel:(urn:li:fsd_profile:{},SEARCH_SRP,DEFAULT)", id),
            "title": {"text": name}
        }}})
    }

    fn page(hits: Vec<Value>) -> Value {
        json!({"data": {"searchDashClustersByAll": {"elements": [{"items": hits}]}}})
    }

    fn scraper(fake: FakeTransport) -> (Arc<FakeTransport>, StaffScraper) {
        let fake = Arc::new(fake);
        let scraper = StaffScraper::new(fake.clone());
        (fake, scraper)
    }

    fn enriching(company: &str) -> StaffQuery {
        StaffQuery {
            enrich: true,
            ..StaffQuery::new(company)
        }
    }

    /// Records the identities it was asked about.
    struct NameFetcher;

    #[async_trait]
    impl ResourceFetcher for NameFetcher {
        fn name(&self) -> &'static str {
            "name"
        }

        async fn fetch(&self, _: &dyn Transport, staff: &Staff) -> std::result::Result<Fragment, FetchError> {
            Ok(Fragment::Languages(vec![staff.id.clone()]))
        }
    }

    #[tokio::test]
    async fn test_rate_limit_halts_before_next_identity() {
        let (fake, scraper) = scraper(
            FakeTransport::new()
                .respond("universalName=acme", 200, company())
                .respond(
                    "voyagerSearchDashClusters.66adc",
                    200,
                    page(vec![hit("ALPHA", "Ada"), hit("BRAVO", "Bob"), hit("CHARLIE", "Cy")]),
                )
                .respond("memberIdentity=ALPHA", 429, json!({})),
        );

        let outcome = scraper.scrape_staff(&enriching("acme")).await.unwrap();
        assert!(matches!(outcome.halted, Some(ScrapeError::RateLimited)));
        assert_eq!(outcome.items.len(), 3);
        assert!(scraper.is_on_block());
        assert_eq!(fake.count("BRAVO"), 0);
        assert_eq!(fake.count("CHARLIE"), 0);

        assert!(matches!(
            scraper.scrape_staff(&StaffQuery::new("acme")).await,
            Err(ScrapeError::Halted)
        ));
    }

    #[tokio::test]
    async fn test_hidden_profiles_are_counted_but_not_enriched() {
        let (fake, scraper) = scraper(
            FakeTransport::new()
                .respond("universalName=acme", 200, company())
                .respond(
                    "voyagerSearchDashClusters.66adc",
                    200,
                    page(vec![hit("HIDDEN1", "LinkedIn Member"), hit("ALPHA", "Ada")]),
                ),
        );

        let outcome = scraper.scrape_staff(&enriching("acme")).await.unwrap();
        assert!(outcome.halted.is_none());
        assert_eq!(outcome.items.len(), 2);
        assert_eq!(outcome.items[0].id, "ALPHA");
        assert!(outcome.items[1].is_hidden());
        assert_eq!(fake.count("HIDDEN1"), 0);
        assert!(fake.count("ALPHA") >= 7);
    }

    #[tokio::test]
    async fn test_provenance_and_geo_filter() {
        let (fake, scraper) = scraper(
            FakeTransport::new()
                .respond("universalName=acme", 200, company())
                .respond(
                    "SearchReusableTypeaheadByType",
                    200,
                    json!({"data": {"searchDashReusableTypeaheadByType": {"elements": [
                        {"trackingUrn": "urn:li:geo:101"}
                    ]}}}),
                )
                .respond("voyagerSearchDashClusters.66adc", 200, page(vec![hit("ALPHA", "Ada")])),
        );

        let query = StaffQuery {
            term: Some("engineer".into()),
            location: Some("Berlin".into()),
            ..StaffQuery::new("acme")
        };
        let outcome = scraper.scrape_staff(&query).await.unwrap();
        assert_eq!(outcome.items[0].search_term, "acme - engineer - Berlin");

        let search = &fake.requests_to("voyagerSearchDashClusters.66adc")[0];
        assert!(search.url.contains("(key:geoUrn,value:List(101))"));
        assert!(search.url.contains("keywords:engineer,"));
    }

    #[tokio::test]
    async fn test_unknown_location_curtails_facet() {
        let (fake, scraper) = scraper(
            FakeTransport::new()
                .respond("universalName=acme", 200, company())
                .respond("SearchReusableTypeaheadByType", 200, json!({"data": {}})),
        );

        let query = StaffQuery {
            location: Some("Atlantis".into()),
            ..StaffQuery::new("acme")
        };
        let outcome = scraper.scrape_staff(&query).await.unwrap();
        assert!(outcome.items.is_empty());
        assert!(outcome.halted.is_none());
        assert!(!scraper.is_on_block());
        assert_eq!(fake.count("voyagerSearchDashClusters.66adc"), 0);
    }

    #[tokio::test]
    async fn test_contact_info_only_for_connections() {
        let profile = |connected: bool| {
            let union = if connected {
                json!({"connection": {}})
            } else {
                json!({"noConnection": {}})
            };
            json!({"elements": [{"memberRelationship": {"memberRelationshipUnion": union}}]})
        };
        let (fake, scraper) = scraper(
            FakeTransport::new()
                .respond("memberIdentity=ALPHA", 200, profile(true))
                .respond("memberIdentity=BRAVO", 200, profile(false)),
        );

        let mut alpha = Staff::new("ALPHA", "Ada", "acme");
        let mut bravo = Staff::new("BRAVO", "Bob", "acme");
        scraper.enrich(&mut alpha).await.unwrap();
        scraper.enrich(&mut bravo).await.unwrap();

        assert_eq!(alpha.connection_state, ConnectionState::Connected);
        assert_eq!(bravo.connection_state, ConnectionState::NotConnected);
        assert_eq!(fake.count("ProfilesByMemberIdentity"), 1);
        assert_eq!(fake.count("memberIdentity:ALPHA"), 1);
    }

    #[tokio::test]
    async fn test_identity_timeout_keeps_finished_fetches() {
        let (_, scraper) = scraper(
            FakeTransport::new()
                .respond("memberIdentity=ALPHA", 200, json!({"elements": [{"headline": "Engineer"}]}))
                .respond_after(
                    "sectionType:skills",
                    Duration::from_millis(500),
                    200,
                    json!({}),
                ),
        );
        let scraper = scraper.with_options(ScraperOptions {
            workers: 7,
            identity_timeout: Duration::from_millis(100),
        });

        let mut alpha = Staff::new("ALPHA", "Ada", "acme");
        scraper.enrich(&mut alpha).await.unwrap();
        assert_eq!(alpha.headline.as_deref(), Some("Engineer"));
        assert!(alpha.skills.is_none());
    }

    #[tokio::test]
    async fn test_identity_timeout_leaves_slow_fields_unset() {
        let (_, scraper) = scraper(FakeTransport::new().respond_after(
            "memberIdentity=ALPHA",
            Duration::from_millis(500),
            200,
            json!({"elements": [{"headline": "late"}]}),
        ));
        let scraper = scraper.with_options(ScraperOptions {
            workers: 7,
            identity_timeout: Duration::from_millis(50),
        });

        let mut alpha = Staff::new("ALPHA", "Ada", "acme");
        scraper.enrich(&mut alpha).await.unwrap();
        assert!(alpha.headline.is_none());
        assert!(alpha.skills.is_none());
    }

    #[tokio::test]
    async fn test_custom_fetchers() {
        let (_, scraper) = scraper(FakeTransport::new());
        let scraper = scraper.with_fetchers(vec![Arc::new(NameFetcher)]);

        let mut alpha = Staff::new("ALPHA", "Ada", "acme");
        scraper.enrich(&mut alpha).await.unwrap();
        assert_eq!(alpha.languages, Some(vec!["ALPHA".to_string()]));
    }

    #[tokio::test]
    async fn test_connect_disabled_after_rate_limit() {
        let (fake, scraper) = scraper(FakeTransport::new().respond("verifyQuotaAndCreateV2", 429, json!({})));

        let mut ada = Staff::new("ALPHA", "Ada", "acme");
        let mut bob = Staff::new("BRAVO", "Bob", "acme");
        assert!(!scraper.connect(&mut ada).await.unwrap());
        assert!(scraper.is_connect_disabled());
        assert!(!scraper.connect(&mut bob).await.unwrap());

        assert_eq!(fake.count("verifyQuotaAndCreateV2"), 1);
        assert!(!scraper.is_on_block());
    }

    #[tokio::test]
    async fn test_connect_skips_existing_relationships() {
        let (fake, scraper) = scraper(FakeTransport::new().respond("verifyQuotaAndCreateV2", 201, json!({})));

        let mut pending = Staff::new("ALPHA", "Ada", "acme");
        pending.connection_state = ConnectionState::Pending;
        assert!(!scraper.connect(&mut pending).await.unwrap());

        let mut stranger = Staff::new("BRAVO", "Bob", "acme");
        stranger.connection_state = ConnectionState::NotConnected;
        assert!(scraper.connect(&mut stranger).await.unwrap());
        assert_eq!(stranger.connection_state, ConnectionState::Pending);

        let sent = &fake.requests_to("verifyQuotaAndCreateV2")[0];
        assert_eq!(sent.header("content-type"), Some("application/json"));
        assert_eq!(
            sent.body,
            Some(Body::Json(json!({
                "invitee": {"inviteeUnion": {"memberProfile": "urn:li:fsd_profile:BRAVO"}}
            })))
        );
    }

    #[tokio::test]
    async fn test_block_posts_profile_urn() {
        let (fake, scraper) = scraper(FakeTransport::new().respond("entityBlock", 200, json!({})));
        assert!(scraper.block(&Staff::new("ALPHA", "Ada", "acme")).await.unwrap());

        let sent = &fake.requests_to("entityBlock")[0];
        assert_eq!(sent.method, "POST");
        assert_eq!(
            sent.body,
            Some(Body::Json(json!({"contentUrn": "urn:li:fsd_profile:ALPHA"})))
        );
    }

    #[tokio::test]
    async fn test_block_rate_limit_halts_run() {
        let (fake, scraper) = scraper(
            FakeTransport::new()
                .respond("universalName=acme", 200, company())
                .respond(
                    "voyagerSearchDashClusters.66adc",
                    200,
                    page(vec![hit("ALPHA", "Ada"), hit("BRAVO", "Bob"), hit("CHARLIE", "Cy")]),
                )
                .respond("entityBlock", 429, json!({})),
        );
        let scraper = scraper.with_fetchers(vec![Arc::new(NameFetcher)]);
        let query = StaffQuery {
            action: Some(StaffAction::Block),
            ..enriching("acme")
        };

        let outcome = scraper.scrape_staff(&query).await.unwrap();
        assert!(matches!(outcome.halted, Some(ScrapeError::RateLimited)));
        assert_eq!(outcome.items.len(), 3);
        assert_eq!(fake.count("entityBlock"), 1);
        assert!(scraper.is_on_block());
    }

    #[tokio::test]
    async fn test_scrape_users_drops_unknown_handles() {
        let (_, scraper) = scraper(FakeTransport::new().respond(
            "memberIdentity=ada-lovelace",
            200,
            json!({"elements": [{
                "entityUrn": "urn:li:fsd_profile:ALPHA",
                "objectUrn": "urn:li:member:1",
                "firstName": "Ada",
                "lastName": "Lovelace"
            }]}),
        ));
        let scraper = scraper.with_fetchers(vec![Arc::new(NameFetcher)]);

        let ids = vec!["ada-lovelace".to_string(), "ghost".to_string()];
        let outcome = scraper.scrape_users(&ids, None).await.unwrap();

        assert_eq!(outcome.items.len(), 1);
        let ada = &outcome.items[0];
        assert_eq!(ada.id, "ALPHA");
        assert_eq!(ada.urn.as_deref(), Some("urn:li:member:1"));
        assert_eq!(ada.search_term, "manual");
        assert_eq!(ada.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(ada.languages, Some(vec!["ALPHA".to_string()]));
    }

    #[tokio::test]
    async fn test_companies_skip_failures() {
        let (_, scraper) = scraper(
            FakeTransport::new()
                .respond("universalName=acme", 200, company())
                .respond("SearchClusterCollection", 200, json!({})),
        );

        let names = vec!["acme".to_string(), "nope".to_string()];
        let outcome = scraper.scrape_companies(&names).await.unwrap();
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.items[0].id.as_deref(), Some("99"));

        assert!(matches!(
            scraper.scrape_companies(&[]).await,
            Err(ScrapeError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_comments_paged_and_sorted() {
        let comment = |id: &str, at: i64| {
            json!({"urn": format!("urn:li:comment:(activity:1,{})", id), "createdAt": at})
        };
        let pages = vec![
            ApiResponse::new(
                200,
                json!({"data": {"socialDashCommentsBySocialDetail": {"elements": [
                    comment("10", 1_000), comment("11", 3_000)
                ]}}})
                .to_string(),
            ),
            ApiResponse::new(
                200,
                json!({"data": {"socialDashCommentsBySocialDetail": {"elements": [
                    comment("12", 2_000)
                ]}}})
                .to_string(),
            ),
            ApiResponse::new(200, json!({"data": {}}).to_string()),
        ];
        let (fake, scraper) = scraper(FakeTransport::new().respond_seq("SocialDashCommentsBySocialDetail", pages));

        let outcome = scraper.scrape_comments(&["1".to_string()]).await.unwrap();
        let ids: Vec<_> = outcome
            .items
            .iter()
            .map(|c| c.comment_id.clone().unwrap())
            .collect();
        assert_eq!(ids, vec!["11", "12", "10"]);
        assert_eq!(fake.count("start:200)"), 1);
    }

    #[tokio::test]
    async fn test_events_are_reported() {
        let (tx, mut rx) = mpsc::channel(16);
        let (_, scraper) = scraper(
            FakeTransport::new()
                .respond("universalName=acme", 200, company())
                .respond("voyagerSearchDashClusters.66adc", 200, page(vec![hit("ALPHA", "Ada")])),
        );
        let scraper = scraper
            .with_fetchers(vec![Arc::new(NameFetcher)])
            .with_events(tx);

        scraper.scrape_staff(&enriching("acme")).await.unwrap();
        drop(scraper);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events.last(),
            Some(&ScrapeEvent::Enriched {
                index: 1,
                total: 1,
                name: "Ada".into()
            })
        );
    }
}
