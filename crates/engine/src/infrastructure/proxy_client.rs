//! HTTP client for the Innkeeper provider proxy.
//!
//! The proxy holds the provider credentials; this client only needs the
//! proxy URL and a shared `X-Auth-Key`. A 403 right after the proxy starts is
//! common while it refreshes its own token, so each request is retried once
//! after a short pause.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use innkeeper_domain::value_objects::{
    EquippedItem, KeystoneRun, ProfessionSkill, ProfileSnapshot, RaidDifficulty, RaidEncounterKill,
};
use innkeeper_domain::Region;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::infrastructure::config::EngineConfig;
use crate::infrastructure::ports::{
    CharacterDataPort, CharacterLocator, FetchError, RealmInfo, RemoteProfile,
};

/// Header carrying the proxy auth key.
pub const AUTH_HEADER: &str = "X-Auth-Key";

const FORBIDDEN_RETRY_DELAY: Duration = Duration::from_secs(3);
const ERROR_SNIPPET_CHARS: usize = 200;

/// Client for the provider proxy.
#[derive(Clone)]
pub struct ProxyClient {
    client: Client,
    base_url: String,
    auth_key: Option<String>,
    scan_timeout: Duration,
    retry_delay: Duration,
}

impl ProxyClient {
    pub fn new(config: &EngineConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.fetch_timeout).build()?;
        // Validate once so per-request URL building cannot fail on the base.
        Url::parse(&config.server_url)?;

        Ok(Self {
            client,
            base_url: config.server_url.trim_end_matches('/').to_string(),
            auth_key: config.auth_key.clone(),
            scan_timeout: config.scan_timeout,
            retry_delay: FORBIDDEN_RETRY_DELAY,
        })
    }

    #[cfg(test)]
    fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Quick reachability check against `/health`.
    pub async fn health(&self) -> bool {
        match self.url(&["health"]) {
            Ok(url) => self
                .client
                .get(url)
                .send()
                .await
                .map(|r| r.status().is_success())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url).map_err(FetchError::unavailable)?;
        url.path_segments_mut()
            .map_err(|_| FetchError::unavailable("proxy URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn character_url(&self, resource: &[&str], who: &CharacterLocator) -> Result<Url, FetchError> {
        let mut segments: Vec<&str> = resource.to_vec();
        segments.extend([who.region.as_str(), who.realm.as_str(), who.name.as_str()]);
        self.url(&segments)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        self.send_json(&url, || self.client.get(url.clone())).await
    }

    /// Sends the request from `build` with the auth header and one retry on 403.
    ///
    /// A 404 or a JSON `null` body is `NotFound`, a 429 is `Busy`, and any
    /// other non-200 status is `Unavailable`.
    async fn send_json<T, B>(&self, url: &Url, build: B) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
        B: Fn() -> RequestBuilder,
    {
        for attempt in 0..2 {
            let mut request = build();
            if let Some(key) = &self.auth_key {
                request = request.header(AUTH_HEADER, key);
            }

            let response = request.send().await.map_err(|e| {
                tracing::warn!(path = url.path(), error = %e, "Proxy request failed");
                if e.is_timeout() {
                    FetchError::unavailable(format!("request timed out: {}", e))
                } else {
                    FetchError::unavailable(e)
                }
            })?;

            match response.status() {
                StatusCode::OK => {
                    let body: Option<T> = response.json().await.map_err(FetchError::invalid)?;
                    return body.ok_or_else(|| FetchError::NotFound(url.path().to_string()));
                }
                StatusCode::NOT_FOUND => return Err(FetchError::NotFound(url.path().to_string())),
                StatusCode::FORBIDDEN if attempt == 0 => {
                    tracing::info!(
                        path = url.path(),
                        delay_ms = self.retry_delay.as_millis() as u64,
                        "Proxy returned 403, retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    let detail = error_detail(response).await;
                    tracing::info!(path = url.path(), detail = %detail, "Proxy is busy");
                    return Err(FetchError::Busy(detail));
                }
                status => {
                    let detail = error_detail(response).await;
                    tracing::warn!(path = url.path(), %status, body = %detail, "Proxy error");
                    return Err(FetchError::Unavailable(format!("{}: {}", status, detail)));
                }
            }
        }
        Err(FetchError::unavailable("proxy kept returning 403"))
    }
}

/// The proxy's `detail` message when it sent one, else the start of the body.
async fn error_detail(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(ErrorResponse { detail: Some(detail) }) => detail,
        _ => text.chars().take(ERROR_SNIPPET_CHARS).collect(),
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    name: String,
    realm: String,
    #[serde(default)]
    level: Option<u32>,
    #[serde(default)]
    class_id: Option<u32>,
    #[serde(default)]
    class_name: String,
    #[serde(default)]
    spec_name: String,
    #[serde(default)]
    item_level: u32,
    #[serde(default)]
    portrait_url: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
}

impl ProfileResponse {
    fn into_remote(self, region: Region) -> RemoteProfile {
        let profile = ProfileSnapshot::new(
            self.level.unwrap_or_default(),
            self.class_id,
            self.class_name,
            self.spec_name,
            self.item_level,
        )
        .with_media(self.portrait_url, self.avatar_url);
        RemoteProfile {
            name: self.name,
            realm: self.realm,
            region,
            profile,
        }
    }
}

#[derive(Debug, Deserialize)]
struct KeystoneResponse {
    #[serde(default)]
    best_runs: Vec<KeystoneRun>,
}

#[derive(Debug, Deserialize)]
struct ProfessionsResponse {
    #[serde(default)]
    primaries: Vec<ProfessionSkill>,
}

#[derive(Debug, Deserialize)]
struct RealmsResponse {
    #[serde(default)]
    realms: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct EncounterEntry {
    encounter: NamedRef,
    /// Milliseconds since the epoch.
    #[serde(default)]
    last_kill_timestamp: i64,
}

#[derive(Debug, Deserialize)]
struct ModeEntry {
    difficulty: NamedRef,
    #[serde(default)]
    encounters: Vec<EncounterEntry>,
}

#[derive(Debug, Deserialize)]
struct InstanceEntry {
    instance: NamedRef,
    #[serde(default)]
    modes: Vec<ModeEntry>,
}

#[derive(Debug, Deserialize)]
struct ExpansionEntry {
    #[serde(default)]
    instances: Vec<InstanceEntry>,
}

#[derive(Debug, Deserialize)]
struct RaidEncountersResponse {
    #[serde(default)]
    expansions: Vec<ExpansionEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    detail: Option<String>,
}

/// Flattens the latest expansion's encounters into kills.
fn flatten_raid_encounters(response: RaidEncountersResponse) -> Vec<RaidEncounterKill> {
    let Some(latest) = response.expansions.into_iter().last() else {
        return Vec::new();
    };

    let mut kills = Vec::new();
    for instance in latest.instances {
        for mode in instance.modes {
            let difficulty = RaidDifficulty::from_provider_label(&mode.difficulty.name);
            for entry in mode.encounters {
                let Some(last_kill) =
                    DateTime::<Utc>::from_timestamp_millis(entry.last_kill_timestamp)
                else {
                    continue;
                };
                kills.push(RaidEncounterKill {
                    boss: entry.encounter.name,
                    raid: instance.instance.name.clone(),
                    difficulty,
                    last_kill,
                });
            }
        }
    }
    kills
}

fn realm_slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace('\'', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

// =============================================================================
// Port Implementation
// =============================================================================

#[async_trait]
impl CharacterDataPort for ProxyClient {
    async fn fetch_profile(&self, who: &CharacterLocator) -> Result<RemoteProfile, FetchError> {
        let url = self.character_url(&["character"], who)?;
        let response: ProfileResponse = self.get_json(url).await?;
        Ok(response.into_remote(who.region))
    }

    async fn fetch_equipment(
        &self,
        who: &CharacterLocator,
    ) -> Result<Vec<EquippedItem>, FetchError> {
        let url = self.character_url(&["equipment"], who)?;
        self.get_json(url).await
    }

    async fn fetch_vault_keystones(
        &self,
        who: &CharacterLocator,
    ) -> Result<Vec<KeystoneRun>, FetchError> {
        let url = self.character_url(&["vault", "mythic-plus"], who)?;
        match self.get_json::<KeystoneResponse>(url).await {
            Ok(response) => Ok(response.best_runs),
            // No keystone profile yet means no runs this week.
            Err(FetchError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn fetch_vault_raids(
        &self,
        who: &CharacterLocator,
    ) -> Result<Vec<RaidEncounterKill>, FetchError> {
        let url = self.character_url(&["vault", "raids"], who)?;
        match self.get_json::<RaidEncountersResponse>(url).await {
            Ok(response) => Ok(flatten_raid_encounters(response)),
            Err(FetchError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn fetch_professions(
        &self,
        who: &CharacterLocator,
    ) -> Result<Vec<ProfessionSkill>, FetchError> {
        let url = self.character_url(&["professions"], who)?;
        match self.get_json::<ProfessionsResponse>(url).await {
            Ok(response) => Ok(response.primaries),
            Err(FetchError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn fetch_realms(&self, region: Region) -> Result<Vec<RealmInfo>, FetchError> {
        let url = self.url(&["realms", region.as_str()])?;
        let response: RealmsResponse = self.get_json(url).await?;
        let mut realms: Vec<RealmInfo> = response
            .realms
            .into_iter()
            .map(|name| RealmInfo {
                slug: realm_slug(&name),
                name,
            })
            .collect();
        realms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(realms)
    }

    async fn auto_add(&self, region: Region, name: &str) -> Result<RemoteProfile, FetchError> {
        let url = self.url(&["auto-add"])?;
        let body = serde_json::json!({ "region": region.as_str(), "name": name });
        let response: ProfileResponse = self
            .send_json(&url, || {
                self.client
                    .post(url.clone())
                    .timeout(self.scan_timeout)
                    .json(&body)
            })
            .await?;
        Ok(response.into_remote(region))
    }

    async fn fetch_talent_tree(
        &self,
        region: Region,
        class_slug: &str,
        spec_slug: &str,
    ) -> Result<serde_json::Value, FetchError> {
        let url = self.url(&["talent-tree", region.as_str(), class_slug, spec_slug])?;
        let timeout = self.scan_timeout;
        self.send_json(&url, || self.client.get(url.clone()).timeout(timeout))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> ProxyClient {
        let config = EngineConfig {
            server_url: "http://proxy.local:8000/".to_string(),
            ..EngineConfig::default()
        };
        ProxyClient::new(&config).expect("valid config")
    }

    fn client_for(server: &MockServer) -> ProxyClient {
        let config = EngineConfig {
            server_url: server.uri(),
            auth_key: Some("sekrit".to_string()),
            ..EngineConfig::default()
        };
        ProxyClient::new(&config)
            .expect("valid config")
            .with_retry_delay(Duration::from_millis(10))
    }

    fn jaina() -> CharacterLocator {
        CharacterLocator::new(Region::Eu, "Kazzak", "Jaina")
    }

    fn profile_body() -> serde_json::Value {
        serde_json::json!({
            "name": "Jaina",
            "realm": "Kazzak",
            "level": 80,
            "class_id": 8,
            "class_name": "Mage",
            "spec_name": "Frost",
            "item_level": 620
        })
    }

    #[test]
    fn character_urls_percent_encode_segments() {
        let who = CharacterLocator::new(Region::Eu, "Argent Dawn", "Ænïma");
        let url = client().character_url(&["vault", "raids"], &who).expect("url");
        assert_eq!(
            url.as_str(),
            "http://proxy.local:8000/vault/raids/eu/Argent%20Dawn/%C3%86n%C3%AFma"
        );
    }

    fn raid_mode(difficulty: &str, boss: &str, killed_ms: i64) -> serde_json::Value {
        serde_json::json!({
            "difficulty": {"name": difficulty},
            "encounters": [{"encounter": {"name": boss}, "last_kill_timestamp": killed_ms}]
        })
    }

    fn expansion(raid: &str, modes: Vec<serde_json::Value>) -> serde_json::Value {
        serde_json::json!({"instances": [{"instance": {"name": raid}, "modes": modes}]})
    }

    #[test]
    fn raid_document_flattens_latest_expansion_only() {
        let json = serde_json::json!({
            "expansions": [
                expansion("Old Raid", vec![raid_mode("Mythic", "Old Boss", 1_704_970_000_000)]),
                expansion(
                    "Nerub-ar Palace",
                    vec![
                        raid_mode("Raid Finder", "Ulgrax", 1_704_970_000_000),
                        raid_mode("Heroic", "Ulgrax", 1_704_980_000_000),
                    ]
                ),
            ]
        });
        let response: RaidEncountersResponse = serde_json::from_value(json).expect("parse");
        let kills = flatten_raid_encounters(response);

        assert_eq!(kills.len(), 2);
        assert!(kills.iter().all(|k| k.raid == "Nerub-ar Palace"));
        assert_eq!(kills[0].difficulty, RaidDifficulty::Lfr);
        assert_eq!(kills[1].difficulty, RaidDifficulty::Heroic);
        assert_eq!(kills[1].last_kill.timestamp_millis(), 1_704_980_000_000);
    }

    #[test]
    fn empty_raid_document_has_no_kills() {
        let response: RaidEncountersResponse =
            serde_json::from_value(serde_json::json!({})).expect("parse");
        assert!(flatten_raid_encounters(response).is_empty());
    }

    #[test]
    fn profile_response_derives_slugs() {
        let response: ProfileResponse = serde_json::from_value(serde_json::json!({
            "name": "Thrall",
            "realm": "Draenor",
            "level": 80,
            "class_id": 7,
            "class_name": "Shaman",
            "spec_name": "Elemental",
            "item_level": 615
        }))
        .expect("parse");
        let remote = response.into_remote(Region::Us);
        assert_eq!(remote.profile.class_slug, "shaman");
        assert_eq!(remote.profile.spec_slug, "elemental");
        assert_eq!(remote.region, Region::Us);
    }

    #[test]
    fn realm_slugs_drop_apostrophes() {
        assert_eq!(realm_slug("Kel'Thuzad"), "kelthuzad");
        assert_eq!(realm_slug("Argent Dawn"), "argent-dawn");
    }

    // =========================================================================
    // Over HTTP
    // =========================================================================

    #[tokio::test]
    async fn forbidden_is_retried_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/character/eu/Kazzak/Jaina"))
            .respond_with(ResponseTemplate::new(403))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/character/eu/Kazzak/Jaina"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
            .expect(1)
            .mount(&server)
            .await;

        let remote = client_for(&server)
            .fetch_profile(&jaina())
            .await
            .expect("second attempt succeeds");
        assert_eq!(remote.profile.spec_slug, "frost");
    }

    #[tokio::test]
    async fn forbidden_twice_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/character/eu/Kazzak/Jaina"))
            .respond_with(ResponseTemplate::new(403))
            .expect(2)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_profile(&jaina())
            .await
            .expect_err("still forbidden");
        assert!(matches!(err, FetchError::Unavailable(_)));
    }

    #[tokio::test]
    async fn missing_and_null_answers_are_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/character/eu/Kazzak/Jaina"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/equipment/eu/Kazzak/Jaina"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
            .mount(&server)
            .await;
        let client = client_for(&server);

        let profile = client.fetch_profile(&jaina()).await.expect_err("404");
        let equipment = client.fetch_equipment(&jaina()).await.expect_err("null");
        assert!(profile.is_not_found());
        assert!(equipment.is_not_found());
    }

    #[tokio::test]
    async fn server_errors_are_unavailable_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/equipment/eu/Kazzak/Jaina"))
            .respond_with(ResponseTemplate::new(500).set_body_string("token refresh failed"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_equipment(&jaina())
            .await
            .expect_err("500");
        match err {
            FetchError::Unavailable(message) => {
                assert!(message.contains("500"));
                assert!(message.contains("token refresh failed"));
            }
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn auth_key_is_sent_and_realms_are_sorted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/realms/eu"))
            .and(header(AUTH_HEADER, "sekrit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "realms": ["Silvermoon", "Argent Dawn", "Kazzak"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let realms = client_for(&server)
            .fetch_realms(Region::Eu)
            .await
            .expect("realms");
        let names: Vec<&str> = realms.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Argent Dawn", "Kazzak", "Silvermoon"]);
        assert_eq!(realms[0].slug, "argent-dawn");
    }

    #[tokio::test]
    async fn missing_vault_halves_are_empty_not_errors() {
        let server = MockServer::start().await;
        let client = client_for(&server);

        assert!(client
            .fetch_vault_keystones(&jaina())
            .await
            .expect("no runs")
            .is_empty());
        assert!(client
            .fetch_vault_raids(&jaina())
            .await
            .expect("no kills")
            .is_empty());
    }

    #[tokio::test]
    async fn auto_add_posts_region_and_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auto-add"))
            .and(body_json(serde_json::json!({"region": "eu", "name": "jaina"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
            .expect(1)
            .mount(&server)
            .await;

        let remote = client_for(&server)
            .auto_add(Region::Eu, "jaina")
            .await
            .expect("found");
        assert_eq!(remote.name, "Jaina");
        assert_eq!(remote.realm, "Kazzak");
        assert_eq!(remote.region, Region::Eu);
    }

    #[tokio::test]
    async fn concurrent_scan_is_busy() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auto-add"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "detail": "Another auto-add scan is already running"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .auto_add(Region::Eu, "Jaina")
            .await
            .expect_err("busy");
        assert_eq!(
            err,
            FetchError::Busy("Another auto-add scan is already running".to_string())
        );
    }

    #[tokio::test]
    async fn talent_tree_is_passed_through() {
        let server = MockServer::start().await;
        let tree = serde_json::json!({"class_nodes": [{"id": 1}], "spec_nodes": [{"id": 2}]});
        Mock::given(method("GET"))
            .and(path("/talent-tree/us/death-knight/frost"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tree.clone()))
            .mount(&server)
            .await;

        let fetched = client_for(&server)
            .fetch_talent_tree(Region::Us, "death-knight", "frost")
            .await
            .expect("tree");
        assert_eq!(fetched, tree);
    }

    #[tokio::test]
    async fn health_follows_status() {
        let server = MockServer::start().await;
        let client = client_for(&server);
        assert!(!client.health().await);

        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;
        assert!(client.health().await);
    }
}
