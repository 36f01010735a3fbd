//! Aura action envelope construction
//!
//! Every logical call to the target is one HTTP POST whose form body carries a
//! JSON "message" envelope (action id, ApexActionController descriptor, and a
//! JSON-encoded nested "input") plus a fixed JSON "context" envelope. The
//! builders here produce the path, headers, and pre-encoded body consumed by
//! the request executor.

use crate::config::SearchConfig;
use crate::crawler::{PageCursor, Partition};
use rand::Rng;
use serde_json::json;
use url::form_urlencoded;

const AURA_ENDPOINT: &str = "/member/s/sfsites/aura";
const ACTION_DESCRIPTOR: &str = "aura://ApexActionController/ACTION$execute";
const NAMESPACE: &str = "vlocity_ins";
const CLASSNAME: &str = "BusinessProcessDisplayController";
const INVOKE_METHOD: &str = "GenericInvoke2NoCont";
const SERVICE_CLASS: &str = "vlocity_ins.IntegrationProcedureService";

/// Base action id of the listing search; later pages step by two
const SEARCH_ACTION_BASE: u32 = 188;

/// Fixed action id of the detail lookup
const DETAIL_ACTION_ID: &str = "198;a";

/// Aura application context shared by all calls of one run
#[derive(Debug, Clone)]
pub struct AuraSession {
    fwuid: String,
    app: String,
    loaded_token: String,
}

impl AuraSession {
    /// Builds the session context from configuration
    ///
    /// A missing fwuid is replaced by a freshly generated one, so every run
    /// without a pinned framework UID presents a distinct value.
    pub fn from_config(search: &SearchConfig) -> Self {
        let fwuid = search
            .fwuid
            .clone()
            .unwrap_or_else(|| generate_fwuid(64));

        Self {
            fwuid,
            app: search.app.clone(),
            loaded_token: search.app_loaded_token.clone(),
        }
    }

    /// Renders the `aura.context` JSON envelope
    pub fn context_json(&self) -> serde_json::Value {
        json!({
            "mode": "PROD",
            "fwuid": self.fwuid,
            "app": self.app,
            "loaded": {
                format!("APPLICATION@markup://{}", self.app): self.loaded_token,
            },
            "dn": [],
            "globals": {},
            "uad": true,
        })
    }
}

/// Builds the request path for a listing search page
///
/// The `r` counter mimics the in-page action sequence: page 1 draws an
/// initial value, later pages add a per-page random increment.
pub fn search_request_path(page: u32) -> String {
    let mut rng = rand::thread_rng();
    let initial: u32 = rng.gen_range(37..=42);
    let rid = if page == 1 {
        initial
    } else {
        initial + (page - 1) * rng.gen_range(4..=6)
    };
    format!("{}?r={}&aura.ApexAction.execute=1", AURA_ENDPOINT, rid)
}

/// Builds the request path for a detail lookup
pub fn detail_request_path() -> String {
    let rid: u32 = rand::thread_rng().gen_range(43..=47);
    format!("{}?r={}&aura.ApexAction.execute=1", AURA_ENDPOINT, rid)
}

/// Action id of the listing search for a page: 188, 190, 192, ...
fn search_action_id(page: u32) -> String {
    format!("{};a", SEARCH_ACTION_BASE + (page - 1) * 2)
}

/// Builds the form-encoded body of a listing search call
///
/// The nested input carries the partition keys, the page window
/// (from/size), and the captcha token acquired for this attempt.
pub fn build_search_body(
    session: &AuraSession,
    search: &SearchConfig,
    partition: &Partition,
    cursor: &PageCursor,
    captcha_token: &str,
) -> String {
    let input = json!({
        "lastName": "",
        "tenantId": search.tenant_id,
        "planId": "",
        "planType": partition.plan_type,
        "firstName": "",
        "ServiceType": partition.service_type.as_str(),
        "networkId": "",
        "networkCode": partition.network_code,
        "distance": partition.distance,
        "zipCode": partition.zip_code,
        "providerSpeciality": partition.specialty_code,
        "from": cursor.offset(),
        "size": cursor.page_size,
        "fhn": "",
        "captchaResp": captcha_token,
    });

    let message = build_message(
        &search_action_id(cursor.page),
        &search.search_method,
        &input,
    );

    encode_form(&message, &session.context_json())
}

/// Builds the form-encoded body of a per-provider detail call
pub fn build_detail_body(
    session: &AuraSession,
    search: &SearchConfig,
    provider_id: &str,
    partition: &Partition,
) -> String {
    let input = json!({
        "providerId": provider_id,
        "tenantId": search.tenant_id,
        "planType": partition.plan_type,
        "networkCode": partition.network_code,
        "fhn": "",
        "ServiceType": partition.service_type.as_str(),
        "providerSpeciality": "",
    });

    let message = build_message(DETAIL_ACTION_ID, &search.detail_method, &input);

    encode_form(&message, &session.context_json())
}

/// Wraps a nested input into the ApexActionController message envelope
fn build_message(
    action_id: &str,
    procedure: &str,
    input: &serde_json::Value,
) -> serde_json::Value {
    json!({
        "actions": [{
            "id": action_id,
            "descriptor": ACTION_DESCRIPTOR,
            "callingDescriptor": "UNKNOWN",
            "params": {
                "namespace": NAMESPACE,
                "classname": CLASSNAME,
                "method": INVOKE_METHOD,
                "params": {
                    "input": serde_json::to_string(input).unwrap_or_default(),
                    "options": "{}",
                    "sClassName": SERVICE_CLASS,
                    "sMethodName": procedure,
                },
                "cacheable": false,
                "isContinuation": false,
            },
        }]
    })
}

/// Form-encodes the message and context envelopes
fn encode_form(message: &serde_json::Value, context: &serde_json::Value) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("message", &message.to_string())
        .append_pair("aura.context", &context.to_string())
        .append_pair("aura.pageURI", "")
        .append_pair("aura.token", "null")
        .finish()
}

/// Headers sent on every Aura call, beyond the generated baseline
pub fn aura_headers(base_url: &str, page_url: &str) -> Vec<(String, String)> {
    let ids = generate_request_ids();
    vec![
        (
            "content-type".to_string(),
            "application/x-www-form-urlencoded; charset=UTF-8".to_string(),
        ),
        ("origin".to_string(), base_url.trim_end_matches('/').to_string()),
        ("referer".to_string(), page_url.to_string()),
        ("x-sfdc-request-id".to_string(), ids.request_id),
        ("x-sfdc-page-scope-id".to_string(), ids.page_scope),
        ("x-b3-spanid".to_string(), ids.span_id),
        ("x-b3-traceid".to_string(), ids.trace_id),
    ]
}

/// Per-request correlation identifiers
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub page_scope: String,
    pub request_id: String,
    pub span_id: String,
    pub trace_id: String,
}

/// Generates fresh correlation identifiers for one call
pub fn generate_request_ids() -> RequestIds {
    let mut rng = rand::thread_rng();
    RequestIds {
        page_scope: uuid::Uuid::new_v4().to_string(),
        request_id: format!("{}00000965559", random_digits(&mut rng, 15)),
        span_id: random_digits(&mut rng, 16),
        trace_id: random_digits(&mut rng, 16),
    }
}

fn random_digits(rng: &mut impl Rng, len: usize) -> String {
    (0..len).map(|_| char::from(b'0' + rng.gen_range(0..10))).collect()
}

/// Generates a framework-UID-shaped random string
///
/// URL-safe base64-like core with a dot-separated numeric suffix, total
/// length `length`.
pub fn generate_fwuid(length: usize) -> String {
    const ALPHABET: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
    let mut rng = rand::thread_rng();

    let suffix = format!(
        "{}.{}.{}",
        rng.gen_range(0..100000u32),
        rng.gen_range(0..100000u32),
        rng.gen_range(0..100000u32)
    );

    if suffix.len() + 1 >= length {
        return (0..length)
            .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
            .collect();
    }

    let core_len = length - suffix.len() - 1;
    let core: String = (0..core_len)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect();

    format!("{}.{}", core, suffix)
}
