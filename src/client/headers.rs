//! Baseline browser-fingerprint header generation
//!
//! The original transport regenerated its header profile on every call rather
//! than caching one, so consecutive requests do not present an identical
//! fingerprint. Same discipline here: [`generate_baseline`] draws a fresh
//! profile from the pools each time it is called.

use rand::seq::SliceRandom;
use rand::Rng;

/// Desktop user agents rotated across requests
const USER_AGENTS: [&str; 6] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:127.0) Gecko/20100101 Firefox/127.0",
];

const ACCEPT_LANGUAGES: [&str; 4] = [
    "en-US,en;q=0.9",
    "en-US,en;q=0.8",
    "en-US,en;q=0.9,es;q=0.5",
    "en-US,en;q=0.7",
];

/// Generates a fresh baseline header set
///
/// Called once per request attempt; never cached. Caller-supplied headers are
/// merged over this baseline by the executor.
pub fn generate_baseline() -> Vec<(String, String)> {
    let mut rng = rand::thread_rng();

    let user_agent = *USER_AGENTS.choose(&mut rng).unwrap();
    let accept_language = *ACCEPT_LANGUAGES.choose(&mut rng).unwrap();

    let mut headers = vec![
        ("user-agent".to_string(), user_agent.to_string()),
        (
            "accept".to_string(),
            "*/*;q=0.9,text/html,application/json".to_string(),
        ),
        ("accept-language".to_string(), accept_language.to_string()),
        (
            "accept-encoding".to_string(),
            "gzip, deflate, br".to_string(),
        ),
        ("sec-fetch-dest".to_string(), "empty".to_string()),
        ("sec-fetch-mode".to_string(), "cors".to_string()),
        ("sec-fetch-site".to_string(), "same-origin".to_string()),
    ];

    // Chromium-family agents also carry client-hint headers
    if user_agent.contains("Chrome/") {
        let major = if user_agent.contains("Chrome/125") {
            125
        } else {
            126
        };
        headers.push((
            "sec-ch-ua".to_string(),
            format!(
                "\"Not/A)Brand\";v=\"{}\", \"Chromium\";v=\"{major}\", \"Google Chrome\";v=\"{major}\"",
                rng.gen_range(8..=99)
            ),
        ));
        headers.push(("sec-ch-ua-mobile".to_string(), "?0".to_string()));
        let platform = if user_agent.contains("Macintosh") {
            "\"macOS\""
        } else if user_agent.contains("X11") {
            "\"Linux\""
        } else {
            "\"Windows\""
        };
        headers.push(("sec-ch-ua-platform".to_string(), platform.to_string()));
    }

    headers
}
