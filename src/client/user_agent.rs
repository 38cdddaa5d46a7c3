//! User agents and client headers expected by the remote service.

/// User agent stamped on authenticated API sessions.
pub const USER_AGENT: &str = "Mozilla/5.0 (Linux; U; Android 4.4.2; en-us; SCH-I535 Build/KOT49H) AppleWebKit/534.30 (KHTML, like Gecko) Version/4.0 Mobile Safari/534.30";

/// User agent of the mobile auth library used for credential login.
pub const LOGIN_USER_AGENT: &str = "LinkedIn/9.29.8962 CFNetwork/1496.0.7 Darwin/23.5.0";

/// Auth library identifier sent alongside [`LOGIN_USER_AGENT`].
pub const LOGIN_LI_USER_AGENT: &str =
    "LIAuthLibrary:44.0.* com.linkedin.LinkedIn:9.29.8962 iPhone:17.5.1";

/// Rest.li protocol version header value.
pub const RESTLI_PROTOCOL_VERSION: &str = "2.0.0";

/// Client tracking header value.
pub const LI_TRACK: &str = r#"{"clientVersion":"1.13.1665"}"#;

/// Resolve user agent from config value.
/// - None => default API user agent
/// - other => custom user agent string
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config {
        None => USER_AGENT.to_string(),
        Some(custom) => custom.to_string(),
    }
}

/// Headers sent while driving the credential login flow.
pub fn login_headers() -> Vec<(String, String)> {
    vec![
        ("x-li-user-agent".to_string(), LOGIN_LI_USER_AGENT.to_string()),
        ("user-agent".to_string(), LOGIN_USER_AGENT.to_string()),
        ("x-user-language".to_string(), "en".to_string()),
        ("x-user-locale".to_string(), "en_US".to_string()),
        ("accept-language".to_string(), "en-us".to_string()),
    ]
}

/// Standard headers stamped on every authenticated session.
pub fn api_headers(user_agent: &str) -> Vec<(String, String)> {
    vec![
        ("user-agent".to_string(), user_agent.to_string()),
        (
            "x-restli-protocol-version".to_string(),
            RESTLI_PROTOCOL_VERSION.to_string(),
        ),
        ("x-li-track".to_string(), LI_TRACK.to_string()),
    ]
}
