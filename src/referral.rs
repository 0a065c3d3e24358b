use once_cell::sync::Lazy;
use regex::Regex;

static REFERRAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(ReferralServer|Registrar Whois|Whois Server|WHOIS Server|Registrar WHOIS Server|refer):[^\S\n]*((?:r?whois|https?)://)?([0-9A-Za-z.\-_]*)",
    )
    .expect("valid referral pattern")
});

static LEADING_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[:\s]+").expect("valid cleanup pattern"));
static LEADING_HTTP_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?[:/]+").expect("valid cleanup pattern"));

/// Host named by the first referral directive in `raw`, if any.
///
/// Carriage returns are stripped before matching. An empty capture counts as
/// no referral.
pub fn extract_referral(raw: &str) -> Option<String> {
    let text = raw.replace('\r', "");
    let captures = REFERRAL_PATTERN.captures(&text)?;
    let host = clean_host(captures.get(3)?.as_str().trim());
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Drop leading separators and `http(s)` remnants that registries leave in
/// front of the host. If nothing is left, keep the input.
fn clean_host(captured: &str) -> String {
    let stripped = LEADING_NOISE.replace(captured, "");
    let stripped = LEADING_HTTP_SCHEME.replace(&stripped, "");
    if stripped.is_empty() {
        captured.to_string()
    } else {
        stripped.into_owned()
    }
}
