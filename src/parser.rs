use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

/// Flat key/value view of a raw WHOIS response. Keys are camelCase.
pub type ParsedMapping = BTreeMap<String, String>;

const DELIMITER: char = ':';

static DELIMITER_LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":\s*\r\n").expect("valid delimiter pattern"));
static DELIMITER_NO_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":\S+").expect("valid delimiter pattern"));

/// Turn loosely structured `Key: value` text into a [`ParsedMapping`].
///
/// Values for repeated keys are joined with a single space. Lines without
/// the dominant delimiter form are skipped.
pub fn parse_raw_data(raw: &str) -> ParsedMapping {
    let mut result = ParsedMapping::new();

    let decoded = html_escape::decode_html_entities(raw);
    let text = DELIMITER_LINE_BREAK.replace_all(&decoded, ": ");
    let delimiter = common_delimiter_form(&text);

    for line in text.split('\n') {
        let line = line.trim();
        if line.is_empty() || !line.contains(delimiter) {
            continue;
        }
        let Some((raw_key, value)) = line.split_once(DELIMITER) else {
            continue;
        };

        let key = camel_case(raw_key);
        if key.is_empty() {
            continue;
        }
        let value = value.trim();

        match result.get_mut(&key) {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(value);
            }
            None => {
                result.insert(key, value.to_string());
            }
        }
    }

    debug!("Parsed {} fields from {} bytes", result.len(), raw.len());
    result
}

/// `":"` when values mostly hug the colon, `": "` otherwise.
fn common_delimiter_form(text: &str) -> &'static str {
    let tight = DELIMITER_NO_SPACE.find_iter(text).count();
    let spaced = text.matches(": ").count();
    if tight > spaced {
        ":"
    } else {
        ": "
    }
}

/// `"Registrar WHOIS Server"` → `"registrarWhoisServer"`.
pub fn camel_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (i, word) in split_words(input).iter().enumerate() {
        let lower = word.to_lowercase();
        if i == 0 {
            out.push_str(&lower);
            continue;
        }
        let mut chars = lower.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

fn split_words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some(prev) = current.chars().last() {
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let lower_to_upper = (prev.is_lowercase() || prev.is_numeric()) && c.is_uppercase();
            let acronym_end = prev.is_uppercase() && c.is_uppercase() && next_is_lower;
            if lower_to_upper || acronym_end {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_fields() {
        let parsed = parse_raw_data("Domain Name: EXAMPLE.COM\r\nRegistrar: Example Inc\r\n");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["domainName"], "EXAMPLE.COM");
        assert_eq!(parsed["registrar"], "Example Inc");
    }

    #[test]
    fn test_repeated_keys_accumulate() {
        let parsed = parse_raw_data("Name Server: a.example\r\nName Server: b.example\r\n");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed["nameServer"], "a.example b.example");
    }

    #[test]
    fn test_value_on_next_line() {
        let parsed = parse_raw_data("Registrant:\r\n    Example Org\r\nStatus: active\r\n");
        assert_eq!(parsed["registrant"], "Example Org");
        assert_eq!(parsed["status"], "active");
    }

    #[test]
    fn test_value_keeps_later_colons() {
        let parsed = parse_raw_data("Registrar URL: http://www.example.com\nUpdated Date: 2024-01-01T10:00:00Z\n");
        assert_eq!(parsed["registrarUrl"], "http://www.example.com");
        assert_eq!(parsed["updatedDate"], "2024-01-01T10:00:00Z");
    }

    #[test]
    fn test_entities_decoded() {
        let parsed = parse_raw_data("Registrant Organization: Smith &amp; Sons\n");
        assert_eq!(parsed["registrantOrganization"], "Smith & Sons");
    }

    #[test]
    fn test_lines_without_delimiter_ignored() {
        let raw = ">>> Last update of WHOIS database <<<\n\nDomain Name: example.com\nTERMS OF USE apply\n";
        let parsed = parse_raw_data(raw);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed["domainName"], "example.com");
    }

    #[test]
    fn test_spaced_delimiter_skips_tight_lines() {
        let raw = "Domain: example.de\nStatus: connect\nNserver: ns1.example.de\nnote:tight\n";
        let parsed = parse_raw_data(raw);
        assert_eq!(parsed["status"], "connect");
        assert!(!parsed.contains_key("note"));
    }

    #[test]
    fn test_tight_delimiter_form() {
        let raw = "domain:example.ru\nnserver:ns1.example.ru.\nstate:REGISTERED\n";
        let parsed = parse_raw_data(raw);
        assert_eq!(parsed["domain"], "example.ru");
        assert_eq!(parsed["nserver"], "ns1.example.ru.");
        assert_eq!(parsed["state"], "REGISTERED");
    }

    #[test]
    fn test_reparse_is_stable() {
        let raw = "Domain Name: EXAMPLE.COM\r\nRegistrar WHOIS Server: whois.example.net\r\nName Server: a.example\r\nName Server: b.example\r\n";
        let first = parse_raw_data(raw);
        let rendered: String = first
            .iter()
            .map(|(k, v)| format!("{}: {}\n", k, v))
            .collect();
        assert_eq!(parse_raw_data(&rendered), first);
    }

    #[test]
    fn test_empty_value_not_kept_on_reparse() {
        let first = parse_raw_data("domain:example.ru\nnserver:a.ru\nstate:\n");
        assert_eq!(first["state"], "");

        let rendered: String = first
            .iter()
            .map(|(k, v)| format!("{}: {}\n", k, v))
            .collect();
        let second = parse_raw_data(&rendered);
        assert_eq!(second.get("state"), None);
        assert_eq!(second["domain"], "example.ru");
        assert_eq!(second["nserver"], "a.ru");
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("Domain Name"), "domainName");
        assert_eq!(camel_case("Registrar WHOIS Server"), "registrarWhoisServer");
        assert_eq!(camel_case("registrant-contact_email"), "registrantContactEmail");
        assert_eq!(camel_case("domainName"), "domainName");
        assert_eq!(camel_case("ReferralServer"), "referralServer");
        assert_eq!(camel_case("  NetRange "), "netRange");
        assert_eq!(camel_case("a. [Domain Name]"), "aDomainName");
        assert_eq!(camel_case("%"), "");
    }
}
