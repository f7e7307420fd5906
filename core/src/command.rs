//! Best-effort parser for curl-style command text.
//!
//! # Design
//! Parsing runs in three passes: `normalize` joins line continuations and
//! strips the leading `curl`, `tokenize` is a two-flag quote state machine,
//! and `parse` walks the tokens with a single cursor. Nothing here returns an
//! error. Flags that only affect curl's own transport behaviour are skipped
//! via two static tables; anything else unrecognised is dropped. A missing
//! URL surfaces as an empty `url` on the descriptor.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::http::HttpMethod;
use crate::types::RequestDescriptor;

const INVOCATION: &str = "curl";

/// Switches that take no argument.
const NO_ARG_FLAGS: &[&str] = &[
    "-L",
    "--location",
    "--compressed",
    "-k",
    "--insecure",
    "-s",
    "--silent",
    "-S",
    "--show-error",
    "-v",
    "--verbose",
    "-i",
    "--include",
    "-f",
    "--fail",
    "--fail-with-body",
    "-N",
    "--no-buffer",
    "--raw",
    "--tr-encoding",
    "--location-trusted",
    "-G",
    "--get",
    "-I",
    "--head",
];

/// Flags whose single argument is consumed and discarded.
const ONE_ARG_FLAGS: &[&str] = &[
    "-o",
    "--output",
    "-w",
    "--write-out",
    "--connect-timeout",
    "-m",
    "--max-time",
    "--retry",
    "--retry-delay",
    "-e",
    "--referer",
    "-A",
    "--user-agent",
    "--max-redirs",
    "-c",
    "--cookie-jar",
    "--cert",
    "--key",
    "--cacert",
    "--proxy",
];

const DATA_FLAGS: &[&str] = &[
    "-d",
    "--data",
    "--data-raw",
    "--data-binary",
    "--data-urlencode",
];

const SCHEMES: &[&str] = &["http://", "https://"];
const DEFAULT_SCHEME: &str = "https://";

/// Parse raw command text into a request descriptor.
///
/// Never fails. Check [`RequestDescriptor::has_url`] on the result.
pub fn parse(raw: &str) -> RequestDescriptor {
    let normalized = normalize(raw);
    let mut tokens = tokenize(&normalized).into_iter();

    let mut explicit_method = None;
    let mut descriptor = RequestDescriptor::default();

    while let Some(token) = tokens.next() {
        match token.as_str() {
            "-X" | "--request" => {
                if let Some(verb) = tokens.next() {
                    explicit_method = Some(HttpMethod::parse(&verb));
                }
            }
            "-H" | "--header" => {
                if let Some((name, value)) = tokens.next().as_deref().and_then(split_header) {
                    descriptor.headers.insert(name, value);
                }
            }
            "-b" | "--cookie" => {
                if let Some(cookie) = tokens.next() {
                    descriptor.headers.insert("Cookie".to_string(), cookie);
                }
            }
            "-u" | "--user" => {
                if let Some(credentials) = tokens.next() {
                    let encoded = STANDARD.encode(credentials.as_bytes());
                    descriptor
                        .headers
                        .insert("Authorization".to_string(), format!("Basic {encoded}"));
                }
            }
            flag if DATA_FLAGS.contains(&flag) => {
                if let Some(body) = tokens.next() {
                    descriptor.body = Some(body);
                }
            }
            flag if NO_ARG_FLAGS.contains(&flag) => {}
            flag if ONE_ARG_FLAGS.contains(&flag) => {
                tokens.next();
            }
            candidate => {
                if descriptor.url.is_empty() {
                    if let Some(url) = url_candidate(candidate) {
                        descriptor.url = url;
                    }
                }
            }
        }
    }

    descriptor.method = match explicit_method {
        Some(method) => method,
        None if descriptor.body.is_some() => HttpMethod::Post,
        None => HttpMethod::Get,
    };
    descriptor
}

/// Join line continuations into single spaces, trim, and drop a leading
/// `curl` token.
///
/// A continuation is a backslash, then any whitespace run that contains a
/// newline; everything up to the last newline of that run is replaced.
pub fn normalize(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '\\' {
            let run_end = chars[i + 1..]
                .iter()
                .position(|c| !c.is_whitespace())
                .map_or(chars.len(), |offset| i + 1 + offset);
            if let Some(newline) = chars[i + 1..run_end].iter().rposition(|&c| c == '\n') {
                out.push(' ');
                i = i + 1 + newline + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    let trimmed = out.trim();
    strip_invocation(trimmed).to_string()
}

fn strip_invocation(text: &str) -> &str {
    let Some(head) = text.get(..INVOCATION.len()) else {
        return text;
    };
    if !head.eq_ignore_ascii_case(INVOCATION) {
        return text;
    }
    let rest = &text[INVOCATION.len()..];
    match rest.chars().next() {
        None => rest,
        Some(c) if c.is_whitespace() => rest.trim_start(),
        Some(_) => text,
    }
}

/// Split text into tokens, honouring single and double quotes.
///
/// A quote toggles its own state only while the other kind is closed, so
/// `"it's"` keeps the apostrophe. Quote characters that toggle state are not
/// part of the token. An unterminated quote runs to the end of input.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;

    for ch in text.chars() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            c if c.is_whitespace() && !in_single && !in_double => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn split_header(raw: &str) -> Option<(String, String)> {
    let (name, value) = raw.split_once(':')?;
    Some((name.trim().to_string(), value.trim().to_string()))
}

/// Accept a token as the target URL.
///
/// Tokens with an explicit scheme are taken as-is. Otherwise a bare
/// domain-looking token (has a `.`, no `:`) gets `https://` prepended; this
/// also matches things like version strings.
fn url_candidate(token: &str) -> Option<String> {
    if SCHEMES.iter().any(|scheme| token.starts_with(scheme)) {
        return Some(token.to_string());
    }
    if token.starts_with('-') {
        return None;
    }
    if token.contains('.') && !token.contains(':') {
        return Some(format!("{DEFAULT_SCHEME}{token}"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_url_defaults_to_get() {
        let d = parse("curl https://api.test/items");
        assert_eq!(d.method, HttpMethod::Get);
        assert_eq!(d.url, "https://api.test/items");
        assert!(d.headers.is_empty());
        assert!(d.body.is_none());
    }

    #[test]
    fn put_with_json_body_scenario() {
        let d = parse(
            r#"curl -X PUT -H "Content-Type: application/json" -d '{"a":1}' https://api.test/items/5"#,
        );
        assert_eq!(d.method, HttpMethod::Put);
        assert_eq!(d.url, "https://api.test/items/5");
        assert_eq!(d.headers.len(), 1);
        assert_eq!(d.headers["Content-Type"], "application/json");
        assert_eq!(d.body.as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn data_flag_promotes_to_post() {
        for flag in DATA_FLAGS {
            let d = parse(&format!("curl {flag} x=1 https://api.test"));
            assert_eq!(d.method, HttpMethod::Post, "{flag}");
            assert_eq!(d.body.as_deref(), Some("x=1"), "{flag}");
        }
    }

    #[test]
    fn explicit_method_wins_over_data_in_any_order() {
        let before = parse("curl -X get -d x https://api.test");
        assert_eq!(before.method, HttpMethod::Get);

        let after = parse("curl -d x --request delete https://api.test");
        assert_eq!(after.method, HttpMethod::Delete);
    }

    #[test]
    fn header_value_is_trimmed_and_split_on_first_colon() {
        let d = parse(r#"curl -H "X-Test :  value " -H "Referer: https://a.test:8080/x" https://api.test"#);
        assert_eq!(d.headers["X-Test"], "value");
        assert_eq!(d.headers["Referer"], "https://a.test:8080/x");
    }

    #[test]
    fn header_without_colon_is_ignored() {
        let d = parse("curl -H NoColonHere https://api.test");
        assert!(d.headers.is_empty());
        assert_eq!(d.url, "https://api.test");
    }

    #[test]
    fn header_names_are_case_sensitive() {
        let d = parse("curl -H 'accept: a' -H 'Accept: b' https://api.test");
        assert_eq!(d.headers["accept"], "a");
        assert_eq!(d.headers["Accept"], "b");
    }

    #[test]
    fn cookie_flag_sets_cookie_header() {
        let d = parse("curl -b 'session=abc; theme=dark' https://api.test");
        assert_eq!(d.headers["Cookie"], "session=abc; theme=dark");
    }

    #[test]
    fn basic_auth_is_base64_encoded() {
        let d = parse("curl -u user:pass https://api.test");
        assert_eq!(d.headers["Authorization"], "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn quoted_spaces_stay_in_one_token() {
        let d = parse("curl -d 'a b c' https://api.test");
        assert_eq!(d.body.as_deref(), Some("a b c"));
    }

    #[test]
    fn unterminated_quote_does_not_panic() {
        let d = parse(r#"curl -H "X-A: 1 https://x.test"#);
        assert_eq!(d.headers["X-A"], "1 https://x.test");
        assert!(d.url.is_empty());
    }

    #[test]
    fn one_quote_style_nests_inside_the_other() {
        assert_eq!(tokenize(r#"'say "hi"' "it's""#), vec![r#"say "hi""#, "it's"]);
    }

    #[test]
    fn adjacent_quoted_segments_join() {
        assert_eq!(tokenize(r#"a'b c'"d e"f"#), vec!["ab cd ef"]);
    }

    #[test]
    fn empty_quotes_emit_no_token() {
        assert_eq!(tokenize("a '' b"), vec!["a", "b"]);
    }

    #[test]
    fn line_continuations_become_spaces() {
        let raw = "curl -X POST \\\n  -H 'A: 1' \\\r\n  -d x \\  \n https://api.test";
        let d = parse(raw);
        assert_eq!(d.method, HttpMethod::Post);
        assert_eq!(d.headers["A"], "1");
        assert_eq!(d.body.as_deref(), Some("x"));
        assert_eq!(d.url, "https://api.test");
    }

    #[test]
    fn normalize_keeps_escaped_non_newlines() {
        assert_eq!(normalize(r"curl a\ b"), r"a\ b");
    }

    #[test]
    fn invocation_keyword_is_case_insensitive() {
        assert_eq!(normalize("CURL https://api.test"), "https://api.test");
        assert_eq!(normalize("curl"), "");
        assert_eq!(normalize("curlish.test"), "curlish.test");
    }

    #[test]
    fn irrelevant_flags_are_skipped_with_their_arguments() {
        let d = parse(
            "curl -sSL --compressed -k -o out.json -A 'Mozilla/5.0 (X11)' \
             --max-time 10 --retry 3 --proxy proxy.local:3128 https://api.test/v1",
        );
        assert_eq!(d.url, "https://api.test/v1");
        assert!(d.headers.is_empty());
        assert_eq!(d.method, HttpMethod::Get);
    }

    #[test]
    fn one_arg_flag_argument_is_not_a_url_candidate() {
        let d = parse("curl -o page.html example.com");
        assert_eq!(d.url, "https://example.com");
    }

    #[test]
    fn bare_domain_gets_https() {
        assert_eq!(parse("curl api.test/items").url, "https://api.test/items");
    }

    #[test]
    fn bare_token_with_colon_is_not_a_url() {
        assert!(parse("curl localhost:8080").url.is_empty());
    }

    #[test]
    fn first_url_candidate_wins() {
        let d = parse("curl https://first.test https://second.test");
        assert_eq!(d.url, "https://first.test");

        let d = parse("curl first.test https://second.test");
        assert_eq!(d.url, "https://first.test");
    }

    #[test]
    fn version_like_token_is_taken_as_url() {
        assert_eq!(parse("curl 1.2.3").url, "https://1.2.3");
    }

    #[test]
    fn no_candidates_leaves_url_empty() {
        let d = parse("curl -v -H 'A: b'");
        assert!(!d.has_url());
    }

    #[test]
    fn trailing_flag_without_argument_is_harmless() {
        let d = parse("curl https://api.test -X");
        assert_eq!(d.method, HttpMethod::Get);
        let d = parse("curl https://api.test -d");
        assert!(d.body.is_none());
        assert_eq!(d.method, HttpMethod::Get);
    }

    #[test]
    fn unknown_flags_are_dropped() {
        let d = parse("curl --http2 --tlsv1.2 https://api.test");
        assert_eq!(d.url, "https://api.test");
    }

    #[test]
    fn empty_input_yields_default_descriptor() {
        assert_eq!(parse("   "), RequestDescriptor::default());
    }
}
