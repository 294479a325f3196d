//! Custom policy example
//!
//! Implements `FilterPolicy` directly instead of using `AllowList`. The
//! policy keeps links only to a fixed set of hosts and reports an error for
//! tags it has no rule for; the filter treats those as not allowed.

use html_fragment_filter::{FilterPolicy, HtmlFilter, PolicyError};
use tracing_subscriber::EnvFilter;

struct LinkPolicy {
    hosts: Vec<&'static str>,
}

impl LinkPolicy {
    fn allows_url(&self, url: &str) -> bool {
        let Some(rest) = url.strip_prefix("https://") else {
            return url.starts_with('/') && !url.starts_with("//");
        };
        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        self.hosts.iter().any(|allowed| host.eq_ignore_ascii_case(allowed))
    }
}

impl FilterPolicy for LinkPolicy {
    fn is_allowed_tag(&self, tag_name: &str) -> bool {
        matches!(tag_name, "p" | "a" | "em" | "strong")
    }

    fn is_allowed_attribute(&self, tag_name: &str, attribute_name: &str, value: &str) -> bool {
        tag_name == "a" && attribute_name == "href" && self.allows_url(value)
    }

    fn check_tag(&self, tag_name: &str) -> Result<bool, PolicyError> {
        match tag_name {
            "script" | "style" | "iframe" => Ok(false),
            name if self.is_allowed_tag(name) => Ok(true),
            name if name.contains('-') => Err(PolicyError::new(format!(
                "no rule for custom element <{}>",
                name
            ))),
            _ => Ok(false),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let policy = LinkPolicy {
        hosts: vec!["example.com", "docs.example.com"],
    };
    let filter = HtmlFilter::new();

    let inputs = [
        r#"<p>See <a href="https://example.com/a">the docs</a>.</p>"#,
        r#"<p><a href="https://evil.test/x">phish</a> and <a href="javascript:alert(1)">js</a></p>"#,
        r#"<p><a href="//evil.test/x">protocol-relative</a> <a href="/local">local</a></p>"#,
        r#"<my-widget data-x="1"><strong>inside a custom element</strong></my-widget>"#,
    ];

    for html in inputs {
        println!("Input:  {}", html);
        match filter.filter_with_report(&policy, html) {
            Ok(output) => {
                println!("Output: {}", output.html);
                println!("Policy failures: {}", output.report.policy_failures);
            }
            Err(err) => println!("Error: {}", err),
        }
        println!();
    }
}
