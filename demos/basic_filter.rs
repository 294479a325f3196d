//! Basic filtering examples
//!
//! Run with `RUST_LOG=html_fragment_filter=trace` to see every keep, unwrap
//! and drop decision.

use html_fragment_filter::{AllowList, FilterOptions, HtmlFilter};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    println!("=== HTML Fragment Filter - Basic Examples ===\n");

    let policy = AllowList::new()
        .allow_tags(["p", "b", "i", "a"])
        .allow_attribute("a", "href");

    // Example 1: Unwrapping and attribute removal
    run(
        "Unwrapping and attribute removal",
        &HtmlFilter::new(),
        &policy,
        r#"<div class="post"><p onclick="x()">Hello <span>World</span></p><a href="/next" target="_blank">next</a></div>"#,
    );

    // Example 2: Script content survives only as text
    run(
        "Script removal",
        &HtmlFilter::new(),
        &policy,
        "<p>Before</p><script>alert('xss')</script><p>After</p>",
    );

    // Example 3: Malformed markup is repaired by the parser
    run(
        "Malformed markup",
        &HtmlFilter::new(),
        &policy,
        "<p>unclosed <b>bold <i>both</p> tail",
    );

    // Example 4: Comments stripped through options
    let strict = HtmlFilter::with_options(FilterOptions {
        keep_comments: false,
        max_input_bytes: Some(64 * 1024),
        ..Default::default()
    });
    run(
        "Comment stripping",
        &strict,
        &policy,
        "<p>visible<!-- internal note --></p>",
    );

    // Example 5: Byte input in a legacy charset
    println!("Example 5: Latin-1 byte input");
    let bytes = b"<p>Caf\xE9 cr\xE8me</p>";
    match HtmlFilter::new().filter_bytes(&policy, bytes, Some("text/html; charset=ISO-8859-1")) {
        Ok(filtered) => println!("Output: {}", filtered),
        Err(err) => println!("Error: {}", err),
    }
    println!("---\n");
}

fn run(title: &str, filter: &HtmlFilter, policy: &AllowList, html: &str) {
    println!("Example: {}", title);
    println!("Input:  {}", html);

    match filter.filter_with_report(policy, html) {
        Ok(output) => {
            println!("Output: {}", output.html);
            println!("Report: {:?}", output.report);
        }
        Err(err) => println!("Error: {} (code {})", err, err.code()),
    }
    println!("---\n");
}
