#![no_main]
use html_fragment_filter::{AllowList, FilterOptions, HtmlFilter};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(html) = std::str::from_utf8(data) else {
        return;
    };

    let policy = AllowList::new()
        .allow_tags(["p", "b", "a", "svg", "math", "template"])
        .allow_global_attribute("title")
        .allow_attribute("a", "href");
    let filter = HtmlFilter::with_options(FilterOptions {
        max_input_bytes: Some(1 << 20),
        keep_comments: false,
        ..Default::default()
    });

    if let Ok(once) = filter.filter(&policy, html) {
        assert!(!once.to_ascii_lowercase().contains("<script"));
        assert!(!once.contains("<img"));
        assert!(filter.filter(&policy, &once).is_ok());
    }
});
