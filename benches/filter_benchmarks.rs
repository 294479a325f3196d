use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use html_fragment_filter::{AllowList, HtmlFilter};

const SIMPLE_HTML: &str = r#"<b onclick="x">Hello <i>World</i> <a href="http://e" onclick="y">link</a></b>"#;
const HOSTILE_HTML: &str = r#"<p>intro</p><script>alert(1)</script><img src=x onerror=alert(1)><svg><style>&lt;/style&gt;</style></svg><!--><b title='"><x>'>t</b>"#;

fn policy() -> AllowList {
    AllowList::new()
        .allow_tags(["p", "b", "i", "a", "ul", "li"])
        .allow_global_attribute("title")
        .allow_attribute("a", "href")
}

fn article(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|i| {
            format!(
                r#"<div class="c{i}"><p onclick="x()">Paragraph {i} with <b>bold</b>, <i>italic</i> and <a href="/p/{i}" rel="nofollow">a link</a>.</p><ul><li>one</li><li>two</li></ul></div>"#
            )
        })
        .collect()
}

fn bench_simple(c: &mut Criterion) {
    let filter = HtmlFilter::new();
    let policy = policy();
    c.bench_function("filter_simple", |b| {
        b.iter(|| filter.filter(&policy, black_box(SIMPLE_HTML)))
    });
}

fn bench_hostile(c: &mut Criterion) {
    let filter = HtmlFilter::new();
    let policy = policy();
    c.bench_function("filter_hostile", |b| {
        b.iter(|| filter.filter(&policy, black_box(HOSTILE_HTML)))
    });
}

fn bench_article_sizes(c: &mut Criterion) {
    let filter = HtmlFilter::new();
    let policy = policy();
    let mut group = c.benchmark_group("filter_article");

    for paragraphs in [10, 100, 1000] {
        let html = article(paragraphs);
        group.bench_with_input(BenchmarkId::from_parameter(paragraphs), &html, |b, html| {
            b.iter(|| filter.filter(&policy, black_box(html)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_simple, bench_hostile, bench_article_sizes);
criterion_main!(benches);
