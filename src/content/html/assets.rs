//! Asset inventory resolution (spec.md §4.6 step 6): images, stylesheets,
//! scripts, and media, each resolved to an absolute URL or kept verbatim
//! when already a data URI.

use scraper::{Html, Selector};
use std::collections::HashSet;

pub use crate::content::AssetInventory;

use super::resolve_href;

struct AssetSelectors {
    img: Selector,
    stylesheet: Selector,
    script: Selector,
    media: Selector,
}

fn selectors() -> AssetSelectors {
    AssetSelectors {
        img: Selector::parse("img[src]").expect("static selector"),
        stylesheet: Selector::parse("link[rel=stylesheet][href]").expect("static selector"),
        script: Selector::parse("script[src]").expect("static selector"),
        media: Selector::parse("video[src], audio[src], source[src]").expect("static selector"),
    }
}

/// Walk the document for every asset-bearing element, resolve each `src`/
/// `href` against `base`, and bucket by kind. Duplicates (by resolved URL)
/// are dropped within each bucket.
pub(super) fn resolve_assets(document: &Html, base: &url::Url) -> AssetInventory {
    let sel = selectors();
    let mut inventory = AssetInventory::default();

    collect(document, &sel.img, "src", base, &mut inventory.images);
    collect(document, &sel.stylesheet, "href", base, &mut inventory.stylesheets);
    collect(document, &sel.script, "src", base, &mut inventory.scripts);
    collect(document, &sel.media, "src", base, &mut inventory.media);

    inventory
}

fn collect(document: &Html, selector: &Selector, attr: &str, base: &url::Url, out: &mut Vec<String>) {
    let mut seen = HashSet::new();
    for element in document.select(selector) {
        let Some(value) = element.value().attr(attr) else {
            continue;
        };
        if let Some(resolved) = resolve_href(value, base) {
            if seen.insert(resolved.clone()) {
                out.push(resolved);
            }
        }
    }
}
