//! Image URL normalization for storefront results

use crate::domain::catalog::CatalogItem;

use super::entity::ProductHit;

/// Anything carrying a thumbnail and a full-size website image
pub trait HasImages {
    fn thumbnail_mut(&mut self) -> &mut Option<String>;
    fn website_image(&self) -> Option<&str>;
}

impl HasImages for CatalogItem {
    fn thumbnail_mut(&mut self) -> &mut Option<String> {
        &mut self.thumbnail
    }

    fn website_image(&self) -> Option<&str> {
        self.website_image.as_deref()
    }
}

impl HasImages for ProductHit {
    fn thumbnail_mut(&mut self) -> &mut Option<String> {
        &mut self.thumbnail
    }

    fn website_image(&self) -> Option<&str> {
        self.website_image.as_deref()
    }
}

/// `path` resolved against `site_url`; absolute `http(s)` URLs pass through.
pub fn absolute_url(site_url: &str, path: &str) -> String {
    if path.starts_with("http") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        site_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Fall back to the website image when the thumbnail is unset, then make
/// the thumbnail absolute.
pub fn normalize<T: HasImages>(item: &mut T, site_url: &str) {
    if item.thumbnail_mut().is_none() {
        let fallback = item.website_image().map(str::to_string);
        *item.thumbnail_mut() = fallback;
    }

    if let Some(thumbnail) = item.thumbnail_mut() {
        *thumbnail = absolute_url(site_url, thumbnail);
    }
}

pub fn normalize_images<T: HasImages>(items: &mut [T], site_url: &str) {
    for item in items {
        normalize(item, site_url);
    }
}
