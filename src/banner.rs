//! Home page banner carousel
//!
//! Shows the active banners in catalog order (loaded by `sort_order`, later
//! creates appended), or a single built-in fallback when none are active.
//! Rotation only runs with more than one banner.

use std::sync::Arc;
use std::time::Duration;

use crate::models::{Banner, EntityId};

/// Time each banner stays on screen
pub const ROTATION_INTERVAL: Duration = Duration::from_secs(5);

/// Image shown when no banner is active
pub const FALLBACK_IMAGE: &str = "./Banner/Group 5.png";

/// Built-in banner used when the catalog has none to show
pub fn fallback_banner() -> Banner {
    Banner {
        id: EntityId::Text("default".into()),
        image_url: FALLBACK_IMAGE.into(),
        title: Some("Default Banner".into()),
        sort_order: 0,
        is_active: true,
    }
}

/// Rotating banner view
#[derive(Debug, Clone)]
pub struct BannerCarousel {
    banners: Vec<Arc<Banner>>,
    index: usize,
}

impl BannerCarousel {
    pub fn new(banners: &[Arc<Banner>]) -> Self {
        let mut active: Vec<Arc<Banner>> =
            banners.iter().filter(|b| b.is_active).cloned().collect();
        if active.is_empty() {
            active.push(Arc::new(fallback_banner()));
        }
        Self {
            banners: active,
            index: 0,
        }
    }

    /// Banners on display (never empty)
    pub fn banners(&self) -> &[Arc<Banner>] {
        &self.banners
    }

    pub fn len(&self) -> usize {
        self.banners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banners.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &Banner {
        &self.banners[self.index]
    }

    pub fn is_fallback(&self) -> bool {
        self.banners.len() == 1 && self.banners[0].id == EntityId::Text("default".into())
    }

    pub fn next(&mut self) {
        self.index = (self.index + 1) % self.banners.len();
    }

    pub fn prev(&mut self) {
        let len = self.banners.len();
        self.index = (self.index + len - 1) % len;
    }

    /// Jump to dot `index`; out-of-range indices are ignored
    pub fn go_to(&mut self, index: usize) {
        if index < self.banners.len() {
            self.index = index;
        }
    }

    /// Rotation period, or `None` when there is nothing to rotate
    pub fn rotation_interval(&self) -> Option<Duration> {
        (self.banners.len() > 1).then_some(ROTATION_INTERVAL)
    }

    /// Advance on a rotation tick; returns whether the banner changed
    pub fn tick(&mut self) -> bool {
        if self.rotation_interval().is_none() {
            return false;
        }
        self.next();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banner(id: i64, sort_order: i32, is_active: bool) -> Arc<Banner> {
        Arc::new(Banner {
            id: EntityId::Int(id),
            image_url: format!("https://cdn.example.com/{}.png", id),
            title: None,
            sort_order,
            is_active,
        })
    }

    #[test]
    fn test_inactive_filtered_in_catalog_order() {
        let carousel = BannerCarousel::new(&[banner(1, 3, true), banner(2, 1, false), banner(3, 2, true)]);
        let ids: Vec<_> = carousel.banners().iter().map(|b| b.id.clone()).collect();
        assert_eq!(ids, vec![EntityId::Int(1), EntityId::Int(3)]);
    }

    #[test]
    fn test_wraparound() {
        let mut carousel = BannerCarousel::new(&[banner(1, 1, true), banner(2, 2, true), banner(3, 3, true)]);
        carousel.prev();
        assert_eq!(carousel.index(), 2);
        carousel.next();
        assert_eq!(carousel.index(), 0);
        carousel.go_to(7);
        assert_eq!(carousel.index(), 0);
        carousel.go_to(1);
        assert_eq!(carousel.current().id, EntityId::Int(2));
    }

    #[test]
    fn test_single_banner_does_not_rotate() {
        let mut carousel = BannerCarousel::new(&[banner(1, 1, true)]);
        assert!(carousel.rotation_interval().is_none());
        assert!(!carousel.tick());
        assert!(!carousel.is_fallback());
    }
}
