//! Los Angeles Times search crawler.
//!
//! The crawl is split in two layers that share the selectors below:
//!
//! 1. **Navigation** ([`navigation`]): search → topic filter → sort by newest
//!    → walk the result pages.
//! 2. **Extraction** ([`extract`]): turn the items of one result page into
//!    [`crate::models::NewsRecord`]s and report whether more pages exist.
//!
//! # Selectors
//!
//! | Element | Selector |
//! |---------|----------|
//! | Search button | [`selectors::SEARCH_BUTTON`] |
//! | Search input | [`selectors::SEARCH_INPUT`] |
//! | Topic filter entries | [`selectors::TOPIC_ENTRIES`] |
//! | Sort dropdown | [`selectors::SORT_SELECT`] |
//! | Result items | [`selectors::RESULT_ITEMS`] |
//! | "X of Y" counter | [`selectors::PAGE_COUNTER`] |
//! | Next page link | [`selectors::NEXT_PAGE`] |

pub mod extract;
pub mod navigation;

pub mod selectors {
    pub const SEARCH_BUTTON: &str = r#"button[data-element="search-button"]"#;
    pub const SEARCH_INPUT: &str = r#"input[data-element="search-form-input"]"#;

    pub const TOPIC_MENU: &str = r#"ul[data-name="Topics"]"#;
    pub const TOPIC_ENTRIES: &str = r#"ul[data-name="Topics"] li"#;
    pub const TOPIC_CHECKBOX: &str = r#"input[type="checkbox"]"#;

    pub const SORT_SELECT: &str = "select.select-input";
    pub const NEWEST_LABEL: &str = "Newest";

    pub const RESULT_ITEMS: &str = "li ps-promo.promo.promo-position-large.promo-medium";
    pub const ITEM_TITLE: &str = "h3.promo-title a";
    pub const ITEM_DESCRIPTION: &str = "p.promo-description";
    pub const ITEM_TIMESTAMP: &str = "p.promo-timestamp";
    pub const TIMESTAMP_ATTRIBUTE: &str = "data-timestamp";
    pub const ITEM_IMAGE: &str = "div.promo-media img";

    pub const PAGE_COUNTER: &str = "div.search-results-module-page-counts";
    pub const NEXT_PAGE: &str = "div.search-results-module-next-page a";

    /// The lone image rendered when an image URL is opened directly.
    pub const POPUP_IMAGE: &str = "img";
}
