//! Application constants shared across the crawler.
//! Selectors match the Westie.app markup and must follow its changes.

/// Default entry point of the application
pub const WESTIE_APP_URL: &str = "https://westie.app/";

/// Category tag shown on tiles of sanctioned (competitive) events
pub const SANCTIONED_TAG: &str = "WSDC";

/// Extension of captured tile images
pub const IMAGE_EXTENSION: &str = "png";

/// Attribute carrying the virtualized tile index
pub const TILE_INDEX_ATTR: &str = "data-index";

pub mod selectors {
    use crate::driver::Locator;

    // Section markers
    pub const EVENTS_PAGE: Locator = Locator::XPath(
        "//div[@id='app-root']//div[@data-test='nav-bar']/h1[contains(text(), 'Évènements à venir')]",
    );
    pub const LESSONS_PAGE: Locator = Locator::XPath(
        "//div[@id='app-root']//div[@data-test='nav-bar']/h1[contains(text(), 'Stages & Soirées')]",
    );
    pub const HOME_PAGE: Locator = Locator::XPath(
        "//div[@id='app-root']//div[@data-test='nav-bar']/h1[contains(text(), 'Accueil')]",
    );
    pub const LOGIN_EMAIL_INPUT: Locator =
        Locator::XPath("//div[@id='app-root']//form/input[@data-test='app-email-input']");
    pub const LOGIN_PIN_INPUT: Locator =
        Locator::XPath("//div[@id='app-root']//form/input[@data-test='app-pin-input']");
    pub const LOGIN_EMAIL_BUTTON: Locator =
        Locator::XPath("//*[@id='app-root']/div[2]/div/div/div/div[3]/button[1]");

    // Navigation
    pub const HOME_EVENTS_TILE: Locator = Locator::XPath(
        "//div[starts-with(@id, 'screenScrollView')]//div[@class='tile-title' and @data-test='tile-item-title' and contains(text(), 'Évènements')]",
    );

    // Listing
    pub const EVENT_TILES: Locator = Locator::XPath(
        "//div[starts-with(@id, 'screenScrollView')]//div[@data-test='app-vertical-list']/div[starts-with(@class, 'vlist___')]/div[starts-with(@class, 'vlist___')]/div[@data-index]",
    );
    pub const LAST_EVENT_TILE: Locator = Locator::XPath(
        "(//div[starts-with(@id, 'screenScrollView')]//div[@data-test='app-vertical-list']/div[starts-with(@class, 'vlist___')]/div[starts-with(@class, 'vlist___')]/div[@data-index][.//div[contains(@class, 'tile-image-area')]])[last()]",
    );
    pub const TILE_IMAGE: Locator = Locator::XPath(".//div[contains(@class, 'tile-image-area')]");
    pub const LIST_CONTAINER: Locator = Locator::XPath("//div[starts-with(@id, 'screenScrollView')]");
    pub const VIEWPORT: Locator = Locator::XPath("//div[starts-with(@id, 'OverlayscreenScrollView')]");

    // Overlays hidden before capturing tiles
    pub const FAVORITE_TOGGLES: Locator = Locator::XPath("//div[@data-test='app-toggle-icon-overlay']");
    pub const FILTERS_BUTTON: Locator = Locator::XPath(
        "//div[starts-with(@id, 'OverlayscreenScrollView') and @class='fab-target']",
    );
    pub const IMAGES: Locator = Locator::Css("img");

    // Static tile markup, read with `scraper`
    pub const TILE_TITLE: &str =
        "div.tile-overlay div.center-content.corner-content div.tile-text-container div.tile-title";
    pub const TILE_SUBTITLE: &str =
        "div.tile-overlay div.center-content.corner-content div.tile-text-container div.tile-subtitle";
    pub const TILE_DATES: &str =
        "div.tile-overlay div.tile-corner-container div.bottom-left-content.corner-content";
    pub const TILE_TAG: &str = "div.tile-overlay div.tile-corner-container div.top-left-content.corner-content div[data-test='app-tag-overlay']";
}

pub mod messages {
    pub const IMAGE_EXTRACTED: &str = "Image was extracted";
    pub const DATA_EXTRACTED: &str = "Event was extracted";
    pub const NOT_VISIBLE_YET: &str = "Event is not yet visible in viewport";
    pub const NOT_FULLY_VISIBLE_YET: &str = "Event is not yet fully visible in viewport";
    pub const NOT_VISIBLE_ANYMORE: &str = "Event is not visible anymore in viewport";
    pub const NOT_FULLY_VISIBLE_ANYMORE: &str = "Event is not fully visible anymore in viewport";
    pub const IMAGE_FAILED: &str = "Failed to save image";
    pub const DATA_FAILED: &str = "Failed to save event data";
    pub const IMAGE_ALREADY_EXTRACTED: &str = "Image already extracted";
    pub const DATA_ALREADY_EXTRACTED: &str = "Data already extracted";
}
