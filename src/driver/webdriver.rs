use super::{Driver, DriverError, DriverResult, Locator, Rect, WebElement};
use crate::config::{BrowserConfig, BrowserProfile};
use crate::session::SessionCookie;
use cookie::time::OffsetDateTime;
use fantoccini::cookies::Cookie;
use fantoccini::elements::Element;
use fantoccini::error::{CmdError, ErrorStatus};
use fantoccini::{Client, ClientBuilder};
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument};

impl From<CmdError> for DriverError {
    fn from(err: CmdError) -> Self {
        match &err {
            CmdError::Standard(wd) if matches!(wd.error, ErrorStatus::StaleElementReference) => {
                DriverError::StaleElement(wd.message.to_string())
            }
            e if e.is_no_such_element() => DriverError::NoSuchElement(err.to_string()),
            CmdError::WaitTimeout => DriverError::Timeout(err.to_string()),
            _ => DriverError::Command(err.to_string()),
        }
    }
}

fn to_locator(locator: Locator) -> fantoccini::Locator<'static> {
    match locator {
        Locator::XPath(s) => fantoccini::Locator::XPath(s),
        Locator::Css(s) => fantoccini::Locator::Css(s),
    }
}

/// W3C capabilities for exactly one browser profile.
pub fn capabilities(config: &BrowserConfig) -> Map<String, Value> {
    let mut args: Vec<String> = vec![
        "--disable-infobars".into(),
        "--disable-extensions".into(),
        "--disable-gpu".into(),
        "--disable-dev-shm-usage".into(),
        "--no-sandbox".into(),
        "--log-level=3".into(),
        "--remote-allow-origins=*".into(),
        "start-maximized".into(),
    ];
    if config.headless {
        args.push("--headless".into());
    }
    if let Some(dir) = &config.user_data_dir {
        args.push(format!("--user-data-dir={}", dir.display()));
    }

    let mut caps = Map::new();
    caps.insert("pageLoadStrategy".into(), json!("eager"));
    match config.profile {
        BrowserProfile::Chrome => {
            caps.insert("browserName".into(), json!("chrome"));
            caps.insert(
                "goog:chromeOptions".into(),
                json!({ "args": args, "excludeSwitches": ["enable-automation"] }),
            );
        }
        BrowserProfile::Edge => {
            caps.insert("browserName".into(), json!("MicrosoftEdge"));
            caps.insert(
                "ms:edgeOptions".into(),
                json!({ "args": args, "excludeSwitches": ["enable-automation"] }),
            );
        }
        BrowserProfile::Firefox => {
            let mut ff_args: Vec<&str> = Vec::new();
            if config.headless {
                ff_args.push("-headless");
            }
            caps.insert("browserName".into(), json!("firefox"));
            caps.insert("moz:firefoxOptions".into(), json!({ "args": ff_args }));
        }
    }
    caps
}

/// [`Driver`] backed by a fantoccini WebDriver client.
pub struct FantocciniDriver {
    client: Client,
}

impl FantocciniDriver {
    #[instrument(skip(config), fields(profile = ?config.profile))]
    pub async fn connect(config: &BrowserConfig) -> DriverResult<Self> {
        info!("Connecting to webdriver at {}", config.webdriver_url);
        let client = ClientBuilder::native()
            .capabilities(capabilities(config))
            .connect(&config.webdriver_url)
            .await
            .map_err(|e| DriverError::Session(e.to_string()))?;
        info!("Webdriver session established");
        Ok(Self { client })
    }
}

struct FantocciniElement {
    element: Element,
}

fn wrap(elements: Vec<Element>) -> Vec<Box<dyn WebElement>> {
    elements
        .into_iter()
        .map(|element| Box::new(FantocciniElement { element }) as Box<dyn WebElement>)
        .collect()
}

#[async_trait::async_trait]
impl WebElement for FantocciniElement {
    async fn rect(&self) -> DriverResult<Rect> {
        let (x, y, width, height) = self.element.rectangle().await?;
        Ok(Rect::new(x, y, width, height))
    }

    async fn text(&self) -> DriverResult<String> {
        Ok(self.element.text().await?)
    }

    async fn attribute(&self, name: &str) -> DriverResult<Option<String>> {
        Ok(self.element.attr(name).await?)
    }

    async fn outer_html(&self) -> DriverResult<String> {
        Ok(self.element.html(false).await?)
    }

    async fn is_displayed(&self) -> DriverResult<bool> {
        Ok(self.element.is_displayed().await?)
    }

    async fn find_all(&self, locator: Locator) -> DriverResult<Vec<Box<dyn WebElement>>> {
        Ok(wrap(self.element.find_all(to_locator(locator)).await?))
    }

    async fn screenshot(&self) -> DriverResult<Vec<u8>> {
        Ok(self.element.screenshot().await?)
    }

    async fn click(&self) -> DriverResult<()> {
        self.element.click().await?;
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> DriverResult<()> {
        Ok(self.element.send_keys(text).await?)
    }

    fn script_handle(&self) -> Value {
        serde_json::to_value(&self.element).unwrap_or(Value::Null)
    }
}

#[async_trait::async_trait]
impl Driver for FantocciniDriver {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        debug!("Navigating to {}", url);
        Ok(self.client.goto(url).await?)
    }

    async fn find_elements(&self, locator: Locator) -> DriverResult<Vec<Box<dyn WebElement>>> {
        Ok(wrap(self.client.find_all(to_locator(locator)).await?))
    }

    async fn run_script(&self, code: &str, args: Vec<Value>) -> DriverResult<Value> {
        Ok(self.client.execute(code, args).await?)
    }

    async fn cookies(&self) -> DriverResult<Vec<SessionCookie>> {
        let cookies = self.client.get_all_cookies().await?;
        Ok(cookies
            .iter()
            .map(|c| SessionCookie {
                name: c.name().to_string(),
                value: c.value().to_string(),
                domain: c.domain().map(str::to_string),
                path: c.path().map(str::to_string),
                expiry: c.expires_datetime().map(|dt| dt.unix_timestamp()),
                secure: c.secure().unwrap_or(false),
            })
            .collect())
    }

    async fn add_cookie(&self, cookie: SessionCookie) -> DriverResult<()> {
        let mut c = Cookie::new(cookie.name, cookie.value);
        if let Some(domain) = cookie.domain {
            c.set_domain(domain);
        }
        if let Some(path) = cookie.path {
            c.set_path(path);
        }
        c.set_secure(cookie.secure);
        if let Some(ts) = cookie.expiry {
            if let Ok(dt) = OffsetDateTime::from_unix_timestamp(ts) {
                c.set_expires(cookie::Expiration::DateTime(dt));
            }
        }
        Ok(self.client.add_cookie(c).await?)
    }

    async fn close(&self) -> DriverResult<()> {
        Ok(self.client.clone().close().await?)
    }
}
