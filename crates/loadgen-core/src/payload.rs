use chrono::{SecondsFormat, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const EVENT_NAMES: [EventName; 5] = [
    EventName::PageView,
    EventName::ButtonClick,
    EventName::FormSubmit,
    EventName::VideoPlay,
    EventName::Scroll,
];
const PAGES: [&str; 5] = ["/home", "/products", "/about", "/contact", "/checkout"];
const REFERRERS: [Option<&str>; 5] = [
    Some("google"),
    Some("facebook"),
    Some("direct"),
    Some("email"),
    None,
];
const BROWSERS: [&str; 4] = ["Chrome", "Firefox", "Safari", "Edge"];
const OSES: [&str; 4] = ["Windows", "MacOS", "iOS", "Android"];
const SCREEN_SIZES: [&str; 3] = ["1920x1080", "1366x768", "375x812"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    PageView,
    ButtonClick,
    FormSubmit,
    VideoPlay,
    Scroll,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventProperties {
    pub page: String,
    pub referrer: Option<String>,
    /// Seconds spent on the page
    pub duration: u32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub browser: String,
    pub os: String,
    pub screen_size: String,
}

/// One synthetic tracking event. Immutable once generated; owned by the
/// batch that carries it until serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_name: EventName,
    pub event_time: String,
    pub user_id: String,
    pub session_id: String,
    pub properties: EventProperties,
    pub client_info: ClientInfo,
}

/// Current UTC time as an ISO-8601 string.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl EventRecord {
    /// Draws one random tracking event. Infallible; consumes randomness
    /// from the supplied generator only.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        // Session tokens are longer than user tokens on purpose, which
        // makes the two easy to tell apart when eyeballing captures.
        let user_id = format!("user_{}", &Uuid::new_v4().simple().to_string()[..8]);
        let session_id = format!("session_{}", Uuid::new_v4().simple());

        Self {
            event_name: *EVENT_NAMES.choose(rng).unwrap(),
            event_time: utc_timestamp(),
            user_id,
            session_id,
            properties: EventProperties {
                page: PAGES.choose(rng).unwrap().to_string(),
                referrer: REFERRERS.choose(rng).unwrap().map(str::to_string),
                duration: rng.random_range(1..=300),
                value: (rng.random_range(0.0..100.0_f64) * 100.0).round() / 100.0,
            },
            client_info: ClientInfo {
                browser: BROWSERS.choose(rng).unwrap().to_string(),
                os: OSES.choose(rng).unwrap().to_string(),
                screen_size: SCREEN_SIZES.choose(rng).unwrap().to_string(),
            },
        }
    }
}

/// Builds a batch of exactly `size` events. `size == 0` is legal and
/// yields an empty batch.
pub fn build_batch<R: Rng + ?Sized>(rng: &mut R, size: usize) -> Vec<EventRecord> {
    (0..size).map(|_| EventRecord::generate(rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_batch_has_exact_size() {
        let mut rng = StdRng::seed_from_u64(7);
        for size in [0, 1, 20, 100] {
            assert_eq!(build_batch(&mut rng, size).len(), size);
        }
    }

    #[test]
    fn test_generated_fields_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let event = EventRecord::generate(&mut rng);

            assert!(event.user_id.starts_with("user_"));
            assert_eq!(event.user_id.len(), "user_".len() + 8);
            assert!(event.session_id.starts_with("session_"));
            assert_eq!(event.session_id.len(), "session_".len() + 32);

            assert!((1..=300).contains(&event.properties.duration));
            assert!((0.0..100.0).contains(&event.properties.value));
            // rounded to two decimal places
            let cents = event.properties.value * 100.0;
            assert!((cents - cents.round()).abs() < 1e-6);

            assert!(PAGES.contains(&event.properties.page.as_str()));
            assert!(BROWSERS.contains(&event.client_info.browser.as_str()));
            assert!(OSES.contains(&event.client_info.os.as_str()));
            assert!(SCREEN_SIZES.contains(&event.client_info.screen_size.as_str()));
        }
    }

    #[test]
    fn test_event_wire_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        let event = EventRecord::generate(&mut rng);
        let value = serde_json::to_value(&event).unwrap();

        for key in [
            "event_name",
            "event_time",
            "user_id",
            "session_id",
            "properties",
            "client_info",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }

        let name = value["event_name"].as_str().unwrap();
        assert!(
            ["page_view", "button_click", "form_submit", "video_play", "scroll"]
                .contains(&name)
        );

        // lossless round-trip
        let back: EventRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }
}
