//! Data models mirroring the two external API shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One country from the REST Countries v3.1 API.
///
/// Catalog records are fetched with a `fields=` projection, so everything
/// outside that subset is `#[serde(default)]` and only populated by the
/// per-code detail fetch. `cca3` is the sole identity field; favorites
/// membership and routing never compare anything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    pub cca3: String,
    pub name: CountryName,
    #[serde(default)]
    pub flags: Flags,
    #[serde(default)]
    pub capital: Vec<String>,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub subregion: Option<String>,
    #[serde(default)]
    pub population: u64,
    #[serde(default)]
    pub languages: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub currencies: Option<BTreeMap<String, Currency>>,
    #[serde(default)]
    pub timezones: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountryName {
    pub common: String,
    #[serde(default)]
    pub official: String,
}

/// Flag image URLs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Flags {
    #[serde(default)]
    pub png: String,
    #[serde(default)]
    pub svg: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Currency {
    #[serde(default)]
    pub name: String,
    /// Some currencies have no symbol upstream.
    #[serde(default)]
    pub symbol: String,
}

/// Current-weather response from OpenWeatherMap, reduced to the fields the
/// detail page renders. Fetched fresh per view, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherData {
    #[serde(default)]
    pub weather: Vec<WeatherCondition>,
    pub main: WeatherMain,
    pub wind: Wind,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub main: String,
    pub description: String,
    /// Icon id, e.g. "04d"; rendered via openweathermap's icon CDN.
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherMain {
    pub temp: f64,
    pub feels_like: f64,
    #[serde(default)]
    pub temp_min: f64,
    #[serde(default)]
    pub temp_max: f64,
    pub humidity: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_record_deserializes_with_projected_fields_only() {
        // Shape returned by /v3.1/all?fields=name,cca3,region,capital,population,flags
        let raw = r#"{
            "name": {"common": "Finland", "official": "Republic of Finland"},
            "cca3": "FIN",
            "region": "Europe",
            "capital": ["Helsinki"],
            "population": 5530719,
            "flags": {"png": "https://flagcdn.com/w320/fi.png", "svg": "https://flagcdn.com/fi.svg"}
        }"#;

        let country: Country = serde_json::from_str(raw).unwrap();
        assert_eq!(country.cca3, "FIN");
        assert_eq!(country.name.common, "Finland");
        assert_eq!(country.capital, vec!["Helsinki"]);
        assert_eq!(country.population, 5_530_719);
        assert!(country.languages.is_none());
        assert!(country.subregion.is_none());
    }

    #[test]
    fn detail_record_deserializes_display_fields() {
        let raw = r#"{
            "name": {"common": "Finland", "official": "Republic of Finland"},
            "cca3": "FIN",
            "region": "Europe",
            "subregion": "Northern Europe",
            "capital": ["Helsinki"],
            "population": 5530719,
            "flags": {"png": "p", "svg": "s"},
            "languages": {"fin": "Finnish", "swe": "Swedish"},
            "currencies": {"EUR": {"name": "Euro", "symbol": "€"}},
            "timezones": ["UTC+02:00"]
        }"#;

        let country: Country = serde_json::from_str(raw).unwrap();
        let languages = country.languages.unwrap();
        assert_eq!(languages.get("fin").map(String::as_str), Some("Finnish"));
        let currencies = country.currencies.unwrap();
        assert_eq!(currencies["EUR"].symbol, "€");
        assert_eq!(country.subregion.as_deref(), Some("Northern Europe"));
    }

    #[test]
    fn country_snapshot_round_trips_through_json() {
        let raw = r#"{
            "name": {"common": "Brazil", "official": "Federative Republic of Brazil"},
            "cca3": "BRA",
            "region": "Americas",
            "capital": ["Brasília"],
            "population": 215000000,
            "flags": {"png": "p", "svg": "s"}
        }"#;

        let country: Country = serde_json::from_str(raw).unwrap();
        let reparsed: Country = serde_json::from_str(&serde_json::to_string(&country).unwrap()).unwrap();
        assert_eq!(reparsed.cca3, country.cca3);
        assert_eq!(reparsed.name.common, country.name.common);
        assert_eq!(reparsed.population, country.population);
    }

    #[test]
    fn weather_response_deserializes() {
        let raw = r#"{
            "weather": [{"main": "Clouds", "description": "overcast clouds", "icon": "04d"}],
            "main": {"temp": 17.3, "feels_like": 16.8, "temp_min": 15.0, "temp_max": 19.1, "humidity": 72},
            "wind": {"speed": 4.6},
            "name": "Helsinki"
        }"#;

        let weather: WeatherData = serde_json::from_str(raw).unwrap();
        assert_eq!(weather.weather[0].icon, "04d");
        assert_eq!(weather.main.humidity, 72);
        assert!((weather.wind.speed - 4.6).abs() < f64::EPSILON);
    }
}
