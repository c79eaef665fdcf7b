//! Formatting of air quality readings.
//!
//! Every function of this module is pure: it only turns a [`Station`] and its
//! [`Reading`] into text, whatever the transport the text is sent on.

use std::collections::HashMap;

use chrono::DateTime;
use serde_json::Value;

use crate::aqi::{Reading, Station, response_structs::SubReading};

/// Severity band of an air quality index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Good,
    Moderate,
    UnhealthyForSensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
    NotAvailable,
}

impl Severity {
    /// Classifies an index. Negative values have no band.
    pub fn from_index(index: i64) -> Self {
        match index {
            i if i > 300 => Severity::Hazardous,
            i if i > 200 => Severity::VeryUnhealthy,
            i if i > 150 => Severity::Unhealthy,
            i if i > 100 => Severity::UnhealthyForSensitive,
            i if i > 50 => Severity::Moderate,
            i if i >= 0 => Severity::Good,
            _ => Severity::NotAvailable,
        }
    }

    /// Classifies an index that may be missing.
    pub fn from_reading(index: Option<i64>) -> Self {
        index.map_or(Severity::NotAvailable, Severity::from_index)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Good => "Good",
            Severity::Moderate => "Moderate",
            Severity::UnhealthyForSensitive => "Unhealthy for Sensitive Groups",
            Severity::Unhealthy => "Unhealthy",
            Severity::VeryUnhealthy => "Very Unhealthy",
            Severity::Hazardous => "Hazardous",
            Severity::NotAvailable => "NA",
        }
    }

    /// Health advice for the band.
    pub fn advice(&self) -> &'static str {
        match self {
            Severity::Good => {
                "Air quality is satisfactory, and air pollution poses little or no risk."
            }
            Severity::Moderate => {
                "Air quality is acceptable. However, there may be a risk for some people, particularly those who are unusually sensitive to air pollution."
            }
            Severity::UnhealthyForSensitive => {
                "Members of sensitive groups may experience health effects. The general public is less likely to be affected."
            }
            Severity::Unhealthy => {
                "Some members of the general public may experience health effects; members of sensitive groups may experience more serious health effects."
            }
            Severity::VeryUnhealthy => {
                "Health alert: The risk of health effects is increased for everyone."
            }
            Severity::Hazardous => {
                "Health warning of emergency conditions: everyone is more likely to be affected."
            }
            Severity::NotAvailable => "No air quality index is currently available for this station.",
        }
    }
}

/// Health advice for an index.
pub fn advice_text(index: i64) -> &'static str {
    Severity::from_index(index).advice()
}

/// Reading codes the bot knows how to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadingCode {
    CarbonMonoxide,
    NitrogenDioxide,
    SulphurDioxide,
    Pm25,
    Pm10,
    Ozone,
    DewPoint,
    Temperature,
    Humidity,
    Wind,
    WindDirection,
    Pressure,
}

impl ReadingCode {
    /// Pollutants, in display order.
    pub const POLLUTANTS: [ReadingCode; 6] = [
        ReadingCode::CarbonMonoxide,
        ReadingCode::NitrogenDioxide,
        ReadingCode::SulphurDioxide,
        ReadingCode::Pm25,
        ReadingCode::Pm10,
        ReadingCode::Ozone,
    ];

    /// Weather values, in display order.
    pub const WEATHER: [ReadingCode; 6] = [
        ReadingCode::DewPoint,
        ReadingCode::Temperature,
        ReadingCode::Humidity,
        ReadingCode::Wind,
        ReadingCode::WindDirection,
        ReadingCode::Pressure,
    ];

    /// Parses a provider code. Dew point is reported either as `d` or `dew`.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = match code {
            "co" => ReadingCode::CarbonMonoxide,
            "no2" => ReadingCode::NitrogenDioxide,
            "so2" => ReadingCode::SulphurDioxide,
            "pm25" => ReadingCode::Pm25,
            "pm10" => ReadingCode::Pm10,
            "o3" => ReadingCode::Ozone,
            "d" | "dew" => ReadingCode::DewPoint,
            "t" => ReadingCode::Temperature,
            "h" => ReadingCode::Humidity,
            "w" => ReadingCode::Wind,
            "wd" => ReadingCode::WindDirection,
            "p" => ReadingCode::Pressure,
            _ => return None,
        };
        Some(code)
    }

    /// Codes under which the provider may report this value.
    fn codes(&self) -> &'static [&'static str] {
        match self {
            ReadingCode::CarbonMonoxide => &["co"],
            ReadingCode::NitrogenDioxide => &["no2"],
            ReadingCode::SulphurDioxide => &["so2"],
            ReadingCode::Pm25 => &["pm25"],
            ReadingCode::Pm10 => &["pm10"],
            ReadingCode::Ozone => &["o3"],
            ReadingCode::DewPoint => &["d", "dew"],
            ReadingCode::Temperature => &["t"],
            ReadingCode::Humidity => &["h"],
            ReadingCode::Wind => &["w"],
            ReadingCode::WindDirection => &["wd"],
            ReadingCode::Pressure => &["p"],
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ReadingCode::CarbonMonoxide => "Carbon Monoxide",
            ReadingCode::NitrogenDioxide => "Nitrogen Dioxide",
            ReadingCode::SulphurDioxide => "Sulphur Dioxide",
            ReadingCode::Pm25 => "PM 2.5",
            ReadingCode::Pm10 => "PM 10",
            ReadingCode::Ozone => "Ozone",
            ReadingCode::DewPoint => "Dew Point",
            ReadingCode::Temperature => "Temperature",
            ReadingCode::Humidity => "Relative Humidity",
            ReadingCode::Wind => "Wind",
            ReadingCode::WindDirection => "Wind Direction",
            ReadingCode::Pressure => "Atmospheric Pressure",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ReadingCode::CarbonMonoxide => "ppm",
            ReadingCode::NitrogenDioxide
            | ReadingCode::SulphurDioxide
            | ReadingCode::Pm25
            | ReadingCode::Pm10
            | ReadingCode::Ozone => "µg/m3",
            ReadingCode::DewPoint | ReadingCode::Temperature => "°C",
            ReadingCode::Humidity => "%",
            ReadingCode::Wind => "m/s",
            ReadingCode::WindDirection => "°",
            ReadingCode::Pressure => "hPa",
        }
    }

    /// Finds the value of this code in the readings, if any.
    fn lookup<'a>(&self, iaqi: &'a HashMap<String, SubReading>) -> Option<&'a Value> {
        self.codes()
            .iter()
            .find_map(|code| iaqi.get(*code).and_then(|sub| sub.v.as_ref()))
    }
}

/// Renders a reading value.
///
/// Integers are rendered as sent, decimals with one decimal place, so `12`
/// stays `12` and `12.0` stays `12.0`. Values that are neither numbers nor
/// strings are not rendered.
pub fn format_value(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) if number.is_i64() || number.is_u64() => Some(number.to_string()),
        Value::Number(number) => number.as_f64().map(|value| format!("{:.1}", value)),
        Value::String(text) => Some(text.clone()),
        _ => None,
    }
}

/// One `Name (unit): value` line per code present in the readings.
pub fn format_levels(codes: &[ReadingCode], iaqi: &HashMap<String, SubReading>) -> String {
    codes
        .iter()
        .filter_map(|code| {
            let value = format_value(code.lookup(iaqi)?)?;
            Some(format!("{} ({}): {}\n", code.display_name(), code.unit(), value))
        })
        .collect()
}

/// Renders the time of a reading, `NA` when unknown.
pub fn format_time(reading: &Reading) -> String {
    let Some(time) = &reading.time else {
        return "NA".to_string();
    };

    if let Some(iso) = &time.iso
        && let Ok(date) = DateTime::parse_from_rfc3339(iso)
    {
        return date.format("%a %b %d %Y %H:%M:%S GMT%z").to_string();
    }

    time.iso
        .clone()
        .or_else(|| time.s.clone())
        .unwrap_or_else(|| "NA".to_string())
}

fn format_index(reading: &Reading) -> String {
    let severity = Severity::from_reading(reading.aqi);
    match reading.aqi {
        Some(index) => format!("Current AQI: {} ({})", index, severity.label()),
        None => format!("Current AQI: NA ({})", severity.label()),
    }
}

/// Summary of a reading: index, severity, advice and station.
pub fn format_brief(station: &Station, reading: &Reading) -> String {
    let advice = reading
        .aqi
        .map_or(Severity::NotAvailable.advice(), advice_text);

    format!(
        "*Air Quality Information*\n\n\
        {}\n\
        {}\n\n\
        Last Updated at {}\n\n\
        Station: {}",
        format_index(reading),
        advice,
        format_time(reading),
        station.name
    )
}

/// Full report of a reading: index, dominant pollutant, every known
/// pollutant and weather value, time, station and source.
pub fn format_detailed(station: &Station, reading: &Reading) -> String {
    let dominant = reading
        .dominentpol
        .as_deref()
        .and_then(ReadingCode::from_code)
        .map_or("NA", |code| code.display_name());
    let source = reading
        .attributions
        .first()
        .map_or("NA", |attribution| attribution.name.as_str());

    format!(
        "*Air Quality Information*\n\n\
        {}\n\
        Dominant Pollutant: {}\n\n\
        _Pollutant Levels_\n\
        {}\n\
        _Weather Information_\n\
        {}\n\
        Last Updated at {}\n\n\
        Station: {}\n\
        Source: {}",
        format_index(reading),
        dominant,
        format_levels(&ReadingCode::POLLUTANTS, &reading.iaqi),
        format_levels(&ReadingCode::WEATHER, &reading.iaqi),
        format_time(reading),
        station.name,
        source
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::aqi::{Attribution, ReadingTime};

    fn create_station() -> Station {
        Station {
            name: "Okhla Phase-2, Delhi, Delhi, India".to_string(),
            url: "india/delhi/okhla-phase-2".to_string(),
        }
    }

    fn create_iaqi(values: Vec<(&str, Value)>) -> HashMap<String, SubReading> {
        values
            .into_iter()
            .map(|(code, value)| (code.to_string(), SubReading { v: Some(value) }))
            .collect()
    }

    fn create_reading() -> Reading {
        Reading {
            aqi: Some(158),
            dominentpol: Some("pm25".to_string()),
            iaqi: create_iaqi(vec![
                ("pm25", json!(158)),
                ("co", json!(12.0)),
                ("no2", json!(19.34)),
                ("t", json!(31)),
                ("dew", json!(21.5)),
                ("h", json!(62)),
            ]),
            time: Some(ReadingTime {
                iso: Some("2020-06-05T14:00:00+05:30".to_string()),
                s: Some("2020-06-05 14:00:00".to_string()),
            }),
            attributions: vec![Attribution {
                name: "CPCB - India Central Pollution Control Board".to_string(),
                url: None,
            }],
        }
    }

    #[test]
    fn test_severity_bands() {
        assert_eq!(Severity::from_index(0), Severity::Good);
        assert_eq!(Severity::from_index(50), Severity::Good);
        assert_eq!(Severity::from_index(51), Severity::Moderate);
        assert_eq!(Severity::from_index(55), Severity::Moderate);
        assert_eq!(Severity::from_index(101), Severity::UnhealthyForSensitive);
        assert_eq!(Severity::from_index(151), Severity::Unhealthy);
        assert_eq!(Severity::from_index(201), Severity::VeryUnhealthy);
        assert_eq!(Severity::from_index(300), Severity::VeryUnhealthy);
        assert_eq!(Severity::from_index(301), Severity::Hazardous);
        assert_eq!(Severity::from_index(-1), Severity::NotAvailable);
        assert_eq!(Severity::from_reading(None), Severity::NotAvailable);
    }

    #[test]
    fn test_advice_text_per_band() {
        assert_eq!(advice_text(10), Severity::Good.advice());
        assert_eq!(advice_text(250), Severity::VeryUnhealthy.advice());
        assert_ne!(advice_text(10), advice_text(60));
        assert_eq!(advice_text(-5), Severity::NotAvailable.advice());
    }

    #[test]
    fn test_reading_code_round_trip_names() {
        for code in ReadingCode::POLLUTANTS.iter().chain(ReadingCode::WEATHER.iter()) {
            assert_eq!(ReadingCode::from_code(code.codes()[0]), Some(*code));
        }
        assert_eq!(ReadingCode::from_code("dew"), Some(ReadingCode::DewPoint));
        assert_eq!(ReadingCode::from_code("uvi"), None);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!(12)), Some("12".to_string()));
        assert_eq!(format_value(&json!(12.0)), Some("12.0".to_string()));
        assert_eq!(format_value(&json!(19.34)), Some("19.3".to_string()));
        assert_eq!(format_value(&json!("-")), Some("-".to_string()));
        assert_eq!(format_value(&json!(null)), None);
    }

    #[test]
    fn test_format_levels_skips_absent_codes() {
        let iaqi = create_iaqi(vec![("pm10", json!(80)), ("co", json!(12.0)), ("uvi", json!(3))]);

        assert_eq!(
            format_levels(&ReadingCode::POLLUTANTS, &iaqi),
            "Carbon Monoxide (ppm): 12.0\nPM 10 (µg/m3): 80\n"
        );
        assert_eq!(format_levels(&ReadingCode::WEATHER, &iaqi), "");
    }

    #[test]
    fn test_format_time() {
        let reading = create_reading();
        assert_eq!(format_time(&reading), "Fri Jun 05 2020 14:00:00 GMT+0530");

        let reading = Reading {
            time: Some(ReadingTime {
                iso: None,
                s: Some("2020-06-05 14:00:00".to_string()),
            }),
            ..Reading::default()
        };
        assert_eq!(format_time(&reading), "2020-06-05 14:00:00");
        assert_eq!(format_time(&Reading::default()), "NA");
    }

    #[test]
    fn test_format_brief() {
        let message = format_brief(&create_station(), &create_reading());

        assert_eq!(
            message,
            "*Air Quality Information*\n\n\
            Current AQI: 158 (Unhealthy)\n\
            Some members of the general public may experience health effects; members of sensitive groups may experience more serious health effects.\n\n\
            Last Updated at Fri Jun 05 2020 14:00:00 GMT+0530\n\n\
            Station: Okhla Phase-2, Delhi, Delhi, India"
        );
    }

    #[test]
    fn test_format_detailed() {
        let message = format_detailed(&create_station(), &create_reading());

        assert!(message.contains("Current AQI: 158 (Unhealthy)"));
        assert!(message.contains("Dominant Pollutant: PM 2.5"));
        assert!(message.contains("Carbon Monoxide (ppm): 12.0\n"));
        assert!(message.contains("Nitrogen Dioxide (µg/m3): 19.3\n"));
        assert!(message.contains("PM 2.5 (µg/m3): 158\n"));
        assert!(message.contains("Dew Point (°C): 21.5\n"));
        assert!(message.contains("Temperature (°C): 31\n"));
        assert!(message.contains("Relative Humidity (%): 62\n"));
        assert!(!message.contains("Sulphur Dioxide"));
        assert!(!message.contains("Wind"));
        assert!(message.contains("Source: CPCB - India Central Pollution Control Board"));
        assert_eq!(message.matches(" (µg/m3): ").count(), 2);
    }

    #[test]
    fn test_format_detailed_missing_fields() {
        let message = format_detailed(&create_station(), &Reading::default());

        assert!(message.contains("Current AQI: NA (NA)"));
        assert!(message.contains("Dominant Pollutant: NA"));
        assert!(message.contains("Last Updated at NA"));
        assert!(message.contains("Source: NA"));
    }
}
