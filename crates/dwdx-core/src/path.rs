//! Entry path construction
//!
//! Paths are dot-separated and may only contain ASCII alphanumerics,
//! underscores and dots.

/// Replace whitespace with `_` and strip everything outside `[A-Za-z0-9._]`.
pub fn sanitize_path(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '.')
        .collect()
}

/// Alias used as the namespace segment of an observation station
pub fn station_alias(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Dot-join segments and sanitize the result
pub fn join_path<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = segments
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(".");
    sanitize_path(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_field_name() {
        assert_eq!(sanitize_path("Luft temp. (°C)"), "Luft_temp._C");
        assert_eq!(sanitize_path("Luft temp.(°C)"), "Luft_temp.C");
        assert_eq!(sanitize_path("Sichtweite\t(km)"), "Sichtweite_km");
    }

    #[test]
    fn test_sanitize_keeps_allowed() {
        assert_eq!(sanitize_path("dwdWeather.K419BEOB.a_b.1"), "dwdWeather.K419BEOB.a_b.1");
        assert_eq!(sanitize_path("Höhe"), "Hhe");
    }

    #[test]
    fn test_station_alias() {
        assert_eq!(station_alias("K419_-BEOB"), "K419BEOB");
        assert_eq!(station_alias("01271-BEOB"), "01271BEOB");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(
            join_path(["dwdWeather", "N7075", "days", "0", "temperatureMin"]),
            "dwdWeather.N7075.days.0.temperatureMin"
        );
        assert_eq!(join_path(["root", "", "x y"]), "root.x_y");
    }
}
