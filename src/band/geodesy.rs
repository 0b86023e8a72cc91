// src/band/geodesy.rs
//! Lightweight geodesy used to describe a band's grid in metres without a
//! full reprojection.

const EARTH_RADIUS_KM: f64 = 6371.0;

const ZONE_LETTERS: &[u8] = b"CDEFGHJKLMNPQRSTUVWXX";

/// A UTM zone as number plus latitude-band or hemisphere letter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtmZone {
    pub number: u8,
    pub letter: Option<char>,
}

impl UtmZone {
    /// Southern hemisphere zones use the 327xx EPSG family.
    pub fn epsg_code(&self, southern: bool) -> String {
        let base = if southern { 32700 } else { 32600 };
        format!("EPSG:{}", base + u32::from(self.number))
    }
}

/// Great-circle distance in kilometres between two `(lat, lon)` points given in degrees.
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * h.sqrt().asin() * EARTH_RADIUS_KM
}

/// UTM zone containing a geographic coordinate, including the Norway and
/// Svalbard exceptions. `None` outside the UTM latitude range.
pub fn utm_zone_from_latlon(lat: f64, lon: f64) -> Option<UtmZone> {
    if !(-80.0..=84.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }

    let number = if (56.0..64.0).contains(&lat) && (3.0..12.0).contains(&lon) {
        32
    } else if (72.0..=84.0).contains(&lat) && lon >= 0.0 && lon < 42.0 {
        match lon {
            l if l < 9.0 => 31,
            l if l < 21.0 => 33,
            l if l < 33.0 => 35,
            _ => 37,
        }
    } else if lon >= 180.0 {
        60
    } else {
        ((lon + 180.0) / 6.0).floor() as u8 + 1
    };

    let letter_idx = ((lat + 80.0) / 8.0).floor() as usize;
    let letter = ZONE_LETTERS.get(letter_idx).map(|&b| b as char);

    Some(UtmZone { number, letter })
}

/// Best-effort scan of a projection description for a `UTM zone NNX` declaration.
pub fn parse_utm_zone(projection: &str) -> Option<UtmZone> {
    let (_, rest) = projection.split_once("UTM zone ")?;

    let mut digits = String::new();
    let mut letter = None;
    for c in rest.chars().take(4) {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if c.is_ascii_alphabetic() && letter.is_none() {
            letter = Some(c.to_ascii_uppercase());
        }
    }

    let number = digits.parse::<u8>().ok().filter(|n| (1..=60).contains(n))?;
    Some(UtmZone { number, letter })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn haversine_one_degree_of_latitude() {
        let d = haversine_km((0.0, 0.0), (1.0, 0.0));
        assert_relative_eq!(d, 111.195, epsilon = 1e-3);
    }

    #[test]
    fn zone_for_sydney() {
        let zone = utm_zone_from_latlon(-33.87, 151.21).unwrap();
        assert_eq!(zone.number, 56);
        assert_eq!(zone.letter, Some('H'));
        assert_eq!(zone.epsg_code(true), "EPSG:32756");
    }

    #[test]
    fn zone_exceptions() {
        assert_eq!(utm_zone_from_latlon(60.0, 5.0).unwrap().number, 32);
        assert_eq!(utm_zone_from_latlon(78.0, 15.0).unwrap().number, 33);
        assert!(utm_zone_from_latlon(85.0, 0.0).is_none());
    }

    #[test]
    fn single_digit_zone_epsg() {
        let zone = UtmZone { number: 5, letter: None };
        assert_eq!(zone.epsg_code(false), "EPSG:32605");
    }

    #[test]
    fn parses_zone_from_wkt() {
        let wkt = r#"PROJCS["WGS 84 / UTM zone 56S",GEOGCS["WGS 84"]]"#;
        assert_eq!(
            parse_utm_zone(wkt),
            Some(UtmZone { number: 56, letter: Some('S') })
        );
    }

    #[test]
    fn tolerates_unexpected_descriptions() {
        assert_eq!(parse_utm_zone("PROJCS[\"Universal Transverse Mercator\"]"), None);
        assert_eq!(parse_utm_zone("UTM zone unknown"), None);
    }
}
