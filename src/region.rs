/// Rectangular latitude/longitude region used for generated demo data.
#[derive(Debug, Clone, Copy)] // Copy for convenience
pub struct Region {
    pub lat1: f64, // Effective min latitude
    pub lng1: f64, // Effective min longitude
    pub lat2: f64, // Effective max latitude
    pub lng2: f64, // Effective max longitude
}

/// The Caribbean box the original demo datasets cluster in.
pub const CARIBBEAN: Region = Region {
    lat1: 9.0,
    lng1: -90.0,
    lat2: 26.0,
    lng2: -60.0,
};

impl std::str::FromStr for Region {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return Err(anyhow::anyhow!(
                "Invalid region format. Expected 'lat1,lng1,lat2,lng2', got '{}'",
                s
            ));
        }

        let lat1_input = parts[0].trim().parse::<f64>()?;
        let lng1_input = parts[1].trim().parse::<f64>()?;
        let lat2_input = parts[2].trim().parse::<f64>()?;
        let lng2_input = parts[3].trim().parse::<f64>()?;

        // Ensure lat1 < lat2 and lng1 < lng2 for consistent range calculations
        let (min_lat, max_lat) = if lat1_input < lat2_input {
            (lat1_input, lat2_input)
        } else {
            (lat2_input, lat1_input)
        };
        let (min_lng, max_lng) = if lng1_input < lng2_input {
            (lng1_input, lng2_input)
        } else {
            (lng2_input, lng1_input)
        };

        if min_lat == max_lat || min_lng == max_lng {
            return Err(anyhow::anyhow!(
                "Invalid region. Latitude or longitude range cannot be zero. Got lat1={}, lat2={} and lng1={}, lng2={}",
                lat1_input,
                lat2_input,
                lng1_input,
                lng2_input
            ));
        }

        Ok(Region {
            lat1: min_lat,
            lng1: min_lng,
            lat2: max_lat,
            lng2: max_lng,
        })
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{},{}", self.lat1, self.lng1, self.lat2, self.lng2)
    }
}

impl Region {
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        self.lat1 <= lat && lat <= self.lat2 && self.lng1 <= lng && lng <= self.lng2
    }

    pub fn lat_span(&self) -> f64 {
        self.lat2 - self.lat1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_corner_order() {
        let region: Region = "26,-60,9,-90".parse().unwrap();
        assert_eq!(region.lat1, 9.0);
        assert_eq!(region.lat2, 26.0);
        assert_eq!(region.lng1, -90.0);
        assert_eq!(region.lng2, -60.0);
    }

    #[test]
    fn rejects_zero_area_regions() {
        assert!("9,-90,9,-60".parse::<Region>().is_err());
        assert!("9,-90,26,-90".parse::<Region>().is_err());
    }

    #[test]
    fn rejects_wrong_arity_and_non_numbers() {
        assert!("9,-90,26".parse::<Region>().is_err());
        assert!("9,-90,26,-60,0".parse::<Region>().is_err());
        assert!("a,b,c,d".parse::<Region>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        let region: Region = CARIBBEAN.to_string().parse().unwrap();
        assert_eq!(region.lat1, CARIBBEAN.lat1);
        assert_eq!(region.lng2, CARIBBEAN.lng2);
    }

    #[test]
    fn containment_is_inclusive() {
        assert!(CARIBBEAN.contains(9.0, -90.0));
        assert!(CARIBBEAN.contains(17.0, -75.0));
        assert!(!CARIBBEAN.contains(30.0, -75.0));
        assert!(!CARIBBEAN.contains(17.0, -50.0));
    }
}
