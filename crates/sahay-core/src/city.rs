//! City cost-of-living index
//!
//! Static multipliers for Indian cities relative to a national baseline of 1.0.

/// Known cities and their multipliers (lowercase names, aliases included)
const CITY_COSTS: &[(&str, f64)] = &[
    ("mumbai", 1.5),
    ("bombay", 1.5),
    ("delhi", 1.3),
    ("new delhi", 1.3),
    ("bangalore", 1.4),
    ("bengaluru", 1.4),
    ("chennai", 1.2),
    ("madras", 1.2),
    ("hyderabad", 1.1),
    ("pune", 1.2),
    ("poona", 1.2),
    ("kolkata", 1.0),
    ("calcutta", 1.0),
    ("ahmedabad", 0.9),
    ("jaipur", 0.8),
    ("lucknow", 0.8),
    ("kanpur", 0.7),
    ("nagpur", 0.8),
    ("indore", 0.8),
    ("thane", 1.3),
    ("bhopal", 0.8),
    ("visakhapatnam", 0.8),
    ("patna", 0.8),
    ("vadodara", 0.9),
    ("ghaziabad", 1.0),
    ("ludhiana", 0.8),
    ("agra", 0.7),
    ("nashik", 0.9),
    ("faridabad", 1.0),
    ("meerut", 0.8),
    ("rajkot", 0.8),
    ("kalyan", 1.2),
    ("vasai", 1.2),
    ("varanasi", 0.7),
    ("srinagar", 0.8),
    ("aurangabad", 0.8),
    ("dhanbad", 0.7),
    ("amritsar", 0.8),
    ("navi mumbai", 1.4),
    ("allahabad", 0.7),
    ("ranchi", 0.8),
    ("howrah", 0.9),
    ("coimbatore", 0.9),
    ("jabalpur", 0.7),
    ("gwalior", 0.7),
    ("vijayawada", 0.8),
    ("jodhpur", 0.7),
    ("madurai", 0.8),
    ("raipur", 0.8),
    ("kota", 0.7),
    ("guwahati", 0.8),
    ("chandigarh", 1.1),
    ("solapur", 0.7),
    ("hubli", 0.7),
    ("dharwad", 0.7),
    ("tirunelveli", 0.7),
    ("tiruchirappalli", 0.8),
];

/// Multiplier used for cities not in the table
pub const DEFAULT_CITY_FACTOR: f64 = 1.0;

/// Cost-of-living multiplier for a city (case and surrounding whitespace ignored)
pub fn city_cost_index(city: &str) -> f64 {
    let key = city.trim().to_lowercase();
    CITY_COSTS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, factor)| *factor)
        .unwrap_or(DEFAULT_CITY_FACTOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_cities() {
        assert_eq!(city_cost_index("mumbai"), 1.5);
        assert_eq!(city_cost_index("  Bengaluru "), 1.4);
        assert_eq!(city_cost_index("NAVI MUMBAI"), 1.4);
        assert_eq!(city_cost_index("kanpur"), 0.7);
    }

    #[test]
    fn test_unknown_city_defaults() {
        assert_eq!(city_cost_index("atlantis"), 1.0);
        assert_eq!(city_cost_index(""), 1.0);
    }

    #[test]
    fn test_table_bounds() {
        for (name, factor) in CITY_COSTS {
            assert!((0.7..=1.5).contains(factor), "{} out of range", name);
            assert_eq!(*name, name.to_lowercase());
        }
    }
}
