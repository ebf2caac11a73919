use crate::models::booking::{GoodType, VehicleType};

const BASE_COST_PER_KG: f64 = 10.0;
const COST_PER_KM: f64 = 10.0;

pub fn vehicle_multiplier(vehicle: VehicleType) -> f64 {
    match vehicle {
        VehicleType::Light => 12.0,
        VehicleType::Medium => 15.0,
        VehicleType::Heavy => 20.0,
    }
}

pub fn good_multiplier(good: GoodType) -> f64 {
    match good {
        GoodType::Perishable => 2.0,
        GoodType::NonPerishable => 1.0,
    }
}

/// Half-up rounding to two decimals. Costs are non-negative, so
/// round-half-away-from-zero and round-half-up coincide.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Two-decimal rendering used wherever a cost is compared or displayed.
pub fn format_cost(cost: f64) -> String {
    format!("{cost:.2}")
}

/// Estimated shipment cost. Absent inputs zero out their term (and the terms
/// derived from them); the distance term always applies. Pure: the distance
/// must already have been resolved by the routing provider.
pub fn estimate(
    weight_kg: Option<f64>,
    vehicle: Option<VehicleType>,
    good: Option<GoodType>,
    distance_km: f64,
) -> f64 {
    let weight_cost = weight_kg.map_or(0.0, |w| w * BASE_COST_PER_KG);
    let vehicle_cost = vehicle.map_or(0.0, |v| weight_cost * vehicle_multiplier(v));
    let good_cost = good.map_or(0.0, |g| vehicle_cost * good_multiplier(g));
    let distance_cost = distance_km * COST_PER_KM;

    round2(weight_cost + vehicle_cost + good_cost + distance_cost)
}

#[cfg(test)]
mod tests {
    use super::{estimate, format_cost, round2};
    use crate::models::booking::{GoodType, VehicleType};

    #[test]
    fn reference_estimate_matches_hand_computed_total() {
        // 1000 + 15000 + 30000 + 500
        let cost = estimate(
            Some(100.0),
            Some(VehicleType::Medium),
            Some(GoodType::Perishable),
            50.0,
        );
        assert_eq!(cost, 46_500.00);
    }

    #[test]
    fn zero_weight_leaves_only_the_distance_term() {
        let cost = estimate(
            Some(0.0),
            Some(VehicleType::Heavy),
            Some(GoodType::Perishable),
            12.0,
        );
        assert_eq!(cost, 120.0);
    }

    #[test]
    fn absent_vehicle_zeroes_vehicle_and_good_terms() {
        let cost = estimate(Some(10.0), None, Some(GoodType::Perishable), 5.0);
        assert_eq!(cost, 100.0 + 50.0);
    }

    #[test]
    fn absent_everything_still_charges_distance() {
        assert_eq!(estimate(None, None, None, 3.0), 30.0);
    }

    #[test]
    fn monotone_in_weight() {
        let lighter = estimate(
            Some(10.0),
            Some(VehicleType::Light),
            Some(GoodType::NonPerishable),
            20.0,
        );
        let heavier = estimate(
            Some(11.0),
            Some(VehicleType::Light),
            Some(GoodType::NonPerishable),
            20.0,
        );
        assert!(heavier >= lighter);
    }

    #[test]
    fn monotone_in_distance() {
        let shorter = estimate(
            Some(10.0),
            Some(VehicleType::Light),
            Some(GoodType::NonPerishable),
            20.0,
        );
        let longer = estimate(
            Some(10.0),
            Some(VehicleType::Light),
            Some(GoodType::NonPerishable),
            25.0,
        );
        assert!(longer >= shorter);
    }

    #[test]
    fn rounds_half_up_to_two_decimals() {
        assert_eq!(round2(10.125), 10.13);
        assert_eq!(round2(10.124), 10.12);
        // fractional distance flows through the rounding
        assert_eq!(estimate(None, None, None, 0.0125), 0.13);
    }

    #[test]
    fn format_cost_always_shows_two_decimals() {
        assert_eq!(format_cost(46_500.0), "46500.00");
        assert_eq!(format_cost(0.1), "0.10");
    }
}
