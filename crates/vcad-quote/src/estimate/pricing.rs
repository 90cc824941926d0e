//! Cost build-up and the minimum-price policy.

use serde::{Deserialize, Serialize};

use crate::config::{MachineSettings, MaterialSettings, PricingPolicy};

/// Per-unit costs in euros.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Filament.
    pub material: f64,
    /// Printing plus heat-up energy.
    pub electricity: f64,
    /// Wear on replacement parts.
    pub machine: f64,
    /// Sum of the three above.
    pub base: f64,
    /// Margin for failed prints.
    pub error_margin: f64,
    /// `base + error_margin`.
    pub safe: f64,
    /// Price charged per unit before supplies.
    pub retail: f64,
}

/// Compute per-unit costs from weight (g) and print time (h).
pub fn compute_costs(
    weight_grams: f64,
    hours: f64,
    material: &MaterialSettings,
    machine: &MachineSettings,
    pricing: &PricingPolicy,
) -> CostBreakdown {
    let material_cost = weight_grams / 1000.0 * material.cost_per_kg;

    let printing = hours * machine.printer_power_kw * machine.electricity_price;
    let heating = machine.heating_minutes / 60.0
        * (machine.printer_power_kw + machine.bed_power_kw)
        * machine.electricity_price;
    let electricity = printing + heating;

    let machine_cost = if machine.lifespan_hours > 0.0 {
        hours * machine.replacement_parts_cost / machine.lifespan_hours
    } else {
        0.0
    };

    let base = material_cost + electricity + machine_cost;
    let error_margin = base * pricing.error_margin_percent / 100.0;
    let safe = base + error_margin;
    let retail = if pricing.profit_multiplier > 0.0 {
        safe * pricing.profit_multiplier
    } else {
        safe
    };

    CostBreakdown {
        material: material_cost,
        electricity,
        machine: machine_cost,
        base,
        error_margin,
        safe,
        retail,
    }
}

/// Order total for `quantity` units at `retail` each.
///
/// The minimum price is charged at most once per order: only the first unit
/// is lifted to the minimum, the rest pay their own price. A quantity of
/// zero is treated as one.
pub fn apply_minimum_price(retail: f64, quantity: u32, pricing: &PricingPolicy) -> f64 {
    let quantity = quantity.max(1);
    let supplies = pricing.supplies_cost;
    let per_unit = retail + supplies;

    if quantity == 1 {
        retail.max(pricing.minimum_price) + supplies
    } else if per_unit < pricing.minimum_price {
        (pricing.minimum_price + supplies) + f64::from(quantity - 1) * per_unit
    } else {
        per_unit * f64::from(quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn policy(minimum: f64, supplies: f64) -> PricingPolicy {
        PricingPolicy {
            minimum_price: minimum,
            supplies_cost: supplies,
            ..Default::default()
        }
    }

    #[test]
    fn test_minimum_charged_once() {
        assert_relative_eq!(apply_minimum_price(4.0, 3, &policy(5.0, 0.0)), 13.0);
    }

    #[test]
    fn test_single_unit_lifted_to_minimum() {
        assert_relative_eq!(apply_minimum_price(2.0, 1, &policy(5.0, 0.5)), 5.5);
        assert_relative_eq!(apply_minimum_price(7.0, 1, &policy(5.0, 0.5)), 7.5);
    }

    #[test]
    fn test_above_minimum_multiplies() {
        assert_relative_eq!(apply_minimum_price(6.0, 4, &policy(5.0, 1.0)), 28.0);
    }

    #[test]
    fn test_zero_quantity_is_one() {
        let p = policy(5.0, 0.0);
        assert_eq!(apply_minimum_price(2.0, 0, &p), apply_minimum_price(2.0, 1, &p));
    }

    #[test]
    fn test_cost_build_up() {
        let material = MaterialSettings::pla();
        let machine = MachineSettings::default();
        let pricing = PricingPolicy::default();
        let c = compute_costs(50.0, 2.0, &material, &machine, &pricing);

        // 50 g of €20/kg filament
        assert_relative_eq!(c.material, 1.0);
        // 2 h × 0.12 kW × 0.25 + 5/60 h × 0.27 kW × 0.25
        assert_relative_eq!(c.electricity, 0.06 + 5.0 / 60.0 * 0.27 * 0.25, epsilon = 1e-12);
        // 2 h × 250 / 5000
        assert_relative_eq!(c.machine, 0.1);
        assert_relative_eq!(c.base, c.material + c.electricity + c.machine);
        assert_relative_eq!(c.safe, c.base * 1.1, epsilon = 1e-12);
        assert_relative_eq!(c.retail, c.safe * 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_no_markup_when_multiplier_disabled() {
        let pricing = PricingPolicy {
            profit_multiplier: 0.0,
            ..Default::default()
        };
        let c = compute_costs(
            10.0,
            1.0,
            &MaterialSettings::pla(),
            &MachineSettings::default(),
            &pricing,
        );
        assert_eq!(c.retail, c.safe);
    }
}
