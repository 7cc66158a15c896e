use crate::sim::assets::GridSpec;
use crate::sim::limits::clamp;

/// Outcome of settling the remaining balance against the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridDispatch {
    /// Grid interface power (kW; positive=feed-in, negative=import).
    pub interface_kw: f64,
    /// Balance the clamped interface could not take (kW, >= 0).
    pub curtailment_kw: f64,
}

/// Point of connection with import and export limits.
///
/// Interface convention:
/// - Positive values feed power into the grid (export)
/// - Negative values draw power from the grid (import)
#[derive(Debug, Clone)]
pub struct GridConnection {
    supply_capacity_kw: f64,
    feedin_capacity_kw: f64,
}

impl GridConnection {
    /// Creates a connection with the given import and export limits.
    pub fn new(spec: &GridSpec) -> Self {
        Self {
            supply_capacity_kw: spec.supply_capacity_kw,
            feedin_capacity_kw: spec.feedin_capacity_kw,
        }
    }

    /// Returns the maximum import limit in kW.
    pub fn supply_capacity_kw(&self) -> f64 {
        self.supply_capacity_kw
    }

    /// Limits an interface value to `[-supply, feedin]`.
    pub fn limit(&self, interface_kw: f64) -> f64 {
        clamp(interface_kw, -self.supply_capacity_kw, self.feedin_capacity_kw)
    }

    /// Settles a power balance that does not include the grid yet.
    ///
    /// The grid takes the opposite of the balance within its limits.
    pub fn settle(&self, power_balance_kw: f64) -> GridDispatch {
        let desired_kw = -power_balance_kw;
        let interface_kw = self.limit(desired_kw);
        GridDispatch {
            interface_kw,
            curtailment_kw: -(desired_kw - interface_kw).min(0.0) + 0.0,
        }
    }

    /// Settles a power balance from which the full supply capacity was
    /// already subtracted to leave headroom for battery charging.
    ///
    /// Supply is cut back by whatever the site did not absorb; an excess that
    /// cannot even be exported with zero import is curtailed.
    pub fn settle_with_reserved_supply(&self, power_balance_kw: f64) -> GridDispatch {
        let curtailment_kw =
            (-self.supply_capacity_kw - self.feedin_capacity_kw - power_balance_kw).max(0.0);
        let interface_kw =
            self.limit(-(self.supply_capacity_kw + power_balance_kw + curtailment_kw));
        GridDispatch {
            interface_kw,
            curtailment_kw,
        }
    }

    /// Import part of an interface value as positive kW, bounded by the
    /// supply capacity. Zero while exporting.
    pub fn import_kw(&self, interface_kw: f64) -> f64 {
        -(-self.supply_capacity_kw).max(interface_kw)
    }
}
