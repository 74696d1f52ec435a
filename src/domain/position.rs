//! Per-symbol position with weighted-average cost basis.

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64,
    pub avg_price: f64,
}

impl Position {
    pub fn flat(symbol: impl Into<String>) -> Self {
        Position {
            symbol: symbol.into(),
            quantity: 0.0,
            avg_price: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == 0.0
    }

    /// Signed mark-to-market value; shorts are negative.
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    /// Apply a fill of `signed_quantity` at `price`.
    ///
    /// Buys re-weight the average over the combined quantity, landing on
    /// zero when the buy exactly flattens the position. Sells leave the
    /// average untouched.
    pub fn apply_fill(&mut self, signed_quantity: f64, price: f64) {
        if signed_quantity > 0.0 {
            let denom = self.quantity + signed_quantity;
            self.avg_price = if denom == 0.0 {
                0.0
            } else {
                (self.quantity * self.avg_price + signed_quantity * price) / denom
            };
        }
        self.quantity += signed_quantity;
    }

    /// Algebraic inverse of [`apply_fill`](Self::apply_fill) against the
    /// current book. A buy's weighting is unwound out of the average; a
    /// sell only gives the quantity back.
    pub fn revert_fill(&mut self, signed_quantity: f64, price: f64) {
        let remaining = self.quantity - signed_quantity;
        if signed_quantity > 0.0 {
            self.avg_price = if remaining == 0.0 {
                0.0
            } else {
                (self.quantity * self.avg_price - signed_quantity * price) / remaining
            };
        }
        self.quantity = remaining;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_buy_sets_avg_price() {
        let mut pos = Position::flat("AAA");
        pos.apply_fill(100.0, 50.0);
        assert_eq!(pos.quantity, 100.0);
        assert_eq!(pos.avg_price, 50.0);
    }

    #[test]
    fn second_buy_weights_average() {
        let mut pos = Position::flat("AAA");
        pos.apply_fill(100.0, 50.0);
        pos.apply_fill(100.0, 60.0);
        assert_eq!(pos.quantity, 200.0);
        assert!((pos.avg_price - 55.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sell_keeps_avg_price() {
        let mut pos = Position::flat("AAA");
        pos.apply_fill(100.0, 50.0);
        pos.apply_fill(-40.0, 55.0);
        assert_eq!(pos.quantity, 60.0);
        assert_eq!(pos.avg_price, 50.0);
    }

    #[test]
    fn opening_short_keeps_zero_avg() {
        let mut pos = Position::flat("AAA");
        pos.apply_fill(-10.0, 30.0);
        assert_eq!(pos.quantity, -10.0);
        assert_eq!(pos.avg_price, 0.0);
    }

    #[test]
    fn buy_that_flattens_short_resets_avg() {
        let mut pos = Position {
            symbol: "AAA".into(),
            quantity: -10.0,
            avg_price: 30.0,
        };
        pos.apply_fill(10.0, 25.0);
        assert!(pos.is_flat());
        assert_eq!(pos.avg_price, 0.0);
    }

    #[test]
    fn buy_covering_part_of_short_uses_signed_weights() {
        // (-10 * 30 + 4 * 25) / -6
        let mut pos = Position {
            symbol: "AAA".into(),
            quantity: -10.0,
            avg_price: 30.0,
        };
        pos.apply_fill(4.0, 25.0);
        assert_eq!(pos.quantity, -6.0);
        assert!((pos.avg_price - (-300.0 + 100.0) / -6.0).abs() < 1e-12);
    }

    #[test]
    fn market_value_is_signed() {
        let pos = Position {
            symbol: "AAA".into(),
            quantity: -100.0,
            avg_price: 100.0,
        };
        assert!((pos.market_value(90.0) + 9000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn revert_unwinds_a_buy_from_the_average() {
        let mut pos = Position::flat("AAA");
        pos.apply_fill(10.0, 10.0);
        pos.apply_fill(5.0, 20.0);
        pos.revert_fill(10.0, 10.0);
        assert_eq!(pos.quantity, 5.0);
        assert!((pos.avg_price - 20.0).abs() < 1e-9);
    }

    #[test]
    fn revert_of_a_sell_gives_quantity_back() {
        let mut pos = Position::flat("AAA");
        pos.apply_fill(100.0, 50.0);
        pos.apply_fill(-40.0, 55.0);
        pos.revert_fill(-40.0, 55.0);
        assert_eq!(pos.quantity, 100.0);
        assert_eq!(pos.avg_price, 50.0);
    }

    #[test]
    fn revert_to_flat_resets_avg() {
        let mut pos = Position::flat("AAA");
        pos.apply_fill(3.0, 7.0);
        pos.revert_fill(3.0, 7.0);
        assert!(pos.is_flat());
        assert_eq!(pos.avg_price, 0.0);
    }
}
