use crate::dashboard::prices::PriceSnapshot;
use crate::domain::dashboard::{AlertCondition, AlertTarget, UserAlert};

/// Whether `alert` fires at `price`. Inactive alerts never fire, and neither does
/// `sentiment_change`, which has no evaluator.
pub fn is_triggered(alert: &UserAlert, price: f64) -> bool {
    if !alert.is_active {
        return false;
    }
    match (alert.condition, &alert.target_value) {
        (AlertCondition::PriceAbove, AlertTarget::Price(target)) => price > *target,
        (AlertCondition::PriceBelow, AlertTarget::Price(target)) => price < *target,
        _ => false,
    }
}

/// Alerts that fire against the snapshot. Symbols without a snapshot price are skipped.
pub fn evaluate_alerts<'a>(alerts: &'a [UserAlert], prices: &PriceSnapshot) -> Vec<&'a UserAlert> {
    alerts
        .iter()
        .filter(|a| {
            prices
                .price(&a.stock_symbol)
                .is_some_and(|price| is_triggered(a, price))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(id: &str, symbol: &str, condition: AlertCondition, target: AlertTarget) -> UserAlert {
        UserAlert {
            id: id.to_string(),
            stock_symbol: symbol.to_string(),
            condition,
            target_value: target,
            is_active: true,
        }
    }

    #[test]
    fn price_conditions_are_strict() {
        let above = alert("1", "AAPL", AlertCondition::PriceAbove, AlertTarget::Price(150.0));
        assert!(is_triggered(&above, 150.01));
        assert!(!is_triggered(&above, 150.0));

        let below = alert("2", "AAPL", AlertCondition::PriceBelow, AlertTarget::Price(150.0));
        assert!(is_triggered(&below, 149.0));
        assert!(!is_triggered(&below, 151.0));
    }

    #[test]
    fn sentiment_change_and_inactive_alerts_never_fire() {
        let sentiment = alert(
            "3",
            "AAPL",
            AlertCondition::SentimentChange,
            AlertTarget::Label("positive".to_string()),
        );
        assert!(!is_triggered(&sentiment, 1_000.0));

        let mut inactive = alert("4", "AAPL", AlertCondition::PriceAbove, AlertTarget::Price(1.0));
        inactive.is_active = false;
        assert!(!is_triggered(&inactive, 1_000.0));
    }

    #[test]
    fn evaluation_uses_snapshot_prices() {
        let alerts = vec![
            alert("1", "AAPL", AlertCondition::PriceAbove, AlertTarget::Price(150.0)),
            alert("2", "MSFT", AlertCondition::PriceBelow, AlertTarget::Price(400.0)),
            alert("3", "NOPE", AlertCondition::PriceAbove, AlertTarget::Price(0.0)),
        ];
        let prices = PriceSnapshot::from_prices([
            ("AAPL".to_string(), 170.0),
            ("MSFT".to_string(), 430.0),
        ]);

        let fired: Vec<_> = evaluate_alerts(&alerts, &prices)
            .into_iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(fired, vec!["1"]);
    }
}
