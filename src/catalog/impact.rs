use serde::Serialize;

use crate::error::{ReachPosterError, Result};

pub const IMPACT_PRESETS: [u64; 6] = [25, 50, 100, 250, 500, 1000];

#[derive(Debug, Clone, Copy)]
struct ImpactMetric {
    key: &'static str,
    title: &'static str,
    cost_per_unit: u64,
    unit: &'static str,
    icon: &'static str,
    description: &'static str,
}

const IMPACT_METRICS: [ImpactMetric; 5] = [
    ImpactMetric {
        key: "counseling",
        title: "Counseling",
        cost_per_unit: 25,
        unit: "hour",
        icon: "💜",
        description: "of professional counseling",
    },
    ImpactMetric {
        key: "shelter_night",
        title: "Shelter Night",
        cost_per_unit: 75,
        unit: "night",
        icon: "🏠",
        description: "of safe shelter for a family",
    },
    ImpactMetric {
        key: "crisis_calls",
        title: "Crisis Calls",
        cost_per_unit: 15,
        unit: "call",
        icon: "📞",
        description: "answered on our 24/7 hotline",
    },
    ImpactMetric {
        key: "safety_plan",
        title: "Safety Plan",
        cost_per_unit: 100,
        unit: "session",
        icon: "📋",
        description: "safety planning session",
    },
    ImpactMetric {
        key: "children_program",
        title: "Children Program",
        cost_per_unit: 40,
        unit: "session",
        icon: "👧",
        description: "of children's therapeutic programming",
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct Impact {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: &'static str,
    pub units: u64,
    pub unit_name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImpactReport {
    pub amount: u64,
    pub formatted_amount: String,
    pub impacts: Vec<Impact>,
    pub primary_impact: Option<Impact>,
    pub suggested_caption: String,
    pub presets: [u64; 6],
}

fn plural(units: u64) -> &'static str {
    if units > 1 {
        "s"
    } else {
        ""
    }
}

fn impact_for(metric: &ImpactMetric, amount: u64) -> Option<Impact> {
    let units = amount / metric.cost_per_unit;
    (units > 0).then(|| Impact {
        kind: metric.key,
        title: metric.title,
        units,
        unit_name: metric.unit,
        icon: metric.icon,
        description: metric.description,
        message: format!(
            "{} {units} {}{} {}",
            metric.icon,
            metric.unit,
            plural(units),
            metric.description
        ),
    })
}

/// What a donation buys. A known `impact_type` limits the breakdown to that metric.
pub fn calculate_impact(amount: f64, impact_type: Option<&str>) -> Result<ImpactReport> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ReachPosterError::Validation(
            "A positive donation amount is required".to_string(),
        ));
    }
    let amount = amount.trunc() as u64;
    let selected = impact_type.and_then(|kind| IMPACT_METRICS.iter().find(|m| m.key == kind));

    let impacts: Vec<Impact> = match selected {
        Some(metric) => impact_for(metric, amount).into_iter().collect(),
        None => IMPACT_METRICS
            .iter()
            .filter_map(|metric| impact_for(metric, amount))
            .collect(),
    };

    // First metric wins ties.
    let primary_impact = impacts
        .iter()
        .fold(None::<&Impact>, |best, impact| match best {
            Some(best) if best.units >= impact.units => Some(best),
            _ => Some(impact),
        })
        .cloned();

    let suggested_caption = primary_impact
        .as_ref()
        .map(|p| {
            format!(
                "Your gift of ${amount} can provide {} {}{} {}. Every dollar makes a difference \
                 in the lives of survivors. 💜 Donate at dvccc.com/donate",
                p.units,
                p.unit_name,
                plural(p.units),
                p.description
            )
        })
        .unwrap_or_default();

    Ok(ImpactReport {
        amount,
        formatted_amount: format!("${}", thousands(amount)),
        impacts,
        primary_impact,
        suggested_caption,
        presets: IMPACT_PRESETS,
    })
}

fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hundred_dollars_breaks_down_across_metrics() {
        let report = calculate_impact(100.0, None).expect("report");
        let units: Vec<(&str, u64)> = report.impacts.iter().map(|i| (i.kind, i.units)).collect();
        assert_eq!(
            units,
            vec![
                ("counseling", 4),
                ("shelter_night", 1),
                ("crisis_calls", 6),
                ("safety_plan", 1),
                ("children_program", 2),
            ]
        );
        let primary = report.primary_impact.expect("primary");
        assert_eq!(primary.kind, "crisis_calls");
        assert!(report
            .suggested_caption
            .starts_with("Your gift of $100 can provide 6 calls answered on our 24/7 hotline."));
        assert_eq!(report.impacts[1].message, "🏠 1 night of safe shelter for a family");
    }

    #[test]
    fn specific_type_and_small_amounts() {
        let report = calculate_impact(60.0, Some("counseling")).expect("report");
        assert_eq!(report.impacts.len(), 1);
        assert_eq!(report.impacts[0].units, 2);

        let tiny = calculate_impact(10.0, None).expect("report");
        assert!(tiny.impacts.is_empty());
        assert!(tiny.primary_impact.is_none());
        assert!(tiny.suggested_caption.is_empty());
    }

    #[test]
    fn rejects_non_positive_amounts() {
        assert!(calculate_impact(0.0, None).is_err());
        assert!(calculate_impact(-5.0, None).is_err());
    }

    #[test]
    fn amounts_are_formatted_with_separators() {
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(250), "250");
        assert_eq!(thousands(1234567), "1,234,567");
    }
}
