//! Adoption advice from the treatment comparisons

use serde::{Deserialize, Serialize};

use crate::significance::{SignificanceSummary, TreatmentTest};

const NEXT_STEPS: [&str; 4] = [
    "Run a longer-term test (3-6 months) to validate results",
    "Monitor for any negative impacts on project quality",
    "Consider segmenting by project type or teacher experience",
    "Implement gradual rollout to minimize risk",
];

const RISK_MITIGATION: [&str; 4] = [
    "Provide clear guidelines to teachers about text length requirements",
    "Offer writing assistance or templates for teachers",
    "Monitor teacher feedback and satisfaction",
    "Have a rollback plan if negative effects are observed",
];

/// A treatment singled out by the recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentPick {
    pub label: String,
    pub display_name: String,
    pub treatment_rate: f64,
    pub effect_size: f64,
    pub p_value: f64,
    pub significant: bool,
}

impl From<&TreatmentTest> for TreatmentPick {
    fn from(test: &TreatmentTest) -> Self {
        Self {
            label: test.label.clone(),
            display_name: test.display_name.clone(),
            treatment_rate: test.treatment_rate(),
            effect_size: test.effect_size(),
            p_value: test.comparison.p_value,
            significant: test.significant(),
        }
    }
}

/// Best and worst treatment plus the resulting advice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendations {
    pub best: TreatmentPick,
    pub worst: TreatmentPick,
    /// The best treatment beat the control significantly
    pub adopt: bool,
    pub actions: Vec<String>,
    pub next_steps: Vec<String>,
    pub risk_mitigation: Vec<String>,
}

/// Pick the best and worst treatment by approval rate and advise on adoption
///
/// Ties go to the earlier group. Returns `None` without treatments.
pub fn recommend(significance: &SignificanceSummary) -> Option<Recommendations> {
    let first = significance.tests.first()?;
    let (best, worst) = significance.tests.iter().skip(1).fold(
        (first, first),
        |(best, worst), test| {
            let best = if test.treatment_rate() > best.treatment_rate() {
                test
            } else {
                best
            };
            let worst = if test.treatment_rate() < worst.treatment_rate() {
                test
            } else {
                worst
            };
            (best, worst)
        },
    );

    let adopt = best.significant() && best.effect_size() > 0.0;
    let actions = if adopt {
        vec![
            format!("Implement {} as the new standard", best.display_name),
            format!(
                "Expected improvement: {:.2}% in approval rate",
                best.effect_size() * 100.0
            ),
        ]
    } else if best.significant() {
        vec![
            "No treatment improved on the control".to_string(),
            "Keep the current essay requirements".to_string(),
        ]
    } else {
        vec![
            "No statistically significant improvement found".to_string(),
            "Consider running the test longer or with larger sample sizes".to_string(),
        ]
    };

    tracing::debug!(best = %best.label, worst = %worst.label, adopt, "recommendation");

    Some(Recommendations {
        best: best.into(),
        worst: worst.into(),
        adopt,
        actions,
        next_steps: NEXT_STEPS.iter().map(|s| s.to_string()).collect(),
        risk_mitigation: RISK_MITIGATION.iter().map(|s| s.to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use abtext_stats::{compare_proportions, ProportionSample};

    fn test_for(label: &str, successes: u64, alpha: f64) -> TreatmentTest {
        let control = ProportionSample::new(500, 1000).unwrap();
        let treatment = ProportionSample::new(successes, 1000).unwrap();
        TreatmentTest {
            label: label.to_string(),
            name: format!("Treatment {}", label),
            display_name: format!("Treatment {} (800 chars)", label),
            min_essay_length: 800,
            treatment,
            comparison: compare_proportions(&control, &treatment, alpha).unwrap(),
        }
    }

    fn summary(tests: Vec<TreatmentTest>) -> SignificanceSummary {
        SignificanceSummary {
            alpha: 0.05,
            control_label: "A".to_string(),
            control: ProportionSample::new(500, 1000).unwrap(),
            control_rate: 0.5,
            tests,
        }
    }

    #[test]
    fn test_significant_improvement_is_adopted() {
        let recs = recommend(&summary(vec![
            test_for("B", 480, 0.05),
            test_for("C", 600, 0.05),
            test_for("D", 450, 0.05),
        ]))
        .unwrap();

        assert_eq!(recs.best.label, "C");
        assert_eq!(recs.worst.label, "D");
        assert!(recs.adopt);
        assert_eq!(recs.actions[0], "Implement Treatment C (800 chars) as the new standard");
        assert_eq!(recs.actions[1], "Expected improvement: 10.00% in approval rate");
        assert_eq!(recs.next_steps.len(), 4);
        assert_eq!(recs.risk_mitigation.len(), 4);
    }

    #[test]
    fn test_insignificant_best_is_not_adopted() {
        let recs = recommend(&summary(vec![test_for("B", 505, 0.05), test_for("C", 495, 0.05)]))
            .unwrap();
        assert_eq!(recs.best.label, "B");
        assert!(!recs.best.significant);
        assert!(!recs.adopt);
        assert_eq!(recs.actions[0], "No statistically significant improvement found");
    }

    #[test]
    fn test_significant_decline_is_not_adopted() {
        let recs = recommend(&summary(vec![test_for("B", 400, 0.05), test_for("C", 350, 0.05)]))
            .unwrap();
        assert_eq!(recs.best.label, "B");
        assert!(recs.best.significant);
        assert!(recs.best.effect_size < 0.0);
        assert!(!recs.adopt);
    }

    #[test]
    fn test_ties_keep_first_group() {
        let recs = recommend(&summary(vec![test_for("B", 500, 0.05), test_for("C", 500, 0.05)]))
            .unwrap();
        assert_eq!(recs.best.label, "B");
        assert_eq!(recs.worst.label, "B");
    }

    #[test]
    fn test_no_treatments() {
        assert!(recommend(&summary(Vec::new())).is_none());
    }
}
