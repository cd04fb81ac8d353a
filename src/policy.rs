//! Filter policy: which detections survive a frame.
//!
//! A policy is built once at startup from the merged CLI/config settings and
//! is read-only afterwards. Decisions are made by two independent gates:
//!
//! 1. Confidence: anything strictly below `min_confidence` is dropped.
//! 2. Label: when an allow-set is configured, the normalized label must be in it.
//!
//! The confidence gate runs first because it is the cheaper comparison. The
//! gates are pure, so their order never changes the outcome.

use std::collections::BTreeSet;

use crate::error::PolicyError;
use crate::labels::normalize;

#[derive(Clone, Debug, PartialEq)]
pub struct FilterPolicy {
    allowed_labels: Option<BTreeSet<String>>,
    min_confidence: f64,
}

impl FilterPolicy {
    /// Build a policy from raw user labels and an optional threshold.
    ///
    /// Labels are normalized and deduplicated; empty entries are skipped. No
    /// labels (or only empty ones) means every label is accepted. A missing
    /// threshold defaults to 0.0. Negative thresholds are kept as-is, NaN and
    /// negative infinity are rejected.
    pub fn build<I, S>(
        raw_labels: Option<I>,
        min_confidence: Option<f64>,
    ) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let min_confidence = min_confidence.unwrap_or(0.0);
        if min_confidence.is_nan() || min_confidence == f64::NEG_INFINITY {
            return Err(PolicyError::InvalidConfidence(min_confidence));
        }

        let allowed_labels = raw_labels.and_then(|labels| {
            let set: BTreeSet<String> = labels
                .into_iter()
                .map(|label| normalize(label.as_ref()))
                .filter(|label| !label.is_empty())
                .collect();
            (!set.is_empty()).then_some(set)
        });

        let policy = Self {
            allowed_labels,
            min_confidence,
        };
        policy.log_summary();
        Ok(policy)
    }

    /// Policy that keeps everything.
    pub fn accept_all() -> Self {
        Self {
            allowed_labels: None,
            min_confidence: 0.0,
        }
    }

    pub fn allowed_labels(&self) -> Option<&BTreeSet<String>> {
        self.allowed_labels.as_ref()
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    /// True when there is no label gate and no positive threshold. Only
    /// detections scoring below a zero or negative threshold can still be
    /// rejected, so frame evaluation may skip per-detection label checks.
    pub fn is_pass_through(&self) -> bool {
        self.allowed_labels.is_none() && self.min_confidence <= 0.0
    }

    /// Decide whether a detection is kept. Confidence equal to the threshold is kept.
    pub fn should_keep(&self, label: &str, confidence: f64) -> bool {
        self.accepts_confidence(confidence) && self.accepts_label(label)
    }

    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn accepts_confidence(&self, confidence: f64) -> bool {
        !(confidence < self.min_confidence)
    }

    pub fn accepts_label(&self, label: &str) -> bool {
        match &self.allowed_labels {
            Some(allowed) => allowed.contains(&normalize(label)),
            None => true,
        }
    }

    fn log_summary(&self) {
        match &self.allowed_labels {
            Some(allowed) => {
                let labels: Vec<&str> = allowed.iter().map(String::as_str).collect();
                log::info!("filter: will only show {:?}", labels);
            }
            None => log::info!("filter: showing all detections"),
        }
        if self.min_confidence > 0.0 {
            log::info!("filter: minimum confidence {}", self.min_confidence);
        }
    }
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self::accept_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: &[&str] = &[
        "face", "Face", "faces", "person", "people", "car", "phone", " Cell Phone ", "", "dog",
    ];
    const CONFIDENCES: &[f64] = &[-1.0, 0.0, 0.1, 0.49, 0.5, 0.51, 0.8, 0.9, 1.0, f64::NAN];

    fn policies() -> Vec<FilterPolicy> {
        let mut out = Vec::new();
        for threshold in [-0.5, 0.0, 0.5, 0.8, 1.0] {
            out.push(FilterPolicy::build(None::<Vec<&str>>, Some(threshold)).unwrap());
            out.push(FilterPolicy::build(Some(["face"]), Some(threshold)).unwrap());
            out.push(FilterPolicy::build(Some(["phone", "person"]), Some(threshold)).unwrap());
        }
        out
    }

    #[test]
    fn collapses_synonyms_into_one_label() {
        let policy = FilterPolicy::build(Some(["Phone", "cellphone", "Cell_Phone"]), Some(0.5))
            .expect("policy");
        let expected: BTreeSet<String> = ["cell phone".to_string()].into_iter().collect();
        assert_eq!(policy.allowed_labels(), Some(&expected));
        assert_eq!(policy.min_confidence(), 0.5);
    }

    #[test]
    fn missing_or_empty_labels_accept_everything() {
        let none = FilterPolicy::build(None::<Vec<String>>, None).unwrap();
        assert!(none.allowed_labels().is_none());
        assert_eq!(none.min_confidence(), 0.0);

        let empty = FilterPolicy::build(Some(Vec::<String>::new()), None).unwrap();
        assert!(empty.allowed_labels().is_none());

        let blanks = FilterPolicy::build(Some(["", "  "]), None).unwrap();
        assert!(blanks.allowed_labels().is_none());
    }

    #[test]
    fn skips_empty_entries_among_real_labels() {
        let policy = FilterPolicy::build(Some(["", "Car", "people"]), None).unwrap();
        let labels: Vec<&String> = policy.allowed_labels().unwrap().iter().collect();
        assert_eq!(labels, vec!["car", "person"]);
    }

    #[test]
    fn rejects_nan_and_negative_infinity() {
        assert!(matches!(
            FilterPolicy::build(None::<Vec<&str>>, Some(f64::NAN)),
            Err(PolicyError::InvalidConfidence(_))
        ));
        assert_eq!(
            FilterPolicy::build(None::<Vec<&str>>, Some(f64::NEG_INFINITY)),
            Err(PolicyError::InvalidConfidence(f64::NEG_INFINITY))
        );
    }

    #[test]
    fn accepts_negative_threshold_as_is() {
        let policy = FilterPolicy::build(None::<Vec<&str>>, Some(-0.25)).unwrap();
        assert_eq!(policy.min_confidence(), -0.25);
        assert!(policy.should_keep("anything", 0.0));
        assert!(policy.is_pass_through());
    }

    #[test]
    fn threshold_tie_is_kept() {
        let policy = FilterPolicy::build(Some(["face"]), Some(0.5)).unwrap();
        assert!(policy.should_keep("face", 0.5));
        assert!(!policy.should_keep("face", 0.499));
    }

    #[test]
    fn detection_labels_are_normalized_before_matching() {
        let policy = FilterPolicy::build(Some(["cell phone", "person"]), None).unwrap();
        assert!(policy.should_keep("Mobile", 0.3));
        assert!(policy.should_keep("PEOPLE", 0.3));
        assert!(!policy.should_keep("car", 0.3));
    }

    #[test]
    fn gate_order_does_not_change_outcome() {
        for policy in policies() {
            for label in LABELS {
                for &confidence in CONFIDENCES {
                    let confidence_first = policy.should_keep(label, confidence);
                    let label_first =
                        policy.accepts_label(label) && policy.accepts_confidence(confidence);
                    assert_eq!(
                        confidence_first, label_first,
                        "label={label:?} confidence={confidence} policy={policy:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn below_threshold_is_always_dropped() {
        for policy in policies() {
            for label in LABELS {
                for &confidence in CONFIDENCES {
                    if confidence < policy.min_confidence() {
                        assert!(!policy.should_keep(label, confidence));
                    }
                }
            }
        }
    }

    #[test]
    fn pass_through_only_without_labels_or_threshold() {
        assert!(FilterPolicy::accept_all().is_pass_through());
        assert!(!FilterPolicy::build(Some(["car"]), None).unwrap().is_pass_through());
        assert!(!FilterPolicy::build(None::<Vec<&str>>, Some(0.1))
            .unwrap()
            .is_pass_through());
    }
}
