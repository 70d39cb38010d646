//! Notification-worthiness decision.
//!
//! High-confidence detections always notify. Medium-confidence detections
//! notify only for the policy's tier and only for statuses on its allow-list.
//! Everything else is handed back with `notify = false` for logging.

use crate::config::NotificationPolicy;
use crate::types::{Confidence, Detection, SubscriptionTier};

#[derive(Clone, Debug, Default)]
pub struct NotificationDecisionEngine {
    policy: NotificationPolicy,
}

impl NotificationDecisionEngine {
    pub fn new(policy: NotificationPolicy) -> Self {
        Self { policy }
    }

    pub fn should_notify(&self, tier: SubscriptionTier, detection: &Detection) -> bool {
        match detection.confidence {
            Confidence::High => true,
            Confidence::Medium => {
                tier == self.policy.medium_confidence_tier
                    && self
                        .policy
                        .medium_confidence_statuses
                        .contains(&detection.status)
            }
        }
    }

    /// Returns every detection, each with its `notify` flag set by policy.
    pub fn decide(&self, tier: SubscriptionTier, detections: Vec<Detection>) -> Vec<Detection> {
        detections
            .into_iter()
            .map(|mut d| {
                d.notify = self.should_notify(tier, &d);
                d
            })
            .collect()
    }
}
