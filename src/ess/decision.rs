//! Emit-or-suppress decision for value-driven triggers.
//!
//! Evaluated on every poll while a channel is value driven. Vector values are
//! compared per component; the notification is suppressed only when no
//! component satisfies the condition.
//!
//! Comparisons take the sample on the left and the threshold on the right:
//! `LessThan` notifies while `sample < threshold`.

use super::codec::Value;
use super::trigger::Condition;

/// Outcome of one poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    /// Whether the sample should be pushed to the subscriber
    pub notify: bool,
    /// Value the channel stores after this poll
    pub value: Value,
}

/// Decide whether `sample` should be notified.
///
/// `stored` is the channel's current value (compared for [`Condition::OnChange`]),
/// `threshold` the configured operand for the comparison conditions. Any
/// condition outside `OnChange..=Equal` falls back to "not equal".
pub fn decide(condition: Condition, sample: Value, stored: Value, threshold: Value) -> Decision {
    let notify = match condition {
        Condition::OnChange => any_component(&sample, &stored, |s, v| s != v),
        Condition::LessThan => any_component(&sample, &threshold, |s, t| s < t),
        Condition::LessOrEqual => any_component(&sample, &threshold, |s, t| s <= t),
        Condition::GreaterThan => any_component(&sample, &threshold, |s, t| s > t),
        Condition::GreaterOrEqual => any_component(&sample, &threshold, |s, t| s >= t),
        Condition::Equal => any_component(&sample, &threshold, |s, t| s == t),
        _ => any_component(&sample, &threshold, |s, t| s != t),
    };

    Decision {
        notify,
        value: sample,
    }
}

fn any_component(sample: &Value, operand: &Value, test: impl Fn(i64, i64) -> bool) -> bool {
    if sample.dims() != operand.dims() {
        // A stored value of a different shape always counts as a change
        return true;
    }
    sample
        .components()
        .iter()
        .zip(operand.components())
        .any(|(s, o)| test(*s, *o))
}
