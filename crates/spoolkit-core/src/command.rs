//! Emitted ring rotation commands.
//!
//! Commands are produced in thread-path order. Each feed command records the
//! absolute ring angle it leaves the mechanism in; that angle is the chain
//! state the next command starts from.

use serde::{Deserialize, Serialize};

/// One solved feed move: rotate the ring and set the feed height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedCommand {
    /// Relative feed delta in steps, rounded to two decimals.
    /// Positive rotates the ring clockwise.
    pub steps: f64,
    /// Target feed height (mm), interpolated at the spool point.
    pub z: f64,
    /// Both circle intersection candidates, in root order.
    pub candidates: [(f64, f64); 2],
    /// The selected spool point (farther from the segment start).
    pub spool_point: (f64, f64),
    /// Ring angle before this command (radians).
    pub theta_before: f64,
    /// Ring angle after this command (radians).
    pub theta_after: f64,
}

/// One emitted instruction block for the thread feed mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RotationCommand {
    /// Rotate to a new spool point and set the feed height.
    Feed(FeedCommand),
    /// Anchor lock at a gap: over-rotate by `steps`, then rotate back.
    Lock {
        /// Signed over-rotation magnitude in steps.
        steps: f64,
    },
}

impl RotationCommand {
    /// The absolute ring angle this command leaves the system in, if it
    /// changes the angle.
    pub fn theta_after(&self) -> Option<f64> {
        match self {
            RotationCommand::Feed(feed) => Some(feed.theta_after),
            RotationCommand::Lock { .. } => None,
        }
    }

    /// The contained feed command, if this is one.
    pub fn as_feed(&self) -> Option<&FeedCommand> {
        match self {
            RotationCommand::Feed(feed) => Some(feed),
            RotationCommand::Lock { .. } => None,
        }
    }
}
