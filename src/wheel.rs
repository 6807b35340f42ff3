//! Wheel and wedge configuration
//!
//! Plain serializable data handed to the core by the preset/editor layer. The
//! kinematic fields (`current_angle`, `angular_velocity`) are live state that the
//! physics engine commits into once per frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ValidationError;
use crate::normalize_degrees;

/// One slice of a wheel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wedge {
    pub id: String,
    pub label: String,
    /// Selection weight for weighted outcomes (0 = never selected)
    pub weight: f64,
    /// CSS-style color string for the renderer
    #[serde(default)]
    pub color: String,
    /// Rendered angular size in degrees; may deliberately differ from the weight share
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_angle: Option<f64>,
    /// Media reference (image/video URL) resolved by the renderer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    /// Score value; falls back to the label parsed as an integer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,
}

impl Wedge {
    pub fn new(id: impl Into<String>, label: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            weight,
            color: String::new(),
            visual_angle: None,
            media: None,
            points: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_points(mut self, points: i64) -> Self {
        self.points = Some(points);
        self
    }

    pub fn with_visual_angle(mut self, degrees: f64) -> Self {
        self.visual_angle = Some(degrees);
        self
    }

    /// Score value of landing on this wedge
    pub fn score_value(&self) -> i64 {
        self.points
            .or_else(|| self.label.trim().parse::<i64>().ok())
            .unwrap_or(0)
    }

    /// Check the weight of the wedge at `index` on its wheel
    fn validate(&self, index: usize) -> Result<(), ValidationError> {
        if !self.weight.is_finite() {
            return Err(ValidationError::NonFiniteWeight { index });
        }
        if self.weight < 0.0 {
            return Err(ValidationError::NegativeWeight {
                index,
                weight: self.weight,
            });
        }
        Ok(())
    }
}

/// Role of a wheel in coupled play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WheelRole {
    /// Driver wheel, receives the power impulse
    Outer,
    /// Follower wheel, dragged by the clutch
    Inner,
}

impl WheelRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            WheelRole::Outer => "outer",
            WheelRole::Inner => "inner",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "outer" => Some(WheelRole::Outer),
            "inner" => Some(WheelRole::Inner),
            _ => None,
        }
    }
}

/// A spinning wheel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wheel {
    pub id: String,
    #[serde(default)]
    pub label: String,
    /// Explicit role; when absent the id or registration order decides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<WheelRole>,
    /// Wedges in clockwise order starting at 0°
    pub wedges: Vec<Wedge>,
    /// Fraction of angular velocity lost per step
    #[serde(default)]
    pub friction_coefficient: f64,
    /// Coupling to the outer wheel (inner only, 0 = free, 1 = locked)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clutch_ratio: Option<f64>,
    pub radius: f64,
    #[serde(default)]
    pub position: Vec2,
    /// Degrees, [0, 360)
    #[serde(default)]
    pub current_angle: f64,
    /// Degrees per second, signed (positive = clockwise)
    #[serde(default)]
    pub angular_velocity: f64,
}

impl Wheel {
    pub fn new(id: impl Into<String>, wedges: Vec<Wedge>, radius: f64) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            role: None,
            wedges,
            friction_coefficient: 0.0,
            clutch_ratio: None,
            radius,
            position: Vec2::ZERO,
            current_angle: 0.0,
            angular_velocity: 0.0,
        }
    }

    pub fn with_role(mut self, role: WheelRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_friction(mut self, friction: f64) -> Self {
        self.friction_coefficient = friction;
        self
    }

    pub fn with_clutch_ratio(mut self, ratio: f64) -> Self {
        self.clutch_ratio = Some(ratio);
        self
    }

    /// Default outer wheel with numbered wedges
    pub fn default_outer(wedge_count: usize) -> Self {
        Self::new("outer", numbered_wedges("o", wedge_count), DEFAULT_OUTER_RADIUS)
            .with_role(WheelRole::Outer)
            .with_friction(0.02)
    }

    /// Default inner wheel with numbered wedges
    pub fn default_inner(wedge_count: usize) -> Self {
        Self::new("inner", numbered_wedges("i", wedge_count), DEFAULT_INNER_RADIUS)
            .with_role(WheelRole::Inner)
            .with_friction(0.02)
            .with_clutch_ratio(0.5)
    }

    /// Clutch ratio, 0 when unset
    pub fn clutch(&self) -> f64 {
        self.clutch_ratio.unwrap_or(0.0)
    }

    pub fn wedge_weights(&self) -> Vec<f64> {
        self.wedges.iter().map(|w| w.weight).collect()
    }

    /// Moment of inertia of a unit-mass disk of this radius
    pub fn inertia(&self) -> f64 {
        0.5 * self.radius * self.radius
    }

    /// Reset kinematics to rest at the given angle
    pub fn settle_at(&mut self, angle: f64) {
        self.current_angle = normalize_degrees(angle);
        self.angular_velocity = 0.0;
    }

    /// Check configuration invariants
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.wedges.is_empty() {
            return Err(ValidationError::EmptyWedgeSet {
                wheel_id: self.id.clone(),
            });
        }
        for (index, wedge) in self.wedges.iter().enumerate() {
            wedge.validate(index).map_err(|e| ValidationError::InvalidWedge {
                wheel_id: self.id.clone(),
                wedge_id: wedge.id.clone(),
                source: Box::new(e),
            })?;
        }
        if !self.friction_coefficient.is_finite() || self.friction_coefficient < 0.0 {
            return Err(ValidationError::InvalidFriction {
                wheel_id: self.id.clone(),
                value: self.friction_coefficient,
            });
        }
        if let Some(clutch) = self.clutch_ratio {
            if !(0.0..=1.0).contains(&clutch) {
                return Err(ValidationError::InvalidClutchRatio {
                    wheel_id: self.id.clone(),
                    value: clutch,
                });
            }
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(ValidationError::InvalidRadius {
                wheel_id: self.id.clone(),
                value: self.radius,
            });
        }
        Ok(())
    }
}

fn numbered_wedges(prefix: &str, count: usize) -> Vec<Wedge> {
    (0..count)
        .map(|i| Wedge::new(format!("{}{}", prefix, i), ((i + 1) * 10).to_string(), 1.0))
        .collect()
}

/// The two coupled wheels of a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelPair {
    pub outer: Wheel,
    pub inner: Wheel,
}

impl WheelPair {
    pub fn new(outer: Wheel, inner: Wheel) -> Self {
        Self { outer, inner }
    }

    /// Resolve roles and validate both wheels
    ///
    /// An explicit `role` wins, then the conventional ids `outer`/`inner`, then
    /// registration order for whatever is left.
    pub fn from_wheels(wheels: Vec<Wheel>) -> Result<Self, ValidationError> {
        if wheels.len() != 2 {
            return Err(ValidationError::WheelCount(wheels.len()));
        }

        let mut roles: Vec<Option<WheelRole>> = wheels
            .iter()
            .map(|w| w.role.or_else(|| WheelRole::from_str(&w.id)))
            .collect();

        if roles[0].is_some() && roles[0] == roles[1] {
            let role = roles[0].map(|r| r.as_str()).unwrap_or("outer");
            return Err(ValidationError::DuplicateRole(role));
        }

        // Fill the gaps in registration order
        for i in 0..2 {
            if roles[i].is_none() {
                let taken = roles[1 - i];
                roles[i] = Some(match taken {
                    Some(WheelRole::Outer) => WheelRole::Inner,
                    Some(WheelRole::Inner) => WheelRole::Outer,
                    None if i == 0 => WheelRole::Outer,
                    None => WheelRole::Inner,
                });
            }
        }

        let mut outer = None;
        let mut inner = None;
        for (mut wheel, role) in wheels.into_iter().zip(roles) {
            wheel.validate()?;
            wheel.role = role;
            match role {
                Some(WheelRole::Inner) => inner = Some(wheel),
                _ => outer = Some(wheel),
            }
        }

        match (outer, inner) {
            (Some(outer), Some(inner)) => Ok(Self { outer, inner }),
            _ => Err(ValidationError::DuplicateRole("outer")),
        }
    }

    pub fn get(&self, role: WheelRole) -> &Wheel {
        match role {
            WheelRole::Outer => &self.outer,
            WheelRole::Inner => &self.inner,
        }
    }

    pub fn get_mut(&mut self, role: WheelRole) -> &mut Wheel {
        match role {
            WheelRole::Outer => &mut self.outer,
            WheelRole::Inner => &mut self.inner,
        }
    }

    /// Both wheels at rest
    pub fn stop(&mut self) {
        self.outer.angular_velocity = 0.0;
        self.inner.angular_velocity = 0.0;
    }
}
