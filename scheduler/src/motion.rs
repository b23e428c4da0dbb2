//! Declarative motion presets handed to the rendering sink.
//!
//! Transitions are clamped before use: tweens to 5s, springs to a stiffness of
//! 1000 and a damping of 100. Under reduced motion every preset collapses to an
//! instant transition that starts at its end state.

use std::time::Duration;

use crate::types::MotionPreference;

pub const MAX_DURATION: Duration = Duration::from_secs(5);
pub const MAX_STIFFNESS: f64 = 1000.0;
pub const MAX_DAMPING: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    CubicBezier([f64; 4]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    Instant,
    Tween { duration: Duration, easing: Easing },
    Spring { stiffness: f64, damping: f64, mass: f64 },
}

impl Transition {
    pub const DEFAULT: Transition = Transition::Tween {
        duration: Duration::from_millis(300),
        easing: Easing::EaseInOut,
    };
    pub const SPRING: Transition = Transition::Spring {
        stiffness: 300.0,
        damping: 30.0,
        mass: 1.0,
    };
    pub const BOUNCE: Transition = Transition::Spring {
        stiffness: 400.0,
        damping: 10.0,
        mass: 0.8,
    };
    pub const SMOOTH: Transition = Transition::Tween {
        duration: Duration::from_millis(500),
        easing: Easing::CubicBezier([0.4, 0.0, 0.2, 1.0]),
    };
    pub const FAST: Transition = Transition::Tween {
        duration: Duration::from_millis(150),
        easing: Easing::EaseOut,
    };
    pub const SLOW: Transition = Transition::Tween {
        duration: Duration::from_millis(800),
        easing: Easing::EaseInOut,
    };

    /// Clamps out-of-range parameters. Non-finite spring values fall back to
    /// the default spring.
    pub fn sanitized(self) -> Self {
        match self {
            Transition::Instant => Transition::Instant,
            Transition::Tween { duration, easing } => Transition::Tween {
                duration: duration.min(MAX_DURATION),
                easing,
            },
            Transition::Spring {
                stiffness,
                damping,
                mass,
            } => {
                if !(stiffness.is_finite() && damping.is_finite() && mass.is_finite()) {
                    return Transition::SPRING;
                }
                Transition::Spring {
                    stiffness: stiffness.clamp(0.0, MAX_STIFFNESS),
                    damping: damping.clamp(0.0, MAX_DAMPING),
                    mass: if mass > 0.0 { mass } else { 1.0 },
                }
            }
        }
    }
}

impl Default for Transition {
    fn default() -> Self {
        Transition::DEFAULT
    }
}

/// A set of animatable properties. `None` leaves a property untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VisualState {
    pub opacity: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub scale: Option<f64>,
    pub rotate_x: Option<f64>,
}

impl VisualState {
    pub const fn new() -> Self {
        Self {
            opacity: None,
            x: None,
            y: None,
            scale: None,
            rotate_x: None,
        }
    }

    pub const fn opacity(mut self, v: f64) -> Self {
        self.opacity = Some(v);
        self
    }

    pub const fn x(mut self, v: f64) -> Self {
        self.x = Some(v);
        self
    }

    pub const fn y(mut self, v: f64) -> Self {
        self.y = Some(v);
        self
    }

    pub const fn scale(mut self, v: f64) -> Self {
        self.scale = Some(v);
        self
    }

    pub const fn rotate_x(mut self, v: f64) -> Self {
        self.rotate_x = Some(v);
        self
    }

    /// Opacity clamped to `[0, 1]`, scale kept non-negative.
    pub fn sanitized(self) -> Self {
        Self {
            opacity: self.opacity.map(|o| o.clamp(0.0, 1.0)),
            scale: self.scale.map(|s| s.max(0.0)),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSpec {
    pub initial: VisualState,
    pub animate: VisualState,
    pub exit: Option<VisualState>,
    pub transition: Transition,
}

impl MotionSpec {
    fn enter(initial: VisualState, animate: VisualState) -> Self {
        Self {
            initial,
            animate,
            exit: Some(initial),
            transition: Transition::DEFAULT,
        }
    }

    fn with_transition(mut self, transition: Transition) -> Self {
        self.transition = transition;
        self
    }

    fn sanitized(self) -> Self {
        Self {
            initial: self.initial.sanitized(),
            animate: self.animate.sanitized(),
            exit: self.exit.map(VisualState::sanitized),
            transition: self.transition.sanitized(),
        }
    }

    /// Collapses the animation to its end state.
    fn reduced(self) -> Self {
        Self {
            initial: self.animate,
            animate: self.animate,
            exit: None,
            transition: Transition::Instant,
        }
    }
}

/// Closed set of motion presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motion {
    FadeIn,
    SlideUp,
    SlideDown,
    SlideLeft,
    SlideRight,
    ScaleIn,
    ScaleOut,
    Flip,
    Bounce,
    Hover,
    Tap,
}

impl Motion {
    pub const ALL: [Motion; 11] = [
        Motion::FadeIn,
        Motion::SlideUp,
        Motion::SlideDown,
        Motion::SlideLeft,
        Motion::SlideRight,
        Motion::ScaleIn,
        Motion::ScaleOut,
        Motion::Flip,
        Motion::Bounce,
        Motion::Hover,
        Motion::Tap,
    ];

    pub fn spec(self) -> MotionSpec {
        let hidden = VisualState::new().opacity(0.0);
        let shown = VisualState::new().opacity(1.0);

        let spec = match self {
            Motion::FadeIn => MotionSpec::enter(hidden, shown),
            Motion::SlideUp => MotionSpec::enter(hidden.y(20.0), shown.y(0.0)),
            Motion::SlideDown => MotionSpec::enter(hidden.y(-20.0), shown.y(0.0)),
            Motion::SlideLeft => MotionSpec::enter(hidden.x(20.0), shown.x(0.0)),
            Motion::SlideRight => MotionSpec::enter(hidden.x(-20.0), shown.x(0.0)),
            Motion::ScaleIn => MotionSpec::enter(hidden.scale(0.8), shown.scale(1.0)),
            Motion::ScaleOut => MotionSpec {
                initial: shown.scale(1.0),
                animate: hidden.scale(0.8),
                exit: None,
                transition: Transition::DEFAULT,
            },
            Motion::Flip => MotionSpec::enter(hidden.rotate_x(-90.0), shown.rotate_x(0.0)),
            Motion::Bounce => MotionSpec::enter(hidden.scale(0.3), shown.scale(1.0))
                .with_transition(Transition::BOUNCE),
            Motion::Hover => MotionSpec {
                initial: VisualState::new().scale(1.0),
                animate: VisualState::new().scale(1.05),
                exit: None,
                transition: Transition::FAST,
            },
            Motion::Tap => MotionSpec {
                initial: VisualState::new().scale(1.0),
                animate: VisualState::new().scale(0.95),
                exit: None,
                transition: Transition::FAST,
            },
        };

        spec.sanitized()
    }

    pub fn spec_for(self, motion: &MotionPreference) -> MotionSpec {
        let spec = self.spec();
        if motion.is_reduced() {
            spec.reduced()
        } else {
            spec
        }
    }
}

/// The rendering collaborator: "render this element with these motion parameters".
pub trait RenderSink: Send + Sync {
    fn animate(&self, target: &str, spec: &MotionSpec) -> anyhow::Result<()>;
}
