//! Externally adjustable display state and the input commands that mutate it.
//!
//! Input handlers own `DisplayState`; the render loop only reads it.

use super::config::RenderConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BackgroundMode {
    #[default]
    NormalFade,
    LongFade,
}

impl BackgroundMode {
    pub fn fade_color(self, config: &RenderConfig) -> &'static str {
        match self {
            BackgroundMode::NormalFade => config.normal_fade_color,
            BackgroundMode::LongFade => config.long_fade_color,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BackgroundMode::NormalFade => "Normal",
            BackgroundMode::LongFade => "Long",
        }
    }

    fn toggled(self) -> Self {
        match self {
            BackgroundMode::NormalFade => BackgroundMode::LongFade,
            BackgroundMode::LongFade => BackgroundMode::NormalFade,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Facing {
    #[default]
    Front,
    Back,
}

impl Facing {
    /// `facingMode` constraint value understood by `getUserMedia`.
    pub fn facing_mode(self) -> &'static str {
        match self {
            Facing::Front => "user",
            Facing::Back => "environment",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    IncreaseRadius,
    DecreaseRadius,
    SetBackground(BackgroundMode),
    ToggleBackground,
    TogglePulsation,
    ToggleAugmented,
    /// `None` flips the current facing.
    SwitchFacing(Option<Facing>),
    StartCapture,
}

/// Follow-up work an applied command asks of the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reaction {
    None,
    /// Augmented mode turned on, or the facing changed while it is on.
    OpenCamera(Facing),
    CloseCamera,
    StartCapture,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DisplayState {
    radius: f32,
    pub background: BackgroundMode,
    pub pulsation: bool,
    pub augmented: bool,
    pub facing: Facing,
}

impl DisplayState {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            radius: config.base_radius.max(config.min_radius),
            background: BackgroundMode::default(),
            pulsation: false,
            augmented: false,
            facing: Facing::default(),
        }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Add `delta` pixels to the radius, never going below the floor.
    pub fn adjust_radius(&mut self, delta: f32, config: &RenderConfig) {
        self.radius = (self.radius + delta).max(config.min_radius);
    }

    pub fn set_radius(&mut self, radius: f32, config: &RenderConfig) {
        self.radius = radius.max(config.min_radius);
    }

    /// Camera acquisition failed: force augmented mode back off.
    pub fn disable_augmented(&mut self) {
        self.augmented = false;
    }

    pub fn apply(&mut self, cmd: Command, config: &RenderConfig) -> Reaction {
        match cmd {
            Command::IncreaseRadius => self.adjust_radius(config.radius_step, config),
            Command::DecreaseRadius => self.adjust_radius(-config.radius_step, config),
            Command::SetBackground(mode) => self.background = mode,
            Command::ToggleBackground => self.background = self.background.toggled(),
            Command::TogglePulsation => self.pulsation = !self.pulsation,
            Command::ToggleAugmented => {
                self.augmented = !self.augmented;
                return if self.augmented {
                    Reaction::OpenCamera(self.facing)
                } else {
                    Reaction::CloseCamera
                };
            }
            Command::SwitchFacing(facing) => {
                let next = facing.unwrap_or_else(|| self.facing.flipped());
                let changed = next != self.facing;
                self.facing = next;
                if changed && self.augmented {
                    return Reaction::OpenCamera(next);
                }
            }
            Command::StartCapture => return Reaction::StartCapture,
        }
        Reaction::None
    }
}

#[inline]
pub fn command_for_key(key: &str) -> Option<Command> {
    match key {
        "+" | "=" => Some(Command::IncreaseRadius),
        "-" => Some(Command::DecreaseRadius),
        "1" => Some(Command::SetBackground(BackgroundMode::LongFade)),
        "0" => Some(Command::SetBackground(BackgroundMode::NormalFade)),
        "t" | "T" => Some(Command::ToggleBackground),
        "p" | "P" => Some(Command::TogglePulsation),
        "a" | "A" => Some(Command::ToggleAugmented),
        "c" | "C" => Some(Command::SwitchFacing(None)),
        "g" | "G" => Some(Command::StartCapture),
        _ => None,
    }
}

/// Wheel up grows the particle, anything else shrinks it.
#[inline]
pub fn command_for_wheel(delta_y: f64) -> Command {
    if delta_y < 0.0 {
        Command::IncreaseRadius
    } else {
        Command::DecreaseRadius
    }
}

/// Radius after a two-finger pinch that started at `start_distance` apart with
/// the particle at `start_radius`.
#[inline]
pub fn pinch_radius(
    start_radius: f32,
    start_distance: f32,
    distance: f32,
    config: &RenderConfig,
) -> f32 {
    (start_radius + (distance - start_distance) * config.pinch_sensitivity).max(config.min_radius)
}
