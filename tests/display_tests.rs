// Host-side tests for key mapping and display state commands.

use glow_trail::core::config::RenderConfig;
use glow_trail::core::display::{
    command_for_key, command_for_wheel, pinch_radius, BackgroundMode, Command, DisplayState,
    Facing, Reaction,
};

#[test]
fn key_map_covers_every_control() {
    assert_eq!(command_for_key("+"), Some(Command::IncreaseRadius));
    assert_eq!(command_for_key("="), Some(Command::IncreaseRadius));
    assert_eq!(command_for_key("-"), Some(Command::DecreaseRadius));
    assert_eq!(
        command_for_key("1"),
        Some(Command::SetBackground(BackgroundMode::LongFade))
    );
    assert_eq!(
        command_for_key("0"),
        Some(Command::SetBackground(BackgroundMode::NormalFade))
    );
    assert_eq!(command_for_key("t"), Some(Command::ToggleBackground));
    assert_eq!(command_for_key("P"), Some(Command::TogglePulsation));
    assert_eq!(command_for_key("a"), Some(Command::ToggleAugmented));
    assert_eq!(command_for_key("c"), Some(Command::SwitchFacing(None)));
    assert_eq!(command_for_key("G"), Some(Command::StartCapture));
}

#[test]
fn unmapped_keys_are_ignored() {
    for key in ["x", "Enter", "2", " ", "Shift", ""] {
        assert_eq!(command_for_key(key), None, "key {:?}", key);
    }
}

#[test]
fn radius_never_drops_below_floor() {
    let cfg = RenderConfig::default();
    let mut d = DisplayState::new(&cfg);
    d.set_radius(12.0, &cfg);
    d.apply(Command::DecreaseRadius, &cfg);
    assert_eq!(d.radius(), 10.0, "12 - 5 clamps to the floor");
    for _ in 0..20 {
        d.apply(Command::DecreaseRadius, &cfg);
    }
    assert_eq!(d.radius(), cfg.min_radius);
}

#[test]
fn radius_steps_by_five() {
    let cfg = RenderConfig::default();
    let mut d = DisplayState::new(&cfg);
    assert_eq!(d.radius(), 60.0);
    d.apply(Command::IncreaseRadius, &cfg);
    d.apply(Command::IncreaseRadius, &cfg);
    assert_eq!(d.radius(), 70.0);
    d.apply(Command::DecreaseRadius, &cfg);
    assert_eq!(d.radius(), 65.0);
}

#[test]
fn wheel_direction_maps_to_resize() {
    assert_eq!(command_for_wheel(-100.0), Command::IncreaseRadius);
    assert_eq!(command_for_wheel(100.0), Command::DecreaseRadius);
}

#[test]
fn pinch_scales_with_finger_distance_and_clamps() {
    let cfg = RenderConfig::default();
    assert_eq!(pinch_radius(60.0, 100.0, 140.0, &cfg), 80.0);
    assert_eq!(pinch_radius(60.0, 100.0, 60.0, &cfg), 40.0);
    assert_eq!(pinch_radius(60.0, 300.0, 0.0, &cfg), cfg.min_radius);
}

#[test]
fn background_commands_select_and_toggle_fade() {
    let cfg = RenderConfig::default();
    let mut d = DisplayState::new(&cfg);
    assert_eq!(d.background, BackgroundMode::NormalFade);
    d.apply(Command::SetBackground(BackgroundMode::LongFade), &cfg);
    assert_eq!(d.background.fade_color(&cfg), "rgba(0, 0, 0, 0.05)");
    d.apply(Command::ToggleBackground, &cfg);
    assert_eq!(d.background.fade_color(&cfg), "rgba(0, 0, 0, 0.1)");
}

#[test]
fn augmented_toggle_opens_and_closes_camera() {
    let cfg = RenderConfig::default();
    let mut d = DisplayState::new(&cfg);
    assert_eq!(
        d.apply(Command::ToggleAugmented, &cfg),
        Reaction::OpenCamera(Facing::Front)
    );
    assert!(d.augmented);
    assert_eq!(d.apply(Command::ToggleAugmented, &cfg), Reaction::CloseCamera);
    assert!(!d.augmented);
}

#[test]
fn switching_facing_reopens_only_while_augmented() {
    let cfg = RenderConfig::default();
    let mut d = DisplayState::new(&cfg);
    assert_eq!(d.apply(Command::SwitchFacing(None), &cfg), Reaction::None);
    assert_eq!(d.facing, Facing::Back);

    d.apply(Command::ToggleAugmented, &cfg);
    assert_eq!(
        d.apply(Command::SwitchFacing(None), &cfg),
        Reaction::OpenCamera(Facing::Front)
    );
    // Same facing again: nothing to reopen.
    assert_eq!(
        d.apply(Command::SwitchFacing(Some(Facing::Front)), &cfg),
        Reaction::None
    );
    assert_eq!(Facing::Back.facing_mode(), "environment");
}

#[test]
fn camera_failure_turns_augmented_off() {
    let cfg = RenderConfig::default();
    let mut d = DisplayState::new(&cfg);
    d.apply(Command::ToggleAugmented, &cfg);
    d.disable_augmented();
    assert!(!d.augmented);
    assert_eq!(
        d.apply(Command::ToggleAugmented, &cfg),
        Reaction::OpenCamera(Facing::Front),
        "next toggle retries the camera"
    );
}

#[test]
fn pulsation_and_capture_commands() {
    let cfg = RenderConfig::default();
    let mut d = DisplayState::new(&cfg);
    assert_eq!(d.apply(Command::TogglePulsation, &cfg), Reaction::None);
    assert!(d.pulsation);
    assert_eq!(d.apply(Command::StartCapture, &cfg), Reaction::StartCapture);
}
