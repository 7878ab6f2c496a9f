//! Boss Director
//!
//! Runs a boss encounter either headless (JSON config in, combat log out) or
//! with an egui observer view.

use bevy::prelude::*;
use bevy_egui::EguiPlugin;

use boss_director::cli;
use boss_director::combat::CombatPlugin;
use boss_director::director::config::DEFAULT_PROFILE_PATH;
use boss_director::director::BossConfigPlugin;
use boss_director::encounter::systems::{self, EncounterClock};
use boss_director::encounter::{setup_encounter, EncounterSetup};
use boss_director::headless::{run_headless_encounter, HeadlessEncounterConfig};
use boss_director::ui::UiPlugin;

fn main() {
    let args = cli::parse_args();

    if let Some(config_path) = args.headless {
        let mut config = match HeadlessEncounterConfig::load_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };

        // Command-line flags override the file
        if let Some(profile) = args.profile {
            config.boss_profile = profile.to_string_lossy().into_owned();
        }
        if let Some(output) = args.output {
            config.output_path = Some(output.to_string_lossy().into_owned());
        }
        if let Some(max_duration) = args.max_duration {
            config.max_duration_secs = max_duration;
        }
        if args.seed.is_some() {
            config.random_seed = args.seed;
        }

        if let Err(e) = run_headless_encounter(config) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let profile_path = args
        .profile
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_PROFILE_PATH.to_string());

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Boss Director".to_string(),
            resolution: (1280.0, 720.0).into(),
            resizable: true,
            ..default()
        }),
        ..default()
    }))
    .add_plugins((
        EguiPlugin,
        BossConfigPlugin { path: profile_path },
        CombatPlugin,
        UiPlugin,
    ))
    .insert_resource(EncounterSetup {
        random_seed: args.seed,
        ..default()
    })
    .add_systems(Startup, (spawn_camera, setup_encounter))
    .add_systems(Update, toggle_pause);

    systems::configure_director_system_ordering(&mut app);
    systems::add_core_director_systems(&mut app, resource_exists::<EncounterSetup>);

    app.run();
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// Space pauses and resumes the encounter clock.
fn toggle_pause(keys: Res<ButtonInput<KeyCode>>, mut clock: ResMut<EncounterClock>) {
    if keys.just_pressed(KeyCode::Space) {
        clock.paused = !clock.paused;
    }
}
