/// Sprite-sheet frame for the player, derived from physics state every
/// tick instead of being stored anywhere. Small frames occupy 0..=5 and
/// the big sheet sits one row below at +6; the big crouch pose at 13
/// only shows while standing still.
fn player_frame(
    size: PlayerSize,
    crouching: bool,
    airborne: bool,
    velocity_x: f32,
    acceleration_x: f32,
) -> u32 {
    let base = match size {
        PlayerSize::Small => 0,
        PlayerSize::Big => BIG_FRAME_OFFSET,
    };
    if airborne {
        return base + 4;
    }
    let moving = velocity_x.abs() > f32::EPSILON;
    let skidding =
        moving && acceleration_x != 0.0 && velocity_x.signum() != acceleration_x.signum();
    if skidding {
        base + 5
    } else if moving {
        base + 1
    } else if size == PlayerSize::Big && crouching {
        BIG_CROUCH_FRAME
    } else {
        base
    }
}

/// Numeric knobs a designer may override from a `tuning.json` next to
/// the level data. Anything absent falls back to the built-in value.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct Tuning {
    pub(crate) run_acceleration: f32,
    pub(crate) jump_velocity: f32,
    pub(crate) bullet_speed: f32,
    pub(crate) gravity_y: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            run_acceleration: RUN_ACCELERATION,
            jump_velocity: JUMP_VELOCITY,
            bullet_speed: BULLET_SPEED,
            gravity_y: engine::DEFAULT_GRAVITY_Y,
        }
    }
}

fn parse_tuning(raw: &str) -> Result<Tuning, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|error| format!("at {}: {}", error.path(), error.inner()))
}

/// Missing file means defaults; a malformed file is reported and then
/// ignored rather than aborting startup.
pub(crate) fn load_tuning(path: &Path) -> Tuning {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => {
            debug!(path = %path.display(), "no_tuning_file");
            return Tuning::default();
        }
    };
    match parse_tuning(&raw) {
        Ok(tuning) => {
            info!(path = %path.display(), "tuning_loaded");
            tuning
        }
        Err(error) => {
            warn!(path = %path.display(), error = %error, "tuning_parse_failed");
            Tuning::default()
        }
    }
}
