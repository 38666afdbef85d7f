use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use engine::{load_level, LevelMap, PortalDirection, SpawnKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub level: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommonOptions {
    pub warnings_as_errors: bool,
    pub quiet: bool,
}

pub enum CommandKind {
    Check { paths: Vec<String> },
    Scan { dir: String },
}

pub fn run<W: Write>(kind: CommandKind, opts: CommonOptions, stdout: &mut W) -> Result<(), String> {
    let paths = match kind {
        CommandKind::Check { paths } => paths.into_iter().map(PathBuf::from).collect(),
        CommandKind::Scan { dir } => scan_dir(Path::new(&dir))?,
    };
    if paths.is_empty() {
        return Err("no level files to check".to_string());
    }

    let mut maps = Vec::with_capacity(paths.len());
    for path in &paths {
        let map = load_level(path)
            .map_err(|error| format!("failed to load '{}': {error}", path.display()))?;
        maps.push(map);
    }

    check_maps(&maps, opts, stdout)
}

/// Runs every check over the full set of maps. Cross-level checks (portal
/// destinations, handoff spawn bounds) only see the levels in this set, so
/// checking a single file out of a larger world can report false unknowns.
pub fn check_maps<W: Write>(
    maps: &[LevelMap],
    opts: CommonOptions,
    stdout: &mut W,
) -> Result<(), String> {
    let mut bounds = BTreeMap::new();
    for map in maps {
        bounds.insert(map.name().to_string(), (map.pixel_width(), map.pixel_height()));
    }

    let mut errors = 0usize;
    let mut warnings = 0usize;
    for map in maps {
        if !opts.quiet {
            let _ = writeln!(
                stdout,
                "{}: {} object(s), {} solid tile(s)",
                map.name(),
                map.spawns().len(),
                map.solid_count()
            );
        }
        for finding in check_level(map, &bounds) {
            match finding.severity {
                Severity::Error => errors += 1,
                Severity::Warning => warnings += 1,
            }
            if !opts.quiet || finding.severity == Severity::Error {
                let _ = writeln!(
                    stdout,
                    "{}[{}]: {}",
                    finding.severity, finding.level, finding.message
                );
            }
        }
    }

    let _ = writeln!(
        stdout,
        "checked {} level(s): {} error(s), {} warning(s)",
        maps.len(),
        errors,
        warnings
    );

    if errors > 0 || (opts.warnings_as_errors && warnings > 0) {
        return Err(format!("{} problem(s) found", errors + warnings));
    }
    Ok(())
}

pub fn check_level(map: &LevelMap, known: &BTreeMap<String, (f32, f32)>) -> Vec<Finding> {
    let mut findings = Vec::new();
    let level = map.name().to_string();
    let push = |findings: &mut Vec<Finding>, severity: Severity, message: String| {
        findings.push(Finding {
            severity,
            level: level.clone(),
            message,
        });
    };

    let player_count = map
        .spawns()
        .iter()
        .filter(|desc| desc.kind == SpawnKind::Player)
        .count();
    if player_count == 0 {
        push(
            &mut findings,
            Severity::Error,
            "no player spawn object".to_string(),
        );
    } else if player_count > 1 {
        push(
            &mut findings,
            Severity::Error,
            format!("{player_count} player spawn objects, expected exactly one"),
        );
    }

    if map.solid_count() == 0 {
        push(
            &mut findings,
            Severity::Warning,
            "no solid tiles, everything falls out of the level".to_string(),
        );
    }

    let mut has_completion = false;
    let mut seen_names: BTreeMap<&str, usize> = BTreeMap::new();
    for desc in map.spawns() {
        if !desc.name.is_empty() {
            *seen_names.entry(desc.name.as_str()).or_insert(0) += 1;
        }

        if desc.x < 0.0
            || desc.y < 0.0
            || desc.x + desc.width > map.pixel_width()
            || desc.y + desc.height > map.pixel_height()
        {
            push(
                &mut findings,
                Severity::Warning,
                format!(
                    "object '{}' at ({}, {}) extends outside the {}x{} pixel bounds",
                    display_name(desc),
                    desc.x,
                    desc.y,
                    map.pixel_width(),
                    map.pixel_height()
                ),
            );
        }

        match &desc.kind {
            SpawnKind::Portal {
                direction,
                destination,
                spawn,
            } => {
                has_completion = true;
                match known.get(destination) {
                    None => {
                        push(
                            &mut findings,
                            Severity::Error,
                            format!(
                                "portal '{}' targets unknown level '{destination}'",
                                display_name(desc)
                            ),
                        );
                    }
                    Some((dest_width, dest_height)) => {
                        if spawn.x < 0.0
                            || spawn.y < 0.0
                            || spawn.x > *dest_width
                            || spawn.y > *dest_height
                        {
                            push(
                                &mut findings,
                                Severity::Error,
                                format!(
                                    "portal '{}' hands off to ({}, {}), outside '{destination}'",
                                    display_name(desc),
                                    spawn.x,
                                    spawn.y
                                ),
                            );
                        }
                    }
                }
                if *direction == PortalDirection::Down && desc.height < 1.0 {
                    push(
                        &mut findings,
                        Severity::Warning,
                        format!(
                            "down portal '{}' is too flat to stand on",
                            display_name(desc)
                        ),
                    );
                }
            }
            SpawnKind::Exit | SpawnKind::Princess => {
                has_completion = true;
            }
            _ => {}
        }
    }

    for (name, count) in seen_names {
        if count > 1 {
            push(
                &mut findings,
                Severity::Warning,
                format!("object name '{name}' used {count} times"),
            );
        }
    }

    if !has_completion {
        push(
            &mut findings,
            Severity::Warning,
            "no portal, exit, or princess; the level cannot be completed".to_string(),
        );
    }

    findings
}

fn display_name(desc: &engine::SpawnDesc) -> &str {
    if desc.name.is_empty() {
        "<unnamed>"
    } else {
        &desc.name
    }
}

fn scan_dir(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let entries = std::fs::read_dir(dir)
        .map_err(|error| format!("failed to scan '{}': {error}", dir.display()))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|error| format!("failed to scan '{}': {error}", dir.display()))?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("tmx") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{SpawnDesc, SpawnPoint};

    fn desc(name: &str, kind: SpawnKind, x: f32, y: f32) -> SpawnDesc {
        SpawnDesc {
            name: name.to_string(),
            kind,
            x,
            y,
            width: 16.0,
            height: 16.0,
        }
    }

    fn map(name: &str, spawns: Vec<SpawnDesc>) -> LevelMap {
        let mut solid = vec![false; 100];
        solid[90] = true;
        LevelMap::from_parts(name, 10, 10, 16.0, 16.0, solid, spawns).expect("map")
    }

    fn bounds_of(maps: &[LevelMap]) -> BTreeMap<String, (f32, f32)> {
        maps.iter()
            .map(|map| (map.name().to_string(), (map.pixel_width(), map.pixel_height())))
            .collect()
    }

    #[test]
    fn clean_level_has_no_findings() {
        let level = map(
            "level1",
            vec![
                desc("", SpawnKind::Player, 16.0, 16.0),
                desc("exit", SpawnKind::Exit, 128.0, 128.0),
            ],
        );
        let findings = check_level(&level, &bounds_of(std::slice::from_ref(&level)));
        assert!(findings.is_empty(), "got: {findings:?}");
    }

    #[test]
    fn missing_player_spawn_is_an_error() {
        let level = map("level1", vec![desc("exit", SpawnKind::Exit, 128.0, 128.0)]);
        let findings = check_level(&level, &bounds_of(std::slice::from_ref(&level)));
        assert!(findings
            .iter()
            .any(|finding| finding.severity == Severity::Error
                && finding.message.contains("no player spawn")));
    }

    #[test]
    fn unknown_portal_destination_is_an_error() {
        let level = map(
            "level1",
            vec![
                desc("", SpawnKind::Player, 16.0, 16.0),
                desc(
                    "pipe",
                    SpawnKind::Portal {
                        direction: PortalDirection::Down,
                        destination: "level9".to_string(),
                        spawn: SpawnPoint { x: 16.0, y: 16.0 },
                    },
                    64.0,
                    64.0,
                ),
            ],
        );
        let findings = check_level(&level, &bounds_of(std::slice::from_ref(&level)));
        assert!(findings
            .iter()
            .any(|finding| finding.severity == Severity::Error
                && finding.message.contains("unknown level 'level9'")));
    }

    #[test]
    fn portal_handoff_outside_destination_is_an_error() {
        let hub = map(
            "hub",
            vec![
                desc("", SpawnKind::Player, 16.0, 16.0),
                desc(
                    "pipe",
                    SpawnKind::Portal {
                        direction: PortalDirection::Right,
                        destination: "cave".to_string(),
                        spawn: SpawnPoint { x: 999.0, y: 16.0 },
                    },
                    64.0,
                    64.0,
                ),
            ],
        );
        let cave = map(
            "cave",
            vec![
                desc("", SpawnKind::Player, 16.0, 16.0),
                desc("exit", SpawnKind::Exit, 128.0, 128.0),
            ],
        );
        let maps = vec![hub, cave];
        let findings = check_level(&maps[0], &bounds_of(&maps));
        assert!(findings
            .iter()
            .any(|finding| finding.severity == Severity::Error
                && finding.message.contains("outside 'cave'")));
    }

    #[test]
    fn uncompletable_level_is_a_warning() {
        let level = map("level1", vec![desc("", SpawnKind::Player, 16.0, 16.0)]);
        let findings = check_level(&level, &bounds_of(std::slice::from_ref(&level)));
        assert!(findings
            .iter()
            .any(|finding| finding.severity == Severity::Warning
                && finding.message.contains("cannot be completed")));
    }

    #[test]
    fn duplicate_object_names_are_a_warning() {
        let level = map(
            "level1",
            vec![
                desc("", SpawnKind::Player, 16.0, 16.0),
                desc("pipe", SpawnKind::Exit, 64.0, 64.0),
                desc("pipe", SpawnKind::Exit, 96.0, 64.0),
            ],
        );
        let findings = check_level(&level, &bounds_of(std::slice::from_ref(&level)));
        assert!(findings
            .iter()
            .any(|finding| finding.message.contains("'pipe' used 2 times")));
    }

    #[test]
    fn check_maps_fails_on_errors_and_reports_a_summary() {
        let level = map("level1", vec![desc("exit", SpawnKind::Exit, 128.0, 128.0)]);
        let mut output = Vec::new();
        let result = check_maps(&[level], CommonOptions::default(), &mut output);
        assert!(result.is_err());
        let text = String::from_utf8(output).expect("utf8");
        assert!(text.contains("error[level1]"));
        assert!(text.contains("checked 1 level(s): 1 error(s)"));
    }

    #[test]
    fn warnings_pass_unless_promoted() {
        let level = map("level1", vec![desc("", SpawnKind::Player, 16.0, 16.0)]);
        let mut output = Vec::new();
        assert!(check_maps(
            std::slice::from_ref(&level),
            CommonOptions::default(),
            &mut output
        )
        .is_ok());

        let strict = CommonOptions {
            warnings_as_errors: true,
            quiet: false,
        };
        let mut output = Vec::new();
        assert!(check_maps(std::slice::from_ref(&level), strict, &mut output).is_err());
    }

    #[test]
    fn quiet_mode_suppresses_warnings_but_not_errors() {
        let level = map("level1", vec![desc("exit", SpawnKind::Exit, 128.0, 128.0)]);
        let quiet = CommonOptions {
            warnings_as_errors: false,
            quiet: true,
        };
        let mut output = Vec::new();
        let _ = check_maps(&[level], quiet, &mut output);
        let text = String::from_utf8(output).expect("utf8");
        assert!(text.contains("error[level1]"));
        assert!(!text.contains("warning[level1]"));
    }
}
