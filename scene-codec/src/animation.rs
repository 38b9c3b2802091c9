//! Animation block and animator controller synthesis
//!
//! Files only store an ordered list of `(state, clip path)` pairs. A decoded
//! avatar gets a minimal state machine built from that list: state 0 is the
//! entry state, and every other state is reachable from it through a boolean
//! parameter and returns to it unconditionally.

use std::path::Path;

use hashbrown::HashSet;
use scene_common::formats::io::{write_string, write_u8};
use scene_common::{AnimationDescriptor, AnimationState, ByteReader, FormatError};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Maps a stored clip path to the clip name known to the host
pub trait ClipResolver: Send + Sync {
    fn resolve(&self, clip_path: &str) -> Option<String>;
}

/// Resolves a clip by the file stem of its path (`Anim/Run.anim` -> `Run`)
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStemClipResolver;

impl ClipResolver for FileStemClipResolver {
    fn resolve(&self, clip_path: &str) -> Option<String> {
        Path::new(clip_path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .map(str::to_string)
    }
}

/// Source of the boolean parameter names
///
/// Editors name parameters after states; decoded avatars name them after the
/// resolved clips. Both forms exist in the wild and are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterNaming {
    StateName,
    #[default]
    ClipName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerState {
    pub name: String,
    pub clip_path: String,
    /// Clip name from the resolver, if it found one
    pub clip: Option<String>,
}

/// State change; `condition` names a boolean parameter that must be true
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: usize,
    pub to: usize,
    pub condition: Option<String>,
}

/// Minimal single-layer state machine
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnimatorController {
    pub states: Vec<ControllerState>,
    /// Boolean parameters, deduplicated by name
    pub parameters: Vec<String>,
    pub transitions: Vec<Transition>,
    pub default_state: Option<usize>,
}

impl AnimatorController {
    pub fn state(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|state| state.name == name)
    }

    pub fn transitions_from(&self, state: usize) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().filter(move |t| t.from == state)
    }
}

/// Build a controller from an ordered state list
pub fn synthesize_controller(
    descriptor: &AnimationDescriptor,
    naming: ParameterNaming,
    resolver: &dyn ClipResolver,
) -> AnimatorController {
    let mut controller = AnimatorController::default();
    if descriptor.states.is_empty() {
        return controller;
    }

    let mut seen = HashSet::new();
    for (index, state) in descriptor.states.iter().enumerate() {
        let clip = resolver.resolve(&state.clip_path);
        controller.states.push(ControllerState {
            name: state.name.clone(),
            clip_path: state.clip_path.clone(),
            clip: clip.clone(),
        });

        if index == 0 {
            continue;
        }

        let parameter = match naming {
            ParameterNaming::StateName => state.name.clone(),
            ParameterNaming::ClipName => clip.unwrap_or_else(|| {
                warn!(
                    "Clip '{}' of state '{}' not resolved, naming parameter after the state",
                    state.clip_path, state.name
                );
                state.name.clone()
            }),
        };
        if seen.insert(parameter.clone()) {
            controller.parameters.push(parameter.clone());
        }

        controller.transitions.push(Transition {
            from: 0,
            to: index,
            condition: Some(parameter),
        });
        controller.transitions.push(Transition {
            from: index,
            to: 0,
            condition: None,
        });
    }

    controller.default_state = Some(0);
    controller
}

/// Write the animation block (`u8` state count, then name and clip path pairs)
pub fn write_animation(output: &mut Vec<u8>, descriptor: Option<&AnimationDescriptor>) {
    let states = descriptor.map(|d| d.states.as_slice()).unwrap_or_default();
    let count = if states.len() > u8::MAX as usize {
        warn!(
            "{} animation states exceed the u8 count field, writing the first {}",
            states.len(),
            u8::MAX
        );
        u8::MAX as usize
    } else {
        states.len()
    };

    write_u8(output, count as u8);
    for state in &states[..count] {
        write_string(output, &state.name);
        write_string(output, &state.clip_path);
    }
}

pub fn read_animation(reader: &mut ByteReader<'_>) -> Result<AnimationDescriptor, FormatError> {
    let count = reader.read_u8()? as usize;
    let mut states = Vec::with_capacity(count);
    for _ in 0..count {
        let name = reader.read_string()?;
        let clip_path = reader.read_string()?;
        states.push(AnimationState { name, clip_path });
    }
    Ok(AnimationDescriptor { states })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(states: &[(&str, &str)]) -> AnimationDescriptor {
        AnimationDescriptor {
            states: states
                .iter()
                .map(|(name, clip)| AnimationState::new(*name, *clip))
                .collect(),
        }
    }

    #[test]
    fn test_three_states() {
        let desc = descriptor(&[
            ("Idle", "Assets/Anim/Idle.anim"),
            ("Run", "Assets/Anim/Run.anim"),
            ("Jump", "Assets/Anim/Jump.anim"),
        ]);
        let controller =
            synthesize_controller(&desc, ParameterNaming::StateName, &FileStemClipResolver);

        assert_eq!(controller.default_state, Some(0));
        assert_eq!(controller.states.len(), 3);
        assert_eq!(controller.parameters, ["Run", "Jump"]);
        assert_eq!(controller.transitions.len(), 4);

        let from_entry: Vec<_> = controller.transitions_from(0).collect();
        assert_eq!(from_entry.len(), 2);
        assert!(from_entry.iter().all(|t| t.condition.is_some()));

        let run = controller.state("Run").unwrap();
        let back: Vec<_> = controller.transitions_from(run).collect();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].to, 0);
        assert_eq!(back[0].condition, None);
    }

    #[test]
    fn test_clip_naming_uses_resolved_clip() {
        let desc = descriptor(&[
            ("Idle", "Anim/idle_loop.anim"),
            ("Run", "Anim/run_fast.anim"),
        ]);
        let controller =
            synthesize_controller(&desc, ParameterNaming::ClipName, &FileStemClipResolver);
        assert_eq!(controller.parameters, ["run_fast"]);
        assert_eq!(controller.states[1].clip.as_deref(), Some("run_fast"));
        assert_eq!(controller.transitions[0].condition.as_deref(), Some("run_fast"));
    }

    #[test]
    fn test_unresolved_clip_falls_back_to_state_name() {
        let desc = descriptor(&[("Idle", ""), ("Wave", "")]);
        let controller =
            synthesize_controller(&desc, ParameterNaming::ClipName, &FileStemClipResolver);
        assert_eq!(controller.parameters, ["Wave"]);
        assert_eq!(controller.states[1].clip, None);
    }

    #[test]
    fn test_duplicate_parameters_are_merged() {
        let desc = descriptor(&[("Idle", "a.anim"), ("Run", "run.anim"), ("Sprint", "run.anim")]);
        let controller =
            synthesize_controller(&desc, ParameterNaming::ClipName, &FileStemClipResolver);
        assert_eq!(controller.parameters, ["run"]);
        assert_eq!(controller.transitions.len(), 4);
    }

    #[test]
    fn test_single_and_empty_state_lists() {
        let single = synthesize_controller(
            &descriptor(&[("Idle", "idle.anim")]),
            ParameterNaming::StateName,
            &FileStemClipResolver,
        );
        assert_eq!(single.default_state, Some(0));
        assert!(single.parameters.is_empty());
        assert!(single.transitions.is_empty());

        let empty = synthesize_controller(
            &AnimationDescriptor::default(),
            ParameterNaming::StateName,
            &FileStemClipResolver,
        );
        assert_eq!(empty, AnimatorController::default());
        assert_eq!(empty.default_state, None);
    }

    #[test]
    fn test_animation_block_roundtrip() {
        let desc = descriptor(&[("Idle", "idle.anim"), ("Run", "run.anim")]);
        let mut out = Vec::new();
        write_animation(&mut out, Some(&desc));
        assert_eq!(out[0], 2);
        assert_eq!(&out[1..6], b"\x04Idle");

        let mut reader = ByteReader::new(&out);
        assert_eq!(read_animation(&mut reader).unwrap(), desc);
        assert!(reader.is_empty());

        let mut out = Vec::new();
        write_animation(&mut out, None);
        assert_eq!(out, [0]);
    }
}
