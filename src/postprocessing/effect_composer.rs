//! Effect composer: runs an ordered pass list against a frame target.

use super::pass::{ClearFlags, FrameTarget, Pass, StencilMode, MASK_REFERENCE};
use crate::camera::PerspectiveCamera;
use crate::math::Color;
use crate::scene::{Background, Scene};
use thiserror::Error;

/// Malformed pass lists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposerError {
    /// A pass names a scene that was not supplied.
    #[error("pass {pass} draws scene {scene}, but only {available} scenes were given")]
    MissingScene {
        /// Pass index.
        pass: usize,
        /// Requested scene index.
        scene: usize,
        /// Number of scenes supplied.
        available: usize,
    },

    /// A mask pass starts while another mask is still active.
    #[error("mask pass {pass} starts before the mask from pass {open} is cleared")]
    NestedMask {
        /// Offending pass index.
        pass: usize,
        /// Pass that opened the active mask.
        open: usize,
    },

    /// A mask is never cleared.
    #[error("mask pass {pass} has no matching clear-mask pass")]
    UnterminatedMask {
        /// Pass that opened the mask.
        pass: usize,
    },
}

/// Ordered list of passes rendered each frame.
#[derive(Debug, Clone)]
pub struct EffectComposer {
    /// Render passes in order.
    passes: Vec<Pass>,
    /// Color used by render passes that clear when the scene has no background.
    pub clear_color: Color,
}

impl Default for EffectComposer {
    fn default() -> Self {
        Self::new(Color::BLACK)
    }
}

impl EffectComposer {
    /// Create an empty composer.
    pub fn new(clear_color: Color) -> Self {
        Self {
            passes: Vec::new(),
            clear_color,
        }
    }

    /// Single render pass followed by nothing: the plain `renderer.render` case.
    pub fn single(scene: usize, clear_color: Color) -> Self {
        let mut composer = Self::new(clear_color);
        composer.add_pass(Pass::Render { scene, clear: true });
        composer
    }

    /// Add a pass to the chain.
    pub fn add_pass(&mut self, pass: Pass) -> &mut Self {
        self.passes.push(pass);
        self
    }

    /// Passes in order.
    #[inline]
    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    /// Mutable access for reordering or editing passes.
    #[inline]
    pub fn passes_mut(&mut self) -> &mut Vec<Pass> {
        &mut self.passes
    }

    /// Check scene references and mask pairing against `scene_count`.
    pub fn validate(&self, scene_count: usize) -> Result<(), ComposerError> {
        let mut open: Option<usize> = None;
        for (index, pass) in self.passes.iter().enumerate() {
            match *pass {
                Pass::Render { scene, .. } | Pass::Mask { scene, .. } if scene >= scene_count => {
                    return Err(ComposerError::MissingScene {
                        pass: index,
                        scene,
                        available: scene_count,
                    });
                }
                Pass::Mask { .. } => {
                    if let Some(open) = open {
                        return Err(ComposerError::NestedMask { pass: index, open });
                    }
                    open = Some(index);
                }
                Pass::ClearMask => open = None,
                _ => {}
            }
        }
        match open {
            Some(pass) => Err(ComposerError::UnterminatedMask { pass }),
            None => Ok(()),
        }
    }

    /// Run every pass in order.
    pub fn render(
        &self,
        scenes: &[Scene],
        camera: &PerspectiveCamera,
        target: &mut dyn FrameTarget,
    ) -> Result<(), ComposerError> {
        self.validate(scenes.len())?;

        let mut stencil_test = false;
        let masked = |on: bool| if on { StencilMode::Test(MASK_REFERENCE) } else { StencilMode::Off };

        for pass in &self.passes {
            match *pass {
                Pass::Clear { color } => target.clear(ClearFlags::all(color)),
                Pass::Render { scene, clear } => {
                    let scene = &scenes[scene];
                    if clear {
                        let color = match scene.background {
                            Background::Color(color) => color,
                            Background::None => self.clear_color,
                        };
                        target.clear(ClearFlags::all(color));
                    }
                    target.draw_scene(scene, camera, masked(stencil_test));
                }
                Pass::Mask { scene, inverse } => {
                    let (write, clear) = if inverse { (0, MASK_REFERENCE) } else { (MASK_REFERENCE, 0) };
                    target.clear(ClearFlags::stencil(clear));
                    target.draw_scene(&scenes[scene], camera, StencilMode::Write(write));
                    stencil_test = true;
                }
                Pass::ClearMask => stencil_test = false,
                Pass::Effect(effect) => target.apply_effect(effect, masked(stencil_test)),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postprocessing::ScreenEffect;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl FrameTarget for Recorder {
        fn clear(&mut self, flags: ClearFlags) {
            self.calls.push(format!("clear {:?} {:?}", flags.color.is_some(), flags.stencil));
        }

        fn draw_scene(&mut self, scene: &Scene, _: &PerspectiveCamera, stencil: StencilMode) {
            self.calls.push(format!("draw {} {:?}", scene.len(), stencil));
        }

        fn apply_effect(&mut self, effect: ScreenEffect, stencil: StencilMode) {
            self.calls.push(format!("{} {:?}", effect.name(), stencil));
        }
    }

    fn fan_composer() -> EffectComposer {
        let mut composer = EffectComposer::new(Color::BLACK);
        composer
            .add_pass(Pass::Clear { color: Color::BLACK })
            .add_pass(Pass::Render { scene: 0, clear: true })
            .add_pass(Pass::Mask { scene: 1, inverse: false })
            .add_pass(Pass::Render { scene: 2, clear: false })
            .add_pass(Pass::ClearMask)
            .add_pass(Pass::Effect(ScreenEffect::GAMMA));
        composer
    }

    #[test]
    fn test_mask_restricts_until_cleared() {
        let scenes = vec![Scene::new(), Scene::new(), Scene::new()];
        let camera = PerspectiveCamera::default();
        let mut recorder = Recorder::default();
        fan_composer().render(&scenes, &camera, &mut recorder).unwrap();
        assert_eq!(
            recorder.calls,
            vec![
                "clear true Some(0)",
                "draw 0 Off",
                "clear false Some(0)",
                "draw 0 Write(1)",
                "draw 0 Test(1)",
                "gamma-correction Off",
            ]
        );
    }

    #[test]
    fn test_validate_rejects_unbalanced_masks() {
        let mut composer = EffectComposer::default();
        composer.add_pass(Pass::Mask { scene: 0, inverse: false });
        assert_eq!(composer.validate(1), Err(ComposerError::UnterminatedMask { pass: 0 }));

        composer.add_pass(Pass::Mask { scene: 0, inverse: true });
        assert_eq!(composer.validate(1), Err(ComposerError::NestedMask { pass: 1, open: 0 }));
    }

    #[test]
    fn test_validate_rejects_missing_scene() {
        assert!(matches!(
            fan_composer().validate(2),
            Err(ComposerError::MissingScene { scene: 2, .. })
        ));
    }
}
