//! The single owner of a cube's state during a solve.
//!
//! Every move goes through [`Operator::play`], which records history and
//! reports moves to an [`Annotation`] hook while animation is on. Speculative
//! work runs inside [`Operator::save_history`], whose guard puts the cube back
//! the way it was when dropped, however the scope is left.

use std::ops::{Deref, DerefMut};

use log::{log_enabled, trace};

use crate::{
    alg::{Alg, Move},
    cube::{Cube, CubeError},
    geometry::{FaceName, Point},
};

/// Receives visual hints from the solvers. Every method defaults to a no-op.
pub trait Annotation {
    /// Called for every move played while animation is on.
    fn on_move(&mut self, _mv: &Move) {}

    /// Highlights cells of a face, e.g. the pieces a commutator is about to
    /// cycle.
    fn annotate(&mut self, _face: FaceName, _points: &[Point], _label: &str) {}

    fn clear(&mut self) {}
}

pub struct NoAnnotation;

impl Annotation for NoAnnotation {}

pub struct Operator {
    cube: Cube,
    history: Vec<Move>,
    animation: bool,
    annotation: Box<dyn Annotation>,
}

impl Operator {
    #[must_use]
    pub fn new(cube: Cube) -> Self {
        Self::with_annotation(cube, Box::new(NoAnnotation))
    }

    #[must_use]
    pub fn with_annotation(cube: Cube, annotation: Box<dyn Annotation>) -> Self {
        Operator {
            cube,
            history: Vec::new(),
            animation: true,
            annotation,
        }
    }

    #[must_use]
    pub fn cube(&self) -> &Cube {
        &self.cube
    }

    /// Direct access to the cube. Changes made through it bypass the history.
    pub fn cube_mut(&mut self) -> &mut Cube {
        &mut self.cube
    }

    #[must_use]
    pub fn into_cube(self) -> Cube {
        self.cube
    }

    #[must_use]
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    #[must_use]
    pub fn move_count(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn animation(&self) -> bool {
        self.animation
    }

    pub fn annotation(&mut self) -> &mut dyn Annotation {
        self.annotation.as_mut()
    }

    /// Plays `alg`, or its inverse when `inv` is set. `animation` overrides
    /// the current animation setting for this call only.
    ///
    /// # Errors
    ///
    /// Fails on the first move naming layers the cube does not have. The moves
    /// before it stay applied and recorded.
    pub fn play(&mut self, alg: &Alg, inv: bool, animation: Option<bool>) -> Result<(), CubeError> {
        let alg = if inv { alg.inverse() } else { alg.clone() };
        let animate = animation.unwrap_or(self.animation);
        if animate && log_enabled!(log::Level::Trace) {
            trace!("Playing {alg}");
        }
        for mv in alg {
            self.play_move_with(mv, animate)?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if the move names layers the cube does not have.
    pub fn play_move(&mut self, mv: Move) -> Result<(), CubeError> {
        let animate = self.animation;
        self.play_move_with(mv, animate)
    }

    fn play_move_with(&mut self, mv: Move, animate: bool) -> Result<(), CubeError> {
        self.cube.apply_move(&mv)?;
        if animate {
            self.annotation.on_move(&mv);
        }
        self.history.push(mv);
        Ok(())
    }

    /// Takes back the last move played.
    ///
    /// # Errors
    ///
    /// Never fails for moves recorded by [`Operator::play`]; the error type is
    /// shared with the move application.
    pub fn undo(&mut self) -> Result<Option<Move>, CubeError> {
        let Some(mv) = self.history.pop() else {
            return Ok(None);
        };
        self.cube.apply_move(&mv.inverse())?;
        if self.animation {
            self.annotation.on_move(&mv.inverse());
        }
        Ok(Some(mv))
    }

    /// Sets animation for the lifetime of the returned guard. `None` keeps the
    /// current setting.
    pub fn with_animation(&mut self, animation: Option<bool>) -> AnimationScope<'_> {
        let previous = self.animation;
        if let Some(animation) = animation {
            self.animation = animation;
        }
        AnimationScope {
            operator: self,
            previous,
        }
    }

    /// Enters query mode: animation is off and every change made through the
    /// guard, to the cube and to the history, is rolled back when it drops.
    pub fn save_history(&mut self) -> HistorySnapshot<'_> {
        let snapshot = self.cube.clone();
        let history_len = self.history.len();
        let animation = self.animation;
        self.animation = false;
        HistorySnapshot {
            operator: self,
            snapshot: Some(snapshot),
            history_len,
            animation,
        }
    }
}

pub struct AnimationScope<'a> {
    operator: &'a mut Operator,
    previous: bool,
}

impl Deref for AnimationScope<'_> {
    type Target = Operator;

    fn deref(&self) -> &Self::Target {
        self.operator
    }
}

impl DerefMut for AnimationScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.operator
    }
}

impl Drop for AnimationScope<'_> {
    fn drop(&mut self) {
        self.operator.animation = self.previous;
    }
}

pub struct HistorySnapshot<'a> {
    operator: &'a mut Operator,
    snapshot: Option<Cube>,
    history_len: usize,
    animation: bool,
}

impl Deref for HistorySnapshot<'_> {
    type Target = Operator;

    fn deref(&self) -> &Self::Target {
        self.operator
    }
}

impl DerefMut for HistorySnapshot<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.operator
    }
}

impl Drop for HistorySnapshot<'_> {
    fn drop(&mut self) {
        if let Some(cube) = self.snapshot.take() {
            self.operator.cube = cube;
        }
        self.operator.history.truncate(self.history_len);
        self.operator.animation = self.animation;
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl Annotation for Recorder {
        fn on_move(&mut self, mv: &Move) {
            self.0.borrow_mut().push(mv.to_string());
        }
    }

    #[test]
    fn play_and_undo() {
        let mut op = Operator::new(Cube::new(4).unwrap());
        op.play(&"R U".parse().unwrap(), false, None).unwrap();
        op.play(&"R U".parse().unwrap(), true, None).unwrap();
        assert_eq!(op.move_count(), 4);
        assert!(op.cube().is_solved());
        assert_eq!(op.undo().unwrap().map(|m| m.to_string()), Some("R'".into()));
        assert!(!op.cube().is_solved());
    }

    #[test]
    fn snapshot_restores_on_error() {
        let mut op = Operator::new(Cube::new(3).unwrap());
        op.play(&"F".parse().unwrap(), false, None).unwrap();
        let before = op.cube().colors().to_vec();

        let result = (|| {
            let mut query = op.save_history();
            assert!(!query.animation());
            query.play(&"R U".parse().unwrap(), false, None)?;
            query.play(&"4R".parse().unwrap(), false, None)
        })();

        assert!(result.is_err());
        assert_eq!(op.cube().colors(), before.as_slice());
        assert_eq!(op.move_count(), 1);
        assert!(op.animation());
    }

    #[test]
    fn animation_gates_annotation() {
        let recorder = Recorder::default();
        let mut op = Operator::with_annotation(Cube::new(3).unwrap(), Box::new(recorder.clone()));
        op.play(&"R".parse().unwrap(), false, None).unwrap();
        {
            let mut quiet = op.with_animation(Some(false));
            quiet.play(&"U".parse().unwrap(), false, None).unwrap();
            quiet.play(&"F".parse().unwrap(), false, Some(true)).unwrap();
        }
        op.play(&"D".parse().unwrap(), false, None).unwrap();
        assert_eq!(*recorder.0.borrow(), vec!["R", "F", "D"]);
    }
}
