//! Reference frame graph
//!
//! Frames register into a [`FrameGraph`] keyed by name, each carrying a link
//! to its declared parent and the transform function for that edge. The
//! graph resolves the minimal edge sequence between any two frames and
//! composes the elementary transforms along it, applying them to a 6-element
//! state at a requested epoch.
//!
//! The graph is read-mostly: frames are registered once at startup (plus the
//! occasional station leaf) and never mutated, so lookups and resolved-path
//! caching are shared across threads.

pub mod path;
mod iau1980_tree;
mod transform;

pub use iau1980_tree::{iau1980_graph, EME2000, G50, ITRF, MOD, PEF, TEME, TOD, WGS84};
pub use transform::{Form, FrameTransform, State};

use crate::timelib::Epoch;
use crate::{FramefieldError, Result};
use path::NodeGraph;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Edge transform function: child-to-parent transform at an epoch.
pub type TransformFn = Arc<dyn Fn(&Epoch) -> Result<FrameTransform> + Send + Sync>;

/// Link from a frame to its declared parent.
pub struct ParentLink {
    name: String,
    transform: TransformFn,
}

/// A reference frame: identity, parent link, and composition-order flag.
///
/// Immutable once registered.
pub struct Frame {
    name: String,
    parent: Option<ParentLink>,
    rotation_before_translation: bool,
}

impl Frame {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_name(&self) -> Option<&str> {
        self.parent.as_ref().map(|p| p.name.as_str())
    }

    /// Whether this frame's edge rotates into the parent orientation before
    /// applying the translation offset (topocentric convention) or after
    /// (planetocentric convention).
    pub fn rotation_before_translation(&self) -> bool {
        self.rotation_before_translation
    }

    /// Evaluate the child-to-parent transform at an epoch; identity for a
    /// root frame.
    pub fn to_parent(&self, epoch: &Epoch) -> Result<FrameTransform> {
        match &self.parent {
            Some(link) => (link.transform)(epoch),
            None => Ok(FrameTransform::identity()),
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("name", &self.name)
            .field("parent", &self.parent_name())
            .field(
                "rotation_before_translation",
                &self.rotation_before_translation,
            )
            .finish()
    }
}

/// Registry of frames plus the undirected view of their parent links.
#[derive(Default)]
pub struct FrameGraph {
    frames: RwLock<HashMap<String, Arc<Frame>>>,
    links: RwLock<NodeGraph>,
    path_cache: Mutex<HashMap<(String, String), Arc<Vec<(String, String)>>>>,
}

impl FrameGraph {
    pub fn new() -> Self {
        FrameGraph::default()
    }

    /// Register a frame.
    ///
    /// A root frame passes no parent; every other frame passes its parent's
    /// name together with the child-to-parent transform function. The parent
    /// must already be registered and names must be unique. Registration
    /// invalidates cached paths so late-added leaves (stations) resolve
    /// correctly.
    pub fn register_frame(
        &self,
        name: &str,
        parent: Option<(&str, TransformFn)>,
        rotation_before_translation: bool,
    ) -> Result<Arc<Frame>> {
        let mut frames = self.write_frames();
        if frames.contains_key(name) {
            return Err(FramefieldError::DuplicateFrame(name.to_owned()));
        }
        if let Some((parent_name, _)) = &parent {
            if !frames.contains_key(*parent_name) {
                return Err(FramefieldError::UnknownFrame((*parent_name).to_owned()));
            }
        }

        let frame = Arc::new(Frame {
            name: name.to_owned(),
            parent: parent.map(|(parent_name, transform)| ParentLink {
                name: parent_name.to_owned(),
                transform,
            }),
            rotation_before_translation,
        });
        frames.insert(name.to_owned(), Arc::clone(&frame));

        let mut links = self.write_links();
        links.add_node(name);
        if let Some(parent_name) = frame.parent_name() {
            links.add_edge(name, parent_name);
        }
        self.lock_cache().clear();

        Ok(frame)
    }

    /// Look up a frame by name.
    pub fn get(&self, name: &str) -> Result<Arc<Frame>> {
        self.read_frames()
            .get(name)
            .cloned()
            .ok_or_else(|| FramefieldError::UnknownFrame(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read_frames().contains_key(name)
    }

    /// The minimal node sequence between two frames, endpoints included.
    pub fn find_path(&self, source: &str, dest: &str) -> Result<Vec<String>> {
        for name in [source, dest] {
            if !self.contains(name) {
                return Err(FramefieldError::UnknownFrame(name.to_owned()));
            }
        }
        self.read_links()
            .path(source, dest)
            .ok_or_else(|| FramefieldError::NoRoute {
                from: source.to_owned(),
                to: dest.to_owned(),
            })
    }

    /// The minimal edge sequence between two frames, cached per pair.
    pub fn steps(&self, source: &str, dest: &str) -> Result<Arc<Vec<(String, String)>>> {
        let key = (source.to_owned(), dest.to_owned());
        if let Some(hit) = self.lock_cache().get(&key) {
            return Ok(Arc::clone(hit));
        }
        let path = self.find_path(source, dest)?;
        let steps: Arc<Vec<(String, String)>> = Arc::new(
            path.windows(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect(),
        );
        self.lock_cache().insert(key, Arc::clone(&steps));
        Ok(steps)
    }

    /// Express a state in another frame at the given epoch.
    ///
    /// The source frame is the one the state is tagged with. Spherical input
    /// is converted to cartesian before composing; the output is cartesian,
    /// tagged with the destination frame. A state already in the destination
    /// frame comes back unchanged.
    pub fn transform(&self, state: &State, dest: &str, epoch: &Epoch) -> Result<State> {
        self.get(&state.frame)?;
        if state.frame == dest {
            return Ok(state.clone());
        }
        let steps = self.steps(&state.frame, dest)?;

        let cartesian = state.to_cartesian();
        let mut position = cartesian.position;
        let mut velocity = cartesian.velocity;

        for (from, to) in steps.iter() {
            let (edge_owner, forward) = self.edge(from, to)?;
            let raw = edge_owner.to_parent(epoch)?;
            let flag = edge_owner.rotation_before_translation();
            let elementary = if forward { raw } else { raw.inverse(flag) };
            let (p, v) = elementary.apply(flag, &position, &velocity);
            position = p;
            velocity = v;
        }

        Ok(State::cartesian(dest, position, velocity))
    }

    /// Resolve the frame owning the edge between two adjacent frames, and
    /// whether the step runs child-to-parent (forward).
    fn edge(&self, from: &str, to: &str) -> Result<(Arc<Frame>, bool)> {
        let from_frame = self.get(from)?;
        if from_frame.parent_name() == Some(to) {
            return Ok((from_frame, true));
        }
        let to_frame = self.get(to)?;
        if to_frame.parent_name() == Some(from) {
            return Ok((to_frame, false));
        }
        Err(FramefieldError::NoRoute {
            from: from.to_owned(),
            to: to.to_owned(),
        })
    }

    fn read_frames(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Frame>>> {
        self.frames.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_frames(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Frame>>> {
        self.frames.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read_links(&self) -> RwLockReadGuard<'_, NodeGraph> {
        self.links.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_links(&self) -> RwLockWriteGuard<'_, NodeGraph> {
        self.links.write().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_cache(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<(String, String), Arc<Vec<(String, String)>>>> {
        self.path_cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrixlib::rot3;
    use crate::timelib::TimeScale;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn epoch() -> Epoch {
        Epoch::new(53101.0, TimeScale::Tt)
    }

    fn rotation_edge(angle: f64) -> TransformFn {
        Arc::new(move |_| Ok(FrameTransform::rotation(rot3(angle))))
    }

    /// root -- mid -- leaf, plus an offset frame hanging off mid
    fn small_graph() -> FrameGraph {
        let g = FrameGraph::new();
        g.register_frame("root", None, false).unwrap();
        g.register_frame("mid", Some(("root", rotation_edge(0.3))), false)
            .unwrap();
        g.register_frame("leaf", Some(("mid", rotation_edge(-1.1))), false)
            .unwrap();
        let offset: TransformFn = Arc::new(|_| {
            Ok(FrameTransform {
                rotation: rot3(0.9),
                translation: Vector3::new(100.0, -40.0, 7.0),
                angular_velocity: None,
            })
        });
        g.register_frame("offset", Some(("mid", offset)), true).unwrap();
        g
    }

    #[test]
    fn test_register_duplicate_rejected() {
        let g = small_graph();
        assert!(matches!(
            g.register_frame("mid", None, false),
            Err(FramefieldError::DuplicateFrame(_))
        ));
    }

    #[test]
    fn test_register_unknown_parent_rejected() {
        let g = small_graph();
        assert!(matches!(
            g.register_frame("x", Some(("nope", rotation_edge(0.0))), false),
            Err(FramefieldError::UnknownFrame(_))
        ));
    }

    #[test]
    fn test_find_path() {
        let g = small_graph();
        assert_eq!(g.find_path("leaf", "root").unwrap(), ["leaf", "mid", "root"]);
        assert_eq!(
            g.find_path("leaf", "offset").unwrap(),
            ["leaf", "mid", "offset"]
        );
    }

    #[test]
    fn test_no_route() {
        let g = small_graph();
        g.register_frame("island", None, false).unwrap();
        assert!(matches!(
            g.find_path("root", "island"),
            Err(FramefieldError::NoRoute { .. })
        ));
        assert!(matches!(
            g.find_path("root", "ghost"),
            Err(FramefieldError::UnknownFrame(_))
        ));
    }

    #[test]
    fn test_steps_cached_and_stable() {
        let g = small_graph();
        let first = g.steps("leaf", "root").unwrap();
        let second = g.steps("leaf", "root").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_cache_invalidated_by_registration() {
        let g = small_graph();
        let before = g.steps("leaf", "root").unwrap();
        g.register_frame("late", Some(("root", rotation_edge(0.1))), false)
            .unwrap();
        let after = g.steps("leaf", "root").unwrap();
        // Same content, freshly resolved
        assert_eq!(*before, *after);
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_identity_transform_exact() {
        let g = small_graph();
        let s = State::cartesian(
            "mid",
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(4.0, 5.0, 6.0),
        );
        let out = g.transform(&s, "mid", &epoch()).unwrap();
        assert_eq!(out, s);
    }

    #[test]
    fn test_single_edge_matches_direct_application() {
        let g = small_graph();
        let p = Vector3::new(10.0, 20.0, 30.0);
        let v = Vector3::new(-1.0, 0.5, 2.0);
        let out = g
            .transform(&State::cartesian("mid", p, v), "root", &epoch())
            .unwrap();
        let expected_p = rot3(0.3) * p;
        let expected_v = rot3(0.3) * v;
        for i in 0..3 {
            assert_relative_eq!(out.position[i], expected_p[i], epsilon = 1e-12);
            assert_relative_eq!(out.velocity[i], expected_v[i], epsilon = 1e-12);
        }
        assert_eq!(out.frame, "root");
    }

    #[test]
    fn test_round_trip_through_offset_frame() {
        let g = small_graph();
        let s = State::cartesian(
            "offset",
            Vector3::new(7.0, 8.0, 9.0),
            Vector3::new(0.1, -0.2, 0.3),
        );
        let there = g.transform(&s, "leaf", &epoch()).unwrap();
        let back = g.transform(&there, "offset", &epoch()).unwrap();
        for i in 0..3 {
            assert_relative_eq!(back.position[i], s.position[i], epsilon = 1e-8);
            assert_relative_eq!(back.velocity[i], s.velocity[i], epsilon = 1e-8);
        }
    }

    #[test]
    fn test_spherical_input_converted() {
        let g = small_graph();
        let cart = State::cartesian(
            "mid",
            Vector3::new(1000.0, 2000.0, -500.0),
            Vector3::new(1.0, 2.0, 3.0),
        );
        let sph = cart.to_spherical();
        let from_cart = g.transform(&cart, "root", &epoch()).unwrap();
        let from_sph = g.transform(&sph, "root", &epoch()).unwrap();
        assert_eq!(from_sph.form, Form::Cartesian);
        for i in 0..3 {
            assert_relative_eq!(from_sph.position[i], from_cart.position[i], epsilon = 1e-6);
            assert_relative_eq!(from_sph.velocity[i], from_cart.velocity[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_transform_unknown_source() {
        let g = small_graph();
        let s = State::cartesian("ghost", Vector3::zeros(), Vector3::zeros());
        assert!(matches!(
            g.transform(&s, "root", &epoch()),
            Err(FramefieldError::UnknownFrame(_))
        ));
    }
}
