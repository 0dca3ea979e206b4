//! Core collision detection system
//!
//! Colliders are registered on a [`Layer`] and tested once per tick against
//! every collider on an interacting layer. An update runs in two phases:
//!
//! 1. **Detect**: bounding-sphere cull, then the GJK narrow phase, collecting
//!    every intersecting pair without touching callbacks.
//! 2. **Dispatch**: each pair notifies both sides. Callbacks may unregister
//!    any collider, so both sides are re-resolved by [`ColliderId`] before
//!    each notification and missing ones are skipped.
//!
//! The engine never owns transforms. Colliders hold a [`TransformHandle`]
//! that is resolved through the world passed to [`CollisionEngine::update`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::foundation::collections::{TransformHandle, TransformSource};
use crate::foundation::math::Transform;
use crate::physics::collision::{BoundingSphere, ConvexMesh};
use crate::physics::collision_layers::{Layer, LayerMatrix, DUEL_PAIRS};
use crate::physics::gjk::{self, ConvexBody};

/// Stable identity of a registered collider; never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderId(u64);

impl fmt::Display for ColliderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "collider#{}", self.0)
    }
}

/// Collision tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionSettings {
    /// GJK iteration bound; exceeding it reports no intersection
    pub gjk_max_iterations: usize,
    /// Unordered layer pairs that are tested against each other
    pub interacting_layers: Vec<(Layer, Layer)>,
}

impl Default for CollisionSettings {
    fn default() -> Self {
        Self {
            gjk_max_iterations: gjk::DEFAULT_MAX_ITERATIONS,
            interacting_layers: DUEL_PAIRS.to_vec(),
        }
    }
}

impl CollisionSettings {
    /// Symmetric matrix built from [`Self::interacting_layers`]
    pub fn layer_matrix(&self) -> LayerMatrix {
        LayerMatrix::from_pairs(&self.interacting_layers)
    }
}

/// What a hit callback learns about the other side of a contact
#[derive(Debug, Clone, PartialEq)]
pub struct Contact<O> {
    /// The collider whose callback is running
    pub collider: ColliderId,
    /// The collider it touched
    pub other: ColliderId,
    /// Owner of the other collider
    pub other_owner: O,
    /// Layer of the other collider
    pub other_layer: Layer,
    /// World transform of the other collider at detection time
    pub other_transform: Transform,
    /// Tick length passed to [`CollisionEngine::update`]
    pub elapsed: f32,
}

/// Hit notification. Receives the engine so it can unregister colliders.
pub type HitCallback<W, O> = Box<dyn FnMut(&mut CollisionEngine<W, O>, &mut W, &Contact<O>)>;

/// Everything needed to register a collider except its callback
#[derive(Debug, Clone)]
pub struct ColliderDesc<O> {
    /// Gameplay identity reported to the other side of a contact
    pub owner: O,
    /// Local-to-world transform, owned elsewhere
    pub transform: TransformHandle,
    /// Shared convex geometry
    pub mesh: Arc<ConvexMesh>,
    /// Local-space cull radius, grown by the transform's largest scale
    pub cull_radius: f32,
    /// Layer the collider lives on
    pub layer: Layer,
}

struct Collider<W, O> {
    id: ColliderId,
    desc: ColliderDesc<O>,
    callback: Option<HitCallback<W, O>>,
}

/// A pair found during detection, dispatched after detection finishes
#[derive(Debug, Clone)]
struct PendingHit {
    first: ColliderId,
    second: ColliderId,
    /// Transforms of `first` and `second` as they were tested
    transforms: [Transform; 2],
}

/// Collision registry and two-phase detect-then-dispatch engine.
///
/// `W` is the gameplay world handed to callbacks (and used to resolve
/// transforms); `O` is the owner identity stored with each collider.
pub struct CollisionEngine<W, O> {
    layers: [Vec<Collider<W, O>>; Layer::COUNT],
    slots: HashMap<ColliderId, (Layer, usize)>,
    matrix: LayerMatrix,
    gjk_max_iterations: usize,
    next_id: u64,
}

impl<W, O> CollisionEngine<W, O>
where
    W: TransformSource,
    O: Clone,
{
    /// Create an engine with the given settings
    pub fn new(settings: &CollisionSettings) -> Self {
        Self::with_matrix(settings.layer_matrix(), settings.gjk_max_iterations)
    }

    /// Create an engine from an explicit layer matrix
    pub fn with_matrix(matrix: LayerMatrix, gjk_max_iterations: usize) -> Self {
        Self {
            layers: Default::default(),
            slots: HashMap::new(),
            matrix,
            gjk_max_iterations,
            next_id: 0,
        }
    }

    /// Layer matrix in use
    pub fn matrix(&self) -> &LayerMatrix {
        &self.matrix
    }

    /// Register a collider; `callback` runs for every contact it takes part in
    pub fn register(&mut self, desc: ColliderDesc<O>, callback: Option<HitCallback<W, O>>) -> ColliderId {
        let id = ColliderId(self.next_id);
        self.next_id += 1;

        let layer = desc.layer;
        let list = &mut self.layers[layer.index()];
        self.slots.insert(id, (layer, list.len()));
        list.push(Collider { id, desc, callback });
        log::trace!("Registered {} on {:?}", id, layer);
        id
    }

    /// Remove a collider. Unknown or already removed ids are ignored.
    pub fn unregister(&mut self, id: ColliderId) {
        let Some((layer, index)) = self.slots.remove(&id) else {
            return;
        };
        let list = &mut self.layers[layer.index()];
        list.swap_remove(index);
        if let Some(moved) = list.get(index) {
            self.slots.insert(moved.id, (layer, index));
        }
        log::trace!("Unregistered {}", id);
    }

    /// Whether `id` is currently registered
    pub fn contains(&self, id: ColliderId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Number of registered colliders
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no colliders are registered
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of colliders on one layer
    pub fn layer_len(&self, layer: Layer) -> usize {
        self.layers[layer.index()].len()
    }

    /// Registration data of a collider
    pub fn collider(&self, id: ColliderId) -> Option<&ColliderDesc<O>> {
        self.get(id).map(|collider| &collider.desc)
    }

    fn get(&self, id: ColliderId) -> Option<&Collider<W, O>> {
        let &(layer, index) = self.slots.get(&id)?;
        self.layers[layer.index()].get(index)
    }

    fn get_mut(&mut self, id: ColliderId) -> Option<&mut Collider<W, O>> {
        let &(layer, index) = self.slots.get(&id)?;
        self.layers[layer.index()].get_mut(index)
    }

    /// Test every interacting pair once and notify both sides of each hit.
    ///
    /// Returns the number of intersecting pairs found.
    pub fn update(&mut self, world: &mut W, elapsed: f32) -> usize {
        let hits = self.detect(world);
        for hit in &hits {
            let [first_transform, second_transform] = &hit.transforms;
            self.notify(world, hit.first, hit.second, second_transform, elapsed);
            self.notify(world, hit.second, hit.first, first_transform, elapsed);
        }
        hits.len()
    }

    fn detect(&self, world: &W) -> Vec<PendingHit> {
        let mut hits = Vec::new();
        for (layer_a, layer_b) in self.matrix.pairs() {
            let list_a = &self.layers[layer_a.index()];
            let list_b = &self.layers[layer_b.index()];
            for (i, a) in list_a.iter().enumerate() {
                // within one layer each unordered pair is visited once
                let others = if layer_a == layer_b { &list_b[i + 1..] } else { &list_b[..] };
                for b in others {
                    if let Some((transform_a, transform_b)) = self.overlapping(world, a, b) {
                        hits.push(PendingHit {
                            first: a.id,
                            second: b.id,
                            transforms: [transform_a.clone(), transform_b.clone()],
                        });
                    }
                }
            }
        }
        hits
    }

    /// Transforms of `a` and `b` if the two intersect
    fn overlapping<'w>(
        &self,
        world: &'w W,
        a: &Collider<W, O>,
        b: &Collider<W, O>,
    ) -> Option<(&'w Transform, &'w Transform)> {
        let (Some(transform_a), Some(transform_b)) = (
            world.transform(a.desc.transform),
            world.transform(b.desc.transform),
        ) else {
            log::trace!("Skipping {} / {}: transform no longer exists", a.id, b.id);
            return None;
        };

        let sphere_a = BoundingSphere::new(
            transform_a.position,
            a.desc.cull_radius * transform_a.max_scale(),
        );
        let sphere_b = BoundingSphere::new(
            transform_b.position,
            b.desc.cull_radius * transform_b.max_scale(),
        );
        if !sphere_a.intersects(&sphere_b) {
            return None;
        }

        gjk::intersects_with_limit(
            ConvexBody::new(&a.desc.mesh, transform_a),
            ConvexBody::new(&b.desc.mesh, transform_b),
            self.gjk_max_iterations,
        )
        .then_some((transform_a, transform_b))
    }

    fn notify(
        &mut self,
        world: &mut W,
        receiver: ColliderId,
        other: ColliderId,
        other_transform: &Transform,
        elapsed: f32,
    ) {
        let Some(other_collider) = self.get(other) else {
            log::debug!("Skipping hit on {}: {} was unregistered", receiver, other);
            return;
        };
        let contact = Contact {
            collider: receiver,
            other,
            other_owner: other_collider.desc.owner.clone(),
            other_layer: other_collider.desc.layer,
            other_transform: other_transform.clone(),
            elapsed,
        };

        let Some(slot) = self.get_mut(receiver) else {
            log::debug!("Skipping hit on {}: it was unregistered", receiver);
            return;
        };
        let Some(mut callback) = slot.callback.take() else {
            return;
        };

        callback(self, world, &contact);

        if let Some(slot) = self.get_mut(receiver) {
            if slot.callback.is_none() {
                slot.callback = Some(callback);
            }
        }
    }
}

impl<W, O> Default for CollisionEngine<W, O>
where
    W: TransformSource,
    O: Clone,
{
    fn default() -> Self {
        Self::new(&CollisionSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::TransformArena;
    use crate::foundation::math::Vec3;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Test world: transforms plus a log of (receiver, other owner) pairs
    #[derive(Default)]
    struct World {
        transforms: TransformArena,
        hits: Vec<(ColliderId, &'static str)>,
    }

    impl TransformSource for World {
        fn transform(&self, handle: TransformHandle) -> Option<&Transform> {
            self.transforms.get(handle)
        }
    }

    type Engine = CollisionEngine<World, &'static str>;
    type Hit = Contact<&'static str>;

    fn cube() -> Arc<ConvexMesh> {
        let mut vertices = Vec::new();
        for x in [-0.5, 0.5] {
            for y in [-0.5, 0.5] {
                for z in [-0.5, 0.5] {
                    vertices.push(Vec3::new(x, y, z));
                }
            }
        }
        Arc::new(ConvexMesh::new(vertices).unwrap())
    }

    fn recording() -> Option<HitCallback<World, &'static str>> {
        Some(Box::new(|_: &mut Engine, world: &mut World, contact: &Hit| {
            world.hits.push((contact.collider, contact.other_owner));
        }))
    }

    fn add(
        engine: &mut Engine,
        world: &mut World,
        owner: &'static str,
        layer: Layer,
        position: Vec3,
        callback: Option<HitCallback<World, &'static str>>,
    ) -> ColliderId {
        let transform = world.transforms.insert(Transform::from_position(position));
        let mesh = cube();
        let cull_radius = mesh.containing_radius();
        engine.register(
            ColliderDesc {
                owner,
                transform,
                mesh,
                cull_radius,
                layer,
            },
            callback,
        )
    }

    #[test]
    fn test_overlapping_interacting_pair_fires_once_per_side() {
        let mut engine = Engine::default();
        let mut world = World::default();
        let sword = add(&mut engine, &mut world, "sword", Layer::PlayerSword, Vec3::zeros(), recording());
        let body = add(&mut engine, &mut world, "body", Layer::EnemyBody, Vec3::zeros(), recording());

        assert_eq!(engine.update(&mut world, 0.016), 1);
        assert_eq!(world.hits, vec![(sword, "body"), (body, "sword")]);

        // and again next tick
        engine.update(&mut world, 0.016);
        assert_eq!(world.hits.len(), 4);
    }

    #[test]
    fn test_non_interacting_layers_never_fire() {
        let mut engine = Engine::default();
        let mut world = World::default();
        add(&mut engine, &mut world, "sword", Layer::PlayerSword, Vec3::zeros(), recording());
        add(&mut engine, &mut world, "self", Layer::PlayerBody, Vec3::zeros(), recording());
        add(&mut engine, &mut world, "ally", Layer::PlayerBody, Vec3::zeros(), recording());

        assert_eq!(engine.update(&mut world, 0.016), 0);
        assert!(world.hits.is_empty());
    }

    #[test]
    fn test_same_layer_pairs_are_tested_once() {
        let matrix = LayerMatrix::from_pairs(&[(Layer::EnemyBody, Layer::EnemyBody)]);
        let mut engine = Engine::with_matrix(matrix, gjk::DEFAULT_MAX_ITERATIONS);
        let mut world = World::default();
        for owner in ["a", "b", "c"] {
            add(&mut engine, &mut world, owner, Layer::EnemyBody, Vec3::zeros(), recording());
        }

        assert_eq!(engine.update(&mut world, 0.016), 3);
        assert_eq!(world.hits.len(), 6);
    }

    #[test]
    fn test_separated_colliders_do_not_fire() {
        let mut engine = Engine::default();
        let mut world = World::default();
        add(&mut engine, &mut world, "sword", Layer::PlayerSword, Vec3::zeros(), recording());
        add(&mut engine, &mut world, "body", Layer::EnemyBody, Vec3::new(3.0, 0.0, 0.0), recording());

        assert_eq!(engine.update(&mut world, 0.016), 0);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let mut engine = Engine::default();
        let mut world = World::default();
        let a = add(&mut engine, &mut world, "a", Layer::EnemyBody, Vec3::zeros(), None);
        let b = add(&mut engine, &mut world, "b", Layer::EnemyBody, Vec3::zeros(), None);
        let c = add(&mut engine, &mut world, "c", Layer::EnemyBody, Vec3::zeros(), None);

        engine.unregister(a);
        engine.unregister(a);
        engine.unregister(ColliderId(999));

        assert_eq!(engine.len(), 2);
        assert_eq!(engine.layer_len(Layer::EnemyBody), 2);
        assert!(!engine.contains(a));
        // the swapped element still resolves
        assert_eq!(engine.collider(c).map(|desc| desc.owner), Some("c"));
        assert_eq!(engine.collider(b).map(|desc| desc.owner), Some("b"));
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut engine = Engine::default();
        let mut world = World::default();
        let a = add(&mut engine, &mut world, "a", Layer::EnemyBody, Vec3::zeros(), None);
        engine.unregister(a);
        let b = add(&mut engine, &mut world, "b", Layer::EnemyBody, Vec3::zeros(), None);
        assert!(b > a);
        assert!(!engine.contains(a));
    }

    #[test]
    fn test_callback_unregistering_a_later_collider_is_safe() {
        let mut engine = Engine::default();
        let mut world = World::default();

        let victim: Rc<RefCell<Option<ColliderId>>> = Rc::new(RefCell::new(None));
        let target = Rc::clone(&victim);
        let destroyer: HitCallback<World, &'static str> =
            Box::new(move |engine: &mut Engine, world: &mut World, contact: &Hit| {
                world.hits.push((contact.collider, contact.other_owner));
                if let Some(id) = target.borrow_mut().take() {
                    engine.unregister(id);
                }
            });

        let sword = add(&mut engine, &mut world, "sword", Layer::PlayerSword, Vec3::zeros(), Some(destroyer));
        let first = add(&mut engine, &mut world, "first", Layer::EnemyBody, Vec3::zeros(), recording());
        let second = add(&mut engine, &mut world, "second", Layer::EnemyBody, Vec3::zeros(), recording());
        *victim.borrow_mut() = Some(second);

        // both pairs are detected before anything is dispatched
        assert_eq!(engine.update(&mut world, 0.016), 2);

        // second was removed by the sword's first callback, so neither side of
        // the second pair is notified
        assert_eq!(world.hits, vec![(sword, "first"), (first, "sword")]);
        assert!(!engine.contains(second));
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_callback_unregistering_itself_is_safe() {
        let mut engine = Engine::default();
        let mut world = World::default();
        let suicide: HitCallback<World, &'static str> =
            Box::new(|engine: &mut Engine, world: &mut World, contact: &Hit| {
                world.hits.push((contact.collider, contact.other_owner));
                engine.unregister(contact.collider);
            });

        let sword = add(&mut engine, &mut world, "sword", Layer::PlayerSword, Vec3::zeros(), Some(suicide));
        add(&mut engine, &mut world, "a", Layer::EnemyBody, Vec3::zeros(), recording());
        add(&mut engine, &mut world, "b", Layer::EnemyBody, Vec3::zeros(), recording());

        engine.update(&mut world, 0.016);
        assert!(!engine.contains(sword));
        // only the sword's first notification ran; every later one is skipped
        assert_eq!(world.hits, vec![(sword, "a")]);
    }

    #[test]
    fn test_missing_transform_is_skipped() {
        let mut engine = Engine::default();
        let mut world = World::default();
        add(&mut engine, &mut world, "sword", Layer::PlayerSword, Vec3::zeros(), recording());
        let body = add(&mut engine, &mut world, "body", Layer::EnemyBody, Vec3::zeros(), recording());

        let handle = engine.collider(body).map(|desc| desc.transform).unwrap();
        world.transforms.remove(handle);

        assert_eq!(engine.update(&mut world, 0.016), 0);
        assert!(world.hits.is_empty());
    }

    #[test]
    fn test_contact_carries_other_transform() {
        let mut engine = Engine::default();
        let mut world = World::default();
        let seen: Rc<RefCell<Vec<Hit>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let callback: HitCallback<World, &'static str> = Box::new(move |_: &mut Engine, _: &mut World, contact: &Hit| {
            sink.borrow_mut().push(contact.clone());
        });

        add(&mut engine, &mut world, "sword", Layer::EnemySword, Vec3::zeros(), Some(callback));
        let body = add(&mut engine, &mut world, "body", Layer::PlayerBody, Vec3::new(0.5, 0.0, 0.0), None);

        engine.update(&mut world, 0.25);
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].other, body);
        assert_eq!(seen[0].other_layer, Layer::PlayerBody);
        assert_eq!(seen[0].other_transform.position, Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(seen[0].elapsed, 0.25);
    }

    #[test]
    fn test_contact_transform_is_the_one_that_was_tested() {
        let mut engine = Engine::default();
        let mut world = World::default();
        let seen: Rc<RefCell<Vec<Hit>>> = Rc::default();
        let sink = Rc::clone(&seen);

        // the sword is notified first and throws itself across the arena
        let sword_handle = world.transforms.insert(Transform::from_position(Vec3::zeros()));
        let throw: HitCallback<World, &'static str> = Box::new(move |_: &mut Engine, world: &mut World, _: &Hit| {
            world.transforms[sword_handle].position = Vec3::new(50.0, 0.0, 0.0);
        });
        let mesh = cube();
        let cull_radius = mesh.containing_radius();
        engine.register(
            ColliderDesc {
                owner: "sword",
                transform: sword_handle,
                mesh,
                cull_radius,
                layer: Layer::PlayerSword,
            },
            Some(throw),
        );

        let record: HitCallback<World, &'static str> = Box::new(move |_: &mut Engine, _: &mut World, contact: &Hit| {
            sink.borrow_mut().push(contact.clone());
        });
        add(&mut engine, &mut world, "body", Layer::EnemyBody, Vec3::new(0.5, 0.0, 0.0), Some(record));

        assert_eq!(engine.update(&mut world, 0.016), 1);
        assert_eq!(world.transforms[sword_handle].position, Vec3::new(50.0, 0.0, 0.0));
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].other_owner, "sword");
        assert_eq!(seen[0].other_transform.position, Vec3::zeros());
    }

    #[test]
    fn test_scaled_transform_grows_cull_sphere() {
        let mut engine = Engine::default();
        let mut world = World::default();
        add(&mut engine, &mut world, "sword", Layer::PlayerSword, Vec3::zeros(), recording());
        let body = add(&mut engine, &mut world, "body", Layer::EnemyBody, Vec3::new(1.8, 0.0, 0.0), recording());
        assert_eq!(engine.update(&mut world, 0.016), 0);

        let handle = engine.collider(body).map(|desc| desc.transform).unwrap();
        world.transforms[handle].scale = Vec3::new(3.0, 3.0, 3.0);
        assert_eq!(engine.update(&mut world, 0.016), 1);
    }
}
