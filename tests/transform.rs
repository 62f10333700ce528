extern crate pigment;
#[macro_use]
extern crate approx;

use pigment::prelude::*;

#[test]
fn world_matrices() {
    let mut tree = TransformTree::new();
    let root = tree.create(Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0)));
    let arm = tree
        .create_child(root, Matrix4::from_translation(Vector3::new(0.0, 2.0, 0.0)))
        .unwrap();
    let hand = tree
        .create_child(arm, Matrix4::from_nonuniform_scale(2.0, 2.0, 2.0))
        .unwrap();

    tree.update_world_matrices();
    let p = tree
        .world_matrix(hand)
        .unwrap()
        .transform_point(Point3::new(1.0, 1.0, 1.0));
    assert_relative_eq!(p, Point3::new(3.0, 4.0, 2.0));
    assert!(!tree.is_dirty(hand));
}

#[test]
fn dirty_propagation() {
    let mut tree = TransformTree::new();
    let root = tree.create(Matrix4::identity());
    let child = tree.create_child(root, Matrix4::identity()).unwrap();
    let other = tree.create(Matrix4::identity());
    tree.update_world_matrices();

    tree.translate(root, Vector3::new(0.0, 0.0, -5.0)).unwrap();
    assert!(tree.is_dirty(child));
    assert!(!tree.is_dirty(other));

    // The cache stays stale until it is refreshed.
    assert_relative_eq!(tree.world_matrix(child).unwrap(), Matrix4::identity());
    assert_relative_eq!(
        tree.compute_world_matrix(child).unwrap(),
        Matrix4::from_translation(Vector3::new(0.0, 0.0, -5.0))
    );

    tree.update_world_matrices();
    assert!(!tree.is_dirty(child));
    assert_relative_eq!(
        tree.world_matrix(child).unwrap(),
        Matrix4::from_translation(Vector3::new(0.0, 0.0, -5.0))
    );
}

#[test]
fn reparenting() {
    let mut tree = TransformTree::new();
    let a = tree.create(Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0)));
    let b = tree.create(Matrix4::from_translation(Vector3::new(0.0, 1.0, 0.0)));
    let c = tree.create_child(a, Matrix4::identity()).unwrap();

    tree.set_parent(c, Some(b)).unwrap();
    assert_eq!(tree.parent(c), Some(b));
    assert!(tree.children(a).is_empty());

    tree.update_world_matrices();
    assert_relative_eq!(
        tree.world_matrix(c).unwrap(),
        Matrix4::from_translation(Vector3::new(0.0, 1.0, 0.0))
    );

    tree.remove(c).unwrap();
    assert!(!tree.contains(c));
    assert!(tree.translate(c, Vector3::new(1.0, 0.0, 0.0)).is_err());
}
