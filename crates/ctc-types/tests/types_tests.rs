//! 类型层性质测试

use approx::assert_relative_eq;
use ctc_types::nalgebra::{Isometry3, Vector3};
use ctc_types::{JointSet, JointVector, TaskAxis, Twist};
use proptest::prelude::*;
use std::collections::HashSet;

proptest! {
    #[test]
    fn prop_joint_set_lookup_matches_order(
        names in prop::collection::hash_set("[a-z][a-z0-9_]{0,8}", 1..12)
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let set = JointSet::new(names.iter().map(String::as_str)).unwrap();
        prop_assert_eq!(set.len(), names.len());
        for (i, name) in names.iter().enumerate() {
            prop_assert_eq!(set.index_of(name), Some(i));
            prop_assert_eq!(set.name(i), Some(name.as_str()));
        }
        prop_assert!(!set.contains("NOT_A_JOINT"));
    }

    #[test]
    fn prop_clone_from_reuses_buffer(values in prop::collection::vec(-1e3f64..1e3, 1..16)) {
        let source = JointVector::from(values.clone());
        let mut target = JointVector::zeros(values.len());
        let before = target.as_ptr();
        target.clone_from(&source);
        prop_assert_eq!(target.as_ptr(), before);
        prop_assert_eq!(target.as_slice(), values.as_slice());
    }

    #[test]
    fn prop_twist_axis_access(values in prop::array::uniform6(-10.0f64..10.0)) {
        let mut twist = Twist::zero();
        for (axis, value) in TaskAxis::ALL.iter().zip(values) {
            twist.set_axis(*axis, value);
        }
        let vector = twist.to_vector();
        for (i, axis) in TaskAxis::ALL.iter().enumerate() {
            prop_assert_eq!(twist.axis(*axis), values[i]);
            prop_assert_eq!(vector[i], values[i]);
        }
    }
}

#[test]
fn test_duplicate_names_rejected() {
    assert!(JointSet::new(["a", "b", "a"]).is_err());
    let unique: HashSet<&str> = ["a", "b"].into_iter().collect();
    assert_eq!(JointSet::new(unique).unwrap().len(), 2);
}

#[test]
fn test_pose_composition_with_twist_axes() {
    // 绕 z 轴转 90° 后沿 x 平移，等价于世界坐标系中沿 y 平移
    let pose = Isometry3::new(Vector3::zeros(), Vector3::z() * std::f64::consts::FRAC_PI_2);
    let moved = pose * Isometry3::translation(1.0, 0.0, 0.0);
    let mut twist = Twist::zero();
    twist.set_axis(TaskAxis::LinearY, moved.translation.vector.y);
    assert_relative_eq!(twist.axis(TaskAxis::LinearY), 1.0, epsilon = 1e-12);
    assert_relative_eq!(moved.translation.vector.x, 0.0, epsilon = 1e-12);
}
