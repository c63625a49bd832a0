//! Stateless adapters between the actor and a caller-owned pose buffer.
//!
//! The pose buffer is just a slice of bone rotations. The actor never holds
//! on to it; the host's animation graph owns it and calls these functions
//! around [`PhysiologicalActor::step`](crate::PhysiologicalActor::step).

use soma_core::{UnitQuaternion, Vec3};

/// Torque per radian of bone z-rotation used by [`extract_torques`].
pub const LEGACY_TORQUE_GAIN: f32 = 10.0;

/// Write Euler joint angles (x roll, y pitch, z yaw) into `pose` as
/// quaternions. Bones beyond the shorter of the two slices are untouched.
/// Returns the number of bones written.
pub fn write_pose(angles: &[Vec3], pose: &mut [UnitQuaternion<f32>]) -> usize {
    let n = angles.len().min(pose.len());
    for (bone, angle) in pose.iter_mut().zip(angles) {
        *bone = UnitQuaternion::from_euler_angles(angle.x, angle.y, angle.z);
    }
    n
}

/// Desired torques for a pose produced by a legacy animation node: ten
/// times each bone's z rotation. The result has exactly `segments` entries,
/// zero-padded when the pose has fewer bones.
pub fn extract_torques(pose: &[UnitQuaternion<f32>], segments: usize) -> Vec<f32> {
    let mut torques = vec![0.0; segments];
    for (t, bone) in torques.iter_mut().zip(pose) {
        let (_, _, yaw) = bone.euler_angles();
        *t = LEGACY_TORQUE_GAIN * yaw;
    }
    torques
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_pose_round_trips_euler() {
        let angles = vec![Vec3::new(0.1, -0.2, 0.3), Vec3::new(0.0, 0.0, -0.5)];
        let mut pose = vec![UnitQuaternion::identity(); 3];
        assert_eq!(write_pose(&angles, &mut pose), 2);
        let (r, p, y) = pose[0].euler_angles();
        assert!((r - 0.1).abs() < 1e-5);
        assert!((p + 0.2).abs() < 1e-5);
        assert!((y - 0.3).abs() < 1e-5);
        assert_eq!(pose[2], UnitQuaternion::identity());
    }

    #[test]
    fn test_write_pose_short_buffer() {
        let angles = vec![Vec3::new(0.0, 0.0, 0.2); 4];
        let mut pose = vec![UnitQuaternion::identity(); 2];
        assert_eq!(write_pose(&angles, &mut pose), 2);
    }

    #[test]
    fn test_extract_torques_legacy_gain() {
        let pose = vec![
            UnitQuaternion::from_euler_angles(0.0, 0.0, 0.25),
            UnitQuaternion::from_euler_angles(0.0, 0.0, -0.1),
        ];
        let torques = extract_torques(&pose, 4);
        assert_eq!(torques.len(), 4);
        assert!((torques[0] - 2.5).abs() < 1e-4);
        assert!((torques[1] + 1.0).abs() < 1e-4);
        assert_eq!(&torques[2..], &[0.0, 0.0]);
    }

    #[test]
    fn test_extract_torques_truncates() {
        let pose = vec![UnitQuaternion::from_euler_angles(0.0, 0.0, 0.1); 5];
        assert_eq!(extract_torques(&pose, 2).len(), 2);
    }
}
