//! 设定值写端（非实时侧）
//!
//! 每个控制器变体只接受一种设定值：
//! - 关节空间变体：`JointVector`（按控制器关节顺序的位置或速度）
//! - 任务空间速度变体：[`Twist`]
//! - 任务空间位姿变体：[`Pose`]
//!
//! 写入前完成名称解析、长度和有限性校验，校验失败时通道保持不变。

use crate::error::SetpointError;
use ctc_realtime::{ChannelMetrics, RealtimeWriter};
use ctc_types::{JointSet, JointVector, Pose, TaskAxis, Twist};
use std::sync::Arc;
use tracing::debug;

/// 设定值写端
///
/// 可以 `Clone` 后分发给多个生产者线程，写入互斥由内部的写端锁保证。
#[derive(Debug)]
pub struct SetpointWriter<S> {
    joints: JointSet,
    channel: RealtimeWriter<S>,
}

impl<S> Clone for SetpointWriter<S> {
    fn clone(&self) -> Self {
        Self {
            joints: self.joints.clone(),
            channel: self.channel.clone(),
        }
    }
}

impl<S: Clone> SetpointWriter<S> {
    pub(crate) fn new(joints: JointSet, channel: RealtimeWriter<S>) -> Self {
        Self { joints, channel }
    }

    /// 控制器的关节顺序
    pub fn joints(&self) -> &JointSet {
        &self.joints
    }

    /// 最近一次写入的设定值
    pub fn latest(&self) -> S {
        self.channel.latest()
    }

    /// 通道指标
    pub fn metrics(&self) -> &Arc<ChannelMetrics> {
        self.channel.metrics()
    }
}

impl SetpointWriter<JointVector> {
    /// 更新单个关节，其余关节保持最近一次写入的值
    pub fn write_joint(&self, name: &str, value: f64) -> Result<(), SetpointError> {
        let index = self.resolve(name)?;
        check_finite(name, value)?;
        self.channel.write_with(|setpoint| setpoint[index] = value);
        debug!(joint = name, value, "joint setpoint written");
        Ok(())
    }

    /// 同时更新多个关节（原子地作为一个快照发布）
    pub fn write_joints<'a, I>(&self, entries: I) -> Result<(), SetpointError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut updates = Vec::new();
        for (name, value) in entries {
            let index = self.resolve(name)?;
            check_finite(name, value)?;
            updates.push((index, value));
        }
        self.channel.write_with(|setpoint| {
            for &(index, value) in &updates {
                setpoint[index] = value;
            }
        });
        debug!(count = updates.len(), "joint setpoints written");
        Ok(())
    }

    /// 按控制器关节顺序写入全部关节
    pub fn write_all(&self, values: &[f64]) -> Result<(), SetpointError> {
        if values.len() != self.joints.len() {
            return Err(SetpointError::LengthMismatch {
                expected: self.joints.len(),
                actual: values.len(),
            });
        }
        for (i, value) in values.iter().enumerate() {
            check_finite(self.joints.name(i).unwrap_or("?"), *value)?;
        }
        self.channel
            .write_with(|setpoint| setpoint.copy_from_slice(values));
        debug!(?values, "joint setpoints written");
        Ok(())
    }

    fn resolve(&self, name: &str) -> Result<usize, SetpointError> {
        self.joints
            .index_of(name)
            .ok_or_else(|| SetpointError::UnknownJoint {
                name: name.to_string(),
            })
    }
}

impl SetpointWriter<Twist> {
    /// 写入完整的任务空间速度
    pub fn write_twist(&self, twist: Twist) -> Result<(), SetpointError> {
        if !twist.is_finite() {
            return Err(SetpointError::NonFinite {
                target: "twist".to_string(),
            });
        }
        self.channel.write(&twist);
        debug!(?twist, "twist setpoint written");
        Ok(())
    }

    /// 更新单个任务空间轴
    pub fn write_axis(&self, axis: TaskAxis, value: f64) -> Result<(), SetpointError> {
        check_finite(axis.name(), value)?;
        self.channel.write_with(|twist| twist.set_axis(axis, value));
        debug!(%axis, value, "twist axis written");
        Ok(())
    }
}

impl SetpointWriter<Pose> {
    /// 写入末端目标位姿
    pub fn write_pose(&self, pose: Pose) -> Result<(), SetpointError> {
        let finite = pose.translation.vector.iter().all(|v| v.is_finite())
            && pose.rotation.coords.iter().all(|v| v.is_finite());
        if !finite {
            return Err(SetpointError::NonFinite {
                target: "pose".to_string(),
            });
        }
        self.channel.write(&pose);
        debug!(?pose, "pose setpoint written");
        Ok(())
    }
}

fn check_finite(target: &str, value: f64) -> Result<(), SetpointError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SetpointError::NonFinite {
            target: target.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctc_realtime::realtime_buffer;
    use ctc_types::nalgebra::Vector3;

    fn joint_writer() -> (
        SetpointWriter<JointVector>,
        ctc_realtime::RealtimeReader<JointVector>,
    ) {
        let joints = JointSet::new(["a", "b", "c"]).unwrap();
        let (writer, reader) = realtime_buffer(JointVector::zeros(3));
        (SetpointWriter::new(joints, writer), reader)
    }

    #[test]
    fn test_write_joint_by_name() {
        let (writer, mut reader) = joint_writer();
        writer.write_joint("b", 1.5).unwrap();
        writer.write_joint("c", -0.5).unwrap();
        assert_eq!(reader.read().as_slice(), &[0.0, 1.5, -0.5]);
    }

    #[test]
    fn test_write_joints_batch() {
        let (writer, mut reader) = joint_writer();
        writer.write_joints([("c", 3.0), ("a", 1.0)]).unwrap();
        assert_eq!(reader.read().as_slice(), &[1.0, 0.0, 3.0]);
        assert_eq!(writer.metrics().snapshot().writes, 1);
    }

    #[test]
    fn test_rejected_writes_leave_channel_untouched() {
        let (writer, mut reader) = joint_writer();
        writer.write_all(&[1.0, 2.0, 3.0]).unwrap();
        reader.read();

        assert_eq!(
            writer.write_joint("wrist", 1.0),
            Err(SetpointError::UnknownJoint {
                name: "wrist".to_string()
            })
        );
        assert_eq!(
            writer.write_joint("a", f64::NAN),
            Err(SetpointError::NonFinite {
                target: "a".to_string()
            })
        );
        // 批量写入中任意一项无效则整体拒绝
        assert!(writer.write_joints([("a", 5.0), ("x", 1.0)]).is_err());
        assert_eq!(
            writer.write_all(&[1.0, 2.0]),
            Err(SetpointError::LengthMismatch {
                expected: 3,
                actual: 2
            })
        );
        assert!(writer.write_all(&[1.0, f64::INFINITY, 0.0]).is_err());

        assert!(!reader.has_update());
        assert_eq!(reader.read().as_slice(), &[1.0, 2.0, 3.0]);
        assert_eq!(writer.latest().as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_twist_writer() {
        let joints = JointSet::new(["a"]).unwrap();
        let (channel, mut reader) = realtime_buffer(Twist::zero());
        let writer = SetpointWriter::new(joints, channel);

        writer
            .write_twist(Twist::new(Vector3::new(0.1, 0.0, 0.0), Vector3::zeros()))
            .unwrap();
        writer.write_axis(TaskAxis::AngularZ, 0.5).unwrap();
        let twist = *reader.read();
        assert_eq!(twist.linear.x, 0.1);
        assert_eq!(twist.angular.z, 0.5);

        let bad = Twist::new(Vector3::new(f64::NAN, 0.0, 0.0), Vector3::zeros());
        assert!(writer.write_twist(bad).is_err());
    }

    #[test]
    fn test_pose_writer() {
        let joints = JointSet::new(["a"]).unwrap();
        let (channel, mut reader) = realtime_buffer(Pose::identity());
        let writer = SetpointWriter::new(joints, channel);

        let target = Pose::new(Vector3::new(0.3, 0.2, 0.0), Vector3::z() * 0.4);
        writer.write_pose(target).unwrap();
        assert_eq!(*reader.read(), target);

        let bad = Pose::new(Vector3::new(f64::INFINITY, 0.0, 0.0), Vector3::zeros());
        assert!(writer.write_pose(bad).is_err());
    }
}
